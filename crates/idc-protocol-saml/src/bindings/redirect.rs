//! HTTP-Redirect binding.
//!
//! The message is compressed with raw DEFLATE (no zlib header), base64
//! encoded and percent-encoded into the query string.

use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

use crate::error::{SamlError, SamlResult};

use super::{utf8, DecodedMessage, SamlMessageType, PARAM_RELAY_STATE};

/// Upper bound on an inflated message, in bytes.
pub const MAX_INFLATED_SIZE: u64 = 1024 * 1024;

/// HTTP-Redirect binding encoder/decoder.
pub struct HttpRedirectBinding;

impl HttpRedirectBinding {
    /// Builds the URL redirecting the browser to `destination` with `xml`
    /// as `SAMLRequest`.
    ///
    /// Parameters are appended to an existing query.
    pub fn encode_request(
        xml: &str,
        destination: &str,
        relay_state: Option<&str>,
    ) -> SamlResult<String> {
        let payload = STANDARD.encode(deflate(xml.as_bytes())?);

        let mut params = vec![(SamlMessageType::Request.form_param(), payload.as_str())];
        params.extend(relay_state.map(|relay_state| (PARAM_RELAY_STATE, relay_state)));
        let query = params
            .iter()
            .map(|(name, value)| format!("{name}={}", urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");

        let separator = if destination.contains('?') { '&' } else { '?' };
        Ok(format!("{destination}{separator}{query}"))
    }

    /// Decodes a query parameter value that is already percent-decoded.
    pub fn decode(
        encoded: &str,
        message_type: SamlMessageType,
        relay_state: Option<&str>,
    ) -> SamlResult<DecodedMessage> {
        let compressed = STANDARD.decode(encoded)?;
        Ok(DecodedMessage {
            xml: utf8(inflate(&compressed)?)?,
            message_type,
            relay_state: relay_state.map(String::from),
        })
    }

    /// Decodes the message carried by a complete redirect URL.
    pub fn decode_url(url: &str) -> SamlResult<DecodedMessage> {
        let parsed = url::Url::parse(url)
            .map_err(|e| SamlError::InvalidRequest(format!("invalid redirect URL: {e}")))?;

        let mut message = None;
        let mut relay_state = None;
        for (name, value) in parsed.query_pairs() {
            if name == PARAM_RELAY_STATE {
                relay_state = Some(value.into_owned());
            } else if let Some(message_type) = SamlMessageType::from_param(&name) {
                message = Some((value.into_owned(), message_type));
            }
        }

        let (encoded, message_type) = message.ok_or_else(|| {
            SamlError::InvalidRequest("URL carries neither SAMLRequest nor SAMLResponse".to_string())
        })?;
        Self::decode(&encoded, message_type, relay_state.as_deref())
    }
}

fn deflate(data: &[u8]) -> SamlResult<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn inflate(data: &[u8]) -> SamlResult<Vec<u8>> {
    let mut inflated = Vec::new();
    DeflateDecoder::new(data)
        .take(MAX_INFLATED_SIZE + 1)
        .read_to_end(&mut inflated)?;
    if inflated.len() as u64 > MAX_INFLATED_SIZE {
        return Err(SamlError::Deflate(format!(
            "inflated message exceeds {MAX_INFLATED_SIZE} bytes"
        )));
    }
    Ok(inflated)
}
