//! HTTP-POST binding.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::SamlResult;

use super::{utf8, DecodedMessage, SamlMessageType, PARAM_RELAY_STATE};

/// HTTP-POST binding encoder/decoder.
pub struct HttpPostBinding;

impl HttpPostBinding {
    /// Renders `xml` as an `AuthnRequest` form that submits itself to
    /// `destination`.
    #[must_use]
    pub fn encode_request(xml: &str, destination: &str, relay_state: Option<&str>) -> String {
        let mut fields = vec![hidden_input(
            SamlMessageType::Request.form_param(),
            &STANDARD.encode(xml),
        )];
        if let Some(relay_state) = relay_state {
            fields.push(hidden_input(PARAM_RELAY_STATE, relay_state));
        }

        format!(
            r#"<!DOCTYPE html>
<html>
<head><meta charset="UTF-8"><title>Sign in</title></head>
<body onload="document.forms[0].submit()">
    <form method="post" action="{action}">
        {fields}
        <noscript><input type="submit" value="Continue"/></noscript>
    </form>
</body>
</html>"#,
            action = html_escape(destination),
            fields = fields.join("\n        "),
        )
    }

    /// Decodes a form field value.
    ///
    /// Line breaks inside the base64 payload are tolerated.
    pub fn decode(
        encoded: &str,
        message_type: SamlMessageType,
        relay_state: Option<&str>,
    ) -> SamlResult<DecodedMessage> {
        let compact: String = encoded.split_ascii_whitespace().collect();
        Ok(DecodedMessage {
            xml: utf8(STANDARD.decode(compact)?)?,
            message_type,
            relay_state: relay_state.map(String::from),
        })
    }
}

fn hidden_input(name: &str, value: &str) -> String {
    format!(
        r#"<input type="hidden" name="{name}" value="{}"/>"#,
        html_escape(value)
    )
}

fn html_escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
