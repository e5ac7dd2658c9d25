use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE};
use base64::engine::DecodePaddingMode;
use base64::{Engine as _, alphabet};

use crate::domain::payload::{Header, PartBody, RawPayload};
use crate::error::PipelineError;

/// Gmail pads `body.data`, other producers do not; accept both.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// base64url body data → UTF-8 text.
pub fn decode_body_data(data: &str) -> Result<String, PipelineError> {
    let bytes = URL_SAFE_LENIENT.decode(data.trim())?;
    Ok(String::from_utf8(bytes)?)
}

pub fn encode_body_data(bytes: &[u8]) -> String {
    URL_SAFE.encode(bytes)
}

/// Re-expresses an RFC 822 message in the Gmail payload shape so it can go
/// through the same extractor. Leaf bodies are charset-decoded, then re-encoded
/// as base64url UTF-8.
pub fn payload_from_rfc822(raw: &[u8]) -> Result<RawPayload, PipelineError> {
    let parsed = mailparse::parse_mail(raw).map_err(|e| PipelineError::Decode(e.to_string()))?;
    payload_from_parsed(&parsed)
}

fn payload_from_parsed(p: &mailparse::ParsedMail) -> Result<RawPayload, PipelineError> {
    let headers = p
        .headers
        .iter()
        .map(|h| Header {
            name: h.get_key(),
            value: h.get_value().trim().to_string(),
        })
        .collect();

    let mut parts = Vec::with_capacity(p.subparts.len());
    for sp in &p.subparts {
        parts.push(payload_from_parsed(sp)?);
    }

    let data = if p.subparts.is_empty() {
        let body = p
            .get_body()
            .map_err(|e| PipelineError::Decode(e.to_string()))?;
        Some(encode_body_data(body.as_bytes()))
    } else {
        None
    };

    Ok(RawPayload {
        mime_type: p.ctype.mimetype.to_ascii_lowercase(),
        headers,
        body: PartBody { data },
        parts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_padded_and_unpadded() {
        assert_eq!(decode_body_data("PHA-aGk8L3A-").unwrap(), "<p>hi</p>");
        assert_eq!(decode_body_data("aGk=").unwrap(), "hi");
        assert_eq!(decode_body_data("aGk").unwrap(), "hi");
    }

    #[test]
    fn rejects_bad_base64_and_non_utf8() {
        assert!(matches!(decode_body_data("***"), Err(PipelineError::Decode(_))));
        let latin1 = encode_body_data(&[0x63, 0x61, 0x66, 0xe9]);
        assert!(matches!(decode_body_data(&latin1), Err(PipelineError::Decode(_))));
    }

    #[test]
    fn rfc822_multipart_becomes_payload() {
        let raw = concat!(
            "From: Acme <acme@substack.com>\r\n",
            "Subject: =?UTF-8?Q?Caf=C3=A9_notes?=\r\n",
            "Date: Mon, 4 Mar 2024 10:00:00 +0000\r\n",
            "MIME-Version: 1.0\r\n",
            "Content-Type: multipart/alternative; boundary=\"b1\"\r\n",
            "\r\n",
            "--b1\r\n",
            "Content-Type: text/plain; charset=utf-8\r\n",
            "\r\n",
            "plain body\r\n",
            "--b1\r\n",
            "Content-Type: text/html; charset=utf-8\r\n",
            "\r\n",
            "<p>html body</p>\r\n",
            "--b1--\r\n",
        );
        let payload = payload_from_rfc822(raw.as_bytes()).unwrap();
        assert_eq!(payload.mime_type, "multipart/alternative");
        assert_eq!(payload.header("subject"), Some("Café notes"));
        assert_eq!(payload.parts.len(), 2);
        let html = payload.first_html_part().unwrap();
        let decoded = decode_body_data(html.body.data.as_deref().unwrap()).unwrap();
        assert!(decoded.contains("<p>html body</p>"));
    }
}
