use serde::{Deserialize, Serialize};

/// A message as returned by `users.messages.get` with `format=full`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmailMessage {
    #[serde(default)]
    pub id: String,
    pub payload: RawPayload,
}

/// Structured email body. Multi-part messages nest further payloads in `parts`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPayload {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub body: PartBody,
    #[serde(default)]
    pub parts: Vec<RawPayload>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

/// Part content, base64url encoded. Absent on container parts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl RawPayload {
    /// First header value whose name matches case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Depth-first search for the first `text/html` part, the payload itself included.
    pub fn first_html_part(&self) -> Option<&RawPayload> {
        if self.mime_type.eq_ignore_ascii_case("text/html") {
            return Some(self);
        }
        self.parts.iter().find_map(|p| p.first_html_part())
    }
}
