//! Retrieved messages → article batch.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::domain::article::{Article, ArticleBatch};
use crate::domain::payload::{GmailMessage, RawPayload};
use crate::mail::decoders::payload_from_rfc822;
use crate::mail::extractor::Extractor;

pub const DEFAULT_SKIP_SENDERS: &[&str] = &["no-reply@substack.com"];

#[derive(Deserialize)]
#[serde(untagged)]
enum MessageDump {
    Many(Vec<GmailMessage>),
    One(GmailMessage),
}

/// Loads payloads from a Gmail JSON dump (one message or an array) or an `.eml` file.
pub fn read_payloads(path: &Path) -> Result<Vec<RawPayload>> {
    let raw = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let is_eml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("eml"));

    if is_eml {
        let payload = payload_from_rfc822(&raw)
            .with_context(|| format!("parsing message {}", path.display()))?;
        return Ok(vec![payload]);
    }

    let dump: MessageDump = serde_json::from_slice(&raw)
        .with_context(|| format!("parsing message dump {}", path.display()))?;
    Ok(match dump {
        MessageDump::Many(msgs) => msgs.into_iter().map(|m| m.payload).collect(),
        MessageDump::One(msg) => vec![msg.payload],
    })
}

pub struct Digest {
    extractor: Extractor,
    skip_senders: Vec<String>,
}

impl Default for Digest {
    fn default() -> Self {
        Self::new(
            Extractor::default(),
            DEFAULT_SKIP_SENDERS.iter().map(|s| s.to_string()).collect(),
        )
    }
}

impl Digest {
    pub fn new(extractor: Extractor, skip_senders: Vec<String>) -> Self {
        Self {
            extractor,
            skip_senders: skip_senders.into_iter().map(|s| s.to_lowercase()).collect(),
        }
    }

    fn is_skipped_sender(&self, from: &str) -> bool {
        let from = from.to_lowercase();
        self.skip_senders.iter().any(|s| !s.is_empty() && from.contains(s))
    }

    /// Article for one message; `None` for skipped senders and empty bodies.
    pub fn article(&self, payload: &RawPayload) -> Option<Article> {
        let header = |name| payload.header(name).unwrap_or_default().to_string();
        let from = header("From");

        if self.is_skipped_sender(&from) {
            log::debug!("skipping message from {from}");
            return None;
        }

        let article = Article {
            date: header("Date"),
            from,
            subject: header("Subject"),
            content: self.extractor.extract_content(payload),
        };
        if !article.has_content() {
            log::info!("no usable content in {:?}, dropped", article.subject);
            return None;
        }
        Some(article)
    }

    /// Keeps retrieval order; unusable messages are left out.
    pub fn collect<'a>(&self, payloads: impl IntoIterator<Item = &'a RawPayload>) -> ArticleBatch {
        payloads.into_iter().filter_map(|p| self.article(p)).collect()
    }
}
