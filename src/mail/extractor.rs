//! HTML email body → clean article text.

use lol_html::html_content::ContentType;
use lol_html::{RewriteStrSettings, element, rewrite_str};
use scraper::{Html, Selector};

use crate::cleaner::Cleaner;
use crate::domain::payload::RawPayload;
use crate::error::PipelineError;
use crate::mail::decoders::decode_body_data;

/// Dropped together with everything inside them.
pub const STRIPPED_TAGS: &[&str] = &["script", "style", "footer"];

/// Footer, subscription and social regions of newsletter templates.
pub const BOILERPLATE_SELECTORS: &[&str] = &[
    ".footer",
    ".post-footer",
    ".subscription-widget-wrap",
    ".button-wrapper",
    ".social-links",
    ".footer-links",
    "#footer",
    ".email-footer",
    ".subscription-footer",
];

/// Substring identifying tracked redirect links.
pub const DEFAULT_REDIRECT_MARKER: &str = "substack.com/redirect";

/// Layout tables are flattened to blocks so their text survives without grid rendering.
const TABLE_TAGS: &str = "table, thead, tbody, tfoot, tr, td, th, caption";

/// Wide enough that html2text never hard-wraps a paragraph.
const NO_WRAP_WIDTH: usize = 100_000;

/// `href` up to the first `?`.
pub fn clean_link(href: &str) -> &str {
    href.split_once('?').map_or(href, |(base, _)| base)
}

#[derive(Clone)]
pub struct Extractor {
    cleaner: Cleaner,
    redirect_marker: String,
    anchors: Selector,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(Cleaner::standard().clone(), DEFAULT_REDIRECT_MARKER)
    }
}

impl Extractor {
    pub fn new(cleaner: Cleaner, redirect_marker: impl Into<String>) -> Self {
        Self {
            cleaner,
            redirect_marker: redirect_marker.into(),
            anchors: Selector::parse("a[href]").expect("anchor selector"),
        }
    }

    /// Cleaned text of the first HTML part, or empty when there is none or it
    /// cannot be used.
    pub fn extract_content(&self, payload: &RawPayload) -> String {
        match self.try_extract(payload) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("dropping email body: {e}");
                String::new()
            }
        }
    }

    pub fn try_extract(&self, payload: &RawPayload) -> Result<String, PipelineError> {
        let Some(html) = first_html(payload)? else {
            return Ok(String::new());
        };
        let text = self.html_to_text(&html)?;
        Ok(self.cleaner.clean(&text))
    }

    /// Renders HTML to plain text with boilerplate regions removed and links inline.
    pub fn html_to_text(&self, html: &str) -> Result<String, PipelineError> {
        let stripped = self.strip_markup(html)?;
        html2text::from_read(stripped.as_bytes(), NO_WRAP_WIDTH)
            .map_err(|e| PipelineError::Parse(e.to_string()))
    }

    fn strip_markup(&self, html: &str) -> Result<String, PipelineError> {
        let removed = STRIPPED_TAGS
            .iter()
            .chain(BOILERPLATE_SELECTORS)
            .chain(&["img"])
            .copied()
            .collect::<Vec<_>>()
            .join(", ");
        let marker = self.redirect_marker.as_str();

        rewrite_str(
            html,
            RewriteStrSettings {
                element_content_handlers: vec![
                    element!(removed.as_str(), |el| {
                        el.remove();
                        Ok(())
                    }),
                    element!(TABLE_TAGS, |el| {
                        el.set_tag_name("div")?;
                        Ok(())
                    }),
                    // links become plain text followed by "(url)"
                    element!("a[href]", |el| {
                        if let Some(href) = el.get_attribute("href") {
                            let href = href.trim();
                            let url = if !marker.is_empty() && href.contains(marker) {
                                clean_link(href)
                            } else {
                                href
                            };
                            if !url.is_empty() {
                                el.after(&format!(" ({url})"), ContentType::Text);
                            }
                            el.remove_attribute("href");
                        }
                        Ok(())
                    }),
                ],
                ..RewriteStrSettings::new()
            },
        )
        .map_err(|e| PipelineError::Parse(e.to_string()))
    }

    /// Redirect links of a document as `(display text, url without query)`.
    pub fn extract_links(&self, html: &str) -> Vec<(String, String)> {
        let document = Html::parse_document(html);
        document
            .select(&self.anchors)
            .filter_map(|a| {
                let href = a.value().attr("href")?;
                if !href.contains(self.redirect_marker.as_str()) {
                    return None;
                }
                let text = a.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ");
                let text = if text.is_empty() { href.to_string() } else { text };
                Some((text, clean_link(href).to_string()))
            })
            .collect()
    }

    /// `extract_links` over the first HTML part of a payload.
    pub fn extract_payload_links(&self, payload: &RawPayload) -> Vec<(String, String)> {
        match first_html(payload) {
            Ok(Some(html)) => self.extract_links(&html),
            Ok(None) => Vec::new(),
            Err(e) => {
                log::warn!("cannot list links: {e}");
                Vec::new()
            }
        }
    }
}

fn first_html(payload: &RawPayload) -> Result<Option<String>, PipelineError> {
    let Some(part) = payload.first_html_part() else {
        return Ok(None);
    };
    let Some(data) = part.body.data.as_deref() else {
        return Ok(None);
    };
    decode_body_data(data).map(Some)
}

/// Cleaned text with the default extractor.
pub fn extract_content(payload: &RawPayload) -> String {
    Extractor::default().extract_content(payload)
}
