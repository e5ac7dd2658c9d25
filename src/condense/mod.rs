//! Length-targeted condensation through an escalating ladder of prompts.
//!
//! Each rung shortens the previous rung's output. The first result inside the
//! acceptance band wins; otherwise the successful result nearest the fallback
//! target is kept, and with no successes the input comes back untouched.

use crate::domain::article::{Article, ArticleBatch};
use crate::error::PipelineError;
use crate::llm::{ChatBackend, Transcript};

pub const DEFAULT_MIN_CHARS: usize = 650;
pub const DEFAULT_MAX_CHARS: usize = 850;
pub const DEFAULT_FALLBACK_TARGET: usize = 4500;

const SHORTEN_REQUEST: &str =
    "Please shorten the following text, keeping it as concise as possible:\n\n";

const UNKNOWN_SOURCE: &str = "an unknown source";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Moderate,
    Crucial,
    Minimalist,
}

impl Profile {
    pub const LADDER: [Profile; 3] = [Profile::Moderate, Profile::Crucial, Profile::Minimalist];

    pub fn system_prompt(self) -> &'static str {
        match self {
            Profile::Moderate => {
                "You are an expert text summarizer. Condense the following text while preserving its core meaning, key arguments, and most important details. Maintain the original tone and style. Ensure the summary is coherent and readable."
            }
            Profile::Crucial => {
                "You are an expert text condenser. Significantly reduce the text length while keeping only the most crucial information. Focus on the absolute core message."
            }
            Profile::Minimalist => {
                "You are an extreme text minimalist. Compress the text to its absolute bare minimum, preserving only the most essential ideas and key phrases."
            }
        }
    }
}

/// Inclusive acceptance band plus the length the fallback aims for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthTarget {
    pub min_chars: usize,
    pub max_chars: usize,
    pub fallback_target: usize,
}

impl Default for LengthTarget {
    fn default() -> Self {
        Self {
            min_chars: DEFAULT_MIN_CHARS,
            max_chars: DEFAULT_MAX_CHARS,
            fallback_target: DEFAULT_FALLBACK_TARGET,
        }
    }
}

impl LengthTarget {
    pub fn accepts(&self, length: usize) -> bool {
        (self.min_chars..=self.max_chars).contains(&length)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CondensationAttempt {
    pub text: String,
    /// Characters, not bytes.
    pub length: usize,
    pub attempt_index: usize,
}

/// Earliest attempt among those nearest to `target`.
pub fn closest_to_target(
    attempts: &[CondensationAttempt],
    target: usize,
) -> Option<&CondensationAttempt> {
    attempts.iter().min_by_key(|a| a.length.abs_diff(target))
}

pub struct Condenser<'a> {
    backend: &'a dyn ChatBackend,
    target: LengthTarget,
}

impl<'a> Condenser<'a> {
    pub fn new(backend: &'a dyn ChatBackend, target: LengthTarget) -> Self {
        Self { backend, target }
    }

    fn attempt(
        &self,
        profile: Profile,
        attempt_index: usize,
        text: &str,
    ) -> Result<CondensationAttempt, PipelineError> {
        let reply = Transcript::with_system(profile.system_prompt())
            .user(format!("{SHORTEN_REQUEST}{text}"))
            .send(self.backend)?;
        let text = reply.last_reply().unwrap_or_default().trim().to_string();
        Ok(CondensationAttempt {
            length: text.chars().count(),
            text,
            attempt_index,
        })
    }

    pub fn condense(&self, input: &str) -> String {
        let mut attempts: Vec<CondensationAttempt> = Vec::with_capacity(Profile::LADDER.len());
        let mut current = input.to_string();

        for (i, profile) in Profile::LADDER.into_iter().enumerate() {
            let index = i + 1;
            let attempt = match self.attempt(profile, index, &current) {
                Ok(a) => a,
                Err(e) => {
                    log::warn!("condensation attempt {index} failed: {e}");
                    continue;
                }
            };

            if self.target.accepts(attempt.length) {
                log::info!("attempt {index} accepted at {} chars", attempt.length);
                return attempt.text;
            }
            log::info!(
                "attempt {index} gave {} chars, outside {}..={}",
                attempt.length,
                self.target.min_chars,
                self.target.max_chars
            );
            current = attempt.text.clone();
            attempts.push(attempt);
        }

        match closest_to_target(&attempts, self.target.fallback_target) {
            Some(best) => {
                log::info!(
                    "using attempt {} ({} chars) as closest to {}",
                    best.attempt_index,
                    best.length,
                    self.target.fallback_target
                );
                best.text.clone()
            }
            None => {
                log::warn!("every condensation attempt failed; keeping original text");
                input.to_string()
            }
        }
    }

    /// Condensed document with the attribution trailer appended.
    pub fn condense_document(&self, document: &str) -> String {
        let mut out = self.condense(document);
        out.push_str(&attribution_trailer(document));
        out
    }

    /// Condenses one article's content, credited to its sender.
    pub fn condense_article(&self, article: &Article) -> Article {
        let mut content = self.condense(&article.content);
        content.push_str(&trailer_for(&article.from));
        Article {
            content,
            ..article.clone()
        }
    }

    /// One condensation run per article, in batch order.
    pub fn condense_batch(&self, articles: &[Article]) -> ArticleBatch {
        articles
            .iter()
            .enumerate()
            .map(|(i, a)| {
                log::info!("condensing article {} of {}: {:?}", i + 1, articles.len(), a.subject);
                self.condense_article(a)
            })
            .collect()
    }
}

/// Source named on a leading `Source:` line.
pub fn source_name(document: &str) -> String {
    let first = document.lines().next().unwrap_or_default();
    if !first.contains("Source:") {
        return UNKNOWN_SOURCE.to_string();
    }
    let name = first.replace("Source:", "");
    let name = name.trim();
    if name.is_empty() {
        UNKNOWN_SOURCE.to_string()
    } else {
        name.to_string()
    }
}

pub fn attribution_trailer(document: &str) -> String {
    trailer_for(&source_name(document))
}

fn trailer_for(source: &str) -> String {
    let source = match source.trim() {
        "" => UNKNOWN_SOURCE,
        s => s,
    };
    format!(
        "\n\nThis is the news from {source} reported for you by Sound Bite, made by Sundai Club in Boston."
    )
}
