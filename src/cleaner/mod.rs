//! Text-to-text removal of newsletter boilerplate.
//!
//! Cleaning is a fixed point of a single pass: the pass only ever deletes
//! text, so it is repeated until nothing changes. That makes
//! `clean(clean(x)) == clean(x)` hold even when a deletion joins two
//! fragments into a fresh trigger.

pub mod rules;

use std::sync::LazyLock;

use regex::Regex;

pub use rules::{BoilerplateRule, CompiledRule, Scope, apply_rules, standard_rules};

/// Everything up to and including this marker is web-view chrome.
pub const READ_IN_APP_MARKER: &str = "READ IN APP";

static RESTACK_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[\[\[Restack.*?\]\]\]").expect("restack regex"));
static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("blank-run regex"));
static STANDARD: LazyLock<Cleaner> =
    LazyLock::new(|| Cleaner::new(standard_rules()).expect("standard boilerplate rules"));

#[derive(Debug, Clone)]
pub struct Cleaner {
    rules: Vec<CompiledRule>,
}

impl Cleaner {
    pub fn new(rules: Vec<BoilerplateRule>) -> Result<Self, regex::Error> {
        let rules = rules
            .into_iter()
            .map(BoilerplateRule::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// The built-in rule set.
    pub fn standard() -> &'static Cleaner {
        &STANDARD
    }

    /// Built-in rules followed by literal line-start triggers from configuration.
    pub fn with_extra_triggers(extra: &[String]) -> Result<Self, regex::Error> {
        let mut rules = standard_rules();
        rules.extend(
            extra
                .iter()
                .filter(|t| !t.trim().is_empty())
                .map(|t| BoilerplateRule::literal(t.trim(), Scope::LineStart)),
        );
        Self::new(rules)
    }

    pub fn clean(&self, text: &str) -> String {
        let mut current = self.pass(text);
        loop {
            let next = self.pass(&current);
            if next == current {
                return current;
            }
            current = next;
        }
    }

    fn pass(&self, text: &str) -> String {
        let body = match text.find(READ_IN_APP_MARKER) {
            Some(idx) => &text[idx + READ_IN_APP_MARKER.len()..],
            None => text,
        };
        let body = RESTACK_BLOCK.replace_all(body, "");
        let body = apply_rules(&body, &self.rules);
        let body = BLANK_RUNS.replace_all(&body, "\n\n");
        body.trim().to_string()
    }
}

/// Cleans with the built-in rule set.
pub fn clean_content(text: &str) -> String {
    Cleaner::standard().clean(text)
}
