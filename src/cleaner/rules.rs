//! Declarative boilerplate rules.
//!
//! A rule is a trigger plus a scope. Rules are plain data; `apply_rules` is the
//! only code that interprets them.

use std::sync::LazyLock;

use regex::Regex;

/// Anything that looks like a link. A rule whose own trigger text matches this
/// is never applied, so lines carrying links are not eaten by it.
static URL_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"]+|www\.[^\s<>"]+"#).expect("url regex"));

/// How much text a rule removes once its trigger matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Trigger opens the line, after optional blanks and rendered markup
    /// (`#`, `>`, `*`, `_`, `-`); the line and its newline go.
    LineStart,
    /// Trigger anywhere; everything from it through the newline goes.
    Anywhere,
    /// The whole line must match; its text goes, the newline stays.
    WholeLine,
}

#[derive(Debug, Clone)]
pub struct BoilerplateRule {
    /// The trigger as a reader would write it.
    pub text: String,
    /// Regex source for the trigger.
    pub pattern: String,
    pub scope: Scope,
}

impl BoilerplateRule {
    /// A rule whose trigger is already regex source.
    pub fn new(text: impl Into<String>, pattern: impl Into<String>, scope: Scope) -> Self {
        Self {
            text: text.into(),
            pattern: pattern.into(),
            scope,
        }
    }

    /// A rule matching `text` literally.
    pub fn literal(text: impl Into<String>, scope: Scope) -> Self {
        let text = text.into();
        let pattern = regex::escape(&text);
        Self {
            text,
            pattern,
            scope,
        }
    }

    pub fn is_self_excluding(&self) -> bool {
        URL_LIKE.is_match(&self.text) || URL_LIKE.is_match(&self.pattern)
    }

    fn source(&self) -> String {
        let p = &self.pattern;
        match self.scope {
            Scope::LineStart => {
                format!(r"(?mi)^[ \t]*(?:[#>*_-]+[ \t]*)*(?:{p})[^\n]*(?:\n|$)")
            }
            Scope::Anywhere => format!(r"(?mi)(?:{p})[^\n]*(?:\n|$)"),
            Scope::WholeLine => format!(r"(?mi)^[ \t]*(?:{p})[ \t]*$"),
        }
    }

    pub fn compile(self) -> Result<CompiledRule, regex::Error> {
        let regex = Regex::new(&self.source())?;
        Ok(CompiledRule { rule: self, regex })
    }
}

#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub rule: BoilerplateRule,
    regex: Regex,
}

/// Applies `rules` in order, skipping any rule that would match link text.
pub fn apply_rules(text: &str, rules: &[CompiledRule]) -> String {
    let mut out = text.to_string();
    for compiled in rules {
        if compiled.rule.is_self_excluding() {
            log::debug!("skipping boilerplate rule {:?}: trigger contains a url", compiled.rule.text);
            continue;
        }
        if let std::borrow::Cow::Owned(replaced) = compiled.regex.replace_all(&out, "") {
            out = replaced;
        }
    }
    out
}

/// Newsletter chrome seen across Substack-style mailings, in application order.
pub fn standard_rules() -> Vec<BoilerplateRule> {
    use Scope::*;
    vec![
        BoilerplateRule::literal("Like this post?", LineStart),
        BoilerplateRule::literal("Subscribe to", LineStart),
        BoilerplateRule::literal("Thank you for reading", LineStart),
        BoilerplateRule::literal("Thanks for reading", LineStart),
        BoilerplateRule::literal("Share this post", LineStart),
        BoilerplateRule::literal("Did someone forward this to you?", LineStart),
        BoilerplateRule::new(
            "You're receiving this email because",
            r"You['’]re receiving this email because",
            LineStart,
        ),
        BoilerplateRule::literal("Unsubscribe", LineStart),
        BoilerplateRule::new(
            "© 2024 ... All rights reserved",
            r"(?:©|\(c\)|copyright)?[ \t]*\d{4}[^\n]*?All rights reserved",
            LineStart,
        ),
        BoilerplateRule::literal("Sent to", LineStart),
        BoilerplateRule::literal("View in browser", LineStart),
        BoilerplateRule::literal("Get the app", LineStart),
        BoilerplateRule::new("Share", r"Share\b", LineStart),
        BoilerplateRule::new("Comment", r"Comments?\b", LineStart),
        BoilerplateRule::new("Like", r"Like\b", LineStart),
        BoilerplateRule::literal("Forwarded this email?", LineStart),
        BoilerplateRule::literal("This post is free to read", LineStart),
        BoilerplateRule::new(
            "You're currently a free subscriber",
            r"You['’]re currently a free subscriber",
            LineStart,
        ),
        BoilerplateRule::literal("Upgrade to paid", LineStart),
        // preheader padding
        BoilerplateRule::new(
            "invisible padding",
            r"\x{034F}[ \t\x{034F}\x{00AD}]*\x{00AD}",
            Anywhere,
        ),
        BoilerplateRule::new("***", r"\*\*\*", WholeLine),
    ]
}
