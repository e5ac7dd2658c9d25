//! Single-narrator podcast script for a whole article batch.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::article::Article;
use crate::llm::{ChatBackend, Transcript};

pub const SCRIPT_SYSTEM_PROMPT: &str = concat!(
    "You are an expert podcast scriptwriter specializing in summarizing email content. ",
    "Your task is to create a comprehensive and engaging podcast script for a single narrator, following these guidelines:\n\n",
    "1. **Introduction:**\n",
    "   - Begin with an overview that contextualizes the listener to the variety of articles in the emails.\n",
    "   - Mention any common themes, trends, or notable topics present across the articles.\n\n",
    "2. **Contextual Summaries for Each Article:**\n",
    "   - Provide a concise yet comprehensive summary of each article.\n",
    "   - Highlight the main points, key arguments, and significant details.\n",
    "   - Offer context to help the listener understand the relevance and importance of each article.\n\n",
    "3. **Logical Organization:**\n",
    "   - Arrange the summaries in a logical order, grouping similar topics together if appropriate.\n",
    "   - Use clear and smooth transitions between articles to maintain a coherent flow.\n\n",
    "4. **Engaging Tone and Style:**\n",
    "   - Write in a conversational and relatable tone suitable for a podcast audience.\n",
    "   - Incorporate storytelling elements, rhetorical questions, or anecdotes where appropriate to enhance engagement.\n\n",
    "5. **Comprehensive Coverage:**\n",
    "   - Ensure all articles from the emails are included in the script.\n",
    "   - Avoid omitting any significant content or details.\n\n",
    "6. **Clarity and Conciseness:**\n",
    "   - Keep language clear and concise while being thorough.\n",
    "   - Eliminate unnecessary jargon or overly complex sentences.\n\n",
    "7. **Content Fidelity:**\n",
    "   - Do not introduce new information or personal opinions.\n",
    "   - Base the script solely on the content provided in the emails.\n\n",
    "8. **Formatting:**\n",
    "   - Provide the script in plain text without any special formatting, bullet points, or headings.",
);

const SCRIPT_HEADER: &str = "PODCAST SCRIPT";
const HEADER_RULE_WIDTH: usize = 40;

/// User message listing every article.
pub fn compose_request(articles: &[Article]) -> String {
    let mut out = String::from("Here are the articles to summarize:\n\n");
    for (i, a) in articles.iter().enumerate() {
        out.push_str(&format!("ARTICLE {}:\n", i + 1));
        out.push_str(&format!("Title: {}\n", a.subject));
        out.push_str(&format!("Author: {}\n", a.from));
        out.push_str(&format!("Content:\n{}\n\n", a.content));
    }
    out
}

/// Asks the backend for a script. Returns `None` for an empty batch or a failed call.
pub fn write_script(backend: &dyn ChatBackend, articles: &[Article]) -> Option<String> {
    if articles.is_empty() {
        log::warn!("no articles to script");
        return None;
    }

    let transcript = Transcript::with_system(SCRIPT_SYSTEM_PROMPT).user(compose_request(articles));
    match transcript.send(backend) {
        Ok(done) => done
            .last_reply()
            .map(str::to_string)
            .filter(|s| !s.trim().is_empty()),
        Err(e) => {
            log::warn!("script request failed: {e}");
            None
        }
    }
}

pub fn render_script(script: &str) -> String {
    format!(
        "{SCRIPT_HEADER}\n{}\n\n{script}",
        "=".repeat(HEADER_RULE_WIDTH)
    )
}

/// `podcast_script_<date>.txt`, the date taken from the first article.
pub fn script_file_name(articles: &[Article]) -> String {
    let date = articles.first().map(|a| a.date.as_str()).unwrap_or_default();
    let stamp = date.replace(':', "").replace(' ', "_").replace(',', "");
    format!("podcast_script_{stamp}.txt")
}

pub fn save_script(path: &Path, script: &str) -> Result<()> {
    fs::write(path, render_script(script))
        .with_context(|| format!("writing script {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::error::PipelineError;

    struct Fixed(&'static str, Cell<usize>);

    impl ChatBackend for Fixed {
        fn complete(&self, transcript: &Transcript) -> Result<String, PipelineError> {
            self.1.set(self.1.get() + 1);
            assert_eq!(transcript.messages()[0].content, SCRIPT_SYSTEM_PROMPT);
            Ok(self.0.to_string())
        }
    }

    struct Failing;

    impl ChatBackend for Failing {
        fn complete(&self, _: &Transcript) -> Result<String, PipelineError> {
            Err(PipelineError::Transport("502".into()))
        }
    }

    fn batch() -> Vec<Article> {
        vec![
            Article::new("Mon, 4 Mar 2024 10:00:00 +0000", "Acme", "Rates", "Rates rose."),
            Article::new("Tue, 5 Mar 2024 10:00:00 +0000", "Zed", "Chips", "Chips shipped."),
        ]
    }

    #[test]
    fn request_lists_every_article() {
        let req = compose_request(&batch());
        assert_eq!(
            req,
            "Here are the articles to summarize:\n\n\
             ARTICLE 1:\nTitle: Rates\nAuthor: Acme\nContent:\nRates rose.\n\n\
             ARTICLE 2:\nTitle: Chips\nAuthor: Zed\nContent:\nChips shipped.\n\n"
        );
    }

    #[test]
    fn script_comes_from_backend() {
        let backend = Fixed("Welcome to the show.", Cell::new(0));
        assert_eq!(
            write_script(&backend, &batch()).as_deref(),
            Some("Welcome to the show.")
        );
        assert_eq!(backend.1.get(), 1);
    }

    #[test]
    fn empty_batch_makes_no_call() {
        let backend = Fixed("unused", Cell::new(0));
        assert!(write_script(&backend, &[]).is_none());
        assert_eq!(backend.1.get(), 0);
    }

    #[test]
    fn failed_call_is_none() {
        assert!(write_script(&Failing, &batch()).is_none());
    }

    #[test]
    fn renders_header() {
        assert_eq!(
            render_script("Hello."),
            format!("PODCAST SCRIPT\n{}\n\nHello.", "=".repeat(40))
        );
    }

    #[test]
    fn file_name_from_first_date() {
        assert_eq!(
            script_file_name(&batch()),
            "podcast_script_Mon_4_Mar_2024_100000_+0000.txt"
        );
    }
}
