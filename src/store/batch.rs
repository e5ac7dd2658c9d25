//! Flat-file framing for article batches.
//!
//! Writing frames every article with a 59-wide `=` rule under an `Article <n>`
//! title. Parsing splits on `=` rules of width 59 or 80, the latter being the
//! separator used by batch files assembled by hand or by older tooling. A
//! title line directly above a rule belongs to the article after it.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;

use crate::domain::article::{Article, ArticleBatch};
use crate::error::PipelineError;

pub const ARTICLE_RULE_WIDTH: usize = 59;
pub const SECTION_RULE_WIDTH: usize = 80;
const FIELD_RULE_WIDTH: usize = 40;
const CONTENT_MARKER: &str = "ARTICLE CONTENT:";

pub fn write_batch(articles: &[Article]) -> String {
    let article_rule = "=".repeat(ARTICLE_RULE_WIDTH);
    let field_rule = "-".repeat(FIELD_RULE_WIDTH);

    let mut out = String::new();
    for (i, a) in articles.iter().enumerate() {
        out.push_str(&format!("Article {}\n{article_rule}\n", i + 1));
        out.push_str(&format!("Date: {}\n", a.date));
        out.push_str(&format!("From: {}\n", a.from));
        out.push_str(&format!("Subject: {}\n", a.subject));
        out.push_str(&format!("{field_rule}\n{CONTENT_MARKER}\n{field_rule}\n"));
        out.push_str(&format!("{}\n\n", a.content));
    }
    out
}

pub fn parse_batch(text: &str) -> ArticleBatch {
    split_sections(text)
        .iter()
        .filter(|lines| lines.iter().any(|l| !l.trim().is_empty()))
        .filter_map(|lines| match parse_section(lines) {
            Ok(article) => Some(article),
            Err(e) => {
                log::debug!("dropping batch section: {e}");
                None
            }
        })
        .collect()
}

fn is_rule(line: &str, ch: char, widths: &[usize]) -> bool {
    let line = line.trim_end();
    widths.contains(&line.len()) && line.chars().all(|c| c == ch)
}

fn is_delimiter(line: &str) -> bool {
    is_rule(line, '=', &[ARTICLE_RULE_WIDTH, SECTION_RULE_WIDTH])
}

fn is_title(line: &str) -> bool {
    line.trim()
        .strip_prefix("Article ")
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}

fn split_sections(text: &str) -> Vec<Vec<&str>> {
    let mut sections = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if !is_delimiter(line) {
            current.push(line);
            continue;
        }
        while current.last().is_some_and(|l| l.trim().is_empty()) {
            current.pop();
        }
        if current.last().is_some_and(|l| is_title(l)) {
            current.pop();
        }
        sections.push(std::mem::take(&mut current));
    }
    sections.push(current);
    sections
}

fn parse_section(lines: &[&str]) -> Result<Article, PipelineError> {
    let mut article = Article::default();
    let mut content_start = None;

    for (i, line) in lines.iter().enumerate() {
        if let Some(v) = line.strip_prefix("Date:") {
            article.date = v.trim().to_string();
        } else if let Some(v) = line.strip_prefix("From:") {
            article.from = v.trim().to_string();
        } else if let Some(v) = line.strip_prefix("Subject:") {
            article.subject = v.trim().to_string();
        } else if line.starts_with(CONTENT_MARKER) {
            content_start = Some(i + 1);
            break;
        }
    }

    let Some(start) = content_start else {
        return Err(PipelineError::Format(format!(
            "no {CONTENT_MARKER} line in section starting {:?}",
            lines.first().copied().unwrap_or_default()
        )));
    };

    let mut body = &lines[start..];
    if body.first().is_some_and(|l| is_rule(l, '-', &[FIELD_RULE_WIDTH])) {
        body = &body[1..];
    }
    article.content = body.join("\n").trim().to_string();

    if article.content.is_empty() {
        return Err(PipelineError::Format(format!(
            "empty content for {:?}",
            article.subject
        )));
    }
    Ok(article)
}

pub fn write_batch_file(path: &Path, articles: &[Article]) -> Result<()> {
    fs::write(path, write_batch(articles))
        .with_context(|| format!("writing batch file {}", path.display()))
}

pub fn read_batch_file(path: &Path) -> Result<ArticleBatch> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading batch file {}", path.display()))?;
    Ok(parse_batch(&text))
}

/// `substack_articles_YYYYMMDD_HHMMSS.txt`
pub fn batch_file_name(at: NaiveDateTime) -> String {
    format!("substack_articles_{}.txt", at.format("%Y%m%d_%H%M%S"))
}
