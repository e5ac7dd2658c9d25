use std::fs;

use serde_json::json;

use soundbite::condense::{Condenser, LengthTarget};
use soundbite::domain::article::Article;
use soundbite::error::PipelineError;
use soundbite::llm::{ChatBackend, Transcript};
use soundbite::mail::decoders::encode_body_data;
use soundbite::mail::digest::{Digest, read_payloads};
use soundbite::store::batch::{read_batch_file, write_batch_file};

const NEWSLETTER: &str = r#"<html><body>
<h1>Chips are back</h1>
<p>Foundries shipped <a href="https://acme.substack.com/redirect/abc?token=secret">record volumes</a> this quarter.</p>
<p>Subscribe to Acme Weekly for more.</p>
<div class="footer">Unsubscribe | Manage preferences</div>
</body></html>"#;

fn message(from: &str, subject: &str, html: &str) -> serde_json::Value {
    json!({
        "id": subject,
        "payload": {
            "mimeType": "multipart/alternative",
            "headers": [
                {"name": "date", "value": "Mon, 4 Mar 2024 10:00:00 +0000"},
                {"name": "From", "value": from},
                {"name": "Subject", "value": subject}
            ],
            "parts": [
                {"mimeType": "text/plain", "body": {"data": encode_body_data(b"plain")}},
                {"mimeType": "text/html", "body": {"data": encode_body_data(html.as_bytes())}}
            ]
        }
    })
}

#[test]
fn digest_batch_round_trip() {
    let dir = tempfile::tempdir().unwrap();

    let dump = json!([
        message("Acme Weekly <acme@substack.com>", "Chips", NEWSLETTER),
        message("Substack <no-reply@substack.com>", "Your login link", "<p>Click here to sign in.</p>"),
        message("Empty <empty@example.com>", "Nothing", "<div class=\"footer\">only footer</div>"),
    ]);
    let dump_path = dir.path().join("messages.json");
    fs::write(&dump_path, dump.to_string()).unwrap();

    let eml = "From: Zed News <zed@example.com>\r\n\
               Subject: Rates\r\n\
               Date: Tue, 5 Mar 2024 08:00:00 +0000\r\n\
               MIME-Version: 1.0\r\n\
               Content-Type: text/html; charset=utf-8\r\n\
               \r\n\
               <p>Rates rose again.</p>\r\n";
    let eml_path = dir.path().join("rates.eml");
    fs::write(&eml_path, eml).unwrap();

    let mut payloads = read_payloads(&dump_path).unwrap();
    payloads.extend(read_payloads(&eml_path).unwrap());
    assert_eq!(payloads.len(), 4);

    let articles = Digest::default().collect(&payloads);
    assert_eq!(articles.len(), 2);

    let chips = &articles[0];
    assert_eq!(chips.subject, "Chips");
    assert_eq!(chips.date, "Mon, 4 Mar 2024 10:00:00 +0000");
    assert!(chips.content.contains("Chips are back"));
    assert!(chips.content.contains("https://acme.substack.com/redirect/abc"));
    assert!(!chips.content.contains("token=secret"));
    assert!(!chips.content.contains("Unsubscribe"));
    assert!(!chips.content.contains("Subscribe to"));

    assert_eq!(articles[1].from, "Zed News <zed@example.com>");
    assert!(articles[1].content.contains("Rates rose again."));

    let batch_path = dir.path().join("batch.txt");
    write_batch_file(&batch_path, &articles).unwrap();
    let parsed: Vec<Article> = read_batch_file(&batch_path).unwrap();
    assert_eq!(parsed, articles);
}

#[test]
fn missing_input_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_payloads(&dir.path().join("absent.json")).unwrap_err();
    assert!(format!("{err:#}").contains("absent.json"));
}

/// Replies with the first word of the text it was asked to shorten, padded into the band.
struct FirstWord;

impl ChatBackend for FirstWord {
    fn complete(&self, transcript: &Transcript) -> Result<String, PipelineError> {
        let request = &transcript.messages()[1].content;
        let text = request.split_once("\n\n").map_or("", |(_, t)| t);
        let word = text.split_whitespace().next().unwrap_or_default();
        Ok(format!("{word} {}", "x".repeat(700)))
    }
}

#[test]
fn batch_file_feeds_condenser() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("batch.txt");
    let articles = vec![
        Article::new("D1", "Acme Weekly", "Rates", "Rates rose again this week."),
        Article::new("D2", "Zed News", "Chips", "Chips shipped in record volumes."),
    ];
    write_batch_file(&input, &articles).unwrap();

    let parsed = read_batch_file(&input).unwrap();
    let condensed = Condenser::new(&FirstWord, LengthTarget::default()).condense_batch(&parsed);

    let output = dir.path().join("shortened_batch.txt");
    write_batch_file(&output, &condensed).unwrap();
    let reread = read_batch_file(&output).unwrap();

    assert_eq!(reread.len(), 2);
    assert_eq!(reread[0].subject, "Rates");
    assert!(reread[0].content.starts_with("Rates xxx"));
    assert!(reread[0].content.ends_with(
        "This is the news from Acme Weekly reported for you by Sound Bite, made by Sundai Club in Boston."
    ));
    assert!(reread[1].content.starts_with("Chips xxx"));
    assert!(reread[1].content.contains("news from Zed News"));
}
