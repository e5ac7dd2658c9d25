//! Chat completions over HTTP.

pub mod client;
pub mod transcript;

pub use client::{ChatBackend, ChatSettings, HttpChatClient};
pub use transcript::{ChatMessage, Role, Transcript};
