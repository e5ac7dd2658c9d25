//! Newsletter email → clean article text → condensed sound bites.

pub mod auth;
pub mod cleaner;
pub mod condense;
pub mod config;
pub mod domain;
pub mod error;
pub mod llm;
pub mod mail;
pub mod script;
pub mod store;
