pub mod article;
pub mod payload;
