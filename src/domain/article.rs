/// One cleaned newsletter article.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Article {
    pub date: String,
    pub from: String,
    pub subject: String,
    pub content: String,
}

/// Articles in retrieval order.
pub type ArticleBatch = Vec<Article>;

impl Article {
    pub fn new(
        date: impl Into<String>,
        from: impl Into<String>,
        subject: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            from: from.into(),
            subject: subject.into(),
            content: content.into(),
        }
    }

    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }
}
