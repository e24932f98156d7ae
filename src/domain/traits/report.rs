use async_trait::async_trait;

use crate::domain::entities::{Article, ArticleQuery};
use crate::application::errors::BotError;

/// Source of sales-by-article rows
#[async_trait]
pub trait ArticleSource: Send + Sync {
    async fn fetch_articles(&self, query: &ArticleQuery) -> Result<Vec<Article>, BotError>;
}
