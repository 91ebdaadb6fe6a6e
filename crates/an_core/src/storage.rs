use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::types::{Article, ArticleFilter, Category};
use crate::Result;

#[async_trait]
pub trait ArticleStorage: Send + Sync {
    /// Whether an article with exactly this URL is stored
    async fn exists(&self, url: &str) -> Result<bool>;

    /// Store a new article. Fails with `Error::DuplicateUrl` if the URL is already stored
    async fn insert(&self, article: &Article) -> Result<()>;

    /// Articles matching the filter, newest first
    async fn list(&self, filter: &ArticleFilter) -> Result<Vec<Article>>;

    /// Number of stored articles, optionally restricted to one category
    async fn count(&self, category: Option<Category>) -> Result<usize>;

    /// Timestamp of the most recently stored article
    async fn latest_scraped_at(&self) -> Result<Option<DateTime<Utc>>>;

    /// Distinct categories present in the store
    async fn categories(&self) -> Result<Vec<Category>>;

    /// Cheap round trip used as a startup health check
    async fn ping(&self) -> Result<()> {
        self.count(None).await.map(|_| ())
    }

    /// Release the underlying connection
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
