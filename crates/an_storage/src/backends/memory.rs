use an_core::{Article, ArticleFilter, ArticleStorage, Category, Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::StorageBackend;

#[derive(Default)]
pub struct MemoryStore {
    articles: Vec<Article>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exists(&self, url: &str) -> bool {
        self.articles.iter().any(|a| a.url == url)
    }

    pub fn insert(&mut self, article: &Article) -> Result<()> {
        if self.exists(&article.url) {
            return Err(Error::DuplicateUrl(article.url.clone()));
        }
        self.articles.push(article.clone());
        Ok(())
    }

    pub fn list(&self, filter: &ArticleFilter) -> Vec<Article> {
        let mut articles = self
            .articles
            .iter()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect::<Vec<_>>();
        articles.sort_by(|a, b| b.scraped_at.cmp(&a.scraped_at));
        if let Some(limit) = filter.limit {
            articles.truncate(limit);
        }
        articles
    }
}

/// Process-local store, used for dry runs and tests.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    fn get_error_message() -> &'static str {
        "Memory storage should be available"
    }

    async fn connect(_database_url: Option<&str>) -> Result<Self> {
        Ok(Self::new())
    }
}

#[async_trait]
impl ArticleStorage for MemoryStorage {
    async fn exists(&self, url: &str) -> Result<bool> {
        Ok(self.store.read().await.exists(url))
    }

    async fn insert(&self, article: &Article) -> Result<()> {
        // check and push happen under the same write lock
        self.store.write().await.insert(article)
    }

    async fn list(&self, filter: &ArticleFilter) -> Result<Vec<Article>> {
        Ok(self.store.read().await.list(filter))
    }

    async fn count(&self, category: Option<Category>) -> Result<usize> {
        let store = self.store.read().await;
        Ok(store
            .articles
            .iter()
            .filter(|a| category.map_or(true, |c| a.category == c))
            .count())
    }

    async fn latest_scraped_at(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.store.read().await.articles.iter().map(|a| a.scraped_at).max())
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        let store = self.store.read().await;
        Ok(store
            .articles
            .iter()
            .map(|a| a.category)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect())
    }
}
