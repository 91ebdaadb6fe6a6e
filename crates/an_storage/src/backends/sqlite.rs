use an_core::{Article, ArticleFilter, ArticleStorage, Category, Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use crate::StorageBackend;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        url TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        category TEXT NOT NULL,
        scraped_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_articles_scraped_at ON articles (scraped_at)",
    "CREATE INDEX IF NOT EXISTS idx_articles_category ON articles (category)",
];

pub struct SQLiteStorage {
    pool: Arc<SqlitePool>,
}

#[async_trait]
impl StorageBackend for SQLiteStorage {
    fn get_error_message() -> &'static str {
        "SQLite database should be reachable at DATABASE_URL (e.g. sqlite://articles.db)"
    }

    async fn connect(database_url: Option<&str>) -> Result<Self> {
        let url = database_url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| Error::Configuration("DATABASE_URL is required for sqlite storage".to_string()))?;

        if url.starts_with("sqlite:") {
            let options = SqliteConnectOptions::from_str(url)
                .map_err(|e| Error::Configuration(format!("Invalid database URL {}: {}", url, e)))?
                .create_if_missing(true);
            Self::connect_with(options).await
        } else {
            Self::new_with_path(url).await
        }
    }
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        Self::connect_with(options).await
    }

    async fn connect_with(options: SqliteConnectOptions) -> Result<Self> {
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| Error::Configuration(format!("Failed to connect to database: {}", e)))?;

        for (i, statement) in SCHEMA.iter().enumerate() {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(|e| Error::Storage(format!("Failed to apply schema statement {}: {}", i, e)))?;
        }

        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

// Fixed-width UTC form so lexical order in SQL equals chronological order.
// Digits below a microsecond are dropped.
fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Storage(format!("Failed to parse date {}: {}", raw, e)))
}

fn article_from_row(row: &SqliteRow) -> Result<Article> {
    let category: String = row.get("category");
    Ok(Article {
        url: row.get("url"),
        title: row.get("title"),
        category: Category::from_str(&category)
            .map_err(|_| Error::Storage(format!("Unknown category in store: {}", category)))?,
        scraped_at: parse_timestamp(&row.get::<String, _>("scraped_at"))?,
    })
}

fn storage_error(action: &str) -> impl FnOnce(sqlx::Error) -> Error + '_ {
    move |e| Error::Storage(format!("Failed to {}: {}", action, e))
}

#[async_trait]
impl ArticleStorage for SQLiteStorage {
    async fn exists(&self, url: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM articles WHERE url = ? LIMIT 1")
            .bind(url)
            .fetch_optional(&*self.pool)
            .await
            .map_err(storage_error("check article"))?;
        Ok(row.is_some())
    }

    async fn insert(&self, article: &Article) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO articles (url, title, category, scraped_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(url) DO NOTHING
            "#,
        )
        .bind(&article.url)
        .bind(&article.title)
        .bind(article.category.label())
        .bind(timestamp(&article.scraped_at))
        .execute(&*self.pool)
        .await
        .map_err(storage_error("store article"))?;

        if result.rows_affected() == 0 {
            return Err(Error::DuplicateUrl(article.url.clone()));
        }
        Ok(())
    }

    async fn list(&self, filter: &ArticleFilter) -> Result<Vec<Article>> {
        let mut query =
            QueryBuilder::<Sqlite>::new("SELECT url, title, category, scraped_at FROM articles WHERE 1 = 1");
        if let Some(category) = filter.category {
            query.push(" AND category = ").push_bind(category.label());
        }
        if let Some(since) = filter.since {
            query.push(" AND scraped_at >= ").push_bind(timestamp(&since));
        }
        if let Some(until) = filter.until {
            query.push(" AND scraped_at <= ").push_bind(timestamp(&until));
        }
        query.push(" ORDER BY scraped_at DESC, url ASC");
        if let Some(limit) = filter.limit {
            query.push(" LIMIT ").push_bind(limit as i64);
        }

        let rows = query
            .build()
            .fetch_all(&*self.pool)
            .await
            .map_err(storage_error("list articles"))?;

        rows.iter().map(article_from_row).collect()
    }

    async fn count(&self, category: Option<Category>) -> Result<usize> {
        let count = match category {
            Some(category) => sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM articles WHERE category = ?")
                .bind(category.label())
                .fetch_one(&*self.pool)
                .await,
            None => sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM articles")
                .fetch_one(&*self.pool)
                .await,
        }
        .map_err(storage_error("count articles"))?;
        Ok(count as usize)
    }

    async fn latest_scraped_at(&self) -> Result<Option<DateTime<Utc>>> {
        let latest = sqlx::query_scalar::<_, Option<String>>("SELECT MAX(scraped_at) FROM articles")
            .fetch_one(&*self.pool)
            .await
            .map_err(storage_error("read latest scrape time"))?;
        latest.as_deref().map(parse_timestamp).transpose()
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        let labels = sqlx::query_scalar::<_, String>("SELECT DISTINCT category FROM articles")
            .fetch_all(&*self.pool)
            .await
            .map_err(storage_error("list categories"))?;

        let mut categories = labels
            .iter()
            .map(|l| {
                Category::from_str(l).map_err(|_| Error::Storage(format!("Unknown category in store: {}", l)))
            })
            .collect::<Result<Vec<_>>>()?;
        categories.sort();
        Ok(categories)
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        tracing::debug!("SQLite pool closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use an_core::Candidate;
    use chrono::{Duration, SubsecRound};
    use tempfile::tempdir;

    fn article(url: &str, category: Category, scraped_at: DateTime<Utc>) -> Article {
        Article::new(Candidate::new("Test Article", url), category, scraped_at)
    }

    #[tokio::test]
    async fn test_sqlite_storage() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("nested").join("test.db");

        let storage = SQLiteStorage::new_with_path(&db_path).await.unwrap();
        assert!(db_path.exists());

        let a = article("http://example.com/a", Category::Llm, Utc::now().trunc_subsecs(6));
        assert!(!storage.exists(&a.url).await.unwrap());
        storage.insert(&a).await.unwrap();
        assert!(storage.exists(&a.url).await.unwrap());
        assert!(!storage.exists("http://example.com/A").await.unwrap());

        let stored = storage.list(&ArticleFilter::default()).await.unwrap();
        assert_eq!(stored, vec![a]);
    }

    #[tokio::test]
    async fn test_sqlite_rejects_duplicate_url() {
        let temp_dir = tempdir().unwrap();
        let storage = SQLiteStorage::new_with_path(temp_dir.path().join("test.db"))
            .await
            .unwrap();

        let a = article("http://example.com/a", Category::Llm, Utc::now());
        storage.insert(&a).await.unwrap();
        let err = storage.insert(&a).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateUrl(_)));
        assert_eq!(storage.count(None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sqlite_filters_and_stats() {
        let temp_dir = tempdir().unwrap();
        let url = format!("sqlite://{}", temp_dir.path().join("test.db").display());
        let storage = SQLiteStorage::connect(Some(&url)).await.unwrap();

        let now = Utc::now();
        storage.insert(&article("http://a", Category::Llm, now - Duration::days(3))).await.unwrap();
        storage.insert(&article("http://b", Category::Robotics, now - Duration::days(1))).await.unwrap();
        storage.insert(&article("http://c", Category::Uncategorized, now)).await.unwrap();

        let all = storage.list(&ArticleFilter::default()).await.unwrap();
        let urls = all.iter().map(|a| a.url.as_str()).collect::<Vec<_>>();
        assert_eq!(urls, vec!["http://c", "http://b", "http://a"]);

        let window = storage
            .list(
                &ArticleFilter::default()
                    .since(now - Duration::days(2))
                    .until(now - Duration::hours(1)),
            )
            .await
            .unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].url, "http://b");

        let limited = storage
            .list(&ArticleFilter::default().with_category(Category::Llm).with_limit(5))
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);

        assert_eq!(storage.count(None).await.unwrap(), 3);
        assert_eq!(storage.count(Some(Category::Robotics)).await.unwrap(), 1);
        assert_eq!(
            storage.latest_scraped_at().await.unwrap().map(|t| t.timestamp_micros()),
            Some(now.timestamp_micros())
        );
        assert_eq!(
            storage.categories().await.unwrap(),
            vec![Category::Llm, Category::Robotics, Category::Uncategorized]
        );

        storage.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_sqlite_missing_url_is_configuration_error() {
        let err = SQLiteStorage::connect(None).await.err().unwrap();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
