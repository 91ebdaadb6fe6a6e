use an_core::{Article, ArticleStorage, Candidate, Category, CategoryTable, Config, Error, Result, SearchProvider};
use chrono::{SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::harvester::Harvester;
use crate::logging::Logger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleStatus {
    New,
    Duplicate,
}

impl ArticleStatus {
    pub fn emoji(&self) -> &'static str {
        match self {
            ArticleStatus::New => "🆕",
            ArticleStatus::Duplicate => "⏭️",
        }
    }
}

/// Outcome counts of one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub inserted: usize,
    pub skipped: usize,
    pub failed_queries: usize,
    pub failed_inserts: usize,
}

impl RunSummary {
    pub fn processed(&self) -> usize {
        self.inserted + self.skipped + self.failed_inserts
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} inserted, {} skipped, {} failed queries, {} failed inserts",
            self.inserted, self.skipped, self.failed_queries, self.failed_inserts
        )
    }
}

/// Harvest → classify → dedup → persist, one candidate at a time.
pub struct Pipeline {
    harvester: Harvester,
    storage: Arc<dyn ArticleStorage>,
    categories: CategoryTable,
    results_per_query: usize,
    logger: Logger,
}

impl Pipeline {
    pub fn new(config: &Config, provider: Arc<dyn SearchProvider>, storage: Arc<dyn ArticleStorage>) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_harvester(config, Harvester::new(config, provider), storage))
    }

    /// Builds the pipeline around an existing harvester, e.g. one with a custom delay.
    pub fn with_harvester(config: &Config, harvester: Harvester, storage: Arc<dyn ArticleStorage>) -> Self {
        Self {
            harvester,
            storage,
            categories: config.categories.clone(),
            results_per_query: config.results_per_query,
            logger: Logger::new().with_prefix("[pipeline]".to_string()),
        }
    }

    pub fn storage(&self) -> &Arc<dyn ArticleStorage> {
        &self.storage
    }

    pub fn classify(&self, title: &str) -> Category {
        self.categories.classify(title)
    }

    /// Classifies one candidate and stores it unless its URL is already present.
    /// `scraped_at` is kept at microsecond precision, the finest every backend stores.
    pub async fn process_candidate(&self, candidate: Candidate) -> Result<(Article, ArticleStatus)> {
        let category = self.classify(&candidate.title);
        let article = Article::new(candidate, category, Utc::now().trunc_subsecs(6));

        if self.storage.exists(&article.url).await? {
            return Ok((article, ArticleStatus::Duplicate));
        }

        match self.storage.insert(&article).await {
            Ok(()) => Ok((article, ArticleStatus::New)),
            // lost a race against another writer
            Err(Error::DuplicateUrl(_)) => Ok((article, ArticleStatus::Duplicate)),
            Err(e) => Err(e),
        }
    }

    /// Runs every topic in order until `max_articles` candidates have been consumed.
    /// Only an unreachable store aborts the run; provider and per-article failures
    /// are counted and skipped.
    pub async fn run(&self, topics: &[String], max_articles: usize) -> Result<RunSummary> {
        self.storage
            .ping()
            .await
            .map_err(|e| Error::Configuration(format!("Store unreachable: {}", e)))?;

        self.logger.info(&format!(
            "🦗 Harvesting {} topics from {} (max {} articles)",
            topics.len(),
            self.harvester.provider_name(),
            max_articles
        ));

        let mut summary = RunSummary::default();
        let mut remaining = max_articles;

        for topic in topics {
            if remaining == 0 {
                self.logger.info("Article cap reached, skipping remaining topics");
                break;
            }
            let logger = self.logger.clone().with_prefix(format!("[{}]", topic));
            logger.info("🔍 Searching");

            let harvest = self
                .harvester
                .harvest(topic, self.results_per_query.min(remaining))
                .await;
            if let Some(e) = harvest.failure() {
                logger.warn(&format!("❌ Search failed: {}", e));
                summary.failed_queries += 1;
                continue;
            }

            for candidate in harvest.take(remaining) {
                remaining -= 1;
                let url = candidate.url.clone();
                match self.process_candidate(candidate).await {
                    Ok((article, status)) => {
                        let line = format!(
                            "{} [{}] {} - {}",
                            status.emoji(),
                            article.category,
                            article.title,
                            article.url
                        );
                        match status {
                            ArticleStatus::New => {
                                summary.inserted += 1;
                                logger.info(&line);
                            }
                            ArticleStatus::Duplicate => {
                                summary.skipped += 1;
                                logger.debug(&line);
                            }
                        }
                    }
                    Err(e) => {
                        summary.failed_inserts += 1;
                        logger.warn(&format!("❌ Failed to store {}: {}", url, e));
                    }
                }
            }
        }

        self.logger.info(&format!("✅ Run finished: {}", summary));
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use an_storage::MemoryStorage;
    use async_trait::async_trait;

    struct StaticProvider(Vec<Candidate>);

    #[async_trait]
    impl SearchProvider for StaticProvider {
        fn name(&self) -> &str {
            "static"
        }

        async fn search(&self, _query: &str, max_results: usize) -> Result<Vec<Candidate>> {
            Ok(self.0.iter().take(max_results).cloned().collect())
        }
    }

    fn pipeline(storage: Arc<dyn ArticleStorage>) -> Pipeline {
        let config = Config {
            allow_list: vec!["techcrunch.com".to_string()],
            request_delay_secs: 0,
            ..Config::default()
        };
        let provider = Arc::new(StaticProvider(vec![]));
        Pipeline::new(&config, provider, storage).unwrap()
    }

    #[tokio::test]
    async fn test_process_candidate_inserts_then_skips() {
        let storage = Arc::new(MemoryStorage::new());
        let pipeline = pipeline(storage.clone());
        let candidate = Candidate::new("New Neural Network LLM Released", "https://techcrunch.com/llm");

        let (article, status) = pipeline.process_candidate(candidate.clone()).await.unwrap();
        assert_eq!(status, ArticleStatus::New);
        assert_eq!(article.category, Category::Llm);

        let (_, status) = pipeline.process_candidate(candidate).await.unwrap();
        assert_eq!(status, ArticleStatus::Duplicate);
        assert_eq!(storage.count(None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_scraped_at_is_set_at_insert() {
        let storage = Arc::new(MemoryStorage::new());
        let pipeline = pipeline(storage.clone());

        let before = Utc::now().trunc_subsecs(6);
        pipeline
            .process_candidate(Candidate::new("Quarterly results", "https://techcrunch.com/q"))
            .await
            .unwrap();
        let after = Utc::now();

        let stored = storage.list(&Default::default()).await.unwrap();
        assert_eq!(stored[0].category, Category::Uncategorized);
        assert!(stored[0].scraped_at >= before && stored[0].scraped_at <= after);
        assert_eq!(stored[0].scraped_at.timestamp_subsec_nanos() % 1_000, 0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = Config {
            allow_list: vec![],
            ..Config::default()
        };
        let result = Pipeline::new(
            &config,
            Arc::new(StaticProvider(vec![])),
            Arc::new(MemoryStorage::new()),
        );
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_summary_display() {
        let summary = RunSummary {
            inserted: 3,
            skipped: 2,
            failed_queries: 1,
            failed_inserts: 0,
        };
        assert_eq!(summary.processed(), 5);
        assert_eq!(
            summary.to_string(),
            "3 inserted, 2 skipped, 1 failed queries, 0 failed inserts"
        );
    }
}
