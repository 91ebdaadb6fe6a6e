use an_core::{Candidate, Config, Error, SearchProvider};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::allow_list::AllowList;

/// Turns topic queries into allow-listed candidates, spacing provider requests by
/// a fixed delay.
pub struct Harvester {
    provider: Arc<dyn SearchProvider>,
    allow_list: Arc<AllowList>,
    delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl Harvester {
    pub fn new(config: &Config, provider: Arc<dyn SearchProvider>) -> Self {
        Self {
            provider,
            allow_list: Arc::new(AllowList::new(&config.allow_list)),
            delay: config.request_delay(),
            last_request: Mutex::new(None),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Issues one provider request for `topic`. A failed request yields an empty
    /// harvest that carries the error instead of returning it.
    pub async fn harvest(&self, topic: &str, max_results: usize) -> Harvest {
        let query = self.allow_list.site_query(topic);

        // held across the request so two harvests never overlap
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            tokio::time::sleep_until(previous + self.delay).await;
        }
        debug!("Querying {} for {:?}", self.provider.name(), query);
        let result = self.provider.search(&query, max_results).await;
        *last = Some(Instant::now());
        drop(last);

        match result {
            Ok(hits) => Harvest {
                topic: topic.to_string(),
                hits: hits.into_iter(),
                allow_list: self.allow_list.clone(),
                failure: None,
            },
            Err(e) => {
                warn!("⚠️ Harvesting {:?} failed: {}", topic, e);
                Harvest {
                    topic: topic.to_string(),
                    hits: Vec::new().into_iter(),
                    allow_list: self.allow_list.clone(),
                    failure: Some(e),
                }
            }
        }
    }
}

/// Candidates from a single provider request. Filtering happens as the harvest is
/// iterated; once drained it cannot be restarted.
pub struct Harvest {
    topic: String,
    hits: std::vec::IntoIter<Candidate>,
    allow_list: Arc<AllowList>,
    failure: Option<Error>,
}

impl Harvest {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn failure(&self) -> Option<&Error> {
        self.failure.as_ref()
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

impl Iterator for Harvest {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        loop {
            let hit = self.hits.next()?;
            let title = normalize_title(&hit.title);
            if title.is_empty() {
                debug!("Dropping untitled result {}", hit.url);
                continue;
            }
            if !self.allow_list.allows(&hit.url) {
                debug!("Dropping result outside the allow-list: {}", hit.url);
                continue;
            }
            return Some(Candidate::new(title, hit.url));
        }
    }
}

fn normalize_title(title: &str) -> String {
    title.split_whitespace().collect::<Vec<_>>().join(" ")
}
