use async_trait::async_trait;

use crate::types::Candidate;
use crate::Result;

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Run one search request and return at most `max_results` hits, in provider order
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Candidate>>;
}
