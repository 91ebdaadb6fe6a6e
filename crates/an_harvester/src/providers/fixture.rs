use an_core::{Candidate, Error, Result, SearchProvider};
use async_trait::async_trait;
use std::path::Path;

/// Serves the same canned results for every query. Used for offline runs.
#[derive(Debug, Clone, Default)]
pub struct FixtureProvider {
    results: Vec<Candidate>,
}

impl FixtureProvider {
    pub fn new(results: Vec<Candidate>) -> Self {
        Self { results }
    }

    /// Reads a JSON array of `{"title": ..., "url": ...}` objects.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("Failed to read fixture {}: {}", path.display(), e))
        })?;
        Ok(Self::new(serde_json::from_str(&raw)?))
    }
}

#[async_trait]
impl SearchProvider for FixtureProvider {
    fn name(&self) -> &str {
        "fixture"
    }

    async fn search(&self, _query: &str, max_results: usize) -> Result<Vec<Candidate>> {
        Ok(self.results.iter().take(max_results).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_fixture_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"title": "A", "url": "https://techcrunch.com/a"}},
                {{"title": "B", "url": "https://wired.com/b"}}]"#
        )
        .unwrap();

        let provider = FixtureProvider::from_file(file.path()).unwrap();
        let all = provider.search("anything", 10).await.unwrap();
        assert_eq!(all.len(), 2);
        let one = provider.search("anything", 1).await.unwrap();
        assert_eq!(one, vec![Candidate::new("A", "https://techcrunch.com/a")]);
    }

    #[test]
    fn test_fixture_missing_file() {
        assert!(matches!(
            FixtureProvider::from_file("/no/such/fixture.json"),
            Err(Error::Configuration(_))
        ));
    }
}
