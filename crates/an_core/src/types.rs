use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Topic label assigned to an article by keyword classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "LLM")]
    Llm,
    #[serde(rename = "Computer Vision")]
    ComputerVision,
    #[serde(rename = "Robotics")]
    Robotics,
    #[serde(rename = "Machine Learning")]
    MachineLearning,
    #[serde(rename = "AI Tools")]
    AiTools,
    #[serde(rename = "General AI")]
    GeneralAi,
    #[serde(rename = "uncategorized")]
    #[default]
    Uncategorized,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Llm,
        Category::ComputerVision,
        Category::Robotics,
        Category::MachineLearning,
        Category::AiTools,
        Category::GeneralAi,
        Category::Uncategorized,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Llm => "LLM",
            Category::ComputerVision => "Computer Vision",
            Category::Robotics => "Robotics",
            Category::MachineLearning => "Machine Learning",
            Category::AiTools => "AI Tools",
            Category::GeneralAi => "General AI",
            Category::Uncategorized => "uncategorized",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::Configuration(format!("Unknown category: {}", s)))
    }
}

/// A stored news article. `url` is the identity key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub url: String,
    #[serde(alias = "type_of_ai_tool")]
    pub category: Category,
    pub scraped_at: DateTime<Utc>,
}

impl Article {
    pub fn new(candidate: Candidate, category: Category, scraped_at: DateTime<Utc>) -> Self {
        Self {
            title: candidate.title,
            url: candidate.url,
            category,
            scraped_at,
        }
    }
}

/// A raw search result, before classification and dedup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub title: String,
    pub url: String,
}

impl Candidate {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// Read-side query over stored articles. Results are always newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleFilter {
    pub category: Option<Category>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl ArticleFilter {
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    /// Whether an article passes the category and time bounds. `limit` is not applied here.
    pub fn matches(&self, article: &Article) -> bool {
        self.category.map_or(true, |c| article.category == c)
            && self.since.map_or(true, |s| article.scraped_at >= s)
            && self.until.map_or(true, |u| article.scraped_at <= u)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_category_labels_round_trip_through_from_str() {
        for category in Category::ALL {
            assert_eq!(category.label().parse::<Category>().unwrap(), category);
        }
        assert_eq!("llm".parse::<Category>().unwrap(), Category::Llm);
        assert_eq!(" machine learning ".parse::<Category>().unwrap(), Category::MachineLearning);
        assert!("Quantum".parse::<Category>().is_err());
    }

    #[test]
    fn test_default_category() {
        assert_eq!(Category::default(), Category::Uncategorized);
        assert_eq!(Category::default().to_string(), "uncategorized");
    }

    #[test]
    fn test_article_serialized_shape() {
        let scraped_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let article = Article::new(
            Candidate::new("GPT-5 announced", "https://techcrunch.com/gpt5"),
            Category::Llm,
            scraped_at,
        );

        let json = serde_json::to_value(&article).unwrap();
        assert_eq!(json["title"], "GPT-5 announced");
        assert_eq!(json["url"], "https://techcrunch.com/gpt5");
        assert_eq!(json["category"], "LLM");
        assert_eq!(json["scraped_at"], "2024-05-01T12:30:00Z");
    }

    #[test]
    fn test_article_accepts_legacy_category_field() {
        let json = r#"{
            "title": "Robots everywhere",
            "url": "https://wired.com/robots",
            "type_of_ai_tool": "Robotics",
            "scraped_at": "2024-05-01T12:30:00+00:00"
        }"#;
        let article: Article = serde_json::from_str(json).unwrap();
        assert_eq!(article.category, Category::Robotics);
    }

    #[test]
    fn test_filter_matches() {
        let now = Utc::now();
        let article = Article::new(
            Candidate::new("Title", "https://example.com"),
            Category::Robotics,
            now,
        );

        assert!(ArticleFilter::default().matches(&article));
        assert!(ArticleFilter::default().with_category(Category::Robotics).matches(&article));
        assert!(!ArticleFilter::default().with_category(Category::Llm).matches(&article));
        assert!(ArticleFilter::default().since(now - Duration::hours(1)).matches(&article));
        assert!(!ArticleFilter::default().since(now + Duration::hours(1)).matches(&article));
        assert!(ArticleFilter::default().until(now).matches(&article));
        assert!(!ArticleFilter::default().until(now - Duration::seconds(1)).matches(&article));
    }
}
