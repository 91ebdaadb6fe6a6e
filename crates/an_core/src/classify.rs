use serde::{Deserialize, Serialize};

use crate::types::Category;
use crate::{Error, Result};

/// One row of the classification table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub category: Category,
    pub keywords: Vec<String>,
}

impl CategoryRule {
    pub fn new(category: Category, keywords: &[&str]) -> Self {
        Self {
            category,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Ordered category → keyword table. The first rule with a matching keyword wins,
/// so row order decides ties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryTable {
    rules: Vec<CategoryRule>,
}

impl CategoryTable {
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        Self { rules }
    }

    pub fn classify(&self, title: &str) -> Category {
        let tokens = tokenize(title);
        self.rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| contains_phrase(&tokens, &tokenize(k))))
            .map(|rule| rule.category)
            .unwrap_or(Category::Uncategorized)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rules.is_empty() {
            return Err(Error::Configuration("category table is empty".to_string()));
        }
        for rule in &self.rules {
            if rule.category == Category::Uncategorized {
                return Err(Error::Configuration(
                    "the default category cannot appear in the category table".to_string(),
                ));
            }
            if rule.keywords.iter().all(|k| tokenize(k).is_empty()) {
                return Err(Error::Configuration(format!(
                    "category {} has no keywords",
                    rule.category
                )));
            }
        }
        Ok(())
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::new(vec![
            CategoryRule::new(
                Category::Llm,
                &["gpt", "chatgpt", "claude", "gemini", "llama", "language model", "large language model", "llm"],
            ),
            CategoryRule::new(
                Category::ComputerVision,
                &["computer vision", "image recognition", "opencv", "yolo", "object detection", "image ai"],
            ),
            CategoryRule::new(
                Category::Robotics,
                &["robot", "robotics", "autonomous", "drone", "self-driving", "automation"],
            ),
            CategoryRule::new(
                Category::MachineLearning,
                &["machine learning", "ml", "neural network", "deep learning", "tensorflow", "pytorch"],
            ),
            CategoryRule::new(
                Category::AiTools,
                &["midjourney", "dall-e", "stable diffusion", "copilot", "ai assistant", "ai tool"],
            ),
            CategoryRule::new(
                Category::GeneralAi,
                &["artificial intelligence", "ai news", "ai breakthrough", "ai research"],
            ),
        ])
    }
}

// Hyphenated keywords such as "self-driving" split the same way and match as phrases.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn contains_phrase(tokens: &[String], phrase: &[String]) -> bool {
    !phrase.is_empty() && tokens.windows(phrase.len()).any(|w| w == phrase)
}
