pub mod classify;
pub mod config;
pub mod error;
pub mod search;
pub mod storage;
pub mod types;

pub use classify::{CategoryRule, CategoryTable};
pub use config::Config;
pub use error::{Error, Result};
pub use search::SearchProvider;
pub use storage::ArticleStorage;
pub use types::{Article, ArticleFilter, Candidate, Category};
