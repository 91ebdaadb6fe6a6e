use an_core::Article;
use chrono::{DateTime, Utc};

/// Coarse relative time, e.g. `just now`, `5m ago`, `3h ago`, `2d ago`.
pub fn format_time_ago(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(at);
    if elapsed.num_minutes() < 1 {
        "just now".to_string()
    } else if elapsed.num_hours() < 1 {
        format!("{}m ago", elapsed.num_minutes())
    } else if elapsed.num_days() < 1 {
        format!("{}h ago", elapsed.num_hours())
    } else {
        format!("{}d ago", elapsed.num_days())
    }
}

pub fn article_line(article: &Article, now: DateTime<Utc>) -> String {
    format!(
        "[{}] {} - {} ({})",
        article.category,
        article.title,
        article.url,
        format_time_ago(article.scraped_at, now)
    )
}
