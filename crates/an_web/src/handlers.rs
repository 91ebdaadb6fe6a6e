use an_core::{Article, ArticleFilter, Category};
use an_harvester::RunSummary;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::AppState;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<an_core::Error> for ApiError {
    fn from(e: an_core::Error) -> Self {
        tracing::error!("❌ Request failed: {}", e);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub category: Option<String>,
    pub limit: Option<usize>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl ListParams {
    fn into_filter(self) -> std::result::Result<ArticleFilter, ApiError> {
        let category = self
            .category
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"))
            .map(|c| c.parse::<Category>())
            .transpose()
            .map_err(|e| ApiError::bad_request(e.to_string()))?;
        Ok(ArticleFilter {
            category,
            since: self.since,
            until: self.until,
            limit: self.limit,
        })
    }
}

pub async fn list_articles(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<Article>> {
    let filter = params.into_filter()?;
    Ok(Json(state.storage.list(&filter).await?))
}

pub async fn list_categories(State(state): State<Arc<AppState>>) -> ApiResult<Vec<String>> {
    let categories = state.storage.categories().await?;
    Ok(Json(categories.iter().map(|c| c.label().to_string()).collect()))
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Stats {
    pub total: usize,
    pub by_category: BTreeMap<String, usize>,
    pub latest_scrape: Option<DateTime<Utc>>,
}

pub async fn get_stats(State(state): State<Arc<AppState>>) -> ApiResult<Stats> {
    let mut by_category = BTreeMap::new();
    for category in state.storage.categories().await? {
        by_category.insert(category.label().to_string(), state.storage.count(Some(category)).await?);
    }
    Ok(Json(Stats {
        total: state.storage.count(None).await?,
        by_category,
        latest_scrape: state.storage.latest_scraped_at().await?,
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RunRequest {
    pub topics: Option<Vec<String>>,
    pub max_articles: Option<usize>,
}

/// Manual trigger for the same pipeline the scheduler runs. An empty body uses the
/// configured topics and cap.
pub async fn run_pipeline(State(state): State<Arc<AppState>>, body: Bytes) -> ApiResult<RunSummary> {
    let request: RunRequest = if body.is_empty() {
        RunRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::bad_request(format!("Invalid run request: {}", e)))?
    };

    let topics = request.topics.unwrap_or_else(|| state.config.topics.clone());
    let max_articles = request.max_articles.unwrap_or(state.config.max_articles);
    tracing::info!("🦗 Manual run requested for {} topics", topics.len());

    Ok(Json(state.pipeline.run(&topics, max_articles).await?))
}
