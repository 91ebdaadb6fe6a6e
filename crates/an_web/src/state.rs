use an_core::{ArticleStorage, Config};
use an_harvester::Pipeline;
use std::sync::Arc;

pub struct AppState {
    pub storage: Arc<dyn ArticleStorage>,
    pub pipeline: Arc<Pipeline>,
    /// Default topics and article cap for `POST /api/run`
    pub config: Config,
}
