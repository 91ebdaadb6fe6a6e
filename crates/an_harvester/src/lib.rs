pub mod allow_list;
pub mod harvester;
pub mod logging;
pub mod pipeline;
pub mod providers;

pub use allow_list::AllowList;
pub use harvester::{Harvest, Harvester};
pub use logging::{init_logging, Logger};
pub use pipeline::{ArticleStatus, Pipeline, RunSummary};
