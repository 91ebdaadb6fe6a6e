use an_core::{ArticleFilter, ArticleStorage, Category, Config, Error, Result, SearchProvider};
use an_harvester::providers::{DuckDuckGoProvider, FixtureProvider};
use an_harvester::{init_logging, Pipeline};
use an_web::AppState;
use chrono::{DateTime, Duration, Utc};
use clap::Parser;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, Level};

mod display;
mod duration;

use duration::HumanDuration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Collects AI news from search results into a local store", long_about = None)]
pub struct Cli {
    /// Storage backend: sqlite or memory
    #[arg(long, default_value = "sqlite")]
    storage: String,
    /// Connection string for the store. Falls back to DATABASE_URL.
    #[arg(long)]
    database_url: Option<String>,
    /// JSON config file; missing fields use built-in defaults
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Harvest, classify and store new articles
    Run {
        /// Topic to search for; repeat for several. Defaults to the configured topics.
        #[arg(long = "topic")]
        topics: Vec<String>,
        #[arg(long)]
        max_articles: Option<usize>,
        /// Serve search results from a JSON file instead of querying the web
        #[arg(long)]
        fixture: Option<PathBuf>,
        /// Run in periodic mode with the specified interval (e.g. 1h, 30m, 1d, 1h15m30s)
        #[arg(long)]
        interval: Option<HumanDuration>,
    },
    /// Show stored articles, newest first
    List {
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// Only articles scraped in the last N days
        #[arg(long)]
        days: Option<u32>,
        /// Print JSON instead of one line per article
        #[arg(long)]
        json: bool,
    },
    /// Article counts per category and the latest scrape time
    Stats,
    /// Print the category a title would get, without touching the store
    Classify {
        #[arg(required = true)]
        title: Vec<String>,
    },
    /// Serve the JSON read API
    Serve {
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: SocketAddr,
        #[arg(long)]
        fixture: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path),
        None => Ok(Config::default()),
    }
}

fn create_provider(config: &Config, fixture: Option<&Path>) -> Result<Arc<dyn SearchProvider>> {
    match fixture {
        Some(path) => Ok(Arc::new(FixtureProvider::from_file(path)?)),
        None => Ok(Arc::new(DuckDuckGoProvider::new(config)?)),
    }
}

async fn open_storage(cli: &Cli) -> Result<Arc<dyn ArticleStorage>> {
    let database_url = cli
        .database_url
        .clone()
        .or_else(|| std::env::var("DATABASE_URL").ok());

    info!("💾 Checking storage connection...");
    let storage = an_storage::create_storage(&cli.storage, database_url.as_deref()).await?;
    info!("✨ Storage initialized successfully (using {})", cli.storage);
    Ok(storage)
}

/// Start of a window reaching `days` back from `now`.
fn days_ago(days: u32, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    Duration::try_days(i64::from(days))
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or_else(|| Error::Configuration(format!("--days {} reaches past the supported date range", days)))
}

async fn run_once(pipeline: &Pipeline, topics: &[String], max_articles: usize) -> Result<()> {
    let summary = pipeline.run(topics, max_articles).await?;
    println!("✅ {}", summary);
    println!(
        "📊 Total articles in store: {}",
        pipeline.storage().count(None).await?
    );
    Ok(())
}

async fn list(storage: &dyn ArticleStorage, category: Option<&str>, limit: usize, days: Option<u32>, json: bool) -> Result<()> {
    let mut filter = ArticleFilter::default().with_limit(limit);
    if let Some(category) = category {
        filter = filter.with_category(category.parse::<Category>()?);
    }
    if let Some(days) = days {
        filter = filter.since(days_ago(days, Utc::now())?);
    }

    let articles = storage.list(&filter).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&articles)?);
    } else {
        let now = Utc::now();
        for article in &articles {
            println!("{}", display::article_line(article, now));
        }
        println!("{} articles", articles.len());
    }
    Ok(())
}

async fn stats(storage: &dyn ArticleStorage) -> Result<()> {
    println!("📊 Total articles: {}", storage.count(None).await?);
    for category in storage.categories().await? {
        println!("  {:<18} {}", category.label(), storage.count(Some(category)).await?);
    }
    match storage.latest_scraped_at().await? {
        Some(latest) => println!(
            "🕒 Latest scrape: {} ({})",
            latest.to_rfc3339(),
            display::format_time_ago(latest, Utc::now())
        ),
        None => println!("🕒 No articles stored yet"),
    }
    Ok(())
}

async fn close_after(storage: Arc<dyn ArticleStorage>, result: Result<()>) -> Result<()> {
    storage.close().await?;
    result
}

async fn execute(cli: &Cli, config: Config) -> Result<()> {
    match &cli.command {
        Commands::Run {
            topics,
            max_articles,
            fixture,
            interval,
        } => {
            let provider = create_provider(&config, fixture.as_deref())?;
            let storage = open_storage(cli).await?;
            let pipeline = Pipeline::new(&config, provider, storage.clone())?;
            let topics = if topics.is_empty() { config.topics.clone() } else { topics.clone() };
            let max_articles = max_articles.unwrap_or(config.max_articles);

            let result = match interval {
                Some(interval) => {
                    info!("Running in periodic mode with {}s interval", interval.0.as_secs());
                    loop {
                        info!("Starting scrape cycle");
                        if let Err(e) = run_once(&pipeline, &topics, max_articles).await {
                            error!("Error during scrape: {}", e);
                        }
                        info!("Waiting {}s before next scrape", interval.0.as_secs());
                        tokio::time::sleep(interval.0).await;
                    }
                }
                None => run_once(&pipeline, &topics, max_articles).await,
            };
            close_after(storage, result).await
        }
        Commands::List {
            category,
            limit,
            days,
            json,
        } => {
            let storage = open_storage(cli).await?;
            let result = list(storage.as_ref(), category.as_deref(), *limit, *days, *json).await;
            close_after(storage, result).await
        }
        Commands::Stats => {
            let storage = open_storage(cli).await?;
            let result = stats(storage.as_ref()).await;
            close_after(storage, result).await
        }
        // needs no store
        Commands::Classify { title } => {
            println!("{}", config.categories.classify(&title.join(" ")));
            Ok(())
        }
        Commands::Serve { addr, fixture } => {
            let provider = create_provider(&config, fixture.as_deref())?;
            let storage = open_storage(cli).await?;
            let pipeline = Pipeline::new(&config, provider, storage.clone())?;
            let state = AppState {
                storage: storage.clone(),
                pipeline: Arc::new(pipeline),
                config,
            };
            let result = an_web::serve(state, *addr).await;
            close_after(storage, result).await
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(if cli.verbose { Level::DEBUG } else { Level::INFO });

    let config = load_config(cli.config.as_deref())?;
    execute(&cli, config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_arguments() {
        let cli = Cli::try_parse_from([
            "ainews", "--storage", "memory", "run", "--topic", "AI news", "--topic", "LLM",
            "--max-articles", "3", "--interval", "1h30m",
        ])
        .unwrap();
        assert_eq!(cli.storage, "memory");
        match cli.command {
            Commands::Run {
                topics,
                max_articles,
                fixture,
                interval,
            } => {
                assert_eq!(topics, vec!["AI news".to_string(), "LLM".to_string()]);
                assert_eq!(max_articles, Some(3));
                assert!(fixture.is_none());
                assert_eq!(interval.map(|i| i.0.as_secs()), Some(5400));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["ainews", "list"]).unwrap();
        assert_eq!(cli.storage, "sqlite");
        assert!(matches!(cli.command, Commands::List { limit: 20, json: false, .. }));

        let cli = Cli::try_parse_from(["ainews", "serve"]).unwrap();
        match cli.command {
            Commands::Serve { addr, .. } => assert_eq!(addr.port(), 8080),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_classify_requires_a_title() {
        assert!(Cli::try_parse_from(["ainews", "classify"]).is_err());
        let cli = Cli::try_parse_from(["ainews", "classify", "ChatGPT", "gets", "memory"]).unwrap();
        match cli.command {
            Commands::Classify { title } => {
                let config = Config::default();
                assert_eq!(config.categories.classify(&title.join(" ")), Category::Llm);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_classify_opens_no_store() {
        let cli = Cli::try_parse_from(["ainews", "--storage", "nowhere", "classify", "GPT-4o", "ships"]).unwrap();
        execute(&cli, Config::default()).await.unwrap();

        let cli = Cli::try_parse_from(["ainews", "--storage", "nowhere", "stats"]).unwrap();
        assert!(matches!(execute(&cli, Config::default()).await, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_days_window() {
        let cli = Cli::try_parse_from(["ainews", "list", "--days", "100000000"]).unwrap();
        let days = match cli.command {
            Commands::List { days, .. } => days.unwrap(),
            other => panic!("unexpected command {:?}", other),
        };
        assert!(matches!(days_ago(days, Utc::now()), Err(Error::Configuration(_))));
        assert!(matches!(days_ago(u32::MAX, Utc::now()), Err(Error::Configuration(_))));

        let now = Utc::now();
        assert_eq!(days_ago(2, now).unwrap(), now - Duration::days(2));
        assert!(Cli::try_parse_from(["ainews", "list", "--days", "-3"]).is_err());
    }

    #[test]
    fn test_bad_interval_is_rejected() {
        assert!(Cli::try_parse_from(["ainews", "run", "--interval", "soon"]).is_err());
    }
}
