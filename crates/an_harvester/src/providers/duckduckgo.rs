use an_core::{Candidate, Config, Error, Result, SearchProvider};
use async_trait::async_trait;
use scraper::{Html, Selector};
use url::Url;

const ENDPOINT: &str = "https://html.duckduckgo.com/html/";

/// Searches through DuckDuckGo's HTML-only endpoint, which needs no API key.
#[derive(Debug, Clone)]
pub struct DuckDuckGoProvider {
    client: reqwest::Client,
    endpoint: Url,
}

impl DuckDuckGoProvider {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            endpoint: Url::parse(ENDPOINT)?,
        })
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self> {
        self.endpoint = Url::parse(endpoint)?;
        Ok(self)
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoProvider {
    fn name(&self) -> &str {
        "DuckDuckGo"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Candidate>> {
        let url = Url::parse_with_params(self.endpoint.as_str(), &[("q", query)])?;
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Provider(format!("{} returned HTTP {}", self.name(), status)));
        }
        let html = response.text().await?;
        parse_results(&html, max_results)
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Provider(format!("Invalid selector {}: {:?}", css, e)))
}

/// Extracts `(title, url)` pairs from a results page, in page order.
pub fn parse_results(html: &str, max_results: usize) -> Result<Vec<Candidate>> {
    let document = Html::parse_document(html);
    let container = selector("#links, .results, .no-results")?;
    if document.select(&container).next().is_none() {
        return Err(Error::Provider("unexpected results page layout".to_string()));
    }

    let link = selector("a.result__a")?;
    let results = document
        .select(&link)
        .filter_map(|el| {
            let href = el.value().attr("href")?;
            let url = resolve_link(href)?;
            let title = el.text().collect::<String>();
            Some(Candidate::new(title.trim(), url))
        })
        .take(max_results)
        .collect();
    Ok(results)
}

/// Result links are usually wrapped as `//duckduckgo.com/l/?uddg=<target>`. Ads point
/// back at duckduckgo.com and are dropped.
fn resolve_link(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };
    let url = Url::parse(&absolute).ok()?;
    let on_ddg = url
        .host_str()
        .map_or(false, |h| h == "duckduckgo.com" || h.ends_with(".duckduckgo.com"));
    if !on_ddg {
        return Some(url.to_string());
    }
    if url.path() != "/l/" {
        return None;
    }
    url.query_pairs()
        .find(|(key, _)| key == "uddg")
        .map(|(_, target)| target.into_owned())
}
