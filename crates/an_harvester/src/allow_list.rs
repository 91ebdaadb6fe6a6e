use url::Url;

/// Source domains results are accepted from. A host passes when it equals a listed
/// domain or is a subdomain of one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    domains: Vec<String>,
}

impl AllowList {
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let domains = domains
            .into_iter()
            .map(|d| d.as_ref().trim().trim_matches('.').to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        Self { domains }
    }

    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    pub fn allows(&self, url: &str) -> bool {
        let Ok(url) = Url::parse(url) else {
            return false;
        };
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.trim_end_matches('.').to_lowercase();
        self.domains.iter().any(|domain| {
            host == *domain
                || host
                    .strip_suffix(domain.as_str())
                    .map_or(false, |rest| rest.ends_with('.'))
        })
    }

    /// Search string restricted to the listed sites with `site:` operators.
    pub fn site_query(&self, topic: &str) -> String {
        if self.domains.is_empty() {
            return topic.to_string();
        }
        let sites = self
            .domains
            .iter()
            .map(|d| format!("site:{}", d))
            .collect::<Vec<_>>()
            .join(" OR ");
        format!("{} {}", topic.trim(), sites)
    }
}
