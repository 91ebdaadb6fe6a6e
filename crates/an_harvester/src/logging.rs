use std::sync::Once;
use tracing::Level;

static INIT: Once = Once::new();

/// Tags `tracing` lines with a chain of scopes such as `[pipeline] [AI news]`.
#[derive(Debug, Clone, Default)]
pub struct Logger {
    scopes: Vec<String>,
}

impl Logger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(mut self, scope: String) -> Self {
        self.scopes.push(scope);
        self
    }

    fn line(&self, message: &str) -> String {
        if self.scopes.is_empty() {
            return message.to_string();
        }
        format!("{} {}", self.scopes.join(" "), message)
    }

    pub fn info(&self, message: &str) {
        tracing::info!("{}", self.line(message));
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!("{}", self.line(message));
    }

    pub fn debug(&self, message: &str) {
        tracing::debug!("{}", self.line(message));
    }
}

/// Installs the global fmt subscriber at `level`. Only the first call in a
/// process has any effect, and none if another subscriber is already set.
pub fn init_logging(level: Level) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    INIT.call_once(|| {
        tracing_subscriber::fmt().with_max_level(level).init();
    });
}
