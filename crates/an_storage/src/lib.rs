use an_core::{ArticleStorage, Error, Result};
use async_trait::async_trait;
use std::sync::Arc;

pub mod backends;

pub use backends::*;

#[async_trait]
pub trait StorageBackend: ArticleStorage + Sized {
    /// Hint shown when the backend cannot be reached at startup
    fn get_error_message() -> &'static str;

    async fn connect(database_url: Option<&str>) -> Result<Self>;
}

/// Opens the named backend. Any failure here is a configuration error: the run
/// must not start without a reachable store.
pub async fn create_storage(kind: &str, database_url: Option<&str>) -> Result<Arc<dyn ArticleStorage>> {
    match kind {
        "memory" => Ok(Arc::new(open::<MemoryStorage>(database_url).await?)),
        #[cfg(feature = "sqlite")]
        "sqlite" => Ok(Arc::new(open::<SQLiteStorage>(database_url).await?)),
        other => Err(Error::Configuration(format!("Unknown storage backend: {}", other))),
    }
}

async fn open<T: StorageBackend>(database_url: Option<&str>) -> Result<T> {
    let storage = T::connect(database_url).await.map_err(|e| match e {
        Error::Configuration(_) => e,
        other => Error::Configuration(format!("{} ({})", T::get_error_message(), other)),
    })?;
    storage
        .ping()
        .await
        .map_err(|e| Error::Configuration(format!("{} ({})", T::get_error_message(), e)))?;
    Ok(storage)
}
