//! Fetcher trait shared by every data source.

use crate::error::FetchResult;
use async_trait::async_trait;

/// A data source producing one record group per run.
#[async_trait]
pub trait Fetcher<T>: Send + Sync {
    /// Source name for logs.
    fn source(&self) -> &str;

    /// Fetch and validate the record group.
    async fn fetch(&self) -> FetchResult<Vec<T>>;
}
