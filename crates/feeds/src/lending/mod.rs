//! Lending-market adapters.
//!
//! Each protocol exposes its own API shape. Adapters normalize these into
//! a `LendingMarketRecord` for the tracked asset; `LendingFetcher` runs all
//! of them concurrently and combines the rows.

mod echelon;
mod justlend;
mod kamino;
mod lista;
mod wlfi;

pub use echelon::EchelonAdapter;
pub use justlend::JustLendAdapter;
pub use kamino::KaminoAdapter;
pub use lista::ListaAdapter;
pub use wlfi::WlfiAdapter;

use crate::error::{FetchError, FetchResult};
use crate::fetcher::Fetcher;
use crate::http::HttpClient;
use async_trait::async_trait;
use futures_util::future::join_all;
use std::sync::Arc;
use tracing::{info, warn};
use usd1_core::LendingMarketRecord;

/// Trait for protocol-specific lending adapters.
#[async_trait]
pub trait LendingAdapter: Send + Sync {
    /// Display name used in the report
    fn protocol(&self) -> &'static str;

    /// Public market page linked from the report
    fn market_url(&self) -> &'static str;

    /// Fetch the market for `asset`.
    async fn fetch_market(&self, http: &HttpClient, asset: &str)
        -> FetchResult<LendingMarketRecord>;
}

/// Adapters in report order.
pub fn default_adapters() -> Vec<Box<dyn LendingAdapter>> {
    vec![
        Box::new(WlfiAdapter),
        Box::new(EchelonAdapter),
        Box::new(JustLendAdapter),
        Box::new(KaminoAdapter),
        Box::new(ListaAdapter),
    ]
}

/// Combines every lending adapter into one record group.
///
/// A failing adapter yields an all-`N/A` row for its protocol; the group
/// only fails when every adapter fails.
pub struct LendingFetcher {
    http: Arc<HttpClient>,
    asset: String,
    adapters: Vec<Box<dyn LendingAdapter>>,
}

impl LendingFetcher {
    pub fn new(http: Arc<HttpClient>, asset: impl Into<String>) -> Self {
        Self::with_adapters(http, asset, default_adapters())
    }

    pub fn with_adapters(
        http: Arc<HttpClient>,
        asset: impl Into<String>,
        adapters: Vec<Box<dyn LendingAdapter>>,
    ) -> Self {
        Self {
            http,
            asset: asset.into(),
            adapters,
        }
    }
}

#[async_trait]
impl Fetcher<LendingMarketRecord> for LendingFetcher {
    fn source(&self) -> &str {
        "lending"
    }

    async fn fetch(&self) -> FetchResult<Vec<LendingMarketRecord>> {
        let futures = self.adapters.iter().map(|adapter| async move {
            let result = adapter.fetch_market(&self.http, &self.asset).await;
            (adapter, result)
        });
        let results = join_all(futures).await;

        let mut records = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for (adapter, result) in results {
            let protocol = adapter.protocol();
            let result = result.and_then(|record| match record.validate() {
                Ok(()) => Ok(record),
                Err(e) => Err(FetchError::InvalidValue {
                    field: protocol.to_string(),
                    reason: e.to_string(),
                }),
            });
            match result {
                Ok(record) => {
                    info!(
                        protocol = protocol,
                        has_data = record.has_data(),
                        "Lending market fetched"
                    );
                    records.push(record.with_link(adapter.market_url()));
                }
                Err(e) => {
                    warn!(protocol = protocol, error = %e, "Lending adapter failed");
                    failures.push(format!("{protocol}: {e}"));
                    records.push(
                        LendingMarketRecord::unavailable(protocol).with_link(adapter.market_url()),
                    );
                }
            }
        }

        if !self.adapters.is_empty() && failures.len() == self.adapters.len() {
            return Err(FetchError::AllFailed(failures.join("; ")));
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpConfig;
    use usd1_core::Rate;

    struct Canned {
        protocol: &'static str,
        ok: bool,
    }

    /// Returns a record with an infinite borrow rate.
    struct Overflowing;

    #[async_trait]
    impl LendingAdapter for Overflowing {
        fn protocol(&self) -> &'static str {
            "Overflowing"
        }

        fn market_url(&self) -> &'static str {
            "https://example.test/overflowing"
        }

        async fn fetch_market(
            &self,
            _http: &HttpClient,
            _asset: &str,
        ) -> FetchResult<LendingMarketRecord> {
            Ok(LendingMarketRecord::unavailable("Overflowing")
                .with_supply(Some(5.0), Rate::Simple(4.0))
                .with_borrow(Some(1.0), Rate::Simple(f64::INFINITY)))
        }
    }

    #[async_trait]
    impl LendingAdapter for Canned {
        fn protocol(&self) -> &'static str {
            self.protocol
        }

        fn market_url(&self) -> &'static str {
            "https://example.test/market"
        }

        async fn fetch_market(
            &self,
            _http: &HttpClient,
            _asset: &str,
        ) -> FetchResult<LendingMarketRecord> {
            if self.ok {
                Ok(LendingMarketRecord::unavailable(self.protocol)
                    .with_supply(Some(1_000_000.0), Rate::Simple(5.0)))
            } else {
                Err(FetchError::NotFound(format!("{} market", self.protocol)))
            }
        }
    }

    fn fetcher(adapters: Vec<Box<dyn LendingAdapter>>) -> LendingFetcher {
        let http = Arc::new(HttpClient::new(&HttpConfig::default()).unwrap());
        LendingFetcher::with_adapters(http, "USD1", adapters)
    }

    #[test]
    fn test_default_adapter_order() {
        let names: Vec<&str> = default_adapters().iter().map(|a| a.protocol()).collect();
        assert_eq!(names, vec!["WLFI Markets", "Echelon", "JustLend", "Kamino", "Lista"]);
    }

    #[tokio::test]
    async fn test_failed_adapter_becomes_unavailable_row() {
        let fetcher = fetcher(vec![
            Box::new(Canned { protocol: "A", ok: true }),
            Box::new(Canned { protocol: "B", ok: false }),
        ]);
        let records = fetcher.fetch().await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].has_data());
        assert_eq!(records[1].protocol, "B");
        assert!(!records[1].has_data());
        assert_eq!(records[1].link.as_deref(), Some("https://example.test/market"));
    }

    #[tokio::test]
    async fn test_invalid_record_becomes_unavailable_row() {
        let fetcher = fetcher(vec![
            Box::new(Canned { protocol: "A", ok: true }),
            Box::new(Overflowing),
        ]);
        let records = fetcher.fetch().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].protocol, "Overflowing");
        assert!(!records[1].has_data());
        assert_eq!(records[1].link.as_deref(), Some("https://example.test/overflowing"));
        assert!(records.iter().all(|r| r.validate().is_ok()));
    }

    #[tokio::test]
    async fn test_only_invalid_records_is_all_failed() {
        let fetcher = fetcher(vec![Box::new(Overflowing)]);
        match fetcher.fetch().await {
            Err(FetchError::AllFailed(summary)) => {
                assert!(summary.starts_with("Overflowing: Invalid value for Overflowing"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_all_adapters_failed() {
        let fetcher = fetcher(vec![
            Box::new(Canned { protocol: "A", ok: false }),
            Box::new(Canned { protocol: "B", ok: false }),
        ]);
        match fetcher.fetch().await {
            Err(FetchError::AllFailed(summary)) => {
                assert!(summary.contains("A: Not found: A market"));
                assert!(summary.contains("B: "));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_no_adapters_is_empty_group() {
        let fetcher = fetcher(Vec::new());
        assert!(fetcher.fetch().await.unwrap().is_empty());
    }
}
