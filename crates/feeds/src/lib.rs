//! Data fetchers for the daily report.
//!
//! ## Architecture
//!
//! - `http` - Shared HTTP client with per-request timeout and optional retry
//! - `fetcher` - The `Fetcher<T>` trait the orchestrator depends on
//! - `stablecoins` - DefiLlama stablecoin market caps
//! - `lending/` - One adapter per lending protocol, combined by `LendingFetcher`
//! - `volumes` - CoinMarketCap exchange pair volumes

pub mod error;
pub mod fetcher;
pub mod http;
pub mod json;
pub mod lending;
pub mod stablecoins;
pub mod volumes;

pub use error::*;
pub use fetcher::Fetcher;
pub use http::{Backoff, HttpClient, HttpConfig, RetryPolicy};
pub use lending::{default_adapters, LendingAdapter, LendingFetcher};
pub use stablecoins::{DefiLlamaFetcher, DEFAULT_STABLECOINS};
pub use volumes::AsterVolumeFetcher;
