//! DefiLlama stablecoin market caps.

use crate::error::{FetchError, FetchResult};
use crate::fetcher::Fetcher;
use crate::http::HttpClient;
use crate::json::{amount, find_by_symbol, number, require_array};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};
use usd1_core::{percent_change, StablecoinRecord};

pub const STABLECOINS_API_URL: &str = "https://stablecoins.llama.fi/stablecoins";

/// Symbols reported when none are configured.
pub const DEFAULT_STABLECOINS: [&str; 4] = ["USDT", "USDC", "USD1", "U"];

/// Fetches circulating supply for a fixed list of stablecoins.
pub struct DefiLlamaFetcher {
    http: Arc<HttpClient>,
    url: String,
    symbols: Vec<String>,
}

impl DefiLlamaFetcher {
    pub fn new(http: Arc<HttpClient>, symbols: Vec<String>) -> Self {
        Self {
            http,
            url: STABLECOINS_API_URL.to_string(),
            symbols,
        }
    }

    /// Override the endpoint (mirrors, tests).
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[async_trait]
impl Fetcher<StablecoinRecord> for DefiLlamaFetcher {
    fn source(&self) -> &str {
        "DefiLlama"
    }

    async fn fetch(&self) -> FetchResult<Vec<StablecoinRecord>> {
        let json = self.http.get_json(&self.url).await?;
        let records = parse_stablecoins(&json, &self.symbols)?;
        info!(count = records.len(), "Stablecoins fetched");
        Ok(records)
    }
}

/// Circulating USD value: either `{"peggedUSD": n}` or a bare number.
fn circulating_value(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Object(map) => map.get("peggedUSD").and_then(number),
        other => number(other),
    }
}

/// Build records for `symbols`, in order, from a `/stablecoins` response.
///
/// Symbols missing from the response or without a current supply are skipped.
pub fn parse_stablecoins(
    json: &Value,
    symbols: &[String],
) -> FetchResult<Vec<StablecoinRecord>> {
    let assets = require_array(json, &["peggedAssets"])?;
    let mut records = Vec::with_capacity(symbols.len());

    for symbol in symbols {
        let Some(asset) = find_by_symbol(assets, "symbol", symbol) else {
            debug!(symbol = symbol.as_str(), "Stablecoin not listed, skipping");
            continue;
        };

        let current = circulating_value(asset.get("circulating"));
        let Some(market_cap) = amount("circulating.peggedUSD", current)? else {
            debug!(symbol = symbol.as_str(), "Stablecoin has no circulating value, skipping");
            continue;
        };

        let prev_day = circulating_value(asset.get("circulatingPrevDay"));
        let prev_week = circulating_value(asset.get("circulatingPrevWeek"));
        let name = asset
            .get("symbol")
            .and_then(Value::as_str)
            .unwrap_or(symbol.as_str());

        records.push(StablecoinRecord::new(
            name,
            market_cap.trunc(),
            percent_change(Some(market_cap), prev_day),
            percent_change(Some(market_cap), prev_week),
        ));
    }

    if records.is_empty() && !symbols.is_empty() {
        return Err(FetchError::NotFound(format!(
            "none of {} in peggedAssets",
            symbols.join(", ")
        )));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{test_server, HttpConfig};
    use serde_json::json;

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn sample() -> Value {
        json!({
            "peggedAssets": [
                {
                    "symbol": "USDT",
                    "circulating": {"peggedUSD": 185_458_000_000.0},
                    "circulatingPrevDay": {"peggedUSD": 185_069_000_000.0},
                    "circulatingPrevWeek": {"peggedUSD": 186_165_000_000.0}
                },
                {
                    "symbol": "USD1",
                    "circulating": {"peggedUSD": 2_750_000_000.5},
                    "circulatingPrevDay": {"peggedUSD": 0},
                    "circulatingPrevWeek": null
                },
                {
                    "symbol": "DAI",
                    "circulating": {}
                }
            ]
        })
    }

    #[test]
    fn test_parse_in_configured_order() {
        let records = parse_stablecoins(&sample(), &symbols(&["USD1", "USDT", "USDC"])).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].symbol, "USD1");
        assert_eq!(records[1].symbol, "USDT");
    }

    #[test]
    fn test_percent_changes() {
        let records = parse_stablecoins(&sample(), &symbols(&["USDT", "USD1"])).unwrap();
        let usdt = &records[0];
        assert_eq!(usdt.market_cap, 185_458_000_000.0);
        assert!((usdt.change_1d.unwrap() - 0.2102).abs() < 0.001);
        assert!((usdt.change_7d.unwrap() + 0.3798).abs() < 0.001);

        let usd1 = &records[1];
        assert_eq!(usd1.market_cap, 2_750_000_000.0);
        assert_eq!(usd1.change_1d, None);
        assert_eq!(usd1.change_7d, None);
    }

    #[test]
    fn test_unusable_history_drops_change_only() {
        let json = json!({"peggedAssets": [{
            "symbol": "USD1",
            "circulating": {"peggedUSD": 2_750_000_000.0},
            "circulatingPrevDay": {"peggedUSD": "NaN"},
            "circulatingPrevWeek": {"peggedUSD": 1e-300}
        }]});
        let records = parse_stablecoins(&json, &symbols(&["USD1"])).unwrap();
        assert_eq!(records[0].market_cap, 2_750_000_000.0);
        assert_eq!(records[0].change_1d, None);
        assert_eq!(records[0].change_7d, None);
        assert!(records[0].validate().is_ok());
    }

    #[test]
    fn test_non_finite_supply_skipped() {
        let json = json!({"peggedAssets": [
            {"symbol": "USDT", "circulating": {"peggedUSD": "inf"}},
            {"symbol": "USD1", "circulating": {"peggedUSD": 1}}
        ]});
        let records = parse_stablecoins(&json, &symbols(&["USDT", "USD1"])).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].symbol, "USD1");
    }

    #[test]
    fn test_symbol_without_supply_skipped() {
        let records = parse_stablecoins(&sample(), &symbols(&["DAI", "USDT"])).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].symbol, "USDT");
    }

    #[test]
    fn test_missing_pegged_assets() {
        let err = parse_stablecoins(&json!({"data": []}), &symbols(&["USDT"])).unwrap_err();
        assert!(matches!(err, FetchError::MissingField(_)));
    }

    #[test]
    fn test_nothing_matched_is_error() {
        let err = parse_stablecoins(&sample(), &symbols(&["PYUSD"])).unwrap_err();
        assert!(matches!(err, FetchError::NotFound(_)));
    }

    #[test]
    fn test_negative_supply_rejected() {
        let json = json!({"peggedAssets": [{"symbol": "USDT", "circulating": {"peggedUSD": -5}}]});
        let err = parse_stablecoins(&json, &symbols(&["USDT"])).unwrap_err();
        assert!(matches!(err, FetchError::InvalidValue { .. }));
    }

    #[tokio::test]
    async fn test_fetch_malformed_payload() {
        let base = test_server::serve(vec![(200, r#"{"peggedAssets": [{"symbol": "#)]).await;
        let http = Arc::new(HttpClient::new(&HttpConfig::default()).unwrap());
        let fetcher = DefiLlamaFetcher::new(http, symbols(&["USDT"])).with_url(base);
        let err = fetcher.fetch().await.unwrap_err();
        assert!(matches!(err, FetchError::Malformed { .. }));
    }
}
