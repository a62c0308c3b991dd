//! Exchange pair volumes from the CoinMarketCap market-pairs endpoint.

use crate::error::{FetchError, FetchResult};
use crate::fetcher::Fetcher;
use crate::http::{HttpClient, BROWSER_HEADERS};
use crate::json::{amount, field_f64, field_str, require_array};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;
use url::Url;
use usd1_core::VolumeRecord;

pub const MARKET_PAIRS_API_URL: &str =
    "https://api.coinmarketcap.com/data-api/v3/exchange/market-pairs/latest";

/// Exchange slug on CoinMarketCap.
pub const ASTER_SLUG: &str = "aster-pro";

/// Header carrying an optional CoinMarketCap API key.
pub const API_KEY_HEADER: &str = "X-CMC_PRO_API_KEY";

/// Market-pairs URL for one exchange's spot markets.
pub fn market_pairs_url(base: &str, slug: &str) -> Result<Url, url::ParseError> {
    Url::parse_with_params(
        base,
        &[
            ("slug", slug),
            ("category", "spot"),
            ("start", "1"),
            ("limit", "100"),
        ],
    )
}

/// Fetches 24h volumes of the pairs quoting the tracked asset on Aster.
pub struct AsterVolumeFetcher {
    http: Arc<HttpClient>,
    base_url: String,
    asset: String,
    api_key: Option<String>,
}

impl AsterVolumeFetcher {
    pub fn new(http: Arc<HttpClient>, asset: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: MARKET_PAIRS_API_URL.to_string(),
            asset: asset.into(),
            api_key,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[async_trait]
impl Fetcher<VolumeRecord> for AsterVolumeFetcher {
    fn source(&self) -> &str {
        "CoinMarketCap"
    }

    async fn fetch(&self) -> FetchResult<Vec<VolumeRecord>> {
        let url = market_pairs_url(&self.base_url, ASTER_SLUG).map_err(|e| {
            FetchError::InvalidValue {
                field: "base_url".to_string(),
                reason: e.to_string(),
            }
        })?;

        let mut headers: Vec<(&str, &str)> = BROWSER_HEADERS.to_vec();
        if let Some(key) = self.api_key.as_deref() {
            headers.push((API_KEY_HEADER, key));
        }

        let json = self
            .http
            .get_json_with_headers(url.as_str(), &headers)
            .await?;
        let records = parse_market_pairs(&json, &self.asset)?;
        info!(count = records.len(), asset = self.asset.as_str(), "Pair volumes fetched");
        Ok(records)
    }
}

/// Pairs containing `asset`, sorted by 24h USD volume, largest first.
pub fn parse_market_pairs(json: &Value, asset: &str) -> FetchResult<Vec<VolumeRecord>> {
    let pairs = require_array(json, &["data", "marketPairs"])?;
    let asset = asset.to_ascii_uppercase();

    let mut records = Vec::new();
    for pair in pairs {
        let Some(name) = field_str(pair, "marketPair") else {
            continue;
        };
        if !name.to_ascii_uppercase().contains(&asset) {
            continue;
        }
        let volume = amount("volumeUsd", field_f64(pair, "volumeUsd"))?
            .ok_or_else(|| FetchError::MissingField(format!("{name}.volumeUsd")))?;
        records.push(VolumeRecord::new(name, volume));
    }

    records.sort_by(|a, b| b.volume_24h.total_cmp(&a.volume_24h));
    Ok(records)
}
