//! Lista (BSC) adapter for the USD1 Moolah vault.

use super::LendingAdapter;
use crate::error::{FetchError, FetchResult};
use crate::http::HttpClient;
use crate::json::{amount, field_f64, field_str, percent, require_array};
use async_trait::async_trait;
use serde_json::Value;
use usd1_core::{LendingMarketRecord, Rate};
use url::Url;

const VAULT_LIST_URL: &str =
    "https://api.lista.org/api/moolah/vault/list?sort=depositsUsd&order=desc&chain=bsc";
const VAULT_ALLOCATION_URL: &str = "https://api.lista.org/api/moolah/vault/allocation";

const VAULT_ADDRESS: &str = "0xfa27f172e0b6ebcef9c51abf817e2cb142fbe627";

/// Borrow-rate range covers the vault's largest allocations only.
const TOP_MARKETS: usize = 5;

const MARKET_URL: &str =
    "https://lista.org/lending/vault/bsc/0xfa27f172e0b6ebcef9c51abf817e2cb142fbe627?tab=vault";

pub struct ListaAdapter;

#[async_trait]
impl LendingAdapter for ListaAdapter {
    fn protocol(&self) -> &'static str {
        "Lista"
    }

    fn market_url(&self) -> &'static str {
        MARKET_URL
    }

    async fn fetch_market(
        &self,
        http: &HttpClient,
        asset: &str,
    ) -> FetchResult<LendingMarketRecord> {
        let list = http.get_json(VAULT_LIST_URL).await?;
        let vaults = require_array(&list, &["data", "list"])?;
        let vault = find_vault(vaults, asset)
            .ok_or_else(|| FetchError::NotFound(format!("{asset} vault")))?;

        let address = field_str(vault, "address").unwrap_or(VAULT_ADDRESS);
        let url = allocation_url(address)?;
        let allocation = http.get_json(&url).await?;
        let markets = require_array(&allocation, &["data", "list"])?;

        parse_market(self.protocol(), vault, markets)
    }
}

fn allocation_url(address: &str) -> FetchResult<String> {
    Url::parse_with_params(VAULT_ALLOCATION_URL, &[("address", address), ("chain", "bsc")])
        .map(String::from)
        .map_err(|e| FetchError::InvalidValue {
            field: "address".to_string(),
            reason: e.to_string(),
        })
}

/// The tracked vault by address, else the first vault for `asset`.
fn find_vault<'a>(vaults: &'a [Value], asset: &str) -> Option<&'a Value> {
    vaults
        .iter()
        .find(|vault| {
            field_str(vault, "address").is_some_and(|a| a.eq_ignore_ascii_case(VAULT_ADDRESS))
        })
        .or_else(|| {
            vaults.iter().find(|vault| {
                field_str(vault, "assetSymbol").is_some_and(|s| s.eq_ignore_ascii_case(asset))
            })
        })
}

/// Min/max borrow rate (percent) across the `top` largest allocations.
fn borrow_rate_range(markets: &[Value], top: usize) -> Rate {
    let mut parsed: Vec<(f64, f64)> = markets
        .iter()
        .filter_map(|m| Some((field_f64(m, "allocation")?, field_f64(m, "borrowRate")?)))
        .collect();
    parsed.sort_by(|a, b| b.0.total_cmp(&a.0));

    let rates: Vec<f64> = parsed
        .iter()
        .take(top)
        .filter_map(|(_, rate)| percent(*rate))
        .collect();
    Rate::range(&rates)
}

fn parse_market(
    protocol: &str,
    vault: &Value,
    markets: &[Value],
) -> FetchResult<LendingMarketRecord> {
    let deposits = amount("deposits", field_f64(vault, "deposits"))?;
    let borrowed = match (deposits, field_f64(vault, "utilization")) {
        (Some(d), Some(u)) => amount("deposits * utilization", Some(d * u))?,
        _ => None,
    };
    let supply_rate = field_f64(vault, "apy")
        .and_then(percent)
        .map(Rate::Simple)
        .unwrap_or_default();

    Ok(LendingMarketRecord::unavailable(protocol)
        .with_supply(deposits, supply_rate)
        .with_borrow(borrowed, borrow_rate_range(markets, TOP_MARKETS)))
}
