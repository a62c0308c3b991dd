//! Kamino (Solana) adapter: USD1 vault plus the lending markets it allocates to.

use super::LendingAdapter;
use crate::error::{FetchError, FetchResult};
use crate::http::{HttpClient, BROWSER_HEADERS};
use crate::json::{amount, field_f64, find_by_symbol, percent};
use async_trait::async_trait;
use futures_util::future::join_all;
use serde_json::Value;
use tracing::warn;
use usd1_core::{LendingMarketRecord, Rate, RateComponent};

const BASE_URL: &str = "https://api.kamino.finance";
const VAULT: &str = "2eCcHyUfFmiLX5RnNY21Qfndqww7TmwaKBgNXX5Unu7o";

/// Lending markets holding the vault's reserves: (name, market pubkey).
const MARKETS: [(&str, &str); 3] = [
    ("Main Market", "7u3HeHxYDLhnCoErrtycNokbQYbWGzLs6JSDqGAv5PfF"),
    ("Maple Market", "6WEGfej9B9wjxRs6t4BYpb9iCXd8CpTpJ8fVSNzHCC5y"),
    ("JLP Market", "DxXdAyU3kCjnyggvHmY5nAwg5cRbbmdyX3npfDMjjMek"),
];

const MARKET_URL: &str = "https://kamino.com/lend/steakhouse-usd1-high-yield";

pub struct KaminoAdapter;

#[async_trait]
impl LendingAdapter for KaminoAdapter {
    fn protocol(&self) -> &'static str {
        "Kamino"
    }

    fn market_url(&self) -> &'static str {
        MARKET_URL
    }

    async fn fetch_market(
        &self,
        http: &HttpClient,
        asset: &str,
    ) -> FetchResult<LendingMarketRecord> {
        let vault_url = format!("{BASE_URL}/kvaults/vaults/{VAULT}/metrics");
        let vault = http.get_json_with_headers(&vault_url, BROWSER_HEADERS).await?;

        let futures = MARKETS.iter().map(|(name, pubkey)| async move {
            let url = format!("{BASE_URL}/kamino-market/{pubkey}/reserves/metrics");
            (*name, http.get_json_with_headers(&url, BROWSER_HEADERS).await)
        });

        let mut reserves = Vec::with_capacity(MARKETS.len());
        for (name, result) in join_all(futures).await {
            match result {
                Ok(json) => reserves.push(json),
                Err(e) => warn!(market = name, error = %e, "Kamino reserves unavailable, skipping"),
            }
        }

        parse_market(self.protocol(), &vault, &reserves, asset)
    }
}

/// Vault metrics for supply; borrow rate comes from the asset's reserves
/// rather than the vault lend APY, which is only the fallback.
fn parse_market(
    protocol: &str,
    vault: &Value,
    reserves: &[Value],
    asset: &str,
) -> FetchResult<LendingMarketRecord> {
    let available = field_f64(vault, "tokensAvailableUsd");
    let invested = field_f64(vault, "tokensInvestedUsd");
    if available.is_none() && invested.is_none() {
        return Err(FetchError::MissingField("tokensAvailableUsd".to_string()));
    }
    let supplied = amount(
        "tokensAvailableUsd + tokensInvestedUsd",
        Some(available.unwrap_or(0.0) + invested.unwrap_or(0.0)),
    )?;

    let lend = field_f64(vault, "apy").and_then(percent);
    let component = |key: &str| field_f64(vault, key).and_then(percent).unwrap_or(0.0);
    let supply_rate = Rate::Composite(vec![
        RateComponent::new("lend", lend.unwrap_or(0.0)),
        RateComponent::new("WLFI", component("apyFarmRewards")),
        RateComponent::new("KMNO", component("apyIncentives")),
    ]);

    // (total borrow, borrow APY) for the asset's reserve in each market
    let matched: Vec<(f64, Option<f64>)> = reserves
        .iter()
        .filter_map(Value::as_array)
        .filter_map(|list| find_by_symbol(list, "liquidityToken", asset))
        .map(|reserve| {
            (
                field_f64(reserve, "totalBorrow").unwrap_or(0.0),
                field_f64(reserve, "borrowApy"),
            )
        })
        .collect();

    let borrowed = if matched.is_empty() {
        None
    } else {
        amount("totalBorrow", Some(matched.iter().map(|(b, _)| b).sum()))?
    };

    // Borrow APY of the matched reserves weighted by their total borrow;
    // the vault lend APY stands in when no reserve reports one.
    let weight: f64 = matched
        .iter()
        .filter(|(_, apy)| apy.is_some())
        .map(|(b, _)| b)
        .sum();
    let borrow_rate = if weight > 0.0 {
        let weighted: f64 = matched
            .iter()
            .filter_map(|(b, apy)| apy.map(|a| a * b))
            .sum();
        percent(weighted / weight).map(Rate::Simple).unwrap_or_default()
    } else {
        lend.map(Rate::Simple).unwrap_or_default()
    };

    Ok(LendingMarketRecord::unavailable(protocol)
        .with_supply(supplied, supply_rate)
        .with_borrow(borrowed, borrow_rate))
}
