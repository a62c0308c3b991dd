//! Echelon (Aptos) adapter.

use super::LendingAdapter;
use crate::error::{FetchError, FetchResult};
use crate::http::{HttpClient, BROWSER_HEADERS};
use crate::json::{
    amount, field_f64, field_str, find_by_symbol, percent, require, require_array,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use usd1_core::{LendingMarketRecord, Rate};

const API_URL: &str = "https://app.echelon.market/api/markets?network=aptos_mainnet";

const MARKET_URL: &str = "https://app.echelon.market/market/0xbb8f38636896c629ff9ef0bf916791a992e12ab4f1c6e26279ee9c6979646963?network=aptos_mainnet";

pub struct EchelonAdapter;

#[async_trait]
impl LendingAdapter for EchelonAdapter {
    fn protocol(&self) -> &'static str {
        "Echelon"
    }

    fn market_url(&self) -> &'static str {
        MARKET_URL
    }

    async fn fetch_market(
        &self,
        http: &HttpClient,
        asset: &str,
    ) -> FetchResult<LendingMarketRecord> {
        let json = http.get_json_with_headers(API_URL, BROWSER_HEADERS).await?;
        parse_market(self.protocol(), &json, asset)
    }
}

/// `marketStats` is a list of `[market_address, stats]` pairs.
fn market_stats(data: &Value) -> HashMap<&str, &Value> {
    data.get("marketStats")
        .and_then(Value::as_array)
        .map(|pairs| {
            pairs
                .iter()
                .filter_map(|pair| match pair.as_array().map(Vec::as_slice) {
                    Some([key, stats]) => key.as_str().map(|k| (k, stats)),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Sum of farming APRs on one side (`supply` or `borrow`).
fn farming_apr(asset: &Value, side: &str) -> f64 {
    asset
        .get("farmingApr")
        .and_then(|farming| farming.get(side))
        .and_then(Value::as_array)
        .map(|rewards| rewards.iter().filter_map(|r| field_f64(r, "apr")).sum())
        .unwrap_or(0.0)
}

fn parse_market(protocol: &str, json: &Value, asset: &str) -> FetchResult<LendingMarketRecord> {
    let data = require(json, &["data"])?;
    let assets = require_array(data, &["assets"])?;
    let market = find_by_symbol(assets, "symbol", asset)
        .ok_or_else(|| FetchError::NotFound(format!("{asset} asset")))?;

    let key = field_str(market, "faAddress")
        .or_else(|| field_str(market, "address"))
        .ok_or_else(|| FetchError::MissingField(format!("{asset}.faAddress")))?;
    let stats = market_stats(data);
    let stats = stats
        .get(key)
        .ok_or_else(|| FetchError::NotFound(format!("market stats for {key}")))?;

    let supplied = amount("totalShares", field_f64(stats, "totalShares"))?;
    let borrowed = amount("totalLiability", field_f64(stats, "totalLiability"))?;

    let supply_incentive = percent(farming_apr(market, "supply")).unwrap_or(0.0);
    let borrow_incentive = percent(farming_apr(market, "borrow")).unwrap_or(0.0);
    let supply_rate = field_f64(market, "supplyApr")
        .and_then(percent)
        .map(|apr| Rate::supply(apr, supply_incentive))
        .unwrap_or_default();
    let borrow_rate = field_f64(market, "borrowApr")
        .and_then(percent)
        .map(|apr| Rate::borrow(apr, borrow_incentive))
        .unwrap_or_default();

    Ok(LendingMarketRecord::unavailable(protocol)
        .with_supply(supplied, supply_rate)
        .with_borrow(borrowed, borrow_rate))
}
