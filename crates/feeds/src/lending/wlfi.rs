//! WLFI Markets (World Liberty Financial, Dolomite-based) adapter.
//!
//! Data comes from two tRPC queries: the token list (liquidity) and the
//! interest-rate list (base rates plus outside reward parts).

use super::LendingAdapter;
use crate::error::{FetchError, FetchResult};
use crate::http::{HttpClient, BROWSER_HEADERS};
use crate::json::{amount, field_f64, field_str, find_by_symbol, percent, require};
use async_trait::async_trait;
use serde_json::Value;
use usd1_core::{LendingMarketRecord, Rate};

const TOKENS_URL: &str = "https://api-markets.worldlibertyfinancial.com/trpc/dolomite.getTokens?input=%7B%22json%22%3A%7B%22chainId%22%3A1%7D%7D";
const RATES_URL: &str = "https://api-markets.worldlibertyfinancial.com/trpc/dolomite.getInterestRates?input=%7B%22json%22%3A%7B%22chainId%22%3A1%7D%7D";

const MARKET_URL: &str =
    "https://markets.worldlibertyfinancial.com/market/0x8d0d000ee44948fc98c9b98a4fa4921476f08b0d";

pub struct WlfiAdapter;

#[async_trait]
impl LendingAdapter for WlfiAdapter {
    fn protocol(&self) -> &'static str {
        "WLFI Markets"
    }

    fn market_url(&self) -> &'static str {
        MARKET_URL
    }

    async fn fetch_market(
        &self,
        http: &HttpClient,
        asset: &str,
    ) -> FetchResult<LendingMarketRecord> {
        let (tokens, rates) = tokio::try_join!(
            http.get_json_with_headers(TOKENS_URL, BROWSER_HEADERS),
            http.get_json_with_headers(RATES_URL, BROWSER_HEADERS),
        )?;
        parse_market(self.protocol(), &tokens, &rates, asset)
    }
}

/// Unwrap a tRPC response: `[ { result: { data: { json: ... } } } ]`.
fn trpc_payload(value: &Value) -> FetchResult<&Vec<Value>> {
    let root = match value {
        Value::Array(items) => items
            .first()
            .ok_or_else(|| FetchError::MissingField("[0]".to_string()))?,
        other => other,
    };
    require(root, &["result", "data", "json"])?
        .as_array()
        .ok_or_else(|| FetchError::InvalidValue {
            field: "result.data.json".to_string(),
            reason: "expected an array".to_string(),
        })
}

/// Reward parts counted as supply incentive: Merkl campaigns and WLFI rewards.
fn is_incentive_part(part: &Value) -> bool {
    let label = field_str(part, "label").unwrap_or_default().to_lowercase();
    let claim_url = field_str(part, "rewardClaimUrl")
        .unwrap_or_default()
        .to_lowercase();
    label.contains("merkl") || claim_url.contains("merkl") || label.contains("wlfi rewards")
}

fn parse_market(
    protocol: &str,
    tokens: &Value,
    rates: &Value,
    asset: &str,
) -> FetchResult<LendingMarketRecord> {
    let tokens = trpc_payload(tokens)?;
    let token = find_by_symbol(tokens, "symbol", asset)
        .ok_or_else(|| FetchError::NotFound(format!("{asset} token")))?;
    let market_id = field_f64(token, "marketId")
        .ok_or_else(|| FetchError::MissingField(format!("{asset}.marketId")))?;

    let supplied = amount("supplyLiquidity", field_f64(token, "supplyLiquidity"))?;
    let borrowed = amount("borrowLiquidity", field_f64(token, "borrowLiquidity"))?;
    let record = LendingMarketRecord::unavailable(protocol)
        .with_supply(supplied, Rate::Unavailable)
        .with_borrow(borrowed, Rate::Unavailable);

    let rates = trpc_payload(rates)?;
    // ids come back as 2, 2.0 or "2" depending on the query
    let Some(rate) = rates
        .iter()
        .find(|r| r.get("token").and_then(|t| field_f64(t, "marketId")) == Some(market_id))
    else {
        return Ok(record);
    };

    let incentive: f64 = rate
        .get("outsideSupplyInterestRateParts")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter(|part| is_incentive_part(part))
                .filter_map(|part| field_f64(part, "interestRate"))
                .sum()
        })
        .unwrap_or(0.0);

    let incentive = percent(incentive).unwrap_or(0.0);
    let supply_rate = field_f64(rate, "supplyInterestRate")
        .and_then(percent)
        .map(|base| Rate::supply(base, incentive))
        .unwrap_or_default();
    let borrow_rate = field_f64(rate, "borrowInterestRate")
        .and_then(percent)
        .map(Rate::Simple)
        .unwrap_or_default();

    Ok(record
        .with_supply(supplied, supply_rate)
        .with_borrow(borrowed, borrow_rate))
}
