//! JustLend (TRON) adapter.

use super::LendingAdapter;
use crate::error::{FetchError, FetchResult};
use crate::http::HttpClient;
use crate::json::{amount, field_f64, find_by_symbol, normalized_percent, require_array};
use async_trait::async_trait;
use serde_json::Value;
use usd1_core::{LendingMarketRecord, Rate};

const API_URL: &str = "https://labc.ablesdxd.link/justlend/yieldInfos?config=TE2RzoSV3wFK99w6J9UnnZ4vLfXYoxvRwP$0$14,TXJgMdjVX5dKiQaUi9QobwNxtSQaFqccvd$0$14,TL5x9MtSnDy537FXKx53yAaHRRNdg9TkkA$0$14,TGBr8uh9jBVHJhhkwSJvQN2ZAKzVkxDmno$0$14,TRg6MnpsFXc82ymUPgf5qbj59ibxiEDWvv$0$14,TLeEu311Cbw63BcmMHDgDLu7fnk9fqGcqT$0$14,TWQhCXaWz4eHK4Kd1ErSDHjMFPoPc9czts$0$14,TUY54PVeH6WCcYCd6ZXXoBDsHytN9V5PXt$0$14,TR7BUFRQeq1w5jAZf1FKx85SHuX6PfMqsV$0$14,TFpPyDCKvNFgos3g3WVsAqMrdqhB81JXHE$0$14";

const MARKET_URL: &str = "https://app.justlend.org/marketDetailNew?jtokenAddress=TBEKggwqFkrc4KckQVR9BLucAmQugafEZf&_from=/homeNew&lang=en-US";

pub struct JustLendAdapter;

#[async_trait]
impl LendingAdapter for JustLendAdapter {
    fn protocol(&self) -> &'static str {
        "JustLend"
    }

    fn market_url(&self) -> &'static str {
        MARKET_URL
    }

    async fn fetch_market(
        &self,
        http: &HttpClient,
        asset: &str,
    ) -> FetchResult<LendingMarketRecord> {
        let json = http.get_json(API_URL).await?;
        parse_market(self.protocol(), &json, asset)
    }
}

fn parse_market(protocol: &str, json: &Value, asset: &str) -> FetchResult<LendingMarketRecord> {
    let assets = require_array(json, &["data", "assetList"])?;
    let market = find_by_symbol(assets, "collateralSymbol", asset)
        .ok_or_else(|| FetchError::NotFound(format!("{asset} market")))?;

    let supplied = amount("depositedUSD", field_f64(market, "depositedUSD"))?;
    let borrowed = amount("borrowedUSD", field_f64(market, "borrowedUSD"))?;

    // "0" means no incentive program
    let incentive = field_f64(market, "underlyingIncrementApy")
        .and_then(normalized_percent)
        .unwrap_or(0.0);
    let supply_rate = field_f64(market, "depositedAPY")
        .and_then(normalized_percent)
        .map(|base| Rate::supply(base, incentive))
        .unwrap_or_default();
    let borrow_rate = field_f64(market, "borrowedAPY")
        .and_then(normalized_percent)
        .map(Rate::Simple)
        .unwrap_or_default();

    Ok(LendingMarketRecord::unavailable(protocol)
        .with_supply(supplied, supply_rate)
        .with_borrow(borrowed, borrow_rate))
}
