//! Record types produced by the data fetchers.
//!
//! Records live for a single report cycle and carry no identity beyond
//! their symbol, protocol, or pair name.

use crate::error::{check_amount, check_percent, FormatResult};
use crate::rate::Rate;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Stablecoin supply snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StablecoinRecord {
    /// Token symbol (e.g., "USDT", "USD1")
    pub symbol: CompactString,
    /// Circulating market cap in USD
    pub market_cap: f64,
    /// Change against the previous day, in percent
    pub change_1d: Option<f64>,
    /// Change against the previous week, in percent
    pub change_7d: Option<f64>,
}

impl StablecoinRecord {
    pub fn new(
        symbol: &str,
        market_cap: f64,
        change_1d: Option<f64>,
        change_7d: Option<f64>,
    ) -> Self {
        Self {
            symbol: CompactString::new(symbol),
            market_cap,
            change_1d,
            change_7d,
        }
    }

    pub fn validate(&self) -> FormatResult<()> {
        check_amount("stablecoin", &self.symbol, "market_cap", self.market_cap)?;
        if let Some(change) = self.change_1d {
            check_percent("stablecoin", &self.symbol, "change_1d", change)?;
        }
        if let Some(change) = self.change_7d {
            check_percent("stablecoin", &self.symbol, "change_7d", change)?;
        }
        Ok(())
    }
}

/// One protocol's market for the tracked asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LendingMarketRecord {
    /// Display name (e.g., "WLFI Markets")
    pub protocol: CompactString,
    /// Total supplied in USD
    pub supplied: Option<f64>,
    pub supply_rate: Rate,
    /// Total borrowed in USD
    pub borrowed: Option<f64>,
    pub borrow_rate: Rate,
    /// Protocol market page
    pub link: Option<String>,
}

impl LendingMarketRecord {
    /// Record with every figure unavailable.
    pub fn unavailable(protocol: &str) -> Self {
        Self {
            protocol: CompactString::new(protocol),
            supplied: None,
            supply_rate: Rate::Unavailable,
            borrowed: None,
            borrow_rate: Rate::Unavailable,
            link: None,
        }
    }

    pub fn with_supply(mut self, supplied: Option<f64>, rate: Rate) -> Self {
        self.supplied = supplied;
        self.supply_rate = rate;
        self
    }

    pub fn with_borrow(mut self, borrowed: Option<f64>, rate: Rate) -> Self {
        self.borrowed = borrowed;
        self.borrow_rate = rate;
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    /// Name without the " Markets" suffix, used in table rows.
    pub fn short_name(&self) -> &str {
        self.protocol
            .strip_suffix(" Markets")
            .unwrap_or(self.protocol.as_str())
    }

    /// Whether any figure was reported.
    pub fn has_data(&self) -> bool {
        self.supplied.is_some()
            || self.borrowed.is_some()
            || self.supply_rate.is_available()
            || self.borrow_rate.is_available()
    }

    pub fn validate(&self) -> FormatResult<()> {
        if let Some(supplied) = self.supplied {
            check_amount("lending", &self.protocol, "supplied", supplied)?;
        }
        if let Some(borrowed) = self.borrowed {
            check_amount("lending", &self.protocol, "borrowed", borrowed)?;
        }
        for value in self.supply_rate.values() {
            check_percent("lending", &self.protocol, "supply_rate", value)?;
        }
        for value in self.borrow_rate.values() {
            check_percent("lending", &self.protocol, "borrow_rate", value)?;
        }
        Ok(())
    }
}

/// 24h trading volume for one exchange pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeRecord {
    /// Pair name (e.g., "YI/USD1")
    pub pair: CompactString,
    /// 24h volume in USD
    pub volume_24h: f64,
}

impl VolumeRecord {
    pub fn new(pair: &str, volume_24h: f64) -> Self {
        Self {
            pair: CompactString::new(pair),
            volume_24h,
        }
    }

    pub fn validate(&self) -> FormatResult<()> {
        check_amount("volume", &self.pair, "volume_24h", self.volume_24h)
    }
}
