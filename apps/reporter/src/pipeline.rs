//! One report cycle: fetch every source, format, deliver.

use crate::config::{AppConfig, ConfigError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};
use usd1_alerts::{DeliveryError, Reporter, TelegramReporter};
use usd1_core::{
    format_failure_notice, format_report, FormatError, FormatResult, LendingMarketRecord, Report,
    Section, StablecoinRecord, VolumeRecord,
};
use usd1_feeds::{
    AsterVolumeFetcher, DefiLlamaFetcher, FetchResult, Fetcher, HttpClient, LendingFetcher,
};

/// Result of one run.
#[derive(Debug)]
pub enum RunOutcome {
    /// Report delivered; `failed_sources` were missing from it.
    Delivered {
        messages: usize,
        failed_sources: usize,
    },
    /// No source returned data; `notified` tells whether a failure notice went out.
    NoData { notified: bool },
    FormatFailed(FormatError),
    DeliveryFailed(DeliveryError),
}

impl RunOutcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            RunOutcome::Delivered { .. } => 0,
            RunOutcome::NoData { .. }
            | RunOutcome::FormatFailed(_)
            | RunOutcome::DeliveryFailed(_) => 1,
        }
    }
}

/// Prints reports to stdout instead of sending them (`--dry-run`).
pub struct ConsoleReporter;

#[async_trait]
impl Reporter for ConsoleReporter {
    async fn deliver(&self, text: &str) -> Result<usize, DeliveryError> {
        println!("{text}");
        Ok(1)
    }
}

pub struct Pipeline {
    asset: String,
    lending: Box<dyn Fetcher<LendingMarketRecord>>,
    stablecoins: Box<dyn Fetcher<StablecoinRecord>>,
    volumes: Box<dyn Fetcher<VolumeRecord>>,
    reporter: Arc<dyn Reporter>,
    notify_on_failure: bool,
    host: String,
}

impl Pipeline {
    pub fn new(
        asset: impl Into<String>,
        lending: Box<dyn Fetcher<LendingMarketRecord>>,
        stablecoins: Box<dyn Fetcher<StablecoinRecord>>,
        volumes: Box<dyn Fetcher<VolumeRecord>>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            asset: asset.into(),
            lending,
            stablecoins,
            volumes,
            reporter,
            notify_on_failure: true,
            host: "unknown".to_string(),
        }
    }

    pub fn with_failure_notice(mut self, enabled: bool) -> Self {
        self.notify_on_failure = enabled;
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Wire the production fetchers and reporter.
    pub fn from_config(config: &AppConfig, dry_run: bool) -> Result<Self, ConfigError> {
        let http = HttpClient::new(&config.http_config())
            .map_err(|e| ConfigError::Invalid(format!("HTTP client: {e}")))?;
        let http = Arc::new(http);
        let asset = config.target_symbol.as_str();

        let reporter: Arc<dyn Reporter> = if dry_run {
            Arc::new(ConsoleReporter)
        } else {
            let telegram = TelegramReporter::new(config.telegram_config()?, config.timeout())
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
            Arc::new(telegram)
        };

        let host = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        Ok(Self::new(
            asset,
            Box::new(LendingFetcher::new(http.clone(), asset)),
            Box::new(DefiLlamaFetcher::new(
                http.clone(),
                config.stablecoin_symbols.clone(),
            )),
            Box::new(AsterVolumeFetcher::new(
                http,
                asset,
                config.api_keys.coinmarketcap.clone(),
            )),
            reporter,
        )
        .with_failure_notice(config.notify_on_failure)
        .with_host(host))
    }

    /// Run all fetchers concurrently and deliver the result once.
    pub async fn run(&self, now: DateTime<Utc>) -> RunOutcome {
        info!(asset = %self.asset, "Fetching report data");
        let (lending, stablecoins, volumes) = tokio::join!(
            self.lending.fetch(),
            self.stablecoins.fetch(),
            self.volumes.fetch(),
        );

        let mut report = Report::new(now, &self.asset);
        report.lending = absorb(
            &mut report,
            Section::Lending,
            self.lending.source(),
            lending,
            LendingMarketRecord::validate,
        );
        report.stablecoins = absorb(
            &mut report,
            Section::Stablecoins,
            self.stablecoins.source(),
            stablecoins,
            StablecoinRecord::validate,
        );
        report.volumes = absorb(
            &mut report,
            Section::Volumes,
            self.volumes.source(),
            volumes,
            VolumeRecord::validate,
        );

        if !report.has_data() {
            error!(failures = report.failures.len(), "No source returned data");
            return self.notify_failure(&report).await;
        }

        let text = match format_report(&report) {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "Failed to format report");
                return RunOutcome::FormatFailed(e);
            }
        };

        match self.reporter.deliver(&text).await {
            Ok(messages) => {
                info!(
                    messages,
                    sections = report.sections().len(),
                    failed_sources = report.failures.len(),
                    "Report delivered"
                );
                RunOutcome::Delivered {
                    messages,
                    failed_sources: report.failures.len(),
                }
            }
            Err(e) => {
                error!(error = %e, rejected = e.is_rejection(), "Failed to deliver report");
                RunOutcome::DeliveryFailed(e)
            }
        }
    }

    async fn notify_failure(&self, report: &Report) -> RunOutcome {
        if !self.notify_on_failure {
            warn!("Failure notice disabled, nothing sent");
            return RunOutcome::NoData { notified: false };
        }

        let notice = format_failure_notice(report.generated_at, &report.failures, &self.host);
        match self.reporter.deliver(&notice).await {
            Ok(_) => RunOutcome::NoData { notified: true },
            Err(e) => {
                error!(
                    error = %e,
                    rejected = e.is_rejection(),
                    "Failed to deliver failure notice"
                );
                RunOutcome::NoData { notified: false }
            }
        }
    }
}

/// Take a fetch result into the report, recording failures.
///
/// Records failing `validate` are dropped; a section left with only invalid
/// records counts as a failed source.
fn absorb<T>(
    report: &mut Report,
    section: Section,
    source: &str,
    result: FetchResult<Vec<T>>,
    validate: fn(&T) -> FormatResult<()>,
) -> Vec<T> {
    let records = match result {
        Ok(records) => records,
        Err(e) => {
            warn!(source, error = %e, "Source failed, section omitted");
            report.record_failure(section, e.to_string());
            return Vec::new();
        }
    };
    if records.is_empty() {
        warn!(source, "Source returned no records");
        return records;
    }

    let mut rejected = None;
    let valid: Vec<T> = records
        .into_iter()
        .filter(|record| match validate(record) {
            Ok(()) => true,
            Err(e) => {
                warn!(source, error = %e, "Dropping invalid record");
                rejected = Some(e);
                false
            }
        })
        .collect();

    if valid.is_empty() {
        if let Some(e) = rejected {
            warn!(source, "No valid records, section omitted");
            report.record_failure(section, e.to_string());
        }
    }
    valid
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Mutex;
    use usd1_core::Rate;
    use usd1_feeds::http::parse_json;
    use usd1_feeds::FetchError;

    enum Canned<T> {
        Records(Vec<T>),
        Fail(fn() -> FetchError),
    }

    struct FakeFetcher<T> {
        source: &'static str,
        canned: Canned<T>,
    }

    impl<T> FakeFetcher<T> {
        fn ok(source: &'static str, records: Vec<T>) -> Box<Self> {
            Box::new(Self {
                source,
                canned: Canned::Records(records),
            })
        }

        fn failing(source: &'static str, error: fn() -> FetchError) -> Box<Self> {
            Box::new(Self {
                source,
                canned: Canned::Fail(error),
            })
        }
    }

    #[async_trait]
    impl<T: Clone + Send + Sync + 'static> Fetcher<T> for FakeFetcher<T> {
        fn source(&self) -> &str {
            self.source
        }

        async fn fetch(&self) -> FetchResult<Vec<T>> {
            match &self.canned {
                Canned::Records(records) => Ok(records.clone()),
                Canned::Fail(error) => Err(error()),
            }
        }
    }

    #[derive(Default)]
    struct RecordingReporter {
        sent: Mutex<Vec<String>>,
        reject: bool,
    }

    #[async_trait]
    impl Reporter for RecordingReporter {
        async fn deliver(&self, text: &str) -> Result<usize, DeliveryError> {
            if self.reject {
                return Err(DeliveryError::Rejected {
                    endpoint: "test".to_string(),
                    status: 400,
                    body: "rejected".to_string(),
                });
            }
            self.sent.lock().unwrap().push(text.to_string());
            Ok(1)
        }
    }

    fn malformed() -> FetchError {
        match parse_json("https://stablecoins.test", "{\"peggedAssets\": [") {
            Err(e) => e,
            Ok(_) => unreachable!("body is not valid JSON"),
        }
    }

    fn all_adapters_failed() -> FetchError {
        FetchError::AllFailed("Echelon: Network error".to_string())
    }

    fn lending() -> Vec<LendingMarketRecord> {
        vec![LendingMarketRecord::unavailable("WLFI Markets")
            .with_supply(Some(139_450_000.0), Rate::Simple(8.75))
            .with_borrow(Some(109_990_000.0), Rate::Simple(5.14))]
    }

    fn stablecoins() -> Vec<StablecoinRecord> {
        vec![StablecoinRecord::new("USDT", 185_458_000_000.0, Some(0.21), Some(-0.38))]
    }

    fn volumes() -> Vec<VolumeRecord> {
        vec![VolumeRecord::new("YI/USD1", 8_550_000.0)]
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap()
    }

    fn pipeline(
        lending: Box<dyn Fetcher<LendingMarketRecord>>,
        stablecoins: Box<dyn Fetcher<StablecoinRecord>>,
        volumes: Box<dyn Fetcher<VolumeRecord>>,
        reporter: Arc<RecordingReporter>,
    ) -> Pipeline {
        Pipeline::new("USD1", lending, stablecoins, volumes, reporter).with_host("test-host")
    }

    #[tokio::test]
    async fn test_full_report_delivered_once() {
        let reporter = Arc::new(RecordingReporter::default());
        let outcome = pipeline(
            FakeFetcher::ok("lending", lending()),
            FakeFetcher::ok("DefiLlama", stablecoins()),
            FakeFetcher::ok("CoinMarketCap", volumes()),
            reporter.clone(),
        )
        .run(now())
        .await;

        assert!(matches!(
            outcome,
            RunOutcome::Delivered { messages: 1, failed_sources: 0 }
        ));
        assert_eq!(outcome.exit_code(), 0);

        let sent = reporter.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].starts_with("📊 DAILY REPORT | 2025-01-15"));
        assert!(sent[0].contains("USD1 MARKETS"));
        assert!(sent[0].contains("STABLECOINS"));
        assert!(sent[0].contains("ASTER USD1 PAIRS"));
        assert!(!sent[0].contains("Unavailable"));
    }

    #[tokio::test]
    async fn test_lending_failure_omits_section() {
        let reporter = Arc::new(RecordingReporter::default());
        let outcome = pipeline(
            FakeFetcher::<LendingMarketRecord>::failing("lending", all_adapters_failed),
            FakeFetcher::ok("DefiLlama", stablecoins()),
            FakeFetcher::ok("CoinMarketCap", volumes()),
            reporter.clone(),
        )
        .run(now())
        .await;

        assert_eq!(outcome.exit_code(), 0);
        assert!(matches!(outcome, RunOutcome::Delivered { failed_sources: 1, .. }));

        let sent = reporter.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(!sent[0].contains("USD1 MARKETS"));
        assert!(sent[0].contains("STABLECOINS"));
        assert!(sent[0].ends_with("⚠️ Unavailable: Lending markets"));
    }

    #[tokio::test]
    async fn test_malformed_response_degrades_report() {
        let reporter = Arc::new(RecordingReporter::default());
        let outcome = pipeline(
            FakeFetcher::ok("lending", lending()),
            FakeFetcher::<StablecoinRecord>::failing("DefiLlama", malformed),
            FakeFetcher::ok("CoinMarketCap", volumes()),
            reporter.clone(),
        )
        .run(now())
        .await;

        assert_eq!(outcome.exit_code(), 0);
        let sent = reporter.sent.lock().unwrap();
        assert!(!sent[0].contains("STABLECOINS"));
        assert!(sent[0].ends_with("⚠️ Unavailable: Stablecoins"));
    }

    #[tokio::test]
    async fn test_total_failure_sends_notice_not_report() {
        let reporter = Arc::new(RecordingReporter::default());
        let outcome = pipeline(
            FakeFetcher::<LendingMarketRecord>::failing("lending", all_adapters_failed),
            FakeFetcher::<StablecoinRecord>::failing("DefiLlama", malformed),
            FakeFetcher::<VolumeRecord>::ok("CoinMarketCap", Vec::new()),
            reporter.clone(),
        )
        .run(now())
        .await;

        assert!(matches!(outcome, RunOutcome::NoData { notified: true }));
        assert_ne!(outcome.exit_code(), 0);

        let sent = reporter.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].starts_with("⚠️ DAILY REPORT FAILED | 2025-01-15"));
        assert!(!sent[0].contains("📊 DAILY REPORT"));
        assert!(sent[0].contains("Lending markets: "));
        assert!(sent[0].contains("Stablecoins: "));
        assert!(sent[0].contains("Host: test-host"));
    }

    #[tokio::test]
    async fn test_total_failure_without_notice_sends_nothing() {
        let reporter = Arc::new(RecordingReporter::default());
        let outcome = pipeline(
            FakeFetcher::<LendingMarketRecord>::failing("lending", all_adapters_failed),
            FakeFetcher::<StablecoinRecord>::failing("DefiLlama", malformed),
            FakeFetcher::<VolumeRecord>::failing("CoinMarketCap", malformed),
            reporter.clone(),
        )
        .with_failure_notice(false)
        .run(now())
        .await;

        assert!(matches!(outcome, RunOutcome::NoData { notified: false }));
        assert_eq!(outcome.exit_code(), 1);
        assert!(reporter.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delivery_failure_is_non_zero() {
        let reporter = Arc::new(RecordingReporter {
            reject: true,
            ..Default::default()
        });
        let outcome = pipeline(
            FakeFetcher::ok("lending", lending()),
            FakeFetcher::ok("DefiLlama", stablecoins()),
            FakeFetcher::ok("CoinMarketCap", volumes()),
            reporter,
        )
        .run(now())
        .await;

        assert!(matches!(outcome, RunOutcome::DeliveryFailed(_)));
        assert_eq!(outcome.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_invalid_records_degrade_only_their_section() {
        let reporter = Arc::new(RecordingReporter::default());
        let outcome = pipeline(
            FakeFetcher::ok("lending", lending()),
            FakeFetcher::ok("DefiLlama", stablecoins()),
            FakeFetcher::ok("CoinMarketCap", vec![VolumeRecord::new("YI/USD1", f64::NAN)]),
            reporter.clone(),
        )
        .run(now())
        .await;

        assert!(matches!(outcome, RunOutcome::Delivered { failed_sources: 1, .. }));
        assert_eq!(outcome.exit_code(), 0);

        let sent = reporter.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("USD1 MARKETS"));
        assert!(sent[0].contains("STABLECOINS"));
        assert!(!sent[0].contains("ASTER USD1 PAIRS"));
        assert!(sent[0].ends_with("⚠️ Unavailable: Exchange volumes"));
    }

    #[tokio::test]
    async fn test_invalid_row_is_dropped_from_section() {
        let reporter = Arc::new(RecordingReporter::default());
        let mut markets = lending();
        markets.push(
            LendingMarketRecord::unavailable("Echelon")
                .with_supply(Some(1_000.0), Rate::Simple(f64::NAN)),
        );
        let outcome = pipeline(
            FakeFetcher::ok("lending", markets),
            FakeFetcher::ok("DefiLlama", stablecoins()),
            FakeFetcher::ok("CoinMarketCap", volumes()),
            reporter.clone(),
        )
        .run(now())
        .await;

        assert!(matches!(outcome, RunOutcome::Delivered { failed_sources: 0, .. }));
        let sent = reporter.sent.lock().unwrap();
        assert!(sent[0].contains("WLFI"));
        assert!(!sent[0].contains("Echelon"));
        assert!(!sent[0].contains("Unavailable"));
    }

    #[tokio::test]
    async fn test_only_invalid_records_everywhere_sends_notice() {
        let reporter = Arc::new(RecordingReporter::default());
        let outcome = pipeline(
            FakeFetcher::<LendingMarketRecord>::ok("lending", Vec::new()),
            FakeFetcher::<StablecoinRecord>::ok("DefiLlama", Vec::new()),
            FakeFetcher::ok("CoinMarketCap", vec![VolumeRecord::new("YI/USD1", f64::NAN)]),
            reporter.clone(),
        )
        .run(now())
        .await;

        assert!(matches!(outcome, RunOutcome::NoData { notified: true }));
        let sent = reporter.sent.lock().unwrap();
        assert!(sent[0].starts_with("⚠️ DAILY REPORT FAILED"));
        assert!(sent[0].contains("Exchange volumes: "));
    }

    #[test]
    fn test_from_config_dry_run_needs_no_credentials() {
        let config = AppConfig::default();
        assert!(Pipeline::from_config(&config, true).is_ok());
        assert!(matches!(
            Pipeline::from_config(&config, false),
            Err(ConfigError::Missing(_))
        ));
    }
}
