//! Plain-text report formatter.
//!
//! Produces Telegram Markdown with each table inside a code fence so the
//! columns stay aligned in a monospace font. Pure: the output depends only
//! on the report contents.

use crate::amount::{compact_amount, format_market_cap, format_signed_percent, format_volume};
use crate::error::FormatResult;
use crate::record::{LendingMarketRecord, StablecoinRecord, VolumeRecord};
use crate::report::{Report, Section, SourceFailure};
use chrono::{DateTime, Utc};

pub const DEFILLAMA_URL: &str = "https://defillama.com/stablecoins";
pub const ASTER_URL: &str = "https://coinmarketcap.com/exchanges/aster-pro/?type=spot";

const FENCE: &str = "```";

/// Render a report. Empty groups are omitted entirely.
pub fn format_report(report: &Report) -> FormatResult<String> {
    report.validate()?;

    let mut lines = vec![format!(
        "📊 DAILY REPORT | {}",
        report.generated_at.format("%Y-%m-%d")
    )];

    for section in report.sections() {
        lines.push(String::new());
        match section {
            Section::Lending => push_lending(&mut lines, &report.asset, &report.lending),
            Section::Stablecoins => push_stablecoins(&mut lines, &report.stablecoins),
            Section::Volumes => push_volumes(&mut lines, &report.asset, &report.volumes),
        }
    }

    if !report.failures.is_empty() {
        let names: Vec<&str> = report
            .failures
            .iter()
            .map(|f| f.section.source_name())
            .collect();
        lines.push(String::new());
        lines.push(format!("⚠️ Unavailable: {}", names.join(", ")));
    }

    Ok(lines.join("\n"))
}

/// Render the notice sent when no source produced any data.
pub fn format_failure_notice(
    generated_at: DateTime<Utc>,
    failures: &[SourceFailure],
    host: &str,
) -> String {
    let mut lines = vec![
        format!(
            "⚠️ DAILY REPORT FAILED | {}",
            generated_at.format("%Y-%m-%d")
        ),
        String::new(),
        "No data source returned any records.".to_string(),
    ];

    if !failures.is_empty() {
        lines.push(FENCE.to_string());
        for failure in failures {
            lines.push(format!(
                "{}: {}",
                failure.section.source_name(),
                failure.reason.replace('`', "'")
            ));
        }
        lines.push(FENCE.to_string());
    }

    lines.push(format!(
        "Host: {} | {}",
        host,
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    lines.join("\n")
}

fn push_lending(lines: &mut Vec<String>, asset: &str, records: &[LendingMarketRecord]) {
    lines.push(format!("{asset} MARKETS"));
    lines.push(FENCE.to_string());
    lines.push("          Supplied    Rate    Borrowed    Rate".to_string());
    lines.push("─".repeat(47));

    let mut details = Vec::new();
    for record in records {
        let name = record.short_name();
        lines.push(format!(
            "{:<10} ${:<9} {:<6}  ${:<9} {}",
            name,
            compact_amount(record.supplied),
            record.supply_rate.headline_text(),
            compact_amount(record.borrowed),
            record.borrow_rate.headline_text(),
        ));

        let mut parts = Vec::new();
        if let Some(detail) = record.supply_rate.detail() {
            parts.push(format!("S: {detail}"));
        }
        if let Some(detail) = record.borrow_rate.detail() {
            parts.push(format!("B: {detail}"));
        }
        if !parts.is_empty() {
            details.push(format!("• {}: {}", name, parts.join(" | ")));
        }
    }
    lines.push(FENCE.to_string());

    if !details.is_empty() {
        lines.push(String::new());
        lines.push("Rate details:".to_string());
        lines.extend(details);
    }

    let links: Vec<String> = records
        .iter()
        .filter_map(|r| r.link.as_ref().map(|url| format!("[{}]({})", r.short_name(), url)))
        .collect();
    if !links.is_empty() {
        lines.push(String::new());
        lines.push(format!("→ {}", links.join(" | ")));
    }
}

fn push_stablecoins(lines: &mut Vec<String>, records: &[StablecoinRecord]) {
    lines.push("STABLECOINS".to_string());
    lines.push(FENCE.to_string());
    lines.push("Token  Market Cap    1D       7D".to_string());
    lines.push("─".repeat(33));
    for record in records {
        lines.push(format!(
            "{:<5}  {:<11}  {:>7}  {:>7}",
            record.symbol.as_str(),
            format_market_cap(record.market_cap),
            format_signed_percent(record.change_1d),
            format_signed_percent(record.change_7d),
        ));
    }
    lines.push(FENCE.to_string());
    lines.push(format!("→ [DefiLlama]({DEFILLAMA_URL})"));
}

fn push_volumes(lines: &mut Vec<String>, asset: &str, records: &[VolumeRecord]) {
    lines.push(format!("ASTER {asset} PAIRS"));
    lines.push(FENCE.to_string());
    lines.push("Pair          Volume (24h)".to_string());
    lines.push("─".repeat(27));
    for record in records {
        lines.push(format!(
            "{:<12}  {:>12}",
            record.pair.as_str(),
            format_volume(record.volume_24h)
        ));
    }
    lines.push(FENCE.to_string());
    lines.push(format!("→ [Aster]({ASTER_URL})"));
}
