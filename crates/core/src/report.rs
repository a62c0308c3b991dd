//! Report assembled from one run of all fetchers.

use crate::error::FormatResult;
use crate::record::{LendingMarketRecord, StablecoinRecord, VolumeRecord};
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Report sections in rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Section {
    Lending,
    Stablecoins,
    Volumes,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Lending, Section::Stablecoins, Section::Volumes];

    /// Human readable source name used in logs and failure notices.
    pub fn source_name(self) -> &'static str {
        match self {
            Section::Lending => "Lending markets",
            Section::Stablecoins => "Stablecoins",
            Section::Volumes => "Exchange volumes",
        }
    }
}

/// A data source that failed during this run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFailure {
    pub section: Section,
    pub reason: String,
}

impl SourceFailure {
    pub fn new(section: Section, reason: impl Into<String>) -> Self {
        Self {
            section,
            reason: reason.into(),
        }
    }
}

/// All record groups for one report cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    /// Tracked asset symbol used in section titles
    pub asset: CompactString,
    pub lending: Vec<LendingMarketRecord>,
    pub stablecoins: Vec<StablecoinRecord>,
    pub volumes: Vec<VolumeRecord>,
    pub failures: Vec<SourceFailure>,
}

impl Report {
    pub fn new(generated_at: DateTime<Utc>, asset: &str) -> Self {
        Self {
            generated_at,
            asset: CompactString::new(asset),
            lending: Vec::new(),
            stablecoins: Vec::new(),
            volumes: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn record_failure(&mut self, section: Section, reason: impl Into<String>) {
        self.failures.push(SourceFailure::new(section, reason));
    }

    /// Sections that have at least one record, in rendering order.
    pub fn sections(&self) -> Vec<Section> {
        Section::ALL
            .into_iter()
            .filter(|section| match section {
                Section::Lending => !self.lending.is_empty(),
                Section::Stablecoins => !self.stablecoins.is_empty(),
                Section::Volumes => !self.volumes.is_empty(),
            })
            .collect()
    }

    /// True when at least one section would be rendered.
    pub fn has_data(&self) -> bool {
        !self.sections().is_empty()
    }

    pub fn validate(&self) -> FormatResult<()> {
        for record in &self.lending {
            record.validate()?;
        }
        for record in &self.stablecoins {
            record.validate()?;
        }
        for record in &self.volumes {
            record.validate()?;
        }
        Ok(())
    }
}
