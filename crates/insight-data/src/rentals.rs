//! Rental payment analysis: per-unit delay means, punctuality bands, report.

use std::collections::BTreeMap;

use insight_core::models::{PunctualityBand, RentalRecord, RentalReport};
use insight_core::{InsightError, Result};
use tracing::warn;

use crate::frame::Frame;

// ── Column mapping ────────────────────────────────────────────────────────────

/// Names of the frame columns a rental record is built from.
#[derive(Debug, Clone)]
pub struct RentalColumns {
    pub unit: String,
    pub rent: String,
    pub agreed_date: String,
    pub paid_date: String,
}

impl Default for RentalColumns {
    /// Column names used by the live rental dataset.
    fn default() -> Self {
        Self {
            unit: "apartamento".to_string(),
            rent: "valor_aluguel".to_string(),
            agreed_date: "datas_combinadas_pagamento".to_string(),
            paid_date: "datas_de_pagamento".to_string(),
        }
    }
}

// ── PunctualityBreakdown ──────────────────────────────────────────────────────

/// Units partitioned into the four punctuality bands.
///
/// Within each band, units keep their mean-delay order (descending).
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct PunctualityBreakdown {
    pub punctual: Vec<String>,
    pub light: Vec<String>,
    pub moderate: Vec<String>,
    pub severe: Vec<String>,
}

impl PunctualityBreakdown {
    /// Unit counts per band, with every band present.
    pub fn counts(&self) -> BTreeMap<PunctualityBand, usize> {
        BTreeMap::from([
            (PunctualityBand::Punctual, self.punctual.len()),
            (PunctualityBand::Light, self.light.len()),
            (PunctualityBand::Moderate, self.moderate.len()),
            (PunctualityBand::Severe, self.severe.len()),
        ])
    }
}

// ── RentalAnalyzer ────────────────────────────────────────────────────────────

/// Aggregates cleaned rental records into per-unit delay statistics.
#[derive(Debug)]
pub struct RentalAnalyzer {
    records: Vec<RentalRecord>,
}

impl RentalAnalyzer {
    pub fn new(records: Vec<RentalRecord>) -> Self {
        Self { records }
    }

    /// Build typed records from a cleaned frame.
    ///
    /// The unit column must exist; rows whose unit cell is missing or fails
    /// validation are skipped with a warning.
    pub fn from_frame(frame: &Frame, columns: &RentalColumns) -> Result<Self> {
        if frame.column_index(&columns.unit).is_none() {
            return Err(InsightError::MissingColumn(columns.unit.clone()));
        }

        let mut records = Vec::with_capacity(frame.len());
        for row in 0..frame.len() {
            let Some(unit) = frame.get(row, &columns.unit).and_then(|c| c.as_text()) else {
                warn!("Skipping rental row {row}: unit cell is not text");
                continue;
            };
            let rent = frame.get(row, &columns.rent).and_then(|c| c.as_f64());
            let agreed = frame
                .get(row, &columns.agreed_date)
                .and_then(|c| c.as_datetime());
            let paid = frame
                .get(row, &columns.paid_date)
                .and_then(|c| c.as_datetime());

            match RentalRecord::new(unit, rent, agreed, paid) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping rental row {row}: {e}"),
            }
        }
        Ok(Self::new(records))
    }

    /// The cleaned records backing this analyzer.
    pub fn records(&self) -> &[RentalRecord] {
        &self.records
    }

    /// Every computable payment delay, in record order.
    ///
    /// Records missing either date are excluded; negative values mean the
    /// payment came early.
    pub fn delays(&self) -> Vec<i64> {
        self.records.iter().filter_map(|r| r.delay_days()).collect()
    }

    /// Mean payment delay per unit, descending.
    ///
    /// Units with no computable delay are excluded. Exact ties are broken
    /// lexicographically on the unit name (same deterministic policy as the
    /// sales totals).
    pub fn mean_delay_by_unit(&self) -> Vec<(String, f64)> {
        let mut by_unit: BTreeMap<&str, (i64, usize)> = BTreeMap::new();
        for record in &self.records {
            if let Some(delay) = record.delay_days() {
                let entry = by_unit.entry(record.unit.as_str()).or_insert((0, 0));
                entry.0 += delay;
                entry.1 += 1;
            }
        }

        let mut means: Vec<(String, f64)> = by_unit
            .into_iter()
            .map(|(unit, (sum, count))| (unit.to_string(), sum as f64 / count as f64))
            .collect();
        means.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        means
    }

    /// Partition units into punctuality bands by mean delay.
    ///
    /// Bands are mutually exclusive and boundary-inclusive: 0 is punctual,
    /// exactly 5 is light, exactly 15 is moderate.
    pub fn classify(&self) -> PunctualityBreakdown {
        let mut breakdown = PunctualityBreakdown::default();
        for (unit, mean) in self.mean_delay_by_unit() {
            match PunctualityBand::from_mean_delay(mean) {
                PunctualityBand::Punctual => breakdown.punctual.push(unit),
                PunctualityBand::Light => breakdown.light.push(unit),
                PunctualityBand::Moderate => breakdown.moderate.push(unit),
                PunctualityBand::Severe => breakdown.severe.push(unit),
            }
        }
        breakdown
    }

    /// Assemble the full rental report.
    ///
    /// The overall mean is computed across all individual payments, not as
    /// a mean of the per-unit means. Fails when no delay is computable.
    pub fn report(&self) -> Result<RentalReport> {
        let means = self.mean_delay_by_unit();
        let (Some(first), Some(last)) = (means.first().cloned(), means.last().cloned()) else {
            return Err(InsightError::EmptyDataset(
                "no computable payment delays".to_string(),
            ));
        };

        let delays = self.delays();
        let overall_mean_delay = delays.iter().sum::<i64>() as f64 / delays.len() as f64;

        Ok(RentalReport {
            most_delayed_unit: first.0,
            max_mean_delay: first.1,
            most_punctual_unit: last.0,
            min_mean_delay: last.1,
            unit_count: means.len(),
            overall_mean_delay,
            punctuality_distribution: self.classify().counts(),
            delay_ranking: means.into_iter().take(10).collect(),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
