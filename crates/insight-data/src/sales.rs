//! Sales event analysis: per-customer totals, winner, summary report.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use insight_core::models::{SaleRecord, SalesReport};
use insight_core::{InsightError, Result};
use tracing::warn;

use crate::frame::Frame;

// ── Column mapping ────────────────────────────────────────────────────────────

/// Names of the frame columns a sale record is built from.
#[derive(Debug, Clone)]
pub struct SalesColumns {
    pub customer: String,
    pub amount: String,
    pub date: String,
}

impl Default for SalesColumns {
    /// Column names used by the live sales dataset.
    fn default() -> Self {
        Self {
            customer: "Cliente".to_string(),
            amount: "Valor da compra".to_string(),
            date: "Data de venda".to_string(),
        }
    }
}

// ── SalesAnalyzer ─────────────────────────────────────────────────────────────

/// Aggregates cleaned sale records into per-customer totals and a report.
#[derive(Debug)]
pub struct SalesAnalyzer {
    records: Vec<SaleRecord>,
}

impl SalesAnalyzer {
    pub fn new(records: Vec<SaleRecord>) -> Self {
        Self { records }
    }

    /// Build typed records from a cleaned frame.
    ///
    /// The customer column must exist; rows whose customer cell is missing
    /// or fails validation are skipped with a warning, matching how
    /// unmappable raw entries are treated elsewhere in the pipeline.
    pub fn from_frame(frame: &Frame, columns: &SalesColumns) -> Result<Self> {
        if frame.column_index(&columns.customer).is_none() {
            return Err(InsightError::MissingColumn(columns.customer.clone()));
        }

        let mut records = Vec::with_capacity(frame.len());
        for row in 0..frame.len() {
            let Some(customer) = frame.get(row, &columns.customer).and_then(|c| c.as_text())
            else {
                warn!("Skipping sale row {row}: customer cell is not text");
                continue;
            };
            let amount = frame.get(row, &columns.amount).and_then(|c| c.as_f64());
            let sold_at = frame.get(row, &columns.date).and_then(|c| c.as_datetime());

            match SaleRecord::new(customer, amount, sold_at) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping sale row {row}: {e}"),
            }
        }
        Ok(Self::new(records))
    }

    /// The cleaned records backing this analyzer.
    pub fn records(&self) -> &[SaleRecord] {
        &self.records
    }

    /// Total purchase amount per customer, descending.
    ///
    /// Customers are expected to arrive already lowercased and trimmed (the
    /// cleaning stage owns that). Missing amounts contribute nothing to the
    /// sum. Exact ties are broken lexicographically on the customer name so
    /// the ordering is deterministic.
    pub fn total_by_customer(&self) -> Vec<(String, f64)> {
        let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
        for record in &self.records {
            *totals.entry(record.customer.as_str()).or_insert(0.0) +=
                record.amount.unwrap_or(0.0);
        }

        let mut sorted: Vec<(String, f64)> = totals
            .into_iter()
            .map(|(name, total)| (name.to_string(), total))
            .collect();
        sorted.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        sorted
    }

    /// The customer with the highest total, if any records exist.
    pub fn winner(&self) -> Option<(String, f64)> {
        self.total_by_customer().into_iter().next()
    }

    /// Revenue per calendar day, ascending by date.
    ///
    /// Chart-ready series for the dashboard's daily sales line; records
    /// without a parsed sale date are excluded.
    pub fn total_by_day(&self) -> Vec<(NaiveDate, f64)> {
        let mut daily: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for record in &self.records {
            if let Some(sold_at) = record.sold_at {
                *daily.entry(sold_at.date_naive()).or_insert(0.0) +=
                    record.amount.unwrap_or(0.0);
            }
        }
        daily.into_iter().collect()
    }

    /// Assemble the full sales report.
    ///
    /// Event duration is inclusive: a single-day event reports 1 day.
    /// Fails when there are no records or no parseable sale dates.
    pub fn report(&self) -> Result<SalesReport> {
        let totals = self.total_by_customer();
        let Some((winning_customer, winning_total)) = totals.first().cloned() else {
            return Err(InsightError::EmptyDataset("no sale records".to_string()));
        };

        let dates: Vec<_> = self.records.iter().filter_map(|r| r.sold_at).collect();
        let (Some(start_date), Some(end_date)) =
            (dates.iter().min().copied(), dates.iter().max().copied())
        else {
            return Err(InsightError::EmptyDataset(
                "no parseable sale dates".to_string(),
            ));
        };

        let total_revenue: f64 = totals.iter().map(|(_, v)| v).sum();
        let customer_count = totals.len();
        let event_duration_days =
            (end_date.date_naive() - start_date.date_naive()).num_days() + 1;

        Ok(SalesReport {
            winning_customer,
            winning_total,
            customer_count,
            total_revenue,
            mean_revenue_per_customer: total_revenue / customer_count as f64,
            event_duration_days,
            top_customers: totals.into_iter().take(5).collect(),
            start_date,
            end_date,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn sale(customer: &str, amount: f64, sold_at: DateTime<Utc>) -> SaleRecord {
        SaleRecord::new(customer, Some(amount), Some(sold_at)).unwrap()
    }

    fn analyzer(records: Vec<SaleRecord>) -> SalesAnalyzer {
        SalesAnalyzer::new(records)
    }

    // ── total_by_customer ─────────────────────────────────────────────────────

    #[test]
    fn test_totals_group_normalized_customers() {
        // "Ana" and "ana " have already been lowercased/trimmed upstream.
        let a = analyzer(vec![
            sale("ana", 100.0, date(2022, 6, 1)),
            sale("ana", 50.0, date(2022, 6, 2)),
        ]);
        let totals = a.total_by_customer();
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].0, "ana");
        assert!((totals[0].1 - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_totals_sorted_non_increasing() {
        let a = analyzer(vec![
            sale("ana", 10.0, date(2022, 6, 1)),
            sale("bia", 30.0, date(2022, 6, 1)),
            sale("carla", 20.0, date(2022, 6, 1)),
        ]);
        let totals = a.total_by_customer();
        for pair in totals.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
        assert_eq!(totals[0].0, "bia");
    }

    #[test]
    fn test_totals_tie_broken_lexicographically() {
        let a = analyzer(vec![
            sale("zoe", 100.0, date(2022, 6, 1)),
            sale("ana", 100.0, date(2022, 6, 1)),
        ]);
        let totals = a.total_by_customer();
        assert_eq!(totals[0].0, "ana");
        assert_eq!(totals[1].0, "zoe");
    }

    #[test]
    fn test_totals_missing_amount_contributes_nothing() {
        let a = analyzer(vec![
            sale("ana", 100.0, date(2022, 6, 1)),
            SaleRecord::new("ana", None, Some(date(2022, 6, 2))).unwrap(),
        ]);
        let totals = a.total_by_customer();
        assert!((totals[0].1 - 100.0).abs() < 1e-9);
    }

    // ── winner ────────────────────────────────────────────────────────────────

    #[test]
    fn test_winner_is_highest_total() {
        let a = analyzer(vec![
            sale("ana", 10.0, date(2022, 6, 1)),
            sale("bia", 30.0, date(2022, 6, 1)),
        ]);
        let (name, total) = a.winner().unwrap();
        assert_eq!(name, "bia");
        assert!((total - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_winner_empty_is_none() {
        assert!(analyzer(vec![]).winner().is_none());
    }

    // ── total_by_day ──────────────────────────────────────────────────────────

    #[test]
    fn test_total_by_day_ascending() {
        let a = analyzer(vec![
            sale("ana", 10.0, date(2022, 6, 2)),
            sale("bia", 30.0, date(2022, 6, 1)),
            sale("carla", 5.0, date(2022, 6, 1)),
        ]);
        let daily = a.total_by_day();
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].0, date(2022, 6, 1).date_naive());
        assert!((daily[0].1 - 35.0).abs() < 1e-9);
    }

    // ── report ────────────────────────────────────────────────────────────────

    #[test]
    fn test_report_single_day_duration_is_one() {
        let a = analyzer(vec![
            sale("ana", 10.0, date(2024, 1, 1)),
            sale("bia", 20.0, date(2024, 1, 1)),
        ]);
        let report = a.report().unwrap();
        assert_eq!(report.event_duration_days, 1);
    }

    #[test]
    fn test_report_duration_is_inclusive() {
        let a = analyzer(vec![
            sale("ana", 10.0, date(2024, 1, 1)),
            sale("bia", 20.0, date(2024, 1, 3)),
        ]);
        let report = a.report().unwrap();
        assert_eq!(report.event_duration_days, 3);
    }

    #[test]
    fn test_report_aggregates() {
        let a = analyzer(vec![
            sale("ana", 100.0, date(2022, 6, 1)),
            sale("bia", 50.0, date(2022, 6, 2)),
            sale("ana", 25.0, date(2022, 6, 3)),
        ]);
        let report = a.report().unwrap();
        assert_eq!(report.winning_customer, "ana");
        assert!((report.winning_total - 125.0).abs() < 1e-9);
        assert_eq!(report.customer_count, 2);
        assert!((report.total_revenue - 175.0).abs() < 1e-9);
        assert!((report.mean_revenue_per_customer - 87.5).abs() < 1e-9);
        assert_eq!(report.start_date, date(2022, 6, 1));
        assert_eq!(report.end_date, date(2022, 6, 3));
    }

    #[test]
    fn test_report_top_customers_capped_at_five() {
        let records = (0..7)
            .map(|i| sale(&format!("c{i}"), (i + 1) as f64, date(2022, 6, 1)))
            .collect();
        let report = analyzer(records).report().unwrap();
        assert_eq!(report.top_customers.len(), 5);
        assert_eq!(report.top_customers[0].0, "c6");
    }

    #[test]
    fn test_report_empty_dataset_errors() {
        let err = analyzer(vec![]).report().unwrap_err();
        assert!(matches!(err, InsightError::EmptyDataset(_)));
    }

    #[test]
    fn test_report_no_dates_errors() {
        let a = analyzer(vec![SaleRecord::new("ana", Some(10.0), None).unwrap()]);
        assert!(matches!(
            a.report().unwrap_err(),
            InsightError::EmptyDataset(_)
        ));
    }

    // ── from_frame ────────────────────────────────────────────────────────────

    use crate::frame::Cell;

    #[test]
    fn test_from_frame_builds_records() {
        let frame = Frame::new(
            vec![
                "Data de venda".to_string(),
                "Cliente".to_string(),
                "Valor da compra".to_string(),
            ],
            vec![vec![
                Cell::DateTime(date(2022, 6, 6)),
                Cell::Text("ana".to_string()),
                Cell::Number(836.5),
            ]],
        );
        let a = SalesAnalyzer::from_frame(&frame, &SalesColumns::default()).unwrap();
        assert_eq!(a.records().len(), 1);
        assert_eq!(a.records()[0].customer, "ana");
        assert_eq!(a.records()[0].amount, Some(836.5));
    }

    #[test]
    fn test_from_frame_missing_customer_column_errors() {
        let frame = Frame::new(vec!["x".to_string()], vec![]);
        let err = SalesAnalyzer::from_frame(&frame, &SalesColumns::default()).unwrap_err();
        assert!(matches!(err, InsightError::MissingColumn(_)));
    }

    #[test]
    fn test_from_frame_skips_rows_without_customer() {
        let frame = Frame::new(
            vec!["Cliente".to_string(), "Valor da compra".to_string()],
            vec![
                vec![Cell::Text("ana".to_string()), Cell::Number(10.0)],
                vec![Cell::Null, Cell::Number(20.0)],
            ],
        );
        let a = SalesAnalyzer::from_frame(&frame, &SalesColumns::default()).unwrap();
        assert_eq!(a.records().len(), 1);
    }
}
