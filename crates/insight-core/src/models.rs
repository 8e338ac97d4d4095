use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{InsightError, Result};

// ── Loader configuration ──────────────────────────────────────────────────────

/// Configuration for loading one remote dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Source URL of the JSON document.
    pub url: String,
    /// Top-level key whose value holds the list of records.
    pub key: String,
    /// Name of the monetary column to clean after flattening.
    pub value_column: String,
    /// Literal tokens removed from monetary strings, applied in order.
    #[serde(default)]
    pub strip_prefixes: Vec<String>,
}

impl LoaderConfig {
    /// Build a config with no prefixes to strip.
    pub fn new(
        url: impl Into<String>,
        key: impl Into<String>,
        value_column: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            key: key.into(),
            value_column: value_column.into(),
            strip_prefixes: Vec::new(),
        }
    }

    /// Set the literal tokens to strip from monetary strings.
    pub fn with_prefixes(mut self, prefixes: &[&str]) -> Self {
        self.strip_prefixes = prefixes.iter().map(|p| p.to_string()).collect();
        self
    }
}

// ── Typed records ─────────────────────────────────────────────────────────────

/// One cleaned sales transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRecord {
    /// Customer identifier, lowercased and trimmed upstream.
    pub customer: String,
    /// Purchase amount; `None` when the raw value did not parse.
    pub amount: Option<f64>,
    /// Sale date; `None` when the raw value did not parse.
    pub sold_at: Option<DateTime<Utc>>,
}

impl SaleRecord {
    /// Validate and construct a sale record.
    ///
    /// Fails when the customer name is empty or the amount is negative
    /// (cleaned amounts are non-negative or null).
    pub fn new(
        customer: impl Into<String>,
        amount: Option<f64>,
        sold_at: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        let customer = customer.into();
        if customer.trim().is_empty() {
            return Err(InsightError::InvalidRecord(
                "customer name is empty".to_string(),
            ));
        }
        if let Some(v) = amount {
            if v < 0.0 {
                return Err(InsightError::InvalidRecord(format!(
                    "negative purchase amount {v} for '{customer}'"
                )));
            }
        }
        Ok(Self {
            customer,
            amount,
            sold_at,
        })
    }
}

/// One cleaned rental payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentalRecord {
    /// Unit identifier with the building marker already stripped upstream.
    pub unit: String,
    /// Monthly rent; `None` when the raw value did not parse.
    pub rent: Option<f64>,
    /// Date the payment was agreed for.
    pub agreed_date: Option<DateTime<Utc>>,
    /// Date the payment actually happened.
    pub paid_date: Option<DateTime<Utc>>,
}

impl RentalRecord {
    /// Validate and construct a rental record.
    ///
    /// Fails when the unit name is empty.
    pub fn new(
        unit: impl Into<String>,
        rent: Option<f64>,
        agreed_date: Option<DateTime<Utc>>,
        paid_date: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        let unit = unit.into();
        if unit.trim().is_empty() {
            return Err(InsightError::InvalidRecord("unit name is empty".to_string()));
        }
        Ok(Self {
            unit,
            rent,
            agreed_date,
            paid_date,
        })
    }

    /// Payment delay in whole days: actual minus agreed date.
    ///
    /// Negative means the payment came early. `None` when either date is
    /// missing.
    pub fn delay_days(&self) -> Option<i64> {
        match (self.paid_date, self.agreed_date) {
            (Some(paid), Some(agreed)) => Some((paid - agreed).num_days()),
            _ => None,
        }
    }
}

// ── Punctuality bands ─────────────────────────────────────────────────────────

/// Fixed delay-range classes used to bucket rental units.
///
/// Bands are mutually exclusive and boundary-inclusive: a mean delay of
/// exactly 0 is punctual, exactly 5 is light, exactly 15 is moderate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PunctualityBand {
    /// Mean delay ≤ 0 days.
    Punctual,
    /// Mean delay in (0, 5] days.
    Light,
    /// Mean delay in (5, 15] days.
    Moderate,
    /// Mean delay > 15 days.
    Severe,
}

impl PunctualityBand {
    /// Classify a mean delay (in days) into its band.
    pub fn from_mean_delay(days: f64) -> Self {
        if days <= 0.0 {
            Self::Punctual
        } else if days <= 5.0 {
            Self::Light
        } else if days <= 15.0 {
            Self::Moderate
        } else {
            Self::Severe
        }
    }

    /// All bands in severity order.
    pub const ALL: [Self; 4] = [Self::Punctual, Self::Light, Self::Moderate, Self::Severe];
}

impl std::fmt::Display for PunctualityBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Punctual => "punctual",
            Self::Light => "light",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
        };
        write!(f, "{name}")
    }
}

// ── Reports ───────────────────────────────────────────────────────────────────

/// Aggregate statistics over the sales event, consumed read-only by the
/// dashboard layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesReport {
    /// Customer with the highest purchase total.
    pub winning_customer: String,
    /// That customer's total.
    pub winning_total: f64,
    /// Number of distinct customers.
    pub customer_count: usize,
    /// Sum of all purchase amounts.
    pub total_revenue: f64,
    /// Mean total per customer.
    pub mean_revenue_per_customer: f64,
    /// Event duration in whole days, inclusive of both endpoints.
    pub event_duration_days: i64,
    /// Top five customers by total, descending.
    pub top_customers: Vec<(String, f64)>,
    /// Earliest sale date.
    pub start_date: DateTime<Utc>,
    /// Latest sale date.
    pub end_date: DateTime<Utc>,
}

/// Aggregate statistics over the rental payment log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentalReport {
    /// Unit with the highest mean payment delay.
    pub most_delayed_unit: String,
    /// That unit's mean delay in days.
    pub max_mean_delay: f64,
    /// Unit with the lowest mean payment delay.
    pub most_punctual_unit: String,
    /// That unit's mean delay in days.
    pub min_mean_delay: f64,
    /// Number of distinct units.
    pub unit_count: usize,
    /// Mean delay across all individual payments (not mean-of-means).
    pub overall_mean_delay: f64,
    /// Unit counts per punctuality band.
    pub punctuality_distribution: BTreeMap<PunctualityBand, usize>,
    /// Top ten units by mean delay, descending.
    pub delay_ranking: Vec<(String, f64)>,
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    // ── LoaderConfig ──────────────────────────────────────────────────────────

    #[test]
    fn test_loader_config_builder() {
        let config = LoaderConfig::new("http://example.com/x.json", "sales", "amount")
            .with_prefixes(&["R$ "]);
        assert_eq!(config.key, "sales");
        assert_eq!(config.strip_prefixes, vec!["R$ ".to_string()]);
    }

    #[test]
    fn test_loader_config_default_prefixes_empty() {
        let config: LoaderConfig =
            serde_json::from_str(r#"{"url":"u","key":"k","value_column":"v"}"#).unwrap();
        assert!(config.strip_prefixes.is_empty());
    }

    // ── SaleRecord ────────────────────────────────────────────────────────────

    #[test]
    fn test_sale_record_valid() {
        let record = SaleRecord::new("ana", Some(100.0), Some(date(2022, 6, 1))).unwrap();
        assert_eq!(record.customer, "ana");
    }

    #[test]
    fn test_sale_record_empty_customer_rejected() {
        assert!(SaleRecord::new("   ", Some(100.0), None).is_err());
    }

    #[test]
    fn test_sale_record_negative_amount_rejected() {
        assert!(SaleRecord::new("ana", Some(-1.0), None).is_err());
    }

    #[test]
    fn test_sale_record_null_amount_allowed() {
        assert!(SaleRecord::new("ana", None, None).is_ok());
    }

    // ── RentalRecord ──────────────────────────────────────────────────────────

    #[test]
    fn test_rental_record_empty_unit_rejected() {
        assert!(RentalRecord::new("", Some(1000.0), None, None).is_err());
    }

    #[test]
    fn test_delay_days_positive() {
        let record = RentalRecord::new(
            "A101",
            None,
            Some(date(2022, 6, 5)),
            Some(date(2022, 6, 8)),
        )
        .unwrap();
        assert_eq!(record.delay_days(), Some(3));
    }

    #[test]
    fn test_delay_days_negative_for_early_payment() {
        let record = RentalRecord::new(
            "A101",
            None,
            Some(date(2022, 6, 5)),
            Some(date(2022, 6, 3)),
        )
        .unwrap();
        assert_eq!(record.delay_days(), Some(-2));
    }

    #[test]
    fn test_delay_days_missing_date_is_none() {
        let record = RentalRecord::new("A101", None, Some(date(2022, 6, 5)), None).unwrap();
        assert_eq!(record.delay_days(), None);
    }

    // ── PunctualityBand ───────────────────────────────────────────────────────

    #[test]
    fn test_band_boundaries() {
        assert_eq!(PunctualityBand::from_mean_delay(0.0), PunctualityBand::Punctual);
        assert_eq!(PunctualityBand::from_mean_delay(-3.0), PunctualityBand::Punctual);
        assert_eq!(PunctualityBand::from_mean_delay(0.01), PunctualityBand::Light);
        assert_eq!(PunctualityBand::from_mean_delay(5.0), PunctualityBand::Light);
        assert_eq!(PunctualityBand::from_mean_delay(5.01), PunctualityBand::Moderate);
        assert_eq!(PunctualityBand::from_mean_delay(15.0), PunctualityBand::Moderate);
        assert_eq!(PunctualityBand::from_mean_delay(15.01), PunctualityBand::Severe);
    }

    #[test]
    fn test_band_serde_lowercase() {
        let json = serde_json::to_string(&PunctualityBand::Moderate).unwrap();
        assert_eq!(json, r#""moderate""#);
        let back: PunctualityBand = serde_json::from_str(&json).unwrap();
        assert_eq!(back, PunctualityBand::Moderate);
    }

    #[test]
    fn test_band_display() {
        assert_eq!(PunctualityBand::Severe.to_string(), "severe");
    }

    #[test]
    fn test_band_ordering_by_severity() {
        assert!(PunctualityBand::Punctual < PunctualityBand::Light);
        assert!(PunctualityBand::Moderate < PunctualityBand::Severe);
    }

    // ── Reports serde ─────────────────────────────────────────────────────────

    #[test]
    fn test_rental_report_distribution_serializes_as_map() {
        let mut distribution = BTreeMap::new();
        distribution.insert(PunctualityBand::Punctual, 2usize);
        distribution.insert(PunctualityBand::Severe, 1usize);
        let report = RentalReport {
            most_delayed_unit: "B202".to_string(),
            max_mean_delay: 20.0,
            most_punctual_unit: "A101".to_string(),
            min_mean_delay: -1.0,
            unit_count: 3,
            overall_mean_delay: 6.5,
            punctuality_distribution: distribution,
            delay_ranking: vec![("B202".to_string(), 20.0)],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["punctuality_distribution"]["punctual"], 2);
        assert_eq!(json["punctuality_distribution"]["severe"], 1);
    }
}
