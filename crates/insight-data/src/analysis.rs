//! Top-level analysis pipeline.
//!
//! Orchestrates loading, cleaning, and both analyzers, returning a
//! [`DashboardData`] ready for the dashboard layer: the two reports plus
//! the cleaned record sets the day-level charts are drawn from.

use chrono::Utc;
use insight_core::models::{LoaderConfig, RentalRecord, RentalReport, SaleRecord, SalesReport};
use insight_core::validators::{lowercase_trim, strip_unit_marker};
use insight_core::Result;
use tracing::debug;

use crate::loader::{DataLoader, Fetch};
use crate::rentals::{RentalAnalyzer, RentalColumns};
use crate::sales::{SalesAnalyzer, SalesColumns};

// ── Built-in dataset configurations ───────────────────────────────────────────

const SALES_URL: &str = "https://raw.githubusercontent.com/YuriArduino/Estudos_Pandas/refs/heads/data-tests/dados_vendas_clientes.json";
const RENTALS_URL: &str = "https://raw.githubusercontent.com/YuriArduino/Estudos_Pandas/refs/heads/data-tests/dados_locacao_imoveis.json";

/// Loader configuration for the sales event log.
pub fn sales_config() -> LoaderConfig {
    LoaderConfig::new(SALES_URL, "dados_vendas", "Valor da compra").with_prefixes(&["R$ "])
}

/// Loader configuration for the rental payment log.
pub fn rentals_config() -> LoaderConfig {
    LoaderConfig::new(RENTALS_URL, "dados_locacao", "valor_aluguel")
        .with_prefixes(&["$", " reais"])
}

// ── DashboardData ─────────────────────────────────────────────────────────────

/// Everything the dashboard layer consumes, read-only.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DashboardData {
    /// Aggregate sales statistics.
    pub sales: SalesReport,
    /// Aggregate rental statistics.
    pub rentals: RentalReport,
    /// Cleaned sale records, for the daily revenue chart.
    pub sales_records: Vec<SaleRecord>,
    /// Cleaned rental records, for the delay charts.
    pub rental_records: Vec<RentalRecord>,
    /// ISO-8601 timestamp when this result was generated.
    pub generated_at: String,
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

/// Load and clean the sales dataset, returning its analyzer.
///
/// Cleaning order matters: the customer identifier is normalized
/// (lowercase + trim) before grouping ever sees it, then the sale date
/// column is parsed.
pub fn prepare_sales<F: Fetch>(loader: &mut DataLoader<F>) -> Result<SalesAnalyzer> {
    let columns = SalesColumns::default();
    let mut frame = loader.load(&sales_config())?;
    frame.map_text_column(&columns.customer, lowercase_trim);
    let frame = frame.normalize_dates(&[&columns.date]);
    SalesAnalyzer::from_frame(&frame, &columns)
}

/// Load and clean the rental dataset, returning its analyzer.
pub fn prepare_rentals<F: Fetch>(loader: &mut DataLoader<F>) -> Result<RentalAnalyzer> {
    let columns = RentalColumns::default();
    let mut frame = loader.load(&rentals_config())?;
    frame.map_text_column(&columns.unit, strip_unit_marker);
    let frame = frame.normalize_dates(&[&columns.agreed_date, &columns.paid_date]);
    RentalAnalyzer::from_frame(&frame, &columns)
}

/// Run the full pipeline over both datasets.
pub fn run_analysis<F: Fetch>(loader: &mut DataLoader<F>) -> Result<DashboardData> {
    let sales_analyzer = prepare_sales(loader)?;
    let rental_analyzer = prepare_rentals(loader)?;

    let sales = sales_analyzer.report()?;
    let rentals = rental_analyzer.report()?;

    debug!(
        "Analysis complete: {} customers, {} units",
        sales.customer_count, rentals.unit_count
    );

    Ok(DashboardData {
        sales,
        rentals,
        sales_records: sales_analyzer.records().to_vec(),
        rental_records: rental_analyzer.records().to_vec(),
        generated_at: Utc::now().to_rfc3339(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
