//! Remote dataset loading: fetch, flatten, explode, clean, cache.
//!
//! The loader turns a raw JSON document into a cleaned [`Frame`]: one row
//! per transaction, the monetary column parsed to numbers, list-valued
//! columns exploded. Results are cached per URL for the process lifetime;
//! the cache hands out copies so callers can never mutate it through the
//! returned frame.

use std::collections::HashMap;

use insight_core::models::LoaderConfig;
use insight_core::processors::MoneyCleaner;
use insight_core::{InsightError, Result};
use serde_json::Value;
use tracing::{debug, warn};

use crate::frame::{Cell, Frame};

// ── Fetch seam ────────────────────────────────────────────────────────────────

/// Source of raw JSON documents, keyed by URL.
///
/// The production implementation is [`HttpFetcher`]; tests inject an
/// in-memory one.
pub trait Fetch {
    /// Fetch and parse the JSON document at `url`.
    fn fetch_json(&self, url: &str) -> Result<Value>;
}

/// Blocking HTTP fetcher.
#[derive(Debug, Default)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Fetch for HttpFetcher {
    fn fetch_json(&self, url: &str) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|source| InsightError::Fetch {
                url: url.to_string(),
                source,
            })?;
        response.json().map_err(|source| InsightError::Fetch {
            url: url.to_string(),
            source,
        })
    }
}

// ── DataLoader ────────────────────────────────────────────────────────────────

/// Loads and cleans remote datasets, caching the result per URL.
pub struct DataLoader<F: Fetch = HttpFetcher> {
    fetcher: F,
    cache: HashMap<String, Frame>,
}

impl DataLoader<HttpFetcher> {
    /// A loader backed by a blocking HTTP client.
    pub fn new() -> Self {
        Self::with_fetcher(HttpFetcher::new())
    }
}

impl Default for DataLoader<HttpFetcher> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Fetch> DataLoader<F> {
    /// A loader backed by an arbitrary fetcher.
    pub fn with_fetcher(fetcher: F) -> Self {
        Self {
            fetcher,
            cache: HashMap::new(),
        }
    }

    /// Load the dataset described by `config` and return the cleaned frame.
    ///
    /// Fails when the fetch fails, when `config.key` is absent from the
    /// document, when the key does not hold a list, or when
    /// `config.value_column` is absent after flattening. There is no
    /// partial success: either the full cleaned frame comes back or the
    /// load errors.
    ///
    /// Repeated loads of the same URL return a copy of the cached frame
    /// without refetching.
    pub fn load(&mut self, config: &LoaderConfig) -> Result<Frame> {
        if let Some(cached) = self.cache.get(&config.url) {
            debug!("Cache hit for {}", config.url);
            return Ok(cached.clone());
        }

        let document = self.fetcher.fetch_json(&config.url)?;
        let frame = build_frame(&document, config)?;

        debug!(
            "Loaded {} rows x {} columns from {}",
            frame.len(),
            frame.columns().len(),
            config.url
        );

        self.cache.insert(config.url.clone(), frame.clone());
        Ok(frame)
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Turn a fetched document into a cleaned frame: extract the configured
/// key, flatten, explode, clean the monetary column.
fn build_frame(document: &Value, config: &LoaderConfig) -> Result<Frame> {
    let records = document
        .get(&config.key)
        .ok_or_else(|| InsightError::MissingKey(config.key.clone()))?;
    let records = records
        .as_array()
        .ok_or_else(|| InsightError::NotAnArray(config.key.clone()))?;

    let mut frame = Frame::from_objects(records).explode_list_columns();
    clean_money_column(&mut frame, &config.value_column, &config.strip_prefixes)?;
    Ok(frame)
}

/// Parse the monetary column in place.
///
/// Text cells go through [`MoneyCleaner`]; numbers pass through; anything
/// else becomes `Null`. Cleaned amounts are non-negative or null, so a
/// negative parse is coerced to `Null` with a warning.
fn clean_money_column(frame: &mut Frame, column: &str, strip: &[String]) -> Result<()> {
    let found = frame.map_column(column, |cell| {
        let parsed = match cell {
            Cell::Text(s) => MoneyCleaner::clean(s, strip),
            Cell::Number(v) => Some(*v),
            _ => None,
        };
        match parsed {
            Some(v) if v >= 0.0 => Cell::Number(v),
            Some(v) => {
                warn!("Dropping negative monetary value {v} in column '{column}'");
                Cell::Null
            }
            None => Cell::Null,
        }
    });

    if !found {
        return Err(InsightError::MissingColumn(column.to_string()));
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
