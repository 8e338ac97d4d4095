use thiserror::Error;

/// All errors produced by the insights pipeline.
#[derive(Error, Debug)]
pub enum InsightError {
    /// The remote dataset could not be fetched.
    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The configured top-level key is absent from the fetched document.
    #[error("Key '{0}' not found in JSON document")]
    MissingKey(String),

    /// The configured key holds something other than a list of records.
    #[error("Key '{0}' does not hold a list of records")]
    NotAnArray(String),

    /// A required column is absent after flattening.
    #[error("Column '{0}' not found")]
    MissingColumn(String),

    /// A typed record failed construction-time validation.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// An analyzer was given no usable rows to report on.
    #[error("Dataset is empty: {0}")]
    EmptyDataset(String),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the insight crates.
pub type Result<T> = std::result::Result<T, InsightError>;
