use thiserror::Error;

/// A metric configuration that cannot be used for scoring.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Metric `{metric}` has preference `{value}`, expected `low` or `high`")]
    InvalidPreference { metric: String, value: String },

    #[error("Metric `{metric}` has negative weight {weight}")]
    NegativeWeight { metric: String, weight: f64 },

    #[error("Metric `{metric}` has a weight that is not a finite number")]
    NonFiniteWeight { metric: String },

    #[error("Metric `{0}` is configured more than once")]
    DuplicateMetric(String),

    #[error("Failed to parse the configuration as JSON")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse the configuration as YAML")]
    Yaml(#[from] serde_yaml::Error),
}

/// An entity table that violates its own invariants.
#[derive(Error, Debug)]
pub enum TableError {
    #[error("The table has no `Ticker` column")]
    MissingTickerColumn,

    #[error("Ticker `{0}` appears more than once")]
    DuplicateTicker(String),

    #[error("Column `{column}` has {actual} values for {expected} entities")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("Column name `{0}` is reserved")]
    ReservedColumn(String),

    #[error("Failed to read the table as CSV")]
    Csv(#[from] csv::Error),
}

/// Failure to read or write a persisted score table.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Failed to read or write the score table as CSV")]
    Csv(#[from] csv::Error),

    #[error("Failed to flush the score table")]
    Io(#[from] std::io::Error),

    #[error("The persisted score table has no ticker column")]
    MissingTickerColumn,

    #[error("Ticker `{0}` appears more than once in the persisted score table")]
    DuplicateTicker(String),

    #[error("Ticker `{ticker}` has value `{value}` in column `{column}`, which is not a number")]
    InvalidValue {
        ticker: String,
        column: String,
        value: String,
    },
}

#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("Sector scores require a `Sector` column in the entity table")]
    MissingSectorColumn,

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
