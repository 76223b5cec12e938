use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Reference table '{table}' has no entry for {tier}/{segment}")]
    IncompleteTables {
        table: &'static str,
        tier: String,
        segment: String,
    },

    #[error("Weights in '{table}' sum to {sum}, expected 1.0")]
    InvalidWeights { table: String, sum: f64 },

    #[error("Range in '{table}' is inverted: {lo} > {hi}")]
    InvalidRange { table: String, lo: f64, hi: f64 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type TelemetryResult<T> = Result<T, TelemetryError>;
