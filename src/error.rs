use thiserror::Error;

/// Everything that can go wrong between reading the tables and emitting results.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Malformed input: missing column, null required field, bad row.
    #[error("data error: {0}")]
    Data(String),

    /// A metric was requested on a graph where it is undefined.
    #[error("{metric} is undefined on an empty graph")]
    EmptyGraph {
        metric: &'static str,
    },

    /// Average path length cannot be computed on the selected node set.
    #[error("path length unavailable: {reason}")]
    DisconnectedSample {
        reason: String,
    },

    #[error("worker error: {0}")]
    Worker(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
