use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed csv in {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("row {row}: cannot parse timestamp {value:?}")]
    Timestamp { row: usize, value: String },

    #[error("row {row}, column {column:?}: cannot parse value {value:?}")]
    Value {
        row: usize,
        column: String,
        value: String,
    },

    #[error("dataset {name:?} has {actual} rows, its split layout needs {required}")]
    InsufficientData {
        name: String,
        required: usize,
        actual: usize,
    },

    #[error("configured for {expected} variates but the data has {actual}")]
    ChannelMismatch { expected: usize, actual: usize },

    #[error("embedding row {row} in {path:?} has {actual} values, expected {expected}")]
    Embedding {
        path: PathBuf,
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("embedding row {row} in {path:?} is not valid json: {source}")]
    EmbeddingParse {
        path: PathBuf,
        row: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("batch source is empty")]
    EmptySource,

    #[error("{component}: expected shape {expected:?}, got {actual:?}")]
    ShapeMismatch {
        component: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("unsupported device {0:?}, only \"cpu\" is available")]
    UnsupportedDevice(String),

    #[error("checkpoint {path:?}: {message}")]
    Checkpoint { path: PathBuf, message: String },

    #[error("invalid config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ProbeError>;
