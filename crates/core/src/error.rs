//! Error types for Ottobasin

use thiserror::Error;

/// Main error type for Ottobasin operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(String),

    #[error("Unknown field '{name}' (available: {available})")]
    UnknownField { name: String, available: String },

    #[error("Record {record}: attribute '{field}' is missing or null")]
    MissingAttribute { record: usize, field: String },

    #[error("Record {record}: invalid basin code '{code}' ({reason})")]
    InvalidBasinCode {
        record: usize,
        code: String,
        reason: String,
    },

    #[error("Record {record}: cannot parse area value '{value}'")]
    AreaParse { record: usize, value: String },

    #[error("Record {record}: malformed shape ({reason})")]
    MalformedRecord { record: usize, reason: String },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("{0}")]
    Other(String),
}

impl From<geojson::Error> for Error {
    fn from(e: geojson::Error) -> Self {
        Error::GeoJson(e.to_string())
    }
}

/// Result type alias for Ottobasin operations
pub type Result<T> = std::result::Result<T, Error>;
