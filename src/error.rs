use std::path::PathBuf;

/// Structural problems with an input table. Missing cells are not errors;
/// a missing column is.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("{table}: required column `{column}` not found in header")]
    MissingColumn { table: String, column: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed CSV in {table}: {source}")]
    Csv { table: String, source: csv::Error },
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("line tolerance must be a finite non-negative number, got {0}")]
    InvalidTolerance(f64),

    #[error("{field} must be at least 1")]
    ZeroTopN { field: &'static str },

    #[error("unknown {field} `{value}`, expected one of: {expected}")]
    UnknownVariant {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
}
