//! Error taxonomy for the analytics job.
//!
//! Every variant here is fatal to a run. Row-level problems (a timestamp or
//! duration that does not parse) never surface as errors; the row simply
//! drops out of the aggregate that needed the value.

use std::path::PathBuf;

use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Input path does not name a readable regular file
    #[error("input not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    /// Header or rows could not be parsed into a relation, including rows
    /// whose field count differs from the header
    #[error("malformed input {}: {source}", path.display())]
    InputFormat {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Input parsed but lacks a column the queries depend on
    #[error("input {} is missing required column `{column}`", path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("query evaluation failed: {0}")]
    Query(#[from] PolarsError),

    /// Destination could not be cleared or created
    #[error("cannot write output {}: {source}", path.display())]
    OutputIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Result could not be encoded in the selected format
    #[error("cannot encode output {}: {source}", path.display())]
    OutputEncode {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
