use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::seq::{FeatureKind, LocationError};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Syntax error: {0}")]
    Syntax(String),
    #[error("{0}")]
    Io(#[source] #[from] io::Error),
    #[error("Genbank file format error or incomplete sequence: no ORIGIN data found")]
    MissingOrigin,
    #[error("Invalid {kind} location '{location}': {source}")]
    Location {
        kind: FeatureKind,
        location: String,
        #[source]
        source: LocationError,
    },
    #[error("{what} sequence length {len} exceeds limit of {max}")]
    SequenceTooLong {
        what: &'static str,
        len: usize,
        max: usize,
    },
    #[error("Genbank file must have a .gb or .gbk extension: {0}")]
    BadExtension(PathBuf),
    #[error("Output path does not exist: {0}")]
    MissingOutputDir(PathBuf),
}
