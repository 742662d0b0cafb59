use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors raised by the predator-prey simulation.
///
/// None of these are recoverable: they abort the run before it starts (bad
/// or unreadable input, bad parameters) or as soon as an output sink stops accepting data.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// The landscape description does not match its declared shape or
    /// contains a cell that is neither 0 nor 1.
    #[error("malformed landscape input (line {line}): {reason}")]
    MalformedInput { line: usize, reason: String },

    /// The landscape file could not be opened or read.
    #[error("failed to read landscape '{}': {source}", .path.display())]
    LandscapeIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration value lies outside its admissible range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// An output file could not be created or written.
    #[error("failed to write output '{}': {source}", .path.display())]
    OutputIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SimulationError {
    pub fn malformed(line: usize, reason: impl Into<String>) -> Self {
        SimulationError::MalformedInput { line, reason: reason.into() }
    }

    pub fn landscape_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SimulationError::LandscapeIo { path: path.into(), source }
    }

    pub fn output_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SimulationError::OutputIo { path: path.into(), source }
    }
}
