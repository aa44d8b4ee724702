use std::path::PathBuf;

use thiserror::Error;

use crate::color::VertexId;

/** errors raised while building or reading an instance. The search itself never fails. */
#[derive(Debug, Error)]
pub enum LoadError {
    /// the file could not be read
    #[error("unable to read {path}: {source}")]
    Io {
        /// file that was read
        path: PathBuf,
        /// underlying error
        #[source]
        source: std::io::Error,
    },

    /// a line of the file could not be parsed
    #[error("line {line}: {msg}")]
    Parse {
        /// 1-based line number
        line: usize,
        /// what went wrong
        msg: String,
    },

    /// no `p edge n m` (or `p col n m`) line before the first edge
    #[error("missing problem line (p edge n m)")]
    MissingHeader,

    /// an edge references a vertex outside of 0..n
    #[error("edge ({u},{v}) references a vertex outside of 0..{n}")]
    VertexOutOfRange {
        /// first endpoint (0-based)
        u: VertexId,
        /// second endpoint (0-based)
        v: VertexId,
        /// number of vertices
        n: usize,
    },

    /// an edge connects a vertex with itself
    #[error("self-loop on vertex {0}")]
    SelfLoop(VertexId),
}

/** errors raised while reading or validating a solver configuration */
#[derive(Debug, Error)]
pub enum ConfigError {
    /// the configuration file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// the configuration file is not valid JSON for [`crate::config::SolverConfig`]
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// a parameter is out of its valid range
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/** errors raised by the executables around the search (arguments, inputs and outputs) */
#[derive(Debug, Error)]
pub enum AppError {
    /// the instance could not be loaded
    #[error(transparent)]
    Load(#[from] LoadError),

    /// the configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// a file could not be read or written
    #[error("I/O error on {path}: {source}")]
    Io {
        /// file concerned
        path: PathBuf,
        /// underlying error
        #[source]
        source: std::io::Error,
    },

    /// the known optima file is malformed
    #[error("known optima, line {line}: {msg}")]
    KnownOptima {
        /// 1-based line number
        line: usize,
        /// what went wrong
        msg: String,
    },

    /// a command line argument has an invalid value
    #[error("invalid value for {name}: {value}")]
    InvalidArgument {
        /// argument name
        name: String,
        /// value given
        value: String,
    },

    /// the statistics could not be serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// the CSV statistics could not be written
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
