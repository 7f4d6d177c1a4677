//! Crate-wide error type shared by every `rlink-*` crate, in the same spirit
//! as the rest of the workspace: one enum, one `Result` alias, no ad hoc
//! `String`/`anyhow` errors crossing crate boundaries.

use thiserror::Error;

/// Errors that can occur while configuring or running a match.
#[derive(Debug, Error)]
pub enum RlinkError {
    /// Malformed or incomplete match configuration. Surfaced before any
    /// pass runs: an unknown comparer name, a missing required key, or an
    /// inconsistent pass/comparer table length.
    #[error("invalid match configuration: {message}")]
    Config { message: String },

    /// A worker thread failed while scoring a chunk. Fatal: the match is
    /// aborted and any scratch shards are removed.
    #[error("worker failed on pass {pass}: {source}")]
    Worker {
        pass: String,
        #[source]
        source: Box<RlinkError>,
    },

    /// I/O failure while writing or reading a shard file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed row while reading or writing CSV.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Failed to parse or validate a TOML configuration file.
    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl RlinkError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn worker(pass: impl Into<String>, source: RlinkError) -> Self {
        Self::Worker {
            pass: pass.into(),
            source: Box::new(source),
        }
    }
}

/// Crate-wide result alias, mirrored in every `rlink-*` crate.
pub type Result<T> = std::result::Result<T, RlinkError>;
