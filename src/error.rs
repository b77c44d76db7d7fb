//! Error types for the stream core.
//!
//! Only two conditions ever reach a caller of the session API: an unknown or
//! expired session, and a failure while building a session. Source and
//! extraction failures are absorbed by the merger and the pipeline, which
//! log them and carry on; the variants exist so those layers have something
//! structured to log.

/// Errors produced by the stream core.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The session key is not in the cache: never created, deleted, or idle
    /// past its TTL.
    #[error("unknown or expired session: {0}")]
    UnknownSession(String),

    /// An upstream source failed to produce items.
    #[error("source '{name}' failed: {message}")]
    Source { name: String, message: String },

    /// An extractor could not resolve a locator.
    #[error("extraction failed for {locator}: {message}")]
    Extraction { locator: String, message: String },

    /// An HTTP request failed or returned an error status.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A response body could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StreamError>;
