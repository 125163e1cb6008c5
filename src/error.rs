//! Unified error type.

use crate::config::ConfigError;

/// The error type returned by warden's fallible operations.
///
/// Application-level outcomes (404, a rejected submission, etc.) are
/// expressed as HTTP [`Response`](crate::Response) values, not as `Error`s.
/// This type surfaces infrastructure failures: binding to a port or
/// reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
