// SPDX-License-Identifier: MPL-2.0
use std::fmt;

/// Crate-wide error type.
///
/// Operations requested in a state that cannot honor them are *not* errors:
/// they are silent no-ops by design, so UI input can race freely against
/// async engine callbacks. `Error` covers the cases that genuinely fail.
#[derive(Debug, Clone)]
pub enum Error {
    /// The engine rejected the data source (missing file, unreadable, ...).
    Source(String),

    /// Asynchronous engine failure, reported as an engine-defined pair.
    Engine { code: i32, extra: i32 },

    /// Saved-state or configuration file could not be read or written.
    Persist(String),

    /// Configuration could not be parsed or serialized.
    Config(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Source(msg) => write!(f, "Source rejected: {}", msg),
            Error::Engine { code, extra } => {
                write!(f, "Engine error: code {} (extra {})", code, extra)
            }
            Error::Persist(msg) => write!(f, "Persistence error: {}", msg),
            Error::Config(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Persist(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
