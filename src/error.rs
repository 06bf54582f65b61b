//! Centralized error handling for roadwatch.
//!
//! Every stage returns [`Result<T>`], whose error is a [`RoadwatchError`].
//! The variants group failures by the collaborator that produced them, so the
//! driver can tell a broken input file apart from a broken network call:
//!
//! ```
//! use roadwatch::error::RoadwatchError;
//!
//! fn describe(err: &RoadwatchError) -> &'static str {
//!     match err {
//!         RoadwatchError::Io(_) => "file system",
//!         RoadwatchError::Geometry(_) => "vector data",
//!         RoadwatchError::Network(_) => "remote API",
//!         _ => "other",
//!     }
//! }
//! ```
//!
//! ## Context Extension Trait
//!
//! [`ResultExt`] adds `.context()` to any `Result` whose error converts into
//! a [`RoadwatchError`]:
//!
//! ```no_run
//! use roadwatch::error::ResultExt as _;
//!
//! fn load() -> roadwatch::error::Result<String> {
//!     std::fs::read_to_string("2016.geojson").context("Failed to load snapshot")
//! }
//! ```

use std::fmt;

/// Main error type for roadwatch operations.
#[derive(Debug)]
pub enum RoadwatchError {
    /// I/O errors (file operations)
    Io(std::io::Error),

    /// Malformed or unsupported vector data
    Geometry(String),

    /// HTTP transport, status or response decoding errors
    Network(String),

    /// Rasterisation and image encoding errors
    Render(String),

    /// Configuration errors
    Config(String),

    /// File not found or invalid path
    InvalidPath(String),

    /// Generic error with context
    Other(String),
}

impl fmt::Display for RoadwatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Geometry(msg) => write!(f, "Geometry error: {msg}"),
            Self::Network(msg) => write!(f, "Network error: {msg}"),
            Self::Render(msg) => write!(f, "Render error: {msg}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::InvalidPath(msg) => write!(f, "Invalid path: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for RoadwatchError {}

impl RoadwatchError {
    /// Prefixes the message with `context`, keeping the variant.
    #[must_use]
    pub fn with_prefix(self, context: &str) -> Self {
        match self {
            Self::Io(e) => Self::Io(std::io::Error::new(e.kind(), format!("{context}: {e}"))),
            Self::Geometry(msg) => Self::Geometry(format!("{context}: {msg}")),
            Self::Network(msg) => Self::Network(format!("{context}: {msg}")),
            Self::Render(msg) => Self::Render(format!("{context}: {msg}")),
            Self::Config(msg) => Self::Config(format!("{context}: {msg}")),
            Self::InvalidPath(msg) => Self::InvalidPath(format!("{context}: {msg}")),
            Self::Other(msg) => Self::Other(format!("{context}: {msg}")),
        }
    }
}

impl From<std::io::Error> for RoadwatchError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<anyhow::Error> for RoadwatchError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<serde_json::Error> for RoadwatchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

impl From<geojson::Error> for RoadwatchError {
    fn from(err: geojson::Error) -> Self {
        Self::Geometry(err.to_string())
    }
}

impl From<reqwest::Error> for RoadwatchError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<roxmltree::Error> for RoadwatchError {
    fn from(err: roxmltree::Error) -> Self {
        Self::Network(format!("XML error: {err}"))
    }
}

impl From<image::ImageError> for RoadwatchError {
    fn from(err: image::ImageError) -> Self {
        Self::Render(err.to_string())
    }
}

impl From<csv::Error> for RoadwatchError {
    fn from(err: csv::Error) -> Self {
        Self::Other(format!("CSV error: {err}"))
    }
}

/// Result type alias for roadwatch operations.
pub type Result<T> = std::result::Result<T, RoadwatchError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<RoadwatchError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err: RoadwatchError = e.into();
            let msg: String = msg.into();
            err.with_prefix(&msg)
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err: RoadwatchError = e.into();
            err.with_prefix(&f())
        })
    }
}
