//! Error types shared across the dashboard

use thiserror::Error;

/// Rejections raised while building a [`crate::streams::StreamCatalog`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("stream catalog is empty")]
    Empty,

    #[error("duplicate stream id in catalog: {0}")]
    DuplicateId(String),

    #[error("more than one stream marked primary: {first} and {second}")]
    MultiplePrimaries { first: String, second: String },
}

/// Location lookup failures. `Display` is the message shown to the viewer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    /// No position could be obtained at all
    #[error("Unable to retrieve your location. Please enable location services.")]
    PositionUnavailable,

    /// A position was found but reverse geocoding did not name a place
    #[error("Could not determine your city from your location.")]
    GeocodingFailed,
}

/// Failures inside a collaborator fetch. Never leaves the service module:
/// every public service function turns it into a fallback value.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] ureq::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("unexpected payload: {0}")]
    Invalid(String),
}

impl FetchError {
    pub fn invalid<S: Into<String>>(msg: S) -> Self {
        Self::Invalid(msg.into())
    }
}

/// Configuration file errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
