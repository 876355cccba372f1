//! Error types for the pagecheck library.
//!
//! Four failure families exist, and each has its own home:
//!
//! * [`ApiError`]: produced at the HTTP client boundary. One type covers
//!   transport failures (`status == 0`), rejected requests (non-2xx) and
//!   successful responses whose body could not be decoded. Use
//!   [`ApiError::kind`] to tell them apart.
//!
//! * [`ViewerError`]: a navigation or selection request that the viewer
//!   refused (page below 1, page past the known total, unknown tab). The
//!   viewer state is never touched when one of these is returned.
//!
//! * [`DecodeError`]: a page payload that is not usable base64 PDF data.
//!   The viewer turns it into a "page unavailable" display.
//!
//! * [`RenderError`]: the rendering engine could not start or could not
//!   open the bytes it was given.

use thiserror::Error;

/// Fallback message when neither the server body nor the status line says anything.
pub const FALLBACK_ERROR_MESSAGE: &str = "Something went wrong";

/// Which side of the wire an [`ApiError`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// No HTTP response was received (DNS, connection refused, aborted).
    Transport,
    /// The server answered with a non-2xx status.
    Http,
    /// The server answered 2xx but the body did not have the expected shape.
    Decode,
}

/// The single error type returned by [`crate::client::ApiClient`].
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ApiError {
    /// Human readable message, resolved as described on [`ApiError::http`].
    pub message: String,
    /// HTTP status code, or `0` when no response was received.
    pub status: u16,
    /// Decoded JSON error body, when the server sent one.
    pub payload: Option<serde_json::Value>,
    kind: ApiErrorKind,
}

impl ApiError {
    /// A failure before any HTTP response arrived. The transport's own
    /// message is kept verbatim.
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: 0,
            payload: None,
            kind: ApiErrorKind::Transport,
        }
    }

    /// A non-2xx response.
    ///
    /// The message is the payload's `message` field when it is a non-empty
    /// string, otherwise the status text, otherwise [`FALLBACK_ERROR_MESSAGE`].
    /// A `message` of any other JSON type (number, boolean, object, array)
    /// is ignored; it stays readable through [`ApiError::payload`].
    pub fn http(status: u16, status_text: &str, payload: Option<serde_json::Value>) -> Self {
        let from_body = payload
            .as_ref()
            .and_then(|p| p.get("message"))
            .and_then(|m| m.as_str())
            .filter(|m| !m.is_empty())
            .map(str::to_owned);

        let message = from_body
            .or_else(|| (!status_text.is_empty()).then(|| status_text.to_owned()))
            .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_owned());

        Self {
            message,
            status,
            payload,
            kind: ApiErrorKind::Http,
        }
    }

    /// A 2xx response whose body could not be decoded into the expected type.
    pub fn decode(status: u16, detail: impl Into<String>) -> Self {
        Self {
            message: detail.into(),
            status,
            payload: None,
            kind: ApiErrorKind::Decode,
        }
    }

    pub fn kind(&self) -> ApiErrorKind {
        self.kind
    }

    pub fn is_transport(&self) -> bool {
        self.kind == ApiErrorKind::Transport
    }
}

/// A viewer request that was refused. State is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewerError {
    /// Pages are 1-indexed.
    #[error("Page {page} is not a valid page number (pages start at 1)")]
    InvalidPage { page: i64 },

    /// The backend reported fewer pages.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: u32, total: u32 },

    #[error("Tab {index} does not exist ({available} categories loaded)")]
    TabOutOfRange { index: usize, available: usize },

    #[error("Check {index} does not exist in the selected tab ({available} checks)")]
    CheckOutOfRange { index: usize, available: usize },
}

/// A page payload that cannot become a render resource.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("No PDF data received in the response")]
    Empty,

    #[error("Failed to process PDF data: {0}")]
    Malformed(String),
}

/// Failures of the rendering engine.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The engine library could not be located, downloaded or bound.
    #[error("Rendering engine unavailable: {0}")]
    EngineUnavailable(String),

    /// A render call arrived before [`crate::viewer::RenderEngine::initialize`] succeeded.
    #[error("Rendering engine is not initialised yet")]
    NotReady,

    /// The engine does not implement this operation.
    #[error("Rendering engine does not support {0}")]
    Unsupported(&'static str),

    /// The bytes are not a PDF the engine can open.
    #[error("PDF document load error: {0}")]
    LoadFailed(String),

    #[error("Page {page} is out of range (payload has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Builder validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid base URL '{0}': must not contain whitespace")]
    InvalidBaseUrl(String),

    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
