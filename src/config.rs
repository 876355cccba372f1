//! Configuration for the HTTP client and the viewer.
//!
//! Nothing here is global: a [`ClientConfig`] is built once and handed to
//! [`crate::client::ApiClient`], a [`ViewerConfig`] to
//! [`crate::viewer::ViewerController`]. Tests build their own instead of
//! mutating process state.

use crate::error::ConfigError;
use reqwest::header::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

/// Environment variable holding the public base URL of the backend.
pub const BASE_URL_ENV: &str = "PAGECHECK_PUBLIC_URL";

/// Base URL used when [`BASE_URL_ENV`] is unset.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Strip one trailing slash, unless the whole path is `"/"`.
///
/// Endpoints start with `/`, so `"http://host/"` + `"/api"` would otherwise
/// produce a double slash.
pub fn normalize_base_path(raw: &str) -> String {
    if raw.len() > 1 && raw.ends_with('/') {
        raw[..raw.len() - 1].to_string()
    } else {
        raw.to_string()
    }
}

/// Connection settings for [`crate::client::ApiClient`].
///
/// # Example
/// ```rust
/// use pagecheck::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("http://localhost:8000/")
///     .header("X-Client", "pagecheck")
///     .build()
///     .unwrap();
/// assert_eq!(config.base_url, "http://localhost:8000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Already normalised by [`normalize_base_path`].
    pub base_url: String,

    /// Headers sent with every request. Per-request headers with the same
    /// name win.
    pub default_headers: Vec<(String, String)>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            default_headers: Vec::new(),
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            base_url: DEFAULT_BASE_URL.to_string(),
            default_headers: Vec::new(),
        }
    }

    /// Read the base URL from [`BASE_URL_ENV`], falling back to [`DEFAULT_BASE_URL`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let base = std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::builder().base_url(base).build()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    base_url: String,
    default_headers: Vec<(String, String)>,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Validate and normalise.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let trimmed = self.base_url.trim();
        if trimmed.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidBaseUrl(self.base_url));
        }

        for (name, value) in &self.default_headers {
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| ConfigError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
            HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        }

        Ok(ClientConfig {
            base_url: normalize_base_path(trimmed),
            default_headers: self.default_headers,
        })
    }
}

// ── Viewer ───────────────────────────────────────────────────────────────

/// How the bytes returned by `/api/extract-page` relate to the requested page.
///
/// The backend extracts a single page server-side, so each payload is a
/// one-page PDF and the viewer renders its first page. A backend that
/// returns the whole document on every call needs `FullDocument`, which
/// renders page `n` of the payload instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageFraming {
    /// Payload holds exactly the requested page. (default)
    #[default]
    SinglePage,
    /// Payload holds the whole document.
    FullDocument,
}

impl PageFraming {
    /// 1-indexed page of the payload to render for a requested page.
    pub fn render_index(&self, requested: u32) -> u32 {
        match self {
            PageFraming::SinglePage => 1,
            PageFraming::FullDocument => requested,
        }
    }
}

/// Settings for [`crate::viewer::ViewerController`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Default: [`PageFraming::SinglePage`].
    pub page_framing: PageFraming,

    /// Target width in pixels when rasterising the current page. Range:
    /// 100–4000. Default: 500.
    pub render_width: u32,

    /// Page shown right after mount. Default: 1.
    pub initial_page: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            page_framing: PageFraming::default(),
            render_width: 500,
            initial_page: 1,
        }
    }
}

impl ViewerConfig {
    pub fn builder() -> ViewerConfigBuilder {
        ViewerConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ViewerConfig`].
#[derive(Debug)]
pub struct ViewerConfigBuilder {
    config: ViewerConfig,
}

impl ViewerConfigBuilder {
    pub fn page_framing(mut self, framing: PageFraming) -> Self {
        self.config.page_framing = framing;
        self
    }

    pub fn render_width(mut self, px: u32) -> Self {
        self.config.render_width = px.clamp(100, 4000);
        self
    }

    pub fn initial_page(mut self, page: u32) -> Self {
        self.config.initial_page = page;
        self
    }

    pub fn build(self) -> Result<ViewerConfig, ConfigError> {
        if self.config.initial_page == 0 {
            return Err(ConfigError::Invalid(
                "initial page must be ≥ 1 (pages are 1-indexed)".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_stripped() {
        assert_eq!(normalize_base_path("http://host/"), "http://host");
        assert_eq!(normalize_base_path("/app/"), "/app");
        assert_eq!(normalize_base_path("http://host"), "http://host");
    }

    #[test]
    fn root_and_empty_are_kept() {
        assert_eq!(normalize_base_path("/"), "/");
        assert_eq!(normalize_base_path(""), "");
    }

    #[test]
    fn builder_normalises_and_validates() {
        let c = ClientConfig::builder()
            .base_url("  http://localhost:9000/ ")
            .build()
            .unwrap();
        assert_eq!(c.base_url, "http://localhost:9000");

        let err = ClientConfig::builder()
            .base_url("http://local host")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl(_)));

        let err = ClientConfig::builder()
            .header("bad header", "x")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHeader { .. }));
    }

    #[test]
    fn viewer_defaults() {
        let c = ViewerConfig::default();
        assert_eq!(c.render_width, 500);
        assert_eq!(c.initial_page, 1);
        assert_eq!(c.page_framing, PageFraming::SinglePage);

        let c = ViewerConfig::builder().render_width(10).build().unwrap();
        assert_eq!(c.render_width, 100);
        assert!(ViewerConfig::builder().initial_page(0).build().is_err());
    }

    #[test]
    fn framing_render_index() {
        assert_eq!(PageFraming::SinglePage.render_index(7), 1);
        assert_eq!(PageFraming::FullDocument.render_index(7), 7);
    }
}
