//! Typed HTTP client with unified error handling.
//!
//! Every call goes through [`ApiClient::request`]; the verb helpers only
//! shape parameters. The outcome of a call is one of:
//!
//! ```text
//! transport error ──────────────▶ Err(ApiError { status: 0 })
//! non-2xx ──────────────────────▶ Err(ApiError { status, message, payload })
//! 2xx, JSON content type ───────▶ Ok(ApiResponse::Content(T))  or Err(decode)
//! 2xx, anything else / empty ───▶ Ok(ApiResponse::NoContent)
//! ```

pub mod transport;

#[cfg(test)]
pub(crate) mod mock;

use crate::config::ClientConfig;
use crate::error::ApiError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use tracing::{debug, error, warn};
pub use transport::{HttpMethod, HttpRequest, HttpTransport, RawResponse, Transport, TransportError};

/// Successful outcome of a request.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse<T> {
    /// The body was JSON and decoded into `T`.
    Content(T),
    /// 2xx without a JSON body (e.g. 204).
    NoContent { status: u16 },
}

impl<T> ApiResponse<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            ApiResponse::Content(v) => Some(v),
            ApiResponse::NoContent { .. } => None,
        }
    }

    pub fn is_no_content(&self) -> bool {
        matches!(self, ApiResponse::NoContent { .. })
    }

    /// Demand a body. A no-content answer becomes a decode error naming `endpoint`.
    pub fn require(self, endpoint: &str) -> Result<T, ApiError> {
        match self {
            ApiResponse::Content(v) => Ok(v),
            ApiResponse::NoContent { status } => Err(ApiError::decode(
                status,
                format!("Expected a JSON body from {endpoint}, got none"),
            )),
        }
    }
}

/// A flat query-string value. Coerced to a string on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryValue::Str(s) => f.write_str(s),
            QueryValue::Int(n) => write!(f, "{n}"),
            QueryValue::Float(n) => write!(f, "{n}"),
            QueryValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(v: &str) -> Self {
        QueryValue::Str(v.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(v: String) -> Self {
        QueryValue::Str(v)
    }
}

impl From<i64> for QueryValue {
    fn from(v: i64) -> Self {
        QueryValue::Int(v)
    }
}

impl From<u32> for QueryValue {
    fn from(v: u32) -> Self {
        QueryValue::Int(i64::from(v))
    }
}

impl From<f64> for QueryValue {
    fn from(v: f64) -> Self {
        QueryValue::Float(v)
    }
}

impl From<bool> for QueryValue {
    fn from(v: bool) -> Self {
        QueryValue::Bool(v)
    }
}

/// Build `key=value&…`, percent-encoding both sides. Empty input → empty string.
pub fn build_query_string(params: &[(&str, QueryValue)]) -> String {
    params
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                urlencoding::encode(k),
                urlencoding::encode(&v.to_string())
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

const ACCEPT_JSON: (&str, &str) = ("Accept", "application/json");
const CONTENT_TYPE_JSON: (&str, &str) = ("Content-Type", "application/json");

/// HTTP client bound to one base URL.
///
/// Holds no mutable state: the base URL and default headers are fixed at
/// construction.
pub struct ApiClient<T = HttpTransport> {
    base_url: String,
    default_headers: Vec<(String, String)>,
    transport: T,
}

impl<T> fmt::Debug for ApiClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("default_headers", &self.default_headers)
            .finish_non_exhaustive()
    }
}

impl ApiClient<HttpTransport> {
    /// Client over the default `reqwest` transport.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let transport = HttpTransport::new().map_err(|e| ApiError::transport(e.0))?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn with_transport(config: &ClientConfig, transport: T) -> Self {
        Self {
            base_url: config.base_url.clone(),
            default_headers: config.default_headers.clone(),
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Perform one request against `base_url + endpoint`.
    pub async fn request<R: DeserializeOwned>(
        &self,
        endpoint: &str,
        method: HttpMethod,
        headers: &[(&str, &str)],
        body: Option<Vec<u8>>,
    ) -> Result<ApiResponse<R>, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let request = HttpRequest {
            method,
            url: url.clone(),
            headers: self.merge_headers(headers),
            body,
        };

        debug!("{} {}", method, url);

        let response = match self.transport.send(request).await {
            Ok(r) => r,
            Err(e) => {
                error!("Network or unexpected error for {}: {}", url, e);
                return Err(ApiError::transport(e.0));
            }
        };

        if !response.is_success() {
            let payload = if response.is_json() {
                match serde_json::from_slice::<serde_json::Value>(&response.body) {
                    Ok(v) => Some(v),
                    Err(e) => {
                        warn!("Failed to parse JSON error response for {}: {}", url, e);
                        None
                    }
                }
            } else {
                None
            };
            let err = ApiError::http(response.status, &response.status_text, payload);
            debug!("{} {} failed: {} ({})", method, url, err.message, err.status);
            return Err(err);
        }

        if !response.is_json() || response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(ApiResponse::NoContent {
                status: response.status,
            });
        }

        serde_json::from_slice::<R>(&response.body)
            .map(ApiResponse::Content)
            .map_err(|e| {
                warn!("Malformed JSON body from {}: {}", url, e);
                ApiError::decode(response.status, format!("Malformed response from {endpoint}: {e}"))
            })
    }

    /// GET with an optional flat query mapping.
    pub async fn get<R: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, QueryValue)],
    ) -> Result<ApiResponse<R>, ApiError> {
        let target = if query.is_empty() {
            endpoint.to_string()
        } else {
            format!("{}?{}", endpoint, build_query_string(query))
        };
        self.request(&target, HttpMethod::Get, &[ACCEPT_JSON], None)
            .await
    }

    pub async fn post<R: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        data: &B,
    ) -> Result<ApiResponse<R>, ApiError> {
        let body = encode_body(endpoint, data)?;
        self.request(
            endpoint,
            HttpMethod::Post,
            &[CONTENT_TYPE_JSON, ACCEPT_JSON],
            Some(body),
        )
        .await
    }

    pub async fn put<R: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        data: &B,
    ) -> Result<ApiResponse<R>, ApiError> {
        let body = encode_body(endpoint, data)?;
        self.request(
            endpoint,
            HttpMethod::Put,
            &[CONTENT_TYPE_JSON, ACCEPT_JSON],
            Some(body),
        )
        .await
    }

    /// DELETE. Usually answers with no content.
    pub async fn delete<R: DeserializeOwned>(
        &self,
        endpoint: &str,
    ) -> Result<ApiResponse<R>, ApiError> {
        self.request(endpoint, HttpMethod::Delete, &[ACCEPT_JSON], None)
            .await
    }

    fn merge_headers(&self, overrides: &[(&str, &str)]) -> Vec<(String, String)> {
        let mut headers: Vec<(String, String)> = self
            .default_headers
            .iter()
            .filter(|(name, _)| {
                !overrides
                    .iter()
                    .any(|(o, _)| o.eq_ignore_ascii_case(name))
            })
            .cloned()
            .collect();
        headers.extend(
            overrides
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        );
        headers
    }
}

fn encode_body<B: Serialize + ?Sized>(endpoint: &str, data: &B) -> Result<Vec<u8>, ApiError> {
    serde_json::to_vec(data).map_err(|e| {
        ApiError::transport(format!("Failed to encode request body for {endpoint}: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::mock::{json_response, text_response, MockTransport};
    use super::*;
    use crate::error::ApiErrorKind;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: u32,
    }

    fn client(transport: MockTransport) -> ApiClient<MockTransport> {
        let config = ClientConfig::builder()
            .base_url("http://mock/")
            .header("X-Trace", "on")
            .build()
            .unwrap();
        ApiClient::with_transport(&config, transport)
    }

    #[test]
    fn debug_lists_config_and_elides_transport() {
        let out = format!("{:?}", client(MockTransport::new()));
        assert!(out.starts_with("ApiClient {"));
        assert!(out.contains("base_url: \"http://mock"));
        assert!(out.contains("X-Trace"));
        assert!(out.ends_with(", .. }"));
        assert!(!out.contains("transport"));
    }

    #[tokio::test]
    async fn decodes_json_success() {
        let t = MockTransport::new().route(HttpMethod::Get, "/items/1", |_| {
            Ok(json_response(200, json!({"id": 1})))
        });
        let c = client(t);
        let r: ApiResponse<Item> = c.get("/items/1", &[]).await.unwrap();
        assert_eq!(r, ApiResponse::Content(Item { id: 1 }));
    }

    #[tokio::test]
    async fn error_message_from_body() {
        let t = MockTransport::new().route(HttpMethod::Post, "/api/extract-page", |_| {
            Ok(json_response(500, json!({"message": "page out of range"})))
        });
        let c = client(t);
        let err = c
            .post::<serde_json::Value, _>("/api/extract-page", &json!({"page_number": 99}))
            .await
            .unwrap_err();
        assert_eq!(err.message, "page out of range");
        assert_eq!(err.status, 500);
        assert_eq!(err.kind(), ApiErrorKind::Http);
        assert_eq!(err.payload, Some(json!({"message": "page out of range"})));
    }

    #[tokio::test]
    async fn unparsable_json_error_uses_status_text() {
        let t = MockTransport::new().route(HttpMethod::Get, "/broken", |_| {
            let mut r = json_response(502, json!(null));
            r.body = b"{not json".to_vec();
            Ok(r)
        });
        let c = client(t);
        let err = c.get::<serde_json::Value>("/broken", &[]).await.unwrap_err();
        assert_eq!(err.message, "Bad Gateway");
        assert_eq!(err.status, 502);
        assert!(err.payload.is_none());
    }

    #[tokio::test]
    async fn non_json_error_ignores_body() {
        let t = MockTransport::new().route(HttpMethod::Get, "/plain", |_| {
            Ok(text_response(503, "{\"message\":\"hidden\"}"))
        });
        let c = client(t);
        let err = c.get::<serde_json::Value>("/plain", &[]).await.unwrap_err();
        assert_eq!(err.message, "Service Unavailable");
        assert!(err.payload.is_none());
    }

    #[tokio::test]
    async fn transport_failure_has_status_zero() {
        let t = MockTransport::new();
        let c = client(t);
        let err = c.get::<serde_json::Value>("/nowhere", &[]).await.unwrap_err();
        assert_eq!(err.status, 0);
        assert!(err.is_transport());
        assert!(err.message.contains("/nowhere"), "got: {}", err.message);
    }

    #[tokio::test]
    async fn non_json_success_is_no_content() {
        let t = MockTransport::new()
            .route(HttpMethod::Delete, "/items/1", |_| {
                Ok(RawResponse {
                    status: 204,
                    status_text: "No Content".into(),
                    content_type: None,
                    body: Vec::new(),
                })
            })
            .route(HttpMethod::Get, "/text", |_| Ok(text_response(200, "hello")))
            .route(HttpMethod::Get, "/empty-json", |_| {
                let mut r = json_response(200, json!(null));
                r.body.clear();
                Ok(r)
            });
        let c = client(t);
        let r: ApiResponse<Item> = c.delete("/items/1").await.unwrap();
        assert_eq!(r, ApiResponse::NoContent { status: 204 });
        let r: ApiResponse<Item> = c.get("/text", &[]).await.unwrap();
        assert!(r.is_no_content());
        let r: ApiResponse<Item> = c.get("/empty-json", &[]).await.unwrap();
        assert!(r.is_no_content());
    }

    #[tokio::test]
    async fn wrong_shape_is_decode_error() {
        let t = MockTransport::new().route(HttpMethod::Get, "/items/1", |_| {
            Ok(json_response(200, json!({"name": "x"})))
        });
        let c = client(t);
        let err = c.get::<Item>("/items/1", &[]).await.unwrap_err();
        assert_eq!(err.kind(), ApiErrorKind::Decode);
        assert_eq!(err.status, 200);
    }

    #[tokio::test]
    async fn post_sends_json_and_headers() {
        let t = MockTransport::new().route(HttpMethod::Post, "/items", |req| {
            let body: serde_json::Value =
                serde_json::from_slice(req.body.as_deref().unwrap_or_default()).unwrap();
            assert_eq!(body, json!({"id": 9}));
            Ok(json_response(201, json!({"id": 9})))
        });
        let c = client(t);
        let r: ApiResponse<Item> = c.post("/items", &json!({"id": 9})).await.unwrap();
        assert_eq!(r.into_option(), Some(Item { id: 9 }));

        let sent = c.transport().requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].url, "http://mock/items");
        let names: Vec<&str> = sent[0].headers.iter().map(|(k, _)| k.as_str()).collect();
        assert!(names.contains(&"X-Trace"));
        assert!(names.contains(&"Content-Type"));
        assert!(names.contains(&"Accept"));
    }

    #[tokio::test]
    async fn get_builds_query_string() {
        let t = MockTransport::new().route(HttpMethod::Get, "/search", |_| {
            Ok(json_response(200, json!({"id": 3})))
        });
        let c = client(t);
        let _: ApiResponse<Item> = c
            .get(
                "/search",
                &[
                    ("q", QueryValue::from("a b&c")),
                    ("page", QueryValue::from(2u32)),
                    ("exact", QueryValue::from(true)),
                ],
            )
            .await
            .unwrap();
        let sent = c.transport().requests();
        assert_eq!(
            sent[0].url,
            "http://mock/search?q=a%20b%26c&page=2&exact=true"
        );
    }

    #[test]
    fn per_request_headers_override_defaults() {
        let config = ClientConfig::builder()
            .base_url("http://mock")
            .header("accept", "text/html")
            .build()
            .unwrap();
        let c = ApiClient::with_transport(&config, MockTransport::new());
        let merged = c.merge_headers(&[("Accept", "application/json")]);
        assert_eq!(merged, vec![("Accept".to_string(), "application/json".to_string())]);
    }

    #[test]
    fn require_turns_no_content_into_decode_error() {
        let r: ApiResponse<u32> = ApiResponse::NoContent { status: 204 };
        let err = r.require("/api/total-pages").unwrap_err();
        assert_eq!(err.kind(), ApiErrorKind::Decode);
        assert_eq!(err.status, 204);
    }
}
