//! In-memory [`Transport`] for unit tests.

use super::transport::{HttpMethod, HttpRequest, RawResponse, Transport, TransportError};
use futures::future::BoxFuture;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

type Handler = Arc<dyn Fn(&HttpRequest) -> Result<RawResponse, TransportError> + Send + Sync>;
type Matcher = Arc<dyn Fn(&HttpRequest) -> bool + Send + Sync>;

/// Routes `(method, path)` to a handler. Unrouted requests fail like a
/// refused connection.
#[derive(Clone, Default)]
pub(crate) struct MockTransport {
    routes: Arc<Mutex<Vec<(HttpMethod, String, Handler)>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
    holds: Arc<Mutex<Vec<(String, Matcher, Arc<Notify>)>>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn route<F>(self, method: HttpMethod, path: &str, handler: F) -> Self
    where
        F: Fn(&HttpRequest) -> Result<RawResponse, TransportError> + Send + Sync + 'static,
    {
        self.routes
            .lock()
            .unwrap()
            .push((method, path.to_string(), Arc::new(handler)));
        self
    }

    /// Hold matching requests to `path` until `gate` is notified.
    pub(crate) fn hold<F>(self, path: &str, when: F, gate: Arc<Notify>) -> Self
    where
        F: Fn(&HttpRequest) -> bool + Send + Sync + 'static,
    {
        self.holds
            .lock()
            .unwrap()
            .push((path.to_string(), Arc::new(when), gate));
        self
    }

    /// Every request seen so far, in order.
    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| path_of(&r.url) == path)
            .count()
    }
}

fn path_of(url: &str) -> &str {
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let path = without_scheme
        .find('/')
        .map(|i| &without_scheme[i..])
        .unwrap_or("/");
    path.split('?').next().unwrap_or(path)
}

impl Transport for MockTransport {
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<RawResponse, TransportError>> {
        Box::pin(async move {
            self.requests.lock().unwrap().push(request.clone());
            let handler = self
                .routes
                .lock()
                .unwrap()
                .iter()
                .find(|(m, p, _)| *m == request.method && p == path_of(&request.url))
                .map(|(_, _, h)| Arc::clone(h));
            let gate = self
                .holds
                .lock()
                .unwrap()
                .iter()
                .find(|(p, when, _)| p == path_of(&request.url) && when(&request))
                .map(|(_, _, g)| Arc::clone(g));
            if let Some(gate) = gate {
                gate.notified().await;
            }
            // Let other tasks run so concurrent requests interleave.
            tokio::task::yield_now().await;
            match handler {
                Some(h) => h(&request),
                None => Err(TransportError(format!(
                    "error sending request for url ({}): connection refused",
                    request.url
                ))),
            }
        })
    }
}

fn status_text(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or_default()
        .to_string()
}

pub(crate) fn json_response(status: u16, value: serde_json::Value) -> RawResponse {
    RawResponse {
        status,
        status_text: status_text(status),
        content_type: Some("application/json".into()),
        body: serde_json::to_vec(&value).unwrap(),
    }
}

pub(crate) fn text_response(status: u16, text: &str) -> RawResponse {
    RawResponse {
        status,
        status_text: status_text(status),
        content_type: Some("text/plain; charset=utf-8".into()),
        body: text.as_bytes().to_vec(),
    }
}

/// JSON response with the body sent verbatim, for tests that depend on key order.
pub(crate) fn raw_json_response(status: u16, body: &str) -> RawResponse {
    RawResponse {
        content_type: Some("application/json".into()),
        ..text_response(status, body)
    }
}
