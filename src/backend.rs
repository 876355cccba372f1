//! Typed access to the three document endpoints of the backend.

use crate::client::{ApiClient, HttpTransport, Transport};
use crate::error::ApiError;
use crate::model::ChecksBundle;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const CHECKS_ENDPOINT: &str = "/api/checks";
pub const EXTRACT_PAGE_ENDPOINT: &str = "/api/extract-page";
pub const TOTAL_PAGES_ENDPOINT: &str = "/api/total-pages";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecksRequest {
    pub document_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRequest {
    pub page_number: u32,
}

/// Body of `/api/extract-page`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedPage {
    /// Echo of the requested page, when the backend sends it.
    #[serde(default)]
    pub page_number: Option<u32>,
    /// Base64 PDF bytes. Missing and empty are treated alike downstream.
    #[serde(default)]
    pub base64_content: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TotalPages {
    pub total_pages: u32,
}

/// Backend facade over an [`ApiClient`].
#[derive(Debug)]
pub struct BackendApi<T = HttpTransport> {
    client: ApiClient<T>,
}

impl<T: Transport> BackendApi<T> {
    pub fn new(client: ApiClient<T>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient<T> {
        &self.client
    }

    /// `POST /api/checks` for the document known to the backend as `document_id`.
    pub async fn checks(&self, document_id: &str) -> Result<ChecksBundle, ApiError> {
        let body = ChecksRequest {
            document_id: document_id.to_string(),
        };
        let bundle: ChecksBundle = self
            .client
            .post(CHECKS_ENDPOINT, &body)
            .await?
            .require(CHECKS_ENDPOINT)?;
        info!(
            "Loaded {} checks in {} categories for '{}'",
            bundle.total_checks(),
            bundle.len(),
            document_id
        );
        Ok(bundle)
    }

    /// `POST /api/extract-page`.
    pub async fn extract_page(&self, page_number: u32) -> Result<ExtractedPage, ApiError> {
        debug!("Fetching page: {}", page_number);
        self.client
            .post(EXTRACT_PAGE_ENDPOINT, &PageRequest { page_number })
            .await?
            .require(EXTRACT_PAGE_ENDPOINT)
    }

    /// `GET /api/total-pages`.
    pub async fn total_pages(&self) -> Result<u32, ApiError> {
        let total: TotalPages = self
            .client
            .get(TOTAL_PAGES_ENDPOINT, &[])
            .await?
            .require(TOTAL_PAGES_ENDPOINT)?;
        debug!("Total pages response: {}", total.total_pages);
        Ok(total.total_pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::{json_response, MockTransport};
    use crate::client::HttpMethod;
    use crate::config::ClientConfig;
    use serde_json::json;

    fn api(transport: MockTransport) -> BackendApi<MockTransport> {
        let config = ClientConfig::builder().base_url("http://mock").build().unwrap();
        BackendApi::new(ApiClient::with_transport(&config, transport))
    }

    #[tokio::test]
    async fn checks_posts_document_id() {
        let t = MockTransport::new().route(HttpMethod::Post, CHECKS_ENDPOINT, |req| {
            let body: serde_json::Value =
                serde_json::from_slice(req.body.as_deref().unwrap_or_default()).unwrap();
            assert_eq!(body, json!({"document_id": "XYZ"}));
            Ok(json_response(
                200,
                json!({"Formatting": [{"text":"Header present","status":"pass","details":"ok","page_number":2}]}),
            ))
        });
        let bundle = api(t).checks("XYZ").await.unwrap();
        assert_eq!(bundle.get("Formatting").unwrap()[0].page_number, 2);
    }

    #[tokio::test]
    async fn extract_page_tolerates_missing_content() {
        let t = MockTransport::new().route(HttpMethod::Post, EXTRACT_PAGE_ENDPOINT, |_| {
            Ok(json_response(200, json!({"page_number": 4})))
        });
        let page = api(t).extract_page(4).await.unwrap();
        assert_eq!(page.page_number, Some(4));
        assert!(page.base64_content.is_empty());
    }

    #[tokio::test]
    async fn total_pages_reads_count() {
        let t = MockTransport::new().route(HttpMethod::Get, TOTAL_PAGES_ENDPOINT, |_| {
            Ok(json_response(200, json!({"total_pages": 5})))
        });
        assert_eq!(api(t).total_pages().await.unwrap(), 5);
    }
}
