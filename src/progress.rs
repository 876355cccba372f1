//! Observer trait for viewer events.
//!
//! Attach an [`Arc<dyn ViewerObserver>`] with
//! [`crate::viewer::ViewerController::with_observer`] to hear about page
//! loads, failures and background results as the controller applies them.
//! A terminal spinner, a log sink or a UI binding can all sit behind it.
//!
//! # Example
//!
//! ```rust
//! use pagecheck::ViewerObserver;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! #[derive(Default)]
//! struct PageCounter {
//!     ready: AtomicUsize,
//! }
//!
//! impl ViewerObserver for PageCounter {
//!     fn on_page_ready(&self, page: u32, _uri: &str, bytes: usize) {
//!         self.ready.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("page {page} ready ({bytes} bytes)");
//!     }
//! }
//! ```

use crate::error::ApiError;
use std::sync::Arc;

/// Callbacks fired by the viewer controller, always from the context that
/// applies state changes. Every method defaults to a no-op.
pub trait ViewerObserver: Send + Sync {
    /// A document was mounted and its background loads started.
    fn on_mount(&self, document_id: &str) {
        let _ = document_id;
    }

    /// A page request went out.
    ///
    /// # Arguments
    /// * `page` : 1-indexed page number
    /// * `total`: backend page count, when known
    fn on_page_loading(&self, page: u32, total: Option<u32>) {
        let _ = (page, total);
    }

    /// The requested page is now displayed.
    fn on_page_ready(&self, page: u32, uri: &str, bytes: usize) {
        let _ = (page, uri, bytes);
    }

    /// The page arrived but its payload could not be used.
    fn on_page_unavailable(&self, page: u32, reason: &str) {
        let _ = (page, reason);
    }

    /// The page request itself failed.
    fn on_page_failed(&self, page: u32, error: &ApiError) {
        let _ = (page, error);
    }

    fn on_total_pages(&self, total: u32) {
        let _ = total;
    }

    fn on_checks_loaded(&self, categories: usize, checks: usize) {
        let _ = (categories, checks);
    }
}

/// Shared observer handle.
pub type Observer = Arc<dyn ViewerObserver>;

/// An observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ViewerObserver for NoopObserver {}
