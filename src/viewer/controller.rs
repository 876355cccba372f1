//! The viewer state machine.
//!
//! ```text
//! Uninitialized ──mount──▶ LoadingTotalPages ──▶ Ready(1) ──▶ LoadingPage(n)
//!                                                  ▲              │
//!                                                  │              ▼
//!                           LoadingPage(m) ◀── DisplayingPage(n) / PageUnavailable(n)
//! ```
//!
//! Checks load once per mount, alongside the page cycle.
//!
//! Every network or engine call runs as a spawned task that sends exactly
//! one [`ViewerEvent`] back. Events are applied one at a time through
//! `&mut self` ([`ViewerController::process_next`] / [`ViewerController::settle`]),
//! so the state is only ever touched from the owner's context.
//!
//! Page requests carry a generation number. Only the result of the latest
//! request is applied; anything older is dropped on arrival.

use super::blob::{BlobStore, RenderHandle, PDF_MIME};
use super::engine::RenderEngine;
use super::payload::decode_page_payload;
use super::state::{LoadedPage, PageDisplay, PageView, ViewerPhase, ViewerSnapshot, ViewerState};
use crate::backend::{BackendApi, ExtractedPage};
use crate::client::Transport;
use crate::config::{PageFraming, ViewerConfig};
use crate::error::{ApiError, RenderError, ViewerError};
use crate::model::{Check, ChecksBundle, DocumentCatalog};
use crate::progress::{NoopObserver, Observer};
use image::DynamicImage;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Results flowing back from background tasks.
#[derive(Debug)]
enum ViewerEvent {
    EngineReady(Result<(), RenderError>),
    TotalPages(Result<u32, ApiError>),
    Checks(Result<ChecksBundle, ApiError>),
    Page {
        generation: u64,
        page: u32,
        result: Result<ExtractedPage, ApiError>,
    },
    DocumentLoaded {
        generation: u64,
        result: Result<usize, RenderError>,
    },
}

/// One viewing session at a time. Mounting a new document discards the
/// previous session, its pending results and its page resource.
///
/// Must be driven from inside a tokio runtime.
pub struct ViewerController<T: Transport + 'static> {
    api: Arc<BackendApi<T>>,
    engine: Arc<dyn RenderEngine>,
    blobs: BlobStore,
    config: ViewerConfig,
    observer: Observer,
    document_id: Option<String>,
    state: ViewerState,
    checks: ChecksBundle,
    engine_ready: bool,
    engine_failed: bool,
    total_pending: bool,
    generation: u64,
    in_flight: usize,
    events_tx: mpsc::UnboundedSender<ViewerEvent>,
    events_rx: mpsc::UnboundedReceiver<ViewerEvent>,
}

impl<T: Transport + 'static> ViewerController<T> {
    pub fn new(api: Arc<BackendApi<T>>, engine: Arc<dyn RenderEngine>, config: ViewerConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            api,
            engine,
            blobs: BlobStore::new(),
            state: ViewerState::new(config.initial_page),
            config,
            observer: Arc::new(NoopObserver),
            document_id: None,
            checks: ChecksBundle::new(),
            engine_ready: false,
            engine_failed: false,
            total_pending: false,
            generation: 0,
            in_flight: 0,
            events_tx,
            events_rx,
        }
    }

    pub fn with_observer(mut self, observer: Observer) -> Self {
        self.observer = observer;
        self
    }

    /// Register page resources in `store` instead of a private one.
    pub fn with_blob_store(mut self, store: BlobStore) -> Self {
        self.blobs = store;
        self
    }

    // ── Lifecycle ────────────────────────────────────────────────────────

    /// Open `document_id` and start the three independent loads: engine
    /// start-up, total page count and checks. Any previous session is
    /// discarded first.
    ///
    /// Checks are requested under the catalog entry's backend key; an id
    /// missing from the catalog is logged and leaves the checks empty.
    pub fn mount(&mut self, document_id: &str, catalog: &DocumentCatalog) {
        self.reset();
        info!("Mounting viewer for document {}", document_id);
        self.document_id = Some(document_id.to_string());
        self.observer.on_mount(document_id);

        let engine = Arc::clone(&self.engine);
        self.spawn(async move { ViewerEvent::EngineReady(engine.initialize().await) });

        self.total_pending = true;
        let api = Arc::clone(&self.api);
        self.spawn(async move { ViewerEvent::TotalPages(api.total_pages().await) });

        match catalog.find(document_id) {
            Some(doc) => {
                let key = doc.backend_key().to_string();
                let api = Arc::clone(&self.api);
                self.spawn(async move { ViewerEvent::Checks(api.checks(&key).await) });
            }
            None => error!("Error fetching checks: document '{}' not found", document_id),
        }
    }

    /// Close the session: release the page resource and ignore every
    /// result still in flight.
    pub fn unmount(&mut self) {
        if let Some(id) = &self.document_id {
            info!("Unmounting viewer for document {}", id);
        }
        self.reset();
    }

    fn reset(&mut self) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        self.events_tx = events_tx;
        self.events_rx = events_rx;
        self.in_flight = 0;
        self.generation += 1;

        self.release_display();
        self.state = ViewerState::new(self.config.initial_page);
        self.checks = ChecksBundle::new();
        self.document_id = None;
        self.engine_ready = false;
        self.engine_failed = false;
        self.total_pending = false;
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = ViewerEvent> + Send + 'static,
    {
        let tx = self.events_tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            // After unmount the receiver is gone and the result is dropped.
            let _ = tx.send(task.await);
        });
    }

    // ── Event loop ───────────────────────────────────────────────────────

    /// Wait for the next background result and apply it.
    ///
    /// Returns `false` when nothing is in flight.
    pub async fn process_next(&mut self) -> bool {
        if self.in_flight == 0 {
            return false;
        }
        match self.events_rx.recv().await {
            Some(event) => {
                self.in_flight -= 1;
                self.apply(event);
                true
            }
            None => false,
        }
    }

    /// Apply results until no task is left in flight, including the ones
    /// spawned while applying.
    pub async fn settle(&mut self) {
        while self.process_next().await {}
    }

    /// Apply whatever has already arrived without waiting. Returns how
    /// many results were applied.
    pub fn process_ready(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Background tasks not yet applied.
    pub fn pending(&self) -> usize {
        self.in_flight
    }

    fn apply(&mut self, event: ViewerEvent) {
        match event {
            ViewerEvent::EngineReady(Ok(())) => {
                if self.engine_ready {
                    return;
                }
                info!("Rendering engine ready");
                self.engine_ready = true;
                self.request_current_page();
            }
            // No retry: the page stays in the loading display until the
            // next mount.
            ViewerEvent::EngineReady(Err(e)) => {
                error!("Failed to initialise rendering engine: {}", e);
                self.engine_failed = true;
                self.state.is_loading = true;
            }
            ViewerEvent::TotalPages(result) => self.apply_total_pages(result),
            ViewerEvent::Checks(result) => self.apply_checks(result),
            ViewerEvent::Page {
                generation,
                page,
                result,
            } => self.apply_page(generation, page, result),
            ViewerEvent::DocumentLoaded { generation, result } => {
                self.apply_document_loaded(generation, result)
            }
        }
    }

    fn apply_total_pages(&mut self, result: Result<u32, ApiError>) {
        self.total_pending = false;
        match result {
            Ok(0) => warn!("Backend reported 0 pages; page count stays unknown"),
            Ok(total) => {
                info!("Total pages: {}", total);
                self.state.total_pages = Some(total);
                self.observer.on_total_pages(total);
                if self.state.current_page > total {
                    warn!(
                        "Current page {} is past the reported total of {}; moving to page {}",
                        self.state.current_page, total, total
                    );
                    self.state.current_page = total;
                    if self.engine_ready {
                        self.request_current_page();
                    }
                }
            }
            Err(e) => error!("Error fetching total pages: {} (status {})", e, e.status),
        }
    }

    fn apply_checks(&mut self, result: Result<ChecksBundle, ApiError>) {
        match result {
            Ok(bundle) => {
                if self.state.selected_tab >= bundle.len() {
                    self.state.selected_tab = 0;
                }
                self.observer
                    .on_checks_loaded(bundle.len(), bundle.total_checks());
                self.checks = bundle;
            }
            Err(e) => {
                error!("Error fetching checks: {} (status {})", e, e.status);
                self.checks = ChecksBundle::new();
                self.state.selected_tab = 0;
            }
        }
    }

    fn apply_page(&mut self, generation: u64, page: u32, result: Result<ExtractedPage, ApiError>) {
        if generation != self.generation {
            debug!(
                "Discarding stale result for page {} (request {}, current {})",
                page, generation, self.generation
            );
            return;
        }
        self.state.is_loading = false;

        let extracted = match result {
            Ok(extracted) => extracted,
            Err(e) => {
                error!("Error fetching page {}: {} (status {})", page, e, e.status);
                self.release_display();
                self.observer.on_page_failed(page, &e);
                return;
            }
        };

        if let Some(echo) = extracted.page_number {
            if echo != page {
                warn!("Backend answered page {} to a request for page {}", echo, page);
            }
        }

        match decode_page_payload(&extracted.base64_content) {
            Err(e) => {
                warn!("Page {} unavailable: {}", page, e);
                self.release_display();
                let reason = e.to_string();
                self.observer.on_page_unavailable(page, &reason);
                self.state.display = PageDisplay::Unavailable { page, reason };
            }
            Ok(bytes) => {
                let handle = self.blobs.create(bytes, PDF_MIME);
                info!("Created blob URI for page {}: {}", page, handle.uri());

                let pdf = Arc::clone(handle.bytes());
                let uri = handle.uri().to_string();
                let len = handle.len();
                let render_index = self.config.page_framing.render_index(page);

                let previous = std::mem::replace(
                    &mut self.state.display,
                    PageDisplay::Ready(LoadedPage {
                        page,
                        render_index,
                        handle,
                    }),
                );
                if let PageDisplay::Ready(old) = previous {
                    old.handle.release();
                }
                self.state.engine_pages = None;
                self.observer.on_page_ready(page, &uri, len);

                let engine = Arc::clone(&self.engine);
                self.spawn(async move {
                    ViewerEvent::DocumentLoaded {
                        generation,
                        result: engine.document_pages(pdf).await,
                    }
                });
            }
        }
    }

    /// The engine's page count never feeds bounds checks; it is kept for
    /// display and compared against the backend's for diagnostics.
    fn apply_document_loaded(&mut self, generation: u64, result: Result<usize, RenderError>) {
        if generation != self.generation {
            return;
        }
        match result {
            Ok(pages) => {
                info!("Document loaded successfully. Pages in payload: {}", pages);
                self.state.engine_pages = Some(pages);

                if let PageDisplay::Ready(loaded) = &self.state.display {
                    if loaded.render_index as usize > pages {
                        warn!(
                            "Payload for page {} has {} pages; nothing at index {}",
                            loaded.page, pages, loaded.render_index
                        );
                    }
                }
                if self.config.page_framing == PageFraming::FullDocument {
                    if let Some(total) = self.state.total_pages {
                        if pages != total as usize {
                            warn!(
                                "Rendering engine reports {} pages, backend reports {}; keeping the backend count",
                                pages, total
                            );
                        }
                    }
                }
            }
            Err(RenderError::Unsupported(what)) => debug!("Rendering engine skipped {}", what),
            Err(e) => error!("PDF document load error: {}", e),
        }
    }

    fn release_display(&mut self) {
        if let PageDisplay::Ready(loaded) = std::mem::take(&mut self.state.display) {
            loaded.handle.release();
        }
    }

    fn request_current_page(&mut self) {
        self.generation += 1;
        let generation = self.generation;
        let page = self.state.current_page;

        self.state.is_loading = true;
        self.observer.on_page_loading(page, self.state.total_pages);

        let api = Arc::clone(&self.api);
        self.spawn(async move {
            let result = api.extract_page(page).await;
            ViewerEvent::Page {
                generation,
                page,
                result,
            }
        });
    }

    // ── Navigation ───────────────────────────────────────────────────────

    /// Go to `page`.
    ///
    /// Pages below 1 are refused, and so are pages past the backend's total
    /// once it is known; before that any page is accepted, and a page past
    /// the total is pulled back to the last page when it arrives. Going to the
    /// current page does nothing. While the engine is still starting the
    /// page is recorded and fetched as soon as it is ready.
    pub fn navigate(&mut self, page: i64) -> Result<(), ViewerError> {
        if page < 1 {
            debug!("Ignoring navigation to invalid page {}", page);
            return Err(ViewerError::InvalidPage { page });
        }
        if let Some(total) = self.state.total_pages {
            if page > i64::from(total) {
                debug!("Ignoring navigation to page {} of {}", page, total);
                return Err(ViewerError::PageOutOfRange {
                    page: u32::try_from(page).unwrap_or(u32::MAX),
                    total,
                });
            }
        }
        let page = u32::try_from(page).map_err(|_| ViewerError::InvalidPage { page })?;

        if page == self.state.current_page {
            return Ok(());
        }

        info!("Changing to page: {}", page);
        self.state.current_page = page;
        if self.engine_ready {
            self.request_current_page();
        } else {
            debug!("Page {} deferred until the rendering engine is ready", page);
        }
        Ok(())
    }

    pub fn next_page(&mut self) -> Result<(), ViewerError> {
        self.navigate(i64::from(self.state.current_page) + 1)
    }

    pub fn previous_page(&mut self) -> Result<(), ViewerError> {
        self.navigate(i64::from(self.state.current_page) - 1)
    }

    /// Show the checks of category `index`. No network activity.
    pub fn select_tab(&mut self, index: usize) -> Result<(), ViewerError> {
        if index >= self.checks.len() {
            return Err(ViewerError::TabOutOfRange {
                index,
                available: self.checks.len(),
            });
        }
        self.state.selected_tab = index;
        Ok(())
    }

    /// Jump to the page of check `index` in the selected tab.
    pub fn select_check(&mut self, index: usize) -> Result<(), ViewerError> {
        let checks = self.visible_checks();
        let page = checks
            .get(index)
            .map(|c| c.page_number)
            .ok_or(ViewerError::CheckOutOfRange {
                index,
                available: checks.len(),
            })?;
        self.navigate(i64::from(page))
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn checks(&self) -> &ChecksBundle {
        &self.checks
    }

    pub fn is_engine_ready(&self) -> bool {
        self.engine_ready
    }

    /// The rendering engine failed to start for this mount.
    pub fn engine_failed(&self) -> bool {
        self.engine_failed
    }

    pub fn blob_store(&self) -> &BlobStore {
        &self.blobs
    }

    /// Checks of the selected tab.
    pub fn visible_checks(&self) -> &[Check] {
        self.checks
            .category(self.state.selected_tab)
            .map(|(_, checks)| checks)
            .unwrap_or(&[])
    }

    /// Resource of the displayed page.
    pub fn current_handle(&self) -> Option<&RenderHandle> {
        match &self.state.display {
            PageDisplay::Ready(loaded) => Some(&loaded.handle),
            _ => None,
        }
    }

    pub fn phase(&self) -> ViewerPhase {
        if self.document_id.is_none() {
            return ViewerPhase::Uninitialized;
        }
        let page = self.state.current_page;
        if self.state.is_loading {
            return ViewerPhase::LoadingPage(page);
        }
        match &self.state.display {
            PageDisplay::Ready(loaded) => ViewerPhase::DisplayingPage(loaded.page),
            PageDisplay::Unavailable { page, .. } => ViewerPhase::PageUnavailable(*page),
            PageDisplay::Empty if self.total_pending => ViewerPhase::LoadingTotalPages,
            PageDisplay::Empty => ViewerPhase::Ready(page),
        }
    }

    pub fn snapshot(&self) -> ViewerSnapshot {
        ViewerSnapshot {
            document_id: self.document_id.clone(),
            phase: self.phase(),
            current_page: self.state.current_page,
            total_pages: self.state.total_pages,
            engine_pages: self.state.engine_pages,
            is_loading: self.state.is_loading,
            page: PageView::from(&self.state.display),
            page_label: self.state.page_label(),
            can_go_previous: self.state.can_go_previous(),
            can_go_next: self.state.can_go_next(),
            categories: self.checks.category_names().map(str::to_owned).collect(),
            selected_tab: self.state.selected_tab,
            visible_checks: self.visible_checks().to_vec(),
        }
    }

    /// Rasterise the displayed page at the configured width.
    pub async fn render_current(&self) -> Result<DynamicImage, RenderError> {
        let (pdf, index) = match &self.state.display {
            PageDisplay::Ready(loaded) => (
                Arc::clone(loaded.handle.bytes()),
                loaded.render_index as usize,
            ),
            _ => return Err(RenderError::LoadFailed("no page is displayed".into())),
        };
        self.engine
            .render_page(pdf, index, self.config.render_width)
            .await
    }
}
