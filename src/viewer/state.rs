//! Viewer state and the read-only snapshot derived from it.

use super::blob::RenderHandle;
use crate::model::Check;
use serde::Serialize;

/// The page currently on screen.
#[derive(Debug)]
pub struct LoadedPage {
    /// Requested (document) page number.
    pub page: u32,
    /// Page of the payload to render, see [`crate::config::PageFraming`].
    pub render_index: u32,
    pub handle: RenderHandle,
}

/// What the page pane shows.
#[derive(Debug, Default)]
pub enum PageDisplay {
    /// Nothing loaded: before the first page or after a failed fetch.
    #[default]
    Empty,
    Ready(LoadedPage),
    /// The page arrived but its payload was unusable.
    Unavailable { page: u32, reason: String },
}

/// Mutable state of one viewing session. Owned by the controller; its
/// handle is released whenever `display` is replaced.
#[derive(Debug)]
pub struct ViewerState {
    pub current_page: u32,
    /// Backend-reported count. The only one used for bounds.
    pub total_pages: Option<u32>,
    /// Count reported by the render engine for the displayed payload. Advisory.
    pub engine_pages: Option<usize>,
    pub display: PageDisplay,
    pub is_loading: bool,
    pub selected_tab: usize,
}

impl ViewerState {
    pub fn new(initial_page: u32) -> Self {
        Self {
            current_page: initial_page.max(1),
            total_pages: None,
            engine_pages: None,
            display: PageDisplay::Empty,
            is_loading: false,
            selected_tab: 0,
        }
    }

    pub fn can_go_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn can_go_next(&self) -> bool {
        self.total_pages
            .map(|total| self.current_page < total)
            .unwrap_or(true)
    }

    /// `"Page 3 of 12"`, or `"Page 3 of ?"` while the total is unknown.
    pub fn page_label(&self) -> String {
        match self.total_pages {
            Some(total) => format!("Page {} of {}", self.current_page, total),
            None => format!("Page {} of ?", self.current_page),
        }
    }
}

/// Where the controller is in its page cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "page", rename_all = "snake_case")]
pub enum ViewerPhase {
    Uninitialized,
    LoadingTotalPages,
    Ready(u32),
    LoadingPage(u32),
    DisplayingPage(u32),
    PageUnavailable(u32),
}

/// Serializable view of [`PageDisplay`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageView {
    Empty,
    Ready {
        page: u32,
        render_index: u32,
        uri: String,
        bytes: usize,
    },
    Unavailable {
        page: u32,
        reason: String,
    },
}

impl From<&PageDisplay> for PageView {
    fn from(display: &PageDisplay) -> Self {
        match display {
            PageDisplay::Empty => PageView::Empty,
            PageDisplay::Ready(loaded) => PageView::Ready {
                page: loaded.page,
                render_index: loaded.render_index,
                uri: loaded.handle.uri().to_string(),
                bytes: loaded.handle.len(),
            },
            PageDisplay::Unavailable { page, reason } => PageView::Unavailable {
                page: *page,
                reason: reason.clone(),
            },
        }
    }
}

/// Everything a renderer needs, detached from the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewerSnapshot {
    pub document_id: Option<String>,
    pub phase: ViewerPhase,
    pub current_page: u32,
    pub total_pages: Option<u32>,
    pub engine_pages: Option<usize>,
    pub is_loading: bool,
    pub page: PageView,
    pub page_label: String,
    pub can_go_previous: bool,
    pub can_go_next: bool,
    pub categories: Vec<String>,
    pub selected_tab: usize,
    pub visible_checks: Vec<Check>,
}
