//! The rendering engine seam.
//!
//! The viewer needs three things from an engine: a one-time
//! [`RenderEngine::initialize`] that must finish before any page is
//! fetched, a page count for the bytes it was handed (advisory only, the
//! backend count stays authoritative), and rasterisation of one page.
//!
//! [`PdfiumEngine`] is the real implementation. pdfium keeps thread-local
//! state and blocks, so every call runs inside `spawn_blocking` and binds
//! the library afresh on that thread. [`HeadlessEngine`] is ready at once
//! and renders nothing, for callers that only want the bytes.

use crate::error::RenderError;
use futures::future::BoxFuture;
use image::DynamicImage;
use once_cell::sync::OnceCell;
use pdfium_render::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

pub trait RenderEngine: Send + Sync {
    /// One-time start-up. Idempotent.
    fn initialize(&self) -> BoxFuture<'_, Result<(), RenderError>>;

    /// Number of pages in `pdf`.
    fn document_pages(&self, pdf: Arc<[u8]>) -> BoxFuture<'_, Result<usize, RenderError>>;

    /// Rasterise 1-indexed `page` of `pdf` at `width` pixels.
    fn render_page(
        &self,
        pdf: Arc<[u8]>,
        page: usize,
        width: u32,
    ) -> BoxFuture<'_, Result<DynamicImage, RenderError>>;
}

/// Encode a rendered page as PNG bytes.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, RenderError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| RenderError::Internal(format!("PNG encoding failed: {e}")))?;
    debug!("Encoded page image → {} bytes PNG", buf.len());
    Ok(buf)
}

// ── pdfium ───────────────────────────────────────────────────────────────

/// pdfium-backed engine. The library is located (and downloaded on first
/// use, see `pdfium-auto`) by [`RenderEngine::initialize`]; `PDFIUM_LIB_PATH`
/// points it at an existing copy.
#[derive(Debug, Default)]
pub struct PdfiumEngine {
    library: OnceCell<PathBuf>,
}

impl PdfiumEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip discovery and use the library at `path`.
    pub fn with_library(path: impl Into<PathBuf>) -> Self {
        let library = OnceCell::new();
        let _ = library.set(path.into());
        Self { library }
    }

    fn library(&self) -> Result<PathBuf, RenderError> {
        self.library.get().cloned().ok_or(RenderError::NotReady)
    }
}

fn with_document<R>(
    library: &Path,
    pdf: &[u8],
    f: impl FnOnce(&PdfDocument<'_>) -> Result<R, RenderError>,
) -> Result<R, RenderError> {
    let pdfium = pdfium_auto::bind_pdfium_from_path(library)
        .map_err(|e| RenderError::EngineUnavailable(e.to_string()))?;
    let document = pdfium
        .load_pdf_from_byte_slice(pdf, None)
        .map_err(|e| RenderError::LoadFailed(format!("{:?}", e)))?;
    f(&document)
}

impl RenderEngine for PdfiumEngine {
    fn initialize(&self) -> BoxFuture<'_, Result<(), RenderError>> {
        Box::pin(async move {
            if let Some(path) = self.library.get() {
                debug!("pdfium already bound from {}", path.display());
                return Ok(());
            }

            let path = tokio::task::spawn_blocking(|| {
                let path = pdfium_auto::ensure_pdfium_library(None)
                    .map_err(|e| RenderError::EngineUnavailable(e.to_string()))?;
                pdfium_auto::bind_pdfium_from_path(&path)
                    .map_err(|e| RenderError::EngineUnavailable(e.to_string()))?;
                Ok::<_, RenderError>(path)
            })
            .await
            .map_err(|e| RenderError::Internal(format!("Engine start-up task panicked: {}", e)))??;

            info!("pdfium ready: {}", path.display());
            let _ = self.library.set(path);
            Ok(())
        })
    }

    fn document_pages(&self, pdf: Arc<[u8]>) -> BoxFuture<'_, Result<usize, RenderError>> {
        Box::pin(async move {
            let library = self.library()?;
            tokio::task::spawn_blocking(move || {
                with_document(&library, &pdf, |doc| Ok(doc.pages().len() as usize))
            })
            .await
            .map_err(|e| RenderError::Internal(format!("Page count task panicked: {}", e)))?
        })
    }

    fn render_page(
        &self,
        pdf: Arc<[u8]>,
        page: usize,
        width: u32,
    ) -> BoxFuture<'_, Result<DynamicImage, RenderError>> {
        Box::pin(async move {
            let library = self.library()?;
            tokio::task::spawn_blocking(move || {
                with_document(&library, &pdf, |doc| {
                    let pages = doc.pages();
                    let total = pages.len() as usize;
                    if page == 0 || page > total {
                        return Err(RenderError::PageOutOfRange { page, total });
                    }

                    let pdf_page = pages.get((page - 1) as u16).map_err(|e| {
                        RenderError::RasterisationFailed {
                            page,
                            detail: format!("{:?}", e),
                        }
                    })?;

                    let config = PdfRenderConfig::new().set_target_width(width as i32);
                    let bitmap = pdf_page.render_with_config(&config).map_err(|e| {
                        RenderError::RasterisationFailed {
                            page,
                            detail: format!("{:?}", e),
                        }
                    })?;

                    let image = bitmap.as_image();
                    debug!(
                        "Rendered page {} → {}x{} px",
                        page,
                        image.width(),
                        image.height()
                    );
                    Ok(image)
                })
            })
            .await
            .map_err(|e| RenderError::Internal(format!("Render task panicked: {}", e)))?
        })
    }
}

// ── headless ─────────────────────────────────────────────────────────────

/// Always ready; counts and renders nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessEngine;

impl RenderEngine for HeadlessEngine {
    fn initialize(&self) -> BoxFuture<'_, Result<(), RenderError>> {
        Box::pin(async { Ok(()) })
    }

    fn document_pages(&self, _pdf: Arc<[u8]>) -> BoxFuture<'_, Result<usize, RenderError>> {
        Box::pin(async { Err(RenderError::Unsupported("page counting")) })
    }

    fn render_page(
        &self,
        _pdf: Arc<[u8]>,
        _page: usize,
        _width: u32,
    ) -> BoxFuture<'_, Result<DynamicImage, RenderError>> {
        Box::pin(async { Err(RenderError::Unsupported("rasterisation")) })
    }
}
