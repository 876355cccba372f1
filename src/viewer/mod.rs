//! Document viewer: page payloads, render resources, the rendering engine
//! seam and the controller that ties them to the backend.

pub mod blob;
pub mod controller;
pub mod engine;
pub mod payload;
pub mod state;

pub use blob::{BlobStore, RenderHandle, PDF_MIME};
pub use controller::ViewerController;
pub use engine::{encode_png, HeadlessEngine, PdfiumEngine, RenderEngine};
pub use payload::{decode_page_payload, encode_page_payload};
pub use state::{PageView, ViewerPhase, ViewerSnapshot, ViewerState};
