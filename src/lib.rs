//! # pagecheck
//!
//! Core of a document viewer for PDFs that a backend has analysed with
//! automated checks.
//!
//! The backend extracts one page at a time as a base64 PDF payload and
//! reports pass/fail checks grouped by category, each tied to a page. This
//! crate fetches both, turns page payloads into revocable render resources
//! and keeps the navigation state consistent while results arrive out of
//! order.
//!
//! ## Layout
//!
//! ```text
//! client    generic JSON-over-HTTP request function, one ApiError type
//!  └ backend  typed calls: total pages, extract page, checks
//!     └ viewer  state machine: mount, navigate, tabs, check → page
//!          ├ payload  base64 → PDF bytes
//!          ├ blob     blob: URIs released when a page is replaced
//!          └ engine   pdfium rendering engine (or headless)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pagecheck::{ApiClient, BackendApi, ClientConfig, DocumentCatalog, ViewerConfig};
//! use pagecheck::viewer::{HeadlessEngine, ViewerController};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ApiClient::from_config(&ClientConfig::from_env()?)?;
//!     let api = Arc::new(BackendApi::new(client));
//!     let mut viewer = ViewerController::new(api, Arc::new(HeadlessEngine), ViewerConfig::default());
//!
//!     viewer.mount("1", &DocumentCatalog::builtin());
//!     viewer.settle().await;
//!     viewer.select_check(0)?;
//!     viewer.settle().await;
//!
//!     println!("{}", viewer.snapshot().page_label);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pagecheck` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod progress;
pub mod prompts;
pub mod viewer;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::BackendApi;
pub use client::{ApiClient, ApiResponse, HttpMethod, HttpTransport, QueryValue, Transport};
pub use config::{ClientConfig, ClientConfigBuilder, PageFraming, ViewerConfig, ViewerConfigBuilder};
pub use error::{ApiError, ApiErrorKind, ConfigError, DecodeError, RenderError, ViewerError};
pub use model::{Check, CheckStatus, ChecksBundle, Document, DocumentCatalog, DocumentStatus};
pub use progress::{NoopObserver, Observer, ViewerObserver};
pub use prompts::{PromptRequest, PromptType, Tone};
pub use viewer::{ViewerController, ViewerSnapshot};
