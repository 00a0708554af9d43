//! Lectern Web - HTTP surface for course video streaming

#![warn(missing_docs)]
#![warn(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
#![warn(clippy::too_many_lines)]
//!
//! Serves uploaded and library videos with byte-range support, subtitle
//! sidecars, Drive redirects and a small JSON API.

pub mod error;
pub mod handlers;
pub mod server;

// Re-export main types
pub use error::WebError;
pub use server::{AppState, build_router, run_server};
