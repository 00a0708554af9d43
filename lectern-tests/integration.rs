//! Integration tests for Lectern
//!
//! Drive the full router in-process with `tower::ServiceExt::oneshot` against
//! a temporary media tree, covering range handling, path confinement and the
//! JSON API together.

#[path = "integration/support.rs"]
mod support;

#[path = "integration/library_api.rs"]
mod library_api;
#[path = "integration/path_confinement.rs"]
mod path_confinement;
#[path = "integration/range_streaming.rs"]
mod range_streaming;
