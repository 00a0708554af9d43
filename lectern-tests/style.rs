//! Style Enforcement Tests
//!
//! Validates conventions that clippy does not catch on its own.
//!
//! # Test Organization
//!
//! - `production_code` - No `#[allow(dead_code)]`, `unwrap()` or `expect()`
//!   outside test code
//!
//! These tests scan the workspace crates and fail if violations are found.

#[path = "style/production_code.rs"]
mod production_code;
