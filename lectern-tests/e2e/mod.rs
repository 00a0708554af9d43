//! End-to-end tests for Lectern
//!
//! These tests run the real server on an ephemeral port and talk to it over
//! TCP, exercising hyper's body handling and client disconnects.

mod streaming_workflow;
