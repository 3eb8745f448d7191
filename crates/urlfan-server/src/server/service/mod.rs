//! HTTP service implementation.
//!
//! This module turns incoming batch requests into fan-out calls against the
//! engine in `urlfan-core` and maps every outcome onto an HTTP response.
//!
//! ## Structure
//!
//! - [`handler`] - Request entry point (`FetchService`) and the axum router.
//! - [`error`] - Response mapping for every failure the service reports.

pub mod error;
pub mod handler;
