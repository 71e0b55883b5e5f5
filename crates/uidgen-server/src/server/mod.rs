//! Server-side components of the `uidgen` HTTP service.
//!
//! ## Submodules
//!
//! - [`config`] - CLI/environment configuration and its validation.
//! - [`error`] - API errors and their HTTP status mapping.
//! - [`service`] - Request handlers and the shared issuer pool.
//! - [`telemetry`] - Structured logging initialization.

pub mod config;
pub mod error;
pub mod service;
pub mod telemetry;
