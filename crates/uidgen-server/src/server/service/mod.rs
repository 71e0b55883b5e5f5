//! HTTP routes and the state they share.
//!
//! - `GET /?numberOfIds=N` - returns `{"ids": [...]}` with `N` fresh IDs.
//! - `GET /health` - `200` while serving, `503` once shutdown has begun.

pub mod handler;
