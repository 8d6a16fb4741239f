//! Travel-notes CLI client
//!
//! A terminal client for a travel-notes social platform. All business logic
//! lives in the backend REST API; this crate wraps it with an authenticated
//! HTTP client (automatic bearer attachment and single-flight token
//! refresh), session storage, and a command-line surface.

pub mod api;
pub mod auth;
pub mod config;
pub mod media;
pub mod models;
