//! Canva Connect API integration
//!
//! HTTP adapter behind the `DesignPlatformApi` port: token exchange and
//! refresh, asset uploads, brand-template dataset introspection, autofill
//! jobs, and direct design creation.

pub mod client;
pub mod errors;
pub mod types;

pub use client::CanvaClient;
pub use errors::CanvaError;
