//! # Roamly Core
//!
//! Design-export business logic: pure services over async port traits.
//!
//! This crate contains:
//! - Port interfaces for the credential store, the design platform API, and
//!   the diary collaborator
//! - The OAuth authorization manager and token lifecycle controller
//! - The asset bridge, template mapper, and autofill job orchestrator
//! - The export service facade consumed by the HTTP layer
//!
//! ## Architecture
//! - Depends only on `roamly-domain`
//! - No I/O: all side effects go through the port traits implemented in
//!   `roamly-infra`

pub mod design_export;

pub use design_export::{
    AssetBridge, AuthorizationManager, DesignExportService, JobOrchestrator, TemplateMapper,
    TokenLifecycle,
};
