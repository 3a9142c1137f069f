//! Design-platform export pipeline
//!
//! Turns a completed trip into a shareable design on the remote platform.
//! The pipeline has three moving parts with real protocol state:
//!
//! - an OAuth 2.0 + PKCE authorization flow ([`AuthorizationManager`])
//! - a token lifecycle with silent refresh and cascading invalidation
//!   ([`TokenLifecycle`])
//! - an asynchronous autofill-job pipeline ([`JobOrchestrator`]) fed by the
//!   [`AssetBridge`] and [`TemplateMapper`]
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │ DesignExportService  │  Facade consumed by the HTTP layer
//! └──────────┬───────────┘
//!            │
//!            ├──► AuthorizationManager  (authorization URLs, PKCE, state)
//!            ├──► TokenLifecycle        (exchange, refresh, invalidation)
//!            └──► JobOrchestrator       (submit + poll autofill job)
//!                      │
//!                      ├──► AssetBridge     (image uploads)
//!                      └──► TemplateMapper  (field mapping)
//! ```
//!
//! All I/O happens behind the traits in [`ports`]; `roamly-infra` provides
//! the SQLite-backed stores and the Canva HTTP client.

pub mod assets;
pub mod authorization;
pub mod orchestrator;
pub mod pkce;
pub mod ports;
pub mod service;
pub mod template;
pub mod tokens;

#[cfg(test)]
pub(crate) mod test_support;

pub use assets::AssetBridge;
pub use authorization::AuthorizationManager;
pub use orchestrator::{JobOrchestrator, JobPhase, PollSettings};
pub use ports::{
    AuthStateStore, AutofillJobStatus, AutofillPayload, DesignPlatformApi, DiaryDesignStore,
    FieldValue, TemplateFieldType, TemplateSchema, TokenGrant, TokenStore,
};
pub use service::{CompletedAuthorization, DesignExportService};
pub use template::TemplateMapper;
pub use tokens::TokenLifecycle;
