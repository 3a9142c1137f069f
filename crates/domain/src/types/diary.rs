//! Design result attached to a diary record

use serde::{Deserialize, Serialize};

/// Reference to a generated design on the remote platform.
///
/// This subsystem is a pure producer; the Diary record owns the copy it
/// stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignResult {
    /// Opaque design identifier on the platform.
    pub design_id: String,
    /// View-only link.
    pub design_url: String,
    /// Edit link.
    pub editor_url: String,
}
