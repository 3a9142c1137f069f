//! Configuration structures
//!
//! Deserialized from a config file (TOML or JSON) or assembled from
//! environment variables by the infra loader.

use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Credential store settings.
    pub database: DatabaseConfig,
    /// Design platform (Canva Connect) settings.
    pub canva: CanvaConfig,
}

/// Credential store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    pub path: String,
    /// Connection pool size.
    pub pool_size: u32,
    /// SQLCipher encryption key. Required at runtime; optional here so a
    /// config file can omit it in favor of the environment.
    #[serde(default)]
    pub encryption_key: Option<String>,
}

/// Canva Connect API configuration.
///
/// `client_id` and `redirect_uri` must be present for the integration to be
/// usable; everything else has a sensible default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvaConfig {
    /// OAuth client id issued by the platform.
    pub client_id: String,

    /// OAuth client secret. Optional: PKCE-only public clients omit it.
    #[serde(default)]
    pub client_secret: Option<String>,

    /// Redirect URI registered with the platform.
    pub redirect_uri: String,

    /// OAuth scopes to request.
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,

    /// Brand template to autofill. When absent, exports fall back to
    /// creating an empty design seeded with the cover asset.
    #[serde(default)]
    pub brand_template_id: Option<String>,

    /// Authorization endpoint (user-facing consent page).
    #[serde(default = "default_authorization_endpoint")]
    pub authorization_endpoint: String,

    /// REST API base URL (token exchange, assets, autofill jobs).
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

impl CanvaConfig {
    /// Configuration with the standard endpoints and scopes.
    #[must_use]
    pub fn new(client_id: String, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret: None,
            redirect_uri,
            scopes: default_scopes(),
            brand_template_id: None,
            authorization_endpoint: default_authorization_endpoint(),
            api_base_url: default_api_base_url(),
        }
    }

    /// Whether the minimum viable credentials are present.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.redirect_uri.is_empty()
    }

    /// Scopes as the space-separated string the authorize endpoint expects.
    #[must_use]
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }

    /// Token endpoint derived from the API base URL.
    #[must_use]
    pub fn token_endpoint(&self) -> String {
        format!("{}/v1/oauth/token", self.api_base_url.trim_end_matches('/'))
    }
}

fn default_scopes() -> Vec<String> {
    vec![
        "asset:write".to_string(),
        "design:content:write".to_string(),
        "design:meta:read".to_string(),
        "brandtemplate:content:read".to_string(),
    ]
}

fn default_authorization_endpoint() -> String {
    "https://www.canva.com/api/oauth/authorize".to_string()
}

fn default_api_base_url() -> String {
    "https://api.canva.com/rest".to_string()
}
