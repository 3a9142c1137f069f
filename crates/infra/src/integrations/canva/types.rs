//! Wire types for the Canva Connect API

use serde::Deserialize;

/// Token endpoint response (RFC 6749).
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    pub token_type: Option<String>,
    pub scope: Option<String>,
}

/// Error body returned by the REST API.
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
    pub code: Option<String>,
    pub message: Option<String>,
}

/// `GET /v1/brand-templates/{id}/dataset`
#[derive(Debug, Deserialize)]
pub struct DatasetResponse {
    pub dataset: std::collections::BTreeMap<String, DatasetField>,
}

/// One field declaration in a brand template dataset.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DatasetField {
    Text,
    Image,
}

/// `POST /v1/assets`
#[derive(Debug, Deserialize)]
pub struct AssetResponse {
    pub asset: Asset,
}

#[derive(Debug, Deserialize)]
pub struct Asset {
    pub id: String,
}

/// `POST /v1/autofills` and `GET /v1/autofills/{jobId}`
#[derive(Debug, Deserialize)]
pub struct AutofillJobResponse {
    pub job: AutofillJob,
}

#[derive(Debug, Deserialize)]
pub struct AutofillJob {
    pub id: String,
    pub status: String,
    pub result: Option<AutofillResult>,
    pub error: Option<AutofillJobError>,
}

#[derive(Debug, Deserialize)]
pub struct AutofillResult {
    pub design: AutofillDesign,
}

#[derive(Debug, Deserialize)]
pub struct AutofillDesign {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct AutofillJobError {
    pub code: Option<String>,
    pub message: Option<String>,
}

/// `POST /v1/designs`
#[derive(Debug, Deserialize)]
pub struct DesignResponse {
    pub design: Design,
}

#[derive(Debug, Deserialize)]
pub struct Design {
    pub id: String,
    pub urls: DesignUrls,
}

#[derive(Debug, Deserialize)]
pub struct DesignUrls {
    pub view_url: String,
    pub edit_url: String,
}
