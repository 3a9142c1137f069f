//! Canva Connect HTTP client
//!
//! Implements the `DesignPlatformApi` port over the REST API. Every request
//! carries a bounded timeout; brand-template schemas are cached briefly
//! since templates change rarely relative to export volume.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::Client;
use roamly_core::design_export::ports::{
    AutofillJobStatus, AutofillPayload, DesignPlatformApi, FieldValue, TemplateFieldType,
    TemplateSchema, TokenGrant,
};
use roamly_domain::constants::{IMAGE_FETCH_TIMEOUT_SECONDS, PLATFORM_REQUEST_TIMEOUT_SECONDS};
use roamly_domain::{CanvaConfig, DesignResult, ExportError, Result};
use serde_json::json;
use tracing::debug;

use super::errors::CanvaError;
use super::types::{
    ApiErrorBody, AssetResponse, AutofillJobResponse, DatasetField, DatasetResponse,
    DesignResponse, TokenResponse,
};

const SCHEMA_CACHE_CAPACITY: u64 = 64;
const SCHEMA_CACHE_TTL: Duration = Duration::from_secs(300);

/// HTTP client for the Canva Connect API.
pub struct CanvaClient {
    config: CanvaConfig,
    /// Client for platform calls (30 s timeout).
    http: Client,
    /// Client for fetching source images before upload (10 s timeout).
    image_http: Client,
    /// Short-lived cache of brand template datasets.
    schema_cache: Cache<String, TemplateSchema>,
}

impl CanvaClient {
    /// Create a client for the configured platform.
    ///
    /// # Errors
    /// Returns [`ExportError::Network`] when the HTTP clients cannot be
    /// built.
    pub fn new(config: CanvaConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(PLATFORM_REQUEST_TIMEOUT_SECONDS))
            .build()
            .map_err(|err| ExportError::Network(format!("failed to build http client: {err}")))?;
        let image_http = Client::builder()
            .timeout(Duration::from_secs(IMAGE_FETCH_TIMEOUT_SECONDS))
            .build()
            .map_err(|err| ExportError::Network(format!("failed to build http client: {err}")))?;

        let schema_cache = Cache::builder()
            .max_capacity(SCHEMA_CACHE_CAPACITY)
            .time_to_live(SCHEMA_CACHE_TTL)
            .build();

        Ok(Self { config, http, image_http, schema_cache })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_base_url.trim_end_matches('/'))
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenGrant> {
        let response = self
            .http
            .post(self.config.token_endpoint())
            .form(form)
            .send()
            .await
            .map_err(CanvaError::from)?;

        let response = expect_success(response).await?;
        let body: TokenResponse =
            response.json().await.map_err(|err| CanvaError::Decode(err.to_string()))?;

        Ok(TokenGrant {
            access_token: body.access_token,
            refresh_token: body.refresh_token,
            expires_in: body.expires_in,
        })
    }
}

#[async_trait]
impl DesignPlatformApi for CanvaClient {
    async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<TokenGrant> {
        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("client_id", self.config.client_id.as_str()),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code_verifier", code_verifier),
        ];
        if let Some(secret) = self.config.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        debug!("exchanging authorization code");
        self.token_request(&form).await
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenGrant> {
        let mut form = vec![
            ("grant_type", "refresh_token"),
            ("client_id", self.config.client_id.as_str()),
            ("refresh_token", refresh_token),
        ];
        if let Some(secret) = self.config.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        debug!("refreshing access token");
        self.token_request(&form).await
    }

    async fn fetch_template_dataset(
        &self,
        access_token: &str,
        template_id: &str,
    ) -> Result<TemplateSchema> {
        if let Some(schema) = self.schema_cache.get(template_id).await {
            debug!(template_id, "template dataset served from cache");
            return Ok(schema);
        }

        let url = self.endpoint(&format!("/v1/brand-templates/{template_id}/dataset"));
        let response =
            self.http.get(url).bearer_auth(access_token).send().await.map_err(CanvaError::from)?;

        let response = expect_success(response).await?;
        let body: DatasetResponse =
            response.json().await.map_err(|err| CanvaError::Decode(err.to_string()))?;

        let schema: TemplateSchema = body
            .dataset
            .into_iter()
            .map(|(name, field)| {
                let field_type = match field {
                    DatasetField::Text => TemplateFieldType::Text,
                    DatasetField::Image => TemplateFieldType::Image,
                };
                (name, field_type)
            })
            .collect();

        self.schema_cache.insert(template_id.to_string(), schema.clone()).await;
        Ok(schema)
    }

    async fn upload_asset(&self, access_token: &str, source_url: &str) -> Result<String> {
        // Fetch the source image first; a deleted or unreachable image fails
        // only this asset, which the bridge treats as non-fatal.
        let image_response =
            self.image_http.get(source_url).send().await.map_err(CanvaError::from)?;
        let image_response = expect_success(image_response).await?;
        let bytes = image_response.bytes().await.map_err(CanvaError::from)?;

        let name = asset_name_for(source_url);
        let response = self
            .http
            .post(self.endpoint("/v1/assets"))
            .bearer_auth(access_token)
            .header("Content-Type", "application/octet-stream")
            .query(&[("name", name.as_str())])
            .body(bytes)
            .send()
            .await
            .map_err(CanvaError::from)?;

        let response = expect_success(response).await?;
        let body: AssetResponse =
            response.json().await.map_err(|err| CanvaError::Decode(err.to_string()))?;

        debug!(source_url, asset_id = %body.asset.id, "asset uploaded");
        Ok(body.asset.id)
    }

    async fn create_autofill_job(
        &self,
        access_token: &str,
        template_id: &str,
        payload: &AutofillPayload,
    ) -> Result<String> {
        let body = json!({
            "brand_template_id": template_id,
            "data": payload_to_json(payload),
        });

        let response = self
            .http
            .post(self.endpoint("/v1/autofills"))
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(CanvaError::from)?;

        let response = expect_success(response).await?;
        let body: AutofillJobResponse =
            response.json().await.map_err(|err| CanvaError::Decode(err.to_string()))?;

        debug!(job_id = %body.job.id, template_id, "autofill job created");
        Ok(body.job.id)
    }

    async fn get_autofill_job(
        &self,
        access_token: &str,
        job_id: &str,
    ) -> Result<AutofillJobStatus> {
        let url = self.endpoint(&format!("/v1/autofills/{job_id}"));
        let response =
            self.http.get(url).bearer_auth(access_token).send().await.map_err(CanvaError::from)?;

        let response = expect_success(response).await?;
        let body: AutofillJobResponse =
            response.json().await.map_err(|err| CanvaError::Decode(err.to_string()))?;

        let job = body.job;
        match job.status.as_str() {
            "in_progress" => Ok(AutofillJobStatus::InProgress),
            "success" => {
                let design_url = job
                    .result
                    .map(|result| result.design.url)
                    .ok_or_else(|| {
                        ExportError::MalformedJobResult(
                            "job succeeded without a design result".to_string(),
                        )
                    })?;
                Ok(AutofillJobStatus::Success { design_url })
            }
            "failed" => {
                let reason = job
                    .error
                    .and_then(|error| error.message)
                    .unwrap_or_else(|| "failed".to_string());
                Ok(AutofillJobStatus::Failed { reason })
            }
            // Treat anything unrecognized as terminal; waiting out the
            // deadline on a status we cannot interpret helps nobody.
            other => Ok(AutofillJobStatus::Failed { reason: other.to_string() }),
        }
    }

    async fn create_design(
        &self,
        access_token: &str,
        title: &str,
        seed_asset_id: Option<&str>,
    ) -> Result<DesignResult> {
        let mut body = json!({ "title": title });
        if let Some(asset_id) = seed_asset_id {
            body["asset_id"] = json!(asset_id);
        }

        let response = self
            .http
            .post(self.endpoint("/v1/designs"))
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(CanvaError::from)?;

        let response = expect_success(response).await?;
        let body: DesignResponse =
            response.json().await.map_err(|err| CanvaError::Decode(err.to_string()))?;

        Ok(DesignResult {
            design_id: body.design.id,
            design_url: body.design.urls.view_url,
            editor_url: body.design.urls.edit_url,
        })
    }
}

/// Reject non-success responses, pulling code/message out of the error body.
async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body: ApiErrorBody = response.json().await.unwrap_or_default();
    Err(CanvaError::status(status, body.code, body.message).into())
}

/// Derive an upload name from the source URL's last path segment.
fn asset_name_for(source_url: &str) -> String {
    url::Url::parse(source_url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|segments| segments.last().map(ToString::to_string))
        })
        .filter(|segment| !segment.is_empty())
        .unwrap_or_else(|| format!("trip-image-{}", uuid::Uuid::new_v4()))
}

/// Serialize the payload into the autofill `data` object.
fn payload_to_json(payload: &AutofillPayload) -> serde_json::Value {
    let mut data = serde_json::Map::new();
    for (name, value) in payload {
        let entry = match value {
            FieldValue::Text(text) => json!({ "type": "text", "text": text }),
            FieldValue::Image { asset_id } => json!({ "type": "image", "asset_id": asset_id }),
        };
        data.insert(name.clone(), entry);
    }
    serde_json::Value::Object(data)
}
