//! Asset bridge: maps trip image URLs to platform asset ids
//!
//! Uploads are independent per URL; one failure never aborts the batch. A
//! trip is worth exporting partially populated, so missing keys in the
//! result simply mean "no asset available for this image".

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use super::ports::DesignPlatformApi;

/// Uploads source images to the platform, tolerating partial failure.
pub struct AssetBridge {
    platform: Arc<dyn DesignPlatformApi>,
}

impl AssetBridge {
    /// Create a bridge over the platform API.
    #[must_use]
    pub fn new(platform: Arc<dyn DesignPlatformApi>) -> Self {
        Self { platform }
    }

    /// Upload every URL in order and return the mapping of source URL to
    /// asset id. URLs that fail to upload are logged and omitted; callers
    /// must treat a missing key as "skip this image".
    pub async fn upload_assets(
        &self,
        access_token: &str,
        urls: &[String],
    ) -> HashMap<String, String> {
        let mut assets = HashMap::new();

        for url in urls {
            if assets.contains_key(url) {
                continue;
            }
            match self.platform.upload_asset(access_token, url).await {
                Ok(asset_id) => {
                    debug!(url, asset_id, "asset uploaded");
                    assets.insert(url.clone(), asset_id);
                }
                Err(err) => {
                    // Partial failure is non-fatal: generation continues
                    // without this image.
                    warn!(url, error = %err, "asset upload failed; skipping image");
                }
            }
        }

        debug!(uploaded = assets.len(), requested = urls.len(), "asset upload batch finished");
        assets
    }
}
