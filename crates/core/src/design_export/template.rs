//! Template mapper: adapts trip data to a template's named fields
//!
//! The template schema is externally defined; fields are matched against an
//! explicit table of recognized names instead of substring heuristics, and
//! an unrecognized field fails loudly rather than being silently skipped.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use roamly_domain::{ExportError, Place, Result, Trip};
use tracing::debug;

use super::ports::{
    AutofillPayload, DesignPlatformApi, FieldValue, TemplateFieldType, TemplateSchema,
};

/// Template fields this integration knows how to fill.
///
/// Matching is case-insensitive on the exact field name. Extending the
/// integration to a new template field means adding a variant here and its
/// fill strategy in [`TemplateMapper::build_autofill_payload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecognizedField {
    /// Visit time of the first place, as localized h:mm AM/PM text.
    Time,
    /// Name of the first place.
    PlaceName,
    /// Rewritten comment of the first place, else raw comment, else empty.
    Comments,
    /// First image of the first place, falling back to the trip cover.
    CoverImage,
}

impl RecognizedField {
    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "time" => Some(Self::Time),
            "place" => Some(Self::PlaceName),
            "comments" => Some(Self::Comments),
            "cover_image" => Some(Self::CoverImage),
            _ => None,
        }
    }

    const fn expected_type(self) -> TemplateFieldType {
        match self {
            Self::Time | Self::PlaceName | Self::Comments => TemplateFieldType::Text,
            Self::CoverImage => TemplateFieldType::Image,
        }
    }
}

/// Fetches template schemas and maps trip content onto them.
pub struct TemplateMapper {
    platform: Arc<dyn DesignPlatformApi>,
}

impl TemplateMapper {
    /// Create a mapper over the platform API.
    #[must_use]
    pub fn new(platform: Arc<dyn DesignPlatformApi>) -> Self {
        Self { platform }
    }

    /// Fetch the field schema of a brand template.
    ///
    /// # Errors
    /// Propagates platform errors translated by the client.
    pub async fn fetch_template_schema(
        &self,
        access_token: &str,
        template_id: &str,
    ) -> Result<TemplateSchema> {
        let schema = self.platform.fetch_template_dataset(access_token, template_id).await?;
        debug!(template_id, fields = schema.len(), "template schema fetched");
        Ok(schema)
    }

    /// Build the autofill payload for a trip against a fetched schema.
    ///
    /// Only the first chronologically-ordered place feeds the single-valued
    /// fields; fanning multiple places across template pages is a documented
    /// limitation. Image fields with no resolvable asset are omitted
    /// entirely so the platform applies its template default.
    ///
    /// # Errors
    /// - [`ExportError::NoContentAvailable`] when the trip has zero places
    /// - [`ExportError::ConfigurationMissing`] when the schema declares a
    ///   field this integration does not recognize, or a recognized field
    ///   with an unexpected type
    pub fn build_autofill_payload(
        schema: &TemplateSchema,
        trip: &Trip,
        places: &[Place],
        assets: &HashMap<String, String>,
    ) -> Result<AutofillPayload> {
        let mut ordered: Vec<&Place> = places.iter().collect();
        ordered.sort_by_key(|place| place.visited_at);
        let first = *ordered.first().ok_or(ExportError::NoContentAvailable)?;

        let mut payload = AutofillPayload::new();

        for (name, field_type) in schema {
            let Some(field) = RecognizedField::from_name(name) else {
                return Err(ExportError::ConfigurationMissing(format!(
                    "template field '{name}' is not supported by the trip export"
                )));
            };
            if field.expected_type() != *field_type {
                return Err(ExportError::ConfigurationMissing(format!(
                    "template field '{name}' has an unexpected type"
                )));
            }

            match field {
                RecognizedField::Time => {
                    payload.insert(
                        name.clone(),
                        FieldValue::Text(format_visit_time(first.visited_at)),
                    );
                }
                RecognizedField::PlaceName => {
                    payload.insert(name.clone(), FieldValue::Text(first.name.clone()));
                }
                RecognizedField::Comments => {
                    payload.insert(name.clone(), FieldValue::Text(first.display_comment()));
                }
                RecognizedField::CoverImage => {
                    let asset_id = first
                        .image_urls
                        .first()
                        .and_then(|url| assets.get(url))
                        .or_else(|| {
                            trip.cover_image_url.as_ref().and_then(|url| assets.get(url))
                        });
                    if let Some(asset_id) = asset_id {
                        payload.insert(
                            name.clone(),
                            FieldValue::Image { asset_id: asset_id.clone() },
                        );
                    }
                    // No asset resolvable: omit the field so the template
                    // default applies.
                }
            }
        }

        Ok(payload)
    }
}

/// Format a visit timestamp as localized hour:minute text, e.g. "2:30 PM".
fn format_visit_time(visited_at: DateTime<Utc>) -> String {
    visited_at.format("%-I:%M %p").to_string()
}
