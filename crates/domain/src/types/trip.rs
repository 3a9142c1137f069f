//! Trip and place models
//!
//! These mirror the shapes owned by the trip CRUD collaborator; this
//! subsystem only reads them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A logged trip, as provided by the trip service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    /// Trip document id.
    pub id: String,
    /// Trip title.
    pub title: String,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Cover image URL, if one was set.
    #[serde(default)]
    pub cover_image_url: Option<String>,
}

/// A visited place within a trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    /// Place document id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// When the place was visited.
    pub visited_at: DateTime<Utc>,
    /// Star rating, if given.
    #[serde(default)]
    pub rating: Option<f32>,
    /// Free-text visitor comment.
    #[serde(default)]
    pub comment: Option<String>,
    /// AI-rewritten version of the comment, when available.
    #[serde(default)]
    pub rewritten_comment: Option<String>,
    /// Image URLs attached to this place, in upload order.
    #[serde(default)]
    pub image_urls: Vec<String>,
}

impl Place {
    /// The comment to surface on exports: rewritten when present, raw
    /// otherwise, empty string when neither exists.
    #[must_use]
    pub fn display_comment(&self) -> String {
        self.rewritten_comment
            .clone()
            .or_else(|| self.comment.clone())
            .unwrap_or_default()
    }
}

/// Collect every image URL referenced by a trip and its places: cover image
/// first, then each place's images in visit order.
#[must_use]
pub fn collect_image_urls(trip: &Trip, places: &[Place]) -> Vec<String> {
    let mut ordered: Vec<&Place> = places.iter().collect();
    ordered.sort_by_key(|p| p.visited_at);

    let mut urls = Vec::new();
    if let Some(cover) = &trip.cover_image_url {
        urls.push(cover.clone());
    }
    for place in ordered {
        urls.extend(place.image_urls.iter().cloned());
    }
    urls
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn place(name: &str, hour: u32, images: &[&str]) -> Place {
        Place {
            id: format!("place-{name}"),
            name: name.to_string(),
            visited_at: Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).single().expect("valid time"),
            rating: None,
            comment: None,
            rewritten_comment: None,
            image_urls: images.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    #[test]
    fn display_comment_prefers_rewritten() {
        let mut p = place("louvre", 9, &[]);
        p.comment = Some("long queue".to_string());
        p.rewritten_comment = Some("Worth the wait despite the queue.".to_string());
        assert_eq!(p.display_comment(), "Worth the wait despite the queue.");

        p.rewritten_comment = None;
        assert_eq!(p.display_comment(), "long queue");

        p.comment = None;
        assert_eq!(p.display_comment(), "");
    }

    #[test]
    fn image_urls_ordered_cover_first_then_visit_order() {
        let trip = Trip {
            id: "trip-1".to_string(),
            title: "Paris".to_string(),
            description: None,
            cover_image_url: Some("https://img.roamly.io/cover.jpg".to_string()),
        };
        // Deliberately out of chronological order.
        let places =
            vec![place("late", 18, &["https://img.roamly.io/late.jpg"]), place("early", 8, &[
                "https://img.roamly.io/early-1.jpg",
                "https://img.roamly.io/early-2.jpg",
            ])];

        let urls = collect_image_urls(&trip, &places);
        assert_eq!(urls, vec![
            "https://img.roamly.io/cover.jpg",
            "https://img.roamly.io/early-1.jpg",
            "https://img.roamly.io/early-2.jpg",
            "https://img.roamly.io/late.jpg",
        ]);
    }

    #[test]
    fn no_cover_image_yields_place_images_only() {
        let trip = Trip {
            id: "trip-2".to_string(),
            title: "Day trip".to_string(),
            description: None,
            cover_image_url: None,
        };
        let places = vec![place("only", 12, &["https://img.roamly.io/one.jpg"])];

        assert_eq!(collect_image_urls(&trip, &places), vec!["https://img.roamly.io/one.jpg"]);
    }
}
