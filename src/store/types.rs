use crate::group::Coordinate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Pre-network validation failures for a story submission.
///
/// Raised by `NewStory::validate()` before any request is built, so a
/// rejected draft never produces network traffic or state mutation. The
/// messages are user-facing and surfaced inline on the form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Title is required")]
    EmptyTitle,

    #[error("Description is required")]
    EmptyDescription,

    #[error("Image is required")]
    MissingImage,

    #[error("Please select a valid location")]
    MissingLocation,

    /// Image exceeds the configured upload cap (the service rejects these
    /// anyway; catching it here avoids a doomed upload).
    #[error("Image too large ({size} bytes, max {max})")]
    ImageTooLarge { size: usize, max: usize },
}

/// Story service failures with user-friendly messages.
///
/// Every variant is caught at the event boundary and converted to a
/// transient status message; none of them crash the engine.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The submission failed validation before any request was made.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The service answered with a non-success status other than 404.
    #[error("Story service error: status {0}")]
    Storage(u16),

    /// Delete target vanished. Treated as success by the caller for
    /// idempotence; the local copy is removed regardless.
    #[error("Story not found")]
    NotFound,

    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),

    #[error("Malformed response from story service: {0}")]
    Decode(#[from] serde_json::Error),
}

// ============================================================================
// Data Structures
// ============================================================================

/// Opaque story identifier assigned by the store.
pub type StoryId = i64;

/// A story record as listed by the story service.
///
/// The image payload is deliberately absent: list responses exclude the
/// blob for bandwidth, and images are fetched lazily through
/// `StoryClient::image_url` / `fetch_image`. Stories are immutable once
/// created; there is no edit operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: StoryId,
    pub title: String,
    pub description: String,
    pub lat: f64,
    pub lng: f64,
    pub timestamp: DateTime<Utc>,
}

impl Story {
    /// The coordinate this story is pinned to.
    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

/// Image bytes attached to a story submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    /// MIME type sent as the multipart part's content type.
    pub content_type: String,
    pub file_name: String,
}

/// An unsaved story submission: the draft form's fields plus the placement
/// chosen on the map.
///
/// `validate()` mirrors the form-side checks; a payload that fails here is
/// never sent.
#[derive(Debug, Clone, Default)]
pub struct NewStory {
    pub title: String,
    pub description: String,
    pub image: Option<ImageUpload>,
    pub location: Option<Coordinate>,
}

impl NewStory {
    /// Check the submission before any network call.
    ///
    /// Title and description are trimmed before the emptiness check, and
    /// the trimmed values are what `StoryClient::create` sends.
    pub fn validate(&self, max_image_bytes: usize) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.description.trim().is_empty() {
            return Err(ValidationError::EmptyDescription);
        }
        let Some(image) = &self.image else {
            return Err(ValidationError::MissingImage);
        };
        if image.bytes.len() > max_image_bytes {
            return Err(ValidationError::ImageTooLarge {
                size: image.bytes.len(),
                max: max_image_bytes,
            });
        }
        if self.location.is_none() {
            return Err(ValidationError::MissingLocation);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: usize = 5 * 1024 * 1024;

    fn valid_submission() -> NewStory {
        NewStory {
            title: "Old Bridge".to_string(),
            description: "Where we met".to_string(),
            image: Some(ImageUpload {
                bytes: vec![0xFF, 0xD8, 0xFF],
                content_type: "image/jpeg".to_string(),
                file_name: "bridge.jpg".to_string(),
            }),
            location: Some(Coordinate { lat: 10.0, lng: 20.0 }),
        }
    }

    #[test]
    fn test_valid_submission_passes() {
        assert_eq!(valid_submission().validate(MAX), Ok(()));
    }

    #[test]
    fn test_whitespace_title_rejected() {
        let mut story = valid_submission();
        story.title = "   ".to_string();
        assert_eq!(story.validate(MAX), Err(ValidationError::EmptyTitle));
    }

    #[test]
    fn test_empty_description_rejected() {
        let mut story = valid_submission();
        story.description = String::new();
        assert_eq!(story.validate(MAX), Err(ValidationError::EmptyDescription));
    }

    #[test]
    fn test_missing_image_rejected() {
        let mut story = valid_submission();
        story.image = None;
        assert_eq!(story.validate(MAX), Err(ValidationError::MissingImage));
    }

    #[test]
    fn test_missing_location_rejected() {
        let mut story = valid_submission();
        story.location = None;
        assert_eq!(story.validate(MAX), Err(ValidationError::MissingLocation));
    }

    #[test]
    fn test_oversized_image_rejected() {
        let mut story = valid_submission();
        story.image.as_mut().unwrap().bytes = vec![0; MAX + 1];
        assert!(matches!(
            story.validate(MAX),
            Err(ValidationError::ImageTooLarge { .. })
        ));
    }

    #[test]
    fn test_validation_order_title_first() {
        // An all-empty submission reports the title first, matching the
        // form's top-to-bottom check order.
        let story = NewStory::default();
        assert_eq!(story.validate(MAX), Err(ValidationError::EmptyTitle));
    }

    #[test]
    fn test_story_roundtrips_through_json() {
        let json = r#"{
            "id": 7,
            "title": "Harbor",
            "description": "First snow",
            "lat": 59.91,
            "lng": 10.75,
            "timestamp": "2025-11-02T09:30:00Z"
        }"#;
        let story: Story = serde_json::from_str(json).unwrap();
        assert_eq!(story.id, 7);
        assert_eq!(story.coordinate(), Coordinate { lat: 59.91, lng: 10.75 });
    }
}
