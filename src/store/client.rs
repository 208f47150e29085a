//! HTTP client for the story service.
//!
//! The service exposes a small REST surface: `GET /` lists stories (image
//! payload excluded), `POST /` creates one from a multipart form,
//! `DELETE /{id}` removes one, and `GET /{id}/image` streams the image for
//! lazy loading. All failures map onto `StoreError`; callers apply state
//! changes only after a call resolves successfully.

use super::types::{NewStory, Story, StoreError, StoryId, ValidationError};
use crate::config::Config;
use anyhow::Result;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use std::time::Duration;
use url::Url;

/// Client for the remote story service. Cheap to clone; background tasks
/// take their own copy.
#[derive(Clone)]
pub struct StoryClient {
    http: reqwest::Client,
    base_url: Url,
    timeout_secs: u64,
    max_image_bytes: usize,
}

impl StoryClient {
    /// Build a client against the configured service.
    ///
    /// The base URL is validated up front (HTTPS required except for
    /// localhost) so a misconfiguration fails at startup, not on the first
    /// request.
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = config.validated_store_url()?;
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(60))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url,
            timeout_secs: config.request_timeout_secs,
            max_image_bytes: config.max_image_bytes,
        })
    }

    /// Upload cap applied to submissions and image downloads.
    pub fn max_image_bytes(&self) -> usize {
        self.max_image_bytes
    }

    /// Fetch the full story collection. Image payloads are omitted by the
    /// service; fetch them per-id through `fetch_image`.
    pub async fn list(&self) -> Result<Vec<Story>, StoreError> {
        tracing::debug!(url = %self.base_url, "Listing stories");
        let response = self
            .http
            .get(self.base_url.clone())
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Storage(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_request_error(e))?;
        let stories: Vec<Story> = serde_json::from_slice(&body)?;
        tracing::debug!(count = stories.len(), "Story list loaded");
        Ok(stories)
    }

    /// Create a story from a validated submission.
    ///
    /// Validation runs again here so a direct caller cannot ship a doomed
    /// upload; the engine path (`events::submit_story`) has already checked
    /// and surfaced any failure inline before spawning.
    pub async fn create(&self, submission: &NewStory) -> Result<Story, StoreError> {
        submission.validate(self.max_image_bytes)?;
        // validate() guarantees both are present.
        let Some(image) = submission.image.as_ref() else {
            return Err(StoreError::Invalid(ValidationError::MissingImage));
        };
        let Some(location) = submission.location else {
            return Err(StoreError::Invalid(ValidationError::MissingLocation));
        };

        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)?;
        let form = Form::new()
            .text("title", submission.title.trim().to_string())
            .text("description", submission.description.trim().to_string())
            .text("lat", location.lat.to_string())
            .text("lng", location.lng.to_string())
            .part("image", part);

        tracing::debug!(title = %submission.title.trim(), "Creating story");
        let response = self
            .http
            .post(self.base_url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(status = status.as_u16(), "Story create rejected");
            return Err(StoreError::Storage(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_request_error(e))?;
        let story: Story = serde_json::from_slice(&body)?;
        tracing::info!(story_id = story.id, "Story created");
        Ok(story)
    }

    /// Delete a story. A 404 maps to `StoreError::NotFound`, which callers
    /// treat as success: the record is gone either way.
    pub async fn delete(&self, id: StoryId) -> Result<(), StoreError> {
        let url = self.story_url(id);
        tracing::debug!(story_id = id, "Deleting story");
        let response = self
            .http
            .delete(url)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound);
        }
        if !status.is_success() {
            return Err(StoreError::Storage(status.as_u16()));
        }
        Ok(())
    }

    /// Addressable reference for a story's image, for renderers that fetch
    /// on their own (an `<img>` source, a tile overlay).
    pub fn image_url(&self, id: StoryId) -> Url {
        let mut url = self.story_url(id);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push("image");
        }
        url
    }

    /// Download a story's image, streamed with a size cap mirroring the
    /// service's upload limit.
    pub async fn fetch_image(&self, id: StoryId) -> Result<Vec<u8>, StoreError> {
        let url = self.image_url(id);
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound);
        }
        if !status.is_success() {
            return Err(StoreError::Storage(status.as_u16()));
        }

        // Reject oversized bodies without buffering them whole: stop as
        // soon as the cap is crossed.
        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| self.map_request_error(e))?;
            if body.len() + chunk.len() > self.max_image_bytes {
                tracing::warn!(story_id = id, "Image exceeds size cap, aborting download");
                return Err(StoreError::ResponseTooLarge(self.max_image_bytes));
            }
            body.extend_from_slice(&chunk);
        }
        tracing::debug!(story_id = id, bytes = body.len(), "Image downloaded");
        Ok(body)
    }

    /// `{base}/{id}`.
    fn story_url(&self, id: StoryId) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(&id.to_string());
        }
        url
    }

    fn map_request_error(&self, err: reqwest::Error) -> StoreError {
        if err.is_timeout() {
            StoreError::Timeout(self.timeout_secs)
        } else {
            StoreError::Network(err)
        }
    }
}
