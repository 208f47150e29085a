//! Store synchronization: background task events and their application.
//!
//! Store calls run as spawned tasks that report completion over an
//! `AppEvent` channel; `handle_app_event` applies the outcome to the engine
//! state on the embedding event loop. Collection-changing transitions
//! (`story_saved`, `story_deleted`) run only here, after the store has
//! acknowledged. There is no optimistic create, and a failed call leaves
//! state exactly as it was.

use crate::app::App;
use crate::store::{ImageUpload, NewStory, Story, StoreError, StoryClient, StoryId, ValidationError};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

// ============================================================================
// Events
// ============================================================================

/// Completions from background store tasks.
pub enum AppEvent {
    /// A list refresh finished.
    ///
    /// `generation` is the load counter at spawn time; stale responses
    /// (an older refresh finishing after a newer one) are dropped.
    StoriesLoaded {
        generation: u64,
        result: Result<Vec<Story>, StoreError>,
    },
    /// A create resolved. On success the created story (with its
    /// store-assigned id) is appended and the draft flow completes.
    StoryCreated { result: Result<Story, StoreError> },
    /// A delete resolved for the given id.
    StoryDeleteResolved {
        id: StoryId,
        result: Result<(), StoreError>,
    },
    /// An image download resolved.
    ImageLoaded {
        story_id: StoryId,
        result: Result<Vec<u8>, StoreError>,
    },
    /// A background task panicked.
    TaskPanicked {
        task: &'static str,
        error: String,
    },
}

// ============================================================================
// Event Application
// ============================================================================

/// Apply a background-task completion to the engine state.
///
/// Runs on the embedding event loop, so each application is atomic with
/// respect to the user-driven transitions.
pub fn handle_app_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::StoriesLoaded { generation, result } => {
            if generation != app.load_generation {
                tracing::debug!(
                    generation,
                    current = app.load_generation,
                    "Dropping stale story list response"
                );
                return;
            }
            match result {
                Ok(stories) => {
                    tracing::info!(count = stories.len(), "Story collection refreshed");
                    app.replace_stories(stories);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Story list load failed");
                    app.set_status(format!("Failed to load stories: {}", e));
                }
            }
        }
        AppEvent::StoryCreated { result } => match result {
            Ok(story) => {
                app.set_status("Story saved");
                app.story_saved(story);
            }
            Err(e) => {
                // Nothing was mutated before the call; the draft stays so
                // the user can retry.
                tracing::error!(error = %e, "Story create failed");
                app.set_status(format!("Failed to save story: {}", e));
            }
        },
        AppEvent::StoryDeleteResolved { id, result } => match result {
            Ok(()) => {
                app.story_deleted(id);
                app.set_status("Story deleted");
            }
            Err(StoreError::NotFound) => {
                // Already gone server-side; removing locally keeps delete
                // idempotent.
                tracing::debug!(story_id = id, "Delete target already gone");
                app.story_deleted(id);
                app.set_status("Story deleted");
            }
            Err(e) => {
                tracing::error!(story_id = id, error = %e, "Story delete failed");
                app.set_status(format!("Failed to delete story: {}", e));
            }
        },
        AppEvent::ImageLoaded { story_id, result } => match result {
            Ok(bytes) => {
                app.images.insert(story_id, bytes);
            }
            Err(e) => {
                // Non-critical: the card renders without its photo.
                tracing::warn!(story_id, error = %e, "Image load failed");
            }
        },
        AppEvent::TaskPanicked { task, error } => {
            tracing::error!(task, error, "Background task panicked");
            app.set_status(format!("Internal error in {} task", task));
        }
    }
}

// ============================================================================
// Submission
// ============================================================================

/// Validate and submit the draft form.
///
/// The submission is assembled from the form fields plus the draft's
/// candidate location. Validation failures are returned synchronously for
/// inline display; no task is spawned and no state is touched. On success
/// the create runs in the background and resolves through
/// `AppEvent::StoryCreated`.
pub fn submit_story(
    app: &App,
    title: String,
    description: String,
    image: Option<ImageUpload>,
    tx: &mpsc::Sender<AppEvent>,
) -> Result<JoinHandle<()>, ValidationError> {
    let submission = NewStory {
        title,
        description,
        image,
        location: app.draft.candidate_if_active(),
    };
    submission.validate(app.store.max_image_bytes())?;
    Ok(spawn_create_story(app.store.clone(), submission, tx.clone()))
}

// ============================================================================
// Task Spawning
// ============================================================================

/// Wraps a future to catch panics and convert them to errors, so a
/// panicking background task surfaces as `AppEvent::TaskPanicked` instead
/// of silently disappearing into the runtime.
async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            }
        })
}

/// Spawn a background list refresh. Bumps the load generation so any
/// still-in-flight older refresh resolves stale and is dropped.
pub fn spawn_load_stories(app: &mut App, tx: &mpsc::Sender<AppEvent>) -> JoinHandle<()> {
    app.load_generation += 1;
    let generation = app.load_generation;
    let client = app.store.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let tx_panic = tx.clone();
        match catch_task_panic(async {
            let result = client.list().await;
            if let Err(e) = tx.send(AppEvent::StoriesLoaded { generation, result }).await {
                tracing::warn!(error = %e, event = "StoriesLoaded", "Channel send failed (receiver dropped)");
            }
        })
        .await
        {
            Ok(()) => {}
            Err(error) => {
                let _ = tx_panic
                    .send(AppEvent::TaskPanicked { task: "load_stories", error })
                    .await;
            }
        }
    })
}

/// Spawn a background create for an already-validated submission.
pub fn spawn_create_story(
    client: StoryClient,
    submission: NewStory,
    tx: mpsc::Sender<AppEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let tx_panic = tx.clone();
        match catch_task_panic(async {
            let result = client.create(&submission).await;
            if let Err(e) = tx.send(AppEvent::StoryCreated { result }).await {
                tracing::warn!(error = %e, event = "StoryCreated", "Channel send failed (receiver dropped)");
            }
        })
        .await
        {
            Ok(()) => {}
            Err(error) => {
                let _ = tx_panic
                    .send(AppEvent::TaskPanicked { task: "create_story", error })
                    .await;
            }
        }
    })
}

/// Spawn a background delete. The local copy is removed only once the
/// store acknowledges (or reports the id already gone).
pub fn spawn_delete_story(
    app: &App,
    id: StoryId,
    tx: &mpsc::Sender<AppEvent>,
) -> JoinHandle<()> {
    let client = app.store.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let tx_panic = tx.clone();
        match catch_task_panic(async {
            let result = client.delete(id).await;
            if let Err(e) = tx.send(AppEvent::StoryDeleteResolved { id, result }).await {
                tracing::warn!(error = %e, event = "StoryDeleteResolved", "Channel send failed (receiver dropped)");
            }
        })
        .await
        {
            Ok(()) => {}
            Err(error) => {
                let _ = tx_panic
                    .send(AppEvent::TaskPanicked { task: "delete_story", error })
                    .await;
            }
        }
    })
}

/// Spawn a background image download for a story, skipping the network
/// when the cache already holds it.
pub fn spawn_image_load(
    app: &mut App,
    story_id: StoryId,
    tx: &mpsc::Sender<AppEvent>,
) -> Option<JoinHandle<()>> {
    if app.images.contains(story_id) {
        tracing::debug!(story_id, "Image already cached, skipping load");
        return None;
    }
    let client = app.store.clone();
    let tx = tx.clone();
    Some(tokio::spawn(async move {
        let tx_panic = tx.clone();
        match catch_task_panic(async {
            let result = client.fetch_image(story_id).await;
            if let Err(e) = tx.send(AppEvent::ImageLoaded { story_id, result }).await {
                tracing::warn!(error = %e, event = "ImageLoaded", "Channel send failed (receiver dropped)");
            }
        })
        .await
        {
            Ok(()) => {}
            Err(error) => {
                let _ = tx_panic
                    .send(AppEvent::TaskPanicked { task: "image_load", error })
                    .await;
            }
        }
    }))
}
