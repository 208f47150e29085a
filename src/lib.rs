//! Embedded engine for a map-based story journal.
//!
//! Users drop geotagged stories (title, description, photo) on a map and
//! browse them grouped by location. This crate owns the logic under that
//! UI: clustering stories that share a coordinate into markers, keeping
//! map markers, the highlighted marker, and the sidebar list mutually
//! consistent across create/select/search/delete, and reconciling the
//! local collection with the remote story service.
//!
//! The presentation layer feeds user interactions into [`App`]'s
//! event-injection methods, drains store completions through
//! [`handle_app_event`], and renders [`App::view_model`] each frame. The
//! crate draws nothing and owns no process; it is a library embedded in
//! whatever shell hosts the map.

pub mod app;
pub mod config;
pub mod events;
pub mod group;
pub mod images;
pub mod search;
pub mod store;
pub mod view;

pub use app::{App, DraftPlacement, Mode};
pub use config::{Config, ConfigError};
pub use events::{
    handle_app_event, spawn_delete_story, spawn_image_load, spawn_load_stories, submit_story,
    AppEvent,
};
pub use group::{Coordinate, GroupingIndex, LocationKey, Marker};
pub use images::ImageCache;
pub use search::{filter_stories, matches_query};
pub use store::{ImageUpload, NewStory, Story, StoreError, StoryClient, StoryId, ValidationError};
pub use view::{compose, LocationRow, SidebarContent, ViewModel};
