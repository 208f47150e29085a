mod client;
mod types;

pub use client::StoryClient;
pub use types::{ImageUpload, NewStory, Story, StoreError, StoryId, ValidationError};
