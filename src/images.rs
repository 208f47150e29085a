//! In-memory cache for lazily-loaded story images.
//!
//! List responses exclude the image payload; images are fetched per-story
//! through `StoryClient::fetch_image` and kept here so re-selecting a
//! marker doesn't refetch. The cache is bounded LRU, so a long browsing
//! session evicts the least recently shown images first.

use crate::store::StoryId;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Bounded image cache keyed by story id. Bytes are `Arc`-shared so a hit
/// hands out a cheap handle rather than a copy.
pub struct ImageCache {
    cache: LruCache<StoryId, Arc<[u8]>>,
}

impl ImageCache {
    /// `capacity` of zero is clamped to one entry.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(capacity),
        }
    }

    /// Look up an image, promoting it to most-recently-used.
    pub fn get(&mut self, id: StoryId) -> Option<Arc<[u8]>> {
        let hit = self.cache.get(&id).cloned();
        tracing::debug!(story_id = id, hit = hit.is_some(), "Image cache lookup");
        hit
    }

    /// Insert (or replace) an image, evicting the LRU entry when full.
    pub fn insert(&mut self, id: StoryId, bytes: Vec<u8>) {
        self.cache.put(id, Arc::from(bytes.into_boxed_slice()));
    }

    /// Drop a story's image, e.g. after the story is deleted.
    pub fn remove(&mut self, id: StoryId) {
        self.cache.pop(&id);
    }

    pub fn contains(&self, id: StoryId) -> bool {
        self.cache.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
