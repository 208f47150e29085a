use crate::config::Config;
use crate::group::{Coordinate, GroupingIndex, LocationKey};
use crate::images::ImageCache;
use crate::store::{Story, StoryClient, StoryId};
use std::borrow::Cow;
use std::sync::Arc;
use tokio::time::Instant;

// ============================================================================
// Selection Mode
// ============================================================================

/// Current selection mode.
///
/// The original UI tracked the creating flag, highlighted marker, and
/// selected location as independent pieces of state, which allowed
/// contradictory combinations (a highlight with no filter, a draft while
/// filtered). Folding them into one tagged mode makes those states
/// unrepresentable: the highlighted marker is *derived* from the mode, so
/// "highlight set iff location-filtered" holds by construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mode {
    /// Resting state: the sidebar lists all stories passing the search
    /// filter, intersected with any lingering selection.
    Browsing,
    /// One location's marker is highlighted and the sidebar is scoped to
    /// the selected stories.
    LocationFiltered { key: LocationKey },
    /// A new story is being composed; the sidebar shows the draft form.
    Creating,
}

// ============================================================================
// Draft Placement
// ============================================================================

/// Ephemeral state of an in-progress new story: whether a draft is being
/// composed, and the map coordinate picked for it so far.
///
/// Exists only between `begin()` and `cancel()`/`commit()`. Reading the
/// candidate while inactive is a programming error, not a user-facing
/// failure; it trips a debug assertion.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DraftPlacement {
    active: bool,
    candidate: Option<Coordinate>,
}

impl DraftPlacement {
    /// Activate a fresh draft with no coordinate chosen yet.
    pub fn begin(&mut self) {
        self.active = true;
        self.candidate = None;
    }

    /// Record the candidate coordinate. Valid only while active; a call on
    /// an inactive draft is ignored (and asserts in debug builds).
    pub fn set_location(&mut self, coord: Coordinate) {
        debug_assert!(self.active, "set_location on inactive draft");
        if self.active {
            self.candidate = Some(coord);
        }
    }

    /// Discard the draft.
    pub fn cancel(&mut self) {
        self.active = false;
        self.candidate = None;
    }

    /// Deactivate after a successful submission. Same effect as `cancel`;
    /// the distinction is for call sites.
    pub fn commit(&mut self) {
        self.cancel();
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The chosen coordinate of an active draft.
    pub fn candidate(&self) -> Option<Coordinate> {
        debug_assert!(self.active, "candidate read on inactive draft");
        self.candidate
    }

    /// The candidate if a draft is active, `None` otherwise. Safe to call
    /// from view composition regardless of draft state.
    pub fn candidate_if_active(&self) -> Option<Coordinate> {
        if self.active {
            self.candidate
        } else {
            None
        }
    }
}

// ============================================================================
// Application State
// ============================================================================

/// Central engine state.
///
/// All transition methods are synchronous and atomic with respect to each
/// other: the embedding event loop calls them between turns, and background
/// store tasks never touch `App` directly, they report through `AppEvent`.
pub struct App {
    /// Story service client; cloned into background tasks.
    pub store: StoryClient,

    // Data
    /// Cached copy of the store's collection, wrapped in Arc so background
    /// snapshots are O(1). Mutations go through `Arc::make_mut`.
    pub stories: Arc<Vec<Story>>,

    // Selection
    pub mode: Mode,
    /// Ordered set of selected story ids. Survives a sidebar close (the
    /// mode reverts to Browsing but the scoped list is kept for reopening).
    pub selected_story_ids: Vec<StoryId>,

    // Draft
    pub draft: DraftPlacement,

    // Search
    pub search_query: String,

    // UI State
    pub sidebar_open: bool,

    /// Transient status message with its creation time; expires after 3s.
    /// Cow avoids allocation for static literals.
    pub status_message: Option<(Cow<'static, str>, Instant)>,

    /// Generation counter for collection loads. A list response is applied
    /// only if its generation matches, so a slow refresh can never clobber
    /// a newer one.
    pub load_generation: u64,

    /// Lazily-loaded story images keyed by id.
    pub images: ImageCache,
}

impl App {
    pub fn new(store: StoryClient, config: &Config) -> Self {
        Self {
            store,
            stories: Arc::new(Vec::new()),
            mode: Mode::Browsing,
            selected_story_ids: Vec::new(),
            draft: DraftPlacement::default(),
            search_query: String::new(),
            sidebar_open: true,
            status_message: None,
            load_generation: 0,
            images: ImageCache::new(config.image_cache_entries),
        }
    }

    // ------------------------------------------------------------------
    // Derived accessors
    // ------------------------------------------------------------------

    /// The marker visually distinguished as selected, derived from the mode.
    pub fn highlighted_marker(&self) -> Option<LocationKey> {
        match self.mode {
            Mode::LocationFiltered { key } => Some(key),
            Mode::Browsing | Mode::Creating => None,
        }
    }

    /// Rebuild the grouping index for the current collection.
    pub fn grouped(&self) -> GroupingIndex {
        GroupingIndex::from_stories(&self.stories)
    }

    /// Bounds-checked lookup by id.
    pub fn story(&self, id: StoryId) -> Option<&Story> {
        self.stories.iter().find(|s| s.id == id)
    }

    // ------------------------------------------------------------------
    // Event-injection transitions
    // ------------------------------------------------------------------

    /// Start composing a new story: clear highlight and selection, reset
    /// the draft coordinate, open the sidebar.
    pub fn add_story_requested(&mut self) {
        self.mode = Mode::Creating;
        self.selected_story_ids.clear();
        self.draft.begin();
        self.sidebar_open = true;
    }

    /// Abandon the draft and return to browsing.
    pub fn cancel_create(&mut self) {
        if self.mode == Mode::Creating {
            self.mode = Mode::Browsing;
            self.draft.cancel();
        }
    }

    /// A click on open map. Effective only while creating: it picks (or
    /// re-picks) the draft's candidate location.
    pub fn map_clicked(&mut self, coord: Coordinate) {
        if self.mode != Mode::Creating {
            return;
        }
        self.draft.set_location(coord);
    }

    /// A click on an existing marker.
    ///
    /// While creating, the clicked marker becomes the draft's location:
    /// "click the map to pick a spot" extended to occupied spots, so a new
    /// story can join an existing group. Otherwise the marker's whole group
    /// becomes the selection and its key the highlight.
    pub fn marker_clicked(&mut self, coord: Coordinate) {
        if self.mode == Mode::Creating {
            self.draft.set_location(coord);
            return;
        }
        let key = LocationKey::from(coord);
        self.selected_story_ids = self
            .grouped()
            .group(&key)
            .map(|ids| ids.to_vec())
            .unwrap_or_default();
        self.mode = Mode::LocationFiltered { key };
        self.sidebar_open = true;
    }

    /// A click on a story card in the sidebar list. Narrows the selection
    /// to exactly that story (a marker click selects the whole group; a
    /// card click singles one member out) and highlights its marker.
    pub fn story_card_clicked(&mut self, id: StoryId) {
        let Some(story) = self.story(id) else {
            tracing::debug!(story_id = id, "Card click for unknown story ignored");
            return;
        };
        let key = LocationKey::new(story.lat, story.lng);
        self.mode = Mode::LocationFiltered { key };
        self.selected_story_ids = vec![id];
        self.sidebar_open = true;
        self.draft.cancel();
    }

    /// A click on a row of the sidebar's Locations list: same as clicking
    /// that marker, plus the search box is cleared so the full group shows.
    pub fn location_row_clicked(&mut self, key: LocationKey) {
        self.search_query.clear();
        self.marker_clicked(key.coordinate());
    }

    /// Apply a store-confirmed create. Appends to the collection; if the
    /// draft flow is active, lands the user on the new story's location
    /// with the whole group (siblings included) selected.
    ///
    /// Only called once the store has acknowledged the create; there is no
    /// optimistic insert.
    pub fn story_saved(&mut self, story: Story) {
        let was_creating = self.mode == Mode::Creating;
        let key = LocationKey::new(story.lat, story.lng);
        Arc::make_mut(&mut self.stories).push(story);

        if was_creating {
            self.selected_story_ids = self
                .grouped()
                .group(&key)
                .map(|ids| ids.to_vec())
                .unwrap_or_default();
            self.mode = Mode::LocationFiltered { key };
            self.draft.commit();
        }
    }

    /// Apply a store-confirmed delete: drop the story from the collection
    /// and from the selection. The mode is deliberately left unchanged even
    /// if the selection empties; the sidebar then shows an empty list.
    pub fn story_deleted(&mut self, id: StoryId) {
        Arc::make_mut(&mut self.stories).retain(|s| s.id != id);
        self.selected_story_ids.retain(|sid| *sid != id);
        self.images.remove(id);
    }

    /// Toggle sidebar visibility. Closing while location-filtered clears
    /// the highlight (mode reverts to Browsing) but keeps the selected ids,
    /// so reopening shows the same scoped list without a highlighted marker.
    pub fn toggle_sidebar(&mut self) {
        if self.sidebar_open {
            if let Mode::LocationFiltered { .. } = self.mode {
                self.mode = Mode::Browsing;
            }
        }
        self.sidebar_open = !self.sidebar_open;
    }

    /// Update the free-text search query. No mode change.
    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    // ------------------------------------------------------------------
    // Collection reconciliation
    // ------------------------------------------------------------------

    /// Replace the cached collection with a fresh list response and prune
    /// the selection of ids that no longer exist. Mode is unchanged: a
    /// filtered location whose stories all vanished shows an empty list.
    pub fn replace_stories(&mut self, stories: Vec<Story>) {
        self.stories = Arc::new(stories);
        let stories = Arc::clone(&self.stories);
        self.selected_story_ids
            .retain(|id| stories.iter().any(|s| s.id == *id));
    }

    // ------------------------------------------------------------------
    // Status messages
    // ------------------------------------------------------------------

    /// Set a transient status message (auto-expires after 3 seconds).
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clear the status message if older than 3 seconds. Returns true if a
    /// message was actually cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed().as_secs() >= 3 {
                self.status_message = None;
                return true;
            }
        }
        false
    }
}
