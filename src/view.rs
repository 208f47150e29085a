//! View composition: the one place that combines the grouping index, the
//! selection state, the search filter, and the draft into what the
//! presentation layer renders.
//!
//! `compose` is a pure function of its inputs: calling it twice with the
//! same state yields structurally equal output, which is what lets the
//! embedding UI diff view models cheaply.

use crate::app::{App, DraftPlacement, Mode};
use crate::group::{Coordinate, GroupingIndex, LocationKey, Marker};
use crate::search::matches_query;
use crate::store::{Story, StoryId};

// ============================================================================
// View Model
// ============================================================================

/// A row of the sidebar's Locations list.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationRow {
    pub key: LocationKey,
    /// Display label, coordinates rounded to three decimals.
    pub label: String,
}

/// What the sidebar shows.
#[derive(Debug, Clone, PartialEq)]
pub enum SidebarContent {
    /// Sidebar is closed.
    Hidden,
    /// Creating, but no location picked yet: prompt to click the map.
    DraftPrompt,
    /// Creating with a chosen location: the story form.
    DraftForm { location: Coordinate },
    /// Browsing or filtered: the visible story ids, in collection order,
    /// after search ∩ selection.
    StoryList { story_ids: Vec<StoryId> },
}

/// Everything the presentation layer needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    /// One marker per occupied location, first-seen order.
    pub markers: Vec<Marker>,
    /// The in-progress draft pin, if a location has been picked.
    pub temp_marker: Option<Coordinate>,
    /// The marker to visually distinguish, present iff location-filtered.
    pub highlighted_marker: Option<LocationKey>,
    /// The sidebar's Locations list, one row per marker.
    pub locations: Vec<LocationRow>,
    pub sidebar: SidebarContent,
}

// ============================================================================
// Composition
// ============================================================================

/// Compose the view model from the engine's state.
///
/// The visible story list is the search-filtered collection intersected
/// with the selected ids when a selection exists; an empty selection means
/// no restriction. In Creating mode the list is replaced by the draft form
/// (or the click-the-map prompt while no location is chosen).
pub fn compose(
    stories: &[Story],
    mode: Mode,
    selected_story_ids: &[StoryId],
    search_query: &str,
    draft: &DraftPlacement,
    sidebar_open: bool,
) -> ViewModel {
    let index = GroupingIndex::from_stories(stories);
    let markers = index.markers();
    let locations = markers
        .iter()
        .map(|m| LocationRow {
            key: m.key,
            label: format!("{:.3}, {:.3}", m.coordinate.lat, m.coordinate.lng),
        })
        .collect();

    let highlighted_marker = match mode {
        Mode::LocationFiltered { key } => Some(key),
        Mode::Browsing | Mode::Creating => None,
    };

    let sidebar = if !sidebar_open {
        SidebarContent::Hidden
    } else if mode == Mode::Creating {
        match draft.candidate_if_active() {
            Some(location) => SidebarContent::DraftForm { location },
            None => SidebarContent::DraftPrompt,
        }
    } else {
        let story_ids = stories
            .iter()
            .filter(|s| matches_query(s, search_query))
            .filter(|s| selected_story_ids.is_empty() || selected_story_ids.contains(&s.id))
            .map(|s| s.id)
            .collect();
        SidebarContent::StoryList { story_ids }
    };

    ViewModel {
        markers,
        temp_marker: draft.candidate_if_active(),
        highlighted_marker,
        locations,
        sidebar,
    }
}

impl App {
    /// Compose the current frame's view model.
    pub fn view_model(&self) -> ViewModel {
        compose(
            &self.stories,
            self.mode,
            &self.selected_story_ids,
            &self.search_query,
            &self.draft,
            self.sidebar_open,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn story(id: StoryId, lat: f64, lng: f64, title: &str, description: &str) -> Story {
        Story {
            id,
            title: title.to_string(),
            description: description.to_string(),
            lat,
            lng,
            timestamp: Utc::now(),
        }
    }

    fn browsing() -> (Mode, Vec<StoryId>, DraftPlacement) {
        (Mode::Browsing, Vec::new(), DraftPlacement::default())
    }

    #[test]
    fn test_compose_is_referentially_transparent() {
        let stories = vec![
            story(1, 10.0, 20.0, "Park", "bench"),
            story(2, 10.0, 20.0, "Pond", "ducks"),
            story(3, 5.0, 5.0, "Hill", "view"),
        ];
        let mode = Mode::LocationFiltered { key: LocationKey::new(10.0, 20.0) };
        let selected = vec![1, 2];
        let draft = DraftPlacement::default();

        let first = compose(&stories, mode, &selected, "p", &draft, true);
        let second = compose(&stories, mode, &selected, "p", &draft, true);
        assert_eq!(first, second);
    }

    #[test]
    fn test_markers_one_per_location_in_first_seen_order() {
        let stories = vec![
            story(1, 10.0, 20.0, "a", ""),
            story(2, 5.0, 5.0, "b", ""),
            story(3, 10.0, 20.0, "c", ""),
        ];
        let (mode, selected, draft) = browsing();
        let vm = compose(&stories, mode, &selected, "", &draft, true);

        assert_eq!(vm.markers.len(), 2);
        assert_eq!(vm.markers[0].key, LocationKey::new(10.0, 20.0));
        assert_eq!(vm.markers[0].story_ids, vec![1, 3]);
        assert_eq!(vm.markers[1].key, LocationKey::new(5.0, 5.0));
    }

    #[test]
    fn test_location_rows_use_three_decimal_labels() {
        let stories = vec![story(1, 59.9127, 10.7461, "a", "")];
        let (mode, selected, draft) = browsing();
        let vm = compose(&stories, mode, &selected, "", &draft, true);

        assert_eq!(vm.locations.len(), 1);
        assert_eq!(vm.locations[0].label, "59.913, 10.746");
    }

    #[test]
    fn test_closed_sidebar_is_hidden() {
        let (mode, selected, draft) = browsing();
        let vm = compose(&[], mode, &selected, "", &draft, false);
        assert_eq!(vm.sidebar, SidebarContent::Hidden);
    }

    #[test]
    fn test_creating_without_location_prompts() {
        let mut draft = DraftPlacement::default();
        draft.begin();
        let vm = compose(&[], Mode::Creating, &[], "", &draft, true);
        assert_eq!(vm.sidebar, SidebarContent::DraftPrompt);
        assert_eq!(vm.temp_marker, None);
    }

    #[test]
    fn test_creating_with_location_shows_form_and_temp_marker() {
        let mut draft = DraftPlacement::default();
        draft.begin();
        draft.set_location(Coordinate { lat: 5.0, lng: 6.0 });

        let vm = compose(&[], Mode::Creating, &[], "", &draft, true);
        assert_eq!(
            vm.sidebar,
            SidebarContent::DraftForm { location: Coordinate { lat: 5.0, lng: 6.0 } }
        );
        assert_eq!(vm.temp_marker, Some(Coordinate { lat: 5.0, lng: 6.0 }));
    }

    #[test]
    fn test_list_intersects_search_with_selection() {
        let stories = vec![
            story(1, 1.0, 1.0, "Park bench", ""),
            story(2, 1.0, 1.0, "Park pond", ""),
            story(3, 2.0, 2.0, "Parking lot", ""),
        ];
        let mode = Mode::LocationFiltered { key: LocationKey::new(1.0, 1.0) };
        let selected = vec![1, 2];
        let draft = DraftPlacement::default();

        // Search matches 1, 2, 3; selection restricts to 1, 2.
        let vm = compose(&stories, mode, &selected, "park", &draft, true);
        assert_eq!(vm.sidebar, SidebarContent::StoryList { story_ids: vec![1, 2] });

        // Narrower search drops 2 ("pond" doesn't contain "bench").
        let vm = compose(&stories, mode, &selected, "bench", &draft, true);
        assert_eq!(vm.sidebar, SidebarContent::StoryList { story_ids: vec![1] });
    }

    #[test]
    fn test_empty_selection_means_no_restriction() {
        let stories = vec![
            story(1, 1.0, 1.0, "Park", ""),
            story(2, 2.0, 2.0, "Harbor", ""),
        ];
        let (mode, selected, draft) = browsing();
        let vm = compose(&stories, mode, &selected, "", &draft, true);
        assert_eq!(
            vm.sidebar,
            SidebarContent::StoryList { story_ids: vec![1, 2] }
        );
    }

    // Clearing the query restores the full list, still intersected with
    // the active selection.
    #[test]
    fn test_clearing_search_restores_selection_scoped_list() {
        let stories = vec![
            story(1, 1.0, 1.0, "Park", ""),
            story(2, 1.0, 1.0, "Harbor", ""),
            story(3, 2.0, 2.0, "Hill", ""),
        ];
        let mode = Mode::LocationFiltered { key: LocationKey::new(1.0, 1.0) };
        let selected = vec![1, 2];
        let draft = DraftPlacement::default();

        let narrowed = compose(&stories, mode, &selected, "harbor", &draft, true);
        assert_eq!(narrowed.sidebar, SidebarContent::StoryList { story_ids: vec![2] });

        let restored = compose(&stories, mode, &selected, "", &draft, true);
        assert_eq!(
            restored.sidebar,
            SidebarContent::StoryList { story_ids: vec![1, 2] }
        );
    }

    #[test]
    fn test_highlight_present_iff_filtered_mode() {
        let (_, selected, draft) = browsing();
        let key = LocationKey::new(4.0, 4.0);

        let filtered = compose(&[], Mode::LocationFiltered { key }, &selected, "", &draft, true);
        assert_eq!(filtered.highlighted_marker, Some(key));

        let browsing = compose(&[], Mode::Browsing, &selected, "", &draft, true);
        assert_eq!(browsing.highlighted_marker, None);

        let creating = compose(&[], Mode::Creating, &selected, "", &draft, true);
        assert_eq!(creating.highlighted_marker, None);
    }
}
