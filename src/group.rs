//! Location grouping: clustering stories that share an exact coordinate
//! into a single marker.
//!
//! Grouping is recomputed from scratch on every collection change. The
//! collections involved are small (a personal story journal), so the O(n)
//! rebuild is cheaper than maintaining an incremental index.

use crate::store::{Story, StoryId};
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// Coordinates and Keys
// ============================================================================

/// A point on the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

/// Exact-match coordinate identity used to cluster stories into one marker.
///
/// Two stories are at the same location iff their lat/lng are bit-identical;
/// there is no proximity tolerance. Keys hash and compare on the raw `f64`
/// bits, which also makes `-0.0` and `0.0` distinct, matching the string-key
/// semantics of the story service's clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocationKey {
    lat_bits: u64,
    lng_bits: u64,
}

impl LocationKey {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat_bits: lat.to_bits(),
            lng_bits: lng.to_bits(),
        }
    }

    pub fn lat(&self) -> f64 {
        f64::from_bits(self.lat_bits)
    }

    pub fn lng(&self) -> f64 {
        f64::from_bits(self.lng_bits)
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            lat: self.lat(),
            lng: self.lng(),
        }
    }
}

impl From<Coordinate> for LocationKey {
    fn from(coord: Coordinate) -> Self {
        LocationKey::new(coord.lat, coord.lng)
    }
}

/// `"lat,lng"`, the wire/display form of a key.
impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat(), self.lng())
    }
}

// ============================================================================
// Markers
// ============================================================================

/// View-model grouping of stories sharing a LocationKey.
///
/// One marker exists per occupied key; `story_ids` is in collection order.
/// Markers are recomputed on every collection change, never mutated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub key: LocationKey,
    pub coordinate: Coordinate,
    pub story_ids: Vec<StoryId>,
}

// ============================================================================
// Grouping Index
// ============================================================================

/// Mapping from LocationKey to the stories pinned there.
///
/// Key order is first-seen order over the input collection, so marker order
/// is stable as long as the collection order is. Groups are non-empty by
/// construction: a key exists only because at least one story produced it.
#[derive(Debug, Clone, Default)]
pub struct GroupingIndex {
    keys: Vec<LocationKey>,
    groups: HashMap<LocationKey, Vec<StoryId>>,
}

impl GroupingIndex {
    /// Build the index from the current story collection. Pure and O(n).
    pub fn from_stories(stories: &[Story]) -> Self {
        let mut keys = Vec::new();
        let mut groups: HashMap<LocationKey, Vec<StoryId>> = HashMap::new();
        for story in stories {
            let key = LocationKey::new(story.lat, story.lng);
            groups
                .entry(key)
                .or_insert_with(|| {
                    keys.push(key);
                    Vec::new()
                })
                .push(story.id);
        }
        Self { keys, groups }
    }

    /// Keys in first-seen order.
    pub fn keys(&self) -> &[LocationKey] {
        &self.keys
    }

    /// Story ids at `key`, in collection order. `None` for unoccupied keys.
    pub fn group(&self, key: &LocationKey) -> Option<&[StoryId]> {
        self.groups.get(key).map(Vec::as_slice)
    }

    /// One marker per occupied key, in first-seen key order.
    pub fn markers(&self) -> Vec<Marker> {
        self.keys
            .iter()
            .map(|key| Marker {
                key: *key,
                coordinate: key.coordinate(),
                story_ids: self.groups[key].clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
