//! Free-text story filtering.
//!
//! Search is independent of grouping and selection: it derives a filtered
//! view of the collection, and the view composer intersects that with the
//! active selection at display time.

use crate::store::Story;

/// True if the story's title or description contains `query` as a
/// case-insensitive substring. An empty query matches everything.
pub fn matches_query(story: &Story, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let needle = query.to_lowercase();
    story.title.to_lowercase().contains(&needle)
        || story.description.to_lowercase().contains(&needle)
}

/// The subset of `stories` matching `query`, in collection order.
pub fn filter_stories<'a>(query: &str, stories: &'a [Story]) -> Vec<&'a Story> {
    stories.iter().filter(|s| matches_query(s, query)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoryId;
    use chrono::Utc;
    use proptest::prelude::*;

    fn story(id: StoryId, title: &str, description: &str) -> Story {
        Story {
            id,
            title: title.to_string(),
            description: description.to_string(),
            lat: 0.0,
            lng: 0.0,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_empty_query_is_identity() {
        let stories = vec![story(1, "Park", "Bench"), story(2, "Harbor", "Boats")];
        let filtered = filter_stories("", &stories);
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_case_insensitive_title_match() {
        let stories = vec![story(1, "Old Park", "x"), story(2, "Harbor", "x")];
        let filtered = filter_stories("pArK", &stories);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, 1);
    }

    #[test]
    fn test_description_is_searched_too() {
        let stories = vec![story(1, "x", "We fed the ducks"), story(2, "x", "y")];
        let filtered = filter_stories("ducks", &stories);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, 1);
    }

    #[test]
    fn test_no_match_yields_empty() {
        let stories = vec![story(1, "Park", "Bench")];
        assert!(filter_stories("zeppelin", &stories).is_empty());
    }

    #[test]
    fn test_collection_order_preserved() {
        let stories = vec![
            story(3, "park one", "x"),
            story(1, "other", "park"),
            story(2, "Park two", "x"),
        ];
        let ids: Vec<StoryId> = filter_stories("park", &stories).iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    proptest! {
        // Extending a query never widens the result set: the matches for
        // a longer query are a subset of the matches for any prefix of it.
        #[test]
        fn prop_search_is_monotonic(
            titles in prop::collection::vec("[a-zA-Z ]{0,12}", 0..20),
            query in "[a-z]{0,6}",
            extra in "[a-z]{1,3}",
        ) {
            let stories: Vec<Story> = titles
                .iter()
                .enumerate()
                .map(|(i, t)| story(i as StoryId, t, ""))
                .collect();

            let longer = format!("{}{}", query, extra);
            let short_ids: Vec<StoryId> =
                filter_stories(&query, &stories).iter().map(|s| s.id).collect();
            let long_ids: Vec<StoryId> =
                filter_stories(&longer, &stories).iter().map(|s| s.id).collect();

            prop_assert!(long_ids.iter().all(|id| short_ids.contains(id)));
        }

        // Matching never depends on query case.
        #[test]
        fn prop_search_case_insensitive(
            titles in prop::collection::vec("[a-zA-Z]{0,10}", 0..20),
            query in "[a-zA-Z]{1,5}",
        ) {
            let stories: Vec<Story> = titles
                .iter()
                .enumerate()
                .map(|(i, t)| story(i as StoryId, t, ""))
                .collect();

            let lower: Vec<StoryId> =
                filter_stories(&query.to_lowercase(), &stories).iter().map(|s| s.id).collect();
            let upper: Vec<StoryId> =
                filter_stories(&query.to_uppercase(), &stories).iter().map(|s| s.id).collect();

            prop_assert_eq!(lower, upper);
        }
    }
}
