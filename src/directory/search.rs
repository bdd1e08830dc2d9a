//! Cross-category name search.

use serde::Serialize;

use super::Buckets;
use crate::models::Location;

/// A location tagged with the display label of the bucket it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    #[serde(flatten)]
    pub location: Location,
    pub category: String,
}

/// Concatenate every bucket in search order, labelling each location with its
/// bucket. Order within a bucket is preserved.
pub fn flatten(buckets: &Buckets) -> Vec<SearchResult> {
    buckets
        .iter()
        .flat_map(|(bucket, locations)| {
            locations.iter().map(move |location| SearchResult {
                location: location.clone(),
                category: bucket.label().to_string(),
            })
        })
        .collect()
}

/// Case-insensitive substring match on location names. A blank query matches
/// nothing.
pub fn search(buckets: &Buckets, query: &str) -> Vec<SearchResult> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    flatten(buckets)
        .into_iter()
        .filter(|result| result.location.name.to_lowercase().contains(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CategoryBucket;

    fn location(id: &str, bucket: CategoryBucket, name: &str) -> Location {
        Location {
            id: id.to_string(),
            bucket,
            name: name.to_string(),
            description: String::new(),
            building: String::new(),
            opening_hours: String::new(),
            image: String::new(),
            tags: Vec::new(),
            latitude: None,
            longitude: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn sample() -> Buckets {
        let mut buckets = Buckets::default();
        buckets.set(
            CategoryBucket::Health,
            vec![location("h1", CategoryBucket::Health, "Campus Clinic")],
        );
        buckets.set(
            CategoryBucket::Academic,
            vec![
                location("a1", CategoryBucket::Academic, "Bio Lab"),
                location("a2", CategoryBucket::Academic, "Library Science Hall"),
            ],
        );
        buckets.set(
            CategoryBucket::Library,
            vec![location("l1", CategoryBucket::Library, "Main Library")],
        );
        buckets
    }

    #[test]
    fn test_flatten_uses_search_order_and_labels() {
        let flat = flatten(&sample());
        let ids: Vec<_> = flat.iter().map(|r| r.location.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a2", "l1", "h1"]);
        assert_eq!(flat[0].category, "Academic Buildings");
        assert_eq!(flat[2].category, "Libraries");
        assert_eq!(flat[3].category, "Health Services");
    }

    #[test]
    fn test_blank_query_returns_nothing() {
        assert!(search(&sample(), "").is_empty());
        assert!(search(&sample(), "   ").is_empty());
    }

    #[test]
    fn test_search_is_case_insensitive_on_name_only() {
        let mut buckets = Buckets::default();
        buckets.set(
            CategoryBucket::Library,
            vec![location("l1", CategoryBucket::Library, "Main Library")],
        );
        buckets.set(
            CategoryBucket::Academic,
            vec![location("a1", CategoryBucket::Academic, "Bio Lab")],
        );

        let results = search(&buckets, "lib");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].location.name, "Main Library");
        assert_eq!(results[0].category, "Libraries");

        let results = search(&buckets, "  LAB ");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].location.id, "a1");
    }

    #[test]
    fn test_results_keep_flatten_order() {
        let results = search(&sample(), "library");
        let ids: Vec<_> = results.iter().map(|r| r.location.id.as_str()).collect();
        assert_eq!(ids, vec!["a2", "l1"]);
    }

    #[test]
    fn test_serialized_shape_carries_category_label() {
        let results = search(&sample(), "clinic");
        let value = serde_json::to_value(&results[0]).unwrap();
        assert_eq!(value["name"], "Campus Clinic");
        assert_eq!(value["bucket"], "health");
        assert_eq!(value["category"], "Health Services");
    }
}
