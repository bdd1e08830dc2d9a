//! Per-category text and tag filtering.

use crate::models::Location;

/// Locations whose name, description or building contains `search_term`
/// (case-insensitive) and that carry every tag in `selected_tags`.
/// An empty term or an empty tag selection matches everything.
pub fn filter(locations: &[Location], search_term: &str, selected_tags: &[String]) -> Vec<Location> {
    let needle = search_term.to_lowercase();

    locations
        .iter()
        .filter(|location| {
            let matches_search = location.name.to_lowercase().contains(&needle)
                || location.description.to_lowercase().contains(&needle)
                || location.building.to_lowercase().contains(&needle);

            let matches_tags = selected_tags.iter().all(|tag| location.tags.contains(tag));

            matches_search && matches_tags
        })
        .cloned()
        .collect()
}

/// Every tag used by any location, de-duplicated, in first-seen order.
pub fn all_tags(locations: &[Location]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in locations.iter().flat_map(|l| l.tags.iter()) {
        if !tags.contains(tag) {
            tags.push(tag.clone());
        }
    }
    tags
}

/// Select `tag` if it is not selected, deselect it otherwise.
pub fn toggle_tag(selected: &mut Vec<String>, tag: &str) {
    match selected.iter().position(|t| t == tag) {
        Some(idx) => {
            selected.remove(idx);
        }
        None => selected.push(tag.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CategoryBucket;

    fn location(id: &str, name: &str, building: &str, tags: &[&str]) -> Location {
        Location {
            id: id.to_string(),
            bucket: CategoryBucket::Dining,
            name: name.to_string(),
            description: format!("{} on campus", name),
            building: building.to_string(),
            opening_hours: String::new(),
            image: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            latitude: None,
            longitude: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn sample() -> Vec<Location> {
        vec![
            location("1", "Commons Cafe", "Union", &["Dining", "Coffee"]),
            location("2", "Night Owl", "West Hall", &["Late Night"]),
            location("3", "Green Plate", "Union", &["Dining", "Vegan", "Coffee"]),
        ]
    }

    fn ids(locations: &[Location]) -> Vec<&str> {
        locations.iter().map(|l| l.id.as_str()).collect()
    }

    #[test]
    fn test_empty_filters_match_everything() {
        assert_eq!(ids(&filter(&sample(), "", &[])), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_tag_filter_ignores_empty_search() {
        let selected = vec!["Dining".to_string()];
        assert_eq!(ids(&filter(&sample(), "", &selected)), vec!["1", "3"]);
    }

    #[test]
    fn test_tags_are_and_across_selection() {
        let selected = vec!["Dining".to_string(), "Vegan".to_string()];
        assert_eq!(ids(&filter(&sample(), "", &selected)), vec!["3"]);

        let selected = vec!["Vegan".to_string(), "Late Night".to_string()];
        assert!(filter(&sample(), "", &selected).is_empty());
    }

    #[test]
    fn test_search_checks_name_description_and_building() {
        assert_eq!(ids(&filter(&sample(), "OWL", &[])), vec!["2"]);
        assert_eq!(ids(&filter(&sample(), "union", &[])), vec!["1", "3"]);
        assert_eq!(ids(&filter(&sample(), "on campus", &[])), vec!["1", "2", "3"]);

        let selected = vec!["Coffee".to_string()];
        assert_eq!(ids(&filter(&sample(), "green", &selected)), vec!["3"]);
    }

    #[test]
    fn test_all_tags_first_seen_order() {
        assert_eq!(
            all_tags(&sample()),
            vec!["Dining", "Coffee", "Late Night", "Vegan"]
        );
        assert!(all_tags(&[]).is_empty());
    }

    #[test]
    fn test_toggle_tag() {
        let mut selected = Vec::new();
        toggle_tag(&mut selected, "Dining");
        toggle_tag(&mut selected, "Vegan");
        assert_eq!(selected, vec!["Dining", "Vegan"]);

        toggle_tag(&mut selected, "Dining");
        assert_eq!(selected, vec!["Vegan"]);
    }
}
