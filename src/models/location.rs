//! Campus location model and the fixed set of location buckets.

use serde::{Deserialize, Serialize};

/// One of the six fixed location categories. Not user-extensible.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CategoryBucket {
    Academic,
    Dining,
    #[serde(alias = "clinic", alias = "hospital")]
    Health,
    Library,
    #[serde(alias = "sports_facility")]
    Sports,
    #[serde(alias = "student-center")]
    StudentCenter,
}

impl CategoryBucket {
    /// Every bucket, in the order directory search concatenates them.
    pub const SEARCH_ORDER: [CategoryBucket; 6] = [
        CategoryBucket::Academic,
        CategoryBucket::Library,
        CategoryBucket::Dining,
        CategoryBucket::Sports,
        CategoryBucket::StudentCenter,
        CategoryBucket::Health,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryBucket::Academic => "academic",
            CategoryBucket::Dining => "dining",
            CategoryBucket::Health => "health",
            CategoryBucket::Library => "library",
            CategoryBucket::Sports => "sports",
            CategoryBucket::StudentCenter => "student_center",
        }
    }

    /// Parse a storage slug. Also accepts the building types older admin
    /// screens wrote for health and sports records.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "academic" => Some(CategoryBucket::Academic),
            "dining" => Some(CategoryBucket::Dining),
            "health" | "clinic" | "hospital" => Some(CategoryBucket::Health),
            "library" => Some(CategoryBucket::Library),
            "sports" | "sports_facility" => Some(CategoryBucket::Sports),
            "student_center" | "student-center" => Some(CategoryBucket::StudentCenter),
            _ => None,
        }
    }

    /// Display label attached to search results.
    pub fn label(&self) -> &'static str {
        match self {
            CategoryBucket::Academic => "Academic Buildings",
            CategoryBucket::Dining => "Dining Halls",
            CategoryBucket::Health => "Health Services",
            CategoryBucket::Library => "Libraries",
            CategoryBucket::Sports => "Sports Facilities",
            CategoryBucket::StudentCenter => "Student Centers",
        }
    }
}

impl std::fmt::Display for CategoryBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A physical place on campus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    pub bucket: CategoryBucket,
    pub name: String,
    pub description: String,
    pub building: String,
    pub opening_hours: String,
    pub image: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
}

/// Location form as posted. Every field is optional on the wire so a
/// missing or unknown value reaches validation instead of the extractor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocationPayload {
    pub bucket: String,
    pub name: String,
    pub description: String,
    pub building: String,
    pub opening_hours: String,
    pub image: String,
    pub tags: Vec<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// A validated location write, as the repository stores it.
#[derive(Debug, Clone)]
pub struct SaveLocationRequest {
    pub bucket: CategoryBucket,
    pub name: String,
    pub description: String,
    pub building: String,
    pub opening_hours: String,
    pub image: String,
    pub tags: Vec<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}
