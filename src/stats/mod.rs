//! Dashboard statistics.
//!
//! The "previous period" values here are synthetic: each is the current value
//! scaled by a fixed per-metric multiplier. There is no historical log behind
//! them, and the figures must not be read as one.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::{CategoryBucket, NotificationType, StockItem, StockStatus};

/// Quantities at or below this count as low stock.
pub const LOW_STOCK_THRESHOLD: i64 = 10;

/// How many rows `PharmacyStats::popular_medicines` keeps.
const POPULAR_LIMIT: usize = 5;

/// Percentage change between a value and its baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Delta {
    pub percentage: String,
    pub is_increase: bool,
}

/// One dashboard tile.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatCard {
    pub title: String,
    pub value: i64,
    pub previous_value: i64,
    pub delta: Delta,
}

impl StatCard {
    pub fn new(title: impl Into<String>, value: i64, multiplier: f64) -> Self {
        let previous_value = synthetic_previous(value, multiplier);
        Self {
            title: title.into(),
            value,
            previous_value,
            delta: compute_delta(value, previous_value),
        }
    }
}

/// `((current - previous) / previous * 100)` to one decimal place. A zero
/// baseline yields `"0"` and no increase.
pub fn compute_delta(current: i64, previous: i64) -> Delta {
    if previous == 0 {
        return Delta {
            percentage: "0".to_string(),
            is_increase: false,
        };
    }

    let change = (current - previous) as f64 / previous as f64 * 100.0;
    let percentage = format!("{:.1}", round_half_away(change));
    let is_increase = percentage.parse::<f64>().map(|p| p > 0.0).unwrap_or(false);

    Delta {
        percentage,
        is_increase,
    }
}

/// Round to one decimal with ties away from zero. `{:.1}` alone rounds ties
/// to even, so 1.25 would print as "1.2" instead of "1.3".
fn round_half_away(value: f64) -> f64 {
    let scaled = (value * 10.0).abs();
    let mut rounded = scaled.floor();
    if scaled - rounded >= 0.5 {
        rounded += 1.0;
    }
    rounded.copysign(value) / 10.0
}

/// Placeholder baseline: `floor(current * multiplier)`.
pub fn synthetic_previous(current: i64, multiplier: f64) -> i64 {
    (current as f64 * multiplier).floor() as i64
}

pub fn stock_status(stock: i64) -> StockStatus {
    if stock <= 0 {
        StockStatus::OutOfStock
    } else if stock <= LOW_STOCK_THRESHOLD {
        StockStatus::LowStock
    } else {
        StockStatus::InStock
    }
}

/// Baseline multiplier per location bucket.
fn bucket_multiplier(bucket: CategoryBucket) -> f64 {
    match bucket {
        CategoryBucket::Academic => 0.9,
        CategoryBucket::Library => 0.95,
        CategoryBucket::Dining => 0.85,
        CategoryBucket::Sports => 1.1,
        CategoryBucket::StudentCenter => 0.92,
        CategoryBucket::Health => 0.9,
    }
}

/// Location counts per bucket for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_locations: i64,
    pub cards: Vec<StatCard>,
}

impl DashboardStats {
    /// Build the tiles from `(bucket, count)` pairs, in the order given.
    pub fn from_counts(counts: &[(CategoryBucket, i64)]) -> Self {
        let cards = counts
            .iter()
            .map(|(bucket, count)| StatCard::new(bucket.label(), *count, bucket_multiplier(*bucket)))
            .collect();

        Self {
            total_locations: counts.iter().map(|(_, count)| count).sum(),
            cards,
        }
    }
}

/// Medicine count for one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

/// Per-pharmacy inventory summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PharmacyStats {
    pub total_medicines: StatCard,
    pub in_stock: StatCard,
    pub out_of_stock: StatCard,
    pub low_stock: StatCard,
    pub popular_medicines: Vec<StockItem>,
    pub category_distribution: Vec<CategoryCount>,
}

impl PharmacyStats {
    pub fn from_stock(items: &[StockItem]) -> Self {
        let total = items.len() as i64;
        let in_stock = items.iter().filter(|i| i.quantity > 0).count() as i64;
        let out_of_stock = items.iter().filter(|i| i.quantity <= 0).count() as i64;
        let low_stock = items
            .iter()
            .filter(|i| stock_status(i.quantity) == StockStatus::LowStock)
            .count() as i64;

        let mut popular = items.to_vec();
        // Stable sort keeps name order among equal quantities
        popular.sort_by(|a, b| b.quantity.cmp(&a.quantity));
        popular.truncate(POPULAR_LIMIT);

        Self {
            total_medicines: StatCard::new("Total Medicines", total, 0.9),
            in_stock: StatCard::new("In Stock", in_stock, 0.95),
            out_of_stock: StatCard::new("Out of Stock", out_of_stock, 1.1),
            low_stock: StatCard::new("Low Stock", low_stock, 0.85),
            popular_medicines: popular,
            category_distribution: category_distribution(items),
        }
    }
}

/// Count of items per category, in first-seen order.
fn category_distribution(items: &[StockItem]) -> Vec<CategoryCount> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<CategoryCount> = Vec::new();

    for item in items {
        match positions.get(item.category.as_str()) {
            Some(&idx) => counts[idx].count += 1,
            None => {
                positions.insert(item.category.as_str(), counts.len());
                counts.push(CategoryCount {
                    category: item.category.clone(),
                    count: 1,
                });
            }
        }
    }

    counts
}

/// Notification raised when an inventory edit moves a medicine across a
/// stock threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct StockAlert {
    pub kind: NotificationType,
    pub title: &'static str,
    pub message: String,
}

/// Classify a stock change. At most one alert fires; the first matching
/// transition wins.
pub fn stock_alert(name: &str, previous: i64, new: i64) -> Option<StockAlert> {
    if previous > LOW_STOCK_THRESHOLD && new <= LOW_STOCK_THRESHOLD && new > 0 {
        Some(StockAlert {
            kind: NotificationType::Warning,
            title: "Low Stock Alert",
            message: format!("{} stock is now low ({} units).", name, new),
        })
    } else if previous > 0 && new <= 0 {
        Some(StockAlert {
            kind: NotificationType::Error,
            title: "Out of Stock Alert",
            message: format!("{} is now out of stock.", name),
        })
    } else if previous <= 0 && new > 0 {
        Some(StockAlert {
            kind: NotificationType::Success,
            title: "Stock Replenished",
            message: format!("{} is back in stock ({} units).", name, new),
        })
    } else if previous <= LOW_STOCK_THRESHOLD && new > LOW_STOCK_THRESHOLD {
        Some(StockAlert {
            kind: NotificationType::Success,
            title: "Stock Replenished",
            message: format!("{} stock has been replenished to {} units.", name, new),
        })
    } else {
        None
    }
}
