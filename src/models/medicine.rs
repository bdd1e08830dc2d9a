//! Medicine inventory model.

use serde::{Deserialize, Serialize};

/// Stock classification shown next to every inventory row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StockStatus {
    #[serde(rename = "In Stock")]
    InStock,
    #[serde(rename = "Low Stock")]
    LowStock,
    #[serde(rename = "Out of Stock")]
    OutOfStock,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::InStock => "In Stock",
            StockStatus::LowStock => "Low Stock",
            StockStatus::OutOfStock => "Out of Stock",
        }
    }
}

/// A medicine in the central inventory. `status` is derived from `stock`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medicine {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub stock: i64,
    pub status: StockStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for creating or replacing a medicine.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveMedicineRequest {
    pub name: String,
    pub category: String,
    pub price: f64,
    pub stock: i64,
}
