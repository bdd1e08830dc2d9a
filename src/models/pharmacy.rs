//! Pharmacy and per-pharmacy stock models.

use serde::{Deserialize, Serialize};

/// A campus pharmacy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pharmacy {
    pub id: String,
    pub name: String,
    pub location: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub open_hours: String,
    pub latitude: f64,
    pub longitude: f64,
    pub available: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for creating or replacing a pharmacy.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePharmacyRequest {
    pub name: String,
    pub location: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub open_hours: String,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

/// Quantity of one medicine held by one pharmacy, joined with the medicine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StockItem {
    pub medicine_id: String,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub quantity: i64,
}

/// Request body for setting a pharmacy's quantity of a medicine.
#[derive(Debug, Clone, Deserialize)]
pub struct SetStockRequest {
    pub quantity: i64,
}
