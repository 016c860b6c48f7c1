use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use super::reservation::Reservation;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    pub id: i64,
    pub name: String,
    pub plate: String,
    pub brand: String,
    pub year: i32,
    /// Daily rental price.
    pub price: f64,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservations: Option<Vec<Reservation>>,
}

/// One page of the car listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CarPage {
    pub data: Vec<Car>,
    pub total: u64,
}

/// Filters accepted by the car listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CarListQuery {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

fn default_page() -> u32 { 1 }
fn default_limit() -> u32 { 10 }

impl Default for CarListQuery {
    fn default() -> Self {
        Self {
            name: None,
            page: default_page(),
            limit: default_limit(),
            start_date: None,
            end_date: None,
        }
    }
}

impl CarListQuery {
    /// Query string pairs in the order the backend expects them.
    /// Empty names are dropped.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            pairs.push(("name".to_string(), name.to_string()));
        }
        if let Some(start) = self.start_date {
            pairs.push(("startDate".to_string(), start.to_rfc3339()));
        }
        if let Some(end) = self.end_date {
            pairs.push(("endDate".to_string(), end.to_rfc3339()));
        }
        pairs.push(("page".to_string(), self.page.to_string()));
        pairs.push(("limit".to_string(), self.limit.to_string()));
        pairs
    }
}
