use serde::{Deserialize, Serialize};

use crate::branches::Branch;

/// Stock state of one weight entry at one branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    Available,
    LimitedStock,
    OutOfStock,
}

impl StockStatus {
    /// `true` for statuses worth alerting on.
    #[must_use]
    pub fn is_purchasable(self) -> bool {
        matches!(self, StockStatus::Available | StockStatus::LimitedStock)
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockStatus::Available => write!(f, "Available"),
            StockStatus::LimitedStock => write!(f, "Limited Stock"),
            StockStatus::OutOfStock => write!(f, "Out of Stock"),
        }
    }
}

/// One branch/weight lookup. Built per request from a registry entry.
#[derive(Debug, Clone, PartialEq)]
pub struct StockQuery {
    pub branch: Branch,
    /// Target bar weight in grams; `None` asks for every weight on the page.
    pub weight: Option<f64>,
}

impl StockQuery {
    #[must_use]
    pub fn new(branch: Branch, weight: Option<f64>) -> Self {
        Self { branch, weight }
    }

    /// Whether `weight_grams` satisfies this query's weight filter.
    #[must_use]
    pub fn accepts_weight(&self, weight_grams: f64) -> bool {
        self.weight
            .is_none_or(|target| (target - weight_grams).abs() < WEIGHT_EPSILON)
    }
}

/// Tolerance when comparing bar weights parsed from decimal strings.
pub const WEIGHT_EPSILON: f64 = 1e-6;

/// A single weight entry parsed from a branch's stock page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityRecord {
    pub branch_code: String,
    pub weight_grams: f64,
    /// Price in sen (1/100 IDR). `None` when the page shows no usable price.
    pub price_minor: Option<i64>,
    pub status: StockStatus,
}

impl AvailabilityRecord {
    /// Price in whole rupiah, truncating any sen.
    #[must_use]
    pub fn price_idr(&self) -> Option<i64> {
        self.price_minor.map(|p| p / 100)
    }
}
