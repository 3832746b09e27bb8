//! Branch ("butik") registry: which boutiques exist and how to reach them.
//!
//! The registry is built once at startup, either from the built-in table or
//! from a YAML file, and is read-only afterwards.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Fulfilment mode advertised in the site's location picker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchKind {
    #[default]
    Regular,
    PickupOnly,
    ShippingOnly,
}

impl std::fmt::Display for BranchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BranchKind::Regular => write!(f, "regular"),
            BranchKind::PickupOnly => write!(f, "pickup_only"),
            BranchKind::ShippingOnly => write!(f, "shipping_only"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub code: String,
    pub city: String,
    pub name: String,
    #[serde(default = "default_supports_shipping")]
    pub supports_shipping: bool,
    #[serde(default)]
    pub kind: BranchKind,
}

fn default_supports_shipping() -> bool {
    true
}

const LOCATION_PREFIX: &str = "BELM - ";

impl Branch {
    /// Builds a branch from a location-picker option.
    ///
    /// The label looks like `"BELM - Surabaya Darmo (Pengambilan Di Butik), Surabaya"`:
    /// the part before the first comma is the name, the part after the last
    /// comma is the city. The `BELM - ` prefix and any parenthesised suffix are
    /// stripped from the name.
    #[must_use]
    pub fn from_location_label(code: &str, label: &str) -> Self {
        let parts: Vec<&str> = label.split(',').map(str::trim).collect();
        let raw_name = parts.first().copied().unwrap_or_default();
        let raw_name = raw_name.strip_prefix(LOCATION_PREFIX).unwrap_or(raw_name);

        let lowered = raw_name.to_lowercase();
        let kind = if lowered.contains("pengambilan di butik") {
            BranchKind::PickupOnly
        } else if lowered.contains("pengiriman ekspedisi") {
            BranchKind::ShippingOnly
        } else {
            BranchKind::Regular
        };

        let name = raw_name
            .split(" (")
            .next()
            .unwrap_or(raw_name)
            .trim()
            .to_string();
        let city = if parts.len() > 1 {
            parts.last().copied().unwrap_or_default().to_string()
        } else {
            name.clone()
        };

        Self {
            code: code.trim().to_string(),
            city,
            name,
            supports_shipping: kind != BranchKind::PickupOnly,
            kind,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BranchesFile {
    pub branches: Vec<Branch>,
}

/// Cities searched first when a run is limited to a handful of branches.
pub const PRIORITY_CITIES: [&str; 5] = ["Jakarta", "Surabaya", "Bandung", "Medan", "Semarang"];

/// Branches checked by default when no explicit selection is given.
pub const MAJOR_BRANCH_CODES: [&str; 5] = ["ASB1", "ABDG", "AJK2", "ASMG", "AJOG"];

#[derive(Debug, Clone)]
pub struct BranchRegistry {
    branches: Vec<Branch>,
    by_code: HashMap<String, usize>,
}

impl BranchRegistry {
    /// Builds a registry after validating the entries.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] on empty fields, duplicate codes, or
    /// a pickup-only branch flagged as shipping-capable.
    pub fn new(branches: Vec<Branch>) -> Result<Self, ConfigError> {
        validate_branches(&branches)?;
        let by_code = branches
            .iter()
            .enumerate()
            .map(|(i, b)| (b.code.trim().to_ascii_uppercase(), i))
            .collect();
        Ok(Self { branches, by_code })
    }

    /// The boutiques the tool knows about without any configuration.
    #[must_use]
    pub fn builtin() -> Self {
        let branches = BUILTIN_BRANCHES
            .iter()
            .map(|(code, name, city)| Branch {
                code: (*code).to_string(),
                city: (*city).to_string(),
                name: (*name).to_string(),
                supports_shipping: true,
                kind: BranchKind::Regular,
            })
            .collect::<Vec<_>>();
        let by_code = branches
            .iter()
            .enumerate()
            .map(|(i, b)| (b.code.clone(), i))
            .collect();
        Self { branches, by_code }
    }

    /// Case-insensitive lookup by branch code.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&Branch> {
        self.by_code
            .get(&code.trim().to_ascii_uppercase())
            .map(|&i| &self.branches[i])
    }

    #[must_use]
    pub fn all(&self) -> &[Branch] {
        &self.branches
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.branches.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    #[must_use]
    pub fn by_city(&self) -> BTreeMap<&str, Vec<&Branch>> {
        let mut cities: BTreeMap<&str, Vec<&Branch>> = BTreeMap::new();
        for branch in &self.branches {
            cities.entry(branch.city.as_str()).or_default().push(branch);
        }
        cities
    }

    /// Branches that can send bars by courier.
    #[must_use]
    pub fn shipping(&self) -> Vec<&Branch> {
        self.branches.iter().filter(|b| b.supports_shipping).collect()
    }

    #[must_use]
    pub fn pickup_only(&self) -> Vec<&Branch> {
        self.branches
            .iter()
            .filter(|b| b.kind == BranchKind::PickupOnly)
            .collect()
    }

    /// All branches, those in `priority_cities` first. Order within each group
    /// follows the registry.
    #[must_use]
    pub fn prioritized(&self, priority_cities: &[&str]) -> Vec<&Branch> {
        let is_priority = |b: &&Branch| {
            priority_cities
                .iter()
                .any(|c| c.eq_ignore_ascii_case(&b.city))
        };
        let (mut first, rest): (Vec<&Branch>, Vec<&Branch>) =
            self.branches.iter().partition(is_priority);
        first.extend(rest);
        first
    }
}

const BUILTIN_BRANCHES: [(&str, &str, &str); 5] = [
    ("ASB1", "Surabaya Darmo", "Surabaya"),
    ("ABDG", "Bandung", "Bandung"),
    ("AJK2", "Jakarta", "Jakarta"),
    ("ASMG", "Semarang", "Semarang"),
    ("AJOG", "Yogyakarta", "Yogyakarta"),
];

/// Load and validate a branch registry from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_branches(path: &Path) -> Result<BranchRegistry, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::BranchesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: BranchesFile =
        serde_yaml::from_str(&content).map_err(ConfigError::BranchesFileParse)?;

    BranchRegistry::new(file.branches)
}

fn validate_branches(branches: &[Branch]) -> Result<(), ConfigError> {
    let mut seen_codes = HashSet::new();

    for branch in branches {
        if branch.code.trim().is_empty() {
            return Err(ConfigError::Validation(
                "branch code must be non-empty".to_string(),
            ));
        }

        if branch.name.trim().is_empty() || branch.city.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "branch '{}' must have a non-empty name and city",
                branch.code
            )));
        }

        if branch.kind == BranchKind::PickupOnly && branch.supports_shipping {
            return Err(ConfigError::Validation(format!(
                "branch '{}' is pickup_only but marked as supporting shipping",
                branch.code
            )));
        }

        if !seen_codes.insert(branch.code.trim().to_ascii_uppercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate branch code: '{}'",
                branch.code
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "branches_test.rs"]
mod tests;
