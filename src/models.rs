use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of incident. The set is closed; every per-category mapping carries
/// all of these keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentCategory {
    Boat,
    Car,
    Plane,
    Motorcycle,
    Other,
}

impl IncidentCategory {
    pub const ALL: [IncidentCategory; 5] = [
        IncidentCategory::Boat,
        IncidentCategory::Car,
        IncidentCategory::Plane,
        IncidentCategory::Motorcycle,
        IncidentCategory::Other,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            IncidentCategory::Boat => "boat",
            IncidentCategory::Car => "car",
            IncidentCategory::Plane => "plane",
            IncidentCategory::Motorcycle => "motorcycle",
            IncidentCategory::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            IncidentCategory::Boat => "Boat",
            IncidentCategory::Car => "Car",
            IncidentCategory::Plane => "Plane",
            IncidentCategory::Motorcycle => "Motorcycle",
            IncidentCategory::Other => "Other",
        }
    }
}

impl fmt::Display for IncidentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for IncidentCategory {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "boat" | "bateau" => Ok(IncidentCategory::Boat),
            "car" | "voiture" => Ok(IncidentCategory::Car),
            "plane" | "avion" => Ok(IncidentCategory::Plane),
            "motorcycle" | "moto" => Ok(IncidentCategory::Motorcycle),
            "other" | "autre" => Ok(IncidentCategory::Other),
            other => Err(format!("unknown incident category '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: Uuid,
    pub name: String,
    pub agent_number: i32,
    pub total_incidents: i64,
    pub total_cost: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentRecord {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub category: IncidentCategory,
    pub cost: Decimal,
}

/// Incident counts keyed by category. Built zeroed for every category, so
/// lookups never miss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<IncidentCategory, u64>")]
pub struct CategoryCounts(BTreeMap<IncidentCategory, u64>);

impl CategoryCounts {
    pub fn new() -> Self {
        Self(IncidentCategory::ALL.iter().map(|c| (*c, 0)).collect())
    }

    pub fn get(&self, category: IncidentCategory) -> u64 {
        self.0.get(&category).copied().unwrap_or(0)
    }

    pub fn increment(&mut self, category: IncidentCategory) {
        *self.0.entry(category).or_insert(0) += 1;
    }

    pub fn iter(&self) -> impl Iterator<Item = (IncidentCategory, u64)> + '_ {
        self.0.iter().map(|(category, count)| (*category, *count))
    }

    pub fn contains(&self, category: IncidentCategory) -> bool {
        self.0.contains_key(&category)
    }
}

impl From<BTreeMap<IncidentCategory, u64>> for CategoryCounts {
    fn from(parsed: BTreeMap<IncidentCategory, u64>) -> Self {
        let mut counts = Self::new();
        counts.0.extend(parsed);
        counts
    }
}

impl Default for CategoryCounts {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSummary {
    pub agent: Agent,
    pub incidents_by_category: CategoryCounts,
    pub combined_score: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub summary: AgentSummary,
}

/// One entry of the daily rotation pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: Uuid,
    pub body: String,
    pub author: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetTotals {
    pub agent_count: usize,
    pub total_incidents: i64,
    pub total_cost: Decimal,
    pub average_incidents: i64,
}
