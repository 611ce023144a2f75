use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::{fleet_totals, summarize_agents};
use crate::models::{
    Agent, AgentSummary, FleetTotals, IncidentCategory, IncidentRecord, LeaderboardEntry,
};

/// Sort key of a leaderboard view. All keys sort descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingKey {
    IncidentCount,
    TotalCost,
    CombinedScore,
    Category(IncidentCategory),
}

impl RankingKey {
    pub fn title(&self) -> String {
        match self {
            RankingKey::IncidentCount => "Most Incidents".to_string(),
            RankingKey::TotalCost => "Highest Total Cost".to_string(),
            RankingKey::CombinedScore => "Combined Record (incidents x cost)".to_string(),
            RankingKey::Category(category) => format!("{} Incidents", category.label()),
        }
    }

    /// Value shown next to an entry for this view.
    pub fn value(&self, summary: &AgentSummary) -> Decimal {
        match self {
            RankingKey::IncidentCount => Decimal::from(summary.agent.total_incidents),
            RankingKey::TotalCost => summary.agent.total_cost,
            RankingKey::CombinedScore => summary.combined_score,
            RankingKey::Category(category) => {
                Decimal::from(summary.incidents_by_category.get(*category))
            }
        }
    }

    fn is_eligible(&self, summary: &AgentSummary) -> bool {
        match self {
            RankingKey::Category(category) => summary.incidents_by_category.get(*category) > 0,
            _ => true,
        }
    }

    fn compare(&self, a: &AgentSummary, b: &AgentSummary) -> Ordering {
        match self {
            RankingKey::IncidentCount => b.agent.total_incidents.cmp(&a.agent.total_incidents),
            RankingKey::TotalCost => b.agent.total_cost.cmp(&a.agent.total_cost),
            RankingKey::CombinedScore => b.combined_score.cmp(&a.combined_score),
            RankingKey::Category(category) => b
                .incidents_by_category
                .get(*category)
                .cmp(&a.incidents_by_category.get(*category)),
        }
    }
}

impl fmt::Display for RankingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankingKey::IncidentCount => f.write_str("incidents"),
            RankingKey::TotalCost => f.write_str("cost"),
            RankingKey::CombinedScore => f.write_str("score"),
            RankingKey::Category(category) => write!(f, "{category}"),
        }
    }
}

impl FromStr for RankingKey {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "incidents" | "count" => Ok(RankingKey::IncidentCount),
            "cost" => Ok(RankingKey::TotalCost),
            "score" | "combined" => Ok(RankingKey::CombinedScore),
            other => other
                .parse::<IncidentCategory>()
                .map(RankingKey::Category)
                .map_err(|_| format!("unknown leaderboard view '{other}'")),
        }
    }
}

/// Sorts eligible summaries by `key` and keeps the first `limit`.
///
/// The sort is stable: equal values keep their input order. Ranks are row
/// numbers (1..=len), so equal values never share a rank.
pub fn rank(summaries: &[AgentSummary], key: RankingKey, limit: usize) -> Vec<LeaderboardEntry> {
    let mut eligible: Vec<&AgentSummary> =
        summaries.iter().filter(|s| key.is_eligible(s)).collect();
    eligible.sort_by(|a, b| key.compare(a, b));

    eligible
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(index, summary)| LeaderboardEntry {
            rank: index + 1,
            summary: summary.clone(),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardLimits {
    pub top_n: usize,
    pub category_top_n: usize,
}

impl Default for LeaderboardLimits {
    fn default() -> Self {
        Self {
            top_n: 10,
            category_top_n: 5,
        }
    }
}

impl LeaderboardLimits {
    pub fn for_key(&self, key: RankingKey) -> usize {
        match key {
            RankingKey::Category(_) => self.category_top_n,
            _ => self.top_n,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub key: RankingKey,
    pub entries: Vec<LeaderboardEntry>,
}

/// Every leaderboard view computed from one snapshot of store data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardSet {
    pub totals: FleetTotals,
    pub boards: Vec<Leaderboard>,
}

impl LeaderboardSet {
    pub fn board(&self, key: RankingKey) -> Option<&Leaderboard> {
        self.boards.iter().find(|board| board.key == key)
    }
}

/// Main views first, then one view per category.
pub fn all_keys() -> Vec<RankingKey> {
    let mut keys = vec![
        RankingKey::IncidentCount,
        RankingKey::TotalCost,
        RankingKey::CombinedScore,
    ];
    keys.extend(IncidentCategory::ALL.iter().copied().map(RankingKey::Category));
    keys
}

pub fn recompute_leaderboards(
    agents: &[Agent],
    incidents: &[IncidentRecord],
    limits: LeaderboardLimits,
) -> LeaderboardSet {
    let summaries = summarize_agents(agents, incidents);
    let boards: Vec<Leaderboard> = all_keys()
        .into_iter()
        .map(|key| Leaderboard {
            key,
            entries: rank(&summaries, key, limits.for_key(key)),
        })
        .collect();

    debug!(boards = boards.len(), "recomputed leaderboards");
    LeaderboardSet {
        totals: fleet_totals(&summaries),
        boards,
    }
}
