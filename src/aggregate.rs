use std::collections::HashMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;
use uuid::Uuid;

use crate::models::{Agent, AgentSummary, CategoryCounts, FleetTotals, IncidentRecord};

/// Builds one summary per agent, in input order. Incidents pointing at
/// agents outside `agents` are skipped.
pub fn summarize_agents(agents: &[Agent], incidents: &[IncidentRecord]) -> Vec<AgentSummary> {
    let mut counts: HashMap<Uuid, CategoryCounts> = HashMap::with_capacity(agents.len());

    for incident in incidents {
        counts
            .entry(incident.agent_id)
            .or_default()
            .increment(incident.category);
    }

    let summaries: Vec<AgentSummary> = agents
        .iter()
        .map(|agent| AgentSummary {
            agent: agent.clone(),
            incidents_by_category: counts.get(&agent.id).cloned().unwrap_or_default(),
            combined_score: combined_score(agent),
        })
        .collect();

    debug!(
        agents = summaries.len(),
        incidents = incidents.len(),
        "summarized agents"
    );
    summaries
}

/// Stored incident total times stored cost. Saturates at `Decimal::MAX`.
pub fn combined_score(agent: &Agent) -> Decimal {
    Decimal::from(agent.total_incidents)
        .checked_mul(agent.total_cost)
        .unwrap_or(Decimal::MAX)
}

pub fn fleet_totals(summaries: &[AgentSummary]) -> FleetTotals {
    let total_incidents = summaries
        .iter()
        .fold(0i64, |acc, s| acc.saturating_add(s.agent.total_incidents));
    let total_cost = summaries
        .iter()
        .fold(Decimal::ZERO, |acc, s| acc.saturating_add(s.agent.total_cost));
    let average_incidents = if summaries.is_empty() {
        0
    } else {
        (Decimal::from(total_incidents) / Decimal::from(summaries.len() as u64))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .unwrap_or_default()
    };

    FleetTotals {
        agent_count: summaries.len(),
        total_incidents,
        total_cost,
        average_incidents,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IncidentCategory;
    use rust_decimal_macros::dec;

    fn agent(number: i32, total_incidents: i64, total_cost: Decimal) -> Agent {
        Agent {
            id: Uuid::new_v4(),
            name: format!("Agent {number}"),
            agent_number: number,
            total_incidents,
            total_cost,
        }
    }

    fn incident(agent_id: Uuid, category: IncidentCategory) -> IncidentRecord {
        IncidentRecord {
            id: Uuid::new_v4(),
            agent_id,
            category,
            cost: dec!(100),
        }
    }

    #[test]
    fn counts_incidents_by_category() {
        let first = agent(1, 3, dec!(300));
        let incidents = vec![
            incident(first.id, IncidentCategory::Car),
            incident(first.id, IncidentCategory::Car),
            incident(first.id, IncidentCategory::Boat),
        ];

        let summaries = summarize_agents(&[first], &incidents);
        let counts = &summaries[0].incidents_by_category;
        assert_eq!(counts.get(IncidentCategory::Car), 2);
        assert_eq!(counts.get(IncidentCategory::Boat), 1);
        assert_eq!(counts.get(IncidentCategory::Plane), 0);
        assert_eq!(counts.get(IncidentCategory::Motorcycle), 0);
        assert_eq!(counts.get(IncidentCategory::Other), 0);
    }

    #[test]
    fn every_category_key_is_present_without_incidents() {
        let summaries = summarize_agents(&[agent(1, 0, dec!(0))], &[]);
        for category in IncidentCategory::ALL {
            assert!(summaries[0].incidents_by_category.contains(category));
        }
    }

    #[test]
    fn keeps_input_order_and_ignores_unknown_agents() {
        let agents = vec![agent(3, 1, dec!(10)), agent(1, 2, dec!(20)), agent(2, 0, dec!(0))];
        let stray = incident(Uuid::new_v4(), IncidentCategory::Plane);

        let summaries = summarize_agents(&agents, &[stray]);
        let numbers: Vec<i32> = summaries.iter().map(|s| s.agent.agent_number).collect();
        assert_eq!(numbers, vec![3, 1, 2]);
        assert!(summaries
            .iter()
            .all(|s| s.incidents_by_category.get(IncidentCategory::Plane) == 0));
    }

    #[test]
    fn combined_score_uses_stored_totals() {
        // Stored totals disagree with the log; the score follows the totals.
        let first = agent(1, 5, dec!(1000.50));
        let incidents = vec![incident(first.id, IncidentCategory::Other)];

        let summaries = summarize_agents(&[first], &incidents);
        assert_eq!(summaries[0].combined_score, dec!(5002.50));
        assert_eq!(
            summaries[0].incidents_by_category.get(IncidentCategory::Other),
            1
        );
    }

    #[test]
    fn combined_score_saturates_on_overflow() {
        let huge = agent(1, i64::MAX, Decimal::MAX);
        assert_eq!(combined_score(&huge), Decimal::MAX);
    }

    #[test]
    fn fleet_totals_saturate_on_overflow() {
        let summaries = summarize_agents(&[agent(1, i64::MAX, dec!(1))], &[]);
        let totals = fleet_totals(&summaries);
        assert_eq!(totals.total_incidents, i64::MAX);
        assert_eq!(totals.average_incidents, i64::MAX);

        let summaries = summarize_agents(
            &[agent(1, i64::MAX, Decimal::MAX), agent(2, i64::MAX, Decimal::MAX)],
            &[],
        );
        let totals = fleet_totals(&summaries);
        assert_eq!(totals.total_incidents, i64::MAX);
        assert_eq!(totals.total_cost, Decimal::MAX);
        assert_eq!(totals.average_incidents, i64::MAX / 2 + 1);
    }

    #[test]
    fn fleet_totals_round_average() {
        let summaries = summarize_agents(
            &[agent(1, 5, dec!(1000)), agent(2, 2, dec!(500.25))],
            &[],
        );
        let totals = fleet_totals(&summaries);
        assert_eq!(totals.agent_count, 2);
        assert_eq!(totals.total_incidents, 7);
        assert_eq!(totals.total_cost, dec!(1500.25));
        assert_eq!(totals.average_incidents, 4);
    }

    #[test]
    fn fleet_totals_empty_fleet() {
        let totals = fleet_totals(&[]);
        assert_eq!(totals.agent_count, 0);
        assert_eq!(totals.average_incidents, 0);
        assert_eq!(totals.total_cost, Decimal::ZERO);
    }
}
