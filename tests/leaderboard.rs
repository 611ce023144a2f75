use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use incident_leaderboard::aggregate::summarize_agents;
use incident_leaderboard::daily::select_daily;
use incident_leaderboard::models::{Agent, ContentItem, IncidentCategory, IncidentRecord};
use incident_leaderboard::ranking::{rank, recompute_leaderboards, LeaderboardLimits, RankingKey};
use incident_leaderboard::CoreError;

fn agent(number: i32, total_incidents: i64, total_cost: Decimal) -> Agent {
    Agent {
        id: Uuid::from_u128(number as u128),
        name: format!("Agent {number}"),
        agent_number: number,
        total_incidents,
        total_cost,
    }
}

fn incident(agent: &Agent, category: IncidentCategory) -> IncidentRecord {
    IncidentRecord {
        id: Uuid::new_v4(),
        agent_id: agent.id,
        category,
        cost: dec!(10),
    }
}

#[test]
fn equal_counts_keep_listing_order_and_score_breaks_them() {
    let a = agent(1, 5, dec!(1000));
    let b = agent(2, 5, dec!(500));
    let summaries = summarize_agents(&[a, b], &[]);

    let by_count = rank(&summaries, RankingKey::IncidentCount, 10);
    assert_eq!(by_count.len(), 2);
    assert_eq!(by_count[0].summary.agent.agent_number, 1);
    assert_eq!(by_count[1].summary.agent.agent_number, 2);

    let by_score = rank(&summaries, RankingKey::CombinedScore, 10);
    assert_eq!(by_score[0].rank, 1);
    assert_eq!(by_score[0].summary.agent.agent_number, 1);
    assert_eq!(by_score[0].summary.combined_score, dec!(5000));
    assert_eq!(by_score[1].rank, 2);
    assert_eq!(by_score[1].summary.combined_score, dec!(2500));
}

#[test]
fn category_breakdown_has_every_key() {
    let first = agent(1, 3, dec!(30));
    let incidents = vec![
        incident(&first, IncidentCategory::Car),
        incident(&first, IncidentCategory::Car),
        incident(&first, IncidentCategory::Boat),
    ];

    let summaries = summarize_agents(&[first], &incidents);
    let counts: Vec<(IncidentCategory, u64)> = summaries[0].incidents_by_category.iter().collect();
    assert_eq!(
        counts,
        vec![
            (IncidentCategory::Boat, 1),
            (IncidentCategory::Car, 2),
            (IncidentCategory::Plane, 0),
            (IncidentCategory::Motorcycle, 0),
            (IncidentCategory::Other, 0),
        ]
    );
}

#[test]
fn boat_view_only_holds_agents_with_boat_incidents() {
    let agents = vec![agent(1, 1, dec!(10)), agent(2, 4, dec!(80)), agent(3, 2, dec!(5))];
    let incidents = vec![
        incident(&agents[0], IncidentCategory::Boat),
        incident(&agents[1], IncidentCategory::Car),
        incident(&agents[2], IncidentCategory::Plane),
    ];

    let summaries = summarize_agents(&agents, &incidents);
    let boat = rank(&summaries, RankingKey::Category(IncidentCategory::Boat), 5);
    assert_eq!(boat.len(), 1);
    assert_eq!(boat[0].rank, 1);
    assert_eq!(boat[0].summary.agent.agent_number, 1);
}

#[test]
fn ranks_cover_one_to_len_and_length_is_capped() {
    let agents: Vec<Agent> = (1..=15).map(|n| agent(n, (n % 4) as i64, dec!(3))).collect();
    let summaries = summarize_agents(&agents, &[]);

    for limit in [0usize, 1, 10, 15, 40] {
        let board = rank(&summaries, RankingKey::IncidentCount, limit);
        assert_eq!(board.len(), limit.min(agents.len()));
        let ranks: Vec<usize> = board.iter().map(|e| e.rank).collect();
        let expected: Vec<usize> = (1..=board.len()).collect();
        assert_eq!(ranks, expected);
    }
}

#[test]
fn recompute_is_idempotent() {
    let agents = vec![agent(1, 2, dec!(19.99)), agent(2, 2, dec!(19.99))];
    let incidents = vec![
        incident(&agents[0], IncidentCategory::Motorcycle),
        incident(&agents[1], IncidentCategory::Other),
    ];

    let first = recompute_leaderboards(&agents, &incidents, LeaderboardLimits::default());
    let second = recompute_leaderboards(&agents, &incidents, LeaderboardLimits::default());
    assert_eq!(first, second);
}

#[test]
fn daily_pick_is_stable_and_rejects_empty_pool() {
    let pool: Vec<ContentItem> = (0..4)
        .map(|n| ContentItem {
            id: Uuid::from_u128(n as u128 + 100),
            body: format!("Quote {n}"),
            author: None,
            display_order: n,
            is_active: true,
        })
        .collect();
    let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();

    let first = select_daily(&pool, date).unwrap();
    let second = select_daily(&pool, date).unwrap();
    assert_eq!(first.id, second.id);
    // "2026-10-19" sums to 495.
    assert_eq!(first.body, "Quote 3");

    assert_eq!(
        select_daily(&[], date).unwrap_err(),
        CoreError::InvalidArgument("daily selection needs at least one item".to_string())
    );
}
