use std::fmt::Write;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{ContentItem, LeaderboardEntry};
use crate::ranking::{Leaderboard, LeaderboardSet, RankingKey};

pub fn format_value(key: RankingKey, value: Decimal) -> String {
    match key {
        RankingKey::TotalCost | RankingKey::CombinedScore => format!("{:.2}", value),
        _ => value.to_string(),
    }
}

pub fn entry_line(key: RankingKey, entry: &LeaderboardEntry) -> String {
    format!(
        "#{} {} (agent #{}): {}",
        entry.rank,
        entry.summary.agent.name,
        entry.summary.agent.agent_number,
        format_value(key, key.value(&entry.summary))
    )
}

fn write_board(output: &mut String, board: &Leaderboard) {
    let _ = writeln!(output, "## {}", board.key.title());

    if board.entries.is_empty() {
        match board.key {
            RankingKey::Category(category) => {
                let _ = writeln!(output, "No {} incidents recorded.", category.slug());
            }
            _ => {
                let _ = writeln!(output, "No agents registered.");
            }
        }
    } else {
        for entry in board.entries.iter() {
            let _ = writeln!(output, "- {}", entry_line(board.key, entry));
        }
    }

    let _ = writeln!(output);
}

/// `quote` is the day's pick, or `None` when the pool was empty.
pub fn build_report(set: &LeaderboardSet, date: NaiveDate, quote: Option<&ContentItem>) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Incident Leaderboard");
    let _ = writeln!(output, "Generated for {}", date);
    let _ = writeln!(output);

    if let Some(item) = quote {
        let _ = writeln!(output, "> {}", item.body);
        if let Some(author) = &item.author {
            let _ = writeln!(output, ">");
            let _ = writeln!(output, "> {}", author);
        }
        let _ = writeln!(output);
    }

    let totals = &set.totals;
    let _ = writeln!(output, "## Overview");
    let _ = writeln!(output, "- Agents: {}", totals.agent_count);
    let _ = writeln!(output, "- Incidents: {}", totals.total_incidents);
    let _ = writeln!(output, "- Total cost: {:.2}", totals.total_cost);
    let _ = writeln!(
        output,
        "- Average incidents per agent: {}",
        totals.average_incidents
    );
    let _ = writeln!(output);

    for board in set.boards.iter() {
        write_board(&mut output, board);
    }

    output
}
