use anyhow::{bail, Context};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{Agent, ContentItem, IncidentCategory, IncidentRecord};

/// Costs are stored as `NUMERIC(14, 2)`; anything Postgres would round or
/// reject is refused here instead.
pub fn validate_cost(cost: Decimal) -> anyhow::Result<()> {
    if cost < Decimal::ZERO {
        bail!("incident cost must not be negative");
    }
    if cost.normalize().scale() > 2 {
        bail!("incident cost {cost} has more than two decimal places");
    }
    if cost >= Decimal::new(1_000_000_000_000, 0) {
        bail!("incident cost {cost} exceeds the storable maximum");
    }
    Ok(())
}

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("migrations applied");
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let agents = vec![
        (
            Uuid::parse_str("8a41c2e0-5f3b-4d7e-9c12-6b0e7f4a1d93")?,
            "Marcus Reed",
        ),
        (
            Uuid::parse_str("e27b9d54-0a6c-4f18-b3e5-91c4d82f6a07")?,
            "Lena Duval",
        ),
        (
            Uuid::parse_str("5c93f0ab-7e21-4b6d-a840-2d17e9b35c6e")?,
            "Tomas Grell",
        ),
    ];

    for (id, name) in &agents {
        sqlx::query(
            r#"
            INSERT INTO incident_leaderboard.agents (id, name)
            VALUES ($1, $2)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(name)
        .execute(pool)
        .await?;
    }

    let incidents = vec![
        ("seed-001", 0, IncidentCategory::Car, Decimal::new(125_000, 2), "Parked in the harbour"),
        ("seed-002", 0, IncidentCategory::Car, Decimal::new(89_950, 2), "Reversed into the armoury"),
        ("seed-003", 0, IncidentCategory::Boat, Decimal::new(420_000, 2), "Ran aground at the pier"),
        ("seed-004", 1, IncidentCategory::Plane, Decimal::new(1_500_000, 2), "Forgot the landing gear"),
        ("seed-005", 2, IncidentCategory::Motorcycle, Decimal::new(35_000, 2), "Wheelie through the checkpoint"),
    ];

    let mut tx = pool.begin().await?;
    for (source_key, agent_index, category, cost, note) in incidents {
        let (agent_id, _) = agents[agent_index];
        insert_incident(&mut tx, agent_id, category, cost, note, source_key).await?;
    }
    tx.commit().await?;

    let quotes = vec![
        ("Safety first. Paperwork second. Vehicles a distant third.", Some("Dispatch"), 1),
        ("Every incident is a training opportunity for somebody.", None, 2),
        ("The car was fine when I signed it out.", Some("Anonymous agent"), 3),
    ];

    for (body, author, display_order) in quotes {
        sqlx::query(
            r#"
            INSERT INTO incident_leaderboard.content_items
            (id, body, author, display_order, is_active)
            VALUES ($1, $2, $3, $4, TRUE)
            ON CONFLICT (body) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(body)
        .bind(author)
        .bind(display_order)
        .execute(pool)
        .await?;
    }

    Ok(())
}

/// All agents, by agent number ascending.
pub async fn list_agents(pool: &PgPool) -> anyhow::Result<Vec<Agent>> {
    let rows = sqlx::query(
        "SELECT id, name, agent_number, total_incidents, total_cost \
         FROM incident_leaderboard.agents \
         ORDER BY agent_number ASC",
    )
    .fetch_all(pool)
    .await
    .context("failed to list agents")?;

    Ok(rows.iter().map(agent_from_row).collect())
}

pub async fn list_incidents(
    pool: &PgPool,
    agent_id: Option<Uuid>,
) -> anyhow::Result<Vec<IncidentRecord>> {
    let mut query = String::from(
        "SELECT id, agent_id, category, cost FROM incident_leaderboard.incidents",
    );
    if agent_id.is_some() {
        query.push_str(" WHERE agent_id = $1");
    }

    let mut rows = sqlx::query(&query);
    if let Some(value) = agent_id {
        rows = rows.bind(value);
    }

    let records = rows
        .fetch_all(pool)
        .await
        .context("failed to list incidents")?;
    let mut incidents = Vec::with_capacity(records.len());

    for row in records {
        let category: String = row.get("category");
        incidents.push(IncidentRecord {
            id: row.get("id"),
            agent_id: row.get("agent_id"),
            category: category.parse().map_err(anyhow::Error::msg)?,
            cost: row.get("cost"),
        });
    }

    debug!(count = incidents.len(), "loaded incidents");
    Ok(incidents)
}

pub async fn register_agent(pool: &PgPool, name: &str) -> anyhow::Result<Agent> {
    let name = name.trim();
    if name.is_empty() {
        bail!("agent name is required");
    }

    let row = sqlx::query(
        r#"
        INSERT INTO incident_leaderboard.agents (id, name)
        VALUES ($1, $2)
        RETURNING id, name, agent_number, total_incidents, total_cost
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .fetch_one(pool)
    .await
    .context("failed to register agent")?;

    let agent = agent_from_row(&row);
    info!(agent_number = agent.agent_number, name = %agent.name, "registered agent");
    Ok(agent)
}

pub async fn record_incident(
    pool: &PgPool,
    agent_number: i32,
    category: IncidentCategory,
    cost: Decimal,
    note: &str,
) -> anyhow::Result<Agent> {
    validate_cost(cost)?;

    let mut tx = pool
        .begin()
        .await
        .context("failed to record incident: could not start transaction")?;
    let agent_id: Uuid = match sqlx::query(
        "SELECT id FROM incident_leaderboard.agents WHERE agent_number = $1",
    )
    .bind(agent_number)
    .fetch_optional(&mut *tx)
    .await
    .context("failed to record incident: agent lookup failed")?
    {
        Some(row) => row.get("id"),
        None => bail!("no agent with number {agent_number}"),
    };

    let source_key = format!("cli-{}", Uuid::new_v4());
    insert_incident(&mut tx, agent_id, category, cost, note, &source_key)
        .await
        .context("failed to record incident")?;

    let row = sqlx::query(
        "SELECT id, name, agent_number, total_incidents, total_cost \
         FROM incident_leaderboard.agents WHERE id = $1",
    )
    .bind(agent_id)
    .fetch_one(&mut *tx)
    .await
    .context("failed to record incident: could not reload agent totals")?;
    tx.commit()
        .await
        .context("failed to record incident: commit failed")?;

    Ok(agent_from_row(&row))
}

/// Active items only, by display order ascending.
pub async fn list_active_content_items(pool: &PgPool) -> anyhow::Result<Vec<ContentItem>> {
    let rows = sqlx::query(
        "SELECT id, body, author, display_order, is_active \
         FROM incident_leaderboard.content_items \
         WHERE is_active = TRUE \
         ORDER BY display_order ASC",
    )
    .fetch_all(pool)
    .await
    .context("failed to list content items")?;

    Ok(rows
        .into_iter()
        .map(|row| ContentItem {
            id: row.get("id"),
            body: row.get("body"),
            author: row.get("author"),
            display_order: row.get("display_order"),
            is_active: row.get("is_active"),
        })
        .collect())
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        agent_name: String,
        category: String,
        cost: Decimal,
        #[serde(default)]
        note: String,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut inserted = 0usize;

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result?;
        let category: IncidentCategory = row
            .category
            .parse()
            .map_err(|err| anyhow::anyhow!("row {}: {err}", line + 1))?;
        validate_cost(row.cost).with_context(|| format!("row {}", line + 1))?;
        let agent_name = row.agent_name.trim();
        if agent_name.is_empty() {
            bail!("row {}: agent name is required", line + 1);
        }

        let mut tx = pool.begin().await?;
        let existing = sqlx::query(
            "SELECT id FROM incident_leaderboard.agents WHERE name = $1 \
             ORDER BY agent_number ASC LIMIT 1",
        )
        .bind(agent_name)
        .fetch_optional(&mut *tx)
        .await?;

        let agent_id: Uuid = match existing {
            Some(row) => row.get("id"),
            None => {
                let id = Uuid::new_v4();
                sqlx::query("INSERT INTO incident_leaderboard.agents (id, name) VALUES ($1, $2)")
                    .bind(id)
                    .bind(agent_name)
                    .execute(&mut *tx)
                    .await?;
                debug!(name = agent_name, "registered agent from import");
                id
            }
        };

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        if insert_incident(&mut tx, agent_id, category, row.cost, &row.note, &source_key).await? {
            inserted += 1;
        }
        tx.commit().await?;
    }

    info!(inserted, path = %csv_path.display(), "imported incidents");
    Ok(inserted)
}

/// Inserts one incident and bumps the agent's running totals. Returns false
/// when `source_key` was already recorded.
async fn insert_incident(
    tx: &mut Transaction<'_, Postgres>,
    agent_id: Uuid,
    category: IncidentCategory,
    cost: Decimal,
    note: &str,
    source_key: &str,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO incident_leaderboard.incidents
        (id, agent_id, category, cost, note, source_key)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(agent_id)
    .bind(category.slug())
    .bind(cost)
    .bind(note)
    .bind(source_key)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(false);
    }

    sqlx::query(
        r#"
        UPDATE incident_leaderboard.agents
        SET total_incidents = total_incidents + 1, total_cost = total_cost + $2
        WHERE id = $1
        "#,
    )
    .bind(agent_id)
    .bind(cost)
    .execute(&mut **tx)
    .await?;

    Ok(true)
}

fn agent_from_row(row: &sqlx::postgres::PgRow) -> Agent {
    Agent {
        id: row.get("id"),
        name: row.get("name"),
        agent_number: row.get("agent_number"),
        total_incidents: row.get("total_incidents"),
        total_cost: row.get("total_cost"),
    }
}
