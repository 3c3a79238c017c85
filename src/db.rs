use anyhow::Context;
use chrono::{Datelike, Duration, Month, NaiveDate};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::import::{action_source_key, record_source_key};
use crate::models::{ActionLogEntry, NewAction, PerformanceRecord, RecordFilter};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<(usize, usize)> {
    let records = seed_records()?;
    let inserted = insert_records(pool, &records).await?;

    let actions = seed_actions()?;
    let logged = insert_actions(pool, &actions).await?;

    Ok((inserted, logged))
}

/// Week score pattern per seeded agent for March 2026: `(prod, qa)` per week.
const SEED_AGENTS: &[(&str, &str, [(f64, f64); 4])] = &[
    (
        "avery.lee@qperform.io",
        "Avery Lee",
        [(1.012, 1.0), (1.004, 0.995), (0.997, 0.991), (1.001, 1.0)],
    ),
    (
        "jules.moreno@qperform.io",
        "Jules Moreno",
        [(1.0, 0.99), (0.984, 0.992), (1.003, 0.999), (0.996, 0.989)],
    ),
    (
        "kiara.patel@qperform.io",
        "Kiara Patel",
        [(0.972, 0.99), (1.0, 0.968), (1.001, 0.993), (0.995, 1.0)],
    ),
    (
        "rowan.hale@qperform.io",
        "",
        [(0.95, 0.96), (0.981, 0.99), (0.99, 0.975), (1.002, 1.0)],
    ),
    (
        "sasha.kim@qperform.io",
        "Sasha Kim",
        [(1.0, 1.0), (1.0, 0.972), (1.011, 1.0), (0.999, 0.998)],
    ),
];

pub fn seed_records() -> anyhow::Result<Vec<PerformanceRecord>> {
    let first_monday = NaiveDate::from_ymd_opt(2026, 3, 2).context("invalid date")?;
    let month = Month::try_from(first_monday.month() as u8)
        .ok()
        .context("invalid month")?;
    let mut records = Vec::new();

    for (idx, (email, name, weeks)) in SEED_AGENTS.iter().enumerate() {
        for (week, (prod, qa)) in weeks.iter().enumerate() {
            let start_date = first_monday + Duration::weeks(week as i64);
            let end_date = start_date + Duration::days(6);
            records.push(PerformanceRecord {
                agent_email: email.to_string(),
                agent_id: format!("{}", 1040 + idx),
                agent_name: (!name.is_empty()).then(|| name.to_string()),
                client: if idx % 2 == 0 { "Northwind" } else { "Contoso" }.to_string(),
                category: "Claims".to_string(),
                task: "Intake".to_string(),
                kpi_qa: *qa,
                flag_qa: String::new(),
                kpi_avg_prod: *prod,
                flag_prod: String::new(),
                week_range: format!("{} - {}", start_date.format("%b %d"), end_date.format("%b %d")),
                start_date,
                end_date,
                month_num: start_date.month() as i32,
                month_name: month.name().to_string(),
                year_num: start_date.year(),
            });
        }
    }

    Ok(records)
}

fn seed_actions() -> anyhow::Result<Vec<ActionLogEntry>> {
    let entries = [
        ("rowan.hale@qperform.io", "Focused Coaching", "Walked through QA rubric after week 1", "2026-03-10"),
        ("sasha.kim@qperform.io", "Focused Coaching", "Reviewed flagged QA samples", "2026-03-12"),
    ];

    entries
        .into_iter()
        .map(|(email, action_type, description, date)| {
            Ok(ActionLogEntry {
                id: Uuid::new_v4(),
                agent_email: email.to_string(),
                action_type: action_type.to_string(),
                description: description.to_string(),
                taken_by: "ops.supervisor@qperform.io".to_string(),
                action_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").context("invalid date")?,
                client: "Northwind".to_string(),
                category: "Claims".to_string(),
            })
        })
        .collect()
}

pub async fn fetch_records(
    pool: &PgPool,
    filter: &RecordFilter,
) -> anyhow::Result<Vec<PerformanceRecord>> {
    let mut query = String::from(
        "SELECT agent_email, agent_id, agent_name, client, category, task, \
         kpi_qa, flag_qa, kpi_avg_prod, flag_prod, week_range, start_date, end_date, \
         month_num, month_name, year_num \
         FROM qperform.performance_records \
         WHERE year_num = $1 AND month_num = $2",
    );

    let email = filter.email.as_deref().map(str::to_ascii_lowercase);
    let optional = [
        ("client", filter.client.clone()),
        ("category", filter.category.clone()),
        ("lower(agent_email)", email),
    ];
    let mut binds = Vec::new();
    for (column, value) in optional {
        if let Some(value) = value {
            binds.push(value);
            query.push_str(&format!(" AND {column} = ${}", binds.len() + 2));
        }
    }
    query.push_str(" ORDER BY agent_email, start_date, client, task");

    let mut rows = sqlx::query(&query)
        .bind(filter.year)
        .bind(filter.month as i32);
    for value in &binds {
        rows = rows.bind(value);
    }

    let records = rows
        .fetch_all(pool)
        .await
        .context("failed to fetch performance records")?;
    Ok(records.iter().map(record_from_row).collect())
}

fn record_from_row(row: &PgRow) -> PerformanceRecord {
    PerformanceRecord {
        agent_email: row.get("agent_email"),
        agent_id: row.get("agent_id"),
        agent_name: row.get("agent_name"),
        client: row.get("client"),
        category: row.get("category"),
        task: row.get("task"),
        kpi_qa: row.get("kpi_qa"),
        flag_qa: row.get("flag_qa"),
        kpi_avg_prod: row.get("kpi_avg_prod"),
        flag_prod: row.get("flag_prod"),
        week_range: row.get("week_range"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        month_num: row.get("month_num"),
        month_name: row.get("month_name"),
        year_num: row.get("year_num"),
    }
}

pub async fn fetch_actions(
    pool: &PgPool,
    email: Option<&str>,
) -> anyhow::Result<Vec<ActionLogEntry>> {
    let mut query = String::from(
        "SELECT id, agent_email, action_type, description, taken_by, action_date, client, category \
         FROM qperform.action_log",
    );
    if email.is_some() {
        query.push_str(" WHERE lower(agent_email) = $1");
    }
    query.push_str(" ORDER BY action_date DESC, created_at DESC");

    let mut rows = sqlx::query(&query);
    if let Some(value) = email {
        rows = rows.bind(value.to_ascii_lowercase());
    }

    let records = rows
        .fetch_all(pool)
        .await
        .context("failed to fetch action log")?;

    let mut actions = Vec::with_capacity(records.len());
    for row in records {
        actions.push(ActionLogEntry {
            id: row.get("id"),
            agent_email: row.get("agent_email"),
            action_type: row.get("action_type"),
            description: row.get("description"),
            taken_by: row.get("taken_by"),
            action_date: row.get("action_date"),
            client: row.get("client"),
            category: row.get("category"),
        });
    }

    Ok(actions)
}

/// Stores a submitted action. Returns `None` when the same action is
/// already logged.
pub async fn insert_action(
    pool: &PgPool,
    action: NewAction,
) -> anyhow::Result<Option<ActionLogEntry>> {
    let entry = action.into_entry(Uuid::new_v4());
    let inserted = insert_action_entry(pool, &entry).await?;
    Ok(inserted.then_some(entry))
}

pub async fn insert_actions(pool: &PgPool, actions: &[ActionLogEntry]) -> anyhow::Result<usize> {
    let mut inserted = 0usize;
    for action in actions {
        if insert_action_entry(pool, action).await? {
            inserted += 1;
        }
    }
    Ok(inserted)
}

async fn insert_action_entry(pool: &PgPool, action: &ActionLogEntry) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO qperform.action_log
        (id, agent_email, action_type, description, taken_by, action_date, client, category, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(action.id)
    .bind(&action.agent_email)
    .bind(&action.action_type)
    .bind(&action.description)
    .bind(&action.taken_by)
    .bind(action.action_date)
    .bind(&action.client)
    .bind(&action.category)
    .bind(action_source_key(action))
    .execute(pool)
    .await
    .context("failed to insert action")?;

    Ok(result.rows_affected() > 0)
}

/// Inserts records, skipping any whose source key is already stored.
/// Flags are stored resolved so later reads see one of the five labels.
pub async fn insert_records(pool: &PgPool, records: &[PerformanceRecord]) -> anyhow::Result<usize> {
    let mut inserted = 0usize;

    for record in records {
        let result = sqlx::query(
            r#"
            INSERT INTO qperform.performance_records
            (id, agent_id, agent_email, agent_name, client, category, task,
             kpi_avg_prod, flag_prod, kpi_qa, flag_qa, week_range,
             start_date, end_date, month_num, month_name, year_num, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&record.agent_id)
        .bind(&record.agent_email)
        .bind(&record.agent_name)
        .bind(&record.client)
        .bind(&record.category)
        .bind(&record.task)
        .bind(record.kpi_avg_prod)
        .bind(record.prod_status().label())
        .bind(record.kpi_qa)
        .bind(record.qa_status().label())
        .bind(&record.week_range)
        .bind(record.start_date)
        .bind(record.end_date)
        .bind(record.month_num)
        .bind(&record.month_name)
        .bind(record.year_num)
        .bind(record_source_key(record))
        .execute(pool)
        .await
        .context("failed to insert performance record")?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}
