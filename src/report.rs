use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

use crate::compliance::{self, ActionScope};
use crate::models::{ActionLogEntry, AgentReview, PerformanceRecord, RecordFilter};
use crate::recommend;

#[derive(Debug, Clone)]
pub struct Headcount {
    pub client: String,
    pub category: String,
    pub agents: usize,
}

/// Distinct agents (AFTE) per client/category.
pub fn headcount(records: &[PerformanceRecord]) -> Vec<Headcount> {
    let mut map: BTreeMap<(String, String), BTreeSet<String>> = BTreeMap::new();

    for record in records {
        map.entry((record.client.clone(), record.category.clone()))
            .or_default()
            .insert(record.agent_email.to_ascii_lowercase());
    }

    map.into_iter()
        .map(|((client, category), agents)| Headcount {
            client,
            category,
            agents: agents.len(),
        })
        .collect()
}

/// Compliance and recommendation for every agent present in `records`,
/// most urgent first.
pub fn review_agents(
    records: &[PerformanceRecord],
    actions: &[ActionLogEntry],
    scope_to_weeks: bool,
) -> Vec<AgentReview> {
    let mut reviews: Vec<AgentReview> = compliance::group_by_agent(records)
        .into_iter()
        .map(|(email, weeks)| {
            let result = if scope_to_weeks {
                let scope = ActionScope::covering(&weeks);
                compliance::aggregate_scoped(&weeks, actions, &email, scope)
            } else {
                compliance::aggregate(&weeks, actions, &email)
            };
            let agent_name = weeks
                .values()
                .flatten()
                .next()
                .map(PerformanceRecord::display_name)
                .unwrap_or_default();
            tracing::debug!(
                agent = %email,
                compliant = result.compliant_weeks,
                total = result.total_weeks,
                actions = result.action_count,
                "aggregated agent month"
            );
            AgentReview {
                agent_email: email,
                agent_name,
                recommendation: recommend::recommend(&result),
                compliance: result,
            }
        })
        .collect();

    reviews.sort_by(|a, b| {
        b.recommendation
            .is_critical
            .cmp(&a.recommendation.is_critical)
            .then(
                b.compliance
                    .non_compliant_weeks()
                    .cmp(&a.compliance.non_compliant_weeks()),
            )
            .then(a.agent_email.cmp(&b.agent_email))
    });
    reviews
}

/// Flagged records, worst status first.
pub fn underperformers(records: &[PerformanceRecord]) -> Vec<&PerformanceRecord> {
    let mut flagged: Vec<&PerformanceRecord> = records.iter().filter(|r| r.is_flagged()).collect();
    flagged.sort_by(|a, b| {
        b.worst_status()
            .cmp(&a.worst_status())
            .then(a.start_date.cmp(&b.start_date))
            .then(a.agent_email.cmp(&b.agent_email))
    });
    flagged
}

fn pct(score: f64) -> String {
    format!("{:.2}%", score * 100.0)
}

pub fn build_report(
    filter: &RecordFilter,
    records: &[PerformanceRecord],
    actions: &[ActionLogEntry],
    scope_to_weeks: bool,
) -> String {
    let reviews = review_agents(records, actions, scope_to_weeks);
    let counts = headcount(records);

    let mut output = String::new();

    let _ = writeln!(output, "# QPerform Monthly Review");
    let _ = writeln!(
        output,
        "Generated for {} ({} records, actions counted {})",
        filter.label(),
        records.len(),
        if scope_to_weeks { "within reviewed weeks" } else { "across all dates" }
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Headcount (AFTE)");

    if counts.is_empty() {
        let _ = writeln!(output, "No records for this period.");
    } else {
        for count in counts.iter() {
            let _ = writeln!(
                output,
                "- {} / {}: {} agents",
                count.client, count.category, count.agents
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Agent Reviews");

    if reviews.is_empty() {
        let _ = writeln!(output, "No agents with records in this period.");
    } else {
        for review in reviews.iter() {
            let _ = writeln!(
                output,
                "- {} ({}): {}/{} compliant weeks, {} action(s) -> {}",
                review.agent_name,
                review.agent_email,
                review.compliance.compliant_weeks,
                review.compliance.total_weeks,
                review.compliance.action_count,
                review.recommendation.action
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Underperformers");

    let flagged = underperformers(records);
    if flagged.is_empty() {
        let _ = writeln!(output, "No Low or Critical flags this period.");
    } else {
        for record in flagged.iter() {
            let _ = writeln!(
                output,
                "- {} ({}) {} {}/{}: Production {} ({}), QA {} ({})",
                record.display_name(),
                record.week_range,
                record.client,
                record.category,
                record.task,
                pct(record.kpi_avg_prod),
                record.prod_status(),
                pct(record.kpi_qa),
                record.qa_status()
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Warning Cases");

    let warnings: Vec<&AgentReview> = reviews
        .iter()
        .filter(|r| r.recommendation.is_critical)
        .collect();
    if warnings.is_empty() {
        let _ = writeln!(output, "No warning cases this period.");
    } else {
        for review in warnings {
            let _ = writeln!(
                output,
                "- {}: {}. {}",
                review.agent_name, review.recommendation.action, review.recommendation.notes
            );
        }
    }

    let reviewed: BTreeSet<&str> = reviews.iter().map(|r| r.agent_email.as_str()).collect();
    let mut recent: Vec<&ActionLogEntry> = actions
        .iter()
        .filter(|a| reviewed.contains(a.agent_email.to_ascii_lowercase().as_str()))
        .collect();
    recent.sort_by(|a, b| b.action_date.cmp(&a.action_date));

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Actions");

    if recent.is_empty() {
        let _ = writeln!(output, "No actions logged for these agents.");
    } else {
        for action in recent.iter().take(10) {
            let _ = writeln!(
                output,
                "- {} {} on {} by {}: {}",
                action.agent_email,
                action.action_type,
                action.action_date,
                action.taken_by,
                action.description
            );
        }
    }

    output
}
