use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{ActionLogEntry, MonthlyComplianceResult, PerformanceRecord};

/// Weeks are keyed by their start date.
pub type WeekKey = NaiveDate;
pub type WeekMap = BTreeMap<WeekKey, Vec<PerformanceRecord>>;

/// Which action log rows count towards an agent's monthly result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionScope {
    /// Every action logged for the agent, regardless of date.
    #[default]
    AllTime,
    /// Only actions dated within `start..=end`.
    Window { start: NaiveDate, end: NaiveDate },
}

impl ActionScope {
    /// Window spanning the first start date to the last end date in `weeks`.
    /// Falls back to `AllTime` when there are no weeks to bound it.
    pub fn covering(weeks: &WeekMap) -> Self {
        let records = || weeks.values().flatten();
        let start = records().map(|r| r.start_date).min();
        let end = records().map(|r| r.end_date).max();
        match (start, end) {
            (Some(start), Some(end)) => ActionScope::Window { start, end },
            _ => ActionScope::AllTime,
        }
    }

    fn includes(&self, date: NaiveDate) -> bool {
        match self {
            ActionScope::AllTime => true,
            ActionScope::Window { start, end } => *start <= date && date <= *end,
        }
    }
}

pub fn is_compliant_week(records: &[PerformanceRecord]) -> bool {
    !records.iter().any(PerformanceRecord::is_flagged)
}

/// Groups records by agent email, then by week.
pub fn group_by_agent(records: &[PerformanceRecord]) -> BTreeMap<String, WeekMap> {
    let mut agents: BTreeMap<String, WeekMap> = BTreeMap::new();
    for record in records {
        agents
            .entry(record.agent_email.to_ascii_lowercase())
            .or_default()
            .entry(record.start_date)
            .or_default()
            .push(record.clone());
    }
    agents
}

pub fn aggregate(
    weeks: &WeekMap,
    actions: &[ActionLogEntry],
    agent_email: &str,
) -> MonthlyComplianceResult {
    aggregate_scoped(weeks, actions, agent_email, ActionScope::AllTime)
}

pub fn aggregate_scoped(
    weeks: &WeekMap,
    actions: &[ActionLogEntry],
    agent_email: &str,
    scope: ActionScope,
) -> MonthlyComplianceResult {
    let compliant_weeks = weeks
        .values()
        .filter(|records| is_compliant_week(records))
        .count();

    let action_count = actions
        .iter()
        .filter(|action| action.agent_email.eq_ignore_ascii_case(agent_email))
        .filter(|action| scope.includes(action.action_date))
        .count();

    MonthlyComplianceResult {
        compliant_weeks,
        total_weeks: weeks.len(),
        action_count,
    }
}
