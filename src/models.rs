use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classify::{self, Metric, Status};

/// One agent's result for one week/client/task combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub agent_email: String,
    pub agent_id: String,
    #[serde(default)]
    pub agent_name: Option<String>,
    pub client: String,
    pub category: String,
    pub task: String,
    pub kpi_qa: f64,
    #[serde(default)]
    pub flag_qa: String,
    pub kpi_avg_prod: f64,
    #[serde(default)]
    pub flag_prod: String,
    pub week_range: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub month_num: i32,
    pub month_name: String,
    pub year_num: i32,
}

impl PerformanceRecord {
    /// Agent name, or the local part of the email when the name is absent.
    pub fn display_name(&self) -> String {
        match self.agent_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => email_local_part(&self.agent_email).to_string(),
        }
    }

    pub fn prod_status(&self) -> Status {
        classify::resolve_flag(Metric::Production, &self.flag_prod, self.kpi_avg_prod)
    }

    pub fn qa_status(&self) -> Status {
        classify::resolve_flag(Metric::Qa, &self.flag_qa, self.kpi_qa)
    }

    pub fn worst_status(&self) -> Status {
        classify::worst_status(self.prod_status(), self.qa_status())
    }

    pub fn is_flagged(&self) -> bool {
        self.prod_status().is_flagged() || self.qa_status().is_flagged()
    }
}

pub fn email_local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

/// A corrective action recorded against an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLogEntry {
    pub id: Uuid,
    pub agent_email: String,
    pub action_type: String,
    pub description: String,
    pub taken_by: String,
    pub action_date: NaiveDate,
    pub client: String,
    pub category: String,
}

/// An action submission before it is assigned an id by the store.
#[derive(Debug, Clone)]
pub struct NewAction {
    pub agent_email: String,
    pub action_type: String,
    pub description: String,
    pub taken_by: String,
    pub action_date: NaiveDate,
    pub client: String,
    pub category: String,
}

impl NewAction {
    pub fn into_entry(self, id: Uuid) -> ActionLogEntry {
        ActionLogEntry {
            id,
            agent_email: self.agent_email,
            action_type: self.action_type,
            description: self.description,
            taken_by: self.taken_by,
            action_date: self.action_date,
            client: self.client,
            category: self.category,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyComplianceResult {
    pub compliant_weeks: usize,
    pub total_weeks: usize,
    pub action_count: usize,
}

impl MonthlyComplianceResult {
    pub fn non_compliant_weeks(&self) -> usize {
        self.total_weeks.saturating_sub(self.compliant_weeks)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub action: String,
    pub is_critical: bool,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentReview {
    pub agent_email: String,
    pub agent_name: String,
    pub compliance: MonthlyComplianceResult,
    pub recommendation: Recommendation,
}

/// Selection of records for a review period.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub year: i32,
    pub month: u32,
    pub client: Option<String>,
    pub category: Option<String>,
    pub email: Option<String>,
}

impl RecordFilter {
    pub fn label(&self) -> String {
        let mut label = format!("{}-{:02}", self.year, self.month);
        for part in [&self.client, &self.category, &self.email].into_iter().flatten() {
            label.push_str(" / ");
            label.push_str(part);
        }
        label
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn display_name_falls_back_to_email_local_part() {
        let mut rec = record("dana.reyes@qperform.io", date(2026, 3, 2), 1.0, 1.0);
        assert_eq!(rec.display_name(), "dana.reyes");
        rec.agent_name = Some("  ".to_string());
        assert_eq!(rec.display_name(), "dana.reyes");
        rec.agent_name = Some("Dana Reyes".to_string());
        assert_eq!(rec.display_name(), "Dana Reyes");
    }

    #[test]
    fn stored_flags_take_precedence_over_scores() {
        let mut rec = record("a@qperform.io", date(2026, 3, 2), 0.90, 1.0);
        assert_eq!(rec.prod_status(), Status::Critical);
        rec.flag_prod = "Good".to_string();
        assert_eq!(rec.prod_status(), Status::Good);
        assert!(!rec.is_flagged());
        rec.flag_qa = "Low".to_string();
        assert_eq!(rec.worst_status(), Status::Low);
        assert!(rec.is_flagged());
    }

    #[test]
    fn compliance_result_serializes_camel_case() {
        let result = MonthlyComplianceResult {
            compliant_weeks: 3,
            total_weeks: 4,
            action_count: 1,
        };
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"{"compliantWeeks":3,"totalWeeks":4,"actionCount":1}"#);
    }

    #[test]
    fn record_deserializes_without_optional_fields() {
        let json = r#"{
            "agent_email": "kai@qperform.io",
            "agent_id": "1042",
            "client": "Northwind",
            "category": "Claims",
            "task": "Intake",
            "kpi_qa": 0.991,
            "kpi_avg_prod": 1.004,
            "week_range": "Mar 2 - Mar 8",
            "start_date": "2026-03-02",
            "end_date": "2026-03-08",
            "month_num": 3,
            "month_name": "March",
            "year_num": 2026
        }"#;
        let rec: PerformanceRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.agent_name, None);
        assert_eq!(rec.qa_status(), Status::Good);
        assert_eq!(rec.prod_status(), Status::Good);
    }

    #[test]
    fn filter_label_lists_scopes() {
        let filter = RecordFilter {
            year: 2026,
            month: 3,
            client: Some("Northwind".to_string()),
            ..RecordFilter::default()
        };
        assert_eq!(filter.label(), "2026-03 / Northwind");
    }
}
