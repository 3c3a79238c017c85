use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use uuid::Uuid;

use crate::models::{ActionLogEntry, PerformanceRecord};

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported file type for {0} (expected .csv or .json)")]
    UnsupportedFormat(PathBuf),
    #[error("row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Csv,
    Json,
}

fn format_of(path: &Path) -> Result<Format, ImportError> {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("csv") => Ok(Format::Csv),
        Some("json") => Ok(Format::Json),
        _ => Err(ImportError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Action row as it arrives from an export; the id is optional.
#[derive(Debug, Deserialize)]
struct ActionRow {
    #[serde(default)]
    id: Option<Uuid>,
    agent_email: String,
    action_type: String,
    description: String,
    taken_by: String,
    action_date: NaiveDate,
    client: String,
    category: String,
}

pub fn parse_records(path: &Path) -> Result<Vec<PerformanceRecord>, ImportError> {
    let records: Vec<PerformanceRecord> = read_rows(path)?;
    for (idx, record) in records.iter().enumerate() {
        validate_record(record).map_err(|reason| ImportError::InvalidRow { row: idx + 1, reason })?;
    }
    Ok(records)
}

pub fn parse_actions(path: &Path) -> Result<Vec<ActionLogEntry>, ImportError> {
    let rows: Vec<ActionRow> = read_rows(path)?;
    rows.into_iter()
        .enumerate()
        .map(|(idx, row)| {
            validate_email(&row.agent_email)
                .and_then(|_| require_text("action_type", &row.action_type))
                .and_then(|_| require_text("taken_by", &row.taken_by))
                .map_err(|reason| ImportError::InvalidRow { row: idx + 1, reason })?;
            Ok(ActionLogEntry {
                id: row.id.unwrap_or_else(Uuid::new_v4),
                agent_email: row.agent_email,
                action_type: row.action_type,
                description: row.description,
                taken_by: row.taken_by,
                action_date: row.action_date,
                client: row.client,
                category: row.category,
            })
        })
        .collect()
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, ImportError> {
    let format = format_of(path)?;
    let file = File::open(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    match format {
        Format::Csv => parse_csv(file),
        Format::Json => Ok(serde_json::from_reader(BufReader::new(file))?),
    }
}

fn parse_csv<T: DeserializeOwned, R: std::io::Read>(reader: R) -> Result<Vec<T>, ImportError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut rows = Vec::new();
    for result in reader.deserialize::<T>() {
        rows.push(result?);
    }
    Ok(rows)
}

pub fn validate_record(record: &PerformanceRecord) -> Result<(), String> {
    validate_email(&record.agent_email)?;
    require_text("agent_id", &record.agent_id)?;
    require_text("client", &record.client)?;
    for (name, score) in [("kpi_avg_prod", record.kpi_avg_prod), ("kpi_qa", record.kpi_qa)] {
        if !score.is_finite() || score < 0.0 {
            return Err(format!("{name} must be a non-negative number, got {score}"));
        }
    }
    if !(1..=12).contains(&record.month_num) {
        return Err(format!("month_num must be 1-12, got {}", record.month_num));
    }
    if record.start_date > record.end_date {
        return Err(format!(
            "start_date {} is after end_date {}",
            record.start_date, record.end_date
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), String> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(format!("invalid agent_email {email:?}")),
    }
}

fn require_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{field} is required"))
    } else {
        Ok(())
    }
}

/// Stable key used to keep re-imports idempotent.
pub fn record_source_key(record: &PerformanceRecord) -> String {
    format!(
        "{}|{}|{}|{}|{}",
        record.agent_email.to_ascii_lowercase(),
        record.client,
        record.category,
        record.task,
        record.start_date
    )
}

/// Stable key for an action row, so re-imported or re-seeded actions are
/// stored once even when each parse assigns a fresh id.
pub fn action_source_key(action: &ActionLogEntry) -> String {
    format!(
        "{}|{}|{}|{}|{}",
        action.agent_email.to_ascii_lowercase(),
        action.action_type,
        action.action_date,
        action.taken_by.to_ascii_lowercase(),
        action.description
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Status;
    use crate::models::fixtures::{action, date, record};

    const CSV: &str = "\
agent_email,agent_id,agent_name,client,category,task,kpi_qa,flag_qa,kpi_avg_prod,flag_prod,week_range,start_date,end_date,month_num,month_name,year_num
kai@qperform.io,1042,,Northwind,Claims,Intake,0.991,,1.004,Good,Mar 2 - Mar 8,2026-03-02,2026-03-08,3,March,2026
mo@qperform.io,1043,Mo Aziz,Northwind,Claims,Intake,0.96,Critical,0.99,,Mar 2 - Mar 8,2026-03-02,2026-03-08,3,March,2026
";

    #[test]
    fn csv_rows_map_to_records() {
        let records: Vec<PerformanceRecord> = parse_csv(CSV.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].agent_name, None);
        assert_eq!(records[0].display_name(), "kai");
        assert_eq!(records[0].qa_status(), Status::Good);
        assert_eq!(records[1].qa_status(), Status::Critical);
        assert_eq!(records[1].prod_status(), Status::Normal);
        assert!(records.iter().all(|r| validate_record(r).is_ok()));
    }

    #[test]
    fn validation_rejects_bad_shapes() {
        let mut rec = record("kai@qperform.io", date(2026, 3, 2), 1.0, 1.0);
        rec.agent_email = "kai".to_string();
        assert!(validate_record(&rec).unwrap_err().contains("agent_email"));

        let mut rec = record("kai@qperform.io", date(2026, 3, 2), f64::NAN, 1.0);
        assert!(validate_record(&rec).unwrap_err().contains("kpi_avg_prod"));
        rec.kpi_avg_prod = 1.0;
        rec.month_num = 13;
        assert!(validate_record(&rec).unwrap_err().contains("month_num"));
        rec.month_num = 3;
        rec.end_date = date(2026, 3, 1);
        assert!(validate_record(&rec).unwrap_err().contains("after end_date"));
    }

    #[test]
    fn unknown_extensions_are_rejected() {
        let err = format_of(Path::new("scores.xlsx")).unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFormat(_)));
        assert_eq!(format_of(Path::new("scores.CSV")).unwrap(), Format::Csv);
    }

    const ACTIONS_CSV: &str = "\
agent_email,action_type,description,taken_by,action_date,client,category
mo@qperform.io,Coaching,ok,sup@qperform.io,2026-03-12,Northwind,Claims
";

    #[test]
    fn action_ids_are_generated_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("actions.json");
        std::fs::write(
            &path,
            r#"[{"agent_email":"mo@qperform.io","action_type":"Written Warning","description":"Two low QA weeks","taken_by":"sup@qperform.io","action_date":"2026-03-12","client":"Northwind","category":"Claims"}]"#,
        )
        .unwrap();
        let actions = parse_actions(&path).unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].action_type, "Written Warning");
        assert!(!actions[0].id.is_nil());
    }

    #[test]
    fn reparsing_an_action_file_yields_the_same_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("actions.csv");
        std::fs::write(&path, ACTIONS_CSV).unwrap();

        let first = parse_actions(&path).unwrap();
        let second = parse_actions(&path).unwrap();
        assert_ne!(first[0].id, second[0].id);
        assert_eq!(action_source_key(&first[0]), action_source_key(&second[0]));
    }

    #[test]
    fn action_keys_separate_distinct_actions() {
        let base = action("mo@qperform.io", date(2026, 3, 12));
        let mut upper = base.clone();
        upper.agent_email = "MO@qperform.io".to_string();
        assert_eq!(action_source_key(&base), action_source_key(&upper));

        let mut later = base.clone();
        later.action_date = date(2026, 3, 19);
        assert_ne!(action_source_key(&base), action_source_key(&later));

        let mut escalated = base.clone();
        escalated.action_type = "Written Warning".to_string();
        assert_ne!(action_source_key(&base), action_source_key(&escalated));
    }

    #[test]
    fn invalid_action_rows_report_their_position() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("actions.csv");
        std::fs::write(
            &path,
            format!("{ACTIONS_CSV}nobody,Coaching,bad,sup@qperform.io,2026-03-12,Northwind,Claims\n"),
        )
        .unwrap();
        let err = parse_actions(&path).unwrap_err();
        assert!(matches!(err, ImportError::InvalidRow { row: 2, .. }));
    }

    #[test]
    fn source_keys_ignore_email_case() {
        let a = record("Kai@qperform.io", date(2026, 3, 2), 1.0, 1.0);
        let b = record("kai@qperform.io", date(2026, 3, 2), 0.5, 0.5);
        assert_eq!(record_source_key(&a), record_source_key(&b));
    }
}
