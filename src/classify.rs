use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Metric {
    Production,
    Qa,
}

/// Performance band attached to a metric for a week.
///
/// Variants are declared best to worst so the derived `Ord` doubles as the
/// severity ordering used by [`worst_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Status {
    Great,
    Good,
    Normal,
    Low,
    Critical,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Status::Great => "Great",
            Status::Good => "Good",
            Status::Normal => "Normal",
            Status::Low => "Low",
            Status::Critical => "Critical",
        }
    }

    /// Low and Critical break weekly compliance.
    pub fn is_flagged(self) -> bool {
        matches!(self, Status::Low | Status::Critical)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Production => f.write_str("Production"),
            Metric::Qa => f.write_str("QA"),
        }
    }
}

pub fn classify(metric: Metric, score_fraction: f64) -> Status {
    classify_percent(metric, score_fraction * 100.0)
}

pub fn classify_percent(metric: Metric, pct: f64) -> Status {
    match metric {
        Metric::Production => {
            if pct > 101.0 {
                Status::Great
            } else if pct >= 100.0 {
                Status::Good
            } else if pct >= 99.0 {
                Status::Normal
            } else if pct > 98.0 {
                Status::Low
            } else {
                Status::Critical
            }
        }
        Metric::Qa => {
            if pct >= 100.0 {
                Status::Great
            } else if pct >= 99.0 {
                Status::Good
            } else if pct >= 98.0 {
                Status::Normal
            } else if pct > 97.0 {
                Status::Low
            } else {
                Status::Critical
            }
        }
    }
}

pub fn worst_status(a: Status, b: Status) -> Status {
    a.max(b)
}

/// Reads a flag label coming from stored or imported data. Unknown labels
/// count as Normal.
pub fn parse_flag(label: &str) -> Status {
    match label.trim().to_ascii_lowercase().as_str() {
        "great" => Status::Great,
        "good" => Status::Good,
        "normal" => Status::Normal,
        "low" => Status::Low,
        "critical" => Status::Critical,
        _ => Status::Normal,
    }
}

/// Flag for a metric, derived from the score when the label is blank.
pub fn resolve_flag(metric: Metric, label: &str, score_fraction: f64) -> Status {
    if label.trim().is_empty() {
        classify(metric, score_fraction)
    } else {
        parse_flag(label)
    }
}
