use crate::models::{MonthlyComplianceResult, Recommendation};

pub const NO_ACTION: &str = "No Action Required";
pub const LEVEL_1: &str = "Level 1: Focused Coaching";
pub const LEVEL_2: &str = "Level 2: Written Warning Required";
pub const LEVEL_3: &str = "Level 3: Final Warning / Escalation";
pub const REVIEW: &str = "Review Required";

/// Picks the recommendation level for an agent's month. First matching rule wins.
pub fn recommend(result: &MonthlyComplianceResult) -> Recommendation {
    let non_compliant = result.non_compliant_weeks();
    let total = result.total_weeks;
    let actions = result.action_count;

    let (action, is_critical, notes) = match (non_compliant, actions) {
        (0, _) => (
            NO_ACTION,
            false,
            format!("All {total} week(s) compliant."),
        ),
        (1, 0) => (
            LEVEL_1,
            false,
            format!("1 of {total} week(s) non-compliant with no prior action logged. Schedule a coaching session."),
        ),
        (n, 0) => (
            LEVEL_2,
            true,
            format!("{n} of {total} week(s) non-compliant with no prior action logged. Issue a written warning."),
        ),
        (n, a) if n >= 2 => (
            LEVEL_3,
            true,
            format!("{n} of {total} week(s) non-compliant after {a} logged action(s). Escalate with a final warning."),
        ),
        (n, a) => (
            REVIEW,
            true,
            format!("{n} of {total} week(s) non-compliant with {a} action(s) already logged. Review manually."),
        ),
    };

    Recommendation {
        action: action.to_string(),
        is_critical,
        notes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(total: usize, compliant: usize, actions: usize) -> MonthlyComplianceResult {
        MonthlyComplianceResult {
            compliant_weeks: compliant,
            total_weeks: total,
            action_count: actions,
        }
    }

    #[test]
    fn fully_compliant_needs_no_action() {
        let rec = recommend(&result(4, 4, 0));
        assert_eq!(rec.action, NO_ACTION);
        assert!(!rec.is_critical);
        assert_eq!(rec.notes, "All 4 week(s) compliant.");
        assert_eq!(recommend(&result(4, 4, 3)).action, NO_ACTION);
    }

    #[test]
    fn single_miss_without_actions_is_coaching() {
        let rec = recommend(&result(4, 3, 0));
        assert_eq!(rec.action, LEVEL_1);
        assert!(!rec.is_critical);
        assert!(rec.notes.starts_with("1 of 4"));
    }

    #[test]
    fn repeated_misses_without_actions_need_a_written_warning() {
        let rec = recommend(&result(4, 2, 0));
        assert_eq!(rec.action, LEVEL_2);
        assert!(rec.is_critical);
        assert!(rec.notes.starts_with("2 of 4"));
    }

    #[test]
    fn repeated_misses_after_actions_escalate() {
        let rec = recommend(&result(4, 2, 1));
        assert_eq!(rec.action, LEVEL_3);
        assert!(rec.is_critical);
        assert!(rec.notes.contains("after 1 logged action(s)"));
    }

    #[test]
    fn single_miss_after_actions_falls_back_to_review() {
        let rec = recommend(&result(4, 3, 1));
        assert_eq!(rec.action, REVIEW);
        assert!(rec.is_critical);
    }

    #[test]
    fn empty_month_needs_no_action() {
        assert_eq!(recommend(&result(0, 0, 2)).action, NO_ACTION);
    }

    #[test]
    fn recommendation_is_deterministic() {
        for total in 0..6 {
            for compliant in 0..=total {
                for actions in 0..3 {
                    let input = result(total, compliant, actions);
                    assert_eq!(recommend(&input), recommend(&input));
                }
            }
        }
    }

    #[test]
    fn recommendation_serializes_camel_case() {
        let json = serde_json::to_value(recommend(&result(4, 2, 0))).unwrap();
        assert_eq!(json["action"], LEVEL_2);
        assert_eq!(json["isCritical"], true);
        assert!(json["notes"].is_string());
    }
}
