use std::fmt;

/// Role derived from a directory job title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Role {
    Unrecognized,
    TeamLead,
    Supervisor,
    Manager,
    Director,
    Executive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ViewReview,
    LogAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    Denied,
}

#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("title {title:?} does not grant {permission:?} (resolved role: {role})")]
    Denied {
        title: String,
        role: Role,
        permission: Permission,
    },
}

const TITLE_ALIASES: &[(&str, Role)] = &[
    ("ceo", Role::Executive),
    ("chief executive officer", Role::Executive),
    ("coo", Role::Executive),
    ("chief operating officer", Role::Executive),
    ("vp", Role::Executive),
    ("vp operations", Role::Executive),
    ("vice president", Role::Executive),
    ("vice president operations", Role::Executive),
    ("vice president of operations", Role::Executive),
    ("director", Role::Director),
    ("operations director", Role::Director),
    ("director of operations", Role::Director),
    ("senior director", Role::Director),
    ("manager", Role::Manager),
    ("senior manager", Role::Manager),
    ("operations manager", Role::Manager),
    ("senior operations manager", Role::Manager),
    ("account manager", Role::Manager),
    ("supervisor", Role::Supervisor),
    ("operations supervisor", Role::Supervisor),
    ("qa supervisor", Role::Supervisor),
    ("team lead", Role::TeamLead),
    ("team leader", Role::TeamLead),
    ("qa lead", Role::TeamLead),
];

impl Role {
    /// Maps a free-text title to a role. Titles outside the alias table
    /// resolve to `Unrecognized`.
    pub fn from_title(title: &str) -> Role {
        let normalized = normalize_title(title);
        TITLE_ALIASES
            .iter()
            .find(|(alias, _)| *alias == normalized)
            .map(|(_, role)| *role)
            .unwrap_or(Role::Unrecognized)
    }

    pub fn authorize(self, permission: Permission) -> Access {
        let allowed = match permission {
            Permission::ViewReview => self >= Role::TeamLead,
            Permission::LogAction => self >= Role::Supervisor,
        };
        if allowed {
            Access::Granted
        } else {
            Access::Denied
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::Unrecognized => "unrecognized",
            Role::TeamLead => "team lead",
            Role::Supervisor => "supervisor",
            Role::Manager => "manager",
            Role::Director => "director",
            Role::Executive => "executive",
        };
        f.write_str(label)
    }
}

/// Resolves `title` and checks it against `permission`.
pub fn require(title: &str, permission: Permission) -> Result<Role, AccessError> {
    let role = Role::from_title(title);
    match role.authorize(permission) {
        Access::Granted => Ok(role),
        Access::Denied => Err(AccessError::Denied {
            title: title.to_string(),
            role,
            permission,
        }),
    }
}

fn normalize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_normalize_before_matching() {
        assert_eq!(Role::from_title("Vice President, Operations"), Role::Executive);
        assert_eq!(Role::from_title("  Team-Lead "), Role::TeamLead);
        assert_eq!(Role::from_title("Sr. Manager"), Role::Unrecognized);
        assert_eq!(Role::from_title("SENIOR MANAGER"), Role::Manager);
    }

    #[test]
    fn substrings_do_not_grant_roles() {
        assert_eq!(Role::from_title("Assistant to the Regional Manager"), Role::Unrecognized);
        assert_eq!(Role::from_title("Directory Services Analyst"), Role::Unrecognized);
        assert_eq!(Role::from_title(""), Role::Unrecognized);
    }

    #[test]
    fn permissions_follow_role_rank() {
        assert_eq!(Role::TeamLead.authorize(Permission::ViewReview), Access::Granted);
        assert_eq!(Role::TeamLead.authorize(Permission::LogAction), Access::Denied);
        assert_eq!(Role::Supervisor.authorize(Permission::LogAction), Access::Granted);
        assert_eq!(Role::Executive.authorize(Permission::LogAction), Access::Granted);
        assert_eq!(Role::Unrecognized.authorize(Permission::ViewReview), Access::Denied);
    }

    #[test]
    fn require_reports_the_resolved_role() {
        assert_eq!(require("Operations Manager", Permission::LogAction).unwrap(), Role::Manager);
        let err = require("Agent", Permission::ViewReview).unwrap_err();
        assert!(err.to_string().contains("unrecognized"));
    }
}
