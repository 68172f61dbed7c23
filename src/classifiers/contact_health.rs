//! Contact health: RED / YELLOW / GREEN from contact count and recency.

use serde::Serialize;

use crate::config::ContactHealthThresholds;
use crate::util::pluralize_days;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthLevel {
    Red,
    Yellow,
    Green,
}

impl HealthLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Red => "RED",
            Self::Yellow => "YELLOW",
            Self::Green => "GREEN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactHealth {
    pub level: HealthLevel,
    pub reason: String,
}

struct HealthRule {
    level: HealthLevel,
    matches: fn(u32, u32, &ContactHealthThresholds) -> bool,
    reason: fn(u32, u32) -> String,
}

// Order matters: the conditions overlap and the first match wins.
const HEALTH_RULES: &[HealthRule] = &[
    HealthRule {
        level: HealthLevel::Red,
        matches: |contacts, _, t| contacts <= t.red_max_contacts,
        reason: |_, _| "No contacts engaged".to_string(),
    },
    HealthRule {
        level: HealthLevel::Red,
        matches: |_, days, t| days > t.red_inactive_after_days,
        reason: |_, days| format!("No activity in {}", pluralize_days(days)),
    },
    HealthRule {
        level: HealthLevel::Yellow,
        matches: |contacts, _, t| contacts <= t.yellow_max_contacts,
        reason: |contacts, _| {
            format!(
                "Single-threaded ({} contact{})",
                contacts,
                if contacts == 1 { "" } else { "s" }
            )
        },
    },
    HealthRule {
        level: HealthLevel::Yellow,
        matches: |_, days, t| days >= t.yellow_inactive_from_days,
        reason: |_, days| format!("Activity slowing ({} since last touch)", pluralize_days(days)),
    },
];

/// Classify a deal's contact health.
///
/// With the default table: RED for zero contacts or more than 14 idle days,
/// YELLOW for a single contact or 7-14 idle days, GREEN otherwise.
pub fn classify_contact_health(
    contact_count: u32,
    days_since_last_activity: u32,
    thresholds: &ContactHealthThresholds,
) -> ContactHealth {
    for rule in HEALTH_RULES {
        if (rule.matches)(contact_count, days_since_last_activity, thresholds) {
            return ContactHealth {
                level: rule.level,
                reason: (rule.reason)(contact_count, days_since_last_activity),
            };
        }
    }

    ContactHealth {
        level: HealthLevel::Green,
        reason: format!(
            "{} contacts, active {} ago",
            contact_count,
            pluralize_days(days_since_last_activity)
        ),
    }
}
