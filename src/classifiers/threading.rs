//! Threading level: how many stakeholders are engaged, relative to deal tier.

use serde::Serialize;

use crate::config::{ThreadingBreakpoints, TierBreakpoints};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ThreadingLevel {
    Critical,
    Low,
    Moderate,
    Healthy,
}

impl ThreadingLevel {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::Healthy => "Healthy",
        }
    }
}

/// Classify threading for a deal. Enterprise deals use the stricter table.
pub fn classify_threading(
    contact_count: u32,
    is_enterprise: bool,
    breakpoints: &ThreadingBreakpoints,
) -> ThreadingLevel {
    let tier = if is_enterprise {
        &breakpoints.enterprise
    } else {
        &breakpoints.standard
    };
    level_for(contact_count, tier)
}

fn level_for(contact_count: u32, tier: &TierBreakpoints) -> ThreadingLevel {
    let table = [
        (tier.healthy, ThreadingLevel::Healthy),
        (tier.moderate, ThreadingLevel::Moderate),
        (tier.low, ThreadingLevel::Low),
    ];

    table
        .iter()
        .find(|(min_contacts, _)| contact_count >= *min_contacts)
        .map(|(_, level)| *level)
        .unwrap_or(ThreadingLevel::Critical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enterprise_breakpoints() {
        let bp = ThreadingBreakpoints::default();
        assert_eq!(classify_threading(0, true, &bp), ThreadingLevel::Critical);
        assert_eq!(classify_threading(1, true, &bp), ThreadingLevel::Low);
        assert_eq!(classify_threading(2, true, &bp), ThreadingLevel::Moderate);
        assert_eq!(classify_threading(3, true, &bp), ThreadingLevel::Healthy);
        assert_eq!(classify_threading(9, true, &bp), ThreadingLevel::Healthy);
    }

    #[test]
    fn test_standard_breakpoints_are_looser() {
        let bp = ThreadingBreakpoints::default();
        assert_eq!(classify_threading(0, false, &bp), ThreadingLevel::Critical);
        assert_eq!(classify_threading(1, false, &bp), ThreadingLevel::Moderate);
        assert_eq!(classify_threading(2, false, &bp), ThreadingLevel::Healthy);
    }

    #[test]
    fn test_standard_never_below_enterprise_for_same_count() {
        let bp = ThreadingBreakpoints::default();
        for contacts in 0..6 {
            assert!(
                classify_threading(contacts, false, &bp) >= classify_threading(contacts, true, &bp)
            );
        }
    }

    #[test]
    fn test_custom_table() {
        let bp = ThreadingBreakpoints {
            enterprise: TierBreakpoints {
                low: 2,
                moderate: 4,
                healthy: 6,
            },
            standard: TierBreakpoints {
                low: 1,
                moderate: 2,
                healthy: 3,
            },
        };
        assert_eq!(classify_threading(1, true, &bp), ThreadingLevel::Critical);
        assert_eq!(classify_threading(5, true, &bp), ThreadingLevel::Moderate);
        assert_eq!(classify_threading(1, false, &bp), ThreadingLevel::Low);
    }
}
