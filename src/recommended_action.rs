//! Recommended next action for a deal.
//!
//! A fixed-priority decision table. A deal can satisfy several rules at once
//! (ghosted and stalled and under-threaded); only the highest-priority match
//! is surfaced on the card.

use serde::Serialize;

use crate::config::ActionThresholds;
use crate::types::Deal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    ExecutiveOutreach,
    UrgentFollowUp,
    PipelineReview,
    IdentifyBlockers,
    MultiThread,
    ScheduleMeeting,
    OnTrack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedAction {
    pub kind: ActionKind,
    pub action: &'static str,
    pub short_label: &'static str,
    pub description: &'static str,
    /// 1 is the most urgent.
    pub priority: u8,
}

/// The deal fields the resolver reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionSignals {
    pub is_ghosted: bool,
    pub days_since_last_activity: u32,
    pub is_stalled: bool,
    pub days_in_current_stage: u32,
    pub is_enterprise: bool,
    pub contact_count: u32,
    pub has_upcoming_meeting: bool,
}

impl From<&Deal> for ActionSignals {
    fn from(deal: &Deal) -> Self {
        Self {
            is_ghosted: deal.is_ghosted,
            days_since_last_activity: deal.days_since_last_activity,
            is_stalled: deal.is_stalled,
            days_in_current_stage: deal.days_in_current_stage,
            is_enterprise: deal.is_enterprise,
            contact_count: deal.contact_count,
            has_upcoming_meeting: deal.has_upcoming_meeting,
        }
    }
}

pub struct ActionRule {
    pub result: RecommendedAction,
    pub matches: fn(&ActionSignals, &ActionThresholds) -> bool,
}

const ON_TRACK: RecommendedAction = RecommendedAction {
    kind: ActionKind::OnTrack,
    action: "On Track",
    short_label: "On Track",
    description: "Engagement and stage progression look healthy. Keep the current cadence.",
    priority: 7,
};

/// Evaluated top-down. The last rule always matches.
pub const ACTION_RULES: &[ActionRule] = &[
    ActionRule {
        result: RecommendedAction {
            kind: ActionKind::ExecutiveOutreach,
            action: "Executive Outreach Required",
            short_label: "Exec Outreach",
            description: "The buyer has gone silent. Escalate through an executive sponsor to reopen the conversation.",
            priority: 1,
        },
        matches: |s, t| s.is_ghosted && s.days_since_last_activity >= t.executive_outreach_days,
    },
    ActionRule {
        result: RecommendedAction {
            kind: ActionKind::UrgentFollowUp,
            action: "Urgent Follow-up",
            short_label: "Follow Up",
            description: "No response recently. Follow up with the primary contact today.",
            priority: 2,
        },
        matches: |s, t| s.is_ghosted && s.days_since_last_activity >= t.urgent_follow_up_days,
    },
    ActionRule {
        result: RecommendedAction {
            kind: ActionKind::PipelineReview,
            action: "Pipeline Review Required",
            short_label: "Review",
            description: "The deal has not moved stage in a month. Review qualification and decide to advance or close.",
            priority: 3,
        },
        matches: |s, t| s.is_stalled && s.days_in_current_stage >= t.pipeline_review_days,
    },
    ActionRule {
        result: RecommendedAction {
            kind: ActionKind::IdentifyBlockers,
            action: "Identify Blockers",
            short_label: "Unblock",
            description: "Stage progress has slowed. Find out what is blocking the next step.",
            priority: 4,
        },
        matches: |s, t| s.is_stalled && s.days_in_current_stage >= t.identify_blockers_days,
    },
    ActionRule {
        result: RecommendedAction {
            kind: ActionKind::MultiThread,
            action: "Multi-thread Required",
            short_label: "Multi-thread",
            description: "Enterprise deal relies on too few contacts. Engage additional stakeholders.",
            priority: 5,
        },
        matches: |s, t| s.is_enterprise && s.contact_count < t.enterprise_min_contacts,
    },
    ActionRule {
        result: RecommendedAction {
            kind: ActionKind::ScheduleMeeting,
            action: "Schedule Next Meeting",
            short_label: "Schedule",
            description: "Nothing is on the calendar. Book the next meeting before momentum fades.",
            priority: 6,
        },
        matches: |s, _| !s.has_upcoming_meeting,
    },
    ActionRule {
        result: ON_TRACK,
        matches: |_, _| true,
    },
];

/// Resolve the single highest-priority action for a deal.
pub fn resolve_action(signals: &ActionSignals, thresholds: &ActionThresholds) -> RecommendedAction {
    ACTION_RULES
        .iter()
        .find(|rule| (rule.matches)(signals, thresholds))
        .map(|rule| rule.result)
        .unwrap_or(ON_TRACK)
}

/// Every rule whose condition holds, in priority order.
///
/// The first entry is always what [`resolve_action`] returns.
pub fn matching_rules(signals: &ActionSignals, thresholds: &ActionThresholds) -> Vec<RecommendedAction> {
    ACTION_RULES
        .iter()
        .filter(|rule| (rule.matches)(signals, thresholds))
        .map(|rule| rule.result)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn healthy() -> ActionSignals {
        ActionSignals {
            is_ghosted: false,
            days_since_last_activity: 1,
            is_stalled: false,
            days_in_current_stage: 3,
            is_enterprise: false,
            contact_count: 3,
            has_upcoming_meeting: true,
        }
    }

    fn resolve(s: &ActionSignals) -> RecommendedAction {
        resolve_action(s, &ActionThresholds::default())
    }

    #[test]
    fn test_healthy_deal_is_on_track() {
        let action = resolve(&healthy());
        assert_eq!(action.kind, ActionKind::OnTrack);
        assert_eq!(action.priority, 7);
    }

    #[test]
    fn test_ghosted_thresholds() {
        let mut s = healthy();
        s.is_ghosted = true;
        s.days_since_last_activity = 10;
        assert_eq!(resolve(&s).action, "Executive Outreach Required");

        s.days_since_last_activity = 9;
        assert_eq!(resolve(&s).action, "Urgent Follow-up");

        s.days_since_last_activity = 4;
        assert_eq!(resolve(&s).kind, ActionKind::OnTrack);
    }

    #[test]
    fn test_stalled_thresholds() {
        let mut s = healthy();
        s.is_stalled = true;
        s.days_in_current_stage = 30;
        assert_eq!(resolve(&s).action, "Pipeline Review Required");

        s.days_in_current_stage = 14;
        assert_eq!(resolve(&s).action, "Identify Blockers");

        s.days_in_current_stage = 13;
        assert_eq!(resolve(&s).kind, ActionKind::OnTrack);
    }

    #[test]
    fn test_ghosted_preempts_stalled_and_threading() {
        let s = ActionSignals {
            is_ghosted: true,
            days_since_last_activity: 6,
            is_stalled: true,
            days_in_current_stage: 45,
            is_enterprise: true,
            contact_count: 1,
            has_upcoming_meeting: false,
        };
        let action = resolve(&s);
        assert_eq!(action.kind, ActionKind::UrgentFollowUp);

        let all = matching_rules(&s, &ActionThresholds::default());
        let kinds: Vec<ActionKind> = all.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ActionKind::UrgentFollowUp,
                ActionKind::PipelineReview,
                ActionKind::IdentifyBlockers,
                ActionKind::MultiThread,
                ActionKind::ScheduleMeeting,
                ActionKind::OnTrack,
            ]
        );
    }

    #[test]
    fn test_enterprise_multithread_before_schedule() {
        let mut s = healthy();
        s.is_enterprise = true;
        s.contact_count = 2;
        s.has_upcoming_meeting = false;
        assert_eq!(resolve(&s).action, "Multi-thread Required");

        s.contact_count = 3;
        assert_eq!(resolve(&s).action, "Schedule Next Meeting");
    }

    #[test]
    fn test_resolved_priority_is_lowest_matching() {
        for ghosted in [false, true] {
            for stalled in [false, true] {
                for enterprise in [false, true] {
                    for meeting in [false, true] {
                        for idle in [0, 5, 12] {
                            for stage_days in [0, 14, 40] {
                                for contacts in [0, 2, 4] {
                                    let s = ActionSignals {
                                        is_ghosted: ghosted,
                                        days_since_last_activity: idle,
                                        is_stalled: stalled,
                                        days_in_current_stage: stage_days,
                                        is_enterprise: enterprise,
                                        contact_count: contacts,
                                        has_upcoming_meeting: meeting,
                                    };
                                    let thresholds = ActionThresholds::default();
                                    let first = resolve_action(&s, &thresholds);
                                    let again = resolve_action(&s, &thresholds);
                                    assert_eq!(first, again);

                                    let matching = matching_rules(&s, &thresholds);
                                    let min = matching.iter().map(|a| a.priority).min().unwrap();
                                    assert_eq!(first.priority, min);
                                    assert_eq!(matching[0], first);
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_from_deal() {
        let deal = Deal {
            id: "d1".to_string(),
            is_ghosted: true,
            days_since_last_activity: 11,
            ..Default::default()
        };
        let action = resolve(&ActionSignals::from(&deal));
        assert_eq!(action.kind, ActionKind::ExecutiveOutreach);
        assert_eq!(action.short_label, "Exec Outreach");
    }

    #[test]
    fn test_rule_priorities_are_sequential() {
        for (i, rule) in ACTION_RULES.iter().enumerate() {
            assert_eq!(rule.result.priority as usize, i + 1);
        }
    }
}
