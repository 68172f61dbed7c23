//! Pipeline-level rollups: health score, risk and engagement counts,
//! enterprise vs standard breakdown, owner rollup, action items, and
//! week-over-week deltas.

use std::collections::HashMap;

use serde::Serialize;

use crate::classifiers::{primary_risk_reason, RiskReason};
use crate::config::EngineConfig;
use crate::types::{Deal, PipelineTotals};
use crate::util::{at_least_one, format_currency};

const UNASSIGNED_OWNER: &str = "Unassigned";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentBreakdown {
    pub deals: u32,
    pub total_arr: f64,
    pub avg_arr: f64,
    pub avg_days_in_stage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerRollup {
    pub owner_name: String,
    pub open_deals: u32,
    pub pipeline_arr: f64,
    pub at_risk_deals: u32,
    pub at_risk_arr: f64,
    pub avg_days_in_stage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskBucket {
    pub reason: RiskReason,
    pub label: &'static str,
    pub deals: u32,
    pub total_arr: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionItemKind {
    ReassignOwnership,
    ReviewStalled,
    ReengageGhosted,
    MaintainMomentum,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    pub kind: ActionItemKind,
    pub urgent: bool,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSummary {
    pub total_deals: u32,
    pub total_arr: f64,
    pub at_risk_count: u32,
    pub at_risk_arr: f64,
    pub ownership_risk_count: u32,
    pub ownership_risk_arr: f64,
    pub stalled_count: u32,
    pub ghosted_count: u32,
    pub healthy_count: u32,
    pub health_score_pct: f64,
    pub recent_activity_count: u32,
    pub recent_activity_arr: f64,
    pub upcoming_meeting_count: u32,
    pub upcoming_meeting_arr: f64,
    pub enterprise: SegmentBreakdown,
    pub standard: SegmentBreakdown,
    /// Sorted by ARR descending.
    pub risk_breakdown: Vec<RiskBucket>,
    /// Sorted by pipeline ARR descending; owners with no ARR are dropped.
    pub owners: Vec<OwnerRollup>,
    pub action_items: Vec<ActionItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricChange {
    pub current: f64,
    pub previous: f64,
    pub change: f64,
    /// `None` when the previous value is zero.
    pub change_pct: Option<f64>,
}

impl MetricChange {
    fn between(current: f64, previous: f64) -> Self {
        let change = current - previous;
        let change_pct = if previous == 0.0 {
            None
        } else {
            Some(change / previous * 100.0)
        };
        Self {
            current,
            previous,
            change,
            change_pct,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekOverWeek {
    pub pipeline_arr: MetricChange,
    pub open_deals: MetricChange,
    pub won_deals: MetricChange,
    pub won_value: MetricChange,
}

pub fn week_over_week(current: &PipelineTotals, previous: &PipelineTotals) -> WeekOverWeek {
    WeekOverWeek {
        pipeline_arr: MetricChange::between(current.pipeline_arr, previous.pipeline_arr),
        open_deals: MetricChange::between(current.open_deals as f64, previous.open_deals as f64),
        won_deals: MetricChange::between(current.won_deals as f64, previous.won_deals as f64),
        won_value: MetricChange::between(current.won_value, previous.won_value),
    }
}

// =============================================================================
// Summary
// =============================================================================

pub fn summarize_pipeline(deals: &[Deal], config: &EngineConfig) -> PipelineSummary {
    let recent_days = config.risk.recent_activity_days;
    let mut summary = PipelineSummary {
        total_deals: deals.len() as u32,
        ..Default::default()
    };

    for deal in deals {
        let arr = deal.arr_value;
        summary.total_arr += arr;

        if deal.is_at_risk {
            summary.at_risk_count += 1;
            summary.at_risk_arr += arr;
        } else {
            summary.healthy_count += 1;
        }
        if deal.has_ownership_risk {
            summary.ownership_risk_count += 1;
            summary.ownership_risk_arr += arr;
        }
        if deal.is_stalled {
            summary.stalled_count += 1;
        }
        if deal.is_ghosted {
            summary.ghosted_count += 1;
        }
        if deal.days_since_last_activity <= recent_days {
            summary.recent_activity_count += 1;
            summary.recent_activity_arr += arr;
        }
        if deal.has_upcoming_meeting {
            summary.upcoming_meeting_count += 1;
            summary.upcoming_meeting_arr += arr;
        }
    }

    summary.health_score_pct =
        summary.healthy_count as f64 / at_least_one(summary.total_deals as f64) * 100.0;

    let (enterprise, standard): (Vec<&Deal>, Vec<&Deal>) =
        deals.iter().partition(|d| d.is_enterprise);
    summary.enterprise = segment(&enterprise);
    summary.standard = segment(&standard);

    summary.risk_breakdown = risk_breakdown(deals);
    summary.owners = owner_rollup(deals);
    summary.action_items = build_action_items(&summary);

    log::debug!(
        "Pipeline summary: {} deals, {} at risk, health {:.1}%",
        summary.total_deals,
        summary.at_risk_count,
        summary.health_score_pct
    );

    summary
}

fn segment(deals: &[&Deal]) -> SegmentBreakdown {
    if deals.is_empty() {
        return SegmentBreakdown::default();
    }
    let count = deals.len() as f64;
    let total_arr: f64 = deals.iter().map(|d| d.arr_value).sum();
    let total_days: f64 = deals.iter().map(|d| d.days_in_current_stage as f64).sum();
    SegmentBreakdown {
        deals: deals.len() as u32,
        total_arr,
        avg_arr: total_arr / count,
        avg_days_in_stage: total_days / count,
    }
}

fn risk_breakdown(deals: &[Deal]) -> Vec<RiskBucket> {
    let mut buckets: Vec<RiskBucket> = Vec::new();
    for deal in deals {
        let reason = primary_risk_reason(deal);
        match buckets.iter_mut().find(|b| b.reason == reason) {
            Some(bucket) => {
                bucket.deals += 1;
                bucket.total_arr += deal.arr_value;
            }
            None => buckets.push(RiskBucket {
                reason,
                label: reason.label(),
                deals: 1,
                total_arr: deal.arr_value,
            }),
        }
    }
    buckets.sort_by(|a, b| {
        b.total_arr
            .partial_cmp(&a.total_arr)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    buckets
}

fn owner_rollup(deals: &[Deal]) -> Vec<OwnerRollup> {
    let mut order: Vec<String> = Vec::new();
    let mut by_owner: HashMap<String, (OwnerRollup, f64)> = HashMap::new();

    for deal in deals {
        let owner = match deal.owner_name.trim() {
            "" => UNASSIGNED_OWNER.to_string(),
            name => name.to_string(),
        };
        let (rollup, total_days) = by_owner.entry(owner.clone()).or_insert_with(|| {
            order.push(owner.clone());
            (
                OwnerRollup {
                    owner_name: owner,
                    open_deals: 0,
                    pipeline_arr: 0.0,
                    at_risk_deals: 0,
                    at_risk_arr: 0.0,
                    avg_days_in_stage: 0.0,
                },
                0.0,
            )
        });
        rollup.open_deals += 1;
        rollup.pipeline_arr += deal.arr_value;
        *total_days += deal.days_in_current_stage as f64;
        if deal.is_at_risk {
            rollup.at_risk_deals += 1;
            rollup.at_risk_arr += deal.arr_value;
        }
    }

    let mut owners: Vec<OwnerRollup> = order
        .into_iter()
        .filter_map(|name| by_owner.remove(&name))
        .map(|(mut rollup, total_days)| {
            rollup.avg_days_in_stage = total_days / at_least_one(rollup.open_deals as f64);
            rollup
        })
        .filter(|rollup| rollup.pipeline_arr > 0.0)
        .collect();

    owners.sort_by(|a, b| {
        b.pipeline_arr
            .partial_cmp(&a.pipeline_arr)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    owners
}

fn build_action_items(summary: &PipelineSummary) -> Vec<ActionItem> {
    let mut items = Vec::new();

    if summary.ownership_risk_count > 0 {
        items.push(ActionItem {
            kind: ActionItemKind::ReassignOwnership,
            urgent: true,
            message: format!(
                "Reassign {} deals ({}) from inactive owners",
                summary.ownership_risk_count,
                format_currency(summary.ownership_risk_arr)
            ),
        });
    }
    if summary.stalled_count > 0 {
        items.push(ActionItem {
            kind: ActionItemKind::ReviewStalled,
            urgent: false,
            message: format!(
                "Review {} stalled deals; they need stage progression or a close decision",
                summary.stalled_count
            ),
        });
    }
    if summary.ghosted_count > 0 {
        items.push(ActionItem {
            kind: ActionItemKind::ReengageGhosted,
            urgent: false,
            message: format!(
                "Re-engage {} ghosted deals with follow-up calls",
                summary.ghosted_count
            ),
        });
    }
    items.push(ActionItem {
        kind: ActionItemKind::MaintainMomentum,
        urgent: false,
        message: format!(
            "Maintain momentum on {} active deals with recent engagement",
            summary.recent_activity_count
        ),
    });

    items
}
