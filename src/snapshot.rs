//! One analytics pass over a refresh's inputs, and the store that publishes
//! the result.
//!
//! A refresh delivers deals, movements and the quarter summary together.
//! [`compute_snapshot`] derives every view from them exactly once; the
//! [`SnapshotStore`] swaps the finished snapshot in so readers never see a
//! half-built one.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;

use crate::classifiers::{
    classify_contact_health, classify_stage_age, classify_threading, primary_risk_reason,
    ContactHealth, RiskReason, StageAgeStatus, ThreadingLevel,
};
use crate::config::{validate_config, EngineConfig};
use crate::error::AnalyticsError;
use crate::input::{deals_from_value, movements_from_value, quarter_from_value};
use crate::focus_score::{rank_by_focus, FocusScore};
use crate::pace::{calculate_pace, PaceToGoal};
use crate::recommended_action::{resolve_action, ActionSignals, RecommendedAction};
use crate::summary::{summarize_pipeline, PipelineSummary};
use crate::transitions::{aggregate_transitions, TransitionMatrix};
use crate::types::{Deal, Movement, QuarterPaceSummary};

/// Everything one refresh delivers.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsInput {
    pub deals: Vec<Deal>,
    pub movements: Vec<Movement>,
    pub quarter: QuarterPaceSummary,
    /// Filter for the transition matrix.
    pub search: Option<String>,
}

impl AnalyticsInput {
    /// Parse a refresh document `{deals, movements, quarter, search}`.
    ///
    /// Records go through the same normalization as [`crate::input`].
    /// Absent collections are empty.
    pub fn from_json(json: &str, config: &EngineConfig) -> Result<Self, AnalyticsError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value, config)
    }

    pub fn from_value(value: &Value, config: &EngineConfig) -> Result<Self, AnalyticsError> {
        let Some(document) = value.as_object() else {
            return Err(AnalyticsError::NotAnObject {
                collection: "input",
                index: 0,
            });
        };
        let present = |key: &str| document.get(key).filter(|v| !v.is_null());

        let deals = match present("deals") {
            Some(v) => deals_from_value(v, config.enterprise_arr_threshold)?,
            None => Vec::new(),
        };
        let movements = match present("movements") {
            Some(v) => movements_from_value(v)?,
            None => Vec::new(),
        };
        let quarter = match present("quarter") {
            Some(v) => quarter_from_value(v)?,
            None => QuarterPaceSummary::default(),
        };
        let search = present("search")
            .and_then(Value::as_str)
            .map(ToString::to_string);

        Ok(Self {
            deals,
            movements,
            quarter,
            search,
        })
    }
}

/// Per-deal derived values shown on a deal card.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealInsight {
    pub deal: Deal,
    pub contact_health: ContactHealth,
    pub threading: ThreadingLevel,
    pub stage_age: StageAgeStatus,
    pub max_healthy_stage_days: u32,
    pub focus: FocusScore,
    pub recommended_action: RecommendedAction,
    pub primary_risk_reason: RiskReason,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    pub snapshot_id: String,
    pub generated_at: DateTime<Utc>,
    /// Ordered by focus score, highest first.
    pub deals: Vec<DealInsight>,
    pub transitions: TransitionMatrix,
    pub pace: PaceToGoal,
    pub summary: PipelineSummary,
}

impl AnalyticsSnapshot {
    pub fn deal(&self, deal_id: &str) -> Option<&DealInsight> {
        self.deals.iter().find(|insight| insight.deal.id == deal_id)
    }
}

pub fn compute_snapshot(input: &AnalyticsInput, config: &EngineConfig) -> AnalyticsSnapshot {
    let deals = rank_by_focus(&input.deals, config)
        .into_iter()
        .map(|ranked| {
            let deal = ranked.deal;
            DealInsight {
                contact_health: classify_contact_health(
                    deal.contact_count,
                    deal.days_since_last_activity,
                    &config.contact_health,
                ),
                threading: classify_threading(
                    deal.contact_count,
                    deal.is_enterprise,
                    &config.threading,
                ),
                stage_age: classify_stage_age(
                    Some(deal.days_in_current_stage),
                    &deal.current_stage,
                    &config.stage_age,
                ),
                max_healthy_stage_days: ranked.max_healthy_stage_days,
                focus: ranked.score,
                recommended_action: resolve_action(&ActionSignals::from(&deal), &config.actions),
                primary_risk_reason: primary_risk_reason(&deal),
                deal,
            }
        })
        .collect();

    let snapshot = AnalyticsSnapshot {
        snapshot_id: uuid::Uuid::new_v4().to_string(),
        generated_at: Utc::now(),
        deals,
        transitions: aggregate_transitions(
            &input.movements,
            input.search.as_deref(),
            &config.transitions,
        ),
        pace: calculate_pace(&input.quarter, &config.pace),
        summary: summarize_pipeline(&input.deals, config),
    };

    log::debug!(
        "Computed snapshot {} ({} deals, {} transitions)",
        snapshot.snapshot_id,
        snapshot.deals.len(),
        snapshot.transitions.filtered_transition_count
    );

    snapshot
}

/// Holds the latest published snapshot.
pub struct SnapshotStore {
    config: EngineConfig,
    current: RwLock<Option<Arc<AnalyticsSnapshot>>>,
}

impl SnapshotStore {
    /// Create an empty store. The configuration is validated here so every
    /// snapshot the store computes uses consistent thresholds.
    pub fn new(config: EngineConfig) -> Result<Self, AnalyticsError> {
        validate_config(&config)?;
        Ok(Self {
            config,
            current: RwLock::new(None),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replace the current snapshot. Returns the one it replaced.
    pub fn publish(&self, snapshot: AnalyticsSnapshot) -> Option<Arc<AnalyticsSnapshot>> {
        self.swap_in(Arc::new(snapshot))
    }

    /// Compute from a refresh's inputs and publish.
    ///
    /// The computation runs outside the lock.
    pub fn refresh(&self, input: &AnalyticsInput) -> Arc<AnalyticsSnapshot> {
        let snapshot = Arc::new(compute_snapshot(input, &self.config));
        self.swap_in(Arc::clone(&snapshot));
        snapshot
    }

    pub fn current(&self) -> Option<Arc<AnalyticsSnapshot>> {
        self.current.read().clone()
    }

    fn swap_in(&self, snapshot: Arc<AnalyticsSnapshot>) -> Option<Arc<AnalyticsSnapshot>> {
        log::info!("Publishing analytics snapshot {}", snapshot.snapshot_id);
        self.current.write().replace(snapshot)
    }
}
