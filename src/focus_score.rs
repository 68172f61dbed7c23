use serde::Serialize;

use crate::classifiers::stage_age::max_healthy_stage_days;
use crate::config::{EngineConfig, FocusConfig};
use crate::types::Deal;
use crate::util::{at_least_one, non_negative};

/// Ceiling of each of the four sub-scores.
pub const SUB_SCORE_MAX: f64 = 25.0;

const HIGH_PRIORITY_MIN: u32 = 75;
const MEDIUM_PRIORITY_MIN: u32 = 50;
const LOW_PRIORITY_MIN: u32 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusScoreInputs {
    pub days_in_current_stage: u32,
    pub max_healthy_stage_days: u32,
    pub days_since_last_activity: u32,
    pub contact_count: u32,
    pub arr_value: f64,
    pub max_arr_in_cohort: f64,
}

impl FocusScoreInputs {
    pub fn from_deal(deal: &Deal, max_healthy_stage_days: u32, max_arr_in_cohort: f64) -> Self {
        Self {
            days_in_current_stage: deal.days_in_current_stage,
            max_healthy_stage_days,
            days_since_last_activity: deal.days_since_last_activity,
            contact_count: deal.contact_count,
            arr_value: deal.arr_value,
            max_arr_in_cohort,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FocusPriority {
    High,
    Medium,
    Low,
    NeedsAttention,
}

impl FocusPriority {
    pub fn from_score(score: u32) -> Self {
        if score >= HIGH_PRIORITY_MIN {
            Self::High
        } else if score >= MEDIUM_PRIORITY_MIN {
            Self::Medium
        } else if score >= LOW_PRIORITY_MIN {
            Self::Low
        } else {
            Self::NeedsAttention
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
            Self::NeedsAttention => "Needs Attention",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusScore {
    pub stage_age_score: f64,
    pub engagement_score: f64,
    pub threading_score: f64,
    pub size_score: f64,
    pub focus_score: u32,
    pub priority: FocusPriority,
}

/// A deal with its focus score, in ranked order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusRankedDeal {
    pub deal: Deal,
    pub max_healthy_stage_days: u32,
    pub score: FocusScore,
}

/// Compute the four sub-scores and their rounded sum.
///
/// - stage age: `25 × (1 − daysInStage / maxHealthyStageDays)`
/// - engagement: `25 × (1 − idleDays / engagementWindow)`
/// - threading: `25 × contacts / threadingTarget`
/// - size: `25 × arr / maxArrInCohort`, zero for an empty cohort
///
/// Every term is clamped to [0, 25] before summing.
pub fn calculate_focus_score(inputs: &FocusScoreInputs, config: &FocusConfig) -> FocusScore {
    let stage_age_score = clamp_sub_score(
        SUB_SCORE_MAX
            * (1.0
                - inputs.days_in_current_stage as f64
                    / at_least_one(inputs.max_healthy_stage_days as f64)),
    );

    let engagement_score = clamp_sub_score(
        SUB_SCORE_MAX
            * (1.0
                - inputs.days_since_last_activity as f64
                    / positive_or_one(config.engagement_window_days)),
    );

    let threading_score = clamp_sub_score(
        SUB_SCORE_MAX * inputs.contact_count as f64
            / positive_or_one(config.threading_target_contacts),
    );

    let max_arr = non_negative(inputs.max_arr_in_cohort);
    let size_score = if max_arr > 0.0 {
        clamp_sub_score(SUB_SCORE_MAX * non_negative(inputs.arr_value) / max_arr)
    } else {
        0.0
    };

    let total = stage_age_score + engagement_score + threading_score + size_score;
    let focus_score = (total.round() as u32).min(100);

    FocusScore {
        stage_age_score,
        engagement_score,
        threading_score,
        size_score,
        focus_score,
        priority: FocusPriority::from_score(focus_score),
    }
}

/// Score a cohort of deals and order them by focus score, highest first.
///
/// `maxArrInCohort` is the largest ARR in `deals`; each deal's healthy stage
/// baseline comes from the stage-age table. The sort is stable, so deals
/// with equal scores keep their input order.
pub fn rank_by_focus(deals: &[Deal], config: &EngineConfig) -> Vec<FocusRankedDeal> {
    let max_arr_in_cohort = deals
        .iter()
        .map(|d| non_negative(d.arr_value))
        .fold(0.0_f64, f64::max);

    let mut ranked: Vec<FocusRankedDeal> = deals
        .iter()
        .map(|deal| {
            let baseline = max_healthy_stage_days(&deal.current_stage, &config.stage_age);
            let inputs = FocusScoreInputs::from_deal(deal, baseline, max_arr_in_cohort);
            FocusRankedDeal {
                deal: deal.clone(),
                max_healthy_stage_days: baseline,
                score: calculate_focus_score(&inputs, &config.focus),
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.score.focus_score.cmp(&a.score.focus_score));

    log::debug!(
        "Ranked {} deals by focus (max cohort ARR {})",
        ranked.len(),
        max_arr_in_cohort
    );

    ranked
}

fn clamp_sub_score(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, SUB_SCORE_MAX)
}

fn positive_or_one(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        1.0
    }
}
