//! Pace to goal: is the quarter-to-date close rate on track to hit the
//! quarterly net-new ARR target?

use serde::{Deserialize, Serialize};

use crate::config::PaceConfig;
use crate::types::QuarterPaceSummary;
use crate::util::{at_least_one, non_negative};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaceStatus {
    OnTrack,
    AtRisk,
    Behind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaceToGoal {
    pub quarterly_target: f64,
    pub remaining_to_target: f64,
    pub current_pace_monthly: f64,
    pub required_pace_monthly: f64,
    pub pace_delta_monthly: f64,
    pub progress_pct: f64,
    pub time_elapsed_pct: f64,
    pub deals_still_needed: u32,
    pub pace_status: PaceStatus,

    /// Net-new ARR still to close this quarter.
    pub gap_to_target: f64,
    /// Won value a linear run rate would have produced by today.
    pub expected_won_to_date: f64,
    pub run_rate_variance: f64,
    pub avg_won_deal_size: f64,
    /// Open pipeline ARR over the gap. `None` without pipeline data or once
    /// the gap is closed.
    pub pipeline_coverage: Option<f64>,
}

pub fn calculate_pace(summary: &QuarterPaceSummary, config: &PaceConfig) -> PaceToGoal {
    let per_month = config.days_per_month;
    let quarterly_target = summary.quarterly_target.unwrap_or(config.quarterly_target);
    let won = non_negative(summary.qtd_won_value);

    let remaining_to_target = non_negative(quarterly_target - summary.starting_arr);
    let gap_to_target = non_negative(remaining_to_target - won);

    let days_elapsed = summary.days_elapsed as f64;
    let days_remaining = summary.days_remaining as f64;

    let current_pace_monthly = won / at_least_one(days_elapsed) * per_month;
    let required_pace_monthly = gap_to_target / at_least_one(days_remaining) * per_month;
    let pace_delta_monthly = current_pace_monthly - required_pace_monthly;

    let progress_pct = if remaining_to_target == 0.0 {
        100.0
    } else {
        won / at_least_one(remaining_to_target) * 100.0
    };

    let total_days = days_elapsed + days_remaining;
    let elapsed_fraction = if total_days > 0.0 {
        days_elapsed / total_days
    } else {
        0.0
    };

    let deal_acv = summary
        .deal_acv
        .filter(|acv| *acv > 0.0)
        .unwrap_or(if config.deal_acv > 0.0 { config.deal_acv } else { 1.0 });
    let deals_still_needed = (gap_to_target / deal_acv).ceil() as u32;

    let pace_status = pace_status(pace_delta_monthly, required_pace_monthly, config.at_risk_tolerance);

    let expected_won_to_date = remaining_to_target * elapsed_fraction;
    let pipeline_coverage = summary
        .open_pipeline_arr
        .filter(|_| gap_to_target > 0.0)
        .map(|open| non_negative(open) / gap_to_target);

    log::debug!(
        "Pace: won {:.0} of {:.0} remaining, delta {:.0}/month -> {:?}",
        won,
        remaining_to_target,
        pace_delta_monthly,
        pace_status
    );

    PaceToGoal {
        quarterly_target,
        remaining_to_target,
        current_pace_monthly,
        required_pace_monthly,
        pace_delta_monthly,
        progress_pct,
        time_elapsed_pct: elapsed_fraction * 100.0,
        deals_still_needed,
        pace_status,
        gap_to_target,
        expected_won_to_date,
        run_rate_variance: won - expected_won_to_date,
        avg_won_deal_size: won / at_least_one(summary.qtd_won_count as f64),
        pipeline_coverage,
    }
}

fn pace_status(delta: f64, required: f64, tolerance: f64) -> PaceStatus {
    if delta >= 0.0 {
        PaceStatus::OnTrack
    } else if delta >= -tolerance * required {
        PaceStatus::AtRisk
    } else {
        PaceStatus::Behind
    }
}
