//! Stage aging: how long a deal has sat in its stage relative to what is
//! normal for that kind of stage.
//!
//! Stages are grouped into families by label markers (early, mid, late,
//! delayed). Early stages should move within two weeks; late-stage
//! negotiation can take six.

use serde::Serialize;

use crate::config::{StageAgeConfig, StageBounds};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StageAgeStatus {
    Green,
    Yellow,
    Red,
    Unknown,
}

/// Bounds for the family a stage label belongs to.
pub fn stage_bounds<'a>(stage: &str, config: &'a StageAgeConfig) -> &'a StageBounds {
    let stage_lower = stage.to_lowercase();
    config
        .families
        .iter()
        .find(|family| {
            family
                .markers
                .iter()
                .any(|marker| stage_lower.contains(&marker.to_lowercase()))
        })
        .map(|family| &family.bounds)
        .unwrap_or(&config.default_bounds)
}

/// Classify aging for a deal. `None` days means the stage entry date was unknown.
pub fn classify_stage_age(
    days_in_stage: Option<u32>,
    stage: &str,
    config: &StageAgeConfig,
) -> StageAgeStatus {
    let Some(days) = days_in_stage else {
        return StageAgeStatus::Unknown;
    };

    let bounds = stage_bounds(stage, config);
    match bounds.green_max_days {
        Some(green) if days <= green => StageAgeStatus::Green,
        _ if days <= bounds.yellow_max_days => StageAgeStatus::Yellow,
        _ => StageAgeStatus::Red,
    }
}

/// The healthy baseline for a stage: the longest stay still classed Green.
///
/// Families that are never Green use their Yellow bound. Feeds the focus
/// score's stage-age term.
pub fn max_healthy_stage_days(stage: &str, config: &StageAgeConfig) -> u32 {
    let bounds = stage_bounds(stage, config);
    bounds.green_max_days.unwrap_or(bounds.yellow_max_days)
}
