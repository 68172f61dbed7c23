//! Engine configuration: every threshold table and default constant the
//! classifiers and calculators read.
//!
//! Nothing in the engine reads module-level tuning constants. Callers build an
//! [`EngineConfig`] (usually `Default`, or loaded from JSON) and pass the
//! relevant table into each component, so alternate quarters and rule sets
//! can be evaluated side by side.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AnalyticsError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// ARR at or above which a deal counts as enterprise.
    #[serde(default = "default_enterprise_arr_threshold")]
    pub enterprise_arr_threshold: f64,
    #[serde(default)]
    pub contact_health: ContactHealthThresholds,
    #[serde(default)]
    pub threading: ThreadingBreakpoints,
    #[serde(default)]
    pub focus: FocusConfig,
    #[serde(default)]
    pub actions: ActionThresholds,
    #[serde(default)]
    pub pace: PaceConfig,
    #[serde(default)]
    pub stage_age: StageAgeConfig,
    #[serde(default)]
    pub risk: RiskThresholds,
    #[serde(default)]
    pub transitions: TransitionConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enterprise_arr_threshold: default_enterprise_arr_threshold(),
            contact_health: ContactHealthThresholds::default(),
            threading: ThreadingBreakpoints::default(),
            focus: FocusConfig::default(),
            actions: ActionThresholds::default(),
            pace: PaceConfig::default(),
            stage_age: StageAgeConfig::default(),
            risk: RiskThresholds::default(),
            transitions: TransitionConfig::default(),
        }
    }
}

fn default_enterprise_arr_threshold() -> f64 {
    100_000.0
}

impl EngineConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, AnalyticsError> {
        let config: EngineConfig = serde_json::from_str(json)
            .map_err(|e| AnalyticsError::InvalidConfig(format!("Failed to parse config: {}", e)))?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, AnalyticsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

// =============================================================================
// Contact Health
// =============================================================================

/// RED/YELLOW/GREEN contact health boundaries.
///
/// Two windows exist in the dashboard: the canonical 7-14 day YELLOW window
/// (`Default`) and the 15-21 day window used by the deal-detail view
/// (`extended_window`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactHealthThresholds {
    /// RED at or below this many contacts.
    #[serde(default)]
    pub red_max_contacts: u32,
    /// RED when inactive for more than this many days.
    #[serde(default = "default_red_inactive_after_days")]
    pub red_inactive_after_days: u32,
    /// YELLOW at or below this many contacts.
    #[serde(default = "default_yellow_max_contacts")]
    pub yellow_max_contacts: u32,
    /// YELLOW once inactive for at least this many days.
    #[serde(default = "default_yellow_inactive_from_days")]
    pub yellow_inactive_from_days: u32,
}

impl Default for ContactHealthThresholds {
    fn default() -> Self {
        Self {
            red_max_contacts: 0,
            red_inactive_after_days: default_red_inactive_after_days(),
            yellow_max_contacts: default_yellow_max_contacts(),
            yellow_inactive_from_days: default_yellow_inactive_from_days(),
        }
    }
}

impl ContactHealthThresholds {
    /// YELLOW for 15-21 days of inactivity, RED beyond 21.
    pub fn extended_window() -> Self {
        Self {
            red_max_contacts: 0,
            red_inactive_after_days: 21,
            yellow_max_contacts: 1,
            yellow_inactive_from_days: 15,
        }
    }
}

fn default_red_inactive_after_days() -> u32 {
    14
}

fn default_yellow_max_contacts() -> u32 {
    1
}

fn default_yellow_inactive_from_days() -> u32 {
    7
}

// =============================================================================
// Threading
// =============================================================================

/// Minimum contact counts to reach each threading level, per deal tier.
/// Anything below `low` is Critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierBreakpoints {
    pub low: u32,
    pub moderate: u32,
    pub healthy: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadingBreakpoints {
    #[serde(default = "default_enterprise_breakpoints")]
    pub enterprise: TierBreakpoints,
    #[serde(default = "default_standard_breakpoints")]
    pub standard: TierBreakpoints,
}

impl Default for ThreadingBreakpoints {
    fn default() -> Self {
        Self {
            enterprise: default_enterprise_breakpoints(),
            standard: default_standard_breakpoints(),
        }
    }
}

fn default_enterprise_breakpoints() -> TierBreakpoints {
    TierBreakpoints {
        low: 1,
        moderate: 2,
        healthy: 3,
    }
}

fn default_standard_breakpoints() -> TierBreakpoints {
    TierBreakpoints {
        low: 1,
        moderate: 1,
        healthy: 2,
    }
}

// =============================================================================
// Focus Score
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusConfig {
    /// Days of inactivity at which the engagement sub-score reaches zero.
    #[serde(default = "default_engagement_window_days")]
    pub engagement_window_days: f64,
    /// Contacts needed for a full threading sub-score.
    #[serde(default = "default_threading_target_contacts")]
    pub threading_target_contacts: f64,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            engagement_window_days: default_engagement_window_days(),
            threading_target_contacts: default_threading_target_contacts(),
        }
    }
}

fn default_engagement_window_days() -> f64 {
    21.0
}

fn default_threading_target_contacts() -> f64 {
    3.0
}

// =============================================================================
// Recommended Action
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionThresholds {
    #[serde(default = "default_executive_outreach_days")]
    pub executive_outreach_days: u32,
    #[serde(default = "default_urgent_follow_up_days")]
    pub urgent_follow_up_days: u32,
    #[serde(default = "default_pipeline_review_days")]
    pub pipeline_review_days: u32,
    #[serde(default = "default_identify_blockers_days")]
    pub identify_blockers_days: u32,
    #[serde(default = "default_enterprise_min_contacts")]
    pub enterprise_min_contacts: u32,
}

impl Default for ActionThresholds {
    fn default() -> Self {
        Self {
            executive_outreach_days: default_executive_outreach_days(),
            urgent_follow_up_days: default_urgent_follow_up_days(),
            pipeline_review_days: default_pipeline_review_days(),
            identify_blockers_days: default_identify_blockers_days(),
            enterprise_min_contacts: default_enterprise_min_contacts(),
        }
    }
}

fn default_executive_outreach_days() -> u32 {
    10
}

fn default_urgent_follow_up_days() -> u32 {
    5
}

fn default_pipeline_review_days() -> u32 {
    30
}

fn default_identify_blockers_days() -> u32 {
    14
}

fn default_enterprise_min_contacts() -> u32 {
    3
}

// =============================================================================
// Pace to Goal
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaceConfig {
    /// Used when the quarter summary carries no target of its own.
    #[serde(default = "default_quarterly_target")]
    pub quarterly_target: f64,
    /// Assumed average deal size for the deals-still-needed estimate.
    #[serde(default = "default_deal_acv")]
    pub deal_acv: f64,
    /// Fraction of the required pace a shortfall may reach before BEHIND.
    #[serde(default = "default_at_risk_tolerance")]
    pub at_risk_tolerance: f64,
    #[serde(default = "default_days_per_month")]
    pub days_per_month: f64,
}

impl Default for PaceConfig {
    fn default() -> Self {
        Self {
            quarterly_target: default_quarterly_target(),
            deal_acv: default_deal_acv(),
            at_risk_tolerance: default_at_risk_tolerance(),
            days_per_month: default_days_per_month(),
        }
    }
}

fn default_quarterly_target() -> f64 {
    1_600_000.0
}

fn default_deal_acv() -> f64 {
    40_000.0
}

fn default_at_risk_tolerance() -> f64 {
    0.15
}

fn default_days_per_month() -> f64 {
    30.0
}

// =============================================================================
// Stage Age
// =============================================================================

/// Aging bounds for a family of stages. `green_max_days: None` means the
/// family is never Green (delayed/stalled stages).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageBounds {
    #[serde(default)]
    pub green_max_days: Option<u32>,
    pub yellow_max_days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageFamily {
    pub name: String,
    /// Lowercase substrings matched against the stage label.
    pub markers: Vec<String>,
    pub bounds: StageBounds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageAgeConfig {
    /// Checked in order; the first family with a matching marker wins.
    #[serde(default = "default_stage_families")]
    pub families: Vec<StageFamily>,
    #[serde(default = "default_stage_bounds")]
    pub default_bounds: StageBounds,
}

impl Default for StageAgeConfig {
    fn default() -> Self {
        Self {
            families: default_stage_families(),
            default_bounds: default_stage_bounds(),
        }
    }
}

fn family(name: &str, markers: &[&str], green: Option<u32>, yellow: u32) -> StageFamily {
    StageFamily {
        name: name.to_string(),
        markers: markers.iter().map(|m| m.to_string()).collect(),
        bounds: StageBounds {
            green_max_days: green,
            yellow_max_days: yellow,
        },
    }
}

fn default_stage_families() -> Vec<StageFamily> {
    vec![
        family("delayed", &["stalled", "delayed"], None, 14),
        family(
            "early",
            &["nbm", "discovery", "qualification", "prospecting", "lead", "scheduled"],
            Some(14),
            30,
        ),
        family("mid", &["technical", "evaluation", "demo", "proposal"], Some(30), 45),
        family("late", &["negotiation", "contract", "closing", "final"], Some(45), 60),
    ]
}

fn default_stage_bounds() -> StageBounds {
    StageBounds {
        green_max_days: Some(21),
        yellow_max_days: 45,
    }
}

// =============================================================================
// Risk Flags
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskThresholds {
    /// Activity within this many days clears stalled and ghosted.
    #[serde(default = "default_recent_activity_days")]
    pub recent_activity_days: u32,
    #[serde(default = "default_enterprise_stalled_days")]
    pub enterprise_stalled_days: u32,
    #[serde(default = "default_standard_stalled_days")]
    pub standard_stalled_days: u32,
    #[serde(default = "default_enterprise_ghosted_days")]
    pub enterprise_ghosted_days: u32,
    #[serde(default = "default_standard_ghosted_days")]
    pub standard_ghosted_days: u32,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            recent_activity_days: default_recent_activity_days(),
            enterprise_stalled_days: default_enterprise_stalled_days(),
            standard_stalled_days: default_standard_stalled_days(),
            enterprise_ghosted_days: default_enterprise_ghosted_days(),
            standard_ghosted_days: default_standard_ghosted_days(),
        }
    }
}

fn default_recent_activity_days() -> u32 {
    7
}

fn default_enterprise_stalled_days() -> u32 {
    30
}

fn default_standard_stalled_days() -> u32 {
    14
}

fn default_enterprise_ghosted_days() -> u32 {
    10
}

fn default_standard_ghosted_days() -> u32 {
    5
}

// =============================================================================
// Transitions
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionConfig {
    /// A stage is closed (won or lost) when its label contains one of these.
    #[serde(default = "default_closed_stage_markers")]
    pub closed_stage_markers: Vec<String>,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            closed_stage_markers: default_closed_stage_markers(),
        }
    }
}

fn default_closed_stage_markers() -> Vec<String> {
    vec!["won".to_string(), "lost".to_string()]
}

// =============================================================================
// Validation
// =============================================================================

/// Validate that every table is internally consistent.
pub fn validate_config(config: &EngineConfig) -> Result<(), AnalyticsError> {
    let invalid = |msg: String| Err(AnalyticsError::InvalidConfig(msg));

    if !(config.enterprise_arr_threshold.is_finite() && config.enterprise_arr_threshold >= 0.0) {
        return invalid("enterpriseArrThreshold must be a non-negative number".into());
    }

    let health = &config.contact_health;
    if health.yellow_max_contacts < health.red_max_contacts {
        return invalid("contactHealth.yellowMaxContacts must be >= redMaxContacts".into());
    }
    if health.yellow_inactive_from_days > health.red_inactive_after_days {
        return invalid(
            "contactHealth.yellowInactiveFromDays must be <= redInactiveAfterDays".into(),
        );
    }

    for (tier, bp) in [
        ("enterprise", &config.threading.enterprise),
        ("standard", &config.threading.standard),
    ] {
        if !(bp.low <= bp.moderate && bp.moderate <= bp.healthy) {
            return invalid(format!(
                "threading.{} breakpoints must be non-decreasing (low <= moderate <= healthy)",
                tier
            ));
        }
    }

    if !is_positive(config.focus.engagement_window_days) {
        return invalid("focus.engagementWindowDays must be positive".into());
    }
    if !is_positive(config.focus.threading_target_contacts) {
        return invalid("focus.threadingTargetContacts must be positive".into());
    }

    let actions = &config.actions;
    if actions.urgent_follow_up_days > actions.executive_outreach_days {
        return invalid("actions.urgentFollowUpDays must be <= executiveOutreachDays".into());
    }
    if actions.identify_blockers_days > actions.pipeline_review_days {
        return invalid("actions.identifyBlockersDays must be <= pipelineReviewDays".into());
    }

    let pace = &config.pace;
    if !(pace.quarterly_target.is_finite() && pace.quarterly_target >= 0.0) {
        return invalid("pace.quarterlyTarget must be a non-negative number".into());
    }
    if !is_positive(pace.deal_acv) {
        return invalid("pace.dealAcv must be positive".into());
    }
    if !(0.0..=1.0).contains(&pace.at_risk_tolerance) {
        return invalid("pace.atRiskTolerance must be between 0 and 1".into());
    }
    if !is_positive(pace.days_per_month) {
        return invalid("pace.daysPerMonth must be positive".into());
    }

    let stage_age = &config.stage_age;
    for bounds in stage_age
        .families
        .iter()
        .map(|f| (f.name.as_str(), &f.bounds))
        .chain(std::iter::once(("default", &stage_age.default_bounds)))
    {
        let (name, b) = bounds;
        if let Some(green) = b.green_max_days {
            if green > b.yellow_max_days {
                return invalid(format!(
                    "stageAge.{}: greenMaxDays must be <= yellowMaxDays",
                    name
                ));
            }
        }
    }
    if let Some(empty) = stage_age.families.iter().find(|f| f.markers.is_empty()) {
        return invalid(format!("stageAge.{} has no markers", empty.name));
    }

    if config
        .transitions
        .closed_stage_markers
        .iter()
        .any(|m| m.trim().is_empty())
    {
        return invalid("transitions.closedStageMarkers must not contain blank markers".into());
    }

    Ok(())
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
