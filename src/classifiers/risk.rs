//! Risk flags and the primary risk reason shown on deal cards.
//!
//! Warehouse rows normally arrive with `isStalled` / `isGhosted` / `isAtRisk`
//! already set. [`derive_risk_flags`] reproduces that derivation for feeds
//! that only carry raw facts.

use serde::Serialize;

use crate::config::RiskThresholds;
use crate::types::Deal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskReason {
    OwnershipRisk,
    StalledAndGhosted,
    StalledEnterprise,
    Stalled,
    GhostedEnterprise,
    Ghosted,
    /// Flagged at risk upstream for a reason this engine does not model.
    AtRisk,
    Healthy,
}

impl RiskReason {
    pub fn label(&self) -> &'static str {
        match self {
            Self::OwnershipRisk => "Ownership Risk",
            Self::StalledAndGhosted => "Stalled & Ghosted",
            Self::StalledEnterprise => "Stalled (>30 days - Enterprise)",
            Self::Stalled => "Stalled (>14 days)",
            Self::GhostedEnterprise => "Ghosted (>10 days - Enterprise)",
            Self::Ghosted => "Ghosted (>5 days)",
            Self::AtRisk => "At Risk",
            Self::Healthy => "Healthy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskFlags {
    pub is_stalled: bool,
    pub is_ghosted: bool,
    pub has_ownership_risk: bool,
    pub is_at_risk: bool,
    pub primary_risk_reason: RiskReason,
    pub risk_flag_count: u8,
}

/// Derive stalled/ghosted/at-risk from a deal's raw facts.
///
/// An upcoming meeting or recent activity clears both stalled and ghosted.
/// Otherwise enterprise deals get the longer thresholds.
pub fn derive_risk_flags(deal: &Deal, thresholds: &RiskThresholds) -> RiskFlags {
    let engaged = deal.has_upcoming_meeting
        || deal.days_since_last_activity <= thresholds.recent_activity_days;

    let (stalled_after, ghosted_after) = if deal.is_enterprise {
        (thresholds.enterprise_stalled_days, thresholds.enterprise_ghosted_days)
    } else {
        (thresholds.standard_stalled_days, thresholds.standard_ghosted_days)
    };

    let is_stalled = !engaged && deal.days_in_current_stage > stalled_after;
    let is_ghosted = !engaged && deal.days_since_last_activity > ghosted_after;
    let has_ownership_risk = deal.has_ownership_risk;

    let risk_flag_count = [has_ownership_risk, is_stalled, is_ghosted]
        .iter()
        .filter(|flag| **flag)
        .count() as u8;

    let is_at_risk = risk_flag_count > 0;
    let primary_risk_reason =
        reason_for(has_ownership_risk, is_stalled, is_ghosted, is_at_risk, deal.is_enterprise);

    RiskFlags {
        is_stalled,
        is_ghosted,
        has_ownership_risk,
        is_at_risk,
        primary_risk_reason,
        risk_flag_count,
    }
}

/// Primary risk reason from the flags already carried on the deal.
pub fn primary_risk_reason(deal: &Deal) -> RiskReason {
    reason_for(
        deal.has_ownership_risk,
        deal.is_stalled,
        deal.is_ghosted,
        deal.is_at_risk,
        deal.is_enterprise,
    )
}

/// Return the deal with its risk flags replaced by derived ones.
pub fn with_derived_flags(mut deal: Deal, thresholds: &RiskThresholds) -> Deal {
    let flags = derive_risk_flags(&deal, thresholds);
    deal.is_stalled = flags.is_stalled;
    deal.is_ghosted = flags.is_ghosted;
    deal.is_at_risk = flags.is_at_risk;
    deal
}

fn reason_for(
    ownership: bool,
    stalled: bool,
    ghosted: bool,
    at_risk: bool,
    enterprise: bool,
) -> RiskReason {
    match (ownership, stalled, ghosted) {
        (true, _, _) => RiskReason::OwnershipRisk,
        (false, true, true) => RiskReason::StalledAndGhosted,
        (false, true, false) if enterprise => RiskReason::StalledEnterprise,
        (false, true, false) => RiskReason::Stalled,
        (false, false, true) if enterprise => RiskReason::GhostedEnterprise,
        (false, false, true) => RiskReason::Ghosted,
        (false, false, false) if at_risk => RiskReason::AtRisk,
        (false, false, false) => RiskReason::Healthy,
    }
}
