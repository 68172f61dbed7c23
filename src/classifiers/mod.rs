//! Per-deal classifiers.
//!
//! Each classifier is a pure function over a handful of deal fields and a
//! threshold table from [`crate::config`]. Cascades are ordered rule tables
//! evaluated top-down; the first matching rule wins.

pub mod contact_health;
pub mod risk;
pub mod stage_age;
pub mod threading;

pub use contact_health::{classify_contact_health, ContactHealth, HealthLevel};
pub use risk::{derive_risk_flags, primary_risk_reason, with_derived_flags, RiskFlags, RiskReason};
pub use stage_age::{classify_stage_age, max_healthy_stage_days, StageAgeStatus};
pub use threading::{classify_threading, ThreadingLevel};
