//! Pipeline analytics derivation engine.
//!
//! Turns the deal and movement feeds of a sales pipeline into derived
//! views: contact health, threading, stage aging, risk reasons, focus
//! scores, recommended actions, the stage transition matrix, quarter pace,
//! and pipeline rollups. Every computation is a pure function of its inputs
//! and an [`EngineConfig`] threshold table.

pub mod classifiers;
pub mod config;
pub mod error;
pub mod focus_score;
pub mod input;
pub mod pace;
pub mod recommended_action;
pub mod snapshot;
pub mod summary;
pub mod transitions;
pub mod types;
mod util;

pub use config::EngineConfig;
pub use error::{AnalyticsError, EngineError};
pub use focus_score::{calculate_focus_score, rank_by_focus, FocusScore, FocusScoreInputs};
pub use input::{parse_deals, parse_movements, parse_quarter_pace};
pub use pace::{calculate_pace, PaceStatus, PaceToGoal};
pub use recommended_action::{resolve_action, ActionSignals, RecommendedAction};
pub use snapshot::{compute_snapshot, AnalyticsInput, AnalyticsSnapshot, SnapshotStore};
pub use summary::{summarize_pipeline, week_over_week, PipelineSummary, WeekOverWeek};
pub use transitions::{aggregate_transitions, page, TransitionMatrix};
pub use types::{Deal, Movement, MovementType, PipelineTotals, QuarterPaceSummary};
