use serde::{Deserialize, Serialize};

// =============================================================================
// Input Records
// =============================================================================

/// One sales opportunity as extracted by the upstream refresh.
///
/// `is_stalled`, `is_ghosted` and `is_at_risk` are computed upstream and read
/// as-is. Callers without those flags can derive them with
/// [`crate::classifiers::risk::with_derived_flags`].
///
/// Feed JSON enters through [`crate::input::parse_deals`], which applies
/// null handling and the enterprise threshold.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: String,
    pub name: String,
    pub owner_name: String,
    pub company_name: String,
    pub arr_value: f64,
    pub current_stage: String,
    pub days_in_current_stage: u32,
    pub days_since_last_activity: u32,
    pub contact_count: u32,
    pub has_exec_sponsor: bool,
    pub has_upcoming_meeting: bool,
    pub is_enterprise: bool,
    pub is_stalled: bool,
    pub is_ghosted: bool,
    pub is_at_risk: bool,
    /// Owner is inactive or deactivated; the deal needs reassignment.
    pub has_ownership_risk: bool,
}

/// Kind of pipeline movement event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    #[serde(alias = "NewDeal")]
    NewDeal,
    #[serde(alias = "StageChange")]
    StageChange,
    #[serde(alias = "Closed")]
    Closed,
    #[serde(alias = "Reopened")]
    Reopened,
    #[serde(alias = "Lost")]
    Lost,
}

impl MovementType {
    /// Parse a feed value. Accepts `NewDeal`, `NEW_DEAL`, `new-deal`, `new deal`.
    pub fn parse(raw: &str) -> Option<Self> {
        let key: String = raw
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "newdeal" | "new" => Some(Self::NewDeal),
            "stagechange" => Some(Self::StageChange),
            "closed" => Some(Self::Closed),
            "reopened" => Some(Self::Reopened),
            "lost" => Some(Self::Lost),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewDeal => "NEW_DEAL",
            Self::StageChange => "STAGE_CHANGE",
            Self::Closed => "CLOSED",
            Self::Reopened => "REOPENED",
            Self::Lost => "LOST",
        }
    }

    /// Only stage changes and closes move a deal between two stages.
    pub fn is_transition(&self) -> bool {
        matches!(self, Self::StageChange | Self::Closed)
    }
}

/// One stage transition event from the movement feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    pub deal_id: String,
    pub deal_name: String,
    pub owner_name: String,
    /// `None` when the deal entered the pipeline with this event.
    pub previous_stage: Option<String>,
    pub current_stage: String,
    pub transition_date: Option<String>,
    pub movement_type: MovementType,
    pub value_arr: f64,
}

/// Quarter-to-date figures feeding the pace calculator.
///
/// `quarterly_target` and `deal_acv` fall back to the configured defaults
/// when absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarterPaceSummary {
    pub quarterly_target: Option<f64>,
    pub starting_arr: f64,
    pub qtd_won_value: f64,
    pub qtd_won_count: u32,
    pub days_elapsed: u32,
    pub days_remaining: u32,
    pub deal_acv: Option<f64>,
    pub open_pipeline_arr: Option<f64>,
}

/// Pipeline-level totals for one snapshot date, used for week-over-week deltas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineTotals {
    #[serde(default)]
    pub pipeline_arr: f64,
    #[serde(default)]
    pub open_deals: u32,
    #[serde(default)]
    pub won_deals: u32,
    #[serde(default)]
    pub won_value: f64,
}
