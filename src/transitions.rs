//! Stage transition matrix built from the movement feed.
//!
//! Only StageChange and Closed events with a known previous stage are
//! transitions. NewDeal events are counted separately (when they land in an
//! open stage) and never enter the matrix. Reopened and Lost events are
//! skipped.
//!
//! The aggregator always computes the full sorted path list; how many paths
//! a view reveals is decided by the caller (see [`page`]).

use std::collections::HashMap;

use serde::Serialize;

use crate::config::TransitionConfig;
use crate::types::{Movement, MovementType};
use crate::util::contains_ignore_case;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionCell {
    pub from_stage: String,
    pub to_stage: String,
    pub count: u32,
    pub total_value: f64,
    pub deal_list: Vec<Movement>,
}

/// Matrix cells are serialized as a list in discovery order; look one up by
/// `(from, to)` with [`TransitionMatrix::cell`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionMatrix {
    pub cells: Vec<TransitionCell>,
    pub from_stages: Vec<String>,
    pub to_stages: Vec<String>,
    pub max_cell_count: u32,
    pub filtered_transition_count: u32,
    pub new_deals_count: u32,
    /// Reopened/Lost events, and transitions without a previous stage.
    pub skipped_count: u32,
    /// Cells sorted by count descending; ties keep discovery order.
    pub top_paths: Vec<TransitionCell>,
}

impl TransitionMatrix {
    pub fn cell(&self, from: &str, to: &str) -> Option<&TransitionCell> {
        self.cells
            .iter()
            .find(|c| c.from_stage == from && c.to_stage == to)
    }

    pub fn count_between(&self, from: &str, to: &str) -> u32 {
        self.cell(from, to).map(|c| c.count).unwrap_or(0)
    }

    pub fn total_value(&self) -> f64 {
        self.cells.iter().map(|c| c.total_value).sum()
    }
}

/// Whether a stage label is a closed-won or closed-lost stage.
pub fn is_closed_stage(stage: &str, config: &TransitionConfig) -> bool {
    let stage_lower = stage.to_lowercase();
    config
        .closed_stage_markers
        .iter()
        .any(|marker| stage_lower.contains(&marker.to_lowercase()))
}

/// Build the transition matrix.
///
/// `search` is a case-insensitive substring matched against the deal name
/// and both stage names. A blank search matches everything.
pub fn aggregate_transitions(
    movements: &[Movement],
    search: Option<&str>,
    config: &TransitionConfig,
) -> TransitionMatrix {
    let needle = search
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let mut matrix = TransitionMatrix::default();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for movement in movements {
        if movement.movement_type == MovementType::NewDeal {
            if !is_closed_stage(&movement.current_stage, config) {
                matrix.new_deals_count += 1;
            }
            continue;
        }

        if !movement.movement_type.is_transition() {
            matrix.skipped_count += 1;
            continue;
        }

        let Some(from) = movement.previous_stage.as_deref() else {
            matrix.skipped_count += 1;
            continue;
        };

        if let Some(needle) = needle.as_deref() {
            let matched = contains_ignore_case(&movement.deal_name, needle)
                || contains_ignore_case(from, needle)
                || contains_ignore_case(&movement.current_stage, needle);
            if !matched {
                continue;
            }
        }

        let to = movement.current_stage.as_str();
        let key = (from.to_string(), to.to_string());
        let slot = match index.get(&key) {
            Some(&slot) => slot,
            None => {
                if !matrix.from_stages.iter().any(|s| s == from) {
                    matrix.from_stages.push(from.to_string());
                }
                if !matrix.to_stages.iter().any(|s| s == to) {
                    matrix.to_stages.push(to.to_string());
                }
                matrix.cells.push(TransitionCell {
                    from_stage: key.0.clone(),
                    to_stage: key.1.clone(),
                    count: 0,
                    total_value: 0.0,
                    deal_list: Vec::new(),
                });
                let slot = matrix.cells.len() - 1;
                index.insert(key, slot);
                slot
            }
        };

        let cell = &mut matrix.cells[slot];
        cell.count += 1;
        cell.total_value += movement.value_arr;
        cell.deal_list.push(movement.clone());

        matrix.filtered_transition_count += 1;
        matrix.max_cell_count = matrix.max_cell_count.max(cell.count);
    }

    let mut top_paths = matrix.cells.clone();
    top_paths.sort_by(|a, b| b.count.cmp(&a.count));
    matrix.top_paths = top_paths;

    log::debug!(
        "Aggregated {} transitions into {} cells ({} new deals, {} skipped)",
        matrix.filtered_transition_count,
        matrix.cells.len(),
        matrix.new_deals_count,
        matrix.skipped_count
    );

    matrix
}

/// A window of `paths` for incremental reveal. Out-of-range offsets yield an
/// empty slice.
pub fn page(paths: &[TransitionCell], offset: usize, limit: usize) -> &[TransitionCell] {
    let start = offset.min(paths.len());
    let end = start.saturating_add(limit).min(paths.len());
    &paths[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(
        deal: &str,
        from: Option<&str>,
        to: &str,
        kind: MovementType,
        value: f64,
    ) -> Movement {
        Movement {
            deal_id: format!("id-{}", deal),
            deal_name: deal.to_string(),
            owner_name: "Dana".to_string(),
            previous_stage: from.map(ToString::to_string),
            current_stage: to.to_string(),
            transition_date: Some("2026-02-10".to_string()),
            movement_type: kind,
            value_arr: value,
        }
    }

    fn config() -> TransitionConfig {
        TransitionConfig::default()
    }

    #[test]
    fn excludes_new_deals_and_counts_them() {
        let movements = vec![
            mv("Acme", Some("Discovery"), "Demo", MovementType::StageChange, 10.0),
            mv("Globex", None, "New", MovementType::NewDeal, 20.0),
            mv("Initech", Some("Demo"), "Demo", MovementType::StageChange, 30.0),
        ];
        let matrix = aggregate_transitions(&movements, None, &config());
        assert_eq!(matrix.filtered_transition_count, 2);
        assert_eq!(matrix.new_deals_count, 1);
        assert_eq!(matrix.cells.iter().map(|c| c.count).sum::<u32>(), 2);
        assert_eq!(matrix.count_between("Demo", "Demo"), 1);
    }

    #[test]
    fn new_deal_into_closed_stage_not_counted() {
        let movements = vec![
            mv("Acme", None, "Closed Won", MovementType::NewDeal, 10.0),
            mv("Globex", None, "closed lost", MovementType::NewDeal, 10.0),
            mv("Hooli", None, "Discovery", MovementType::NewDeal, 10.0),
        ];
        let matrix = aggregate_transitions(&movements, None, &config());
        assert_eq!(matrix.new_deals_count, 1);
        assert!(matrix.cells.is_empty());
    }

    #[test]
    fn missing_previous_stage_is_skipped() {
        let movements = vec![
            mv("Acme", None, "Demo", MovementType::StageChange, 10.0),
            mv("Acme", Some("Demo"), "Closed Won", MovementType::Closed, 10.0),
        ];
        let matrix = aggregate_transitions(&movements, None, &config());
        assert_eq!(matrix.filtered_transition_count, 1);
        assert_eq!(matrix.skipped_count, 1);
    }

    #[test]
    fn reopened_and_lost_never_enter_matrix() {
        let movements = vec![
            mv("Acme", Some("Closed Lost"), "Demo", MovementType::Reopened, 10.0),
            mv("Acme", Some("Demo"), "Closed Lost", MovementType::Lost, 10.0),
        ];
        let matrix = aggregate_transitions(&movements, None, &config());
        assert_eq!(matrix.filtered_transition_count, 0);
        assert_eq!(matrix.skipped_count, 2);
    }

    #[test]
    fn accumulates_value_and_deal_list() {
        let movements = vec![
            mv("Acme", Some("Discovery"), "Demo", MovementType::StageChange, 10_000.0),
            mv("Globex", Some("Discovery"), "Demo", MovementType::StageChange, 25_000.0),
        ];
        let matrix = aggregate_transitions(&movements, None, &config());
        let cell = matrix.cell("Discovery", "Demo").unwrap();
        assert_eq!(cell.count, 2);
        assert_eq!(cell.total_value, 35_000.0);
        let names: Vec<&str> = cell.deal_list.iter().map(|m| m.deal_name.as_str()).collect();
        assert_eq!(names, vec!["Acme", "Globex"]);
        assert_eq!(matrix.max_cell_count, 2);
        assert_eq!(matrix.total_value(), 35_000.0);
    }

    #[test]
    fn search_matches_deal_or_either_stage() {
        let movements = vec![
            mv("Acme Freight", Some("Discovery"), "Demo", MovementType::StageChange, 1.0),
            mv("Globex", Some("Proposal"), "Negotiation", MovementType::StageChange, 1.0),
            mv("Initech", Some("Demo"), "Proposal", MovementType::StageChange, 1.0),
        ];

        let by_deal = aggregate_transitions(&movements, Some("ACME"), &config());
        assert_eq!(by_deal.filtered_transition_count, 1);

        let by_stage = aggregate_transitions(&movements, Some("proposal"), &config());
        assert_eq!(by_stage.filtered_transition_count, 2);

        let blank = aggregate_transitions(&movements, Some("   "), &config());
        assert_eq!(blank.filtered_transition_count, 3);
    }

    #[test]
    fn search_does_not_affect_new_deal_count() {
        let movements = vec![
            mv("Acme", None, "Discovery", MovementType::NewDeal, 1.0),
            mv("Globex", Some("Demo"), "Proposal", MovementType::StageChange, 1.0),
        ];
        let matrix = aggregate_transitions(&movements, Some("zzz"), &config());
        assert_eq!(matrix.filtered_transition_count, 0);
        assert_eq!(matrix.new_deals_count, 1);
    }

    #[test]
    fn round_trip_count_matches_filtered_records() {
        let kinds = [
            MovementType::NewDeal,
            MovementType::StageChange,
            MovementType::Closed,
            MovementType::Reopened,
            MovementType::Lost,
        ];
        let stages = ["Discovery", "Demo", "Proposal", "Closed Won"];
        let mut movements = Vec::new();
        for (i, kind) in kinds.iter().cycle().take(40).enumerate() {
            let from = if i % 7 == 0 { None } else { Some(stages[i % 3]) };
            movements.push(mv(
                &format!("Deal {}", i),
                from,
                stages[(i + 1) % 4],
                *kind,
                i as f64,
            ));
        }

        for search in [None, Some("demo"), Some("deal 1")] {
            let matrix = aggregate_transitions(&movements, search, &config());
            let needle = search.map(|s| s.to_lowercase());
            let expected = movements
                .iter()
                .filter(|m| m.movement_type.is_transition())
                .filter(|m| m.previous_stage.is_some())
                .filter(|m| match &needle {
                    None => true,
                    Some(n) => {
                        m.deal_name.to_lowercase().contains(n)
                            || m.previous_stage.as_deref().unwrap_or("").to_lowercase().contains(n)
                            || m.current_stage.to_lowercase().contains(n)
                    }
                })
                .count() as u32;
            let sum: u32 = matrix.cells.iter().map(|c| c.count).sum();
            assert_eq!(sum, expected);
            assert_eq!(matrix.filtered_transition_count, expected);
        }
    }

    #[test]
    fn top_paths_sorted_with_stable_ties() {
        let movements = vec![
            mv("a", Some("Lead"), "Discovery", MovementType::StageChange, 1.0),
            mv("b", Some("Discovery"), "Demo", MovementType::StageChange, 1.0),
            mv("c", Some("Demo"), "Proposal", MovementType::StageChange, 1.0),
            mv("d", Some("Discovery"), "Demo", MovementType::StageChange, 1.0),
            mv("e", Some("Demo"), "Proposal", MovementType::StageChange, 1.0),
            mv("f", Some("Proposal"), "Closed Won", MovementType::Closed, 1.0),
        ];
        let matrix = aggregate_transitions(&movements, None, &config());
        let paths: Vec<(&str, &str, u32)> = matrix
            .top_paths
            .iter()
            .map(|p| (p.from_stage.as_str(), p.to_stage.as_str(), p.count))
            .collect();
        assert_eq!(
            paths,
            vec![
                ("Discovery", "Demo", 2),
                ("Demo", "Proposal", 2),
                ("Lead", "Discovery", 1),
                ("Proposal", "Closed Won", 1),
            ]
        );
        assert_eq!(matrix.from_stages, vec!["Lead", "Discovery", "Demo", "Proposal"]);
        assert_eq!(matrix.to_stages, vec!["Discovery", "Demo", "Proposal", "Closed Won"]);
    }

    #[test]
    fn page_windows_paths() {
        let movements: Vec<Movement> = (0..5)
            .map(|i| {
                mv(
                    &format!("d{}", i),
                    Some(format!("S{}", i).as_str()),
                    "Demo",
                    MovementType::StageChange,
                    1.0,
                )
            })
            .collect();
        let matrix = aggregate_transitions(&movements, None, &config());
        assert_eq!(page(&matrix.top_paths, 0, 3).len(), 3);
        assert_eq!(page(&matrix.top_paths, 3, 3).len(), 2);
        assert!(page(&matrix.top_paths, 10, 3).is_empty());
        assert_eq!(page(&matrix.top_paths, 1, usize::MAX).len(), 4);
    }

    #[test]
    fn empty_feed() {
        let matrix = aggregate_transitions(&[], None, &config());
        assert_eq!(matrix.max_cell_count, 0);
        assert!(matrix.top_paths.is_empty());
    }
}
