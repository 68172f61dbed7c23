//! Input normalization for the deal and movement feeds.
//!
//! The warehouse extract is loosely typed: numbers arrive as strings, keys
//! may be camelCase or snake_case, and optional fields are often null.
//! Everything here coerces to the typed records in [`crate::types`], failing
//! fast only when a record cannot be identified or names an unknown event.

use serde_json::{Map, Value};

use crate::error::AnalyticsError;
use crate::types::{Deal, Movement, MovementType, QuarterPaceSummary};

const DEALS: &str = "deals";
const MOVEMENTS: &str = "movements";

/// Parse a JSON array of deal records.
pub fn parse_deals(json: &str, enterprise_arr_threshold: f64) -> Result<Vec<Deal>, AnalyticsError> {
    let value: Value = serde_json::from_str(json)?;
    deals_from_value(&value, enterprise_arr_threshold)
}

pub fn deals_from_value(value: &Value, enterprise_arr_threshold: f64) -> Result<Vec<Deal>, AnalyticsError> {
    let records = as_records(value, DEALS)?;
    let mut deals = Vec::with_capacity(records.len());
    let mut coerced = 0usize;

    for (index, record) in records.into_iter().enumerate() {
        let mut reader = RecordReader::new(record, DEALS, index);
        let id = reader.required_str(&["id", "dealId", "deal_id"], "id")?;
        let arr_value = reader.amount(&["arrValue", "arr_value", "arr"]);
        let is_enterprise = reader
            .opt_bool(&["isEnterprise", "is_enterprise"])
            .unwrap_or(arr_value >= enterprise_arr_threshold);

        deals.push(Deal {
            id,
            name: reader.str(&["name", "dealName", "deal_name", "dealname"]),
            owner_name: reader.str(&["ownerName", "owner_name"]),
            company_name: reader.str(&["companyName", "company_name"]),
            arr_value,
            current_stage: reader.str(&["currentStage", "current_stage", "stage"]),
            days_in_current_stage: reader.days(&["daysInCurrentStage", "days_in_current_stage"]),
            days_since_last_activity: reader
                .days(&["daysSinceLastActivity", "days_since_last_activity"]),
            contact_count: reader.days(&["contactCount", "contact_count", "numContacts"]),
            has_exec_sponsor: reader.bool(&["hasExecSponsor", "has_exec_sponsor"]),
            has_upcoming_meeting: reader.bool(&["hasUpcomingMeeting", "has_upcoming_meeting"]),
            is_enterprise,
            is_stalled: reader.bool(&["isStalled", "is_stalled"]),
            is_ghosted: reader.bool(&["isGhosted", "is_ghosted"]),
            is_at_risk: reader.bool(&["isAtRisk", "is_at_risk"]),
            has_ownership_risk: reader.bool(&[
                "hasOwnershipRisk",
                "has_ownership_risk",
                "isUnassignedRisk",
                "is_unassigned_risk",
            ]),
        });
        coerced += reader.coerced;
    }

    log::debug!("Parsed {} deals ({} fields coerced)", deals.len(), coerced);
    Ok(deals)
}

/// Parse a JSON array of movement events.
pub fn parse_movements(json: &str) -> Result<Vec<Movement>, AnalyticsError> {
    let value: Value = serde_json::from_str(json)?;
    movements_from_value(&value)
}

pub fn movements_from_value(value: &Value) -> Result<Vec<Movement>, AnalyticsError> {
    let records = as_records(value, MOVEMENTS)?;
    let mut movements = Vec::with_capacity(records.len());
    let mut coerced = 0usize;

    for (index, record) in records.into_iter().enumerate() {
        let mut reader = RecordReader::new(record, MOVEMENTS, index);
        let deal_id = reader.required_str(&["dealId", "deal_id", "hubspotDealId"], "dealId")?;
        let movement_type = reader.movement_type(&["movementType", "movement_type"])?;

        movements.push(Movement {
            deal_id,
            deal_name: reader.str(&["dealName", "deal_name", "dealname"]),
            owner_name: reader.str(&["ownerName", "owner_name"]),
            previous_stage: reader.opt_str(&["previousStage", "previous_stage"]),
            current_stage: reader.str(&["currentStage", "current_stage"]),
            transition_date: reader.opt_str(&["transitionDate", "transition_date"]),
            movement_type,
            value_arr: reader.amount(&["valueArr", "value_arr", "arrValue"]),
        });
        coerced += reader.coerced;
    }

    log::debug!("Parsed {} movements ({} fields coerced)", movements.len(), coerced);
    Ok(movements)
}

/// Parse the quarter-to-date summary object.
pub fn parse_quarter_pace(json: &str) -> Result<QuarterPaceSummary, AnalyticsError> {
    let value: Value = serde_json::from_str(json)?;
    quarter_from_value(&value)
}

pub fn quarter_from_value(value: &Value) -> Result<QuarterPaceSummary, AnalyticsError> {
    let Some(record) = value.as_object() else {
        return Err(AnalyticsError::NotAnObject {
            collection: "quarter",
            index: 0,
        });
    };

    let mut reader = RecordReader::new(record, "quarter", 0);
    Ok(QuarterPaceSummary {
        quarterly_target: reader.opt_amount(&["quarterlyTarget", "quarterly_target"]),
        starting_arr: reader.amount(&["startingArr", "starting_arr"]),
        qtd_won_value: reader.amount(&["qtdWonValue", "qtd_won_value"]),
        qtd_won_count: reader.days(&["qtdWonCount", "qtd_won_count"]),
        days_elapsed: reader.days(&["daysElapsed", "days_elapsed"]),
        days_remaining: reader.days(&["daysRemaining", "days_remaining"]),
        deal_acv: reader.opt_amount(&["dealAcv", "deal_acv"]),
        open_pipeline_arr: reader.opt_amount(&["openPipelineArr", "open_pipeline_arr"]),
    })
}

fn as_records<'a>(
    value: &'a Value,
    collection: &'static str,
) -> Result<Vec<&'a Map<String, Value>>, AnalyticsError> {
    let Some(items) = value.as_array() else {
        return Err(AnalyticsError::NotAnArray { collection });
    };
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.as_object()
                .ok_or(AnalyticsError::NotAnObject { collection, index })
        })
        .collect()
}

// =============================================================================
// Field coercion
// =============================================================================

struct RecordReader<'a> {
    record: &'a Map<String, Value>,
    collection: &'static str,
    index: usize,
    coerced: usize,
}

impl<'a> RecordReader<'a> {
    fn new(record: &'a Map<String, Value>, collection: &'static str, index: usize) -> Self {
        Self {
            record,
            collection,
            index,
            coerced: 0,
        }
    }

    /// First non-null value under any of the aliases.
    fn lookup(&self, keys: &[&str]) -> Option<(&'a str, &'a Value)> {
        keys.iter().find_map(|key| {
            self.record
                .get_key_value(*key)
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.as_str(), v))
        })
    }

    fn required_str(&self, keys: &[&str], field: &'static str) -> Result<String, AnalyticsError> {
        let raw = match self.lookup(keys) {
            Some((_, Value::String(s))) => s.trim().to_string(),
            Some((_, Value::Number(n))) => n.to_string(),
            Some((_, other)) => {
                return Err(AnalyticsError::InvalidField {
                    collection: self.collection,
                    index: self.index,
                    field,
                    reason: format!("expected string or number, got {}", other),
                })
            }
            None => String::new(),
        };
        if raw.is_empty() {
            return Err(AnalyticsError::MissingField {
                collection: self.collection,
                index: self.index,
                field,
            });
        }
        Ok(raw)
    }

    fn opt_str(&self, keys: &[&str]) -> Option<String> {
        match self.lookup(keys)? {
            (_, Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            (_, Value::String(_)) => None,
            (_, other) => Some(other.to_string()),
        }
    }

    fn str(&self, keys: &[&str]) -> String {
        self.opt_str(keys).unwrap_or_default()
    }

    fn opt_number(&mut self, keys: &[&str]) -> Option<f64> {
        let (key, value) = self.lookup(keys)?;
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        };
        match parsed {
            Some(n) if n.is_finite() => Some(n),
            _ => {
                log::warn!(
                    "{}[{}].{}: unreadable number {}, using 0",
                    self.collection,
                    self.index,
                    key,
                    value
                );
                self.coerced += 1;
                Some(0.0)
            }
        }
    }

    fn opt_amount(&mut self, keys: &[&str]) -> Option<f64> {
        let n = self.opt_number(keys)?;
        if n < 0.0 {
            log::warn!(
                "{}[{}].{}: negative value {} clamped to 0",
                self.collection,
                self.index,
                keys[0],
                n
            );
            self.coerced += 1;
            return Some(0.0);
        }
        Some(n)
    }

    fn amount(&mut self, keys: &[&str]) -> f64 {
        self.opt_amount(keys).unwrap_or(0.0)
    }

    /// Non-negative whole count. Fractions are truncated.
    fn days(&mut self, keys: &[&str]) -> u32 {
        let n = self.amount(keys);
        n.min(u32::MAX as f64) as u32
    }

    fn opt_bool(&self, keys: &[&str]) -> Option<bool> {
        match self.lookup(keys)? {
            (_, Value::Bool(b)) => Some(*b),
            (_, Value::Number(n)) => Some(n.as_f64().is_some_and(|v| v != 0.0)),
            (_, Value::String(s)) => match s.trim().to_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" | "" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    fn bool(&self, keys: &[&str]) -> bool {
        self.opt_bool(keys).unwrap_or(false)
    }

    fn movement_type(&self, keys: &[&str]) -> Result<MovementType, AnalyticsError> {
        let invalid = |reason: String| AnalyticsError::InvalidField {
            collection: self.collection,
            index: self.index,
            field: "movementType",
            reason,
        };
        match self.lookup(keys) {
            Some((_, Value::String(raw))) => MovementType::parse(raw)
                .ok_or_else(|| invalid(format!("unknown movement type '{}'", raw))),
            Some((_, other)) => Err(invalid(format!("expected string, got {}", other))),
            None => Err(AnalyticsError::MissingField {
                collection: self.collection,
                index: self.index,
                field: "movementType",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_deals_camel_and_snake_case() {
        let json = r#"[
            {"id": "d1", "name": "Acme", "arrValue": 120000, "currentStage": "Demo",
             "daysInCurrentStage": 12, "daysSinceLastActivity": 3, "contactCount": 4,
             "hasUpcomingMeeting": true, "isAtRisk": false},
            {"deal_id": 42, "deal_name": "Globex", "arr_value": "45,000.50",
             "current_stage": "Discovery", "days_in_current_stage": null,
             "is_unassigned_risk": true}
        ]"#;
        let deals = parse_deals(json, 100_000.0).unwrap();
        assert_eq!(deals.len(), 2);

        assert_eq!(deals[0].id, "d1");
        assert_eq!(deals[0].contact_count, 4);
        assert!(deals[0].has_upcoming_meeting);
        assert!(deals[0].is_enterprise);

        assert_eq!(deals[1].id, "42");
        assert_eq!(deals[1].name, "Globex");
        assert_eq!(deals[1].arr_value, 45_000.5);
        assert_eq!(deals[1].days_in_current_stage, 0);
        assert!(deals[1].has_ownership_risk);
        assert!(!deals[1].is_enterprise);
    }

    #[test]
    fn test_explicit_enterprise_flag_wins() {
        let json = r#"[{"id": "d1", "arrValue": 500, "isEnterprise": true}]"#;
        let deals = parse_deals(json, 100_000.0).unwrap();
        assert!(deals[0].is_enterprise);
    }

    #[test]
    fn test_negative_values_clamped() {
        let json = r#"[{"id": "d1", "arrValue": -100, "daysSinceLastActivity": -4}]"#;
        let deals = parse_deals(json, 100_000.0).unwrap();
        assert_eq!(deals[0].arr_value, 0.0);
        assert_eq!(deals[0].days_since_last_activity, 0);
    }

    #[test]
    fn test_missing_id_fails_fast() {
        let json = r#"[{"id": "d1"}, {"name": "No id"}]"#;
        let err = parse_deals(json, 100_000.0).unwrap_err();
        match err {
            AnalyticsError::MissingField {
                collection,
                index,
                field,
            } => {
                assert_eq!(collection, "deals");
                assert_eq!(index, 1);
                assert_eq!(field, "id");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let blank = parse_deals(r#"[{"id": "  "}]"#, 100_000.0).unwrap_err();
        assert_eq!(blank.field(), Some("id"));
    }

    #[test]
    fn test_not_an_array_or_object() {
        assert!(matches!(
            parse_deals(r#"{"id": "d1"}"#, 100_000.0),
            Err(AnalyticsError::NotAnArray { collection: "deals" })
        ));
        assert!(matches!(
            parse_movements(r#"[{"dealId": "d1", "movementType": "NEW_DEAL"}, 7]"#),
            Err(AnalyticsError::NotAnObject {
                collection: "movements",
                index: 1
            })
        ));
        assert!(matches!(
            parse_movements("not json"),
            Err(AnalyticsError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_parse_movements() {
        let json = r#"[
            {"dealId": "d1", "dealName": "Acme", "previousStage": "Discovery",
             "currentStage": "Demo", "movementType": "STAGE_CHANGE", "valueArr": 10000,
             "transitionDate": "2026-02-03"},
            {"deal_id": "d2", "previous_stage": "", "current_stage": "Discovery",
             "movement_type": "new-deal"}
        ]"#;
        let movements = parse_movements(json).unwrap();
        assert_eq!(movements[0].movement_type, MovementType::StageChange);
        assert_eq!(movements[0].previous_stage.as_deref(), Some("Discovery"));
        assert_eq!(movements[0].transition_date.as_deref(), Some("2026-02-03"));
        assert_eq!(movements[1].movement_type, MovementType::NewDeal);
        assert_eq!(movements[1].previous_stage, None);
        assert_eq!(movements[1].value_arr, 0.0);
    }

    #[test]
    fn test_unknown_movement_type_fails() {
        let json = r#"[{"dealId": "d1", "movementType": "TELEPORTED"}]"#;
        let err = parse_movements(json).unwrap_err();
        assert_eq!(err.field(), Some("movementType"));
        assert!(err.is_input_error());
        assert!(err.to_string().contains("TELEPORTED"));
    }

    #[test]
    fn test_missing_deal_id_on_movement() {
        let json = r#"[{"movementType": "CLOSED"}]"#;
        let err = parse_movements(json).unwrap_err();
        assert_eq!(err.field(), Some("dealId"));
    }

    #[test]
    fn test_parse_quarter_pace() {
        let json = r#"{"startingArr": 1000000, "qtd_won_value": "200000",
                       "daysElapsed": 30, "daysRemaining": 60, "dealAcv": null}"#;
        let quarter = parse_quarter_pace(json).unwrap();
        assert_eq!(quarter.quarterly_target, None);
        assert_eq!(quarter.starting_arr, 1_000_000.0);
        assert_eq!(quarter.qtd_won_value, 200_000.0);
        assert_eq!(quarter.days_remaining, 60);
        assert_eq!(quarter.deal_acv, None);

        assert!(matches!(
            parse_quarter_pace("[]"),
            Err(AnalyticsError::NotAnObject { .. })
        ));
    }
}
