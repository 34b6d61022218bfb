//! Work-item type rule resource.
//!
//! Conditions and actions are tagged records. Expansion copies only the
//! fields meaningful for each tag and drops empty strings; flattening
//! inverts that so the attribute maps carry exactly the keys the server
//! record does. Rule edits are full replacement: the engine sends the
//! complete condition and action sets every time.

use std::sync::Arc;

use anyhow::{Result, bail};
use azdoapi::ProcessClient;
use azdoapi::models::process::{ProcessRule, RuleAction, RuleCondition};
use declarative::{Lifecycle, OpContext, StateStore};
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::attr_uuid;

pub const CONDITION_TYPES: [&str; 7] = [
    "when",
    "whenNot",
    "whenChanged",
    "whenNotChanged",
    "whenWas",
    "whenCurrentUserIsMemberOfGroup",
    "whenCurrentUserIsNotMemberOfGroup",
];

pub const ACTION_TYPES: [&str; 15] = [
    "makeRequired",
    "makeReadOnly",
    "setDefaultValue",
    "setDefaultFromClock",
    "setDefaultFromCurrentUser",
    "setDefaultFromField",
    "copyValue",
    "copyFromClock",
    "copyFromCurrentUser",
    "copyFromField",
    "setValueToEmpty",
    "copyFromServerClock",
    "copyFromServerCurrentUser",
    "hideTargetField",
    "disallowValue",
];

fn record_str(record: &Map<String, Value>, key: &str) -> Option<String> {
    match record.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Declared condition blocks into wire records.
pub fn expand_conditions(declared: &Value) -> Result<Vec<RuleCondition>> {
    let Value::Array(blocks) = declared else {
        return Ok(Vec::new());
    };
    let mut out = Vec::with_capacity(blocks.len());
    for block in blocks {
        let Value::Object(record) = block else {
            bail!("condition must be a block, got {block}");
        };
        let condition_type = record_str(record, "condition_type")
            .ok_or_else(|| anyhow::anyhow!("condition is missing condition_type"))?;
        if !CONDITION_TYPES.contains(&condition_type.as_str()) {
            bail!("unknown condition_type {condition_type:?}");
        }
        out.push(RuleCondition {
            condition_type,
            field: record_str(record, "field"),
            value: record_str(record, "value"),
        });
    }
    Ok(out)
}

/// Declared action blocks into wire records.
pub fn expand_actions(declared: &Value) -> Result<Vec<RuleAction>> {
    let Value::Array(blocks) = declared else {
        return Ok(Vec::new());
    };
    let mut out = Vec::with_capacity(blocks.len());
    for block in blocks {
        let Value::Object(record) = block else {
            bail!("action must be a block, got {block}");
        };
        let action_type = record_str(record, "action_type")
            .ok_or_else(|| anyhow::anyhow!("action is missing action_type"))?;
        if !ACTION_TYPES.contains(&action_type.as_str()) {
            bail!("unknown action_type {action_type:?}");
        }
        out.push(RuleAction {
            action_type,
            target_field: record_str(record, "target_field"),
            value: record_str(record, "value"),
        });
    }
    Ok(out)
}

/// Wire records into attribute blocks carrying exactly the keys present.
pub fn flatten_conditions(conditions: &[RuleCondition]) -> Value {
    Value::Array(
        conditions
            .iter()
            .map(|c| {
                let mut record = Map::new();
                record.insert("condition_type".to_string(), json!(c.condition_type));
                if let Some(field) = &c.field {
                    record.insert("field".to_string(), json!(field));
                }
                if let Some(value) = &c.value {
                    record.insert("value".to_string(), json!(value));
                }
                Value::Object(record)
            })
            .collect(),
    )
}

pub fn flatten_actions(actions: &[RuleAction]) -> Value {
    Value::Array(
        actions
            .iter()
            .map(|a| {
                let mut record = Map::new();
                record.insert("action_type".to_string(), json!(a.action_type));
                if let Some(target_field) = &a.target_field {
                    record.insert("target_field".to_string(), json!(target_field));
                }
                if let Some(value) = &a.value {
                    record.insert("value".to_string(), json!(value));
                }
                Value::Object(record)
            })
            .collect(),
    )
}

pub struct RuleResource {
    client: Arc<dyn ProcessClient>,
}

impl RuleResource {
    pub fn new(client: Arc<dyn ProcessClient>) -> Self {
        Self { client }
    }

    fn body_from(d: &StateStore) -> Result<ProcessRule> {
        Ok(ProcessRule {
            id: None,
            name: d.get_str("name"),
            is_disabled: d.get_bool("disabled"),
            conditions: expand_conditions(&d.get("conditions"))?,
            actions: expand_actions(&d.get("actions"))?,
            customization_type: None,
        })
    }
}

impl Lifecycle for RuleResource {
    fn type_name(&self) -> &'static str {
        "azdo_rule"
    }

    fn create(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let process_id = attr_uuid(d, "process_id")?;
        let wit_ref = d.get_str("work_item_type");
        let created = self
            .client
            .create_rule(process_id, &wit_ref, &Self::body_from(d)?)
            .map_err(|e| e.while_doing("creating rule"))?;
        d.set_id(created.id.map(|id| id.to_string()).unwrap_or_default());
        Ok(())
    }

    fn read(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let process_id = attr_uuid(d, "process_id")?;
        let wit_ref = d.get_str("work_item_type");
        let rule_id = Uuid::parse_str(d.id())?;
        let rule = match self.client.get_rule(process_id, &wit_ref, rule_id) {
            Ok(rule) => rule,
            Err(e) if e.is_not_found() => {
                d.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e.while_doing("reading rule").into()),
        };
        d.set("name", rule.name);
        d.set("disabled", rule.is_disabled);
        d.set("conditions", flatten_conditions(&rule.conditions));
        d.set("actions", flatten_actions(&rule.actions));
        Ok(())
    }

    fn update(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let process_id = attr_uuid(d, "process_id")?;
        let wit_ref = d.get_str("work_item_type");
        let rule_id = Uuid::parse_str(d.id())?;
        // Full replacement: the complete sets ride along every time.
        self.client
            .update_rule(process_id, &wit_ref, rule_id, &Self::body_from(d)?)
            .map_err(|e| e.while_doing("updating rule"))?;
        Ok(())
    }

    fn delete(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let process_id = attr_uuid(d, "process_id")?;
        let wit_ref = d.get_str("work_item_type");
        let rule_id = Uuid::parse_str(d.id())?;
        match self.client.delete_rule(process_id, &wit_ref, rule_id) {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.while_doing("deleting rule").into()),
        }
    }

    fn import(&self, raw_id: &str, d: &mut StateStore) -> Result<()> {
        let parts = declarative::split_import_id(raw_id, "process_id/work_item_type/rule_id")?;
        d.set_planned("process_id", parts[0]);
        d.set_planned("work_item_type", parts[1]);
        d.set_id(parts[2]);
        Ok(())
    }
}
