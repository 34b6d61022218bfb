//! Field attachment resource: one field on one work-item type.
//!
//! The default value is polymorphic on the wire (string, number, boolean);
//! the declaration carries it as a raw JSON string so nothing is lost in
//! either direction. An empty declaration maps to null.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use azdoapi::ProcessClient;
use azdoapi::models::process::WorkItemTypeField;
use declarative::{Lifecycle, OpContext, StateStore};
use serde_json::Value;
use uuid::Uuid;

use crate::attr_uuid;

pub struct FieldResource {
    client: Arc<dyn ProcessClient>,
}

impl FieldResource {
    pub fn new(client: Arc<dyn ProcessClient>) -> Self {
        Self { client }
    }

    fn body_from(d: &StateStore) -> Result<WorkItemTypeField> {
        Ok(WorkItemTypeField {
            reference_name: d.get_str("reference_name"),
            name: None,
            field_type: None,
            description: None,
            required: Some(d.get_bool("required")),
            read_only: Some(d.get_bool("read_only")),
            default_value: expand_default_value(&d.get_str("default_value"))?,
            allow_groups: d.tri_state("allow_groups"),
            allowed_values: None,
            pick_list: None,
            customization: None,
        })
    }
}

/// Parse the declared raw-JSON default; empty means null.
fn expand_default_value(raw: &str) -> Result<Option<Value>> {
    if raw.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(raw)
        .map(Some)
        .with_context(|| format!("default_value {raw:?} is not valid JSON"))
}

/// Re-encode a server default as the raw-JSON attribute string.
fn flatten_default_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(v) => v.to_string(),
    }
}

impl Lifecycle for FieldResource {
    fn type_name(&self) -> &'static str {
        "azdo_field"
    }

    fn create(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let process_id = attr_uuid(d, "process_id")?;
        let wit_ref = d.get_str("work_item_type");
        let body = Self::body_from(d)?;
        let created = self
            .client
            .add_field(process_id, &wit_ref, &body)
            .map_err(|e| e.while_doing("adding field to work item type"))?;
        d.set_id(created.reference_name);
        self.read(ctx, d)
    }

    fn read(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let process_id = attr_uuid(d, "process_id")?;
        let wit_ref = d.get_str("work_item_type");
        let field_ref = d.id().to_string();
        let field = match self.client.get_field(process_id, &wit_ref, &field_ref) {
            Ok(field) => field,
            Err(e) if e.is_not_found() => {
                d.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e.while_doing("reading work item type field").into()),
        };
        d.set("reference_name", field.reference_name);
        d.set("required", field.required.unwrap_or(false));
        d.set("read_only", field.read_only.unwrap_or(false));
        d.set("default_value", flatten_default_value(field.default_value.as_ref()));
        if let Some(allow_groups) = field.allow_groups {
            d.set("allow_groups", allow_groups);
        }
        d.set_opt("pick_list_id", field.pick_list.map(|p| p.id.to_string()));
        Ok(())
    }

    fn update(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let process_id = attr_uuid(d, "process_id")?;
        let wit_ref = d.get_str("work_item_type");
        let field_ref = d.id().to_string();
        // Partial update: untouched attributes stay out of the body.
        let mut body = WorkItemTypeField {
            reference_name: field_ref.clone(),
            name: None,
            field_type: None,
            description: None,
            required: None,
            read_only: None,
            default_value: None,
            allow_groups: None,
            allowed_values: None,
            pick_list: None,
            customization: None,
        };
        if d.has_change("required") {
            body.required = Some(d.get_bool("required"));
        }
        if d.has_change("read_only") {
            body.read_only = Some(d.get_bool("read_only"));
        }
        if d.has_change("default_value") {
            body.default_value = expand_default_value(&d.get_str("default_value"))?;
        }
        if d.has_change("allow_groups") {
            body.allow_groups = d.tri_state("allow_groups");
        }
        self.client
            .update_field(process_id, &wit_ref, &field_ref, &body)
            .map_err(|e| e.while_doing("updating work item type field"))?;
        Ok(())
    }

    fn delete(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let process_id = attr_uuid(d, "process_id")?;
        let wit_ref = d.get_str("work_item_type");
        match self.client.remove_field(process_id, &wit_ref, d.id()) {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.while_doing("removing field from work item type").into()),
        }
    }

    fn import(&self, raw_id: &str, d: &mut StateStore) -> Result<()> {
        let parts =
            declarative::split_import_id(raw_id, "process_id/work_item_type/reference_name")?;
        Uuid::parse_str(parts[0]).context("process_id segment must be a UUID")?;
        d.set_planned("process_id", parts[0]);
        d.set_planned("work_item_type", parts[1]);
        d.set_planned("reference_name", parts[2]);
        d.set_id(parts[2]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use azdoapi::mock::MockAzdo;
    use declarative::Attrs;
    use serde_json::json;

    fn attrs(pairs: &[(&str, serde_json::Value)]) -> Attrs {
        pairs.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect()
    }

    #[test]
    fn default_value_round_trips_as_raw_json() {
        assert_eq!(expand_default_value("").unwrap(), None);
        assert_eq!(expand_default_value("5").unwrap(), Some(json!(5)));
        assert_eq!(expand_default_value("\"low\"").unwrap(), Some(json!("low")));
        assert_eq!(expand_default_value("true").unwrap(), Some(json!(true)));
        assert!(expand_default_value("not json").is_err());

        assert_eq!(flatten_default_value(Some(&json!(5))), "5");
        assert_eq!(flatten_default_value(Some(&json!("low"))), "\"low\"");
        assert_eq!(flatten_default_value(None), "");
        assert_eq!(flatten_default_value(Some(&Value::Null)), "");
    }

    #[test]
    fn create_then_read_preserves_typed_default() {
        let mock = Arc::new(MockAzdo::new());
        let res = FieldResource::new(mock.clone());
        let pid = Uuid::new_v4();
        let planned = attrs(&[
            ("process_id", json!(pid.to_string())),
            ("work_item_type", json!("Custom.Bug")),
            ("reference_name", json!("Custom.Severity")),
            ("required", json!(true)),
            ("default_value", json!("3")),
        ]);
        let mut d = StateStore::new(planned, Attrs::new());
        res.create(&OpContext::new(), &mut d).unwrap();
        assert_eq!(d.id(), "Custom.Severity");
        assert_eq!(d.get("default_value"), json!("3"));
        assert_eq!(d.get("required"), json!(true));
    }

    #[test]
    fn update_only_sends_changed_attributes() {
        let mock = Arc::new(MockAzdo::new());
        let res = FieldResource::new(mock.clone());
        let pid = Uuid::new_v4();
        let base = attrs(&[
            ("process_id", json!(pid.to_string())),
            ("work_item_type", json!("Custom.Bug")),
            ("reference_name", json!("Custom.Severity")),
            ("required", json!(false)),
            ("default_value", json!("3")),
        ]);
        let mut d = StateStore::new(base.clone(), Attrs::new());
        res.create(&OpContext::new(), &mut d).unwrap();

        let mut planned = base.clone();
        planned.insert("required".to_string(), json!(true));
        let mut d = StateStore::with_prior("Custom.Severity", planned, Attrs::new(), base);
        res.update(&OpContext::new(), &mut d).unwrap();

        // The mock stores the update body verbatim; the unchanged default
        // never rode along.
        let stored = mock
            .get_field(pid, "Custom.Bug", "Custom.Severity")
            .unwrap();
        assert_eq!(stored.required, Some(true));
        assert_eq!(stored.default_value, None);
    }

    #[test]
    fn removed_field_reads_as_gone() {
        let mock = Arc::new(MockAzdo::new());
        let res = FieldResource::new(mock);
        let planned = attrs(&[
            ("process_id", json!(Uuid::new_v4().to_string())),
            ("work_item_type", json!("Custom.Bug")),
        ]);
        let mut d = StateStore::with_prior("Custom.Gone", planned, Attrs::new(), Attrs::new());
        res.read(&OpContext::new(), &mut d).unwrap();
        assert!(d.id().is_empty());
    }
}
