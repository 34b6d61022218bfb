//! Custom state resource.

use std::sync::Arc;

use anyhow::{Result, bail};
use azdoapi::ProcessClient;
use azdoapi::models::process::{StateDefinition, UpdateStateDefinition};
use declarative::{Lifecycle, OpContext, StateStore};

use crate::{attr_uuid, color};

pub struct StateResource {
    client: Arc<dyn ProcessClient>,
}

impl StateResource {
    pub fn new(client: Arc<dyn ProcessClient>) -> Self {
        Self { client }
    }
}

impl Lifecycle for StateResource {
    fn type_name(&self) -> &'static str {
        "azdo_state"
    }

    fn create(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let process_id = attr_uuid(d, "process_id")?;
        let wit_ref = d.get_str("work_item_type");
        let declared_color = d.get_str("color");
        color::validate(&declared_color)?;
        let body = StateDefinition {
            id: None,
            name: d.get_str("name"),
            color: Some(color::to_api(&declared_color)),
            state_category: Some(d.get_str("state_category")),
            order: d.raw_i64("order").and_then(|o| i32::try_from(o).ok()),
            hidden: None,
            customization_type: None,
        };
        let created = self
            .client
            .create_state(process_id, &wit_ref, &body)
            .map_err(|e| e.while_doing("creating state"))?;
        d.set_id(created.id.unwrap_or_default());
        d.set_opt("order", created.order);
        Ok(())
    }

    fn read(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let process_id = attr_uuid(d, "process_id")?;
        let wit_ref = d.get_str("work_item_type");
        let state_id = d.id().to_string();
        let def = match self.client.get_state(process_id, &wit_ref, &state_id) {
            Ok(def) => def,
            Err(e) if e.is_not_found() => {
                d.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e.while_doing("reading state").into()),
        };
        d.set("name", def.name);
        d.set_opt("color", def.color.map(|c| color::to_attr(&c)));
        d.set_opt("state_category", def.state_category);
        d.set_opt("order", def.order);
        Ok(())
    }

    fn update(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        if d.has_change("state_category") {
            bail!("state_category is immutable; the state must be replaced");
        }
        let process_id = attr_uuid(d, "process_id")?;
        let wit_ref = d.get_str("work_item_type");
        let state_id = d.id().to_string();

        // Partial update: only the attributes that changed.
        let mut body = UpdateStateDefinition::default();
        if d.has_change("name") {
            body.name = Some(d.get_str("name"));
        }
        if d.has_change("color") {
            let declared_color = d.get_str("color");
            color::validate(&declared_color)?;
            body.color = Some(color::to_api(&declared_color));
        }
        if d.has_change("order") {
            body.order = d.raw_i64("order").and_then(|o| i32::try_from(o).ok());
        }
        self.client
            .update_state(process_id, &wit_ref, &state_id, &body)
            .map_err(|e| e.while_doing("updating state"))?;
        Ok(())
    }

    fn delete(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let process_id = attr_uuid(d, "process_id")?;
        let wit_ref = d.get_str("work_item_type");
        match self.client.delete_state(process_id, &wit_ref, d.id()) {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.while_doing("deleting state").into()),
        }
    }

    fn import(&self, raw_id: &str, d: &mut StateStore) -> Result<()> {
        let parts = declarative::split_import_id(raw_id, "process_id/work_item_type/state_id")?;
        d.set_planned("process_id", parts[0]);
        d.set_planned("work_item_type", parts[1]);
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
    use uuid::Uuid;

    fn attrs(pairs: &[(&str, serde_json::Value)]) -> Attrs {
        pairs.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect()
    }

    fn triage_attrs(pid: Uuid) -> Attrs {
        attrs(&[
            ("process_id", json!(pid.to_string())),
            ("work_item_type", json!("Custom.Bug")),
            ("name", json!("Triage")),
            ("color", json!("#b2b2b2")),
            ("state_category", json!("Proposed")),
        ])
    }

    #[test]
    fn create_recolor_delete() {
        let mock = Arc::new(MockAzdo::new());
        let res = StateResource::new(mock.clone());
        let pid = Uuid::new_v4();

        let mut d = StateStore::new(triage_attrs(pid), Attrs::new());
        res.create(&OpContext::new(), &mut d).unwrap();
        assert!(Uuid::parse_str(d.id()).is_ok());
        let state_id = d.id().to_string();

        let mut recolored = triage_attrs(pid);
        recolored.insert("color".to_string(), json!("#ff0000"));
        let mut d = StateStore::with_prior(&state_id, recolored, Attrs::new(), triage_attrs(pid));
        res.update(&OpContext::new(), &mut d).unwrap();

        let stored = mock.get_state(pid, "Custom.Bug", &state_id).unwrap();
        assert_eq!(stored.color.as_deref(), Some("ff0000"));
        // The unchanged name never rode along in the patch.
        assert_eq!(stored.name, "Triage");

        res.delete(&OpContext::new(), &mut d).unwrap();
        res.delete(&OpContext::new(), &mut d).unwrap();
    }

    #[test]
    fn category_change_is_rejected() {
        let mock = Arc::new(MockAzdo::new());
        let res = StateResource::new(mock);
        let pid = Uuid::new_v4();
        let mut changed = triage_attrs(pid);
        changed.insert("state_category".to_string(), json!("InProgress"));
        let mut d = StateStore::with_prior("state-1", changed, Attrs::new(), triage_attrs(pid));
        let err = res.update(&OpContext::new(), &mut d).unwrap_err();
        assert!(err.to_string().contains("immutable"));
    }

    #[test]
    fn read_restores_hash_prefix() {
        let mock = Arc::new(MockAzdo::new());
        let res = StateResource::new(mock);
        let pid = Uuid::new_v4();
        let mut d = StateStore::new(triage_attrs(pid), Attrs::new());
        res.create(&OpContext::new(), &mut d).unwrap();
        res.read(&OpContext::new(), &mut d).unwrap();
        assert_eq!(d.get("color"), json!("#b2b2b2"));
    }
}
