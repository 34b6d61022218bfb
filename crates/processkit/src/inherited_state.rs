//! Inherited state resource: manages visibility of a state the work-item
//! type inherits from its parent process.
//!
//! The state is addressed by name; creating the resource locates the remote
//! definition and applies the declared `hidden` flag. Deleting reverts the
//! state to its parent definition. Unhiding goes through the DELETE verb on
//! the hidden overlay, which the client wraps behind `hide_state(false)`.

use std::sync::Arc;

use anyhow::Result;
use azdoapi::ProcessClient;
use azdoapi::models::process::StateDefinition;
use declarative::{Lifecycle, OpContext, StateStore};

use crate::{attr_uuid, color, gate};

pub struct InheritedStateResource {
    client: Arc<dyn ProcessClient>,
}

impl InheritedStateResource {
    pub fn new(client: Arc<dyn ProcessClient>) -> Self {
        Self { client }
    }

    fn locate_by_name(
        &self,
        d: &StateStore,
        name: &str,
    ) -> Result<Option<StateDefinition>> {
        let process_id = attr_uuid(d, "process_id")?;
        let wit_ref = d.get_str("work_item_type");
        let states = self
            .client
            .list_states(process_id, &wit_ref)
            .map_err(|e| e.while_doing("listing states"))?;
        Ok(states.into_iter().find(|s| s.name == name))
    }
}

impl Lifecycle for InheritedStateResource {
    fn type_name(&self) -> &'static str {
        "azdo_inherited_state"
    }

    fn create(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let name = d.get_str("name");
        let Some(def) = self.locate_by_name(d, &name)? else {
            anyhow::bail!("state {name:?} does not exist on the work item type");
        };
        gate::require_inherited_state(format!("state {name}"), def.customization_type)?;

        let state_id = def.id.clone().unwrap_or_default();
        if let Some(hidden) = d.tri_state("hidden")
            && def.hidden.unwrap_or(false) != hidden
        {
            let process_id = attr_uuid(d, "process_id")?;
            let wit_ref = d.get_str("work_item_type");
            self.client
                .hide_state(process_id, &wit_ref, &state_id, hidden)
                .map_err(|e| e.while_doing("hiding state"))?;
        }
        d.set_id(state_id);
        self.read(ctx, d)
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
            Err(e) => return Err(e.while_doing("reading inherited state").into()),
        };
        d.set("name", def.name);
        d.set_opt("color", def.color.map(|c| color::to_attr(&c)));
        d.set_opt("state_category", def.state_category);
        d.set("hidden", def.hidden.unwrap_or(false));
        Ok(())
    }

    fn update(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        if !d.has_change("hidden") {
            return Ok(());
        }
        let process_id = attr_uuid(d, "process_id")?;
        let wit_ref = d.get_str("work_item_type");
        let state_id = d.id().to_string();
        let hidden = d.tri_state("hidden").unwrap_or(false);
        self.client
            .hide_state(process_id, &wit_ref, &state_id, hidden)
            .map_err(|e| e.while_doing("updating inherited state"))?;
        Ok(())
    }

    fn delete(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let process_id = attr_uuid(d, "process_id")?;
        let wit_ref = d.get_str("work_item_type");
        // Revert to the parent definition.
        match self.client.delete_state(process_id, &wit_ref, d.id()) {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.while_doing("reverting inherited state").into()),
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
    use azdoapi::models::process::CustomizationType;
    use declarative::Attrs;
    use serde_json::json;
    use uuid::Uuid;

    fn attrs(pairs: &[(&str, serde_json::Value)]) -> Attrs {
        pairs.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect()
    }

    fn seed_new_state(mock: &MockAzdo, pid: Uuid) -> String {
        let id = Uuid::new_v4().to_string();
        mock.seed_states(
            pid,
            "Custom.Bug",
            vec![StateDefinition {
                id: Some(id.clone()),
                name: "New".to_string(),
                color: Some("b2b2b2".to_string()),
                state_category: Some("Proposed".to_string()),
                order: Some(1),
                hidden: Some(false),
                customization_type: Some(CustomizationType::System),
            }],
        );
        id
    }

    #[test]
    fn hide_then_unhide_uses_the_delete_verb() {
        let mock = Arc::new(MockAzdo::new());
        let res = InheritedStateResource::new(mock.clone());
        let pid = Uuid::new_v4();
        let state_id = seed_new_state(&mock, pid);

        let base = attrs(&[
            ("process_id", json!(pid.to_string())),
            ("work_item_type", json!("Custom.Bug")),
            ("name", json!("New")),
            ("hidden", json!(true)),
        ]);
        let mut d = StateStore::new(base.clone(), base.clone());
        res.create(&OpContext::new(), &mut d).unwrap();
        assert_eq!(d.id(), state_id);
        assert!(mock
            .calls()
            .iter()
            .any(|c| c == &format!("hide_state {state_id} hidden=true")));

        let mut unhidden = base.clone();
        unhidden.insert("hidden".to_string(), json!(false));
        let mut d = StateStore::with_prior(&state_id, unhidden.clone(), unhidden, base);
        res.update(&OpContext::new(), &mut d).unwrap();
        assert!(mock
            .calls()
            .iter()
            .any(|c| c == &format!("hide_state {state_id} hidden=false")));
    }

    #[test]
    fn custom_state_is_rejected_by_the_gate() {
        let mock = Arc::new(MockAzdo::new());
        let res = InheritedStateResource::new(mock.clone());
        let pid = Uuid::new_v4();
        mock.seed_states(
            pid,
            "Custom.Bug",
            vec![StateDefinition {
                id: Some(Uuid::new_v4().to_string()),
                name: "Triage".to_string(),
                color: Some("ff0000".to_string()),
                state_category: Some("Proposed".to_string()),
                order: Some(2),
                hidden: None,
                customization_type: Some(CustomizationType::Custom),
            }],
        );
        let base = attrs(&[
            ("process_id", json!(pid.to_string())),
            ("work_item_type", json!("Custom.Bug")),
            ("name", json!("Triage")),
        ]);
        let mut d = StateStore::new(base.clone(), base);
        let err = res.create(&OpContext::new(), &mut d).unwrap_err();
        assert!(err.to_string().contains("inherited variant"));
    }

    #[test]
    fn missing_state_fails_create_and_clears_on_read() {
        let mock = Arc::new(MockAzdo::new());
        let res = InheritedStateResource::new(mock);
        let pid = Uuid::new_v4();
        let base = attrs(&[
            ("process_id", json!(pid.to_string())),
            ("work_item_type", json!("Custom.Bug")),
            ("name", json!("Ghost")),
        ]);
        let mut d = StateStore::new(base.clone(), Attrs::new());
        assert!(res.create(&OpContext::new(), &mut d).is_err());

        let mut d = StateStore::with_prior("state-gone", base, Attrs::new(), Attrs::new());
        res.read(&OpContext::new(), &mut d).unwrap();
        assert!(d.id().is_empty());
    }
}
