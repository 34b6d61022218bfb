//! Inherited control resource: customizes label and visibility of a control
//! the layout inherits from the parent process. Deleting reverts the
//! override; the inherited definition stays available.

use std::sync::Arc;

use anyhow::Result;
use azdoapi::ProcessClient;
use azdoapi::models::process::{Control, WorkItemTypeExpand};
use declarative::{Lifecycle, OpContext, StateStore};

use crate::{attr_uuid, gate, layout, opt_str};

pub struct InheritedControlResource {
    client: Arc<dyn ProcessClient>,
}

impl InheritedControlResource {
    pub fn new(client: Arc<dyn ProcessClient>) -> Self {
        Self { client }
    }

    fn locate(&self, d: &StateStore, control_id: &str) -> Result<Option<layout::FoundControl>> {
        let process_id = attr_uuid(d, "process_id")?;
        let wit_ref = d.get_str("work_item_type");
        let wit = self
            .client
            .get_work_item_type(process_id, &wit_ref, WorkItemTypeExpand::Layout)
            .map_err(|e| e.while_doing("reading work item type layout"))?;
        Ok(wit.layout.as_ref().and_then(|l| layout::find_control(l, control_id)))
    }

    fn override_from(d: &StateStore, control_id: &str) -> Control {
        // Only the customizable fields ride along.
        Control {
            id: Some(control_id.to_string()),
            label: opt_str(d, "label"),
            visible: d.tri_state("visible"),
            ..Control::default()
        }
    }

    fn write_override(&self, d: &StateStore, group_id: &str, control_id: &str) -> Result<()> {
        let process_id = attr_uuid(d, "process_id")?;
        let wit_ref = d.get_str("work_item_type");
        self.client
            .update_control(
                process_id,
                &wit_ref,
                group_id,
                control_id,
                &Self::override_from(d, control_id),
            )
            .map_err(|e| e.while_doing("customizing inherited control"))?;
        Ok(())
    }
}

impl Lifecycle for InheritedControlResource {
    fn type_name(&self) -> &'static str {
        "azdo_inherited_control"
    }

    fn create(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let control_id = d.get_str("control_id");
        let Some(found) = self.locate(d, &control_id)? else {
            anyhow::bail!("control {control_id} does not exist on the work item type layout");
        };
        gate::require_inherited(
            format!("control {control_id}"),
            found.control.inherited.unwrap_or(false),
        )?;
        self.write_override(d, &found.group_id, &control_id)?;
        d.set_id(control_id);
        d.set("group_id", found.group_id);
        Ok(())
    }

    fn read(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let control_id = d.id().to_string();
        let Some(found) = self.locate(d, &control_id)? else {
            d.clear_id();
            return Ok(());
        };
        d.set("group_id", found.group_id);
        d.set_opt("label", found.control.label);
        if let Some(visible) = found.control.visible {
            d.set("visible", visible);
        }
        Ok(())
    }

    fn update(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let control_id = d.id().to_string();
        let group_id = d.get_str("group_id");
        self.write_override(d, &group_id, &control_id)
    }

    fn delete(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let process_id = attr_uuid(d, "process_id")?;
        let wit_ref = d.get_str("work_item_type");
        let group_id = d.get_str("group_id");
        // Revert the override; the parent definition remains.
        match self
            .client
            .remove_control_from_group(process_id, &wit_ref, &group_id, d.id())
        {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.while_doing("reverting inherited control").into()),
        }
    }

    fn import(&self, raw_id: &str, d: &mut StateStore) -> Result<()> {
        let parts = declarative::split_import_id(
            raw_id,
            "process_id/work_item_type/group_id/control_id",
        )?;
        d.set_planned("process_id", parts[0]);
        d.set_planned("work_item_type", parts[1]);
        d.set_planned("group_id", parts[2]);
        d.set_planned("control_id", parts[3]);
        d.set_id(parts[3]);
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

    fn seed_inherited_control(mock: &MockAzdo, pid: Uuid) {
        mock.seed_basic_layout(pid, "Custom.Task");
        mock.add_control_to_group(
            pid,
            "Custom.Task",
            "group-1",
            &Control {
                id: Some("System.Description".to_string()),
                label: Some("Description".to_string()),
                inherited: Some(true),
                ..Control::default()
            },
        )
        .unwrap();
    }

    fn base_attrs(pid: Uuid) -> Attrs {
        attrs(&[
            ("process_id", json!(pid.to_string())),
            ("work_item_type", json!("Custom.Task")),
            ("group_id", json!("group-1")),
            ("control_id", json!("System.Description")),
            ("label", json!("What happened")),
        ])
    }

    #[test]
    fn create_customizes_via_update_control() {
        let mock = Arc::new(MockAzdo::new());
        let res = InheritedControlResource::new(mock.clone());
        let pid = Uuid::new_v4();
        seed_inherited_control(&mock, pid);

        let mut d = StateStore::new(base_attrs(pid), Attrs::new());
        res.create(&OpContext::new(), &mut d).unwrap();
        assert_eq!(d.id(), "System.Description");
        assert!(mock
            .calls()
            .iter()
            .any(|c| c == "update_control System.Description group-1"));

        res.read(&OpContext::new(), &mut d).unwrap();
        assert_eq!(d.get("label"), json!("What happened"));
    }

    #[test]
    fn custom_control_is_rejected() {
        let mock = Arc::new(MockAzdo::new());
        let res = InheritedControlResource::new(mock.clone());
        let pid = Uuid::new_v4();
        mock.seed_basic_layout(pid, "Custom.Task");
        mock.add_control_to_group(
            pid,
            "Custom.Task",
            "group-1",
            &Control {
                id: Some("System.Description".to_string()),
                inherited: Some(false),
                ..Control::default()
            },
        )
        .unwrap();

        let mut d = StateStore::new(base_attrs(pid), Attrs::new());
        let err = res.create(&OpContext::new(), &mut d).unwrap_err();
        assert!(err.to_string().contains("inherited variant"));
    }

    #[test]
    fn delete_reverts_the_override() {
        let mock = Arc::new(MockAzdo::new());
        let res = InheritedControlResource::new(mock.clone());
        let pid = Uuid::new_v4();
        seed_inherited_control(&mock, pid);

        let mut d = StateStore::new(base_attrs(pid), Attrs::new());
        res.create(&OpContext::new(), &mut d).unwrap();
        res.delete(&OpContext::new(), &mut d).unwrap();
        assert!(mock
            .calls()
            .iter()
            .any(|c| c == "remove_control System.Description group-1"));
    }
}
