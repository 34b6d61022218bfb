//! System control resource: customization of the built-in fixed-id controls
//! (Area Path, Iteration Path, Reason, ...) that live outside the editable
//! groups.
//!
//! The endpoint only returns controls edited away from their defaults, so
//! absence from the list means reverted, not deleted. Both create and
//! update issue the same patch; delete reverts to the default.

use std::sync::Arc;

use anyhow::Result;
use azdoapi::ProcessClient;
use azdoapi::models::process::Control;
use declarative::{Lifecycle, OpContext, StateStore};

use crate::{attr_uuid, opt_str};

pub struct SystemControlResource {
    client: Arc<dyn ProcessClient>,
}

impl SystemControlResource {
    pub fn new(client: Arc<dyn ProcessClient>) -> Self {
        Self { client }
    }

    fn apply(&self, d: &mut StateStore, operation: &str) -> Result<()> {
        let process_id = attr_uuid(d, "process_id")?;
        let wit_ref = d.get_str("work_item_type");
        let control_id = d.get_str("control_id");
        let control = Control {
            id: Some(control_id.clone()),
            label: opt_str(d, "label"),
            visible: d.tri_state("visible"),
            read_only: d.tri_state("read_only"),
            ..Control::default()
        };
        self.client
            .update_system_control(process_id, &wit_ref, &control_id, &control)
            .map_err(|e| e.while_doing(operation.to_string()))?;
        d.set_id(control_id);
        Ok(())
    }
}

impl Lifecycle for SystemControlResource {
    fn type_name(&self) -> &'static str {
        "azdo_system_control"
    }

    fn create(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        self.apply(d, "customizing system control")
    }

    fn read(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let process_id = attr_uuid(d, "process_id")?;
        let wit_ref = d.get_str("work_item_type");
        let edited = self
            .client
            .get_system_controls(process_id, &wit_ref)
            .map_err(|e| e.while_doing("reading system controls"))?;
        let Some(control) = edited.into_iter().find(|c| c.id.as_deref() == Some(d.id()))
        else {
            // Absent from the edited-only list: reverted out-of-band.
            d.clear_id();
            return Ok(());
        };
        d.set_opt("label", control.label);
        if let Some(visible) = control.visible {
            d.set("visible", visible);
        }
        if let Some(read_only) = control.read_only {
            d.set("read_only", read_only);
        }
        Ok(())
    }

    fn update(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        self.apply(d, "updating system control")
    }

    fn delete(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let process_id = attr_uuid(d, "process_id")?;
        let wit_ref = d.get_str("work_item_type");
        match self
            .client
            .delete_system_control(process_id, &wit_ref, d.id())
        {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.while_doing("reverting system control").into()),
        }
    }

    fn import(&self, raw_id: &str, d: &mut StateStore) -> Result<()> {
        let parts =
            declarative::split_import_id(raw_id, "process_id/work_item_type/control_id")?;
        d.set_planned("process_id", parts[0]);
        d.set_planned("work_item_type", parts[1]);
        d.set_planned("control_id", parts[2]);
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

    fn reason_attrs(pid: Uuid) -> Attrs {
        attrs(&[
            ("process_id", json!(pid.to_string())),
            ("work_item_type", json!("Custom.Task")),
            ("control_id", json!("System.Reason")),
            ("label", json!("Why")),
        ])
    }

    #[test]
    fn create_and_update_both_patch_the_system_control() {
        let mock = Arc::new(MockAzdo::new());
        let res = SystemControlResource::new(mock.clone());
        let pid = Uuid::new_v4();

        let mut d = StateStore::new(reason_attrs(pid), Attrs::new());
        res.create(&OpContext::new(), &mut d).unwrap();
        assert_eq!(d.id(), "System.Reason");
        res.update(&OpContext::new(), &mut d).unwrap();

        let patches = mock
            .calls()
            .iter()
            .filter(|c| c.as_str() == "update_system_control System.Reason")
            .count();
        assert_eq!(patches, 2);
    }

    #[test]
    fn revert_clears_id_on_next_read() {
        let mock = Arc::new(MockAzdo::new());
        let res = SystemControlResource::new(mock);
        let pid = Uuid::new_v4();

        let mut d = StateStore::new(reason_attrs(pid), Attrs::new());
        res.create(&OpContext::new(), &mut d).unwrap();
        res.read(&OpContext::new(), &mut d).unwrap();
        assert_eq!(d.get("label"), json!("Why"));

        res.delete(&OpContext::new(), &mut d).unwrap();
        res.read(&OpContext::new(), &mut d).unwrap();
        assert!(d.id().is_empty());
    }

    #[test]
    fn import_reconstructs_the_compound_id() {
        let mock = Arc::new(MockAzdo::new());
        let res = SystemControlResource::new(mock);
        let pid = Uuid::new_v4();
        let mut d = StateStore::default();
        res.import(&format!("{pid}/Custom.Task/System.Reason"), &mut d)
            .unwrap();
        assert_eq!(d.id(), "System.Reason");
        assert_eq!(d.get("work_item_type"), json!("Custom.Task"));
    }
}
