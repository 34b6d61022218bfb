//! Custom control resource: one control inside a layout group.
//!
//! The caller-supplied id is the permanent identifier; for field controls it
//! equals the field reference name. Creation races contribution
//! installation for contribution-backed controls, so it runs under the
//! retry kernel. Reads walk the layout tree, there is no per-control GET.

use std::sync::Arc;

use anyhow::Result;
use azdoapi::models::process::{Control, WorkItemTypeExpand};
use azdoapi::{ProcessClient, retry_on_contribution_missing, retry_on_unexpected_exception, with_retry};
use declarative::{Lifecycle, OpContext, StateStore};
use log::debug;

use crate::{attr_uuid, layout, opt_str};

pub struct ControlResource {
    client: Arc<dyn ProcessClient>,
}

impl ControlResource {
    pub fn new(client: Arc<dyn ProcessClient>) -> Self {
        Self { client }
    }

    fn control_from(d: &StateStore) -> Control {
        Control {
            id: Some(d.get_str("control_id")),
            label: opt_str(d, "label"),
            control_type: opt_str(d, "control_type"),
            metadata: opt_str(d, "metadata"),
            watermark: opt_str(d, "watermark"),
            visible: d.tri_state("visible"),
            read_only: d.tri_state("read_only"),
            ..Control::default()
        }
    }
}

impl Lifecycle for ControlResource {
    fn type_name(&self) -> &'static str {
        "azdo_control"
    }

    fn create(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let process_id = attr_uuid(d, "process_id")?;
        let wit_ref = d.get_str("work_item_type");
        let group_id = d.get_str("group_id");
        let control = Self::control_from(d);
        let created = with_retry(
            ctx,
            ctx.timeouts().create,
            retry_on_contribution_missing,
            || self.client.add_control_to_group(process_id, &wit_ref, &group_id, &control),
        )
        .map_err(|e| e.while_doing("adding control to group"))?;
        d.set_id(created.id.unwrap_or_default());
        d.set_opt("order", created.order);
        Ok(())
    }

    fn read(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let process_id = attr_uuid(d, "process_id")?;
        let wit_ref = d.get_str("work_item_type");
        let wit = self
            .client
            .get_work_item_type(process_id, &wit_ref, WorkItemTypeExpand::Layout)
            .map_err(|e| e.while_doing("reading work item type layout"))?;
        let Some(found) = wit
            .layout
            .as_ref()
            .and_then(|l| layout::find_control(l, d.id()))
        else {
            d.clear_id();
            return Ok(());
        };
        d.set("group_id", found.group_id);
        d.set_opt("label", found.control.label);
        d.set_opt("control_type", found.control.control_type);
        d.set_opt("metadata", found.control.metadata);
        d.set_opt("watermark", found.control.watermark);
        if let Some(visible) = found.control.visible {
            d.set("visible", visible);
        }
        if let Some(read_only) = found.control.read_only {
            d.set("read_only", read_only);
        }
        Ok(())
    }

    fn update(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let process_id = attr_uuid(d, "process_id")?;
        let wit_ref = d.get_str("work_item_type");
        let control_id = d.id().to_string();
        let group_id = d.get_str("group_id");
        let control = Self::control_from(d);

        if d.has_change("group_id") {
            let (from_group, _) = d.change("group_id");
            let from_group = from_group.as_str().unwrap_or_default().to_string();
            debug!("moving control {control_id} from {from_group} to {group_id}");
            self.client
                .move_control_to_group(
                    process_id,
                    &wit_ref,
                    &group_id,
                    &control_id,
                    &control,
                    &from_group,
                )
                .map_err(|e| e.while_doing("moving control"))?;
        }

        let property_changed = ["label", "visible", "read_only", "metadata", "watermark"]
            .iter()
            .any(|key| d.has_change(key));
        if property_changed {
            self.client
                .update_control(process_id, &wit_ref, &group_id, &control_id, &control)
                .map_err(|e| e.while_doing("updating control"))?;
        }
        Ok(())
    }

    fn delete(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let process_id = attr_uuid(d, "process_id")?;
        let wit_ref = d.get_str("work_item_type");
        let group_id = d.get_str("group_id");
        let control_id = d.id().to_string();
        let outcome = with_retry(
            ctx,
            ctx.timeouts().delete,
            retry_on_unexpected_exception,
            || {
                self.client
                    .remove_control_from_group(process_id, &wit_ref, &group_id, &control_id)
            },
        );
        match outcome {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.while_doing("removing control from group").into()),
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
