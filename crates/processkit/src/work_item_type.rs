//! Work-item type resource. The reference name the server mints at creation
//! is the resource identity.

use std::sync::Arc;

use anyhow::Result;
use azdoapi::ProcessClient;
use azdoapi::models::process::{CreateWorkItemType, UpdateWorkItemType, WorkItemTypeExpand};
use declarative::{Lifecycle, OpContext, StateStore};

use crate::{attr_uuid, color, opt_str};

pub struct WorkItemTypeResource {
    client: Arc<dyn ProcessClient>,
}

impl WorkItemTypeResource {
    pub fn new(client: Arc<dyn ProcessClient>) -> Self {
        Self { client }
    }
}

impl Lifecycle for WorkItemTypeResource {
    fn type_name(&self) -> &'static str {
        "azdo_work_item_type"
    }

    fn create(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let process_id = attr_uuid(d, "process_id")?;
        let declared_color = d.get_str("color");
        color::validate(&declared_color)?;
        let body = CreateWorkItemType {
            name: d.get_str("name"),
            description: opt_str(d, "description"),
            color: Some(color::to_api(&declared_color)),
            icon: opt_str(d, "icon"),
            inherits_from: None,
            is_disabled: d.get_bool("is_disabled"),
        };
        let created = self
            .client
            .create_work_item_type(process_id, &body)
            .map_err(|e| e.while_doing("creating work item type"))?;
        d.set_id(created.reference_name.clone());
        d.set("reference_name", created.reference_name);
        Ok(())
    }

    fn read(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let process_id = attr_uuid(d, "process_id")?;
        let wit_ref = d.id().to_string();
        let wit = match self
            .client
            .get_work_item_type(process_id, &wit_ref, WorkItemTypeExpand::None)
        {
            Ok(wit) => wit,
            Err(e) if e.is_not_found() => {
                d.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e.while_doing("reading work item type").into()),
        };
        d.set("name", wit.name);
        d.set_opt("description", wit.description);
        d.set_opt("color", wit.color.map(|c| color::to_attr(&c)));
        d.set_opt("icon", wit.icon);
        d.set("is_disabled", wit.is_disabled);
        d.set("reference_name", wit.reference_name);
        Ok(())
    }

    fn update(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let process_id = attr_uuid(d, "process_id")?;
        let wit_ref = d.id().to_string();
        let declared_color = d.get_str("color");
        color::validate(&declared_color)?;
        let body = UpdateWorkItemType {
            description: Some(d.get_str("description")),
            color: Some(color::to_api(&declared_color)),
            icon: opt_str(d, "icon"),
            is_disabled: Some(d.get_bool("is_disabled")),
        };
        self.client
            .update_work_item_type(process_id, &wit_ref, &body)
            .map_err(|e| e.while_doing("updating work item type"))?;
        Ok(())
    }

    fn delete(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let process_id = attr_uuid(d, "process_id")?;
        match self.client.delete_work_item_type(process_id, d.id()) {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.while_doing("deleting work item type").into()),
        }
    }

    fn import(&self, raw_id: &str, d: &mut StateStore) -> Result<()> {
        let parts = declarative::split_import_id(raw_id, "process_id/reference_name")?;
        d.set_planned("process_id", parts[0]);
        d.set_id(parts[1]);
        Ok(())
    }
}
