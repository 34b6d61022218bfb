//! Inherited process resource.

use std::sync::Arc;

use anyhow::Result;
use azdoapi::ProcessClient;
use azdoapi::models::process::{CreateProcessModel, UpdateProcessModel};
use declarative::{Lifecycle, OpContext, StateStore};
use log::debug;

use crate::attr_uuid;

pub struct ProcessResource {
    client: Arc<dyn ProcessClient>,
}

impl ProcessResource {
    pub fn new(client: Arc<dyn ProcessClient>) -> Self {
        Self { client }
    }
}

impl Lifecycle for ProcessResource {
    fn type_name(&self) -> &'static str {
        "azdo_process"
    }

    fn create(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let body = CreateProcessModel {
            name: d.get_str("name"),
            description: Some(d.get_str("description")),
            parent_process_type_id: attr_uuid(d, "parent_process_type_id")?,
            reference_name: None,
        };
        let created = self
            .client
            .create_process(&body)
            .map_err(|e| e.while_doing("creating process"))?;

        // The create endpoint ignores the enablement flags; when the result
        // differs from the declaration, follow up with a blind update.
        let want_default = d.get_bool("is_default");
        let want_enabled = d.tri_state("is_enabled").unwrap_or(true);
        let created = if created.is_default != want_default || created.is_enabled != want_enabled {
            debug!("process {} created with drifted flags, patching", created.type_id);
            self.client
                .update_process(
                    created.type_id,
                    &UpdateProcessModel {
                        is_default: Some(want_default),
                        is_enabled: Some(want_enabled),
                        ..UpdateProcessModel::default()
                    },
                )
                .map_err(|e| e.while_doing("creating process"))?
        } else {
            created
        };

        d.set_id(created.type_id.to_string());
        d.set_opt("reference_name", created.reference_name);
        d.set("is_default", created.is_default);
        d.set("is_enabled", created.is_enabled);
        Ok(())
    }

    fn read(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let process_id = uuid::Uuid::parse_str(d.id())?;
        let info = match self.client.get_process(process_id) {
            Ok(info) => info,
            Err(e) if e.is_not_found() => {
                d.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e.while_doing("reading process").into()),
        };
        d.set("name", info.name);
        d.set_opt("description", info.description);
        d.set("parent_process_type_id", info.parent_process_type_id.to_string());
        d.set_opt("reference_name", info.reference_name);
        d.set("is_default", info.is_default);
        d.set("is_enabled", info.is_enabled);
        Ok(())
    }

    fn update(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let process_id = uuid::Uuid::parse_str(d.id())?;
        let body = UpdateProcessModel {
            name: Some(d.get_str("name")),
            description: Some(d.get_str("description")),
            is_default: Some(d.get_bool("is_default")),
            is_enabled: Some(d.tri_state("is_enabled").unwrap_or(true)),
        };
        self.client
            .update_process(process_id, &body)
            .map_err(|e| e.while_doing("updating process"))?;
        Ok(())
    }

    fn delete(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let process_id = uuid::Uuid::parse_str(d.id())?;
        match self.client.delete_process(process_id) {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.while_doing("deleting process").into()),
        }
    }

    fn import(&self, raw_id: &str, d: &mut StateStore) -> Result<()> {
        let parts = declarative::split_import_id(raw_id, "process_id")?;
        d.set_id(parts[0]);
        Ok(())
    }
}
