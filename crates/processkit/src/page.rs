//! Custom form page resource.

use std::sync::Arc;

use anyhow::Result;
use azdoapi::ProcessClient;
use azdoapi::models::process::{Page, WorkItemTypeExpand};
use declarative::{Lifecycle, OpContext, StateStore};

use crate::{attr_uuid, gate, layout};

pub struct PageResource {
    client: Arc<dyn ProcessClient>,
}

impl PageResource {
    pub fn new(client: Arc<dyn ProcessClient>) -> Self {
        Self { client }
    }

    fn fetch_page(&self, d: &StateStore) -> Result<Option<Page>> {
        let process_id = attr_uuid(d, "process_id")?;
        let wit_ref = d.get_str("work_item_type");
        let wit = self
            .client
            .get_work_item_type(process_id, &wit_ref, WorkItemTypeExpand::Layout)
            .map_err(|e| e.while_doing("reading work item type layout"))?;
        Ok(wit.layout.as_ref().and_then(|l| layout::find_page(l, d.id())))
    }
}

impl Lifecycle for PageResource {
    fn type_name(&self) -> &'static str {
        "azdo_page"
    }

    fn create(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let process_id = attr_uuid(d, "process_id")?;
        let wit_ref = d.get_str("work_item_type");
        let mut page = Page::new(d.get_str("label"));
        if let Some(visible) = d.tri_state("visible") {
            page.visible = Some(visible);
        }
        let created = self
            .client
            .add_page(process_id, &wit_ref, &page)
            .map_err(|e| e.while_doing("adding page"))?;
        d.set_id(created.id.unwrap_or_default());
        d.set_opt("order", created.order);
        Ok(())
    }

    fn read(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let Some(page) = self.fetch_page(d)? else {
            d.clear_id();
            return Ok(());
        };
        d.set_opt("label", page.label);
        d.set("visible", page.visible.unwrap_or(true));
        d.set_opt("order", page.order);
        Ok(())
    }

    fn update(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let Some(remote) = self.fetch_page(d)? else {
            anyhow::bail!("page {} does not exist", d.id());
        };
        gate::require_custom(
            format!("page {}", d.id()),
            remote.inherited.unwrap_or(false),
        )?;
        let process_id = attr_uuid(d, "process_id")?;
        let wit_ref = d.get_str("work_item_type");
        let page = Page {
            id: Some(d.id().to_string()),
            label: Some(d.get_str("label")),
            visible: d.tri_state("visible"),
            ..Page::new(d.get_str("label"))
        };
        self.client
            .update_page(process_id, &wit_ref, &page)
            .map_err(|e| e.while_doing("updating page"))?;
        Ok(())
    }

    fn delete(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let process_id = attr_uuid(d, "process_id")?;
        let wit_ref = d.get_str("work_item_type");
        match self.client.remove_page(process_id, &wit_ref, d.id()) {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.while_doing("removing page").into()),
        }
    }

    fn import(&self, raw_id: &str, d: &mut StateStore) -> Result<()> {
        let parts = declarative::split_import_id(raw_id, "process_id/work_item_type/page_id")?;
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

    #[test]
    fn create_read_delete() {
        let mock = Arc::new(MockAzdo::new());
        let res = PageResource::new(mock.clone());
        let pid = Uuid::new_v4();
        mock.seed_basic_layout(pid, "Custom.Task");

        let planned = attrs(&[
            ("process_id", json!(pid.to_string())),
            ("work_item_type", json!("Custom.Task")),
            ("label", json!("Deployment")),
        ]);
        let mut d = StateStore::new(planned, Attrs::new());
        res.create(&OpContext::new(), &mut d).unwrap();
        assert!(!d.id().is_empty());

        res.read(&OpContext::new(), &mut d).unwrap();
        assert_eq!(d.get("label"), json!("Deployment"));

        res.delete(&OpContext::new(), &mut d).unwrap();
        res.read(&OpContext::new(), &mut d).unwrap();
        assert!(d.id().is_empty());
    }
}
