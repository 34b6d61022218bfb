//! Inherited page resource: customizes the label of a page the work-item
//! type inherits from its parent process. Deleting the resource reverts the
//! page to the parent definition rather than removing it.

use std::sync::Arc;

use anyhow::Result;
use azdoapi::ProcessClient;
use azdoapi::models::process::{Page, WorkItemTypeExpand};
use declarative::{Lifecycle, OpContext, StateStore};

use crate::{attr_uuid, gate, layout};

pub struct InheritedPageResource {
    client: Arc<dyn ProcessClient>,
}

impl InheritedPageResource {
    pub fn new(client: Arc<dyn ProcessClient>) -> Self {
        Self { client }
    }

    fn fetch_page(&self, d: &StateStore, page_id: &str) -> Result<Option<Page>> {
        let process_id = attr_uuid(d, "process_id")?;
        let wit_ref = d.get_str("work_item_type");
        let wit = self
            .client
            .get_work_item_type(process_id, &wit_ref, WorkItemTypeExpand::Layout)
            .map_err(|e| e.while_doing("reading work item type layout"))?;
        Ok(wit.layout.as_ref().and_then(|l| layout::find_page(l, page_id)))
    }

    fn write_label(&self, d: &StateStore, page_id: &str) -> Result<()> {
        let process_id = attr_uuid(d, "process_id")?;
        let wit_ref = d.get_str("work_item_type");
        let page = Page {
            id: Some(page_id.to_string()),
            label: Some(d.get_str("label")),
            ..Page::new(d.get_str("label"))
        };
        self.client
            .update_page(process_id, &wit_ref, &page)
            .map_err(|e| e.while_doing("customizing inherited page"))?;
        Ok(())
    }
}

impl Lifecycle for InheritedPageResource {
    fn type_name(&self) -> &'static str {
        "azdo_inherited_page"
    }

    fn create(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let page_id = d.get_str("page_id");
        let Some(remote) = self.fetch_page(d, &page_id)? else {
            anyhow::bail!("page {page_id} does not exist on the work item type");
        };
        gate::require_inherited(format!("page {page_id}"), remote.inherited.unwrap_or(false))?;
        self.write_label(d, &page_id)?;
        d.set_id(page_id);
        Ok(())
    }

    fn read(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let page_id = d.id().to_string();
        let Some(page) = self.fetch_page(d, &page_id)? else {
            d.clear_id();
            return Ok(());
        };
        d.set_opt("label", page.label);
        Ok(())
    }

    fn update(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let page_id = d.id().to_string();
        self.write_label(d, &page_id)
    }

    fn delete(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let process_id = attr_uuid(d, "process_id")?;
        let wit_ref = d.get_str("work_item_type");
        // Revert: the parent definition becomes visible again.
        match self.client.remove_page(process_id, &wit_ref, d.id()) {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.while_doing("reverting inherited page").into()),
        }
    }

    fn import(&self, raw_id: &str, d: &mut StateStore) -> Result<()> {
        let parts = declarative::split_import_id(raw_id, "process_id/work_item_type/page_id")?;
        d.set_planned("process_id", parts[0]);
        d.set_planned("work_item_type", parts[1]);
        d.set_planned("page_id", parts[2]);
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

    fn seed_inherited_page(mock: &MockAzdo, pid: Uuid) {
        mock.seed_basic_layout(pid, "Custom.Task");
        // Tag the seeded page as inherited from the parent process.
        let mut wit = mock
            .get_work_item_type(pid, "Custom.Task", WorkItemTypeExpand::Layout)
            .unwrap();
        if let Some(layout) = wit.layout.as_mut() {
            layout.pages[0].inherited = Some(true);
        }
        mock.seed_work_item_type(pid, wit);
    }

    #[test]
    fn customize_then_revert() {
        let mock = Arc::new(MockAzdo::new());
        let res = InheritedPageResource::new(mock.clone());
        let pid = Uuid::new_v4();
        seed_inherited_page(&mock, pid);

        let planned = attrs(&[
            ("process_id", json!(pid.to_string())),
            ("work_item_type", json!("Custom.Task")),
            ("page_id", json!("page-1")),
            ("label", json!("Details Customized")),
        ]);
        let mut d = StateStore::new(planned, Attrs::new());
        res.create(&OpContext::new(), &mut d).unwrap();
        assert_eq!(d.id(), "page-1");
        assert!(mock.calls().iter().any(|c| c.starts_with("update_page page-1")));

        res.read(&OpContext::new(), &mut d).unwrap();
        assert_eq!(d.get("label"), json!("Details Customized"));

        res.delete(&OpContext::new(), &mut d).unwrap();
        assert!(mock.calls().iter().any(|c| c.starts_with("remove_page page-1")));
    }

    #[test]
    fn custom_page_is_rejected() {
        let mock = Arc::new(MockAzdo::new());
        let res = InheritedPageResource::new(mock.clone());
        let pid = Uuid::new_v4();
        mock.seed_basic_layout(pid, "Custom.Task");

        let planned = attrs(&[
            ("process_id", json!(pid.to_string())),
            ("work_item_type", json!("Custom.Task")),
            ("page_id", json!("page-1")),
            ("label", json!("Nope")),
        ]);
        let mut d = StateStore::new(planned, Attrs::new());
        let err = res.create(&OpContext::new(), &mut d).unwrap_err();
        assert!(err.to_string().contains("inherited variant"));
        assert!(d.id().is_empty());
    }
}
