//! Custom group resource: a labelled box of controls under a page section.
//!
//! A reconciliation can carry both a reparent (page or section changed) and
//! a property edit. The move is always issued first; the property endpoint
//! addresses the group through its new parent afterwards.

use std::sync::Arc;

use anyhow::Result;
use azdoapi::ProcessClient;
use azdoapi::models::process::{Group, WorkItemTypeExpand};
use declarative::{Lifecycle, OpContext, StateStore};
use log::debug;

use crate::{attr_uuid, layout};

pub struct GroupResource {
    client: Arc<dyn ProcessClient>,
}

impl GroupResource {
    pub fn new(client: Arc<dyn ProcessClient>) -> Self {
        Self { client }
    }

    fn group_from(d: &StateStore) -> Group {
        let mut group = Group::new(d.get_str("label"));
        group.visible = d.tri_state("visible");
        group
    }
}

impl Lifecycle for GroupResource {
    fn type_name(&self) -> &'static str {
        "azdo_group"
    }

    fn create(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let process_id = attr_uuid(d, "process_id")?;
        let wit_ref = d.get_str("work_item_type");
        let created = self
            .client
            .add_group(
                process_id,
                &wit_ref,
                &d.get_str("page_id"),
                &d.get_str("section_id"),
                &Self::group_from(d),
            )
            .map_err(|e| e.while_doing("adding group"))?;
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
        let Some(found) = wit.layout.as_ref().and_then(|l| layout::find_group(l, d.id()))
        else {
            d.clear_id();
            return Ok(());
        };
        d.set_opt("label", found.group.label);
        d.set("visible", found.group.visible.unwrap_or(true));
        d.set("page_id", found.page_id);
        d.set("section_id", found.section_id);
        Ok(())
    }

    fn update(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let process_id = attr_uuid(d, "process_id")?;
        let wit_ref = d.get_str("work_item_type");
        let group_id = d.id().to_string();
        let page_id = d.get_str("page_id");
        let section_id = d.get_str("section_id");

        if d.has_change("page_id") || d.has_change("section_id") {
            let (from_page, _) = d.change("page_id");
            let (from_section, _) = d.change("section_id");
            let from_page = from_page.as_str().unwrap_or_default().to_string();
            let from_section = from_section.as_str().unwrap_or_default().to_string();
            debug!("moving group {group_id} from {from_page}/{from_section} to {page_id}/{section_id}");
            self.client
                .move_group_to_page(
                    process_id,
                    &wit_ref,
                    &page_id,
                    &section_id,
                    &group_id,
                    &Self::group_from(d),
                    &from_page,
                    &from_section,
                )
                .map_err(|e| e.while_doing("moving group"))?;
        }

        if d.has_change("label") || d.has_change("visible") {
            self.client
                .update_group(
                    process_id,
                    &wit_ref,
                    &page_id,
                    &section_id,
                    &group_id,
                    &Self::group_from(d),
                )
                .map_err(|e| e.while_doing("updating group"))?;
        }
        Ok(())
    }

    fn delete(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let process_id = attr_uuid(d, "process_id")?;
        let wit_ref = d.get_str("work_item_type");
        match self.client.remove_group(
            process_id,
            &wit_ref,
            &d.get_str("page_id"),
            &d.get_str("section_id"),
            d.id(),
        ) {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.while_doing("removing group").into()),
        }
    }

    fn import(&self, raw_id: &str, d: &mut StateStore) -> Result<()> {
        let parts = declarative::split_import_id(
            raw_id,
            "process_id/work_item_type/page_id/section_id/group_id",
        )?;
        d.set_planned("process_id", parts[0]);
        d.set_planned("work_item_type", parts[1]);
        d.set_planned("page_id", parts[2]);
        d.set_planned("section_id", parts[3]);
        d.set_id(parts[4]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use azdoapi::mock::MockAzdo;
    use azdoapi::models::process::Page;
    use declarative::Attrs;
    use serde_json::json;
    use uuid::Uuid;

    fn attrs(pairs: &[(&str, serde_json::Value)]) -> Attrs {
        pairs.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect()
    }

    fn base_attrs(pid: Uuid, page_id: &str, label: &str) -> Attrs {
        attrs(&[
            ("process_id", json!(pid.to_string())),
            ("work_item_type", json!("Custom.Task")),
            ("page_id", json!(page_id)),
            ("section_id", json!("Section1")),
            ("label", json!(label)),
        ])
    }

    #[test]
    fn reparent_issues_move_before_property_update() {
        let mock = Arc::new(MockAzdo::new());
        let res = GroupResource::new(mock.clone());
        let pid = Uuid::new_v4();
        mock.seed_basic_layout(pid, "Custom.Task");
        let second_page = mock
            .add_page(pid, "Custom.Task", &Page::new("More"))
            .unwrap()
            .id
            .unwrap();

        let mut d = StateStore::new(base_attrs(pid, "page-1", "Estimates"), Attrs::new());
        res.create(&OpContext::new(), &mut d).unwrap();
        let group_id = d.id().to_string();

        let mut planned = base_attrs(pid, &second_page, "Estimates*");
        planned.insert("section_id".to_string(), json!("Section2"));
        let mut d = StateStore::with_prior(
            &group_id,
            planned,
            Attrs::new(),
            base_attrs(pid, "page-1", "Estimates"),
        );
        res.update(&OpContext::new(), &mut d).unwrap();

        let calls = mock.calls();
        let move_pos = calls
            .iter()
            .position(|c| c.starts_with(&format!("move_group_to_page {group_id}")))
            .unwrap();
        let update_pos = calls
            .iter()
            .position(|c| c.starts_with(&format!("update_group {group_id}")))
            .unwrap();
        assert!(move_pos < update_pos);
        assert_eq!(
            calls[move_pos],
            format!(
                "move_group_to_page {group_id} to={second_page}/Section2 from=page-1/Section1"
            )
        );
    }

    #[test]
    fn label_only_update_issues_no_move() {
        let mock = Arc::new(MockAzdo::new());
        let res = GroupResource::new(mock.clone());
        let pid = Uuid::new_v4();
        mock.seed_basic_layout(pid, "Custom.Task");

        let mut d = StateStore::new(base_attrs(pid, "page-1", "Estimates"), Attrs::new());
        res.create(&OpContext::new(), &mut d).unwrap();
        let group_id = d.id().to_string();

        let mut d = StateStore::with_prior(
            &group_id,
            base_attrs(pid, "page-1", "Estimates*"),
            Attrs::new(),
            base_attrs(pid, "page-1", "Estimates"),
        );
        res.update(&OpContext::new(), &mut d).unwrap();
        assert!(!mock.calls().iter().any(|c| c.starts_with("move_group")));
    }

    #[test]
    fn read_reports_actual_location() {
        let mock = Arc::new(MockAzdo::new());
        let pid = Uuid::new_v4();
        mock.seed_basic_layout(pid, "Custom.Task");
        let res = GroupResource::new(mock);
        let mut d = StateStore::with_prior(
            "group-1",
            base_attrs(pid, "page-1", "Planning"),
            Attrs::new(),
            Attrs::new(),
        );
        res.read(&OpContext::new(), &mut d).unwrap();
        assert_eq!(d.get("page_id"), json!("page-1"));
        assert_eq!(d.get("section_id"), json!("Section1"));
    }
}
