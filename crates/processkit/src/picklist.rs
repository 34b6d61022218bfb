//! Pick list resource. Lists are organization-scoped; items are an ordered
//! list of strings regardless of the declared element type.

use std::sync::Arc;

use anyhow::Result;
use azdoapi::ProcessClient;
use azdoapi::models::process::PickList;
use declarative::{Lifecycle, OpContext, StateStore};
use serde_json::Value;
use uuid::Uuid;

use crate::opt_str;

pub struct PickListResource {
    client: Arc<dyn ProcessClient>,
}

impl PickListResource {
    pub fn new(client: Arc<dyn ProcessClient>) -> Self {
        Self { client }
    }

    fn body_from(d: &StateStore) -> PickList {
        PickList {
            id: None,
            name: d.get_str("name"),
            list_type: opt_str(d, "type"),
            is_suggested: Some(d.get_bool("is_suggested")),
            url: None,
            items: items_from(&d.get("items")),
        }
    }
}

fn items_from(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

impl Lifecycle for PickListResource {
    fn type_name(&self) -> &'static str {
        "azdo_pick_list"
    }

    fn create(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let created = self
            .client
            .create_list(&Self::body_from(d))
            .map_err(|e| e.while_doing("creating pick list"))?;
        d.set_id(created.id.map(|id| id.to_string()).unwrap_or_default());
        d.set_opt("url", created.url);
        Ok(())
    }

    fn read(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let list_id = Uuid::parse_str(d.id())?;
        let list = match self.client.get_list(list_id) {
            Ok(list) => list,
            Err(e) if e.is_not_found() => {
                d.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e.while_doing("reading pick list").into()),
        };
        d.set("name", list.name);
        d.set_opt("type", list.list_type);
        d.set("is_suggested", list.is_suggested.unwrap_or(false));
        d.set("items", Value::from(list.items));
        d.set_opt("url", list.url);
        Ok(())
    }

    fn update(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let list_id = Uuid::parse_str(d.id())?;
        let updated = self
            .client
            .update_list(list_id, &Self::body_from(d))
            .map_err(|e| e.while_doing("updating pick list"))?;
        d.set("items", Value::from(updated.items));
        Ok(())
    }

    fn delete(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let list_id = Uuid::parse_str(d.id())?;
        match self.client.delete_list(list_id) {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.while_doing("deleting pick list").into()),
        }
    }

    fn import(&self, raw_id: &str, d: &mut StateStore) -> Result<()> {
        let parts = declarative::split_import_id(raw_id, "list_id")?;
        Uuid::parse_str(parts[0])?;
        d.set_id(parts[0]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use azdoapi::mock::MockAzdo;
    use declarative::Attrs;
    use serde_json::json;

    fn attrs(pairs: &[(&str, serde_json::Value)]) -> Attrs {
        pairs.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect()
    }

    fn sizes_attrs(items: serde_json::Value) -> Attrs {
        attrs(&[
            ("name", json!("Sizes")),
            ("type", json!("integer")),
            ("is_suggested", json!(false)),
            ("items", items),
        ])
    }

    #[test]
    fn create_update_items_delete() {
        let mock = Arc::new(MockAzdo::new());
        let res = PickListResource::new(mock.clone());

        let mut d = StateStore::new(sizes_attrs(json!(["1", "2", "3"])), Attrs::new());
        res.create(&OpContext::new(), &mut d).unwrap();
        assert!(Uuid::parse_str(d.id()).is_ok());
        let url = d.get_str("url");
        assert!(url.starts_with("http"));
        assert!(url.contains("/_apis/work/processes/lists/"));
        let list_id = d.id().to_string();

        let mut d = StateStore::with_prior(
            &list_id,
            sizes_attrs(json!(["1", "2", "3", "5"])),
            Attrs::new(),
            sizes_attrs(json!(["1", "2", "3"])),
        );
        res.update(&OpContext::new(), &mut d).unwrap();
        assert_eq!(d.get("items"), json!(["1", "2", "3", "5"]));
        let updates = mock.calls().iter().filter(|c| c.starts_with("update_list")).count();
        assert_eq!(updates, 1);

        res.delete(&OpContext::new(), &mut d).unwrap();
        res.delete(&OpContext::new(), &mut d).unwrap();
        let deletes = mock.calls().iter().filter(|c| c.starts_with("delete_list")).count();
        assert_eq!(deletes, 2);
    }

    #[test]
    fn item_order_is_preserved() {
        assert_eq!(
            items_from(&json!(["3", "1", "2"])),
            vec!["3".to_string(), "1".to_string(), "2".to_string()]
        );
        assert!(items_from(&Value::Null).is_empty());
    }
}
