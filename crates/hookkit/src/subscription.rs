//! Generic subscription resource: the caller supplies the publisher and
//! consumer ids and both raw input maps verbatim. Escape hatch for event and
//! consumer combinations the typed resources do not cover.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use azdoapi::ServiceHooksClient;
use azdoapi::models::hooks::Subscription;
use declarative::{Lifecycle, OpContext, StateStore};
use serde_json::Value;

use crate::{replace_sub, sub_uuid};

pub struct SubscriptionResource {
    client: Arc<dyn ServiceHooksClient>,
}

impl SubscriptionResource {
    pub fn new(client: Arc<dyn ServiceHooksClient>) -> Self {
        Self { client }
    }

    fn body_from(d: &StateStore) -> Subscription {
        let mut publisher_inputs = string_map(&d.get("publisher_inputs"));
        let project_id = d.get_str("project_id");
        if !project_id.is_empty() {
            publisher_inputs.insert("projectId".to_string(), project_id);
        }
        Subscription {
            id: None,
            publisher_id: d.get_str("publisher_id"),
            event_type: d.get_str("event_type"),
            consumer_id: d.get_str("consumer_id"),
            consumer_action_id: d.get_str("consumer_action_id"),
            resource_version: Some(resource_version(d)),
            publisher_inputs,
            consumer_inputs: string_map(&d.get("consumer_inputs")),
            status: Some(declared_status(d)),
        }
    }
}

fn string_map(value: &Value) -> BTreeMap<String, String> {
    match value {
        Value::Object(map) => map
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
            .collect(),
        _ => BTreeMap::new(),
    }
}

fn resource_version(d: &StateStore) -> String {
    let version = d.get_str("resource_version");
    if version.is_empty() { "1.0".to_string() } else { version }
}

/// The API has no plain `disabled` status; it maps to `disabledByUser`.
fn declared_status(d: &StateStore) -> String {
    match d.get_str("status").as_str() {
        "" | "enabled" => "enabled".to_string(),
        "disabled" => "disabledByUser".to_string(),
        other => other.to_string(),
    }
}

impl Lifecycle for SubscriptionResource {
    fn type_name(&self) -> &'static str {
        "azdo_servicehook_subscription"
    }

    fn create(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let created = self
            .client
            .create_subscription(&Self::body_from(d))
            .map_err(|e| e.while_doing("creating service hook subscription"))?;
        d.set_id(created.id.map(|id| id.to_string()).unwrap_or_default());
        self.read(ctx, d)
    }

    fn read(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let sub = match self.client.get_subscription(sub_uuid(d)?) {
            Ok(sub) => sub,
            Err(e) if e.is_not_found() => {
                d.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e.while_doing("reading service hook subscription").into()),
        };
        d.set("publisher_id", sub.publisher_id);
        d.set("event_type", sub.event_type);
        d.set("consumer_id", sub.consumer_id);
        d.set("consumer_action_id", sub.consumer_action_id);
        d.set_opt("resource_version", sub.resource_version);
        d.set_opt("status", sub.status);
        let mut publisher_inputs = serde_json::Map::new();
        for (key, value) in sub.publisher_inputs {
            if key == "projectId" {
                d.set("project_id", value);
            } else {
                publisher_inputs.insert(key, Value::from(value));
            }
        }
        d.set("publisher_inputs", Value::Object(publisher_inputs));
        // Consumer inputs are sensitive and come back redacted; the declared
        // map is retained as-is.
        let declared = d.get_ok("consumer_inputs").unwrap_or_else(|| d.prior("consumer_inputs"));
        d.set("consumer_inputs", declared);
        Ok(())
    }

    fn update(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        replace_sub(self.client.as_ref(), d, Self::body_from(d))?;
        self.read(ctx, d)
    }

    fn delete(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        crate::delete_sub(self.client.as_ref(), d)
    }

    fn import(&self, raw_id: &str, d: &mut StateStore) -> Result<()> {
        let parts = declarative::split_import_id(raw_id, "subscription_id")?;
        d.set_id(parts[0]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use azdoapi::mock::{MockAzdo, REDACTED};
    use declarative::Attrs;
    use serde_json::json;

    fn attrs(pairs: &[(&str, Value)]) -> Attrs {
        pairs.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect()
    }

    fn generic_attrs() -> Attrs {
        attrs(&[
            ("project_id", json!("p1")),
            ("publisher_id", json!("tfs")),
            ("event_type", json!("git.push")),
            ("consumer_id", json!("webHooks")),
            ("consumer_action_id", json!("httpRequest")),
            ("publisher_inputs", json!({"branch": "refs/heads/main"})),
            ("consumer_inputs", json!({"url": "https://example.com/sink"})),
        ])
    }

    #[test]
    fn create_sends_inputs_verbatim_plus_project_id() {
        let mock = Arc::new(MockAzdo::new());
        let res = SubscriptionResource::new(mock.clone());

        let mut d = StateStore::new(generic_attrs(), Attrs::new());
        res.create(&OpContext::new(), &mut d).unwrap();
        assert!(!d.id().is_empty());

        let stored = mock.get_subscription(sub_uuid(&d).unwrap()).unwrap();
        assert_eq!(stored.publisher_inputs["branch"], "refs/heads/main");
        assert_eq!(stored.publisher_inputs["projectId"], "p1");
        assert_eq!(stored.resource_version.as_deref(), Some("1.0"));
        assert_eq!(stored.status.as_deref(), Some("enabled"));
    }

    #[test]
    fn read_retains_declared_consumer_inputs() {
        let mock = Arc::new(MockAzdo::new());
        let res = SubscriptionResource::new(mock.clone());

        let mut d = StateStore::new(generic_attrs(), Attrs::new());
        res.create(&OpContext::new(), &mut d).unwrap();
        let id = d.id().to_string();

        let mut d = StateStore::with_prior(&id, generic_attrs(), Attrs::new(), generic_attrs());
        res.read(&OpContext::new(), &mut d).unwrap();
        assert_eq!(d.get("consumer_inputs"), json!({"url": "https://example.com/sink"}));
        assert_eq!(d.get("project_id"), json!("p1"));
        assert_eq!(d.get("publisher_inputs"), json!({"branch": "refs/heads/main"}));
        // The redaction marker never enters state.
        assert_ne!(d.get_str("consumer_inputs"), REDACTED);
    }

    #[test]
    fn disabled_status_maps_to_disabled_by_user() {
        let mut planned = generic_attrs();
        planned.insert("status".to_string(), json!("disabled"));
        let d = StateStore::new(planned, Attrs::new());
        assert_eq!(declared_status(&d), "disabledByUser");
    }

    #[test]
    fn import_takes_the_bare_subscription_id() {
        let res = SubscriptionResource::new(Arc::new(MockAzdo::new()));
        let id = uuid::Uuid::new_v4().to_string();
        let mut d = StateStore::default();
        res.import(&id, &mut d).unwrap();
        assert_eq!(d.id(), id);
        assert!(res.import(&format!("p1/{id}"), &mut StateStore::default()).is_err());
    }

    #[test]
    fn read_of_deleted_subscription_clears_id() {
        let mock = Arc::new(MockAzdo::new());
        let res = SubscriptionResource::new(mock);
        let mut d = StateStore::with_prior(
            &uuid::Uuid::new_v4().to_string(),
            generic_attrs(),
            Attrs::new(),
            generic_attrs(),
        );
        res.read(&OpContext::new(), &mut d).unwrap();
        assert!(d.id().is_empty());
    }
}
