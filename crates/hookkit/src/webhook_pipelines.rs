//! Webhook subscription for `pipelines` publisher events (stage and run
//! state changes). Unlike the `tfs` publisher, empty filter values are sent
//! through so the server records the filter keys explicitly.

use std::sync::Arc;

use anyhow::Result;
use azdoapi::ServiceHooksClient;
use azdoapi::models::hooks::Subscription;
use declarative::{Lifecycle, OpContext, StateStore};
use serde_json::Value;

use crate::events::{self, PIPELINES_EVENTS};
use crate::{consumer, replace_sub, sub_uuid};

pub struct WebhookPipelinesResource {
    client: Arc<dyn ServiceHooksClient>,
}

impl WebhookPipelinesResource {
    pub fn new(client: Arc<dyn ServiceHooksClient>) -> Self {
        Self { client }
    }

    fn body_from(d: &StateStore) -> Result<Subscription> {
        let spec = events::by_name(PIPELINES_EVENTS, &d.get_str("published_event"))?;
        let config = events::config_strings(d);
        Ok(Subscription {
            id: None,
            publisher_id: "pipelines".to_string(),
            event_type: spec.event_type.to_string(),
            consumer_id: consumer::CONSUMER_WEBHOOKS.to_string(),
            consumer_action_id: consumer::ACTION_HTTP_REQUEST.to_string(),
            resource_version: Some("5.1-preview.1".to_string()),
            publisher_inputs: events::expand_publisher(spec, &d.get_str("project_id"), &config, true),
            consumer_inputs: consumer::webhook_inputs(d),
            status: None,
        })
    }
}

impl Lifecycle for WebhookPipelinesResource {
    fn type_name(&self) -> &'static str {
        "azdo_servicehook_webhook_pipelines"
    }

    fn create(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let created = self
            .client
            .create_subscription(&Self::body_from(d)?)
            .map_err(|e| e.while_doing("creating webhook subscription"))?;
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
            Err(e) => return Err(e.while_doing("reading webhook subscription").into()),
        };
        let spec = events::by_event_type(PIPELINES_EVENTS, &sub.event_type)?;
        d.set("published_event", spec.name);
        d.set("event_config", Value::Object(events::flatten_publisher(spec, &sub.publisher_inputs)));
        if let Some(project_id) = sub.publisher_inputs.get("projectId") {
            d.set("project_id", project_id.clone());
        }
        consumer::flatten_webhook(d, &sub.consumer_inputs);
        Ok(())
    }

    fn update(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        replace_sub(self.client.as_ref(), d, Self::body_from(d)?)?;
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
    use azdoapi::mock::MockAzdo;
    use declarative::Attrs;
    use serde_json::json;

    #[test]
    fn stage_filters_are_sent_even_when_empty() {
        let mock = Arc::new(MockAzdo::new());
        let res = WebhookPipelinesResource::new(mock.clone());

        let planned: Attrs = [
            ("project_id".to_string(), json!("p1")),
            ("url".to_string(), json!("https://example.com/sink")),
            ("published_event".to_string(), json!("StageStateChanged")),
            (
                "event_config".to_string(),
                json!({"pipeline_id": "42", "stage_name": "Deploy", "stage_state_filter": ""}),
            ),
        ]
        .into_iter()
        .collect();
        let mut d = StateStore::new(planned, Attrs::new());
        res.create(&OpContext::new(), &mut d).unwrap();

        let stored = mock.get_subscription(sub_uuid(&d).unwrap()).unwrap();
        assert_eq!(stored.event_type, "ms.vss-pipelines.stage-state-changed-event");
        assert_eq!(stored.publisher_id, "pipelines");
        assert_eq!(stored.publisher_inputs["stageNameId"], "Deploy");
        assert_eq!(stored.publisher_inputs["stageStateId"], "");
    }
}
