//! Webhook subscription for `tfs` publisher events (code pushes, pull
//! requests, work items, builds). The event block keys come from
//! [`events::TFS_EVENTS`]; empty filter values are not sent.

use std::sync::Arc;

use anyhow::Result;
use azdoapi::ServiceHooksClient;
use azdoapi::models::hooks::Subscription;
use declarative::{Lifecycle, OpContext, StateStore};
use serde_json::Value;

use crate::events::{self, TFS_EVENTS};
use crate::{consumer, replace_sub, sub_uuid};

pub struct WebhookTfsResource {
    client: Arc<dyn ServiceHooksClient>,
}

impl WebhookTfsResource {
    pub fn new(client: Arc<dyn ServiceHooksClient>) -> Self {
        Self { client }
    }

    fn body_from(d: &StateStore) -> Result<Subscription> {
        let spec = events::by_name(TFS_EVENTS, &d.get_str("published_event"))?;
        let config = events::config_strings(d);
        Ok(Subscription {
            id: None,
            publisher_id: "tfs".to_string(),
            event_type: spec.event_type.to_string(),
            consumer_id: consumer::CONSUMER_WEBHOOKS.to_string(),
            consumer_action_id: consumer::ACTION_HTTP_REQUEST.to_string(),
            resource_version: Some("7.1".to_string()),
            publisher_inputs: events::expand_publisher(spec, &d.get_str("project_id"), &config, false),
            consumer_inputs: consumer::webhook_inputs(d),
            status: None,
        })
    }
}

impl Lifecycle for WebhookTfsResource {
    fn type_name(&self) -> &'static str {
        "azdo_servicehook_webhook_tfs"
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
        let spec = events::by_event_type(TFS_EVENTS, &sub.event_type)?;
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
