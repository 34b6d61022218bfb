//! # Hookkit
//!
//! Declarative resources for Azure DevOps service-hook subscriptions. A
//! subscription pairs a publisher event with a consumer action; the typed
//! resources in this crate translate declared event blocks and consumer
//! settings into the flat `{publisherInputs, consumerInputs}` wire tuple
//! using the compile-time tables in [`events`]. The generic
//! [`subscription`] resource passes both input maps through verbatim.
//!
//! Sensitive consumer inputs (account keys, passwords, connection strings)
//! come back redacted from the server and are retained from the declared
//! value instead of being re-flattened.

use std::sync::Arc;

use anyhow::Result;
use azdoapi::ServiceHooksClient;
use azdoapi::models::hooks::Subscription;
use declarative::{BoxedLifecycle, StateStore};
use log::debug;
use uuid::Uuid;

pub mod consumer;
pub mod events;
pub mod service_bus_pipelines;
pub mod storage_queue_pipelines;
pub mod subscription;
pub mod webhook_pipelines;
pub mod webhook_tfs;

/// All service-hook resource handlers, sharing one client.
pub fn resources(client: Arc<dyn ServiceHooksClient>) -> Vec<BoxedLifecycle> {
    vec![
        Box::new(subscription::SubscriptionResource::new(client.clone())),
        Box::new(webhook_tfs::WebhookTfsResource::new(client.clone())),
        Box::new(webhook_pipelines::WebhookPipelinesResource::new(client.clone())),
        Box::new(storage_queue_pipelines::StorageQueuePipelinesResource::new(client.clone())),
        Box::new(service_bus_pipelines::ServiceBusPipelinesResource::new(client)),
    ]
}

pub(crate) fn sub_uuid(d: &StateStore) -> Result<Uuid> {
    Ok(Uuid::parse_str(d.id())?)
}

pub(crate) fn replace_sub(
    client: &dyn ServiceHooksClient,
    d: &StateStore,
    mut body: Subscription,
) -> Result<()> {
    let id = sub_uuid(d)?;
    body.id = Some(id);
    client
        .replace_subscription(id, &body)
        .map_err(|e| e.while_doing("updating service hook subscription"))?;
    Ok(())
}

pub(crate) fn delete_sub(client: &dyn ServiceHooksClient, d: &mut StateStore) -> Result<()> {
    let id = sub_uuid(d)?;
    match client.delete_subscription(id) {
        Ok(()) => Ok(()),
        Err(e) if e.is_not_found() => {
            debug!("subscription {id} already gone");
            Ok(())
        }
        Err(e) => Err(e.while_doing("deleting service hook subscription").into()),
    }
}
