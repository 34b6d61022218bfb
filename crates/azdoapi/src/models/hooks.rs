//! Wire types for the service-hooks subscription endpoints.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A service-hook subscription as the server stores it.
///
/// Publisher and consumer input maps are free-form string pairs; the server
/// redacts sensitive consumer inputs in read responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub publisher_id: String,
    pub event_type: String,
    pub consumer_id: String,
    pub consumer_action_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
    #[serde(default)]
    pub publisher_inputs: BTreeMap<String, String>,
    #[serde(default)]
    pub consumer_inputs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}
