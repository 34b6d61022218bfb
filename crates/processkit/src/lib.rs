//! # Processkit
//!
//! Declarative resources for the Azure DevOps work-item-tracking process
//! model: processes, work-item types, fields, states, pick lists, rules,
//! and the form layout (pages, groups, controls, system controls).
//!
//! Inherited layout nodes and states get sibling resources of their own;
//! the [`gate`] module keeps a declaration from silently crossing the
//! inherited/custom boundary. Layout reads go through the [`layout`]
//! navigator because the server has no per-node GET.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use azdoapi::ProcessClient;
use declarative::{BoxedLifecycle, StateStore};
use uuid::Uuid;

pub mod color;
pub mod control;
pub mod field;
pub mod gate;
pub mod group;
pub mod inherited_control;
pub mod inherited_page;
pub mod inherited_state;
pub mod layout;
pub mod page;
pub mod picklist;
pub mod process;
pub mod rule;
pub mod state;
pub mod system_control;
pub mod work_item_type;

/// All process-model resource handlers, sharing one client.
pub fn resources(client: Arc<dyn ProcessClient>) -> Vec<BoxedLifecycle> {
    vec![
        Box::new(process::ProcessResource::new(client.clone())),
        Box::new(work_item_type::WorkItemTypeResource::new(client.clone())),
        Box::new(field::FieldResource::new(client.clone())),
        Box::new(state::StateResource::new(client.clone())),
        Box::new(inherited_state::InheritedStateResource::new(client.clone())),
        Box::new(picklist::PickListResource::new(client.clone())),
        Box::new(rule::RuleResource::new(client.clone())),
        Box::new(page::PageResource::new(client.clone())),
        Box::new(inherited_page::InheritedPageResource::new(client.clone())),
        Box::new(group::GroupResource::new(client.clone())),
        Box::new(control::ControlResource::new(client.clone())),
        Box::new(inherited_control::InheritedControlResource::new(client.clone())),
        Box::new(system_control::SystemControlResource::new(client)),
    ]
}

/// Parse a UUID attribute, with the attribute name in the error.
pub(crate) fn attr_uuid(d: &StateStore, key: &str) -> Result<Uuid> {
    let raw = d.get_str(key);
    Uuid::parse_str(&raw).with_context(|| format!("attribute {key} must be a UUID, got {raw:?}"))
}

/// Non-empty string attribute, `None` when unset or empty.
pub(crate) fn opt_str(d: &StateStore, key: &str) -> Option<String> {
    let s = d.get_str(key);
    if s.is_empty() { None } else { Some(s) }
}
