//! # Checkkit
//!
//! Declarative resources for Azure DevOps approvals and checks. A check
//! configuration guards a protected resource (a service endpoint, an
//! environment, a variable group) and gates pipeline stages on a condition.
//! Each resource here owns one check kind and translates between declared
//! attributes and the server's settings document; the shared lifecycle
//! mechanics live in [`common`].

use std::sync::Arc;

use azdoapi::ChecksClient;
use declarative::BoxedLifecycle;

pub mod approval;
pub mod branch_control;
pub mod business_hours;
pub mod common;
pub mod exclusive_lock;
pub mod required_template;
pub mod rest_api;

use common::CheckHandler;

/// All check resource handlers, sharing one client.
pub fn resources(client: Arc<dyn ChecksClient>) -> Vec<BoxedLifecycle> {
    vec![
        Box::new(CheckHandler::new(client.clone(), approval::ApprovalKind)),
        Box::new(CheckHandler::new(client.clone(), branch_control::BranchControlKind)),
        Box::new(CheckHandler::new(client.clone(), business_hours::BusinessHoursKind)),
        Box::new(CheckHandler::new(client.clone(), exclusive_lock::ExclusiveLockKind)),
        Box::new(CheckHandler::new(client.clone(), required_template::RequiredTemplateKind)),
        Box::new(CheckHandler::new(client, rest_api::RestApiKind)),
    ]
}
