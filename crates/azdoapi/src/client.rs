//! Client traits over the Azure DevOps REST surface.
//!
//! Resource handlers program against these traits; production wires in the
//! REST implementations under [`crate::rest`] and tests use
//! [`crate::mock`]. Identifiers that the server mints as GUIDs are typed
//! [`Uuid`], layout node ids stay strings because pages, groups, and
//! controls mix GUIDs with well-known names (`Deployments`,
//! `System.Description`).

use uuid::Uuid;

use crate::error::Result;
use crate::models::checks::CheckConfiguration;
use crate::models::hooks::Subscription;
use crate::models::process::{
    Control, CreateProcessModel, CreateWorkItemType, Group, Page, PickList, ProcessInfo,
    ProcessRule, StateDefinition, UpdateProcessModel, UpdateStateDefinition,
    UpdateWorkItemType, WorkItemType, WorkItemTypeExpand, WorkItemTypeField,
};

/// Work-item-tracking process endpoints.
#[allow(clippy::too_many_arguments)]
pub trait ProcessClient: Send + Sync {
    fn create_process(&self, body: &CreateProcessModel) -> Result<ProcessInfo>;
    fn get_process(&self, process_id: Uuid) -> Result<ProcessInfo>;
    fn update_process(&self, process_id: Uuid, body: &UpdateProcessModel) -> Result<ProcessInfo>;
    fn delete_process(&self, process_id: Uuid) -> Result<()>;

    fn create_work_item_type(
        &self,
        process_id: Uuid,
        body: &CreateWorkItemType,
    ) -> Result<WorkItemType>;
    fn get_work_item_type(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        expand: WorkItemTypeExpand,
    ) -> Result<WorkItemType>;
    fn update_work_item_type(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        body: &UpdateWorkItemType,
    ) -> Result<WorkItemType>;
    fn delete_work_item_type(&self, process_id: Uuid, wit_ref: &str) -> Result<()>;

    fn add_field(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        body: &WorkItemTypeField,
    ) -> Result<WorkItemTypeField>;
    fn get_field(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        field_ref: &str,
    ) -> Result<WorkItemTypeField>;
    fn update_field(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        field_ref: &str,
        body: &WorkItemTypeField,
    ) -> Result<WorkItemTypeField>;
    fn remove_field(&self, process_id: Uuid, wit_ref: &str, field_ref: &str) -> Result<()>;

    fn create_state(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        body: &StateDefinition,
    ) -> Result<StateDefinition>;
    fn get_state(&self, process_id: Uuid, wit_ref: &str, state_id: &str)
    -> Result<StateDefinition>;
    fn list_states(&self, process_id: Uuid, wit_ref: &str) -> Result<Vec<StateDefinition>>;
    fn update_state(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        state_id: &str,
        body: &UpdateStateDefinition,
    ) -> Result<StateDefinition>;
    /// Hide or unhide an inherited state. Unhiding goes through the DELETE
    /// verb on the hidden record.
    fn hide_state(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        state_id: &str,
        hidden: bool,
    ) -> Result<StateDefinition>;
    fn delete_state(&self, process_id: Uuid, wit_ref: &str, state_id: &str) -> Result<()>;

    fn create_list(&self, body: &PickList) -> Result<PickList>;
    fn get_list(&self, list_id: Uuid) -> Result<PickList>;
    fn update_list(&self, list_id: Uuid, body: &PickList) -> Result<PickList>;
    fn delete_list(&self, list_id: Uuid) -> Result<()>;

    fn create_rule(&self, process_id: Uuid, wit_ref: &str, body: &ProcessRule)
    -> Result<ProcessRule>;
    fn get_rule(&self, process_id: Uuid, wit_ref: &str, rule_id: Uuid) -> Result<ProcessRule>;
    fn update_rule(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        rule_id: Uuid,
        body: &ProcessRule,
    ) -> Result<ProcessRule>;
    fn delete_rule(&self, process_id: Uuid, wit_ref: &str, rule_id: Uuid) -> Result<()>;

    fn add_page(&self, process_id: Uuid, wit_ref: &str, page: &Page) -> Result<Page>;
    fn update_page(&self, process_id: Uuid, wit_ref: &str, page: &Page) -> Result<Page>;
    fn remove_page(&self, process_id: Uuid, wit_ref: &str, page_id: &str) -> Result<()>;

    fn add_group(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        page_id: &str,
        section_id: &str,
        group: &Group,
    ) -> Result<Group>;
    fn update_group(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        page_id: &str,
        section_id: &str,
        group_id: &str,
        group: &Group,
    ) -> Result<Group>;
    fn move_group_to_page(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        page_id: &str,
        section_id: &str,
        group_id: &str,
        group: &Group,
        remove_from_page_id: &str,
        remove_from_section_id: &str,
    ) -> Result<Group>;
    fn move_group_to_section(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        page_id: &str,
        section_id: &str,
        group_id: &str,
        group: &Group,
        remove_from_section_id: &str,
    ) -> Result<Group>;
    fn remove_group(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        page_id: &str,
        section_id: &str,
        group_id: &str,
    ) -> Result<()>;

    fn add_control_to_group(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        group_id: &str,
        control: &Control,
    ) -> Result<Control>;
    fn update_control(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        group_id: &str,
        control_id: &str,
        control: &Control,
    ) -> Result<Control>;
    /// Move a control into `group_id`, detaching it from
    /// `remove_from_group_id` in the same call.
    fn move_control_to_group(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        group_id: &str,
        control_id: &str,
        control: &Control,
        remove_from_group_id: &str,
    ) -> Result<Control>;
    fn remove_control_from_group(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        group_id: &str,
        control_id: &str,
    ) -> Result<()>;

    /// Only system controls that have been edited away from their defaults
    /// are returned.
    fn get_system_controls(&self, process_id: Uuid, wit_ref: &str) -> Result<Vec<Control>>;
    fn update_system_control(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        control_id: &str,
        control: &Control,
    ) -> Result<Control>;
    /// Revert a system control to its default configuration.
    fn delete_system_control(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        control_id: &str,
    ) -> Result<Vec<Control>>;
}

/// Organization-level service-hook subscription endpoints.
pub trait ServiceHooksClient: Send + Sync {
    fn create_subscription(&self, body: &Subscription) -> Result<Subscription>;
    fn get_subscription(&self, id: Uuid) -> Result<Subscription>;
    /// Full replacement; the server has no patch verb for subscriptions.
    fn replace_subscription(&self, id: Uuid, body: &Subscription) -> Result<Subscription>;
    fn delete_subscription(&self, id: Uuid) -> Result<()>;
}

/// Project-scoped pipeline check configuration endpoints.
pub trait ChecksClient: Send + Sync {
    fn add_check(&self, project: &str, body: &CheckConfiguration) -> Result<CheckConfiguration>;
    /// Reads with settings expanded; the default projection omits them.
    fn get_check(&self, project: &str, id: i64) -> Result<CheckConfiguration>;
    fn update_check(
        &self,
        project: &str,
        id: i64,
        body: &CheckConfiguration,
    ) -> Result<CheckConfiguration>;
    fn delete_check(&self, project: &str, id: i64) -> Result<()>;
}
