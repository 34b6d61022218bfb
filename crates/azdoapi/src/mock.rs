//! In-memory fake of the Azure DevOps surface for handler tests.
//!
//! [`MockAzdo`] implements all three client traits against maps guarded by
//! one mutex. Every call appends a line to a call log so tests can assert
//! ordering (for example that a control move lands before its property
//! patch). Transient failures are injected per operation name with
//! [`MockAzdo::fail_transient`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use uuid::Uuid;

use crate::client::{ChecksClient, ProcessClient, ServiceHooksClient};
use crate::error::{Error, Result};
use crate::models::checks::CheckConfiguration;
use crate::models::hooks::Subscription;
use crate::models::process::{
    Control, CreateProcessModel, CreateWorkItemType, CustomizationType, FormLayout, Group, Page,
    PickList, ProcessInfo, ProcessRule, Section, StateDefinition, UpdateProcessModel,
    UpdateStateDefinition, UpdateWorkItemType, WorkItemType, WorkItemTypeExpand,
    WorkItemTypeField,
};

/// Value the server substitutes for redacted consumer inputs.
pub const REDACTED: &str = "********";

#[derive(Default)]
struct MockState {
    calls: Vec<String>,
    failures: BTreeMap<String, (usize, FailureKind)>,
    processes: BTreeMap<Uuid, ProcessInfo>,
    wits: BTreeMap<(Uuid, String), WorkItemType>,
    fields: BTreeMap<(Uuid, String, String), WorkItemTypeField>,
    states: BTreeMap<(Uuid, String), Vec<StateDefinition>>,
    lists: BTreeMap<Uuid, PickList>,
    rules: BTreeMap<(Uuid, String, Uuid), ProcessRule>,
    system_controls: BTreeMap<(Uuid, String), Vec<Control>>,
    subscriptions: BTreeMap<Uuid, Subscription>,
    checks: BTreeMap<i64, CheckConfiguration>,
    next_check_id: i64,
}

#[derive(Clone, Copy)]
pub enum FailureKind {
    NotFound,
    UnexpectedException,
    ContributionMissing,
}

impl FailureKind {
    fn to_error(self) -> Error {
        match self {
            Self::NotFound => Error::NotFound {
                message: "injected: does not exist".to_string(),
            },
            Self::UnexpectedException => Error::Api {
                status: 500,
                type_key: Some("UnexpectedException".to_string()),
                message: "TF401349: An unexpected error has occurred".to_string(),
            },
            Self::ContributionMissing => Error::Api {
                status: 400,
                type_key: None,
                message: "VS403120: The contribution could not be found".to_string(),
            },
        }
    }
}

pub struct MockAzdo {
    inner: Mutex<MockState>,
    redacted_consumer_inputs: BTreeSet<String>,
}

impl Default for MockAzdo {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAzdo {
    pub fn new() -> Self {
        let redacted = ["accountKey", "basicAuthPassword", "password", "connectionString"]
            .into_iter()
            .map(str::to_string)
            .collect();
        Self {
            inner: Mutex::new(MockState {
                next_check_id: 1,
                ..MockState::default()
            }),
            redacted_consumer_inputs: redacted,
        }
    }

    /// Everything called so far, one line per call, in order.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Make the next `count` invocations of `op` fail with `kind`.
    pub fn fail_transient(&self, op: &str, count: usize, kind: FailureKind) {
        self.lock().failures.insert(op.to_string(), (count, kind));
    }

    pub fn seed_process(&self, process: ProcessInfo) {
        self.lock().processes.insert(process.type_id, process);
    }

    pub fn seed_work_item_type(&self, process_id: Uuid, wit: WorkItemType) {
        self.lock()
            .wits
            .insert((process_id, wit.reference_name.clone()), wit);
    }

    pub fn seed_states(&self, process_id: Uuid, wit_ref: &str, states: Vec<StateDefinition>) {
        self.lock()
            .states
            .insert((process_id, wit_ref.to_string()), states);
    }

    pub fn seed_field(&self, process_id: Uuid, wit_ref: &str, field: WorkItemTypeField) {
        self.lock().fields.insert(
            (process_id, wit_ref.to_string(), field.reference_name.clone()),
            field,
        );
    }

    /// A work-item type with one page (`page-1`, one section) holding one
    /// group (`group-1`), the shape most layout tests start from.
    pub fn seed_basic_layout(&self, process_id: Uuid, wit_ref: &str) {
        let wit = WorkItemType {
            reference_name: wit_ref.to_string(),
            name: wit_ref.to_string(),
            description: None,
            color: Some("009CCC".to_string()),
            icon: Some("icon_clipboard".to_string()),
            is_disabled: false,
            inherits: None,
            customization: Some(CustomizationType::Custom),
            layout: Some(FormLayout {
                pages: vec![Page {
                    id: Some("page-1".to_string()),
                    label: Some("Details".to_string()),
                    page_type: Some("custom".to_string()),
                    order: Some(0),
                    visible: Some(true),
                    locked: Some(false),
                    inherited: None,
                    overridden: None,
                    sections: vec![Section {
                        id: "Section1".to_string(),
                        overridden: None,
                        groups: vec![Group {
                            id: Some("group-1".to_string()),
                            label: Some("Planning".to_string()),
                            order: Some(0),
                            visible: Some(true),
                            inherited: None,
                            overridden: None,
                            controls: Vec::new(),
                        }],
                    }],
                }],
                system_controls: Vec::new(),
            }),
            states: None,
        };
        self.seed_work_item_type(process_id, wit);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn enter(&self, call: &str) -> Result<std::sync::MutexGuard<'_, MockState>> {
        let mut state = self.lock();
        state.calls.push(call.to_string());
        let op = call.split_whitespace().next().unwrap_or(call).to_string();
        if let Some((remaining, kind)) = state.failures.get_mut(&op) {
            if *remaining > 0 {
                *remaining -= 1;
                let kind = *kind;
                return Err(kind.to_error());
            }
        }
        Ok(state)
    }
}

fn not_found(what: impl std::fmt::Display) -> Error {
    Error::NotFound {
        message: format!("{what} does not exist"),
    }
}

fn find_group_mut<'a>(layout: &'a mut FormLayout, group_id: &str) -> Option<&'a mut Group> {
    layout
        .pages
        .iter_mut()
        .flat_map(|p| p.sections.iter_mut())
        .flat_map(|s| s.groups.iter_mut())
        .find(|g| g.id.as_deref() == Some(group_id))
}

impl MockState {
    fn wit_mut(&mut self, process_id: Uuid, wit_ref: &str) -> Result<&mut WorkItemType> {
        self.wits
            .get_mut(&(process_id, wit_ref.to_string()))
            .ok_or_else(|| not_found(format!("work item type {wit_ref}")))
    }

    fn layout_mut(&mut self, process_id: Uuid, wit_ref: &str) -> Result<&mut FormLayout> {
        let wit = self.wit_mut(process_id, wit_ref)?;
        Ok(wit.layout.get_or_insert_with(FormLayout::default))
    }
}

impl ProcessClient for MockAzdo {
    fn create_process(&self, body: &CreateProcessModel) -> Result<ProcessInfo> {
        let mut state = self.enter(&format!("create_process {}", body.name))?;
        // The server ignores enablement flags at creation time.
        let info = ProcessInfo {
            type_id: Uuid::new_v4(),
            name: body.name.clone(),
            description: body.description.clone(),
            reference_name: body.reference_name.clone(),
            parent_process_type_id: body.parent_process_type_id,
            is_default: false,
            is_enabled: true,
            customization_type: Some(CustomizationType::Inherited),
        };
        state.processes.insert(info.type_id, info.clone());
        Ok(info)
    }

    fn get_process(&self, process_id: Uuid) -> Result<ProcessInfo> {
        let state = self.enter(&format!("get_process {process_id}"))?;
        state
            .processes
            .get(&process_id)
            .cloned()
            .ok_or_else(|| not_found(format!("process {process_id}")))
    }

    fn update_process(&self, process_id: Uuid, body: &UpdateProcessModel) -> Result<ProcessInfo> {
        let mut state = self.enter(&format!("update_process {process_id}"))?;
        let info = state
            .processes
            .get_mut(&process_id)
            .ok_or_else(|| not_found(format!("process {process_id}")))?;
        if let Some(name) = &body.name {
            info.name.clone_from(name);
        }
        if body.description.is_some() {
            info.description.clone_from(&body.description);
        }
        if let Some(is_default) = body.is_default {
            info.is_default = is_default;
        }
        if let Some(is_enabled) = body.is_enabled {
            info.is_enabled = is_enabled;
        }
        Ok(info.clone())
    }

    fn delete_process(&self, process_id: Uuid) -> Result<()> {
        let mut state = self.enter(&format!("delete_process {process_id}"))?;
        state
            .processes
            .remove(&process_id)
            .map(|_| ())
            .ok_or_else(|| not_found(format!("process {process_id}")))
    }

    fn create_work_item_type(
        &self,
        process_id: Uuid,
        body: &CreateWorkItemType,
    ) -> Result<WorkItemType> {
        let mut state = self.enter(&format!("create_work_item_type {}", body.name))?;
        let reference_name = match &body.inherits_from {
            Some(parent) => parent.clone(),
            None => format!("Custom.{}", body.name.replace(' ', "")),
        };
        let wit = WorkItemType {
            reference_name: reference_name.clone(),
            name: body.name.clone(),
            description: body.description.clone(),
            color: body.color.clone(),
            icon: body.icon.clone(),
            is_disabled: body.is_disabled,
            inherits: body.inherits_from.clone(),
            customization: Some(if body.inherits_from.is_some() {
                CustomizationType::Inherited
            } else {
                CustomizationType::Custom
            }),
            layout: Some(FormLayout::default()),
            states: None,
        };
        state
            .wits
            .insert((process_id, reference_name), wit.clone());
        Ok(wit)
    }

    fn get_work_item_type(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        expand: WorkItemTypeExpand,
    ) -> Result<WorkItemType> {
        let state = self.enter(&format!("get_work_item_type {wit_ref} {}", expand.as_str()))?;
        let mut wit = state
            .wits
            .get(&(process_id, wit_ref.to_string()))
            .cloned()
            .ok_or_else(|| not_found(format!("work item type {wit_ref}")))?;
        match expand {
            WorkItemTypeExpand::None => {
                wit.layout = None;
                wit.states = None;
            }
            WorkItemTypeExpand::States => {
                wit.layout = None;
                wit.states = state
                    .states
                    .get(&(process_id, wit_ref.to_string()))
                    .cloned();
            }
            WorkItemTypeExpand::Layout => wit.states = None,
        }
        Ok(wit)
    }

    fn update_work_item_type(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        body: &UpdateWorkItemType,
    ) -> Result<WorkItemType> {
        let mut state = self.enter(&format!("update_work_item_type {wit_ref}"))?;
        let wit = state.wit_mut(process_id, wit_ref)?;
        if body.description.is_some() {
            wit.description.clone_from(&body.description);
        }
        if body.color.is_some() {
            wit.color.clone_from(&body.color);
        }
        if body.icon.is_some() {
            wit.icon.clone_from(&body.icon);
        }
        if let Some(is_disabled) = body.is_disabled {
            wit.is_disabled = is_disabled;
        }
        Ok(wit.clone())
    }

    fn delete_work_item_type(&self, process_id: Uuid, wit_ref: &str) -> Result<()> {
        let mut state = self.enter(&format!("delete_work_item_type {wit_ref}"))?;
        state
            .wits
            .remove(&(process_id, wit_ref.to_string()))
            .map(|_| ())
            .ok_or_else(|| not_found(format!("work item type {wit_ref}")))
    }

    fn add_field(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        body: &WorkItemTypeField,
    ) -> Result<WorkItemTypeField> {
        let mut state = self.enter(&format!("add_field {} {wit_ref}", body.reference_name))?;
        let field = body.clone();
        state.fields.insert(
            (process_id, wit_ref.to_string(), field.reference_name.clone()),
            field.clone(),
        );
        Ok(field)
    }

    fn get_field(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        field_ref: &str,
    ) -> Result<WorkItemTypeField> {
        let state = self.enter(&format!("get_field {field_ref} {wit_ref}"))?;
        state
            .fields
            .get(&(process_id, wit_ref.to_string(), field_ref.to_string()))
            .cloned()
            .ok_or_else(|| not_found(format!("field {field_ref}")))
    }

    fn update_field(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        field_ref: &str,
        body: &WorkItemTypeField,
    ) -> Result<WorkItemTypeField> {
        let mut state = self.enter(&format!("update_field {field_ref} {wit_ref}"))?;
        let key = (process_id, wit_ref.to_string(), field_ref.to_string());
        if !state.fields.contains_key(&key) {
            return Err(not_found(format!("field {field_ref}")));
        }
        state.fields.insert(key, body.clone());
        Ok(body.clone())
    }

    fn remove_field(&self, process_id: Uuid, wit_ref: &str, field_ref: &str) -> Result<()> {
        let mut state = self.enter(&format!("remove_field {field_ref} {wit_ref}"))?;
        state
            .fields
            .remove(&(process_id, wit_ref.to_string(), field_ref.to_string()))
            .map(|_| ())
            .ok_or_else(|| not_found(format!("field {field_ref}")))
    }

    fn create_state(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        body: &StateDefinition,
    ) -> Result<StateDefinition> {
        let mut state = self.enter(&format!("create_state {} {wit_ref}", body.name))?;
        let mut def = body.clone();
        def.id = Some(Uuid::new_v4().to_string());
        def.customization_type = Some(CustomizationType::Custom);
        state
            .states
            .entry((process_id, wit_ref.to_string()))
            .or_default()
            .push(def.clone());
        Ok(def)
    }

    fn get_state(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        state_id: &str,
    ) -> Result<StateDefinition> {
        let state = self.enter(&format!("get_state {state_id} {wit_ref}"))?;
        state
            .states
            .get(&(process_id, wit_ref.to_string()))
            .and_then(|defs| defs.iter().find(|d| d.id.as_deref() == Some(state_id)))
            .cloned()
            .ok_or_else(|| not_found(format!("state {state_id}")))
    }

    fn list_states(&self, process_id: Uuid, wit_ref: &str) -> Result<Vec<StateDefinition>> {
        let state = self.enter(&format!("list_states {wit_ref}"))?;
        Ok(state
            .states
            .get(&(process_id, wit_ref.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    fn update_state(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        state_id: &str,
        body: &UpdateStateDefinition,
    ) -> Result<StateDefinition> {
        let mut state = self.enter(&format!("update_state {state_id} {wit_ref}"))?;
        let def = state
            .states
            .get_mut(&(process_id, wit_ref.to_string()))
            .and_then(|defs| defs.iter_mut().find(|d| d.id.as_deref() == Some(state_id)))
            .ok_or_else(|| not_found(format!("state {state_id}")))?;
        if let Some(name) = &body.name {
            def.name.clone_from(name);
        }
        if body.color.is_some() {
            def.color.clone_from(&body.color);
        }
        if body.order.is_some() {
            def.order = body.order;
        }
        Ok(def.clone())
    }

    fn hide_state(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        state_id: &str,
        hidden: bool,
    ) -> Result<StateDefinition> {
        let mut state = self.enter(&format!("hide_state {state_id} hidden={hidden}"))?;
        let def = state
            .states
            .get_mut(&(process_id, wit_ref.to_string()))
            .and_then(|defs| defs.iter_mut().find(|d| d.id.as_deref() == Some(state_id)))
            .ok_or_else(|| not_found(format!("state {state_id}")))?;
        def.hidden = Some(hidden);
        Ok(def.clone())
    }

    fn delete_state(&self, process_id: Uuid, wit_ref: &str, state_id: &str) -> Result<()> {
        let mut state = self.enter(&format!("delete_state {state_id} {wit_ref}"))?;
        let defs = state
            .states
            .get_mut(&(process_id, wit_ref.to_string()))
            .ok_or_else(|| not_found(format!("state {state_id}")))?;
        let before = defs.len();
        defs.retain(|d| d.id.as_deref() != Some(state_id));
        if defs.len() == before {
            return Err(not_found(format!("state {state_id}")));
        }
        Ok(())
    }

    fn create_list(&self, body: &PickList) -> Result<PickList> {
        let mut state = self.enter(&format!("create_list {}", body.name))?;
        let mut list = body.clone();
        let id = Uuid::new_v4();
        list.id = Some(id);
        list.url = Some(format!(
            "https://dev.azure.com/mock/_apis/work/processes/lists/{id}"
        ));
        state.lists.insert(id, list.clone());
        Ok(list)
    }

    fn get_list(&self, list_id: Uuid) -> Result<PickList> {
        let state = self.enter(&format!("get_list {list_id}"))?;
        state
            .lists
            .get(&list_id)
            .cloned()
            .ok_or_else(|| not_found(format!("list {list_id}")))
    }

    fn update_list(&self, list_id: Uuid, body: &PickList) -> Result<PickList> {
        let mut state = self.enter(&format!("update_list {list_id}"))?;
        let Some(existing) = state.lists.get(&list_id) else {
            return Err(not_found(format!("list {list_id}")));
        };
        let mut list = body.clone();
        list.id = Some(list_id);
        list.url.clone_from(&existing.url);
        state.lists.insert(list_id, list.clone());
        Ok(list)
    }

    fn delete_list(&self, list_id: Uuid) -> Result<()> {
        let mut state = self.enter(&format!("delete_list {list_id}"))?;
        state
            .lists
            .remove(&list_id)
            .map(|_| ())
            .ok_or_else(|| not_found(format!("list {list_id}")))
    }

    fn create_rule(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        body: &ProcessRule,
    ) -> Result<ProcessRule> {
        let mut state = self.enter(&format!("create_rule {} {wit_ref}", body.name))?;
        let mut rule = body.clone();
        let id = Uuid::new_v4();
        rule.id = Some(id);
        rule.customization_type = Some(CustomizationType::Custom);
        state
            .rules
            .insert((process_id, wit_ref.to_string(), id), rule.clone());
        Ok(rule)
    }

    fn get_rule(&self, process_id: Uuid, wit_ref: &str, rule_id: Uuid) -> Result<ProcessRule> {
        let state = self.enter(&format!("get_rule {rule_id} {wit_ref}"))?;
        state
            .rules
            .get(&(process_id, wit_ref.to_string(), rule_id))
            .cloned()
            .ok_or_else(|| not_found(format!("rule {rule_id}")))
    }

    fn update_rule(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        rule_id: Uuid,
        body: &ProcessRule,
    ) -> Result<ProcessRule> {
        let mut state = self.enter(&format!("update_rule {rule_id} {wit_ref}"))?;
        let key = (process_id, wit_ref.to_string(), rule_id);
        if !state.rules.contains_key(&key) {
            return Err(not_found(format!("rule {rule_id}")));
        }
        let mut rule = body.clone();
        rule.id = Some(rule_id);
        state.rules.insert(key, rule.clone());
        Ok(rule)
    }

    fn delete_rule(&self, process_id: Uuid, wit_ref: &str, rule_id: Uuid) -> Result<()> {
        let mut state = self.enter(&format!("delete_rule {rule_id} {wit_ref}"))?;
        state
            .rules
            .remove(&(process_id, wit_ref.to_string(), rule_id))
            .map(|_| ())
            .ok_or_else(|| not_found(format!("rule {rule_id}")))
    }

    fn add_page(&self, process_id: Uuid, wit_ref: &str, page: &Page) -> Result<Page> {
        let mut state = self.enter(&format!(
            "add_page {} {wit_ref}",
            page.label.as_deref().unwrap_or("")
        ))?;
        let layout = state.layout_mut(process_id, wit_ref)?;
        let mut page = page.clone();
        page.id = Some(Uuid::new_v4().to_string());
        page.order = Some(i32::try_from(layout.pages.len()).unwrap_or(i32::MAX));
        if page.sections.is_empty() {
            page.sections = vec![
                Section {
                    id: "Section1".to_string(),
                    overridden: None,
                    groups: Vec::new(),
                },
                Section {
                    id: "Section2".to_string(),
                    overridden: None,
                    groups: Vec::new(),
                },
            ];
        }
        layout.pages.push(page.clone());
        Ok(page)
    }

    fn update_page(&self, process_id: Uuid, wit_ref: &str, page: &Page) -> Result<Page> {
        let page_id = page.id.clone().unwrap_or_default();
        let mut state = self.enter(&format!("update_page {page_id} {wit_ref}"))?;
        let layout = state.layout_mut(process_id, wit_ref)?;
        let existing = layout
            .pages
            .iter_mut()
            .find(|p| p.id == page.id)
            .ok_or_else(|| not_found(format!("page {page_id}")))?;
        if page.label.is_some() {
            existing.label.clone_from(&page.label);
        }
        if page.visible.is_some() {
            existing.visible = page.visible;
        }
        Ok(existing.clone())
    }

    fn remove_page(&self, process_id: Uuid, wit_ref: &str, page_id: &str) -> Result<()> {
        let mut state = self.enter(&format!("remove_page {page_id} {wit_ref}"))?;
        let layout = state.layout_mut(process_id, wit_ref)?;
        let before = layout.pages.len();
        layout.pages.retain(|p| p.id.as_deref() != Some(page_id));
        if layout.pages.len() == before {
            return Err(not_found(format!("page {page_id}")));
        }
        Ok(())
    }

    fn add_group(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        page_id: &str,
        section_id: &str,
        group: &Group,
    ) -> Result<Group> {
        let mut state = self.enter(&format!(
            "add_group {} {page_id}/{section_id}",
            group.label.as_deref().unwrap_or("")
        ))?;
        let layout = state.layout_mut(process_id, wit_ref)?;
        let section = layout
            .pages
            .iter_mut()
            .find(|p| p.id.as_deref() == Some(page_id))
            .ok_or_else(|| not_found(format!("page {page_id}")))?
            .sections
            .iter_mut()
            .find(|s| s.id == section_id)
            .ok_or_else(|| not_found(format!("section {section_id}")))?;
        let mut group = group.clone();
        group.id = Some(Uuid::new_v4().to_string());
        group.order = Some(i32::try_from(section.groups.len()).unwrap_or(i32::MAX));
        section.groups.push(group.clone());
        Ok(group)
    }

    fn update_group(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        page_id: &str,
        section_id: &str,
        group_id: &str,
        group: &Group,
    ) -> Result<Group> {
        let mut state =
            self.enter(&format!("update_group {group_id} {page_id}/{section_id}"))?;
        let layout = state.layout_mut(process_id, wit_ref)?;
        let existing = find_group_mut(layout, group_id)
            .ok_or_else(|| not_found(format!("group {group_id}")))?;
        if group.label.is_some() {
            existing.label.clone_from(&group.label);
        }
        if group.visible.is_some() {
            existing.visible = group.visible;
        }
        Ok(existing.clone())
    }

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
    ) -> Result<Group> {
        let mut state = self.enter(&format!(
            "move_group_to_page {group_id} to={page_id}/{section_id} from={remove_from_page_id}/{remove_from_section_id}"
        ))?;
        let layout = state.layout_mut(process_id, wit_ref)?;
        let mut detached = None;
        for page in &mut layout.pages {
            if page.id.as_deref() != Some(remove_from_page_id) {
                continue;
            }
            for section in &mut page.sections {
                if section.id != remove_from_section_id {
                    continue;
                }
                if let Some(pos) = section
                    .groups
                    .iter()
                    .position(|g| g.id.as_deref() == Some(group_id))
                {
                    detached = Some(section.groups.remove(pos));
                }
            }
        }
        let mut moved = detached.ok_or_else(|| not_found(format!("group {group_id}")))?;
        if group.label.is_some() {
            moved.label.clone_from(&group.label);
        }
        let section = layout
            .pages
            .iter_mut()
            .find(|p| p.id.as_deref() == Some(page_id))
            .ok_or_else(|| not_found(format!("page {page_id}")))?
            .sections
            .iter_mut()
            .find(|s| s.id == section_id)
            .ok_or_else(|| not_found(format!("section {section_id}")))?;
        section.groups.push(moved.clone());
        Ok(moved)
    }

    fn move_group_to_section(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        page_id: &str,
        section_id: &str,
        group_id: &str,
        group: &Group,
        remove_from_section_id: &str,
    ) -> Result<Group> {
        self.move_group_to_page(
            process_id,
            wit_ref,
            page_id,
            section_id,
            group_id,
            group,
            page_id,
            remove_from_section_id,
        )
    }

    fn remove_group(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        _page_id: &str,
        _section_id: &str,
        group_id: &str,
    ) -> Result<()> {
        let mut state = self.enter(&format!("remove_group {group_id}"))?;
        let layout = state.layout_mut(process_id, wit_ref)?;
        for page in &mut layout.pages {
            for section in &mut page.sections {
                let before = section.groups.len();
                section.groups.retain(|g| g.id.as_deref() != Some(group_id));
                if section.groups.len() != before {
                    return Ok(());
                }
            }
        }
        Err(not_found(format!("group {group_id}")))
    }

    fn add_control_to_group(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        group_id: &str,
        control: &Control,
    ) -> Result<Control> {
        let mut state = self.enter(&format!(
            "add_control {} {group_id}",
            control.id.as_deref().unwrap_or("")
        ))?;
        let layout = state.layout_mut(process_id, wit_ref)?;
        let group = find_group_mut(layout, group_id)
            .ok_or_else(|| not_found(format!("group {group_id}")))?;
        let mut control = control.clone();
        if control.id.is_none() {
            control.id = Some(Uuid::new_v4().to_string());
        }
        control.order = Some(i32::try_from(group.controls.len()).unwrap_or(i32::MAX));
        group.controls.push(control.clone());
        Ok(control)
    }

    fn update_control(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        group_id: &str,
        control_id: &str,
        control: &Control,
    ) -> Result<Control> {
        let mut state = self.enter(&format!("update_control {control_id} {group_id}"))?;
        let layout = state.layout_mut(process_id, wit_ref)?;
        let group = find_group_mut(layout, group_id)
            .ok_or_else(|| not_found(format!("group {group_id}")))?;
        let existing = group
            .controls
            .iter_mut()
            .find(|c| c.id.as_deref() == Some(control_id))
            .ok_or_else(|| not_found(format!("control {control_id}")))?;
        if control.label.is_some() {
            existing.label.clone_from(&control.label);
        }
        if control.visible.is_some() {
            existing.visible = control.visible;
        }
        if control.read_only.is_some() {
            existing.read_only = control.read_only;
        }
        if control.metadata.is_some() {
            existing.metadata.clone_from(&control.metadata);
        }
        Ok(existing.clone())
    }

    fn move_control_to_group(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        group_id: &str,
        control_id: &str,
        control: &Control,
        remove_from_group_id: &str,
    ) -> Result<Control> {
        let mut state = self.enter(&format!(
            "move_control {control_id} to={group_id} from={remove_from_group_id}"
        ))?;
        let layout = state.layout_mut(process_id, wit_ref)?;
        let source = find_group_mut(layout, remove_from_group_id)
            .ok_or_else(|| not_found(format!("group {remove_from_group_id}")))?;
        let pos = source
            .controls
            .iter()
            .position(|c| c.id.as_deref() == Some(control_id))
            .ok_or_else(|| not_found(format!("control {control_id}")))?;
        let mut moved = source.controls.remove(pos);
        if control.label.is_some() {
            moved.label.clone_from(&control.label);
        }
        let target = find_group_mut(layout, group_id)
            .ok_or_else(|| not_found(format!("group {group_id}")))?;
        target.controls.push(moved.clone());
        Ok(moved)
    }

    fn remove_control_from_group(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        group_id: &str,
        control_id: &str,
    ) -> Result<()> {
        let mut state = self.enter(&format!("remove_control {control_id} {group_id}"))?;
        let layout = state.layout_mut(process_id, wit_ref)?;
        let group = find_group_mut(layout, group_id)
            .ok_or_else(|| not_found(format!("group {group_id}")))?;
        let before = group.controls.len();
        group.controls.retain(|c| c.id.as_deref() != Some(control_id));
        if group.controls.len() == before {
            return Err(not_found(format!("control {control_id}")));
        }
        Ok(())
    }

    fn get_system_controls(&self, process_id: Uuid, wit_ref: &str) -> Result<Vec<Control>> {
        let state = self.enter(&format!("get_system_controls {wit_ref}"))?;
        Ok(state
            .system_controls
            .get(&(process_id, wit_ref.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    fn update_system_control(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        control_id: &str,
        control: &Control,
    ) -> Result<Control> {
        let mut state = self.enter(&format!("update_system_control {control_id}"))?;
        let edited = state
            .system_controls
            .entry((process_id, wit_ref.to_string()))
            .or_default();
        let mut control = control.clone();
        control.id = Some(control_id.to_string());
        match edited.iter_mut().find(|c| c.id.as_deref() == Some(control_id)) {
            Some(existing) => *existing = control.clone(),
            None => edited.push(control.clone()),
        }
        Ok(control)
    }

    fn delete_system_control(
        &self,
        process_id: Uuid,
        wit_ref: &str,
        control_id: &str,
    ) -> Result<Vec<Control>> {
        let mut state = self.enter(&format!("delete_system_control {control_id}"))?;
        let edited = state
            .system_controls
            .entry((process_id, wit_ref.to_string()))
            .or_default();
        edited.retain(|c| c.id.as_deref() != Some(control_id));
        Ok(edited.clone())
    }
}

impl ServiceHooksClient for MockAzdo {
    fn create_subscription(&self, body: &Subscription) -> Result<Subscription> {
        let mut state = self.enter(&format!("create_subscription {}", body.event_type))?;
        let mut sub = body.clone();
        sub.id = Some(Uuid::new_v4());
        sub.status = Some("enabled".to_string());
        state.subscriptions.insert(sub.id.unwrap(), sub.clone());
        Ok(sub)
    }

    fn get_subscription(&self, id: Uuid) -> Result<Subscription> {
        let state = self.enter(&format!("get_subscription {id}"))?;
        let mut sub = state
            .subscriptions
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(format!("subscription {id}")))?;
        // The server redacts secrets in read responses.
        for (key, value) in &mut sub.consumer_inputs {
            if self.redacted_consumer_inputs.contains(key) {
                *value = REDACTED.to_string();
            }
        }
        Ok(sub)
    }

    fn replace_subscription(&self, id: Uuid, body: &Subscription) -> Result<Subscription> {
        let mut state = self.enter(&format!("replace_subscription {id}"))?;
        if !state.subscriptions.contains_key(&id) {
            return Err(not_found(format!("subscription {id}")));
        }
        let mut sub = body.clone();
        sub.id = Some(id);
        state.subscriptions.insert(id, sub.clone());
        Ok(sub)
    }

    fn delete_subscription(&self, id: Uuid) -> Result<()> {
        let mut state = self.enter(&format!("delete_subscription {id}"))?;
        state
            .subscriptions
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found(format!("subscription {id}")))
    }
}

impl ChecksClient for MockAzdo {
    fn add_check(&self, project: &str, body: &CheckConfiguration) -> Result<CheckConfiguration> {
        let mut state = self.enter(&format!("add_check {project}"))?;
        let mut check = body.clone();
        let id = state.next_check_id;
        state.next_check_id += 1;
        check.id = Some(id);
        check.version = Some(1);
        state.checks.insert(id, check.clone());
        Ok(check)
    }

    fn get_check(&self, project: &str, id: i64) -> Result<CheckConfiguration> {
        let state = self.enter(&format!("get_check {project} {id}"))?;
        state
            .checks
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(format!("check {id}")))
    }

    fn update_check(
        &self,
        project: &str,
        id: i64,
        body: &CheckConfiguration,
    ) -> Result<CheckConfiguration> {
        let mut state = self.enter(&format!("update_check {project} {id}"))?;
        let existing = state
            .checks
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(format!("check {id}")))?;
        let mut check = body.clone();
        check.id = Some(id);
        check.version = Some(existing.version.unwrap_or(1) + 1);
        state.checks.insert(id, check.clone());
        Ok(check)
    }

    fn delete_check(&self, project: &str, id: i64) -> Result<()> {
        let mut state = self.enter(&format!("delete_check {project} {id}"))?;
        state
            .checks
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found(format!("check {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injected_failures_burn_down() {
        let mock = MockAzdo::new();
        mock.fail_transient("get_process", 1, FailureKind::UnexpectedException);
        let id = Uuid::new_v4();
        assert!(mock.get_process(id).unwrap_err().is_unexpected_exception());
        // Second call reaches the store and reports plain not-found.
        assert!(mock.get_process(id).unwrap_err().is_not_found());
    }

    #[test]
    fn call_log_preserves_order() {
        let mock = MockAzdo::new();
        let pid = Uuid::new_v4();
        mock.seed_basic_layout(pid, "Custom.Task");
        let control = Control {
            id: Some("ctrl-1".to_string()),
            ..Control::default()
        };
        mock.add_control_to_group(pid, "Custom.Task", "group-1", &control)
            .unwrap();
        mock.update_control(pid, "Custom.Task", "group-1", "ctrl-1", &control)
            .unwrap();
        let calls = mock.calls();
        assert_eq!(calls[0], "add_control ctrl-1 group-1");
        assert_eq!(calls[1], "update_control ctrl-1 group-1");
    }

    #[test]
    fn secrets_are_redacted_on_read() {
        let mock = MockAzdo::new();
        let mut sub = Subscription {
            publisher_id: "tfs".to_string(),
            event_type: "git.push".to_string(),
            consumer_id: "azureStorageQueue".to_string(),
            consumer_action_id: "enqueue".to_string(),
            ..Subscription::default()
        };
        sub.consumer_inputs
            .insert("accountKey".to_string(), "hunter2".to_string());
        sub.consumer_inputs
            .insert("queueName".to_string(), "events".to_string());
        let created = mock.create_subscription(&sub).unwrap();
        let read = mock.get_subscription(created.id.unwrap()).unwrap();
        assert_eq!(read.consumer_inputs["accountKey"], REDACTED);
        assert_eq!(read.consumer_inputs["queueName"], "events");
    }
}
