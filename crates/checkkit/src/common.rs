//! Shared lifecycle plumbing for check resources.
//!
//! Every check configuration has the same outer shape; only the check type
//! and the settings document differ. Each kind implements [`CheckKind`] and
//! [`CheckHandler`] supplies the create/read/update/delete mechanics: the
//! identity is the numeric configuration id, the project comes from the
//! declared `project_id`, and a 404 on read clears the identity.

use std::sync::Arc;

use anyhow::{Context as _, Result, bail};
use azdoapi::ChecksClient;
use azdoapi::models::checks::{CheckConfiguration, CheckResource, DefinitionRef};
use declarative::{Lifecycle, OpContext, StateStore, split_import_id};
use log::debug;
use serde_json::{Value, json};

pub(crate) const DEFAULT_TIMEOUT_MINUTES: i64 = 1440;

/// One check kind: its registry name and its settings translation.
pub trait CheckKind: Send + Sync {
    fn type_name(&self) -> &'static str;
    /// Noun used in operation annotations, e.g. `"branch control check"`.
    fn noun(&self) -> &'static str;
    fn expand(&self, d: &StateStore) -> Result<CheckConfiguration>;
    fn flatten(&self, d: &mut StateStore, check: &CheckConfiguration) -> Result<()>;
}

pub struct CheckHandler<K> {
    client: Arc<dyn ChecksClient>,
    kind: K,
}

impl<K: CheckKind> CheckHandler<K> {
    pub fn new(client: Arc<dyn ChecksClient>, kind: K) -> Self {
        Self { client, kind }
    }

    fn check_id(d: &StateStore) -> Result<i64> {
        d.id().parse().with_context(|| format!("check id must be numeric, got {:?}", d.id()))
    }
}

impl<K: CheckKind> Lifecycle for CheckHandler<K> {
    fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    fn create(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let body = self.kind.expand(d)?;
        let created = self
            .client
            .add_check(&d.get_str("project_id"), &body)
            .map_err(|e| e.while_doing("creating check configuration"))?;
        match created.id {
            Some(id) => d.set_id(id.to_string()),
            None => bail!("server returned a {} without an id", self.kind.noun()),
        }
        self.read(ctx, d)
    }

    fn read(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let id = Self::check_id(d)?;
        let check = match self.client.get_check(&d.get_str("project_id"), id) {
            Ok(check) => check,
            Err(e) if e.is_not_found() => {
                debug!("{} {id} is gone", self.kind.noun());
                d.clear_id();
                return Ok(());
            }
            Err(e) => return Err(e.while_doing("reading check configuration").into()),
        };
        self.kind.flatten(d, &check)
    }

    fn update(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let id = Self::check_id(d)?;
        let mut body = self.kind.expand(d)?;
        body.id = Some(id);
        self.client
            .update_check(&d.get_str("project_id"), id, &body)
            .map_err(|e| e.while_doing("updating check configuration"))?;
        self.read(ctx, d)
    }

    fn delete(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()> {
        ctx.checkpoint()?;
        let id = Self::check_id(d)?;
        match self.client.delete_check(&d.get_str("project_id"), id) {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.while_doing("deleting check configuration").into()),
        }
    }

    fn import(&self, raw_id: &str, d: &mut StateStore) -> Result<()> {
        let parts = split_import_id(raw_id, "project_id/check_id")?;
        d.set_planned("project_id", parts[0]);
        d.set_id(parts[1]);
        Ok(())
    }
}

/// The protected resource a check is declared against.
pub(crate) fn target_resource(d: &StateStore) -> CheckResource {
    CheckResource {
        resource_type: d.get_str("target_resource_type"),
        id: d.get_str("target_resource_id"),
        name: None,
    }
}

pub(crate) fn declared_timeout(d: &StateStore) -> i64 {
    d.get_i64("timeout").unwrap_or(DEFAULT_TIMEOUT_MINUTES)
}

/// Settings document for a task-backed check.
pub(crate) fn task_settings(d: &StateStore, definition: &DefinitionRef, inputs: Value) -> Value {
    json!({
        "definitionRef": definition,
        "displayName": d.get_str("display_name"),
        "inputs": inputs,
    })
}

/// Writes the attributes every check shares back to state.
pub(crate) fn flatten_base(d: &mut StateStore, check: &CheckConfiguration) {
    d.set("target_resource_id", check.resource.id.clone());
    d.set("target_resource_type", check.resource.resource_type.clone());
    d.set("timeout", check.timeout.unwrap_or(DEFAULT_TIMEOUT_MINUTES));
}

pub(crate) fn settings_of(check: &CheckConfiguration) -> Result<&serde_json::Map<String, Value>> {
    match &check.settings {
        Some(Value::Object(map)) => Ok(map),
        _ => bail!("check configuration has no settings document"),
    }
}

/// Rejects a settings document whose task reference is not the expected one.
/// GUID comparison is case-insensitive; the version must match exactly.
pub(crate) fn verify_definition_ref(
    settings: &serde_json::Map<String, Value>,
    expected: &DefinitionRef,
) -> Result<()> {
    let Some(reference) = settings.get("definitionRef") else {
        bail!("check settings carry no definitionRef");
    };
    let id = reference.get("id").and_then(Value::as_str).unwrap_or_default();
    if !id.eq_ignore_ascii_case(&expected.id.to_string()) {
        bail!("unexpected task reference {id:?}, this resource manages {}", expected.name);
    }
    let version = reference.get("version").and_then(Value::as_str).unwrap_or_default();
    if version != expected.version {
        bail!("unsupported task reference version {version:?}, expected {}", expected.version);
    }
    Ok(())
}

pub(crate) fn flatten_display_name(
    d: &mut StateStore,
    settings: &serde_json::Map<String, Value>,
) {
    if let Some(name) = settings.get("displayName").and_then(Value::as_str) {
        d.set("display_name", name);
    }
}

pub(crate) fn inputs_of(settings: &serde_json::Map<String, Value>) -> serde_json::Map<String, Value> {
    match settings.get("inputs") {
        Some(Value::Object(map)) => map.clone(),
        _ => serde_json::Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use azdoapi::models::checks::CHECK_TYPE_TASK;
    use declarative::Attrs;
    use serde_json::json;
    use uuid::Uuid;

    fn sample_definition() -> DefinitionRef {
        DefinitionRef {
            id: Uuid::parse_str("86b05a0c-73e6-4f7d-b3cf-e38f3b39a75b").unwrap(),
            name: "evaluatebranchProtection".to_string(),
            version: "0.0.1".to_string(),
        }
    }

    #[test]
    fn definition_ref_id_comparison_is_case_insensitive() {
        let settings = json!({
            "definitionRef": {"id": "86B05A0C-73E6-4F7D-B3CF-E38F3B39A75B", "version": "0.0.1"}
        });
        let Value::Object(map) = settings else { unreachable!() };
        verify_definition_ref(&map, &sample_definition()).unwrap();
    }

    #[test]
    fn definition_ref_version_mismatch_is_rejected() {
        let settings = json!({
            "definitionRef": {"id": "86b05a0c-73e6-4f7d-b3cf-e38f3b39a75b", "version": "0.0.2"}
        });
        let Value::Object(map) = settings else { unreachable!() };
        assert!(verify_definition_ref(&map, &sample_definition()).is_err());
    }

    #[test]
    fn import_splits_project_and_check_id() {
        struct NullKind;
        impl CheckKind for NullKind {
            fn type_name(&self) -> &'static str {
                "azdo_check_null"
            }
            fn noun(&self) -> &'static str {
                "null check"
            }
            fn expand(&self, _d: &StateStore) -> Result<CheckConfiguration> {
                bail!("not used")
            }
            fn flatten(&self, _d: &mut StateStore, _check: &CheckConfiguration) -> Result<()> {
                Ok(())
            }
        }

        let handler = CheckHandler::new(Arc::new(azdoapi::mock::MockAzdo::new()), NullKind);
        let mut d = StateStore::default();
        handler.import("myproject/42", &mut d).unwrap();
        assert_eq!(d.get_str("project_id"), "myproject");
        assert_eq!(d.id(), "42");
        assert!(handler.import("42", &mut StateStore::default()).is_err());
    }

    #[test]
    fn timeout_defaults_to_a_day() {
        let d = StateStore::new(Attrs::new(), Attrs::new());
        assert_eq!(declared_timeout(&d), 1440);
        let check = CheckConfiguration {
            id: Some(1),
            check_type: azdoapi::models::checks::CheckType { id: CHECK_TYPE_TASK, name: None },
            resource: CheckResource {
                resource_type: "endpoint".to_string(),
                id: "e".to_string(),
                name: None,
            },
            settings: None,
            timeout: None,
            version: None,
        };
        let mut d = StateStore::new(Attrs::new(), Attrs::new());
        flatten_base(&mut d, &check);
        assert_eq!(d.get("timeout"), json!(1440));
    }
}
