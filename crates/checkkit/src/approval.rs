//! Manual approval check. Not task-backed: the settings document carries the
//! approver list directly and there is no definition reference.

use anyhow::Result;
use azdoapi::models::checks::{CHECK_TYPE_APPROVAL, CheckConfiguration, CheckType};
use declarative::StateStore;
use serde_json::{Value, json};

use crate::common::{self, CheckKind, flatten_base, settings_of};

pub struct ApprovalKind;

impl CheckKind for ApprovalKind {
    fn type_name(&self) -> &'static str {
        "azdo_check_approval"
    }

    fn noun(&self) -> &'static str {
        "approval check"
    }

    fn expand(&self, d: &StateStore) -> Result<CheckConfiguration> {
        let approvers: Vec<Value> = match d.get("approvers") {
            Value::Array(ids) => ids
                .iter()
                .filter_map(Value::as_str)
                .map(|id| json!({ "id": id }))
                .collect(),
            _ => Vec::new(),
        };
        let settings = json!({
            "instructions": d.get_str("instructions"),
            "minRequiredApprovers": d.get_i64("min_required_approvers").unwrap_or(0),
            "requesterCannotBeApprover": d.get_bool("requester_cannot_be_approver"),
            "approvers": approvers,
        });
        Ok(CheckConfiguration {
            id: None,
            check_type: CheckType { id: CHECK_TYPE_APPROVAL, name: Some("Approval".to_string()) },
            resource: common::target_resource(d),
            settings: Some(settings),
            timeout: Some(common::declared_timeout(d)),
            version: None,
        })
    }

    fn flatten(&self, d: &mut StateStore, check: &CheckConfiguration) -> Result<()> {
        flatten_base(d, check);
        let settings = settings_of(check)?;
        if let Some(instructions) = settings.get("instructions").and_then(Value::as_str) {
            d.set("instructions", instructions);
        }
        if let Some(min) = settings.get("minRequiredApprovers").and_then(Value::as_i64) {
            d.set("min_required_approvers", min);
        }
        if let Some(flag) = settings.get("requesterCannotBeApprover").and_then(Value::as_bool) {
            d.set("requester_cannot_be_approver", flag);
        }
        if let Some(Value::Array(approvers)) = settings.get("approvers") {
            let ids: Vec<Value> = approvers
                .iter()
                .filter_map(|a| a.get("id").and_then(Value::as_str))
                .map(Value::from)
                .collect();
            d.set("approvers", Value::Array(ids));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::CheckHandler;
    use azdoapi::mock::MockAzdo;
    use declarative::{Attrs, Lifecycle, OpContext, StateStore};
    use std::sync::Arc;

    fn attrs() -> Attrs {
        [
            ("project_id".to_string(), json!("p")),
            ("target_resource_id".to_string(), json!("env-1")),
            ("target_resource_type".to_string(), json!("environment")),
            ("instructions".to_string(), json!("check the release notes")),
            ("min_required_approvers".to_string(), json!(2)),
            ("requester_cannot_be_approver".to_string(), json!(true)),
            ("approvers".to_string(), json!(["user-a", "group-b"])),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn approver_ids_wrap_into_identity_objects() {
        let d = StateStore::new(attrs(), Attrs::new());
        let check = ApprovalKind.expand(&d).unwrap();
        assert_eq!(check.check_type.id.to_string(), "8c6f20a7-47c4-4d52-b556-76f4087a9f03");
        let settings = check.settings.unwrap();
        assert_eq!(settings["approvers"], json!([{"id": "user-a"}, {"id": "group-b"}]));
        assert_eq!(settings["minRequiredApprovers"], json!(2));
        assert_eq!(settings["requesterCannotBeApprover"], json!(true));
    }

    #[test]
    fn create_then_read_restores_the_flat_id_list() {
        let mock = Arc::new(MockAzdo::new());
        let res = CheckHandler::new(mock, ApprovalKind);

        let mut d = StateStore::new(attrs(), Attrs::new());
        res.create(&OpContext::new(), &mut d).unwrap();
        assert_eq!(d.get("approvers"), json!(["user-a", "group-b"]));
        assert_eq!(d.get("instructions"), json!("check the release notes"));
    }
}
