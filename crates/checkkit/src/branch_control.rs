//! Branch-control check: gates a protected resource on the branch a run
//! comes from. Task-backed; the booleans travel as strings in the inputs map.

use std::sync::LazyLock;

use anyhow::Result;
use azdoapi::models::checks::{CHECK_TYPE_TASK, CheckConfiguration, CheckType, DefinitionRef};
use declarative::StateStore;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::common::{
    self, CheckKind, flatten_base, flatten_display_name, inputs_of, settings_of, task_settings,
    verify_definition_ref,
};

static EVALUATE_BRANCH_PROTECTION: LazyLock<DefinitionRef> = LazyLock::new(|| DefinitionRef {
    id: Uuid::from_u128(0x86b0_5a0c_73e6_4f7d_b3cf_e38f_3b39_a75b),
    name: "evaluatebranchProtection".to_string(),
    version: "0.0.1".to_string(),
});

pub struct BranchControlKind;

impl CheckKind for BranchControlKind {
    fn type_name(&self) -> &'static str {
        "azdo_check_branch_control"
    }

    fn noun(&self) -> &'static str {
        "branch control check"
    }

    fn expand(&self, d: &StateStore) -> Result<CheckConfiguration> {
        let allowed = {
            let declared = d.get_str("allowed_branches");
            if declared.is_empty() { "*".to_string() } else { declared }
        };
        let inputs = json!({
            "allowedBranches": allowed,
            "ensureProtectionOfBranch": d.get_bool("verify_branch_protection").to_string(),
            "allowUnknownStatusBranch": d.get_bool("ignore_unknown_protection_status").to_string(),
        });
        Ok(CheckConfiguration {
            id: None,
            check_type: CheckType { id: CHECK_TYPE_TASK, name: None },
            resource: common::target_resource(d),
            settings: Some(task_settings(d, &EVALUATE_BRANCH_PROTECTION, inputs)),
            timeout: Some(common::declared_timeout(d)),
            version: None,
        })
    }

    fn flatten(&self, d: &mut StateStore, check: &CheckConfiguration) -> Result<()> {
        flatten_base(d, check);
        let settings = settings_of(check)?;
        verify_definition_ref(settings, &EVALUATE_BRANCH_PROTECTION)?;
        flatten_display_name(d, settings);
        let inputs = inputs_of(settings);
        if let Some(allowed) = inputs.get("allowedBranches").and_then(Value::as_str) {
            d.set("allowed_branches", allowed);
        }
        for (api, declared) in [
            ("ensureProtectionOfBranch", "verify_branch_protection"),
            ("allowUnknownStatusBranch", "ignore_unknown_protection_status"),
        ] {
            if let Some(flag) = inputs.get(api).and_then(Value::as_str)
                && let Ok(flag) = flag.parse::<bool>()
            {
                d.set(declared, flag);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::CheckHandler;
    use azdoapi::mock::MockAzdo;
    use declarative::{Attrs, Lifecycle, OpContext};
    use std::sync::Arc;

    fn attrs() -> Attrs {
        [
            ("project_id".to_string(), json!("p")),
            ("target_resource_id".to_string(), json!("e")),
            ("target_resource_type".to_string(), json!("endpoint")),
            ("display_name".to_string(), json!("bc")),
            ("allowed_branches".to_string(), json!("refs/heads/releases/*")),
            ("verify_branch_protection".to_string(), json!(false)),
            ("ignore_unknown_protection_status".to_string(), json!(true)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn expansion_produces_the_documented_wire_shape() {
        let d = declarative::StateStore::new(attrs(), Attrs::new());
        let check = BranchControlKind.expand(&d).unwrap();

        assert_eq!(check.check_type.id.to_string(), "fe1de3ee-a436-41b4-bb20-f6eb4cb879a7");
        let settings = check.settings.unwrap();
        assert_eq!(
            settings["definitionRef"],
            json!({
                "id": "86b05a0c-73e6-4f7d-b3cf-e38f3b39a75b",
                "name": "evaluatebranchProtection",
                "version": "0.0.1",
            })
        );
        assert_eq!(
            settings["inputs"],
            json!({
                "allowedBranches": "refs/heads/releases/*",
                "ensureProtectionOfBranch": "false",
                "allowUnknownStatusBranch": "true",
            })
        );
        assert_eq!(check.resource.id, "e");
        assert_eq!(check.resource.resource_type, "endpoint");
    }

    #[test]
    fn create_then_read_round_trips_through_the_server() {
        let mock = Arc::new(MockAzdo::new());
        let res = CheckHandler::new(mock, BranchControlKind);

        let mut d = declarative::StateStore::new(attrs(), Attrs::new());
        res.create(&OpContext::new(), &mut d).unwrap();
        assert!(!d.id().is_empty());
        assert_eq!(d.get("allowed_branches"), json!("refs/heads/releases/*"));
        assert_eq!(d.get("verify_branch_protection"), json!(false));
        assert_eq!(d.get("ignore_unknown_protection_status"), json!(true));
        assert_eq!(d.get("display_name"), json!("bc"));
        assert_eq!(d.get("timeout"), json!(1440));
    }

    #[test]
    fn empty_allowed_branches_defaults_to_wildcard() {
        let mut planned = attrs();
        planned.remove("allowed_branches");
        let d = declarative::StateStore::new(planned, Attrs::new());
        let check = BranchControlKind.expand(&d).unwrap();
        assert_eq!(check.settings.unwrap()["inputs"]["allowedBranches"], "*");
    }
}
