//! Exclusive-lock check: only one run may deploy to the protected resource
//! at a time. The settings document is empty; the check type says it all.

use anyhow::Result;
use azdoapi::models::checks::{CHECK_TYPE_EXCLUSIVE_LOCK, CheckConfiguration, CheckType};
use declarative::StateStore;
use serde_json::json;

use crate::common::{self, CheckKind, flatten_base};

pub struct ExclusiveLockKind;

impl CheckKind for ExclusiveLockKind {
    fn type_name(&self) -> &'static str {
        "azdo_check_exclusive_lock"
    }

    fn noun(&self) -> &'static str {
        "exclusive lock check"
    }

    fn expand(&self, d: &StateStore) -> Result<CheckConfiguration> {
        Ok(CheckConfiguration {
            id: None,
            check_type: CheckType {
                id: CHECK_TYPE_EXCLUSIVE_LOCK,
                name: Some("ExclusiveLock".to_string()),
            },
            resource: common::target_resource(d),
            settings: Some(json!({})),
            timeout: Some(common::declared_timeout(d)),
            version: None,
        })
    }

    fn flatten(&self, d: &mut StateStore, check: &CheckConfiguration) -> Result<()> {
        flatten_base(d, check);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::CheckHandler;
    use azdoapi::ChecksClient;
    use azdoapi::mock::MockAzdo;
    use declarative::{Attrs, Lifecycle, OpContext, StateStore};
    use std::sync::Arc;

    #[test]
    fn lifecycle_round_trips_with_empty_settings() {
        let mock = Arc::new(MockAzdo::new());
        let res = CheckHandler::new(mock.clone(), ExclusiveLockKind);

        let planned: Attrs = [
            ("project_id".to_string(), json!("p")),
            ("target_resource_id".to_string(), json!("env-1")),
            ("target_resource_type".to_string(), json!("environment")),
            ("timeout".to_string(), json!(60)),
        ]
        .into_iter()
        .collect();
        let mut d = StateStore::new(planned.clone(), Attrs::new());
        res.create(&OpContext::new(), &mut d).unwrap();
        assert_eq!(d.get("timeout"), json!(60));

        let stored = mock.get_check("p", d.id().parse().unwrap()).unwrap();
        assert_eq!(stored.settings, Some(json!({})));
        assert_eq!(
            stored.check_type.id.to_string(),
            "2ef31ad6-baa0-403a-8b45-2cbc9b4e5563"
        );

        res.delete(&OpContext::new(), &mut d).unwrap();
        // A second delete finds nothing and still succeeds.
        res.delete(&OpContext::new(), &mut d).unwrap();
    }
}
