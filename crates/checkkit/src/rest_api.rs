//! Invoke-REST-API task check. The check calls an HTTP endpoint through a
//! service connection and either waits for a callback or evaluates the
//! response against a success criteria expression.

use std::sync::LazyLock;

use anyhow::{Result, bail};
use azdoapi::models::checks::{CHECK_TYPE_TASK, CheckConfiguration, CheckType, DefinitionRef};
use declarative::StateStore;
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::common::{
    self, CheckKind, flatten_base, flatten_display_name, inputs_of, settings_of,
    verify_definition_ref,
};

static INVOKE_REST_API: LazyLock<DefinitionRef> = LazyLock::new(|| DefinitionRef {
    id: Uuid::from_u128(0x9c3e_8943_130d_4c78_ac63_8af8_1df6_2dfb),
    name: "InvokeRESTAPI".to_string(),
    version: "1.220.0".to_string(),
});

pub struct RestApiKind;

fn completion_event(d: &StateStore) -> String {
    let declared = d.get_str("completion_event");
    if declared.is_empty() { "Callback".to_string() } else { declared }
}

impl CheckKind for RestApiKind {
    fn type_name(&self) -> &'static str {
        "azdo_check_rest_api"
    }

    fn noun(&self) -> &'static str {
        "rest api check"
    }

    fn expand(&self, d: &StateStore) -> Result<CheckConfiguration> {
        let selector = d.get_str("connected_service_name_selector");
        if selector != "connectedServiceName" && selector != "connectedServiceNameARM" {
            bail!("unknown service connection selector {selector:?}");
        }
        let mut inputs = Map::new();
        inputs.insert("connectedServiceNameSelector".to_string(), Value::from(selector.clone()));
        inputs.insert(selector, Value::from(d.get_str("connected_service_name")));
        inputs.insert("method".to_string(), Value::from(d.get_str("method")));
        for (declared, api) in [("headers", "headers"), ("body", "body"), ("url_suffix", "urlSuffix")] {
            let value = d.get_str(declared);
            if !value.is_empty() {
                inputs.insert(api.to_string(), Value::from(value));
            }
        }

        let event = completion_event(d);
        let waits = match event.as_str() {
            "Callback" => true,
            "ApiResponse" => false,
            other => bail!("unknown completion event {other:?}"),
        };
        inputs.insert("waitForCompletion".to_string(), Value::from(waits.to_string()));
        if !waits {
            let criteria = d.get_str("success_criteria");
            if !criteria.is_empty() {
                inputs.insert("successCriteria".to_string(), Value::from(criteria));
            }
        }

        let mut settings = Map::new();
        settings.insert("definitionRef".to_string(), json!(&*INVOKE_REST_API));
        settings.insert("displayName".to_string(), Value::from(d.get_str("display_name")));
        settings.insert("inputs".to_string(), Value::Object(inputs));

        let timeout = common::declared_timeout(d);
        if !(1..=43200).contains(&timeout) {
            bail!("timeout must be between 1 and 43200 minutes, got {timeout}");
        }
        if let Some(interval) = d.get_i64("retry_interval") {
            // A callback check is never retried; the interval only applies
            // when the response is polled.
            if waits {
                bail!("retry_interval is not used when completion_event is Callback");
            }
            if interval != 0 && interval < timeout / 10 {
                bail!(
                    "retry_interval {interval} allows more than 10 retries within the {timeout} minute timeout"
                );
            }
            settings.insert("retryInterval".to_string(), Value::from(interval));
        }
        let group = d.get_str("variable_group_name");
        if !group.is_empty() {
            settings.insert("linkedVariableGroup".to_string(), Value::from(group));
        }

        Ok(CheckConfiguration {
            id: None,
            check_type: CheckType { id: CHECK_TYPE_TASK, name: None },
            resource: common::target_resource(d),
            settings: Some(Value::Object(settings)),
            timeout: Some(timeout),
            version: None,
        })
    }

    fn flatten(&self, d: &mut StateStore, check: &CheckConfiguration) -> Result<()> {
        flatten_base(d, check);
        let settings = settings_of(check)?;
        verify_definition_ref(settings, &INVOKE_REST_API)?;
        flatten_display_name(d, settings);
        if let Some(interval) = settings.get("retryInterval").and_then(Value::as_i64) {
            d.set("retry_interval", interval);
        }
        if let Some(group) = settings.get("linkedVariableGroup").and_then(Value::as_str) {
            d.set("variable_group_name", group);
        }
        let inputs = inputs_of(settings);
        if let Some(selector) = inputs.get("connectedServiceNameSelector").and_then(Value::as_str) {
            d.set("connected_service_name_selector", selector);
            if let Some(service) = inputs.get(selector).and_then(Value::as_str) {
                d.set("connected_service_name", service);
            }
        }
        for (api, declared) in [
            ("method", "method"),
            ("headers", "headers"),
            ("body", "body"),
            ("urlSuffix", "url_suffix"),
            ("successCriteria", "success_criteria"),
        ] {
            if let Some(value) = inputs.get(api).and_then(Value::as_str) {
                d.set(declared, value);
            }
        }
        if let Some(waits) = inputs.get("waitForCompletion").and_then(Value::as_str) {
            match waits.parse::<bool>() {
                Ok(true) => d.set("completion_event", "Callback"),
                Ok(false) => d.set("completion_event", "ApiResponse"),
                Err(_) => bail!("waitForCompletion input is not a boolean: {waits:?}"),
            }
        }
        Ok(())
    }
}
