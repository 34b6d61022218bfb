//! Business-hours check: restricts deployments to a declared weekly window.
//! The per-day booleans travel as one comma-joined `businessDays` input.

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

static EVALUATE_BUSINESS_HOURS: LazyLock<DefinitionRef> = LazyLock::new(|| DefinitionRef {
    id: Uuid::from_u128(0x445f_de2f_6c39_441c_807f_8a59_ff2e_075f),
    name: "evaluateBusinessHours".to_string(),
    version: "0.0.1".to_string(),
});

/// (declared attribute, server day name), in week order.
const BUSINESS_DAYS: [(&str, &str); 7] = [
    ("monday", "Monday"),
    ("tuesday", "Tuesday"),
    ("wednesday", "Wednesday"),
    ("thursday", "Thursday"),
    ("friday", "Friday"),
    ("saturday", "Saturday"),
    ("sunday", "Sunday"),
];

pub struct BusinessHoursKind;

impl CheckKind for BusinessHoursKind {
    fn type_name(&self) -> &'static str {
        "azdo_check_business_hours"
    }

    fn noun(&self) -> &'static str {
        "business hours check"
    }

    fn expand(&self, d: &StateStore) -> Result<CheckConfiguration> {
        let days: Vec<&str> = BUSINESS_DAYS
            .iter()
            .filter(|(declared, _)| d.get_bool(declared))
            .map(|(_, server)| *server)
            .collect();
        let inputs = json!({
            "businessDays": days.join(", "),
            "startTime": d.get_str("start_time"),
            "endTime": d.get_str("end_time"),
            "timeZone": d.get_str("time_zone"),
        });
        Ok(CheckConfiguration {
            id: None,
            check_type: CheckType { id: CHECK_TYPE_TASK, name: None },
            resource: common::target_resource(d),
            settings: Some(task_settings(d, &EVALUATE_BUSINESS_HOURS, inputs)),
            timeout: Some(common::declared_timeout(d)),
            version: None,
        })
    }

    fn flatten(&self, d: &mut StateStore, check: &CheckConfiguration) -> Result<()> {
        flatten_base(d, check);
        let settings = settings_of(check)?;
        verify_definition_ref(settings, &EVALUATE_BUSINESS_HOURS)?;
        flatten_display_name(d, settings);
        let inputs = inputs_of(settings);
        if let Some(days) = inputs.get("businessDays").and_then(Value::as_str) {
            for (declared, server) in BUSINESS_DAYS {
                d.set(declared, days.contains(server));
            }
        }
        for (api, declared) in
            [("startTime", "start_time"), ("endTime", "end_time"), ("timeZone", "time_zone")]
        {
            if let Some(value) = inputs.get(api).and_then(Value::as_str) {
                d.set(declared, value);
            }
        }
        Ok(())
    }
}
