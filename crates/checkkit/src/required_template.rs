//! Required-template check: pipelines using the protected resource must
//! extend one of the declared YAML templates.

use anyhow::Result;
use azdoapi::models::checks::{CHECK_TYPE_EXTENDS, CheckConfiguration, CheckType};
use declarative::StateStore;
use serde_json::{Value, json};

use crate::common::{self, CheckKind, flatten_base, settings_of};

pub struct RequiredTemplateKind;

fn expand_templates(declared: &Value) -> Vec<Value> {
    let Value::Array(templates) = declared else {
        return Vec::new();
    };
    templates
        .iter()
        .map(|t| {
            let repository_type = t.get("repository_type").and_then(Value::as_str).unwrap_or("git");
            json!({
                "repositoryType": repository_type,
                "repositoryName": t.get("repository_name").and_then(Value::as_str).unwrap_or_default(),
                "repositoryRef": t.get("repository_ref").and_then(Value::as_str).unwrap_or_default(),
                "templatePath": t.get("template_path").and_then(Value::as_str).unwrap_or_default(),
            })
        })
        .collect()
}

fn flatten_templates(checks: &Value) -> Vec<Value> {
    let Value::Array(templates) = checks else {
        return Vec::new();
    };
    templates
        .iter()
        .map(|t| {
            json!({
                "repository_type": t.get("repositoryType").and_then(Value::as_str).unwrap_or("git"),
                "repository_name": t.get("repositoryName").and_then(Value::as_str).unwrap_or_default(),
                "repository_ref": t.get("repositoryRef").and_then(Value::as_str).unwrap_or_default(),
                "template_path": t.get("templatePath").and_then(Value::as_str).unwrap_or_default(),
            })
        })
        .collect()
}

impl CheckKind for RequiredTemplateKind {
    fn type_name(&self) -> &'static str {
        "azdo_check_required_template"
    }

    fn noun(&self) -> &'static str {
        "required template check"
    }

    fn expand(&self, d: &StateStore) -> Result<CheckConfiguration> {
        let settings = json!({
            "extendsChecks": expand_templates(&d.get("required_templates")),
        });
        Ok(CheckConfiguration {
            id: None,
            check_type: CheckType {
                id: CHECK_TYPE_EXTENDS,
                name: Some("ExtendsCheck".to_string()),
            },
            resource: common::target_resource(d),
            settings: Some(settings),
            timeout: Some(common::declared_timeout(d)),
            version: None,
        })
    }

    fn flatten(&self, d: &mut StateStore, check: &CheckConfiguration) -> Result<()> {
        flatten_base(d, check);
        let settings = settings_of(check)?;
        if let Some(extends) = settings.get("extendsChecks") {
            d.set("required_templates", Value::Array(flatten_templates(extends)));
        }
        Ok(())
    }
}
