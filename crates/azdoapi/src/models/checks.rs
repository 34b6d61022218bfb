//! Wire types for the pipeline checks configuration endpoints.
//!
//! Every check kind shares one configuration shape; the `settings` document
//! distinguishes them. Task-backed checks (branch control, business hours,
//! REST API invocation) carry a `definitionRef` inside settings, the rest
//! are identified by the check type GUID alone.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Check type for task-backed checks (branch control, business hours,
/// REST API invocation).
pub const CHECK_TYPE_TASK: Uuid = Uuid::from_u128(0xfe1d_e3ee_a436_41b4_bb20_f6eb_4cb8_79a7);
/// Check type for manual approvals.
pub const CHECK_TYPE_APPROVAL: Uuid = Uuid::from_u128(0x8c6f_20a7_47c4_4d52_b556_76f4_087a_9f03);
/// Check type for exclusive locks.
pub const CHECK_TYPE_EXCLUSIVE_LOCK: Uuid =
    Uuid::from_u128(0x2ef3_1ad6_baa0_403a_8b45_2cbc_9b4e_5563);
/// Check type for required YAML templates.
pub const CHECK_TYPE_EXTENDS: Uuid = Uuid::from_u128(0x4020_e66e_b0f3_47e1_bc88_48f3_cc59_b5f3);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckType {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// The protected resource a check attaches to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResource {
    /// `endpoint`, `environment`, `variablegroup`, `repository`, ...
    #[serde(rename = "type")]
    pub resource_type: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "type")]
    pub check_type: CheckType,
    pub resource: CheckResource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Value>,
    /// Evaluation timeout in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
}

/// The task reference embedded in task-backed check settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionRef {
    pub id: Uuid,
    pub name: String,
    pub version: String,
}
