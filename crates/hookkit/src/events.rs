//! Compile-time event tables for the typed subscription resources.
//!
//! Each publisher carries a table of [`EventSpec`] entries mapping the
//! declared event name to the API event-type string and the declared filter
//! keys to the publisher-input keys the server expects. Expansion and
//! flattening are pure table walks; unknown event names are rejected before
//! any request is built.

use std::collections::BTreeMap;

use anyhow::{Result, bail};
use declarative::StateStore;
use serde_json::Value;

/// One publishable event: declared name, API event type, and the
/// (declared key, API key) pairs of its filters.
pub struct EventSpec {
    pub name: &'static str,
    pub event_type: &'static str,
    pub keys: &'static [(&'static str, &'static str)],
}

/// Events published by the `tfs` publisher.
pub const TFS_EVENTS: &[EventSpec] = &[
    EventSpec {
        name: "build_completed",
        event_type: "build.complete",
        keys: &[("definition_name", "definitionName"), ("build_status", "buildStatus")],
    },
    EventSpec {
        name: "git_push",
        event_type: "git.push",
        keys: &[
            ("repository_id", "repository"),
            ("branch", "branch"),
            ("pushed_by", "pushedBy"),
        ],
    },
    EventSpec {
        name: "git_pull_request_created",
        event_type: "git.pullrequest.created",
        keys: &[
            ("repository_id", "repository"),
            ("branch", "branch"),
            ("pull_request_created_by", "pullrequestCreatedBy"),
            ("pull_request_reviewers_contains", "pullrequestReviewersContains"),
        ],
    },
    EventSpec {
        name: "git_pull_request_updated",
        event_type: "git.pullrequest.updated",
        keys: &[
            ("repository_id", "repository"),
            ("branch", "branch"),
            ("notification_type", "notificationType"),
            ("pull_request_created_by", "pullrequestCreatedBy"),
            ("pull_request_reviewers_contains", "pullrequestReviewersContains"),
        ],
    },
    EventSpec {
        name: "git_pull_request_merge_attempted",
        event_type: "git.pullrequest.merged",
        keys: &[
            ("repository_id", "repository"),
            ("branch", "branch"),
            ("pull_request_created_by", "pullrequestCreatedBy"),
            ("pull_request_reviewers_contains", "pullrequestReviewersContains"),
            ("merge_result", "mergeResult"),
        ],
    },
    EventSpec {
        name: "git_pull_request_commented",
        event_type: "ms.vss-code.git-pullrequest-comment-event",
        keys: &[("repository_id", "repository"), ("branch", "branch")],
    },
    EventSpec {
        name: "repository_created",
        event_type: "git.repo.created",
        keys: &[("project_id", "projectId")],
    },
    EventSpec {
        name: "repository_deleted",
        event_type: "git.repo.deleted",
        keys: &[("repository_id", "repository")],
    },
    EventSpec {
        name: "repository_forked",
        event_type: "git.repo.forked",
        keys: &[("repository_id", "repository")],
    },
    EventSpec {
        name: "repository_renamed",
        event_type: "git.repo.renamed",
        keys: &[("repository_id", "repository")],
    },
    EventSpec {
        name: "repository_status_changed",
        event_type: "git.repo.statuschanged",
        keys: &[("repository_id", "repository")],
    },
    EventSpec {
        name: "work_item_created",
        event_type: "workitem.created",
        keys: &[
            ("work_item_type", "workItemType"),
            ("area_path", "areaPath"),
            ("tag", "tag"),
        ],
    },
    EventSpec {
        name: "work_item_updated",
        event_type: "workitem.updated",
        keys: &[
            ("work_item_type", "workItemType"),
            ("area_path", "areaPath"),
            ("tag", "tag"),
            ("changed_fields", "changedFields"),
        ],
    },
    EventSpec {
        name: "work_item_deleted",
        event_type: "workitem.deleted",
        keys: &[
            ("work_item_type", "workItemType"),
            ("area_path", "areaPath"),
            ("tag", "tag"),
        ],
    },
    EventSpec {
        name: "work_item_restored",
        event_type: "workitem.restored",
        keys: &[
            ("work_item_type", "workItemType"),
            ("area_path", "areaPath"),
            ("tag", "tag"),
        ],
    },
    EventSpec {
        name: "work_item_commented",
        event_type: "workitem.commented",
        keys: &[
            ("work_item_type", "workItemType"),
            ("area_path", "areaPath"),
            ("tag", "tag"),
            ("comment_pattern", "commentPattern"),
        ],
    },
    EventSpec {
        name: "service_connection_created",
        event_type: "ms.vss-endpoint.endpoint-created",
        keys: &[("project", "project")],
    },
    EventSpec {
        name: "service_connection_updated",
        event_type: "ms.vss-endpoint.endpoint-updated",
        keys: &[("project", "project")],
    },
];

/// Events published by the `pipelines` publisher.
pub const PIPELINES_EVENTS: &[EventSpec] = &[
    EventSpec {
        name: "StageStateChanged",
        event_type: "ms.vss-pipelines.stage-state-changed-event",
        keys: &[
            ("pipeline_id", "pipelineId"),
            ("stage_name", "stageNameId"),
            ("stage_state_filter", "stageStateId"),
            ("stage_result_filter", "stageResultId"),
        ],
    },
    EventSpec {
        name: "RunStateChanged",
        event_type: "ms.vss-pipelines.run-state-changed-event",
        keys: &[
            ("pipeline_id", "pipelineId"),
            ("run_state_filter", "runStateId"),
            ("run_result_filter", "runResultId"),
        ],
    },
];

pub fn by_name<'a>(table: &'a [EventSpec], name: &str) -> Result<&'a EventSpec> {
    match table.iter().find(|e| e.name == name) {
        Some(spec) => Ok(spec),
        None => bail!("unknown published event {name:?}"),
    }
}

pub fn by_event_type<'a>(table: &'a [EventSpec], event_type: &str) -> Result<&'a EventSpec> {
    match table.iter().find(|e| e.event_type == event_type) {
        Some(spec) => Ok(spec),
        None => bail!("unknown subscription event type {event_type:?}"),
    }
}

/// Reads the declared `event_config` object as a string map. Missing blocks
/// and non-string values are treated as empty.
pub fn config_strings(d: &StateStore) -> BTreeMap<String, String> {
    match d.get_ok("event_config") {
        Some(Value::Object(map)) => map
            .into_iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k, s.to_string())))
            .collect(),
        _ => BTreeMap::new(),
    }
}

/// Builds the publisher-input map for one event. The `tfs` publisher drops
/// empty filter values; `pipelines` sends them through verbatim. `projectId`
/// is always present and wins over any same-named filter key.
pub fn expand_publisher(
    spec: &EventSpec,
    project_id: &str,
    config: &BTreeMap<String, String>,
    keep_empty: bool,
) -> BTreeMap<String, String> {
    let mut inputs = BTreeMap::new();
    for (declared, api) in spec.keys {
        match config.get(*declared) {
            Some(value) if keep_empty || !value.is_empty() => {
                inputs.insert((*api).to_string(), value.clone());
            }
            _ => {}
        }
    }
    inputs.insert("projectId".to_string(), project_id.to_string());
    inputs
}

/// Inverts [`expand_publisher`]: copies each publisher input whose API key
/// belongs to the event back under its declared key.
pub fn flatten_publisher(
    spec: &EventSpec,
    inputs: &BTreeMap<String, String>,
) -> serde_json::Map<String, Value> {
    let mut config = serde_json::Map::new();
    for (declared, api) in spec.keys {
        if let Some(value) = inputs.get(*api) {
            config.insert((*declared).to_string(), Value::from(value.clone()));
        }
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tfs_event_round_trips_through_both_lookups() {
        for spec in TFS_EVENTS {
            assert_eq!(by_name(TFS_EVENTS, spec.name).unwrap().event_type, spec.event_type);
            assert_eq!(by_event_type(TFS_EVENTS, spec.event_type).unwrap().name, spec.name);
        }
    }

    #[test]
    fn unknown_event_name_is_rejected() {
        assert!(by_name(TFS_EVENTS, "tfvc_checkin").is_err());
        assert!(by_event_type(PIPELINES_EVENTS, "git.push").is_err());
    }

    #[test]
    fn tfs_expansion_drops_empty_filters() {
        let spec = by_name(TFS_EVENTS, "git_push").unwrap();
        let config = BTreeMap::from([
            ("branch".to_string(), "refs/heads/main".to_string()),
            ("pushed_by".to_string(), String::new()),
        ]);
        let inputs = expand_publisher(spec, "p1", &config, false);
        assert_eq!(inputs["branch"], "refs/heads/main");
        assert_eq!(inputs["projectId"], "p1");
        assert!(!inputs.contains_key("pushedBy"));
    }

    #[test]
    fn pipelines_expansion_keeps_empty_filters() {
        let spec = by_name(PIPELINES_EVENTS, "RunStateChanged").unwrap();
        let config = BTreeMap::from([
            ("pipeline_id".to_string(), "42".to_string()),
            ("run_state_filter".to_string(), String::new()),
        ]);
        let inputs = expand_publisher(spec, "p1", &config, true);
        assert_eq!(inputs["pipelineId"], "42");
        assert_eq!(inputs["runStateId"], "");
        assert!(!inputs.contains_key("runResultId"));
    }

    #[test]
    fn flatten_maps_api_keys_back_to_declared_keys() {
        let spec = by_name(TFS_EVENTS, "git_pull_request_created").unwrap();
        let inputs = BTreeMap::from([
            ("repository".to_string(), "r1".to_string()),
            ("pullrequestCreatedBy".to_string(), "team".to_string()),
            ("projectId".to_string(), "p1".to_string()),
        ]);
        let config = flatten_publisher(spec, &inputs);
        assert_eq!(config["repository_id"], "r1");
        assert_eq!(config["pull_request_created_by"], "team");
        assert!(!config.contains_key("projectId"));
    }
}
