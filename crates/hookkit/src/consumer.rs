//! Consumer-input marshalling shared by the typed subscription resources.
//!
//! Each consumer builds its input map from declared attributes on expand and
//! writes the non-sensitive inputs back on flatten. Sensitive inputs (account
//! keys, basic-auth passwords, connection strings) are redacted by the server
//! in read responses, so flattening retains the prior declared value instead.

use std::collections::BTreeMap;

use declarative::StateStore;
use serde_json::Value;

pub const CONSUMER_WEBHOOKS: &str = "webHooks";
pub const ACTION_HTTP_REQUEST: &str = "httpRequest";
pub const CONSUMER_STORAGE_QUEUE: &str = "azureStorageQueue";
pub const ACTION_ENQUEUE: &str = "enqueue";
pub const CONSUMER_SERVICE_BUS: &str = "azureServiceBus";
pub const ACTION_SERVICE_BUS_QUEUE_SEND: &str = "serviceBusQueueSend";

const DEFAULT_TTL_SECONDS: i64 = 604_800;

fn or_default(d: &StateStore, key: &str, fallback: &str) -> String {
    let value = d.get_str(key);
    if value.is_empty() { fallback.to_string() } else { value }
}

/// Inputs for the `webHooks/httpRequest` consumer. HTTP headers are a
/// declared string map serialized as a newline-joined `key:value` string.
pub fn webhook_inputs(d: &StateStore) -> BTreeMap<String, String> {
    let mut inputs = BTreeMap::from([
        ("url".to_string(), d.get_str("url")),
        ("acceptUntrustedCerts".to_string(), d.get_bool("accept_untrusted_certs").to_string()),
        ("resourceDetailsToSend".to_string(), or_default(d, "resource_details_to_send", "all")),
        ("messagesToSend".to_string(), or_default(d, "messages_to_send", "all")),
        ("detailedMessagesToSend".to_string(), or_default(d, "detailed_messages_to_send", "all")),
    ]);
    let username = d.get_str("basic_auth_username");
    if !username.is_empty() {
        inputs.insert("basicAuthUsername".to_string(), username);
    }
    let password = d.get_str("basic_auth_password");
    if !password.is_empty() {
        inputs.insert("basicAuthPassword".to_string(), password);
    }
    let headers = join_http_headers(&d.get("http_headers"));
    if !headers.is_empty() {
        inputs.insert("httpHeaders".to_string(), headers);
    }
    inputs
}

/// Writes webhook consumer inputs back to state. The basic-auth password is
/// redacted by the server and is retained from the prior declared value.
pub fn flatten_webhook(d: &mut StateStore, inputs: &BTreeMap<String, String>) {
    d.set("url", inputs.get("url").cloned().unwrap_or_default());
    if let Some(accept) = inputs.get("acceptUntrustedCerts")
        && let Ok(accept) = accept.parse::<bool>()
    {
        d.set("accept_untrusted_certs", accept);
    }
    for (api, declared) in [
        ("resourceDetailsToSend", "resource_details_to_send"),
        ("messagesToSend", "messages_to_send"),
        ("detailedMessagesToSend", "detailed_messages_to_send"),
        ("basicAuthUsername", "basic_auth_username"),
    ] {
        if let Some(value) = inputs.get(api) {
            d.set(declared, value.clone());
        }
    }
    let password = retained_secret(d, "basic_auth_password");
    if !password.is_empty() {
        d.set("basic_auth_password", password);
    }
    if let Some(headers) = inputs.get("httpHeaders") {
        d.set("http_headers", Value::Object(split_http_headers(headers)));
    }
}

/// Inputs for the `azureStorageQueue/enqueue` consumer. Timeouts are declared
/// in seconds and sent as decimal strings.
pub fn storage_queue_inputs(d: &StateStore) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("accountName".to_string(), d.get_str("account_name")),
        ("accountKey".to_string(), d.get_str("account_key")),
        ("queueName".to_string(), d.get_str("queue_name")),
        ("visiTimeout".to_string(), d.get_i64("visi_timeout").unwrap_or(0).to_string()),
        ("ttl".to_string(), d.get_i64("ttl").unwrap_or(DEFAULT_TTL_SECONDS).to_string()),
    ])
}

/// Writes storage-queue consumer inputs back to state. The account key is
/// redacted by the server and is retained from the prior declared value.
pub fn flatten_storage_queue(d: &mut StateStore, inputs: &BTreeMap<String, String>) {
    d.set("account_name", inputs.get("accountName").cloned().unwrap_or_default());
    d.set("queue_name", inputs.get("queueName").cloned().unwrap_or_default());
    d.set("visi_timeout", parse_seconds(inputs.get("visiTimeout"), 0));
    d.set("ttl", parse_seconds(inputs.get("ttl"), DEFAULT_TTL_SECONDS));
    let key = retained_secret(d, "account_key");
    d.set("account_key", key);
}

/// Inputs for the `azureServiceBus/serviceBusQueueSend` consumer.
pub fn service_bus_inputs(d: &StateStore) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("connectionString".to_string(), d.get_str("connection_string")),
        ("queueName".to_string(), d.get_str("queue_name")),
    ])
}

/// Writes service-bus consumer inputs back to state. The connection string is
/// redacted by the server and is retained from the prior declared value.
pub fn flatten_service_bus(d: &mut StateStore, inputs: &BTreeMap<String, String>) {
    d.set("queue_name", inputs.get("queueName").cloned().unwrap_or_default());
    let connection = retained_secret(d, "connection_string");
    d.set("connection_string", connection);
}

/// The declared value when present, otherwise the prior state value. Covers
/// both a normal read (declaration in hand) and a refresh after import.
fn retained_secret(d: &StateStore, key: &str) -> String {
    let declared = d.get_str(key);
    if declared.is_empty() { d.prior_str(key) } else { declared }
}

fn parse_seconds(value: Option<&String>, fallback: i64) -> i64 {
    value.and_then(|v| v.parse().ok()).unwrap_or(fallback)
}

fn join_http_headers(value: &Value) -> String {
    let Value::Object(headers) = value else {
        return String::new();
    };
    // Object iteration is insertion-ordered; sort for a stable wire value.
    let mut lines: Vec<String> = headers
        .iter()
        .filter_map(|(k, v)| v.as_str().map(|v| format!("{k}:{v}")))
        .collect();
    lines.sort();
    lines.join("\n")
}

fn split_http_headers(joined: &str) -> serde_json::Map<String, Value> {
    let mut headers = serde_json::Map::new();
    for line in joined.split('\n').filter(|l| !l.is_empty()) {
        if let Some((key, value)) = line.split_once(':') {
            headers.insert(key.trim().to_string(), Value::from(value.trim()));
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::Attrs;
    use serde_json::json;

    fn store(pairs: &[(&str, Value)]) -> StateStore {
        let planned: Attrs = pairs.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect();
        StateStore::new(planned, Attrs::new())
    }

    #[test]
    fn http_headers_round_trip_tolerating_reorder() {
        let joined = join_http_headers(&json!({"X-B": "2", "X-A": "1"}));
        assert_eq!(joined, "X-A:1\nX-B:2");
        let split = split_http_headers(&joined);
        assert_eq!(split["X-A"], "1");
        assert_eq!(split["X-B"], "2");
    }

    #[test]
    fn webhook_omits_unset_basic_auth() {
        let d = store(&[("url", json!("https://example.com/sink"))]);
        let inputs = webhook_inputs(&d);
        assert_eq!(inputs["url"], "https://example.com/sink");
        assert_eq!(inputs["acceptUntrustedCerts"], "false");
        assert_eq!(inputs["resourceDetailsToSend"], "all");
        assert!(!inputs.contains_key("basicAuthUsername"));
        assert!(!inputs.contains_key("basicAuthPassword"));
        assert!(!inputs.contains_key("httpHeaders"));
    }

    #[test]
    fn storage_queue_applies_timeout_defaults() {
        let d = store(&[
            ("account_name", json!("acct")),
            ("account_key", json!("k")),
            ("queue_name", json!("q")),
        ]);
        let inputs = storage_queue_inputs(&d);
        assert_eq!(inputs["visiTimeout"], "0");
        assert_eq!(inputs["ttl"], "604800");
    }

    #[test]
    fn redacted_account_key_is_retained_from_prior_state() {
        let prior: Attrs = [("account_key".to_string(), json!("k"))].into_iter().collect();
        let mut d = StateStore::with_prior("id", Attrs::new(), Attrs::new(), prior);
        let inputs = BTreeMap::from([
            ("accountName".to_string(), "acct".to_string()),
            ("accountKey".to_string(), "********".to_string()),
            ("queueName".to_string(), "q".to_string()),
        ]);
        flatten_storage_queue(&mut d, &inputs);
        assert_eq!(d.get("account_key"), json!("k"));
    }
}
