//! Attribute state store for a single resource instance.
//!
//! A [`StateStore`] carries three views of a resource's attributes:
//!
//! - the *planned* values the user declared (with schema defaults applied),
//! - the *prior* values recorded after the last successful reconciliation,
//! - the *raw plan*, which preserves whether an attribute was set at all.
//!
//! Lifecycle handlers read planned values when building requests, compare
//! planned against prior to detect changes, and write server-computed values
//! back with [`StateStore::set`]. The raw plan exists because a typed getter
//! collapses "unset" and "false" for booleans; attributes like `visible` on
//! inherited controls must only be sent when the user actually set them.

use serde_json::Value;
use std::collections::BTreeMap;

/// Attribute map keyed by schema attribute name.
pub type Attrs = BTreeMap<String, Value>;

/// Mutable attribute state for one resource instance.
#[derive(Debug, Clone, Default)]
pub struct StateStore {
    id: String,
    planned: Attrs,
    prior: Attrs,
    raw_plan: Attrs,
    computed: Attrs,
}

impl StateStore {
    /// Build a store for a create operation: no prior state exists yet.
    ///
    /// `planned` holds the declared attributes with defaults applied;
    /// `raw_plan` holds only the attributes the user explicitly set.
    pub fn new(planned: Attrs, raw_plan: Attrs) -> Self {
        Self {
            planned,
            raw_plan,
            ..Default::default()
        }
    }

    /// Build a store for update/read/delete: prior state is known.
    pub fn with_prior(id: impl Into<String>, planned: Attrs, raw_plan: Attrs, prior: Attrs) -> Self {
        Self {
            id: id.into(),
            planned,
            raw_plan,
            prior,
            computed: Attrs::new(),
        }
    }

    /// The resource identity, empty when the resource does not exist.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Set the resource identity. An empty id marks the resource as gone.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Clear the identity, marking the resource as deleted out-of-band.
    pub fn clear_id(&mut self) {
        self.id.clear();
    }

    /// Planned value for `key`, preferring a computed write-back when one
    /// has already happened in this operation.
    pub fn get(&self, key: &str) -> Value {
        self.computed
            .get(key)
            .or_else(|| self.planned.get(key))
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Planned value for `key` only when it is set and non-empty.
    ///
    /// Mirrors the "ok" getter convention: empty strings, nulls, `false`
    /// and zero all count as unset.
    pub fn get_ok(&self, key: &str) -> Option<Value> {
        let value = self.get(key);
        match &value {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::Bool(false) => None,
            Value::Number(n) if n.as_i64() == Some(0) => None,
            _ => Some(value),
        }
    }

    /// Planned string value, defaulting to empty.
    pub fn get_str(&self, key: &str) -> String {
        match self.get(key) {
            Value::String(s) => s,
            _ => String::new(),
        }
    }

    /// Planned boolean value, defaulting to false.
    pub fn get_bool(&self, key: &str) -> bool {
        matches!(self.get(key), Value::Bool(true))
    }

    /// Planned integer value when present.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        match self.get(key) {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// Tri-state boolean read from the raw plan.
    ///
    /// `None` means the user never set the attribute; handlers must omit it
    /// from the request body rather than send `false`.
    pub fn tri_state(&self, key: &str) -> Option<bool> {
        match self.raw_plan.get(key) {
            Some(Value::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Integer read from the raw plan, `None` when unset.
    pub fn raw_i64(&self, key: &str) -> Option<i64> {
        match self.raw_plan.get(key) {
            Some(Value::Number(n)) => n.as_i64(),
            _ => None,
        }
    }

    /// Whether the attribute is present in the raw plan at all.
    pub fn is_set(&self, key: &str) -> bool {
        self.raw_plan.contains_key(key)
    }

    /// Whether the planned value differs from the prior one.
    pub fn has_change(&self, key: &str) -> bool {
        let old = self.prior.get(key);
        let new = self.planned.get(key);
        old != new
    }

    /// Prior and planned value for a changed attribute.
    pub fn change(&self, key: &str) -> (Value, Value) {
        (
            self.prior.get(key).cloned().unwrap_or(Value::Null),
            self.planned.get(key).cloned().unwrap_or(Value::Null),
        )
    }

    /// Prior value for `key`, from the last successful reconciliation.
    ///
    /// Used to retain sensitive attributes the server redacts on read.
    pub fn prior(&self, key: &str) -> Value {
        self.prior.get(key).cloned().unwrap_or(Value::Null)
    }

    /// Prior string value, defaulting to empty.
    pub fn prior_str(&self, key: &str) -> String {
        match self.prior(key) {
            Value::String(s) => s,
            _ => String::new(),
        }
    }

    /// Write a server-computed value back into state.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.computed.insert(key.into(), value.into());
    }

    /// Write a value back only when present, clearing it otherwise.
    pub fn set_opt(&mut self, key: impl Into<String>, value: Option<impl Into<Value>>) {
        match value {
            Some(v) => self.computed.insert(key.into(), v.into()),
            None => self.computed.insert(key.into(), Value::Null),
        };
    }

    /// All values written back during this operation.
    pub fn computed(&self) -> &Attrs {
        &self.computed
    }

    /// Seed a planned attribute. Intended for import handlers, which
    /// reconstruct the addressing attributes from a compound identifier.
    pub fn set_planned(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        self.raw_plan.insert(key.clone(), value.clone());
        self.planned.insert(key, value);
    }
}
