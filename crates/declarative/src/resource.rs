//! The CRUD lifecycle every managed resource implements.
//!
//! A lifecycle handler converges one remote entity: it reads the declared
//! attributes from a [`StateStore`], issues the remote calls, and writes
//! server-computed attributes back. Handlers are stateless beyond the client
//! handle they carry; the host may invoke distinct instances concurrently.

use crate::context::OpContext;
use crate::error::ImportError;
use crate::state::StateStore;
use anyhow::Result;

/// Lifecycle contract for a declaratively managed resource.
///
/// Semantics, common to every implementation:
///
/// - `create` aborts on any error and leaves the identity empty.
/// - `read` clears the identity and succeeds when the remote entity is gone.
/// - `update` propagates errors without writing computed attributes back.
/// - `delete` treats an already-deleted entity as success.
pub trait Lifecycle: Send + Sync {
    /// Stable resource type name the registry keys this handler by.
    fn type_name(&self) -> &'static str;

    fn create(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()>;

    fn read(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()>;

    fn update(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()>;

    fn delete(&self, ctx: &OpContext, d: &mut StateStore) -> Result<()>;

    /// Reconstruct addressing attributes from a compound import identifier.
    ///
    /// The default rejects import; resources that support it parse their
    /// slash-joined identifier and seed the store.
    fn import(&self, raw_id: &str, d: &mut StateStore) -> Result<()> {
        let _ = d;
        anyhow::bail!(
            "resource {} does not support import (id {raw_id:?})",
            self.type_name()
        )
    }
}

/// A boxed lifecycle handler for type-erased registries.
pub type BoxedLifecycle = Box<dyn Lifecycle>;

/// Split a slash-joined compound import identifier.
///
/// `expected` is the documented format (for example
/// `"process_id/work_item_type_reference_name/group_id/control_id"`); its
/// segment count is the required count. Segments are not URL-decoded.
pub fn split_import_id<'a>(
    raw: &'a str,
    expected: &'static str,
) -> Result<Vec<&'a str>, ImportError> {
    let want = expected.split('/').count();
    let parts: Vec<&str> = raw.split('/').collect();
    if parts.len() != want || parts.iter().any(|p| p.is_empty()) {
        return Err(ImportError::Malformed {
            id: raw.to_string(),
            expected,
        });
    }
    Ok(parts)
}
