//! # Declarative
//!
//! Plumbing for declarative resource management against a remote API.
//!
//! This crate provides the host-facing abstractions a resource provider is
//! built on: an attribute [`StateStore`] that distinguishes planned, prior
//! and raw-plan views of a resource's configuration, an [`OpContext`] with
//! deadline and cooperative cancellation, and the [`Lifecycle`] trait that
//! every managed resource implements with create/read/update/delete
//! semantics.
//!
//! ## Core concepts
//!
//! - **StateStore**: the three attribute views. The *raw plan* preserves
//!   whether an attribute was set at all, so handlers can implement
//!   tri-state booleans ("unset" means "do not touch", not "false").
//! - **OpContext**: per-operation deadline, cancel token and the default
//!   timeouts (10 minutes for writes, 5 for reads).
//! - **Lifecycle**: the CRUD contract, plus optional import from a
//!   slash-joined compound identifier.
//!
//! ## Example
//!
//! ```
//! use declarative::{split_import_id, OpContext, StateStore};
//! use serde_json::json;
//!
//! let mut d = StateStore::default();
//! d.set_planned("process_id", json!("00000000-0000-0000-0000-000000000001"));
//! assert_eq!(d.get_str("process_id").len(), 36);
//!
//! let parts = split_import_id("proc/MyProcess.Bug/state-id", "a/b/c").unwrap();
//! assert_eq!(parts.len(), 3);
//!
//! let ctx = OpContext::new();
//! assert!(ctx.checkpoint().is_ok());
//! ```

pub mod context;
pub mod error;
pub mod resource;
pub mod state;

// Re-export main types at crate root
pub use context::{CancelToken, OpContext, Timeouts};
pub use error::{ContextError, ImportError};
pub use resource::{BoxedLifecycle, Lifecycle, split_import_id};
pub use state::{Attrs, StateStore};
