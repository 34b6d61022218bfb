//! Blocking Azure DevOps REST clients.
//!
//! Three endpoint families are covered, each behind an object-safe trait so
//! callers can substitute the in-memory fakes in [`mock`]:
//!
//! - [`ProcessClient`] for work-item-tracking processes (types, fields,
//!   states, picklists, rules, form layout)
//! - [`ServiceHooksClient`] for service-hook subscriptions
//! - [`ChecksClient`] for pipeline check configurations
//!
//! [`rest::RestClient`] implements all three over HTTP with PAT basic auth.
//! [`retry::with_retry`] wraps calls racing the server's asynchronous
//! propagation of structural edits.

pub mod client;
pub mod error;
pub mod mock;
pub mod models;
pub mod rest;
pub mod retry;

pub use client::{ChecksClient, ProcessClient, ServiceHooksClient};
pub use error::{Error, ErrorCategory, Result};
pub use rest::RestClient;
pub use retry::{
    retry_on_contribution_missing, retry_on_not_found, retry_on_unexpected_exception, with_retry,
};
