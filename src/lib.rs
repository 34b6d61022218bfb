//! # azdoprov
//!
//! Declarative resource provider core for Azure DevOps organizations.
//! Three crates supply the resource handlers: `processkit` (inherited
//! work-item-tracking processes and their layouts), `hookkit` (service-hook
//! subscriptions) and `checkkit` (approvals and checks on protected
//! resources). This crate wires them to one authenticated REST client and
//! exposes the combined registry.
//!
//! ```no_run
//! use azdoprov::{Config, Provider};
//!
//! let provider = Provider::new(&Config::from_env()?);
//! let resources = provider.resources();
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod config;
pub mod provider;

pub use config::Config;
pub use provider::Provider;

/// Stderr logger honouring `RUST_LOG`, defaulting to warnings only.
/// Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn"),
    )
    .format_timestamp(None)
    .try_init();
}
