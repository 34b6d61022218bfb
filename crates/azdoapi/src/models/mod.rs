//! Wire types shared by the REST and mock clients.

pub mod checks;
pub mod hooks;
pub mod process;
