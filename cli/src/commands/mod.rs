//! Command implementations

pub mod cleanup;
pub mod deploy;
pub mod version;
