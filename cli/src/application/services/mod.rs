//! Use-case services — each provisioning stage orchestrated against the
//! port traits, free of any concrete process or terminal dependency.

pub mod compute;
pub mod deploy;
pub mod network;
pub mod pipeline;
pub mod resources;
pub mod verify;

#[cfg(test)]
pub mod test_support;
