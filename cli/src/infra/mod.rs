//! Infrastructure layer — tokio-backed process, network, and filesystem
//! adapters behind the Application layer's port traits.

pub mod azure;
pub mod command_runner;
pub mod http;
pub mod logs;
pub mod readiness;
pub mod ssh;
