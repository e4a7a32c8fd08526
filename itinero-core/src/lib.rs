//! Itinero Core - Core data structures and error handling
//!
//! This module defines the domain types and shared infrastructure for the
//! entire Itinero CRM system: roles, permission tags, user and lead records,
//! the error taxonomy, and logging setup.

pub mod error;
pub mod logging;
pub mod types;

pub use error::*;
pub use logging::*;
pub use types::*;

// Re-export commonly used external types
pub use async_trait::async_trait;
pub use tokio;
pub use tracing;
