//! Property Manager Services - business logic on top of the data layer.
//!
//! This crate provides the service trait and the two concrete services:
//! - `DirectoryService`: scoped CRUD and relationship reads over all five
//!   entities, with a store generation counter bumped on every committed write
//! - `AssistantService`: the tenant chat assistant (snapshot formatting,
//!   prompt assembly, session history, tool routing, the conversation loop)

pub mod service;
pub mod directory;
pub mod assistant;

// Re-export key types
pub use service::{Service, ServiceState};
pub use directory::DirectoryService;
pub use assistant::{AssistantService, Conversation};
