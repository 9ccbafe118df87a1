//! Task coordination for datalab.
//!
//! This crate ties the workflow engine to the outside world: an in-memory
//! task registry with time-based eviction, the coordinator that owns the
//! per-task sandbox lifecycle, and the axum HTTP surface.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod registry;
pub mod service;

pub use config::Settings;
pub use error::{OrchestratorError, Result};
pub use models::{ArtifactResponse, TaskInfo, TaskRequest, TaskResponse, TaskStatus};
pub use registry::{RegistryHeartbeat, TaskRegistry};
pub use service::TaskService;

/// The coordinator instantiated with the production gateways.
pub type AppTaskService = service::TaskService<llm::LlmClient, sandbox::SandboxClient>;
