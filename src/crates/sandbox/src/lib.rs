//! Sandbox provider gateway for datalab.
//!
//! Thin adapter over the sandbox provider's HTTP API. Each task owns exactly
//! one sandbox for its lifetime: the coordinator creates it, the workflow
//! engine executes generated code inside it, and the coordinator destroys it
//! on every exit path. All operations are awaited to completion; the
//! provider's wall-clock timeout bounds any hang.

pub mod config;
pub mod error;
pub mod types;

mod client;

pub use client::SandboxClient;
pub use config::{RemoteStorageConfig, SandboxConfig};
pub use error::{Result, SandboxError};
pub use types::{DataFile, ExecutionArtifact, ExecutionError, ExecutionResult};
