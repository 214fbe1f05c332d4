//! ShipFlow Docker integration
//!
//! Docker-backed implementations of the ShipFlow collaborators:
//! a bollard [`DockerEngine`] for build / tag / save / push, registry
//! credential lookup, build-context archiving, a `docker compose`
//! [`ComposeOrchestrator`] for test environments, and the task actions
//! that register them with a task runner.

pub mod archive;
pub mod auth;
pub mod compose;
pub mod context;
pub mod engine;
pub mod error;
pub mod tasks;

pub use archive::{ArchiveSink, PendingArchive};
pub use auth::{RegistryAuth, extract_registry};
pub use compose::{ComposeOrchestrator, project_name};
pub use context::{BuildInputs, ContextBuilder};
pub use engine::DockerEngine;
pub use error::{EngineError, Result};
pub use tasks::{BuildImageTask, ComposeDownTask, ComposeUpTask, build_task, environment_tasks};
