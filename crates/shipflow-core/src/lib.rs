//! ShipFlow core
//!
//! This crate holds the state and contracts shared by every pipeline stage:
//! the immutable [`PipelineContext`], the stage specs read by the executors,
//! the error taxonomy, and the collaborator traits (task runner, container
//! engine, environment orchestrator, test result capture) that the
//! orchestration core drives.
//!
//! # Pipeline
//!
//! ```text
//! Build ──▶ Test (up → run → down) ──▶ Conditional ──┬─▶ Success ─▶ Tag / Save / Publish
//!                                                     └─▶ Failure ─▶ Tag
//! ```

pub mod capture;
pub mod engine;
pub mod environment;
pub mod error;
pub mod model;
pub mod task;

pub use capture::{TestResultCapture, parse_count};
pub use engine::ContainerEngine;
pub use environment::EnvironmentOrchestrator;
pub use error::{Result, WorkflowError};
pub use model::*;
pub use task::{TaskAction, TaskCategory, TaskLookup, TaskRef, TaskRunner, UnitOutcome};
