//! ShipFlow pipeline orchestration
//!
//! Stage executors that sequence the collaborators defined in
//! `shipflow-core`:
//!
//! - [`BuildStageExecutor`] runs the image build task
//! - [`TestStageExecutor`] brings the test environment up, runs the tests and
//!   always tears the environment down again
//! - [`ConditionalExecutor`] routes to the success or failure path
//! - [`SuccessStageExecutor`] / [`FailureStageExecutor`] apply tags, run hooks,
//!   and (on success) save or publish the image
//!
//! [`Pipeline`] chains them for a single image.

pub mod operation;
pub mod pipeline;
pub mod report;
pub mod runner;
pub mod stage;

pub use operation::{
    PublishOperationExecutor, SaveOperationExecutor, TagOperationExecutor, validate_tag,
};
pub use pipeline::{Pipeline, PipelineDefinition};
pub use report::JunitReportCapture;
pub use runner::{CommandTask, FnTask, LocalTaskRunner};
pub use stage::{
    BuildStageExecutor, ConditionalExecutor, FailureStageExecutor, SuccessStageExecutor,
    TestStageExecutor,
};

#[cfg(test)]
mod testing;
