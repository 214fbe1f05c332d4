use shipflow_core::{
    BuildSpec, PipelineContext, Result, TaskCategory, TaskLookup, TaskRunner, WorkflowError,
    run_hook,
};
use std::sync::Arc;

/// Build ステージ
pub struct BuildStageExecutor {
    runner: Arc<dyn TaskRunner>,
}

impl BuildStageExecutor {
    pub fn new(runner: Arc<dyn TaskRunner>) -> Self {
        Self { runner }
    }

    /// ビルドタスクを実行し、ビルド済みイメージを記録したコンテキストを返す
    ///
    /// ビルドタスクやフックのエラーはそのまま返す。
    pub async fn execute(
        &self,
        spec: Option<&BuildSpec>,
        context: &PipelineContext,
    ) -> Result<PipelineContext> {
        let (spec, image) = spec
            .and_then(|s| s.image.as_ref().map(|image| (s, image)))
            .ok_or_else(|| WorkflowError::invalid_spec("build", "image must be configured"))?;

        let task = TaskLookup::new(self.runner.as_ref()).resolve(TaskCategory::Build, &image.name)?;

        tracing::info!("Build stage: image '{}' via task '{}'", image.name, task);
        run_hook("beforeBuild", spec.before_build.as_ref())?;

        let outcome = self.runner.run(&task, None).await?;
        if !outcome.success {
            return Err(WorkflowError::UnitFailed {
                task: task.id().to_string(),
                output: outcome.output,
            });
        }

        run_hook("afterBuild", spec.after_build.as_ref())?;

        tracing::info!("Build stage completed: {}", image.name);
        Ok(context.with_built_image(image.clone()))
    }
}
