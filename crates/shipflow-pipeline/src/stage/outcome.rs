use crate::operation::{PublishOperationExecutor, SaveOperationExecutor, TagOperationExecutor};
use shipflow_core::{
    FailureSpec, PipelineContext, Result, SuccessSpec, TagsSpec, WorkflowError,
    has_additional_tags, run_hook,
};

/// テスト成功時のステージ
///
/// 追加タグ → afterSuccess → Save → Publish の順に実行する。
pub struct SuccessStageExecutor {
    tag: TagOperationExecutor,
    save: SaveOperationExecutor,
    publish: PublishOperationExecutor,
}

impl SuccessStageExecutor {
    pub fn new(
        tag: TagOperationExecutor,
        save: SaveOperationExecutor,
        publish: PublishOperationExecutor,
    ) -> Self {
        Self { tag, save, publish }
    }

    pub async fn execute(
        &self,
        spec: &SuccessSpec,
        context: &PipelineContext,
    ) -> Result<PipelineContext> {
        tracing::info!("Success stage: pipeline '{}'", context.pipeline_name());

        let mut next = apply_additional_tags(&self.tag, spec, context).await?;
        run_hook("afterSuccess", spec.after_success.as_ref())?;

        if let Some(save) = &spec.save {
            next = self.save.execute(save, &next).await?;
        }
        if let Some(publish) = &spec.publish {
            next = self.publish.execute(publish, &next).await?;
        }

        Ok(next)
    }
}

/// テスト失敗時のステージ（Save / Publish は行わない）
pub struct FailureStageExecutor {
    tag: TagOperationExecutor,
}

impl FailureStageExecutor {
    pub fn new(tag: TagOperationExecutor) -> Self {
        Self { tag }
    }

    pub async fn execute(
        &self,
        spec: &FailureSpec,
        context: &PipelineContext,
    ) -> Result<PipelineContext> {
        tracing::info!("Failure stage: pipeline '{}'", context.pipeline_name());

        let next = apply_additional_tags(&self.tag, spec, context).await?;
        run_hook("afterFailure", spec.after_failure.as_ref())?;
        Ok(next)
    }
}

/// 追加タグをビルド済みイメージに付与し、付与したタグをコンテキストに記録する
async fn apply_additional_tags<S: TagsSpec>(
    tag: &TagOperationExecutor,
    spec: &S,
    context: &PipelineContext,
) -> Result<PipelineContext> {
    if !has_additional_tags(Some(spec)) {
        return Ok(context.clone());
    }

    let image = context
        .built_image()
        .ok_or(WorkflowError::MissingBuiltImage { operation: "tag" })?;
    let applied = tag.apply(image, spec.additional_tags()).await?;
    Ok(context.with_applied_tags(applied))
}
