use super::outcome::{FailureStageExecutor, SuccessStageExecutor};
use shipflow_core::{FailureSpec, PipelineContext, Result, SuccessSpec, TestResult};

/// テスト結果に応じて成功・失敗のどちらか一方だけを実行する
pub struct ConditionalExecutor {
    success: SuccessStageExecutor,
    failure: FailureStageExecutor,
}

impl ConditionalExecutor {
    pub fn new(success: SuccessStageExecutor, failure: FailureStageExecutor) -> Self {
        Self { success, failure }
    }

    /// テスト結果がない場合や、該当する側の設定がない場合は何もしない
    pub async fn execute(
        &self,
        test_result: Option<&TestResult>,
        on_success: Option<&SuccessSpec>,
        on_failure: Option<&FailureSpec>,
        context: &PipelineContext,
    ) -> Result<PipelineContext> {
        let Some(result) = test_result else {
            tracing::debug!("No test result; skipping conditional stage");
            return Ok(context.clone());
        };

        match (result.success(), on_success, on_failure) {
            (true, Some(spec), _) => self.success.execute(spec, context).await,
            (false, _, Some(spec)) => self.failure.execute(spec, context).await,
            (success, ..) => {
                tracing::debug!(
                    "No {} spec configured; nothing to do",
                    if success { "success" } else { "failure" }
                );
                Ok(context.clone())
            }
        }
    }
}
