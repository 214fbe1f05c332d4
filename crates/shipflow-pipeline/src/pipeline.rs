//! パイプライン全体の実行

use crate::operation::{PublishOperationExecutor, SaveOperationExecutor, TagOperationExecutor};
use crate::report::JunitReportCapture;
use crate::stage::{
    BuildStageExecutor, ConditionalExecutor, FailureStageExecutor, SuccessStageExecutor,
    TestStageExecutor,
};
use shipflow_config::Settings;
use shipflow_core::{
    BuildSpec, ContainerEngine, FailureSpec, PipelineContext, Result, SuccessSpec, TaskRunner,
    TestResultCapture, TestSpec,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// 1イメージ分のパイプライン定義
#[derive(Debug, Clone, Default)]
pub struct PipelineDefinition {
    pub name: String,
    pub build: Option<BuildSpec>,
    /// 未指定の場合は Build で終了する
    pub test: Option<TestSpec>,
    pub on_success: Option<SuccessSpec>,
    pub on_failure: Option<FailureSpec>,
    /// 開始時にコンテキストへ載せるメタデータ
    pub metadata: BTreeMap<String, String>,
}

impl PipelineDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_build(mut self, build: BuildSpec) -> Self {
        self.build = Some(build);
        self
    }

    pub fn with_test(mut self, test: TestSpec) -> Self {
        self.test = Some(test);
        self
    }

    pub fn on_success(mut self, spec: SuccessSpec) -> Self {
        self.on_success = Some(spec);
        self
    }

    pub fn on_failure(mut self, spec: FailureSpec) -> Self {
        self.on_failure = Some(spec);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Build → Test → Conditional を順に実行する
///
/// 各ステージは前のステージが返したコンテキストを受け取る。
/// どのステージのエラーもその場でパイプラインを中断する。
pub struct Pipeline {
    build: BuildStageExecutor,
    test: TestStageExecutor,
    conditional: ConditionalExecutor,
}

impl Pipeline {
    pub fn new(
        runner: Arc<dyn TaskRunner>,
        engine: Arc<dyn ContainerEngine>,
        capture: Arc<dyn TestResultCapture>,
    ) -> Self {
        let save = SaveOperationExecutor::new(engine.clone());
        Self::assemble(runner, engine, capture, save)
    }

    /// ホスト設定（保存先ディレクトリ、JUnit レポートの場所）を反映して作成
    pub fn from_settings(
        runner: Arc<dyn TaskRunner>,
        engine: Arc<dyn ContainerEngine>,
        settings: &Settings,
    ) -> Self {
        let capture = Arc::new(JunitReportCapture::from_settings(&settings.reports));
        let save = SaveOperationExecutor::from_settings(engine.clone(), &settings.save);
        Self::assemble(runner, engine, capture, save)
    }

    fn assemble(
        runner: Arc<dyn TaskRunner>,
        engine: Arc<dyn ContainerEngine>,
        capture: Arc<dyn TestResultCapture>,
        save: SaveOperationExecutor,
    ) -> Self {
        let success = SuccessStageExecutor::new(
            TagOperationExecutor::new(engine.clone()),
            save,
            PublishOperationExecutor::new(engine.clone()),
        );
        let failure = FailureStageExecutor::new(TagOperationExecutor::new(engine));

        Self {
            build: BuildStageExecutor::new(runner.clone()),
            test: TestStageExecutor::new(runner, capture),
            conditional: ConditionalExecutor::new(success, failure),
        }
    }

    pub async fn run(&self, definition: &PipelineDefinition) -> Result<PipelineContext> {
        tracing::info!("Starting pipeline '{}'", definition.name);

        let context = definition.metadata.iter().fold(
            PipelineContext::new(&definition.name),
            |context, (key, value)| context.with_metadata(key, value),
        );

        let context = self
            .build
            .execute(definition.build.as_ref(), &context)
            .await?;

        let Some(test) = &definition.test else {
            tracing::info!("Pipeline '{}' has no test stage; done", definition.name);
            return Ok(context);
        };
        let context = self.test.execute(Some(test), &context).await?;

        let context = self
            .conditional
            .execute(
                context.test_result(),
                definition.on_success.as_ref(),
                definition.on_failure.as_ref(),
                &context,
            )
            .await?;

        tracing::info!("Pipeline '{}' finished", definition.name);
        Ok(context)
    }
}
