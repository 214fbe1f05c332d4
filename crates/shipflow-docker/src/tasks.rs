//! タスクランナーに登録する Docker タスク
//!
//! 識別子はタスク解決の命名規則に合わせて作る
//! （`dockerBuild<Name>` / `composeUp<Env>` / `composeDown<Env>`）。

use async_trait::async_trait;
use shipflow_core::{
    ContainerEngine, EnvironmentOrchestrator, ImageSpec, TaskAction, TaskCategory, UnitOutcome,
};
use std::sync::Arc;

/// イメージをビルドするタスク
pub struct BuildImageTask {
    engine: Arc<dyn ContainerEngine>,
    image: ImageSpec,
}

impl BuildImageTask {
    pub fn new(engine: Arc<dyn ContainerEngine>, image: ImageSpec) -> Self {
        Self { engine, image }
    }
}

#[async_trait]
impl TaskAction for BuildImageTask {
    async fn execute(&self) -> anyhow::Result<UnitOutcome> {
        self.engine.build_image(&self.image).await?;
        Ok(UnitOutcome::succeeded())
    }
}

/// テスト環境を起動するタスク
pub struct ComposeUpTask {
    orchestrator: Arc<dyn EnvironmentOrchestrator>,
    environment: String,
}

#[async_trait]
impl TaskAction for ComposeUpTask {
    async fn execute(&self) -> anyhow::Result<UnitOutcome> {
        self.orchestrator.up(&self.environment).await?;
        Ok(UnitOutcome::succeeded())
    }
}

/// テスト環境を停止するタスク
pub struct ComposeDownTask {
    orchestrator: Arc<dyn EnvironmentOrchestrator>,
    environment: String,
}

#[async_trait]
impl TaskAction for ComposeDownTask {
    async fn execute(&self) -> anyhow::Result<UnitOutcome> {
        self.orchestrator.down(&self.environment).await?;
        Ok(UnitOutcome::succeeded())
    }
}

/// `dockerBuild<Name>` タスク
pub fn build_task(
    engine: Arc<dyn ContainerEngine>,
    image: ImageSpec,
) -> (String, Arc<dyn TaskAction>) {
    let id = TaskCategory::Build.task_name(&image.name);
    (id, Arc::new(BuildImageTask::new(engine, image)))
}

/// `composeUp<Env>` と `composeDown<Env>` のタスク
pub fn environment_tasks(
    orchestrator: Arc<dyn EnvironmentOrchestrator>,
    environment: &str,
) -> [(String, Arc<dyn TaskAction>); 2] {
    let up: Arc<dyn TaskAction> = Arc::new(ComposeUpTask {
        orchestrator: orchestrator.clone(),
        environment: environment.to_string(),
    });
    let down: Arc<dyn TaskAction> = Arc::new(ComposeDownTask {
        orchestrator,
        environment: environment.to_string(),
    });

    [
        (TaskCategory::ComposeUp.task_name(environment), up),
        (TaskCategory::ComposeDown.task_name(environment), down),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use shipflow_core::{RegistryCredentials, SaveCompression};
    use std::path::Path;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn push(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ContainerEngine for Recorder {
        async fn build_image(&self, image: &ImageSpec) -> anyhow::Result<()> {
            self.push(format!("build {}", image.reference()?));
            Ok(())
        }

        async fn tag_image(&self, _source: &str, _target: &str) -> anyhow::Result<()> {
            unreachable!()
        }

        async fn save_image(
            &self,
            _reference: &str,
            _output: &Path,
            _compression: SaveCompression,
        ) -> anyhow::Result<()> {
            unreachable!()
        }

        async fn push_image(
            &self,
            _reference: &str,
            _credentials: Option<&RegistryCredentials>,
        ) -> anyhow::Result<()> {
            unreachable!()
        }
    }

    #[async_trait]
    impl EnvironmentOrchestrator for Recorder {
        async fn up(&self, environment: &str) -> anyhow::Result<()> {
            self.push(format!("up {}", environment));
            Ok(())
        }

        async fn down(&self, environment: &str) -> anyhow::Result<()> {
            anyhow::bail!("stack '{}' is busy", environment)
        }
    }

    #[tokio::test]
    async fn test_build_task() {
        let recorder = Arc::new(Recorder::default());
        let (id, task) = build_task(
            recorder.clone(),
            ImageSpec::new("checkout").with_tags(["1.0.0"]),
        );

        assert_eq!(id, "dockerBuildCheckout");
        assert!(task.execute().await.unwrap().success);
        assert_eq!(recorder.calls(), ["build checkout:1.0.0"]);
    }

    #[tokio::test]
    async fn test_environment_tasks() {
        let recorder = Arc::new(Recorder::default());
        let [(up_id, up), (down_id, down)] = environment_tasks(recorder.clone(), "integration");

        assert_eq!(up_id, "composeUpIntegration");
        assert_eq!(down_id, "composeDownIntegration");

        up.execute().await.unwrap();
        assert_eq!(recorder.calls(), ["up integration"]);

        let err = down.execute().await.unwrap_err();
        assert!(err.to_string().contains("busy"));
    }
}
