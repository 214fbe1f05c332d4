//! テスト用の記録付きコラボレーター

use async_trait::async_trait;
use shipflow_core::{
    ContainerEngine, ImageSpec, RegistryCredentials, SaveCompression, TaskAction, UnitOutcome,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Build(String),
    Tag { source: String, target: String },
    Save {
        reference: String,
        output: PathBuf,
        compression: SaveCompression,
    },
    Push { reference: String, authenticated: bool },
}

#[derive(Default)]
pub struct RecordingEngine {
    calls: Mutex<Vec<EngineCall>>,
}

impl RecordingEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ContainerEngine for RecordingEngine {
    async fn build_image(&self, image: &ImageSpec) -> anyhow::Result<()> {
        self.record(EngineCall::Build(image.reference()?));
        Ok(())
    }

    async fn tag_image(&self, source: &str, target: &str) -> anyhow::Result<()> {
        self.record(EngineCall::Tag {
            source: source.to_string(),
            target: target.to_string(),
        });
        Ok(())
    }

    async fn save_image(
        &self,
        reference: &str,
        output: &Path,
        compression: SaveCompression,
    ) -> anyhow::Result<()> {
        self.record(EngineCall::Save {
            reference: reference.to_string(),
            output: output.to_path_buf(),
            compression,
        });
        Ok(())
    }

    async fn push_image(
        &self,
        reference: &str,
        credentials: Option<&RegistryCredentials>,
    ) -> anyhow::Result<()> {
        self.record(EngineCall::Push {
            reference: reference.to_string(),
            authenticated: credentials.is_some(),
        });
        Ok(())
    }
}

/// タスクやフックの呼び出し順を記録する
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|e| *e == entry).count()
    }
}

/// 呼び出しを記録してから `outcome` を返すタスク
pub struct LoggedTask<F> {
    log: CallLog,
    name: String,
    outcome: F,
}

impl<F> LoggedTask<F>
where
    F: Fn() -> anyhow::Result<UnitOutcome> + Send + Sync + 'static,
{
    pub fn new(log: &CallLog, name: &str, outcome: F) -> Arc<dyn TaskAction> {
        Arc::new(Self {
            log: log.clone(),
            name: name.to_string(),
            outcome,
        })
    }
}

#[async_trait]
impl<F> TaskAction for LoggedTask<F>
where
    F: Fn() -> anyhow::Result<UnitOutcome> + Send + Sync,
{
    async fn execute(&self) -> anyhow::Result<UnitOutcome> {
        self.log.push(self.name.clone());
        (self.outcome)()
    }
}

pub fn ok_task(log: &CallLog, name: &str) -> Arc<dyn TaskAction> {
    LoggedTask::new(log, name, || Ok(UnitOutcome::succeeded()))
}
