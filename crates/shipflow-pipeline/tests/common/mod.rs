use async_trait::async_trait;
use shipflow_core::{
    ContainerEngine, ImageSpec, RegistryCredentials, SaveCompression, TaskAction, UnitOutcome,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// レポート出力先を持つ一時プロジェクト
pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    pub fn report_dir(&self) -> PathBuf {
        self.root.path().join("test-results")
    }

    pub fn write_report(&self, name: &str, content: &str) {
        let dir = self.report_dir();
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(name), content).unwrap();
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }
}

/// 実行されたタスクとエンジン操作を順に記録する
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

pub struct JournalTask {
    journal: Journal,
    name: String,
    success: bool,
}

impl JournalTask {
    pub fn ok(journal: &Journal, name: &str) -> Arc<dyn TaskAction> {
        Arc::new(Self {
            journal: journal.clone(),
            name: name.to_string(),
            success: true,
        })
    }

    pub fn failing(journal: &Journal, name: &str) -> Arc<dyn TaskAction> {
        Arc::new(Self {
            journal: journal.clone(),
            name: name.to_string(),
            success: false,
        })
    }
}

#[async_trait]
impl TaskAction for JournalTask {
    async fn execute(&self) -> anyhow::Result<UnitOutcome> {
        self.journal.push(format!("task:{}", self.name));
        Ok(UnitOutcome {
            success: self.success,
            output: None,
        })
    }
}

pub struct JournalEngine {
    journal: Journal,
}

impl JournalEngine {
    pub fn new(journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            journal: journal.clone(),
        })
    }
}

#[async_trait]
impl ContainerEngine for JournalEngine {
    async fn build_image(&self, image: &ImageSpec) -> anyhow::Result<()> {
        self.journal.push(format!("build {}", image.reference()?));
        Ok(())
    }

    async fn tag_image(&self, source: &str, target: &str) -> anyhow::Result<()> {
        self.journal.push(format!("tag {} {}", source, target));
        Ok(())
    }

    async fn save_image(
        &self,
        reference: &str,
        output: &Path,
        compression: SaveCompression,
    ) -> anyhow::Result<()> {
        self.journal.push(format!(
            "save {} {} {}",
            reference,
            output.display(),
            compression
        ));
        Ok(())
    }

    async fn push_image(
        &self,
        reference: &str,
        _credentials: Option<&RegistryCredentials>,
    ) -> anyhow::Result<()> {
        self.journal.push(format!("push {}", reference));
        Ok(())
    }
}
