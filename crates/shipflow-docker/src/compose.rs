//! docker compose wrapper
//!
//! テスト環境を compose プロジェクトとして起動・停止する。
//! プロジェクト名は環境名から作るので、同じ環境名なら同じスタックを指す。

use crate::error::{EngineError, Result};
use async_trait::async_trait;
use shipflow_config::DockerSettings;
use shipflow_core::EnvironmentOrchestrator;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

#[derive(Debug, Clone)]
pub struct ComposeOrchestrator {
    /// 例: ["docker", "compose"], ["podman", "compose"]
    command: Vec<String>,
    files: Vec<PathBuf>,
    project_dir: Option<PathBuf>,
}

impl Default for ComposeOrchestrator {
    fn default() -> Self {
        Self::from_settings(&DockerSettings::default())
    }
}

impl ComposeOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &DockerSettings) -> Self {
        Self {
            command: settings.compose_command.clone(),
            files: settings.compose_files.clone(),
            project_dir: settings.project_dir.clone(),
        }
    }

    pub fn with_command<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command = command.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.files.push(file.into());
        self
    }

    pub fn with_project_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.project_dir = Some(dir.into());
        self
    }

    /// compose に渡す引数（コマンド本体は含まない）
    pub fn args(&self, environment: &str, action: &[&str]) -> Vec<String> {
        let mut args = vec!["-p".to_string(), project_name(environment)];
        for file in &self.files {
            args.push("-f".to_string());
            args.push(file.display().to_string());
        }
        args.extend(action.iter().map(|a| a.to_string()));
        args
    }

    pub async fn start(&self, environment: &str) -> Result<()> {
        tracing::info!("Starting environment '{}'", environment);
        self.run(environment, "up", &["up", "-d", "--wait"]).await
    }

    /// 起動していないスタックに対しても成功する
    pub async fn stop(&self, environment: &str) -> Result<()> {
        tracing::info!("Stopping environment '{}'", environment);
        self.run(environment, "down", &["down", "--remove-orphans"])
            .await
    }

    async fn run(&self, environment: &str, label: &'static str, action: &[&str]) -> Result<()> {
        let (program, base_args) = self
            .command
            .split_first()
            .ok_or_else(|| EngineError::InvalidConfig("compose command is empty".to_string()))?;

        let args = self.args(environment, action);
        let mut cmd = Command::new(program);
        cmd.args(base_args);
        cmd.args(&args);
        if let Some(dir) = &self.project_dir {
            cmd.current_dir(dir);
        }
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("Running: {} {}", self.command.join(" "), args.join(" "));

        let output = cmd.output().await.map_err(|e| EngineError::Compose {
            environment: environment.to_string(),
            action: label,
            message: format!("failed to run {}: {}", program, e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Compose {
                environment: environment.to_string(),
                action: label,
                message: stderr.trim().to_string(),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl EnvironmentOrchestrator for ComposeOrchestrator {
    async fn up(&self, environment: &str) -> anyhow::Result<()> {
        Ok(self.start(environment).await?)
    }

    async fn down(&self, environment: &str) -> anyhow::Result<()> {
        Ok(self.stop(environment).await?)
    }
}

/// compose のプロジェクト名（小文字英数字・`-`・`_` のみ）
pub fn project_name(environment: &str) -> String {
    environment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}
