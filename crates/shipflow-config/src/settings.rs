//! ホスト側の既定値
//!
//! パイプライン定義そのものではなく、Docker コマンドやレポートの場所など
//! 実行環境ごとに変わる値だけを持つ。

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// ログレベルの上書き
pub const LOG_ENV: &str = "SHIPFLOW_LOG";
/// compose コマンドの上書き（例: "podman compose"）
pub const COMPOSE_COMMAND_ENV: &str = "SHIPFLOW_COMPOSE_COMMAND";
/// JUnit レポートディレクトリの上書き
pub const REPORT_DIR_ENV: &str = "SHIPFLOW_REPORT_DIR";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// tracing のフィルタ（例: "info", "shipflow_pipeline=debug"）
    pub log_level: Option<String>,
    /// ログの出力先ファイル。未指定なら stderr
    pub log_file: Option<PathBuf>,
    pub docker: DockerSettings,
    pub save: SaveSettings,
    pub reports: ReportSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DockerSettings {
    /// compose を呼び出すコマンド
    pub compose_command: Vec<String>,
    /// `-f` で渡す compose ファイル
    pub compose_files: Vec<PathBuf>,
    /// compose を実行するディレクトリ
    pub project_dir: Option<PathBuf>,
}

impl Default for DockerSettings {
    fn default() -> Self {
        Self {
            compose_command: vec!["docker".to_string(), "compose".to_string()],
            compose_files: Vec::new(),
            project_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveSettings {
    /// 保存先が未指定の場合のディレクトリ
    pub output_dir: PathBuf,
}

impl Default for SaveSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("docker-images"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// JUnit XML レポートのディレクトリ
    pub junit_dir: Option<PathBuf>,
}

impl Settings {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// 環境変数の値で上書きした設定を返す
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(level) = std::env::var(LOG_ENV)
            && !level.trim().is_empty()
        {
            self.log_level = Some(level);
        }

        if let Ok(command) = std::env::var(COMPOSE_COMMAND_ENV) {
            let parts: Vec<String> = command.split_whitespace().map(str::to_string).collect();
            if !parts.is_empty() {
                self.docker.compose_command = parts;
            }
        }

        if let Ok(dir) = std::env::var(REPORT_DIR_ENV)
            && !dir.trim().is_empty()
        {
            self.reports.junit_dir = Some(PathBuf::from(dir));
        }

        self
    }
}
