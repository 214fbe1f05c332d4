use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(
        "Dockerに接続できません: {0}\n\nヒント:\n  • Dockerが起動しているか確認してください\n  • DOCKER_HOST の設定を確認してください"
    )]
    DockerConnectionFailed(String),

    #[error("Docker APIエラー: {0}")]
    DockerApi(String),

    #[error("Dockerfile not found: {0}")]
    DockerfileNotFound(PathBuf),

    #[error("Build context directory not found: {0}")]
    ContextNotFound(PathBuf),

    #[error("Build failed: {0}")]
    BuildFailed(String),

    #[error("Push of '{reference}' failed: {message}")]
    PushFailed { reference: String, message: String },

    #[error("Authentication for '{registry}' failed: {message}")]
    AuthFailed { registry: String, message: String },

    #[error("Save of '{reference}' failed: {message}")]
    SaveFailed { reference: String, message: String },

    #[error("compose {action} for '{environment}' failed: {message}")]
    Compose {
        environment: String,
        action: &'static str,
        message: String,
    },

    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<bollard::errors::Error> for EngineError {
    fn from(err: bollard::errors::Error) -> Self {
        let err_str = err.to_string();
        if err_str.contains("Connection refused") || err_str.contains("No such file or directory")
        {
            EngineError::DockerConnectionFailed(err_str)
        } else {
            EngineError::DockerApi(err_str)
        }
    }
}

impl EngineError {
    /// ユーザー向けの分かりやすいエラーメッセージ
    pub fn user_message(&self) -> String {
        match self {
            EngineError::DockerfileNotFound(path) => {
                format!(
                    "Dockerfileが見つかりません: {}\n\
                     \n\
                     解決方法:\n\
                     1. Dockerfileのパスを確認してください\n\
                     2. イメージのビルド設定で dockerfile を明示的に指定してください",
                    path.display()
                )
            }
            EngineError::ContextNotFound(path) => {
                format!(
                    "ビルドコンテキストが見つかりません: {}\n\
                     \n\
                     イメージのビルド設定で context のパスを確認してください。",
                    path.display()
                )
            }
            EngineError::AuthFailed { registry, message } => {
                format!(
                    "レジストリ '{}' の認証に失敗しました: {}\n\
                     \n\
                     docker login {} を実行するか、公開先に認証情報を設定してください。",
                    registry, message, registry
                )
            }
            _ => format!("{}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
