use crate::task::TaskCategory;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Invalid {stage} spec: {message}")]
    InvalidSpec {
        stage: &'static str,
        message: String,
    },

    #[error("Task '{expected}' not found for {category} of '{name}'")]
    TaskNotFound {
        category: TaskCategory,
        expected: String,
        name: String,
    },

    #[error("Test task '{task}' failed to execute: {source}")]
    TestExecution {
        task: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Cannot {operation} image: no built image in pipeline context")]
    MissingBuiltImage { operation: &'static str },

    #[error("Task '{task}' reported failure")]
    UnitFailed {
        task: String,
        output: Option<String>,
    },

    #[error("Invalid image '{image}': {message}")]
    InvalidImage { image: String, message: String },

    #[error("Invalid tag: {0}")]
    InvalidTag(String),

    #[error("Unsupported compression '{0}' (expected one of: none, gzip, bzip2, xz)")]
    InvalidCompression(String),

    #[error(transparent)]
    External(#[from] anyhow::Error),
}

impl WorkflowError {
    pub fn invalid_spec(stage: &'static str, message: impl Into<String>) -> Self {
        WorkflowError::InvalidSpec {
            stage,
            message: message.into(),
        }
    }

    /// 設定ミスを直すためのヒント付きメッセージ
    pub fn user_message(&self) -> String {
        match self {
            WorkflowError::InvalidSpec { stage, message } => {
                format!(
                    "{} ステージの設定が不正です: {}\n\
                     \n\
                     パイプライン定義の {} ブロックを確認してください。",
                    stage, message, stage
                )
            }
            WorkflowError::TaskNotFound {
                expected, name, ..
            } => {
                format!(
                    "タスク '{}' が見つかりません（対象: '{}'）\n\
                     \n\
                     解決方法:\n\
                     1. '{}' の名前が正しいか確認してください\n\
                     2. タスクランナーに '{}' が登録されているか確認してください",
                    expected, name, name, expected
                )
            }
            WorkflowError::MissingBuiltImage { operation } => {
                format!(
                    "ビルド済みイメージがありません\n\
                     \n\
                     {} を実行する前に build ステージを成功させてください。",
                    operation
                )
            }
            WorkflowError::UnitFailed {
                output: Some(output),
                ..
            } => format!("{}\n\n出力:\n{}", self, output.trim()),
            _ => format!("{}", self),
        }
    }

    /// テスト実行自体の失敗かどうか（テストの失敗は含まない）
    pub fn is_test_execution(&self) -> bool {
        matches!(self, WorkflowError::TestExecution { .. })
    }
}

pub type Result<T> = std::result::Result<T, WorkflowError>;
