use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("設定ディレクトリが見つかりません")]
    ConfigDirNotFound,

    #[error(
        "設定ファイルが見つかりません: {0}\n\
        SHIPFLOW_CONFIG 環境変数のパスを確認してください"
    )]
    SettingsFileNotFound(PathBuf),

    #[error("設定ファイルのパースエラー: {path}\n理由: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("無効なログレベル '{level}': {message}")]
    InvalidLogLevel { level: String, message: String },

    #[error("ログの初期化に失敗しました: {0}")]
    Logging(String),

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
