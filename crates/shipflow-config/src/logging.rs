//! tracing の初期化

use crate::error::{ConfigError, Result};
use crate::settings::Settings;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const DEFAULT_LEVEL: &str = "info";

/// 設定に従って tracing subscriber をインストールする
///
/// `RUST_LOG` が設定されていればそちらを優先する。
/// `log_file` が指定されていればANSIカラーなしでファイルに追記する。
pub fn init_tracing(settings: &Settings) -> Result<()> {
    let filter = build_filter(settings)?;

    let result = match &settings.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::fmt()
                .with_writer(Mutex::new(file))
                .with_env_filter(filter)
                .with_ansi(false)
                .try_init()
        }
        None => tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .try_init(),
    };

    result.map_err(|e| ConfigError::Logging(e.to_string()))
}

fn build_filter(settings: &Settings) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let level = settings.log_level.as_deref().unwrap_or(DEFAULT_LEVEL);
    EnvFilter::try_new(level).map_err(|e| ConfigError::InvalidLogLevel {
        level: level.to_string(),
        message: e.to_string(),
    })
}
