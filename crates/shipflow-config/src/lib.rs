pub mod error;
pub mod logging;
pub mod settings;

pub use error::*;
pub use logging::init_tracing;
pub use settings::{DockerSettings, ReportSettings, SaveSettings, Settings};

use std::path::PathBuf;

/// 設定ファイルのパスを直接指定する環境変数
pub const CONFIG_PATH_ENV: &str = "SHIPFLOW_CONFIG";

const CANDIDATES: [&str; 2] = ["shipflow.yaml", "shipflow.yml"];

/// ShipFlowのグローバル設定ディレクトリ（~/.config/shipflow）
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("shipflow");

    Ok(config_dir)
}

/// 設定ファイルを探す
///
/// 以下の優先順位で検索:
/// 1. 環境変数 SHIPFLOW_CONFIG (直接パス指定、存在しなければエラー)
/// 2. カレントディレクトリ: shipflow.yaml, shipflow.yml
/// 3. ./.shipflow/ ディレクトリ内: 同様の順序
/// 4. ~/.config/shipflow/shipflow.yaml (グローバル設定)
///
/// どこにもなければ `Ok(None)`（既定値で動作する）
pub fn find_settings_file() -> Result<Option<PathBuf>> {
    // 1. 環境変数で直接指定
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(Some(path));
        }
        return Err(ConfigError::SettingsFileNotFound(path));
    }

    let current_dir = std::env::current_dir()?;

    // 2. カレントディレクトリで検索
    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(Some(path));
        }
    }

    // 3. ./.shipflow/ ディレクトリで検索
    let local_dir = current_dir.join(".shipflow");
    if local_dir.is_dir() {
        for filename in &CANDIDATES {
            let path = local_dir.join(filename);
            if path.exists() {
                return Ok(Some(path));
            }
        }
    }

    // 4. グローバル設定ファイル
    if let Ok(config_dir) = get_config_dir() {
        let global_config = config_dir.join(CANDIDATES[0]);
        if global_config.exists() {
            return Ok(Some(global_config));
        }
    }

    Ok(None)
}

/// 設定を読み込み、環境変数による上書きを適用する
pub fn load_settings() -> Result<Settings> {
    let settings = match find_settings_file()? {
        Some(path) => {
            tracing::debug!("Loading settings from {}", path.display());
            Settings::from_file(&path)?
        }
        None => {
            tracing::debug!("No settings file found, using defaults");
            Settings::default()
        }
    };

    Ok(settings.with_env_overrides())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    #[test]
    #[serial]
    fn test_find_settings_file_in_current_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        fs::write(temp_dir.path().join("shipflow.yaml"), "log_level: debug\n").unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let result = temp_env::with_var_unset(CONFIG_PATH_ENV, find_settings_file);

        std::env::set_current_dir(original_dir).unwrap();

        let path = result.unwrap().unwrap();
        assert!(path.ends_with("shipflow.yaml"));
    }

    #[test]
    #[serial]
    fn test_find_settings_file_in_local_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        let local_dir = temp_dir.path().join(".shipflow");
        fs::create_dir(&local_dir).unwrap();
        fs::write(local_dir.join("shipflow.yml"), "log_level: warn\n").unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let result = temp_env::with_var_unset(CONFIG_PATH_ENV, find_settings_file);

        std::env::set_current_dir(original_dir).unwrap();

        let path = result.unwrap().unwrap();
        assert!(path.ends_with(".shipflow/shipflow.yml"));
    }

    #[test]
    #[serial]
    fn test_find_settings_file_env_var() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("custom.yaml");
        fs::write(&config_path, "log_level: trace\n").unwrap();

        let result = temp_env::with_var(CONFIG_PATH_ENV, Some(&config_path), find_settings_file);
        assert_eq!(result.unwrap(), Some(config_path));
    }

    #[test]
    #[serial]
    fn test_find_settings_file_env_var_missing() {
        let result = temp_env::with_var(
            CONFIG_PATH_ENV,
            Some("/nonexistent/shipflow.yaml"),
            find_settings_file,
        );

        match result {
            Err(ConfigError::SettingsFileNotFound(path)) => {
                assert!(path.ends_with("shipflow.yaml"));
            }
            other => panic!("Expected SettingsFileNotFound, got {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_load_settings_applies_env_overrides() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("shipflow.yaml");
        fs::write(&config_path, "log_level: info\nreports:\n  junit_dir: build/reports\n")
            .unwrap();

        let settings = temp_env::with_vars(
            [
                (CONFIG_PATH_ENV, Some(config_path.to_str().unwrap())),
                ("SHIPFLOW_LOG", Some("debug")),
                ("SHIPFLOW_COMPOSE_COMMAND", None),
                ("SHIPFLOW_REPORT_DIR", None),
            ],
            load_settings,
        )
        .unwrap();

        assert_eq!(settings.log_level.as_deref(), Some("debug"));
        assert_eq!(
            settings.reports.junit_dir,
            Some(PathBuf::from("build/reports"))
        );
    }
}
