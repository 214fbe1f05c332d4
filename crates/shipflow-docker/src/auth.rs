//! レジストリ認証
//!
//! 公開先に明示された認証情報を優先し、なければ Docker の config.json
//! （`auths` → `credsStore`）から解決して bollard の `DockerCredentials` に変換する。

use crate::error::{EngineError, Result};
use base64::Engine;
use bollard::auth::DockerCredentials;
use serde::Deserialize;
use shipflow_core::RegistryCredentials;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Docker Hub のレジストリ名
pub const DOCKER_HUB: &str = "docker.io";
/// config.json 上の Docker Hub のキー
const DOCKER_HUB_INDEX: &str = "https://index.docker.io/v1/";

/// Docker config.json の構造
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DockerConfig {
    #[serde(default)]
    auths: HashMap<String, AuthEntry>,
    /// credential helper 名 (例: "osxkeychain", "desktop")
    #[serde(default)]
    creds_store: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthEntry {
    /// Base64エンコードされた "username:password"
    auth: Option<String>,
}

/// credential helper からのレスポンス
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CredentialResponse {
    username: String,
    secret: String,
}

/// レジストリ認証を管理
#[derive(Debug, Clone)]
pub struct RegistryAuth {
    config_path: PathBuf,
}

impl Default for RegistryAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryAuth {
    /// `DOCKER_CONFIG`、なければ ~/.docker の config.json を使う
    pub fn new() -> Self {
        let config_path = std::env::var("DOCKER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .map(|h| h.join(".docker"))
                    .unwrap_or_else(|| PathBuf::from(".docker"))
            })
            .join("config.json");

        Self { config_path }
    }

    pub fn with_config_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// push に使う認証情報を決める
    ///
    /// 明示的な認証情報があればそれを使い、なければ config.json から探す。
    pub async fn resolve(
        &self,
        reference: &str,
        explicit: Option<&RegistryCredentials>,
    ) -> Result<Option<DockerCredentials>> {
        match explicit {
            Some(creds) => {
                let registry = creds
                    .server_address
                    .clone()
                    .unwrap_or_else(|| extract_registry(reference));
                tracing::debug!("Using explicit credentials for {}", registry);
                Ok(Some(DockerCredentials {
                    username: Some(creds.username.clone()),
                    password: Some(creds.password.clone()),
                    serveraddress: Some(registry),
                    ..Default::default()
                }))
            }
            None => self.get_credentials(reference).await,
        }
    }

    /// イメージ参照からレジストリの認証情報を取得
    ///
    /// config.json がない、または該当するエントリがない場合は `Ok(None)`。
    pub async fn get_credentials(&self, reference: &str) -> Result<Option<DockerCredentials>> {
        let registry = extract_registry(reference);

        if !self.config_path.exists() {
            tracing::debug!("Docker config.json not found at {:?}", self.config_path);
            return Ok(None);
        }

        let config = self.load_docker_config()?;

        if let Some(auth_entry) = lookup_auth(&config, &registry)
            && let Some(auth_b64) = &auth_entry.auth
            && let Some(creds) = decode_auth(auth_b64, &registry)?
        {
            tracing::debug!("Found credentials in auths for {}", registry);
            return Ok(Some(creds));
        }

        if let Some(helper) = &config.creds_store {
            tracing::debug!("Trying credential helper: {}", helper);
            match get_from_helper(helper, &registry).await {
                Ok(Some(creds)) => return Ok(Some(creds)),
                Ok(None) => {}
                Err(e) => tracing::debug!("Credential helper unavailable: {}", e),
            }
        }

        tracing::debug!("No credentials found for {}", registry);
        Ok(None)
    }

    fn load_docker_config(&self) -> Result<DockerConfig> {
        let content =
            std::fs::read_to_string(&self.config_path).map_err(|e| EngineError::AuthFailed {
                registry: self.config_path.display().to_string(),
                message: format!("Failed to read config.json: {}", e),
            })?;

        serde_json::from_str(&content).map_err(|e| EngineError::AuthFailed {
            registry: self.config_path.display().to_string(),
            message: format!("Failed to parse config.json: {}", e),
        })
    }
}

/// イメージ参照からレジストリを抽出
///
/// # Examples
/// - `ghcr.io/org/app:tag` -> `ghcr.io`
/// - `myuser/app:tag` -> `docker.io`
/// - `localhost:5000/app` -> `localhost:5000`
pub fn extract_registry(reference: &str) -> String {
    match reference.split_once('/') {
        // 先頭のセグメントに `.` か `:` があればレジストリ
        Some((first, _)) if first.contains('.') || first.contains(':') || first == "localhost" => {
            first.to_string()
        }
        _ => DOCKER_HUB.to_string(),
    }
}

fn lookup_auth<'a>(config: &'a DockerConfig, registry: &str) -> Option<&'a AuthEntry> {
    config.auths.get(registry).or_else(|| {
        (registry == DOCKER_HUB)
            .then(|| config.auths.get(DOCKER_HUB_INDEX))
            .flatten()
    })
}

fn decode_auth(auth_b64: &str, registry: &str) -> Result<Option<DockerCredentials>> {
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(auth_b64)
        .map_err(|e| EngineError::AuthFailed {
            registry: registry.to_string(),
            message: format!("Failed to decode auth: {}", e),
        })?;

    let auth_str = String::from_utf8(decoded).map_err(|e| EngineError::AuthFailed {
        registry: registry.to_string(),
        message: format!("Invalid UTF-8 in auth: {}", e),
    })?;

    Ok(auth_str
        .split_once(':')
        .map(|(username, password)| DockerCredentials {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
            serveraddress: Some(registry.to_string()),
            ..Default::default()
        }))
}

async fn get_from_helper(helper: &str, registry: &str) -> Result<Option<DockerCredentials>> {
    run_helper(&format!("docker-credential-{}", helper), registry).await
}

async fn run_helper(helper_cmd: &str, registry: &str) -> Result<Option<DockerCredentials>> {
    let mut child = Command::new(helper_cmd)
        .arg("get")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| EngineError::AuthFailed {
            registry: registry.to_string(),
            message: format!("Failed to run {}: {}", helper_cmd, e),
        })?;

    // レジストリ名を stdin で渡す
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(registry.as_bytes()).await?;
    }

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| EngineError::AuthFailed {
            registry: registry.to_string(),
            message: format!("Credential helper failed: {}", e),
        })?;

    if !output.status.success() {
        tracing::debug!(
            "Credential helper returned error for {}: {}",
            registry,
            String::from_utf8_lossy(&output.stderr)
        );
        return Ok(None);
    }

    let response: CredentialResponse =
        serde_json::from_slice(&output.stdout).map_err(|e| EngineError::AuthFailed {
            registry: registry.to_string(),
            message: format!("Failed to parse credential helper response: {}", e),
        })?;

    Ok(Some(DockerCredentials {
        username: Some(response.username),
        password: Some(response.secret),
        serveraddress: Some(registry.to_string()),
        ..Default::default()
    }))
}
