//! ビルドコンテキスト

use crate::error::{EngineError, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use shipflow_core::BuildConfig;
use std::path::{Path, PathBuf};
use tar::Builder;

/// コンテキストサイズの警告しきい値
const MAX_CONTEXT_SIZE: usize = 500 * 1024 * 1024;

/// 解決済みのビルド入力
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInputs {
    pub context: PathBuf,
    pub dockerfile: PathBuf,
}

impl BuildInputs {
    /// ビルド設定からコンテキストと Dockerfile を解決する
    ///
    /// - context 未指定: `base_dir`
    /// - dockerfile 未指定: `<context>/Dockerfile`
    /// - dockerfile が相対パスならコンテキストからの相対
    pub fn resolve(config: Option<&BuildConfig>, base_dir: &Path) -> Result<Self> {
        let context = match config.and_then(|c| c.context.as_ref()) {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => base_dir.join(path),
            None => base_dir.to_path_buf(),
        };
        if !context.is_dir() {
            return Err(EngineError::ContextNotFound(context));
        }

        let dockerfile = match config.and_then(|c| c.dockerfile.as_ref()) {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => context.join(path),
            None => context.join("Dockerfile"),
        };
        if !dockerfile.is_file() {
            return Err(EngineError::DockerfileNotFound(dockerfile));
        }

        Ok(Self {
            context,
            dockerfile,
        })
    }
}

pub struct ContextBuilder;

impl ContextBuilder {
    /// ビルドコンテキストを tar.gz アーカイブとして作成
    ///
    /// Dockerfile はどこにあってもアーカイブのルートに `Dockerfile` として入る。
    pub fn create_context(context_path: &Path, dockerfile_path: &Path) -> Result<Vec<u8>> {
        tracing::debug!("Creating build context from: {}", context_path.display());

        let dockerfile_content = std::fs::read(dockerfile_path)?;

        let mut archive_data = Vec::new();
        {
            let encoder = GzEncoder::new(&mut archive_data, Compression::default());
            let mut tar = Builder::new(encoder);

            tar.append_dir_all(".", context_path)?;

            let mut header = tar::Header::new_gnu();
            header.set_path("Dockerfile").map_err(|e| {
                EngineError::InvalidConfig(format!("Failed to set Dockerfile path: {}", e))
            })?;
            header.set_size(dockerfile_content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            tar.append(&header, &dockerfile_content[..])?;

            tar.into_inner()?.finish()?;
        }

        tracing::debug!("Build context created: {} bytes", archive_data.len());
        if archive_data.len() > MAX_CONTEXT_SIZE {
            tracing::warn!(
                "警告: ビルドコンテキストが大きすぎます（{}MB）\n\
                 .dockerignoreファイルで不要なファイルを除外することを推奨します。",
                archive_data.len() / 1024 / 1024
            );
        }

        Ok(archive_data)
    }
}
