//! bollard による ContainerEngine 実装

// Bollard 0.19 の非推奨APIを一時的に使用
#![allow(deprecated)]

use crate::archive::PendingArchive;
use crate::auth::RegistryAuth;
use crate::context::{BuildInputs, ContextBuilder};
use crate::error::{EngineError, Result};
use async_trait::async_trait;
use bollard::Docker;
use bollard::image::{BuildImageOptions, PushImageOptions, TagImageOptions};
use bollard::models::{BuildInfo, PushImageInfo};
use bytes::Bytes;
use colored::Colorize;
use futures_util::StreamExt;
use http_body_util::{Either, Full};
use shipflow_core::{
    ContainerEngine, ImageSpec, RegistryCredentials, SaveCompression, split_image_tag,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Docker デーモンに対してビルド・タグ付け・保存・push を行うエンジン
pub struct DockerEngine {
    docker: Docker,
    auth: RegistryAuth,
    base_dir: PathBuf,
}

impl DockerEngine {
    pub fn new(docker: Docker) -> Self {
        Self {
            docker,
            auth: RegistryAuth::new(),
            base_dir: PathBuf::from("."),
        }
    }

    /// ローカルのデフォルト設定（DOCKER_HOST またはソケット）で接続
    pub fn connect() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()?;
        Ok(Self::new(docker))
    }

    pub fn with_auth(mut self, auth: RegistryAuth) -> Self {
        self.auth = auth;
        self
    }

    /// 相対パスのビルドコンテキストを解決する基準ディレクトリ
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub async fn build(&self, image: &ImageSpec) -> Result<()> {
        let reference = image
            .reference()
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        let inputs = BuildInputs::resolve(image.build.as_ref(), &self.base_dir)?;
        let context_data = ContextBuilder::create_context(&inputs.context, &inputs.dockerfile)?;

        let config = image.build.clone().unwrap_or_default();
        tracing::info!("Building image: {}", reference);

        let build_args: HashMap<&str, &str> = config
            .args
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        let options = BuildImageOptions {
            dockerfile: "Dockerfile",
            t: reference.as_str(),
            buildargs: build_args,
            target: config.target.as_deref().unwrap_or(""),
            nocache: config.no_cache,
            rm: true,
            forcerm: true,
            ..Default::default()
        };
        tracing::debug!("Build options: {:?}", options);

        let body = Full::new(Bytes::from(context_data));
        let mut stream = self
            .docker
            .build_image(options, None, Some(Either::Left(body)));

        while let Some(msg) = stream.next().await {
            handle_build_output(msg?)?;
        }

        // 2つ目以降のタグを付与
        let repository = image.repository();
        for tag in image.tags.iter().skip(1) {
            self.tag(&reference, &format!("{}:{}", repository, tag))
                .await?;
        }

        tracing::info!("Successfully built: {}", reference);
        Ok(())
    }

    pub async fn tag(&self, source: &str, target: &str) -> Result<()> {
        let (repo, tag) = split_image_tag(target);
        tracing::debug!("Tagging {} as {}:{}", source, repo, tag);

        let options = TagImageOptions { repo, tag };
        self.docker.tag_image(source, Some(options)).await?;
        Ok(())
    }

    pub async fn save(
        &self,
        reference: &str,
        output: &Path,
        compression: SaveCompression,
    ) -> Result<()> {
        tracing::info!("Saving {} to {}", reference, output.display());

        let mut archive = PendingArchive::create(output, compression)?;
        let mut stream = self.docker.export_image(reference);
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| EngineError::SaveFailed {
                reference: reference.to_string(),
                message: e.to_string(),
            })?;
            archive.write_chunk(&chunk).await?;
        }
        archive.finish().await?;

        println!("  {} {}", "✓".green(), output.display());
        Ok(())
    }

    pub async fn push(
        &self,
        reference: &str,
        credentials: Option<&RegistryCredentials>,
    ) -> Result<()> {
        let (repository, tag) = split_image_tag(reference);
        let credentials = self.auth.resolve(reference, credentials).await?;

        let options = PushImageOptions::<String> { tag };

        println!("  → {}", reference.cyan());
        let mut stream = self
            .docker
            .push_image(&repository, Some(options), credentials);

        let mut last_status = String::new();
        let mut error_message: Option<String> = None;

        while let Some(result) = stream.next().await {
            let info = result.map_err(|e| EngineError::PushFailed {
                reference: reference.to_string(),
                message: e.to_string(),
            })?;
            match info.error {
                Some(err) => error_message = Some(err),
                None => handle_push_progress(&info, &mut last_status),
            }
        }
        println!();

        match error_message {
            Some(message) => Err(EngineError::PushFailed {
                reference: reference.to_string(),
                message,
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ContainerEngine for DockerEngine {
    async fn build_image(&self, image: &ImageSpec) -> anyhow::Result<()> {
        Ok(self.build(image).await?)
    }

    async fn tag_image(&self, source: &str, target: &str) -> anyhow::Result<()> {
        Ok(self.tag(source, target).await?)
    }

    async fn save_image(
        &self,
        reference: &str,
        output: &Path,
        compression: SaveCompression,
    ) -> anyhow::Result<()> {
        Ok(self.save(reference, output, compression).await?)
    }

    async fn push_image(
        &self,
        reference: &str,
        credentials: Option<&RegistryCredentials>,
    ) -> anyhow::Result<()> {
        Ok(self.push(reference, credentials).await?)
    }
}

fn handle_build_output(output: BuildInfo) -> Result<()> {
    if let Some(stream) = output.stream {
        print!("{}", stream);
    }

    if let Some(error) = output.error {
        return Err(EngineError::BuildFailed(error));
    }

    if let Some(error_detail) = output.error_detail {
        let error_msg = error_detail
            .message
            .unwrap_or_else(|| "Unknown build error".to_string());
        return Err(EngineError::BuildFailed(error_msg));
    }

    if let Some(status) = output.status {
        println!("{}", status.cyan());
    }

    Ok(())
}

fn handle_push_progress(info: &PushImageInfo, last_status: &mut String) {
    let Some(status) = &info.status else {
        return;
    };
    let progress = info.progress.as_deref().unwrap_or("");

    match status.as_str() {
        "Pushing" => {
            use std::io::Write;
            print!("\r  ↑ {} {}     ", status, progress);
            std::io::stdout().flush().ok();
        }
        "Pushed" | "Layer already exists" => {
            println!("\r  {} {:<26}", "✓".green(), status);
        }
        // 準備中はノイズになるので表示しない
        "Preparing" | "Waiting" => {}
        _ => {
            if status != last_status {
                println!("\r  ℹ {}", status);
                *last_status = status.clone();
            }
        }
    }
}
