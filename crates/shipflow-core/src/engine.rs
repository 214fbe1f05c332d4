//! コンテナエンジン

use crate::model::{ImageSpec, RegistryCredentials, SaveCompression};
use async_trait::async_trait;
use std::path::Path;

/// イメージのビルド・タグ付け・保存・公開を行うコンテナエンジン
///
/// 参照文字列の組み立てはパイプライン側で行い、エンジンは
/// 渡された参照に対して操作するだけ。
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// イメージをビルドし、`image.reference()` と全タグを付与する
    async fn build_image(&self, image: &ImageSpec) -> anyhow::Result<()>;

    /// `source` に `target` の参照を追加する
    async fn tag_image(&self, source: &str, target: &str) -> anyhow::Result<()>;

    /// イメージをアーカイブファイルとして保存
    async fn save_image(
        &self,
        reference: &str,
        output: &Path,
        compression: SaveCompression,
    ) -> anyhow::Result<()>;

    /// イメージをレジストリに push
    async fn push_image(
        &self,
        reference: &str,
        credentials: Option<&RegistryCredentials>,
    ) -> anyhow::Result<()>;
}
