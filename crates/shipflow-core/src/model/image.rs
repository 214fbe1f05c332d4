//! イメージ定義

use crate::error::{Result, WorkflowError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// ビルド対象イメージの識別情報
///
/// 指定方法は2通り:
/// - `registry` / `namespace` / `name` / `tags` を個別に指定し、
///   `[registry/][namespace/]name:tag` に組み立てる
/// - 外部から与えられた参照文字列 `source_ref` をそのまま使う
///
/// 両方の指定は設定レイヤーで弾かれる前提なので、ここでは
/// `source_ref` が優先される。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSpec {
    /// イメージ名（タスク名の導出にも使う）
    pub name: String,
    /// レジストリホスト（例: ghcr.io, localhost:5000）
    #[serde(default)]
    pub registry: Option<String>,
    /// 名前空間（例: myorg）
    #[serde(default)]
    pub namespace: Option<String>,
    /// タグ。先頭がビルド時のタグになる
    #[serde(default)]
    pub tags: Vec<String>,
    /// 外部参照（例: ghcr.io/myorg/app:1.0）
    #[serde(default)]
    pub source_ref: Option<String>,
    /// ビルド設定
    #[serde(default)]
    pub build: Option<BuildConfig>,
}

/// ビルド入力
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// ビルドコンテキストのパス。未指定の場合はカレントディレクトリ
    #[serde(default)]
    pub context: Option<PathBuf>,
    /// Dockerfileのパス（コンテキストからの相対パス）
    #[serde(default)]
    pub dockerfile: Option<PathBuf>,
    /// ビルド引数
    #[serde(default)]
    pub args: HashMap<String, String>,
    /// マルチステージビルドのターゲット
    #[serde(default)]
    pub target: Option<String>,
    /// キャッシュ無効化フラグ
    #[serde(default)]
    pub no_cache: bool,
}

impl ImageSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// 外部参照からイメージを作成
    pub fn from_source_ref(name: impl Into<String>, source_ref: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_ref: Some(source_ref.into()),
            ..Default::default()
        }
    }

    pub fn with_registry(mut self, registry: impl Into<String>) -> Self {
        self.registry = Some(registry.into());
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_build(mut self, build: BuildConfig) -> Self {
        self.build = Some(build);
        self
    }

    /// タグを除いたリポジトリ部分 `[registry/][namespace/]name`
    pub fn repository(&self) -> String {
        if let Some(source_ref) = &self.source_ref {
            return split_image_tag(source_ref).0;
        }
        repository_for(
            self.registry.as_deref(),
            self.namespace.as_deref(),
            &self.name,
        )
    }

    /// 正規化されたイメージ参照
    ///
    /// `source_ref` が指定されていればそのまま返す。
    /// それ以外は先頭のタグを使って組み立てる。
    pub fn reference(&self) -> Result<String> {
        if let Some(source_ref) = &self.source_ref {
            return Ok(source_ref.clone());
        }

        let tag = self.tags.first().ok_or_else(|| WorkflowError::InvalidImage {
            image: self.name.clone(),
            message: "no tags configured".to_string(),
        })?;

        Ok(format!("{}:{}", self.repository(), tag))
    }
}

/// `[registry/][namespace/]name` を組み立てる（空のセグメントは区切りごと省略）
pub fn repository_for(registry: Option<&str>, namespace: Option<&str>, name: &str) -> String {
    [registry, namespace, Some(name)]
        .into_iter()
        .flatten()
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// イメージ名とタグを分離
///
/// # Examples
/// - `ghcr.io/org/app:v1.0` -> `("ghcr.io/org/app", "v1.0")`
/// - `ghcr.io/org/app` -> `("ghcr.io/org/app", "latest")`
/// - `localhost:5000/app:dev` -> `("localhost:5000/app", "dev")`
/// - `ghcr.io/org/app:v1.0@sha256:...` -> `("ghcr.io/org/app", "v1.0")`
pub fn split_image_tag(image: &str) -> (String, String) {
    // ダイジェスト部分はタグの判定に含めない
    let image = image.split_once('@').map_or(image, |(name, _)| name);

    if let Some(pos) = image.rfind(':') {
        let potential_tag = &image[pos + 1..];
        let potential_image = &image[..pos];

        // `localhost:5000/app` のようにレジストリのポートなら : の後に / が続く
        if !potential_tag.contains('/') {
            return (potential_image.to_string(), potential_tag.to_string());
        }
    }

    (image.to_string(), "latest".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_full() {
        let image = ImageSpec::new("myapp")
            .with_registry("ghcr.io")
            .with_namespace("myorg")
            .with_tags(["v1.2.3"]);
        assert_eq!(image.reference().unwrap(), "ghcr.io/myorg/myapp:v1.2.3");
    }

    #[test]
    fn test_reference_name_only() {
        let image = ImageSpec::new("myapp").with_tags(["1.0.0", "latest"]);
        assert_eq!(image.reference().unwrap(), "myapp:1.0.0");
    }

    #[test]
    fn test_reference_registry_without_namespace() {
        let image = ImageSpec::new("myapp")
            .with_registry("localhost:5000")
            .with_tags(["dev"]);
        assert_eq!(image.reference().unwrap(), "localhost:5000/myapp:dev");
    }

    #[test]
    fn test_reference_source_ref_verbatim() {
        let image = ImageSpec::from_source_ref("app", "docker.io/library/nginx:1.27");
        assert_eq!(image.reference().unwrap(), "docker.io/library/nginx:1.27");
        assert_eq!(image.repository(), "docker.io/library/nginx");
    }

    #[test]
    fn test_reference_without_tags() {
        let image = ImageSpec::new("myapp");
        let err = image.reference().unwrap_err();
        assert!(err.to_string().contains("no tags configured"));
    }

    #[test]
    fn test_repository_skips_empty_segments() {
        assert_eq!(repository_for(Some(""), Some("org"), "app"), "org/app");
        assert_eq!(repository_for(None, None, "app"), "app");
    }

    #[test]
    fn test_split_image_tag_with_tag() {
        let (image, tag) = split_image_tag("ghcr.io/org/app:v1.0");
        assert_eq!(image, "ghcr.io/org/app");
        assert_eq!(tag, "v1.0");
    }

    #[test]
    fn test_split_image_tag_without_tag() {
        let (image, tag) = split_image_tag("ghcr.io/org/app");
        assert_eq!(image, "ghcr.io/org/app");
        assert_eq!(tag, "latest");
    }

    #[test]
    fn test_split_image_tag_with_port() {
        let (image, tag) = split_image_tag("localhost:5000/app");
        assert_eq!(image, "localhost:5000/app");
        assert_eq!(tag, "latest");
    }

    #[test]
    fn test_split_image_tag_with_digest() {
        let digest = "sha256:4f53cda18c2baa0c0354bb5f9a3ecbe5ed12ab4d8e11ba873c2f11161202b945";

        let (image, tag) = split_image_tag(&format!("ghcr.io/org/app@{}", digest));
        assert_eq!(image, "ghcr.io/org/app");
        assert_eq!(tag, "latest");

        let (image, tag) = split_image_tag(&format!("localhost:5000/app:v2@{}", digest));
        assert_eq!(image, "localhost:5000/app");
        assert_eq!(tag, "v2");
    }

    #[test]
    fn test_repository_of_digest_source_ref() {
        let image = ImageSpec::from_source_ref("app", "docker.io/library/nginx@sha256:abc123");
        assert_eq!(image.repository(), "docker.io/library/nginx");
    }

    #[test]
    fn test_split_image_tag_with_port_and_tag() {
        let (image, tag) = split_image_tag("localhost:5000/app:dev");
        assert_eq!(image, "localhost:5000/app");
        assert_eq!(tag, "dev");
    }
}
