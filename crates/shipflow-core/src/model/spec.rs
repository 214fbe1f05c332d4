//! ステージ設定
//!
//! 各ステージの設定値。DSL 側で組み立てられ、エグゼキューターは読み取るだけ。

use super::hook::{Hook, TestResultHook};
use super::image::ImageSpec;
use crate::error::WorkflowError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Build ステージ設定
#[derive(Debug, Clone, Default)]
pub struct BuildSpec {
    pub image: Option<ImageSpec>,
    pub before_build: Option<Hook>,
    pub after_build: Option<Hook>,
}

impl BuildSpec {
    pub fn new(image: ImageSpec) -> Self {
        Self {
            image: Some(image),
            ..Default::default()
        }
    }
}

/// Test ステージ設定
#[derive(Debug, Clone, Default)]
pub struct TestSpec {
    /// テスト環境（compose スタック）名
    pub stack: Option<String>,
    /// テストを実行するタスクの識別子
    pub test_task: Option<String>,
    pub before_test: Option<Hook>,
    pub after_test: Option<TestResultHook>,
    /// タスクランナーに渡すタイムアウト
    pub timeout: Option<Duration>,
}

impl TestSpec {
    pub fn new(stack: impl Into<String>, test_task: impl Into<String>) -> Self {
        Self {
            stack: Some(stack.into()),
            test_task: Some(test_task.into()),
            ..Default::default()
        }
    }
}

/// テスト成功時の設定
#[derive(Debug, Clone, Default)]
pub struct SuccessSpec {
    pub additional_tags: Vec<String>,
    pub after_success: Option<Hook>,
    pub save: Option<SaveSpec>,
    pub publish: Option<PublishSpec>,
}

/// テスト失敗時の設定（Save / Publish は持たない）
#[derive(Debug, Clone, Default)]
pub struct FailureSpec {
    pub additional_tags: Vec<String>,
    pub after_failure: Option<Hook>,
}

/// 追加タグの有無を判定する共通インターフェース
pub trait TagsSpec {
    fn additional_tags(&self) -> &[String];
}

impl TagsSpec for SuccessSpec {
    fn additional_tags(&self) -> &[String] {
        &self.additional_tags
    }
}

impl TagsSpec for FailureSpec {
    fn additional_tags(&self) -> &[String] {
        &self.additional_tags
    }
}

/// 追加タグが設定されているか
pub fn has_additional_tags<S: TagsSpec>(spec: Option<&S>) -> bool {
    spec.is_some_and(|s| !s.additional_tags().is_empty())
}

/// Save が設定されているか
pub fn has_save_configured(spec: Option<&SuccessSpec>) -> bool {
    spec.is_some_and(|s| s.save.is_some())
}

/// Publish が設定されているか
pub fn has_publish_configured(spec: Option<&SuccessSpec>) -> bool {
    spec.is_some_and(|s| s.publish.is_some())
}

/// イメージ保存設定
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveSpec {
    /// 出力先。未指定の場合は既定のパス
    #[serde(default)]
    pub output_file: Option<PathBuf>,
    /// 圧縮方式。未指定の場合は無圧縮
    #[serde(default)]
    pub compression: Option<SaveCompression>,
}

/// `docker save` の圧縮方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveCompression {
    #[default]
    None,
    Gzip,
    Bzip2,
    Xz,
}

impl SaveCompression {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Gzip => "gzip",
            Self::Bzip2 => "bzip2",
            Self::Xz => "xz",
        }
    }

    /// 慣例的なファイル拡張子
    pub fn extension(&self) -> &'static str {
        match self {
            Self::None => "tar",
            Self::Gzip => "tar.gz",
            Self::Bzip2 => "tar.bz2",
            Self::Xz => "tar.xz",
        }
    }
}

impl fmt::Display for SaveCompression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SaveCompression {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "" => Ok(Self::None),
            "gzip" | "gz" => Ok(Self::Gzip),
            "bzip2" | "bz2" => Ok(Self::Bzip2),
            "xz" => Ok(Self::Xz),
            _ => Err(WorkflowError::InvalidCompression(s.to_string())),
        }
    }
}

/// イメージ公開設定
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishSpec {
    /// 公開先。空の場合はイメージ自身のリポジトリとタグに push する
    pub targets: Vec<PublishTarget>,
}

/// 公開先
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishTarget {
    pub name: String,
    /// レジストリの上書き
    pub registry: Option<String>,
    /// 名前空間の上書き
    pub namespace: Option<String>,
    /// タグ。空の場合はイメージのタグを使う
    pub tags: Vec<String>,
    /// 明示的な認証情報（未指定なら Docker の設定から解決）
    pub credentials: Option<RegistryCredentials>,
}

/// レジストリ認証情報
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RegistryCredentials {
    pub username: String,
    pub password: String,
    pub server_address: Option<String>,
}

impl fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("server_address", &self.server_address)
            .finish()
    }
}
