//! パイプラインコンテキスト

use super::image::ImageSpec;
use super::test_result::TestResult;
use std::collections::BTreeMap;

/// 開始時刻を記録するメタデータキー
pub const STARTED_AT_KEY: &str = "pipeline.started_at";

/// パイプライン全体を流れる状態
///
/// 不変な値型。`with_*` はすべて新しいインスタンスを返し、
/// 呼び出し元のインスタンスは変更しない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineContext {
    pipeline_name: String,
    built_image: Option<ImageSpec>,
    build_completed: bool,
    test_completed: bool,
    test_result: Option<TestResult>,
    applied_tags: Vec<String>,
    metadata: BTreeMap<String, String>,
}

impl PipelineContext {
    pub fn new(pipeline_name: impl Into<String>) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert(STARTED_AT_KEY.to_string(), chrono::Utc::now().to_rfc3339());

        Self {
            pipeline_name: pipeline_name.into(),
            built_image: None,
            build_completed: false,
            test_completed: false,
            test_result: None,
            applied_tags: Vec::new(),
            metadata,
        }
    }

    pub fn pipeline_name(&self) -> &str {
        &self.pipeline_name
    }

    pub fn built_image(&self) -> Option<&ImageSpec> {
        self.built_image.as_ref()
    }

    pub fn build_completed(&self) -> bool {
        self.build_completed
    }

    pub fn test_completed(&self) -> bool {
        self.test_completed
    }

    pub fn test_result(&self) -> Option<&TestResult> {
        self.test_result.as_ref()
    }

    pub fn applied_tags(&self) -> &[String] {
        &self.applied_tags
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// メタデータを追加（同じキーは上書き）
    #[must_use]
    pub fn with_metadata(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.metadata.insert(key.into(), value.into());
        next
    }

    /// ビルド済みイメージを記録し、ビルド完了とする
    ///
    /// 一度設定されたイメージは置き換えない。
    #[must_use]
    pub fn with_built_image(&self, image: ImageSpec) -> Self {
        let mut next = self.clone();
        match &self.built_image {
            Some(existing) if *existing != image => {
                tracing::warn!(
                    "Pipeline '{}' already has built image '{}'; ignoring '{}'",
                    self.pipeline_name,
                    existing.name,
                    image.name
                );
            }
            Some(_) => {}
            None => next.built_image = Some(image),
        }
        next.build_completed = true;
        next
    }

    #[must_use]
    pub fn with_applied_tag(&self, tag: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.applied_tags.push(tag.into());
        next
    }

    /// タグを順序どおりに追加（重複はそのまま残す）
    #[must_use]
    pub fn with_applied_tags<I, S>(&self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut next = self.clone();
        next.applied_tags.extend(tags.into_iter().map(Into::into));
        next
    }

    /// テスト結果を記録し、テスト完了とする
    #[must_use]
    pub fn with_test_result(&self, result: TestResult) -> Self {
        let mut next = self.clone();
        next.test_result = Some(result);
        next.test_completed = true;
        next
    }
}
