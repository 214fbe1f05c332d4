use shipflow_core::{ContainerEngine, ImageSpec, Result, WorkflowError};
use std::sync::Arc;

/// タグ付け
pub struct TagOperationExecutor {
    engine: Arc<dyn ContainerEngine>,
}

impl TagOperationExecutor {
    pub fn new(engine: Arc<dyn ContainerEngine>) -> Self {
        Self { engine }
    }

    /// 元イメージの参照 `[registry/][namespace/]name:firstTag`
    pub fn build_source_image_reference(image: &ImageSpec) -> Result<String> {
        image.reference()
    }

    /// 追加タグごとの参照
    ///
    /// レジストリ・名前空間・名前は元イメージと同じで、タグだけを差し替える。
    pub fn build_target_image_references(
        image: &ImageSpec,
        extra_tags: &[String],
    ) -> Result<Vec<String>> {
        // タグ未設定のイメージはここで弾く
        Self::build_source_image_reference(image)?;

        let repository = image.repository();
        extra_tags
            .iter()
            .map(|tag| {
                validate_tag(tag)?;
                Ok(format!("{}:{}", repository, tag))
            })
            .collect()
    }

    /// 追加タグを付与し、付与したタグを順序どおりに返す
    pub async fn apply(&self, image: &ImageSpec, tags: &[String]) -> Result<Vec<String>> {
        let source = Self::build_source_image_reference(image)?;
        let targets = Self::build_target_image_references(image, tags)?;

        for target in &targets {
            tracing::info!("Tagging {} as {}", source, target);
            self.engine.tag_image(&source, target).await?;
        }

        Ok(tags.to_vec())
    }
}

/// タグのバリデーション
///
/// Docker タグの制約:
/// - 128文字以下
/// - 英数字、ピリオド、ハイフン、アンダースコアのみ
/// - 先頭はピリオドまたはハイフンではない
pub fn validate_tag(tag: &str) -> Result<()> {
    if tag.is_empty() {
        return Err(WorkflowError::InvalidTag("(empty)".to_string()));
    }

    if tag.len() > 128 {
        return Err(WorkflowError::InvalidTag(format!(
            "Tag too long ({} characters, max 128)",
            tag.len()
        )));
    }

    if tag.starts_with('.') || tag.starts_with('-') {
        return Err(WorkflowError::InvalidTag(tag.to_string()));
    }

    if let Some(c) = tag
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && *c != '.' && *c != '-' && *c != '_')
    {
        return Err(WorkflowError::InvalidTag(format!(
            "Invalid character '{}' in tag: {}",
            c, tag
        )));
    }

    Ok(())
}
