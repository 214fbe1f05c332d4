use super::tag::{TagOperationExecutor, validate_tag};
use shipflow_core::{
    ContainerEngine, ImageSpec, PipelineContext, PublishSpec, PublishTarget, Result,
    WorkflowError, repository_for, split_image_tag,
};
use std::sync::Arc;

pub const PUBLISHED_KEY: &str = "published";

/// レジストリへの公開
pub struct PublishOperationExecutor {
    engine: Arc<dyn ContainerEngine>,
}

impl PublishOperationExecutor {
    pub fn new(engine: Arc<dyn ContainerEngine>) -> Self {
        Self { engine }
    }

    /// 公開先ごとの参照
    ///
    /// レジストリ・名前空間は公開先の指定を優先し、未指定ならイメージの値を使う。
    /// タグは公開先の指定がなければイメージのタグ（外部参照ならそのタグ）。
    pub fn build_publish_references(
        image: &ImageSpec,
        target: &PublishTarget,
    ) -> Result<Vec<String>> {
        let repository = if target.registry.is_none() && target.namespace.is_none() {
            image.repository()
        } else {
            repository_for(
                target.registry.as_deref().or(image.registry.as_deref()),
                target.namespace.as_deref().or(image.namespace.as_deref()),
                &base_name(image),
            )
        };

        let tags = if !target.tags.is_empty() {
            target.tags.clone()
        } else if let Some(source_ref) = &image.source_ref {
            vec![split_image_tag(source_ref).1]
        } else {
            image.tags.clone()
        };

        if tags.is_empty() {
            return Err(WorkflowError::InvalidImage {
                image: image.name.clone(),
                message: "no tags configured".to_string(),
            });
        }

        tags.iter()
            .map(|tag| {
                validate_tag(tag)?;
                Ok(format!("{}:{}", repository, tag))
            })
            .collect()
    }

    pub async fn execute(
        &self,
        spec: &PublishSpec,
        context: &PipelineContext,
    ) -> Result<PipelineContext> {
        let image = context
            .built_image()
            .ok_or(WorkflowError::MissingBuiltImage {
                operation: "publish",
            })?;

        let source = TagOperationExecutor::build_source_image_reference(image)?;
        let default_target = [PublishTarget::default()];
        let targets = if spec.targets.is_empty() {
            &default_target[..]
        } else {
            &spec.targets[..]
        };

        let mut published = Vec::new();
        for target in targets {
            for reference in Self::build_publish_references(image, target)? {
                if reference != source {
                    self.engine.tag_image(&source, &reference).await?;
                }
                tracing::info!("Publishing {}", reference);
                self.engine
                    .push_image(&reference, target.credentials.as_ref())
                    .await?;
                published.push(reference);
            }
        }

        Ok(context.with_metadata(PUBLISHED_KEY, published.join(",")))
    }
}

/// リポジトリの最後のセグメント（外部参照の場合も含む）
fn base_name(image: &ImageSpec) -> String {
    match &image.source_ref {
        Some(source_ref) => {
            let (repository, _) = split_image_tag(source_ref);
            repository
                .rsplit('/')
                .next()
                .unwrap_or(&repository)
                .to_string()
        }
        None => image.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{EngineCall, RecordingEngine};
    use shipflow_core::RegistryCredentials;

    fn image() -> ImageSpec {
        ImageSpec::new("myapp").with_tags(["1.0.0", "latest"])
    }

    #[test]
    fn test_references_default_target() {
        let refs =
            PublishOperationExecutor::build_publish_references(&image(), &PublishTarget::default())
                .unwrap();
        assert_eq!(refs, ["myapp:1.0.0", "myapp:latest"]);
    }

    #[test]
    fn test_references_with_registry_override() {
        let target = PublishTarget {
            name: "ghcr".to_string(),
            registry: Some("ghcr.io".to_string()),
            namespace: Some("myorg".to_string()),
            tags: vec!["stable".to_string()],
            credentials: None,
        };
        let refs = PublishOperationExecutor::build_publish_references(&image(), &target).unwrap();
        assert_eq!(refs, ["ghcr.io/myorg/myapp:stable"]);
    }

    #[test]
    fn test_references_from_source_ref() {
        let image = ImageSpec::from_source_ref("app", "registry.local:5000/team/app:42");
        let target = PublishTarget {
            registry: Some("ghcr.io".to_string()),
            ..Default::default()
        };
        let refs = PublishOperationExecutor::build_publish_references(&image, &target).unwrap();
        assert_eq!(refs, ["ghcr.io/app:42"]);
    }

    #[test]
    fn test_references_without_tags() {
        let err = PublishOperationExecutor::build_publish_references(
            &ImageSpec::new("myapp"),
            &PublishTarget::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("no tags configured"));
    }

    #[tokio::test]
    async fn test_execute_tags_and_pushes() {
        let engine = RecordingEngine::new();
        let executor = PublishOperationExecutor::new(engine.clone());
        let credentials = RegistryCredentials {
            username: "bot".to_string(),
            password: "token".to_string(),
            server_address: Some("ghcr.io".to_string()),
        };
        let spec = PublishSpec {
            targets: vec![PublishTarget {
                name: "ghcr".to_string(),
                registry: Some("ghcr.io".to_string()),
                namespace: Some("myorg".to_string()),
                tags: vec!["1.0.0".to_string()],
                credentials: Some(credentials),
            }],
        };
        let context = PipelineContext::new("release").with_built_image(image());

        let context = executor.execute(&spec, &context).await.unwrap();

        assert_eq!(
            engine.calls(),
            [
                EngineCall::Tag {
                    source: "myapp:1.0.0".to_string(),
                    target: "ghcr.io/myorg/myapp:1.0.0".to_string(),
                },
                EngineCall::Push {
                    reference: "ghcr.io/myorg/myapp:1.0.0".to_string(),
                    authenticated: true,
                },
            ]
        );
        assert_eq!(
            context.metadata_value(PUBLISHED_KEY),
            Some("ghcr.io/myorg/myapp:1.0.0")
        );
    }

    #[tokio::test]
    async fn test_execute_default_target_skips_self_tag() {
        let engine = RecordingEngine::new();
        let executor = PublishOperationExecutor::new(engine.clone());
        let context = PipelineContext::new("release").with_built_image(image());

        executor
            .execute(&PublishSpec::default(), &context)
            .await
            .unwrap();

        assert_eq!(
            engine.calls(),
            [
                EngineCall::Push {
                    reference: "myapp:1.0.0".to_string(),
                    authenticated: false,
                },
                EngineCall::Tag {
                    source: "myapp:1.0.0".to_string(),
                    target: "myapp:latest".to_string(),
                },
                EngineCall::Push {
                    reference: "myapp:latest".to_string(),
                    authenticated: false,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_execute_without_built_image() {
        let engine = RecordingEngine::new();
        let executor = PublishOperationExecutor::new(engine.clone());

        let err = executor
            .execute(&PublishSpec::default(), &PipelineContext::new("release"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            WorkflowError::MissingBuiltImage {
                operation: "publish"
            }
        ));
        assert!(engine.calls().is_empty());
    }
}
