use super::tag::TagOperationExecutor;
use shipflow_config::SaveSettings;
use shipflow_core::{
    ContainerEngine, ImageSpec, PipelineContext, Result, SaveCompression, SaveSpec, WorkflowError,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 保存先が未指定の場合のファイル名（拡張子は圧縮方式から決まる）
pub const DEFAULT_ARCHIVE_STEM: &str = "image";
/// 保存先が未指定の場合のディレクトリ
pub const DEFAULT_OUTPUT_DIR: &str = "docker-images";

pub const SAVED_FILE_KEY: &str = "saved.file";
pub const SAVED_COMPRESSION_KEY: &str = "saved.compression";

/// イメージのアーカイブ保存
pub struct SaveOperationExecutor {
    engine: Arc<dyn ContainerEngine>,
    default_dir: PathBuf,
}

impl SaveOperationExecutor {
    pub fn new(engine: Arc<dyn ContainerEngine>) -> Self {
        Self::with_output_dir(engine, DEFAULT_OUTPUT_DIR)
    }

    pub fn with_output_dir(engine: Arc<dyn ContainerEngine>, dir: impl AsRef<Path>) -> Self {
        Self {
            engine,
            default_dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn from_settings(engine: Arc<dyn ContainerEngine>, settings: &SaveSettings) -> Self {
        Self::with_output_dir(engine, &settings.output_dir)
    }

    /// 保存対象の参照（タグ付けの元参照と同じ規則）
    pub fn build_image_reference(image: &ImageSpec) -> Result<String> {
        TagOperationExecutor::build_source_image_reference(image)
    }

    /// 出力先。未指定なら `docker-images/image.tar`（gzip なら `image.tar.gz`）
    pub fn resolve_output_file(&self, spec: &SaveSpec) -> PathBuf {
        spec.output_file.clone().unwrap_or_else(|| {
            let compression = Self::resolve_compression(spec);
            self.default_dir
                .join(format!("{}.{}", DEFAULT_ARCHIVE_STEM, compression.extension()))
        })
    }

    /// 圧縮方式。未指定なら無圧縮
    pub fn resolve_compression(spec: &SaveSpec) -> SaveCompression {
        spec.compression.unwrap_or_default()
    }

    pub async fn execute(
        &self,
        spec: &SaveSpec,
        context: &PipelineContext,
    ) -> Result<PipelineContext> {
        let image = context
            .built_image()
            .ok_or(WorkflowError::MissingBuiltImage { operation: "save" })?;

        let reference = Self::build_image_reference(image)?;
        let output = self.resolve_output_file(spec);
        let compression = Self::resolve_compression(spec);

        tracing::info!(
            "Saving {} to {} (compression: {})",
            reference,
            output.display(),
            compression
        );
        self.engine
            .save_image(&reference, &output, compression)
            .await?;

        Ok(context
            .with_metadata(SAVED_FILE_KEY, output.display().to_string())
            .with_metadata(SAVED_COMPRESSION_KEY, compression.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{EngineCall, RecordingEngine};

    fn built_context() -> PipelineContext {
        PipelineContext::new("release")
            .with_built_image(ImageSpec::new("myapp").with_tags(["1.0.0"]))
    }

    #[test]
    fn test_resolve_compression_default() {
        assert_eq!(
            SaveOperationExecutor::resolve_compression(&SaveSpec::default()),
            SaveCompression::None
        );
    }

    #[test]
    fn test_resolve_compression_explicit() {
        let spec = SaveSpec {
            compression: Some("gzip".parse().unwrap()),
            ..Default::default()
        };
        let compression = SaveOperationExecutor::resolve_compression(&spec);
        assert_eq!(compression, SaveCompression::Gzip);
        assert_eq!(compression.as_str(), "gzip");
    }

    #[test]
    fn test_resolve_output_file() {
        let executor = SaveOperationExecutor::new(RecordingEngine::new());
        assert_eq!(
            executor.resolve_output_file(&SaveSpec::default()),
            PathBuf::from("docker-images/image.tar")
        );

        let spec = SaveSpec {
            output_file: Some(PathBuf::from("out/myapp.tar.gz")),
            ..Default::default()
        };
        assert_eq!(
            executor.resolve_output_file(&spec),
            PathBuf::from("out/myapp.tar.gz")
        );
    }

    #[test]
    fn test_default_output_file_follows_compression() {
        let executor = SaveOperationExecutor::new(RecordingEngine::new());
        let with = |compression| SaveSpec {
            compression: Some(compression),
            ..Default::default()
        };

        assert_eq!(
            executor.resolve_output_file(&with(SaveCompression::Gzip)),
            PathBuf::from("docker-images/image.tar.gz")
        );
        assert_eq!(
            executor.resolve_output_file(&with(SaveCompression::Bzip2)),
            PathBuf::from("docker-images/image.tar.bz2")
        );
        assert_eq!(
            executor.resolve_output_file(&with(SaveCompression::Xz)),
            PathBuf::from("docker-images/image.tar.xz")
        );
    }

    #[test]
    fn test_resolve_output_file_from_settings() {
        let settings = SaveSettings {
            output_dir: PathBuf::from("build/images"),
        };
        let executor = SaveOperationExecutor::from_settings(RecordingEngine::new(), &settings);
        assert_eq!(
            executor.resolve_output_file(&SaveSpec::default()),
            PathBuf::from("build/images/image.tar")
        );
    }

    #[tokio::test]
    async fn test_execute_saves_built_image() {
        let engine = RecordingEngine::new();
        let executor = SaveOperationExecutor::new(engine.clone());
        let spec = SaveSpec {
            output_file: Some(PathBuf::from("out/app.tar.xz")),
            compression: Some(SaveCompression::Xz),
        };

        let context = executor.execute(&spec, &built_context()).await.unwrap();

        assert_eq!(
            engine.calls(),
            [EngineCall::Save {
                reference: "myapp:1.0.0".to_string(),
                output: PathBuf::from("out/app.tar.xz"),
                compression: SaveCompression::Xz,
            }]
        );
        assert_eq!(context.metadata_value(SAVED_FILE_KEY), Some("out/app.tar.xz"));
        assert_eq!(context.metadata_value(SAVED_COMPRESSION_KEY), Some("xz"));
    }

    #[tokio::test]
    async fn test_execute_without_built_image() {
        let engine = RecordingEngine::new();
        let executor = SaveOperationExecutor::new(engine.clone());

        let err = executor
            .execute(&SaveSpec::default(), &PipelineContext::new("release"))
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::MissingBuiltImage { .. }));
        assert!(err.to_string().contains("no built image"));
        assert!(engine.calls().is_empty());
    }
}
