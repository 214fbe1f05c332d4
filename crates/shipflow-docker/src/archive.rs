//! `docker save` 相当のアーカイブ書き出し
//!
//! gzip は flate2 で、bzip2 / xz は外部コマンド（`bzip2 -c` / `xz -c`）に
//! パイプして圧縮する。

use crate::error::{EngineError, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use shipflow_core::SaveCompression;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};

/// イメージアーカイブの書き込み先
pub enum ArchiveSink {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
    External {
        program: &'static str,
        child: Child,
        stdin: ChildStdin,
    },
}

impl ArchiveSink {
    /// 出力ファイルを作成する（親ディレクトリも作成）
    pub fn create(path: &Path, compression: SaveCompression) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;

        match compression {
            SaveCompression::None => Ok(Self::Plain(BufWriter::new(file))),
            SaveCompression::Gzip => Ok(Self::Gzip(GzEncoder::new(
                BufWriter::new(file),
                Compression::default(),
            ))),
            SaveCompression::Bzip2 => Self::spawn("bzip2", file),
            SaveCompression::Xz => Self::spawn("xz", file),
        }
    }

    fn spawn(program: &'static str, file: File) -> Result<Self> {
        let mut child = Command::new(program)
            .arg("-c")
            .stdin(Stdio::piped())
            .stdout(Stdio::from(file))
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                EngineError::InvalidConfig(format!("Failed to run '{}' for compression: {}", program, e))
            })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            EngineError::InvalidConfig(format!("'{}' stdin is not available", program))
        })?;

        Ok(Self::External {
            program,
            child,
            stdin,
        })
    }

    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        match self {
            Self::Plain(writer) => writer.write_all(chunk)?,
            Self::Gzip(encoder) => encoder.write_all(chunk)?,
            Self::External { stdin, .. } => stdin.write_all(chunk).await?,
        }
        Ok(())
    }

    /// 書き込みを完了する。外部コマンドの場合は終了を待つ
    pub async fn finish(self) -> Result<()> {
        match self {
            Self::Plain(mut writer) => writer.flush()?,
            Self::Gzip(encoder) => encoder.finish()?.flush()?,
            Self::External {
                program,
                child,
                mut stdin,
            } => {
                stdin.shutdown().await?;
                drop(stdin);

                let output = child.wait_with_output().await?;
                if !output.status.success() {
                    return Err(EngineError::InvalidConfig(format!(
                        "'{}' exited with {}: {}",
                        program,
                        output.status,
                        String::from_utf8_lossy(&output.stderr).trim()
                    )));
                }
            }
        }
        Ok(())
    }
}

/// 書き込み中のアーカイブ。完了前に破棄されたら途中のファイルを消す
pub struct PendingArchive {
    path: PathBuf,
    sink: Option<ArchiveSink>,
}

impl PendingArchive {
    pub fn create(path: &Path, compression: SaveCompression) -> Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            sink: Some(ArchiveSink::create(path, compression)?),
        })
    }

    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        match self.sink.as_mut() {
            Some(sink) => sink.write_chunk(chunk).await,
            None => Err(EngineError::InvalidConfig("archive already finished".to_string())),
        }
    }

    pub async fn finish(mut self) -> Result<()> {
        if let Some(sink) = self.sink.take() {
            if let Err(e) = sink.finish().await {
                std::fs::remove_file(&self.path).ok();
                return Err(e);
            }
        }
        Ok(())
    }
}

impl Drop for PendingArchive {
    fn drop(&mut self) {
        if self.sink.take().is_some() {
            tracing::debug!("Removing incomplete archive {}", self.path.display());
            std::fs::remove_file(&self.path).ok();
        }
    }
}
