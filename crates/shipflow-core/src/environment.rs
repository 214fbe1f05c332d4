//! テスト環境オーケストレーター

use async_trait::async_trait;

/// 名前付きのマルチサービス環境を起動・停止する
///
/// `up` / `down` はどちらも冪等であること。起動していない環境の
/// `down` は成功として扱う。
#[async_trait]
pub trait EnvironmentOrchestrator: Send + Sync {
    async fn up(&self, environment: &str) -> anyhow::Result<()>;
    async fn down(&self, environment: &str) -> anyhow::Result<()>;
}
