//! モデル定義
//!
//! パイプライン全体で受け渡される状態と、各ステージが読み取る設定値を定義します。

mod context;
mod hook;
mod image;
mod spec;
mod test_result;

// Re-exports
pub use context::*;
pub use hook::*;
pub use image::*;
pub use spec::*;
pub use test_result::*;
