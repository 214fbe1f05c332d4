//! イメージ操作
//!
//! 参照文字列を組み立て、実際の操作はコンテナエンジンに委譲する。

mod publish;
mod save;
mod tag;

pub use publish::*;
pub use save::*;
pub use tag::*;
