//! ステージエグゼキューター
//!
//! 各ステージは受け取ったコンテキストを変更せず、新しいコンテキストを返す。

mod build;
mod conditional;
mod outcome;

pub use build::*;
pub use conditional::*;
pub use outcome::*;
pub use test::*;
