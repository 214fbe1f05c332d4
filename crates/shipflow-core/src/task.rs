//! タスク解決
//!
//! 論理的な操作（「イメージ X のビルド」など）を、タスクランナーに
//! 登録された実行単位へ解決する。

use crate::error::{Result, WorkflowError};
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

/// 操作の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskCategory {
    /// イメージのビルド（`dockerBuild<Name>`）
    Build,
    /// テスト環境の起動（`composeUp<Name>`）
    ComposeUp,
    /// テスト環境の停止（`composeDown<Name>`）
    ComposeDown,
    /// テストタスク（識別子をそのまま使う）
    Test,
}

impl TaskCategory {
    pub fn prefix(&self) -> &'static str {
        match self {
            TaskCategory::Build => "dockerBuild",
            TaskCategory::ComposeUp => "composeUp",
            TaskCategory::ComposeDown => "composeDown",
            TaskCategory::Test => "",
        }
    }

    /// 命名規約に従ったタスク識別子
    ///
    /// # Examples
    /// - `(Build, "myApp")` -> `dockerBuildMyApp`
    /// - `(ComposeUp, "integration")` -> `composeUpIntegration`
    pub fn task_name(&self, entity: &str) -> String {
        match self {
            TaskCategory::Test => entity.to_string(),
            _ => format!("{}{}", self.prefix(), capitalize(entity)),
        }
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskCategory::Build => write!(f, "build"),
            TaskCategory::ComposeUp => write!(f, "compose-up"),
            TaskCategory::ComposeDown => write!(f, "compose-down"),
            TaskCategory::Test => write!(f, "test"),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// 解決済みの実行単位への参照
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskRef {
    id: String,
}

impl TaskRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for TaskRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// 実行単位の結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitOutcome {
    pub success: bool,
    /// 取得できた出力（テストレポートなど）
    pub output: Option<String>,
}

impl UnitOutcome {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            output: None,
        }
    }

    pub fn failed() -> Self {
        Self {
            success: false,
            output: None,
        }
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }
}

/// タスクランナーに登録される実行単位
#[async_trait]
pub trait TaskAction: Send + Sync {
    async fn execute(&self) -> anyhow::Result<UnitOutcome>;
}

/// タスクランナー
///
/// 実行単位の検索と実行を担う。タイムアウトの強制もランナー側の責務。
#[async_trait]
pub trait TaskRunner: Send + Sync {
    /// 登録済みの実行単位を識別子で検索（副作用なし）
    fn find(&self, id: &str) -> Option<TaskRef>;

    /// 実行単位を実行
    async fn run(&self, task: &TaskRef, timeout: Option<Duration>) -> anyhow::Result<UnitOutcome>;
}

/// タスク解決
///
/// 呼び出し時点でランナーに登録されている実行単位だけを参照する純粋な検索。
pub struct TaskLookup<'a> {
    runner: &'a dyn TaskRunner,
}

impl<'a> TaskLookup<'a> {
    pub fn new(runner: &'a dyn TaskRunner) -> Self {
        Self { runner }
    }

    pub fn resolve(&self, category: TaskCategory, name: &str) -> Result<TaskRef> {
        let expected = category.task_name(name);
        tracing::debug!("Resolving {} task '{}' for '{}'", category, expected, name);

        self.runner
            .find(&expected)
            .ok_or_else(|| WorkflowError::TaskNotFound {
                category,
                expected,
                name: name.to_string(),
            })
    }
}
