//! プロセス内タスクランナー

use anyhow::Context;
use async_trait::async_trait;
use shipflow_core::{TaskAction, TaskRef, TaskRunner, UnitOutcome};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// 識別子で登録されたタスクを実行するランナー
#[derive(Clone, Default)]
pub struct LocalTaskRunner {
    tasks: BTreeMap<String, Arc<dyn TaskAction>>,
}

impl LocalTaskRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// タスクを登録（同じ識別子は置き換え）
    pub fn register(&mut self, id: impl Into<String>, action: Arc<dyn TaskAction>) -> &mut Self {
        let id = id.into();
        if self.tasks.insert(id.clone(), action).is_some() {
            tracing::debug!("Replacing task '{}'", id);
        }
        self
    }

    pub fn with_task(mut self, id: impl Into<String>, action: Arc<dyn TaskAction>) -> Self {
        self.register(id, action);
        self
    }

    pub fn task_ids(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }
}

impl Extend<(String, Arc<dyn TaskAction>)> for LocalTaskRunner {
    fn extend<T: IntoIterator<Item = (String, Arc<dyn TaskAction>)>>(&mut self, iter: T) {
        for (id, action) in iter {
            self.register(id, action);
        }
    }
}

impl fmt::Debug for LocalTaskRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalTaskRunner")
            .field("tasks", &self.tasks.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[async_trait]
impl TaskRunner for LocalTaskRunner {
    fn find(&self, id: &str) -> Option<TaskRef> {
        self.tasks.contains_key(id).then(|| TaskRef::new(id))
    }

    async fn run(&self, task: &TaskRef, timeout: Option<Duration>) -> anyhow::Result<UnitOutcome> {
        let action = self
            .tasks
            .get(task.id())
            .with_context(|| format!("Task '{}' is not registered", task))?;

        tracing::debug!("Running task '{}'", task);
        match timeout {
            Some(limit) => tokio::time::timeout(limit, action.execute())
                .await
                .map_err(|_| anyhow::anyhow!("Task '{}' timed out after {:?}", task, limit))?,
            None => action.execute().await,
        }
    }
}

/// クロージャをタスクとして登録するためのラッパー
pub struct FnTask<F>(F);

impl<F> FnTask<F>
where
    F: Fn() -> anyhow::Result<UnitOutcome> + Send + Sync + 'static,
{
    pub fn new(f: F) -> Arc<Self> {
        Arc::new(Self(f))
    }
}

#[async_trait]
impl<F> TaskAction for FnTask<F>
where
    F: Fn() -> anyhow::Result<UnitOutcome> + Send + Sync,
{
    async fn execute(&self) -> anyhow::Result<UnitOutcome> {
        (self.0)()
    }
}

/// 外部コマンドを実行するタスク
///
/// 終了コードが 0 以外でもエラーにはせず、失敗した結果として返す。
/// 標準出力は結果の出力として保持する。
#[derive(Debug, Clone)]
pub struct CommandTask {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    envs: Vec<(String, String)>,
}

impl CommandTask {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            envs: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl TaskAction for CommandTask {
    async fn execute(&self) -> anyhow::Result<UnitOutcome> {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args).kill_on_drop(true);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }

        tracing::info!("Running: {}", self.display());
        let output = cmd
            .output()
            .await
            .with_context(|| format!("Failed to run '{}'", self.display()))?;

        if !output.status.success() {
            tracing::debug!(
                "'{}' exited with {}: {}",
                self.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr)
            );
        }

        Ok(UnitOutcome {
            success: output.status.success(),
            output: Some(String::from_utf8_lossy(&output.stdout).into_owned()),
        })
    }
}
