//! ステージフック
//!
//! ステージの決められた位置で同期的に呼び出されるコールバック。
//! フックが返したエラーはそのままパイプラインを中断させる。

use super::test_result::TestResult;
use std::fmt;
use std::sync::Arc;

type HookFn = dyn Fn() -> anyhow::Result<()> + Send + Sync;
type ResultHookFn = dyn Fn(&TestResult) -> anyhow::Result<()> + Send + Sync;

/// 引数なしのフック（beforeBuild, afterSuccess など）
#[derive(Clone)]
pub struct Hook(Arc<HookFn>);

impl Hook {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self) -> anyhow::Result<()> {
        (self.0)()
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Hook(..)")
    }
}

/// テスト結果を受け取るフック（afterTest）
#[derive(Clone)]
pub struct TestResultHook(Arc<ResultHookFn>);

impl TestResultHook {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&TestResult) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, result: &TestResult) -> anyhow::Result<()> {
        (self.0)(result)
    }
}

impl fmt::Debug for TestResultHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TestResultHook(..)")
    }
}

/// 任意のフックを実行し、どこで呼ばれたかをログに残す
pub fn run_hook(name: &str, hook: Option<&Hook>) -> anyhow::Result<()> {
    if let Some(hook) = hook {
        tracing::debug!("Running {} hook", name);
        hook.call()?;
    }
    Ok(())
}
