//! Bounded execution of one test body against a freshly started cluster.
//!
//! A run goes through four steps: options are applied to a default
//! [`CtlCtx`], the cluster is started, the body runs on its own task racing
//! the deadline, and teardown stops the cluster. An optional offline body
//! runs after teardown against the retained data directory.

use std::any::Any;
use std::backtrace::Backtrace;
use std::future::Future;
use std::panic;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::task::JoinError;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::CtlCtx;
use super::CtlOption;
use super::SharedEnv;
use crate::async_task::spawn_task;
#[cfg(not(test))]
use crate::logger::enable_logger;
use crate::ClusterHandle;
use crate::ClusterLauncher;
use crate::Error;
use crate::HarnessError;
use crate::HarnessSettings;
use crate::ProcessCluster;
use crate::Result;

pub(crate) type TestFn = Box<dyn FnOnce(CtlCtx) -> BoxFuture<'static, Result<()>> + Send>;

/// Install the process-wide log subscriber. Safe to call from every test.
pub fn before_test() {
    // unit tests install tracing-test's subscriber instead
    #[cfg(not(test))]
    enable_logger();
}

/// Builder for one bounded test run.
///
/// ```no_run
/// use ctl_e2e::ctl::with_quorum;
/// use ctl_e2e::ctl::CtlTest;
/// # async fn run(launcher: &dyn ctl_e2e::cluster::ClusterLauncher) -> ctl_e2e::Result<()> {
/// CtlTest::new(|cx| async move { cx.ctl_v3_put("foo", "bar").await })
///     .options(vec![with_quorum()])
///     .run(launcher)
///     .await
/// # }
/// ```
pub struct CtlTest {
    test_fn: TestFn,
    offline_fn: Option<TestFn>,
    opts: Vec<CtlOption>,
    settings: Option<HarnessSettings>,
}

impl CtlTest {
    pub fn new<F, Fut>(test_fn: F) -> Self
    where
        F: FnOnce(CtlCtx) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            test_fn: boxed(test_fn),
            offline_fn: None,
            opts: Vec::new(),
            settings: None,
        }
    }

    /// Body to run after teardown. Requesting one retains the data
    /// directory across cluster close.
    pub fn offline<F, Fut>(
        mut self,
        offline_fn: F,
    ) -> Self
    where
        F: FnOnce(CtlCtx) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.offline_fn = Some(boxed(offline_fn));
        self
    }

    pub fn options(
        mut self,
        opts: impl IntoIterator<Item = CtlOption>,
    ) -> Self {
        self.opts.extend(opts);
        self
    }

    /// Use `settings` instead of loading them from file and environment
    pub fn settings(
        mut self,
        settings: HarnessSettings,
    ) -> Self {
        self.settings = Some(settings);
        self
    }

    pub async fn run<L>(
        self,
        launcher: &L,
    ) -> Result<()>
    where
        L: ClusterLauncher + ?Sized,
    {
        before_test();

        let settings = match self.settings {
            Some(settings) => settings,
            None => HarnessSettings::load()?,
        };
        let mut cx = CtlCtx::new(settings)?;
        cx.apply_opts(self.opts);
        cx.derive_cluster_config(self.offline_fn.is_some());
        debug!("test context ready: {:?}", cx);

        let cluster = launcher.start(&cx.cfg).await.map_err(|e| {
            error!("could not start process cluster: {:?}", e);
            HarnessError::StartupFailure { source: Box::new(e) }
        })?;
        info!("process cluster started with {} member(s)", cx.cfg.cluster_size);
        cx.attach_cluster(ClusterHandle::new(cluster.clone(), cx.cfg.clone()));

        let mut teardown = Teardown::new(cluster, cx.env.clone());
        let outcome = run_with_deadline(&cx, self.test_fn).await;
        let teardown_result = teardown.run().await;

        match outcome {
            WorkerOutcome::Finished => teardown_result?,
            WorkerOutcome::Failed(e) => {
                suppress(teardown_result);
                return Err(e);
            }
            WorkerOutcome::TimedOut { timeout, dump } => {
                suppress(teardown_result);
                return Err(HarnessError::TimeoutFailure { timeout, dump }.into());
            }
            WorkerOutcome::Panicked(payload) => {
                suppress(teardown_result);
                panic::resume_unwind(payload);
            }
        }

        if let Some(offline_fn) = self.offline_fn {
            if cx.cfg.keep_data_dir {
                info!("running offline phase against {}", cx.data_dir.display());
                offline_fn(cx).await?;
            }
        }
        Ok(())
    }
}

/// Run `test_fn` against a cluster started by `launcher`
pub async fn test_ctl<L, F, Fut>(
    launcher: &L,
    test_fn: F,
    opts: Vec<CtlOption>,
) -> Result<()>
where
    L: ClusterLauncher + ?Sized,
    F: FnOnce(CtlCtx) -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    CtlTest::new(test_fn).options(opts).run(launcher).await
}

/// Like [`test_ctl`], then run `offline_fn` after the cluster is closed
pub async fn test_ctl_with_offline<L, F, Fut, G, GFut>(
    launcher: &L,
    test_fn: F,
    offline_fn: G,
    opts: Vec<CtlOption>,
) -> Result<()>
where
    L: ClusterLauncher + ?Sized,
    F: FnOnce(CtlCtx) -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
    G: FnOnce(CtlCtx) -> GFut + Send + 'static,
    GFut: Future<Output = Result<()>> + Send + 'static,
{
    CtlTest::new(test_fn)
        .offline(offline_fn)
        .options(opts)
        .run(launcher)
        .await
}

fn boxed<F, Fut>(f: F) -> TestFn
where
    F: FnOnce(CtlCtx) -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Box::new(move |cx| f(cx).boxed())
}

fn suppress(teardown_result: Result<()>) {
    if let Err(e) = teardown_result {
        error!("teardown failed while another failure is reported: {:?}", e);
    }
}

pub(crate) enum WorkerOutcome {
    Finished,
    Failed(Error),
    TimedOut { timeout: Duration, dump: String },
    Panicked(Box<dyn Any + Send + 'static>),
}

impl WorkerOutcome {
    fn from_join(joined: std::result::Result<Result<()>, JoinError>) -> Self {
        match joined {
            Ok(Ok(())) => WorkerOutcome::Finished,
            Ok(Err(e)) => WorkerOutcome::Failed(e),
            Err(e) if e.is_panic() => WorkerOutcome::Panicked(e.into_panic()),
            Err(e) => WorkerOutcome::Failed(Error::Fatal(format!("test body did not complete: {e}"))),
        }
    }
}

/// Race the body against the run's deadline.
///
/// On deadline the context's token is cancelled and the body gets the drain
/// grace period to return before its task is aborted.
pub(crate) async fn run_with_deadline(
    cx: &CtlCtx,
    test_fn: TestFn,
) -> WorkerOutcome {
    let timeout = cx.get_test_timeout();
    let mut worker: JoinHandle<Result<()>> = spawn_task("test body", test_fn(cx.clone()));

    tokio::select! {
        joined = &mut worker => {
            debug!("test body finished");
            WorkerOutcome::from_join(joined)
        }
        _ = sleep(timeout) => {
            let dump = timeout_dump(cx);
            error!("test timed out after {:?}\n{}", timeout, dump);

            cx.cancel.cancel();
            match tokio::time::timeout(cx.drain_grace, &mut worker).await {
                Ok(_) => info!("test body drained after cancellation"),
                Err(_) => {
                    warn!("test body still running after {:?}, aborting", cx.drain_grace);
                    worker.abort();
                    // Teardown must not race the aborted body.
                    if tokio::time::timeout(cx.drain_grace, &mut worker).await.is_err() {
                        error!("aborted test body did not stop within {:?}", cx.drain_grace);
                    }
                }
            }
            WorkerOutcome::TimedOut { timeout, dump }
        }
    }
}

fn timeout_dump(cx: &CtlCtx) -> String {
    format!("{:#?}\n{}", cx, Backtrace::force_capture())
}

/// Single-shot cleanup of a run: restore the environment, then close the
/// cluster. Repeated calls are no-ops.
pub(crate) struct Teardown {
    cluster: Option<Arc<dyn ProcessCluster>>,
    env: Option<SharedEnv>,
}

impl Teardown {
    pub(crate) fn new(
        cluster: Arc<dyn ProcessCluster>,
        env: Option<SharedEnv>,
    ) -> Self {
        Self {
            cluster: Some(cluster),
            env,
        }
    }

    pub(crate) async fn run(&mut self) -> Result<()> {
        if let Some(env) = self.env.take() {
            env.lock().restore();
        }

        if let Some(cluster) = &self.cluster {
            info!("closing test cluster...");
            cluster.close().await.map_err(|e| {
                error!("error closing cluster processes: {:?}", e);
                HarnessError::TeardownFailure { source: Box::new(e) }
            })?;
            self.cluster = None;
            info!("closed test cluster");
        }
        Ok(())
    }
}
