use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::CtlCtx;
use super::ScopedEnv;
use crate::ClusterConfig;
use crate::Result;

/// When an option runs relative to the others.
///
/// Structural options replace a whole sub-object of the context and run
/// first, so field-level overrides of that sub-object are never lost to a
/// later replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OptionStage {
    Structural,
    Field,
}

/// A named, total mutation of a [`CtlCtx`]
pub struct CtlOption {
    name: &'static str,
    stage: OptionStage,
    apply: Box<dyn FnOnce(&mut CtlCtx) + Send>,
}

impl CtlOption {
    fn structural(
        name: &'static str,
        apply: impl FnOnce(&mut CtlCtx) + Send + 'static,
    ) -> Self {
        Self {
            name,
            stage: OptionStage::Structural,
            apply: Box::new(apply),
        }
    }

    fn field(
        name: &'static str,
        apply: impl FnOnce(&mut CtlCtx) + Send + 'static,
    ) -> Self {
        Self {
            name,
            stage: OptionStage::Field,
            apply: Box::new(apply),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn stage(&self) -> OptionStage {
        self.stage
    }
}

impl fmt::Debug for CtlOption {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("CtlOption")
            .field("name", &self.name)
            .field("stage", &self.stage)
            .finish()
    }
}

impl CtlCtx {
    /// Apply structural options, then field options, each group in caller
    /// order. The initial corruption check is enabled afterwards whatever
    /// the options said.
    pub fn apply_opts(
        &mut self,
        mut opts: Vec<CtlOption>,
    ) {
        // stable: caller order survives within a stage
        opts.sort_by_key(CtlOption::stage);
        for opt in opts {
            debug!("applying option {} ({:?})", opt.name, opt.stage);
            (opt.apply)(self);
        }
        self.initial_corrupt_check = true;
    }
}

/// Replace the whole cluster shape
pub fn with_cfg(cfg: ClusterConfig) -> CtlOption {
    CtlOption::structural("with_cfg", move |cx| cx.cfg = cfg)
}

pub fn with_dial_timeout(timeout: Duration) -> CtlOption {
    CtlOption::field("with_dial_timeout", move |cx| cx.dial_timeout = timeout)
}

pub fn with_test_timeout(timeout: Duration) -> CtlOption {
    CtlOption::field("with_test_timeout", move |cx| cx.test_timeout = timeout)
}

/// Keep the shape's cluster size instead of shrinking to one member
pub fn with_quorum() -> CtlOption {
    CtlOption::field("with_quorum", |cx| cx.quorum = true)
}

pub fn with_interactive() -> CtlOption {
    CtlOption::field("with_interactive", |cx| cx.interactive = true)
}

pub fn with_quota(bytes: i64) -> CtlOption {
    CtlOption::field("with_quota", move |cx| cx.quota_backend_bytes = bytes)
}

pub fn with_compact_physical() -> CtlOption {
    CtlOption::field("with_compact_physical", |cx| cx.compact_physical = true)
}

pub fn with_initial_corrupt_check() -> CtlOption {
    CtlOption::field("with_initial_corrupt_check", |cx| cx.initial_corrupt_check = true)
}

pub fn with_corrupt_fn<F>(corrupt: F) -> CtlOption
where
    F: Fn(&Path) -> Result<()> + Send + Sync + 'static,
{
    CtlOption::field("with_corrupt_fn", move |cx| cx.corrupt_fn = Some(Arc::new(corrupt)))
}

pub fn with_no_strict_reconfig() -> CtlOption {
    CtlOption::field("with_no_strict_reconfig", |cx| cx.no_strict_reconfig = true)
}

pub fn with_api_prefix(prefix: impl Into<String>) -> CtlOption {
    let prefix = prefix.into();
    CtlOption::field("with_api_prefix", move |cx| cx.api_prefix = prefix)
}

/// Pass connection fields through `ETCDCTL_*` environment variables
/// instead of flags
pub fn with_flag_by_env() -> CtlOption {
    CtlOption::field("with_flag_by_env", |cx| cx.env = Some(ScopedEnv::shared()))
}

pub fn with_etcdutl() -> CtlOption {
    CtlOption::field("with_etcdutl", |cx| cx.etcdutl = true)
}

pub fn with_max_concurrent_streams(streams: u32) -> CtlOption {
    CtlOption::field("with_max_concurrent_streams", move |cx| {
        cx.cfg.max_concurrent_streams = streams
    })
}

pub fn with_snapshot_count(count: u64) -> CtlOption {
    CtlOption::field("with_snapshot_count", move |cx| cx.cfg.snapshot_count = count)
}

pub fn with_log_level(level: impl Into<String>) -> CtlOption {
    let level = level.into();
    CtlOption::field("with_log_level", move |cx| cx.cfg.log_level = level)
}

pub fn with_user(
    user: impl Into<String>,
    pass: impl Into<String>,
) -> CtlOption {
    let (user, pass) = (user.into(), pass.into());
    CtlOption::field("with_user", move |cx| {
        cx.user = user;
        cx.pass = pass;
    })
}

pub fn with_drain_grace(grace: Duration) -> CtlOption {
    CtlOption::field("with_drain_grace", move |cx| cx.drain_grace = grace)
}
