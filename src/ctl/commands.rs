use super::CtlCtx;
use crate::spawn::spawn_with_expects_cancellable;
use crate::Result;

impl CtlCtx {
    /// Spawn `args` with the run's staged environment and wait for a line
    /// containing `expected`. The child is killed if the run times out.
    pub async fn spawn_with_expect(
        &self,
        args: Vec<String>,
        expected: &str,
    ) -> Result<()> {
        self.spawn_with_expects(args, &[expected]).await
    }

    pub async fn spawn_with_expects(
        &self,
        args: Vec<String>,
        expected: &[&str],
    ) -> Result<()> {
        let env = self.export_env();
        spawn_with_expects_cancellable(&args, &env, expected, &self.cancel).await
    }

    /// `version` must report `expected`
    pub async fn ctl_v3_version(
        &self,
        expected: &str,
    ) -> Result<()> {
        let mut args = self.prefix_args();
        args.push("version".into());
        self.spawn_with_expect(args, expected).await
    }

    pub async fn ctl_v3_put(
        &self,
        key: &str,
        value: &str,
    ) -> Result<()> {
        let mut args = self.prefix_args();
        args.extend(["put".to_string(), key.to_string(), value.to_string()]);
        self.spawn_with_expect(args, "OK").await
    }
}
