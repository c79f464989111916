use std::time::Duration;

use ctl_e2e::before_test;
use ctl_e2e::with_cfg;
use ctl_e2e::with_drain_grace;
use ctl_e2e::with_etcdutl;
use ctl_e2e::with_flag_by_env;
use ctl_e2e::with_quorum;
use ctl_e2e::with_test_timeout;
use ctl_e2e::with_user;
use ctl_e2e::ClusterConfig;
use ctl_e2e::CtlTest;
use ctl_e2e::Error;
use ctl_e2e::HarnessError;
use serial_test::serial;

use crate::common::ScriptLauncher;
use crate::common::VERSION;

#[test]
fn test_before_test_is_idempotent() {
    before_test();
    before_test();
}

#[tokio::test]
#[serial]
async fn test_ctl_v3_put_with_flags() {
    let launcher = ScriptLauncher::new();

    CtlTest::new(|cx| async move {
        cx.ctl_v3_put("foo", "bar").await?;

        let mut args = cx.prefix_args();
        args.push("get".to_string());
        cx.spawn_with_expect(args, "--endpoints=http://127.0.0.1:2379 get")
            .await
    })
    .settings(launcher.settings())
    .run(&launcher)
    .await
    .unwrap();

    let started = launcher.started();
    assert_eq!(started.len(), 1);
    assert_eq!(started[0].closes(), 1);
    assert_eq!(started[0].config.cluster_size, 1);
    assert!(started[0].config.initial_corrupt_check);
}

#[tokio::test]
#[serial]
async fn test_ctl_v3_version_with_env() {
    std::env::remove_var("ETCDCTL_ENDPOINTS");
    let launcher = ScriptLauncher::new();

    CtlTest::new(|cx| async move {
        cx.ctl_v3_version(VERSION).await?;

        let mut args = cx.prefix_args();
        assert_eq!(args.len(), 1);
        args.push("endpoint".to_string());
        cx.spawn_with_expects(
            args,
            &[
                "ETCDCTL_DIAL_TIMEOUT=7s",
                "ETCDCTL_ENDPOINTS=http://127.0.0.1:2379",
                "ETCDCTL_USER=root:pass",
            ],
        )
        .await
    })
    .options(vec![with_flag_by_env(), with_user("root", "pass")])
    .settings(launcher.settings())
    .run(&launcher)
    .await
    .unwrap();

    assert!(std::env::var("ETCDCTL_ENDPOINTS").is_err());
    assert!(std::env::var("ETCDCTL_USER").is_err());
}

#[tokio::test]
#[serial]
async fn test_quorum_reaches_every_member() {
    let launcher = ScriptLauncher::new();

    CtlTest::new(|cx| async move {
        let mut args = cx.prefix_args();
        args.push("member".to_string());
        args.push("list".to_string());
        cx.spawn_with_expect(
            args,
            "--endpoints=http://127.0.0.1:2379,http://127.0.0.1:12379,http://127.0.0.1:22379",
        )
        .await
    })
    .options(vec![with_cfg(ClusterConfig::no_tls()), with_quorum()])
    .settings(launcher.settings())
    .run(&launcher)
    .await
    .unwrap();

    assert_eq!(launcher.started()[0].config.cluster_size, 3);
}

#[tokio::test]
#[serial]
async fn test_utility_prefix_uses_offline_binary() {
    let launcher = ScriptLauncher::new();

    CtlTest::new(|cx| async move {
        let mut args = cx.prefix_args_utl();
        args.extend(["snapshot".to_string(), "status".to_string()]);
        cx.spawn_with_expect(args, "etcdutl snapshot status").await
    })
    .options(vec![with_etcdutl()])
    .settings(launcher.settings())
    .run(&launcher)
    .await
    .unwrap();
}

#[tokio::test]
#[serial]
async fn test_timeout_kills_hanging_command() {
    let launcher = ScriptLauncher::new();

    let err = CtlTest::new(|cx| async move {
        let mut args = cx.prefix_args();
        args.push("hang".to_string());
        cx.spawn_with_expect(args, "never printed").await
    })
    .options(vec![
        with_test_timeout(Duration::from_millis(300)),
        with_drain_grace(Duration::from_secs(5)),
    ])
    .settings(launcher.settings())
    .run(&launcher)
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Harness(HarnessError::TimeoutFailure { .. })));
    assert_eq!(launcher.started()[0].closes(), 1);
}

#[tokio::test]
#[serial]
async fn test_offline_phase_inspects_retained_data_dir() {
    let launcher = ScriptLauncher::new();

    CtlTest::new(|cx| async move { cx.ctl_v3_put("k", "v").await })
        .offline(|cx| async move {
            assert!(cx.data_dir.join("member").join("snap").is_dir());
            Ok(())
        })
        .settings(launcher.settings())
        .run(&launcher)
        .await
        .unwrap();

    let cluster = &launcher.started()[0];
    assert!(cluster.config.keep_data_dir);
    assert!(cluster.root().join("member-0").is_dir());
}

#[tokio::test]
#[serial]
async fn test_data_dir_removed_without_offline_phase() {
    let launcher = ScriptLauncher::new();

    CtlTest::new(|_cx| async move { Ok(()) })
        .settings(launcher.settings())
        .run(&launcher)
        .await
        .unwrap();

    assert!(!launcher.started()[0].root().join("member-0").exists());
}
