use relvault_e2e_tests::{
    create_test_config, files_under, init_tracing, write_test_config, MockGitHub,
};
use relvault_lib::cli::{resolve_command, run_backup, Command, ResolvedCommand, RunParams};
use relvault_lib::config::RepoTarget;
use relvault_lib::error::RelvaultError;
use relvault_lib::state::StateStore;

fn build_run_params(config_path: &str) -> RunParams {
    let command = Command::Run {
        config_path: config_path.to_string(),
        download_dir: None,
        max_attempts: None,
    };
    match resolve_command(command).expect("Failed to resolve run command") {
        ResolvedCommand::Run(params) => params,
        _ => unreachable!("Resolved command type mismatch"),
    }
}

#[tokio::test]
async fn test_exhausted_retries_hold_state_at_prior_release() {
    init_tracing();

    let server = MockGitHub::start().await;
    let downloads = tempfile::tempdir().unwrap();
    let config = create_test_config(&server, downloads.path(), &["acme/tool"]);

    let repo = RepoTarget::parse("acme/tool").unwrap();
    let state_path = config.state_path();
    let mut store = StateStore::load(&state_path).unwrap();
    store.set_last(&repo, "v1.0").unwrap();
    drop(store);

    server.set_latest_release(
        "acme/tool",
        server.release_json("v1.1", &[("tool.tar.gz", 1000)]),
    );
    server.set_asset_error("tool.tar.gz", 500);

    let (_config_dir, config_path) = write_test_config(&config).unwrap();
    let err = run_backup(build_run_params(&config_path))
        .await
        .expect_err("A failed artifact must fail the run");

    assert!(matches!(
        err,
        RelvaultError::IncompleteBackup {
            failed_repositories: 1,
            total_repositories: 1,
        }
    ));
    assert_eq!(server.asset_hits(), 3, "Each attempt hits the asset route once");

    let store = StateStore::load(&state_path).unwrap();
    assert_eq!(
        store.get_last(&repo),
        Some("v1.0"),
        "State must stay at the prior release after a partial failure"
    );
    assert!(
        !downloads.path().join("acme/tool/v1.1/tool.tar.gz").exists(),
        "No artifact should appear at the final path"
    );
}

#[tokio::test]
async fn test_size_mismatch_leaves_no_file_at_final_path() {
    init_tracing();

    let server = MockGitHub::start().await;
    let downloads = tempfile::tempdir().unwrap();
    let config = create_test_config(&server, downloads.path(), &["acme/tool"]);

    // Metadata declares 1000 bytes; the server only ever delivers 500.
    server.set_latest_release(
        "acme/tool",
        server.release_json("v1.1", &[("tool.tar.gz", 1000)]),
    );
    server.set_asset("tool.tar.gz", vec![7u8; 500]);

    let (_config_dir, config_path) = write_test_config(&config).unwrap();
    let err = run_backup(build_run_params(&config_path))
        .await
        .expect_err("A truncated artifact must fail the run");
    assert!(matches!(err, RelvaultError::IncompleteBackup { .. }));

    let release_dir = downloads.path().join("acme/tool/v1.1");
    assert!(
        !release_dir.join("tool.tar.gz").exists(),
        "Truncated download must never be visible at the final path"
    );
    let partials: Vec<_> = files_under(&release_dir)
        .into_iter()
        .filter(|path| path.extension().is_some_and(|ext| ext == "part"))
        .collect();
    assert!(partials.is_empty(), "leftover partial files: {:?}", partials);

    let store = StateStore::load(&config.state_path()).unwrap();
    let repo = RepoTarget::parse("acme/tool").unwrap();
    assert_eq!(store.get_last(&repo), None, "State must not advance");
}

#[tokio::test]
async fn test_one_failed_asset_does_not_abort_siblings() {
    init_tracing();

    let server = MockGitHub::start().await;
    let downloads = tempfile::tempdir().unwrap();
    let config = create_test_config(&server, downloads.path(), &["acme/tool"]);

    server.set_latest_release(
        "acme/tool",
        server.release_json("v1.1", &[("good.tar.gz", 16), ("bad.tar.gz", 16)]),
    );
    server.set_asset("good.tar.gz", vec![1u8; 16]);
    server.set_asset_error("bad.tar.gz", 503);

    let (_config_dir, config_path) = write_test_config(&config).unwrap();
    let err = run_backup(build_run_params(&config_path))
        .await
        .expect_err("The release as a whole is incomplete");
    assert!(matches!(err, RelvaultError::IncompleteBackup { .. }));

    assert!(
        downloads.path().join("acme/tool/v1.1/good.tar.gz").exists(),
        "The sibling asset should still be downloaded"
    );

    let store = StateStore::load(&config.state_path()).unwrap();
    let repo = RepoTarget::parse("acme/tool").unwrap();
    assert_eq!(store.get_last(&repo), None);
}

#[tokio::test]
async fn test_auth_error_aborts_the_whole_run() {
    init_tracing();

    let server = MockGitHub::start().await;
    let downloads = tempfile::tempdir().unwrap();
    let config = create_test_config(
        &server,
        downloads.path(),
        &["acme/alpha", "acme/beta", "acme/gamma"],
    );

    server.set_release_error("acme/alpha", 401);
    server.set_latest_release("acme/beta", server.release_json("v1.0", &[]));
    server.set_latest_release("acme/gamma", server.release_json("v1.0", &[]));

    let (_config_dir, config_path) = write_test_config(&config).unwrap();
    let err = run_backup(build_run_params(&config_path))
        .await
        .expect_err("An auth failure is fatal");

    assert!(matches!(err, RelvaultError::Auth { .. }));
    assert_eq!(
        server.release_hits(),
        1,
        "Repositories after the auth failure must not be checked"
    );
}

#[tokio::test]
async fn test_transient_check_failure_skips_only_that_repository() {
    init_tracing();

    let server = MockGitHub::start().await;
    let downloads = tempfile::tempdir().unwrap();
    let config = create_test_config(&server, downloads.path(), &["acme/flaky", "acme/stable"]);

    server.set_release_error("acme/flaky", 502);
    server.set_latest_release(
        "acme/stable",
        server.release_json("v2.0", &[("stable.bin", 8)]),
    );
    server.set_asset("stable.bin", vec![9u8; 8]);

    let (_config_dir, config_path) = write_test_config(&config).unwrap();
    let err = run_backup(build_run_params(&config_path))
        .await
        .expect_err("The flaky repository still fails the run");

    assert!(matches!(
        err,
        RelvaultError::IncompleteBackup {
            failed_repositories: 1,
            total_repositories: 2,
        }
    ));

    assert!(
        downloads.path().join("acme/stable/v2.0/stable.bin").exists(),
        "Other repositories proceed past a transient failure"
    );
    let store = StateStore::load(&config.state_path()).unwrap();
    assert_eq!(
        store.get_last(&RepoTarget::parse("acme/stable").unwrap()),
        Some("v2.0")
    );
    assert_eq!(store.get_last(&RepoTarget::parse("acme/flaky").unwrap()), None);
}
