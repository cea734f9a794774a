//! End-to-end runs of the bootstrapper against fake registry, spawner and
//! reporter, with payload downloads served by a mock HTTP server

use super::*;
use crate::launch::ARGV0_PLACEHOLDER;
use crate::payload::BackupOutcome;
use crate::report::{EXIT_LOOKUP_FAILED, EXIT_SUCCESS, LOOKUP_FAILURE_MESSAGE, SPAWN_FAILURE_MESSAGE};
use std::cell::RefCell;
use std::io;
use std::path::PathBuf;
use tempfile::{TempDir, tempdir};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

/// Registry stand-in answering per view and counting lookups
struct FakeStore {
    wow32: Option<String>,
    wow64: Option<String>,
    calls: RefCell<Vec<RegistryView>>,
}

impl FakeStore {
    fn new(wow32: Option<String>, wow64: Option<String>) -> Self {
        Self { wow32, wow64, calls: RefCell::new(Vec::new()) }
    }
}

impl InstallStore for FakeStore {
    fn read_string(&self, view: RegistryView, _key: &str, _value: &str) -> io::Result<String> {
        self.calls.borrow_mut().push(view);
        let hit = match view {
            RegistryView::Wow32 => self.wow32.clone(),
            RegistryView::Wow64 => self.wow64.clone(),
        };
        hit.ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "value not found"))
    }
}

/// Spawner that records launch specs and optionally fails with an OS code
#[derive(Default)]
struct FakeSpawner {
    launched: RefCell<Vec<LaunchSpec>>,
    fail_with: Option<i32>,
}

impl Spawner for FakeSpawner {
    fn spawn(&self, spec: &LaunchSpec) -> io::Result<u32> {
        self.launched.borrow_mut().push(spec.clone());
        match self.fail_with {
            Some(code) => Err(io::Error::from_raw_os_error(code)),
            None => Ok(4242),
        }
    }
}

#[derive(Default)]
struct CapturingReporter {
    messages: RefCell<Vec<String>>,
}

impl Reporter for CapturingReporter {
    fn show(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}

/// Mock payload server answering all three files
async fn payload_server() -> MockServer {
    let mock_server = MockServer::start().await;
    for (file, body) in [
        ("/dvmod.exe", &b"MZ loader"[..]),
        ("/doorstop_config.ini", &b"[UnityDoorstop]\nenabled=true\n"[..]),
        ("/version.dll", &b"MZ proxy"[..]),
    ] {
        Mock::given(method("GET"))
            .and(path(file))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
            .mount(&mock_server)
            .await;
    }
    mock_server
}

fn config_for(server: &MockServer) -> BootstrapConfig {
    BootstrapConfig::builder()
        .base_url(server.uri())
        .game_executable("Title.exe")
        .origin("dvmod://mod/couplers-overhaul")
        .build()
        .unwrap()
}

/// Scratch installation directory and its registry-style string
fn install_dir() -> (TempDir, String) {
    let temp_dir = tempdir().unwrap();
    let raw = format!("{}{}", temp_dir.path().display(), std::path::MAIN_SEPARATOR);
    (temp_dir, raw)
}

async fn requested_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect()
}

#[tokio::test]
async fn test_installed_loader_launches_without_downloads() {
    let server = payload_server().await;
    let (temp_dir, raw) = install_dir();
    std::fs::write(temp_dir.path().join("dvmod.exe"), b"loader").unwrap();

    let store = FakeStore::new(Some(raw.clone()), None);
    let spawner = FakeSpawner::default();
    let reporter = CapturingReporter::default();
    let bootstrapper = Bootstrapper::new(
        config_for(&server),
        &store,
        HttpClient::from_config(&config_for(&server)).unwrap(),
        &spawner,
        &reporter,
    );

    let report = bootstrapper.run().await;

    assert_eq!(report.exit_code, EXIT_SUCCESS);
    assert_eq!(*store.calls.borrow(), vec![RegistryView::Wow32]);
    assert!(requested_paths(&server).await.is_empty());
    assert!(matches!(report.payload, Some(PayloadOutcome::AlreadyInstalled { .. })));

    let launched = spawner.launched.borrow();
    assert_eq!(launched.len(), 1);
    assert_eq!(launched[0].executable, PathBuf::from(format!("{raw}Title.exe")));
    assert_eq!(launched[0].working_dir, PathBuf::from(&raw));
    assert!(reporter.messages.borrow().is_empty());
}

#[tokio::test]
async fn test_missing_installation_stops_before_network_and_spawn() {
    let server = payload_server().await;
    let store = FakeStore::new(None, None);
    let spawner = FakeSpawner::default();
    let reporter = CapturingReporter::default();
    let bootstrapper = Bootstrapper::new(
        config_for(&server),
        &store,
        HttpClient::from_config(&config_for(&server)).unwrap(),
        &spawner,
        &reporter,
    );

    let report = bootstrapper.run().await;

    assert_eq!(report.exit_code, EXIT_LOOKUP_FAILED);
    assert_ne!(report.exit_code, EXIT_SUCCESS);
    assert_eq!(*reporter.messages.borrow(), vec![LOOKUP_FAILURE_MESSAGE.to_string()]);
    assert_eq!(*store.calls.borrow(), vec![RegistryView::Wow32, RegistryView::Wow64]);
    assert!(requested_paths(&server).await.is_empty());
    assert!(spawner.launched.borrow().is_empty());
    assert!(report.install.is_none());
    assert!(report.payload.is_none());
}

#[tokio::test]
async fn test_fresh_install_backs_up_config_and_downloads_in_order() {
    let server = payload_server().await;
    let (temp_dir, raw) = install_dir();
    std::fs::write(temp_dir.path().join("doorstop_config.ini"), b"targetAssembly=BepInEx.dll").unwrap();

    // Only the 64-bit view knows the game here.
    let store = FakeStore::new(None, Some(raw.clone()));
    let spawner = FakeSpawner::default();
    let reporter = CapturingReporter::default();
    let bootstrapper = Bootstrapper::new(
        config_for(&server),
        &store,
        HttpClient::from_config(&config_for(&server)).unwrap(),
        &spawner,
        &reporter,
    );

    let report = bootstrapper.run().await;

    assert_eq!(report.exit_code, EXIT_SUCCESS);
    assert_eq!(report.install.as_ref().map(|p| p.as_str()), Some(raw.as_str()));
    assert_eq!(
        requested_paths(&server).await,
        vec!["/dvmod.exe", "/doorstop_config.ini", "/version.dll"]
    );
    assert_eq!(
        std::fs::read(temp_dir.path().join("doorstop_config.ini.old")).unwrap(),
        b"targetAssembly=BepInEx.dll"
    );
    assert_eq!(
        std::fs::read(temp_dir.path().join("doorstop_config.ini")).unwrap(),
        b"[UnityDoorstop]\nenabled=true\n"
    );
    assert!(temp_dir.path().join("dvmod.exe").exists());
    assert!(temp_dir.path().join("version.dll").exists());
    assert_eq!(spawner.launched.borrow().len(), 1);
}

#[tokio::test]
async fn test_download_failures_do_not_block_launch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let (_temp_dir, raw) = install_dir();

    let store = FakeStore::new(Some(raw), None);
    let spawner = FakeSpawner::default();
    let reporter = CapturingReporter::default();
    let bootstrapper = Bootstrapper::new(
        config_for(&server),
        &store,
        HttpClient::from_config(&config_for(&server)).unwrap(),
        &spawner,
        &reporter,
    );

    let report = bootstrapper.run().await;

    assert_eq!(report.exit_code, EXIT_SUCCESS);
    // One attempt per file, no retries.
    assert_eq!(requested_paths(&server).await.len(), 3);
    assert_eq!(spawner.launched.borrow().len(), 1);
    assert!(reporter.messages.borrow().is_empty());
}

#[tokio::test]
async fn test_spawn_failure_is_reported_with_success_status() {
    let server = payload_server().await;
    let (temp_dir, raw) = install_dir();
    std::fs::write(temp_dir.path().join("dvmod.exe"), b"loader").unwrap();

    let store = FakeStore::new(Some(raw), None);
    let spawner = FakeSpawner { fail_with: Some(5), ..Default::default() };
    let reporter = CapturingReporter::default();
    let bootstrapper = Bootstrapper::new(
        config_for(&server),
        &store,
        HttpClient::from_config(&config_for(&server)).unwrap(),
        &spawner,
        &reporter,
    );

    let report = bootstrapper.run().await;

    assert_eq!(report.exit_code, EXIT_SUCCESS);
    assert!(matches!(report.launch, Some(LaunchOutcome::Failed(BootstrapError::Spawn { code: 5, .. }))));

    let expected = crate::error::os_error_description(&io::Error::from_raw_os_error(5));
    let messages = reporter.messages.borrow();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with(SPAWN_FAILURE_MESSAGE));
    assert!(messages[0].contains(&expected));
}

#[tokio::test]
async fn test_command_line_is_independent_of_payload_state() {
    let server = payload_server().await;
    let expected = format!("{ARGV0_PLACEHOLDER} dvmod-handler install dvmod://mod/couplers-overhaul");

    for preinstalled in [true, false] {
        let (temp_dir, raw) = install_dir();
        if preinstalled {
            std::fs::write(temp_dir.path().join("dvmod.exe"), b"loader").unwrap();
        }

        let spawner = FakeSpawner::default();
        let bootstrapper = Bootstrapper::new(
            config_for(&server),
            FakeStore::new(Some(raw), None),
            HttpClient::from_config(&config_for(&server)).unwrap(),
            &spawner,
            CapturingReporter::default(),
        );
        bootstrapper.run().await;

        let launched = spawner.launched.borrow();
        assert_eq!(launched[0].command_line(), expected);
    }
}

#[tokio::test]
async fn test_install_dir_override_skips_registry() {
    let server = payload_server().await;
    let (temp_dir, _raw) = install_dir();
    std::fs::write(temp_dir.path().join("dvmod.exe"), b"loader").unwrap();

    let store = FakeStore::new(None, None);
    let spawner = FakeSpawner::default();
    let reporter = CapturingReporter::default();
    let bootstrapper = Bootstrapper::new(
        config_for(&server),
        &store,
        HttpClient::from_config(&config_for(&server)).unwrap(),
        &spawner,
        &reporter,
    )
    .with_install_dir(InstallationPath::from_path(temp_dir.path()));

    let report = bootstrapper.run().await;

    assert_eq!(report.exit_code, EXIT_SUCCESS);
    assert!(store.calls.borrow().is_empty());
    assert_eq!(spawner.launched.borrow().len(), 1);
}

#[tokio::test]
async fn test_failed_backup_still_downloads_and_launches() {
    let server = payload_server().await;
    let (temp_dir, raw) = install_dir();
    std::fs::write(temp_dir.path().join("doorstop_config.ini"), b"targetAssembly=BepInEx.dll").unwrap();
    // A non-empty directory in the backup slot cannot be moved onto.
    let blocker = temp_dir.path().join("doorstop_config.ini.old");
    std::fs::create_dir(&blocker).unwrap();
    std::fs::write(blocker.join("keep"), b"x").unwrap();

    let store = FakeStore::new(Some(raw), None);
    let spawner = FakeSpawner::default();
    let reporter = CapturingReporter::default();
    let bootstrapper = Bootstrapper::new(
        config_for(&server),
        &store,
        HttpClient::from_config(&config_for(&server)).unwrap(),
        &spawner,
        &reporter,
    );

    let report = bootstrapper.run().await;

    assert_eq!(report.exit_code, EXIT_SUCCESS);
    match report.payload {
        Some(PayloadOutcome::Installed { backup, downloads }) => {
            assert!(matches!(backup, BackupOutcome::Failed(_)));
            assert!(downloads.iter().all(|d| d.result.is_ok()));
        }
        other => panic!("unexpected payload outcome: {other:?}"),
    }
    assert_eq!(
        requested_paths(&server).await,
        vec!["/dvmod.exe", "/doorstop_config.ini", "/version.dll"]
    );
    assert!(blocker.join("keep").exists());
    assert_eq!(spawner.launched.borrow().len(), 1);
    assert!(reporter.messages.borrow().is_empty());
}
