//! Tests for GenesisService
#![cfg(unix)]

use std::ffi::OsString;
use std::io;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::{Arc, Mutex};

use rstest::rstest;
use tempfile::TempDir;

use genesis_init::application::services::GenesisService;
use genesis_init::application::ApplicationError;
use genesis_init::config::Settings;
use genesis_init::domain::{ChainParams, DomainError};
use genesis_init::infrastructure::traits::{CommandRunner, FileSystem, RealFileSystem};
use genesis_init::util::testing::init_test_setup;

/// Recorded invocation: program plus arguments
type Call = (String, Vec<OsString>);

/// Mock runner that records invocations and answers with a fixed outcome
struct MockRunner {
    calls: Mutex<Vec<Call>>,
    exit_code: Option<i32>,
    spawn_fails: bool,
}

impl MockRunner {
    fn exiting_with(code: i32) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            exit_code: Some(code),
            spawn_fails: false,
        }
    }

    fn killed() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            exit_code: None,
            spawn_fails: false,
        }
    }

    fn unspawnable() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            exit_code: Some(0),
            spawn_fails: true,
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandRunner for MockRunner {
    fn status(&self, cmd: &str, args: &[OsString]) -> io::Result<ExitStatus> {
        self.calls
            .lock()
            .unwrap()
            .push((cmd.to_string(), args.to_vec()));
        if self.spawn_fails {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such binary"));
        }
        Ok(match self.exit_code {
            Some(code) => ExitStatus::from_raw(code << 8),
            None => ExitStatus::from_raw(9),
        })
    }
}

/// Filesystem that lists children in a fixed order, all of them directories
struct FixedOrderFileSystem {
    root: PathBuf,
    children: Vec<&'static str>,
}

impl FileSystem for FixedOrderFileSystem {
    fn exists(&self, _path: &Path) -> bool {
        true
    }

    fn is_dir(&self, _path: &Path) -> bool {
        true
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        Ok(path.to_path_buf())
    }

    fn list_dir(&self, _path: &Path) -> io::Result<Vec<PathBuf>> {
        Ok(self.children.iter().map(|c| self.root.join(c)).collect())
    }
}

fn service_with(runner: Arc<MockRunner>, settings: Settings) -> GenesisService {
    init_test_setup();
    GenesisService::new(Arc::new(RealFileSystem), runner, Arc::new(settings))
}

fn create_entities(temp: &TempDir, names: &[&str]) {
    for name in names {
        let entity = temp.path().join(name);
        std::fs::create_dir_all(entity.join("entity")).unwrap();
        std::fs::create_dir_all(entity.join("node")).unwrap();
        std::fs::write(entity.join("entity").join("entity_genesis.json"), "{}").unwrap();
        std::fs::write(entity.join("node").join("node_genesis.json"), "{}").unwrap();
    }
}

fn pair_for(root: &Path, name: &str) -> (PathBuf, PathBuf) {
    (
        root.join(name).join("entity").join("entity_genesis.json"),
        root.join(name).join("node").join("node_genesis.json"),
    )
}

fn lossy(args: &[OsString]) -> Vec<String> {
    args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(7)]
fn given_n_entities_when_running_then_invokes_once_with_n_pairs(#[case] count: usize) {
    // Arrange
    let temp = TempDir::new().unwrap();
    let names: Vec<String> = (0..count).map(|i| format!("entity-{i}")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    create_entities(&temp, &refs);
    let runner = Arc::new(MockRunner::exiting_with(0));
    let service = service_with(runner.clone(), Settings::default());

    // Act
    let command = service.run(temp.path()).unwrap();

    // Assert
    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "oasis-node");
    assert_eq!(calls[0].1, command.args());
    assert_eq!(command.entity_pairs().len(), count);
    let entity_flags = calls[0].1.iter().filter(|a| *a == "--entity").count();
    let node_flags = calls[0].1.iter().filter(|a| *a == "--node").count();
    assert_eq!(entity_flags, count);
    assert_eq!(node_flags, count);
}

#[test]
fn given_empty_dir_when_running_then_invokes_with_prefix_only() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(MockRunner::exiting_with(0));
    let service = service_with(runner.clone(), Settings::default());

    // Act
    service.run(temp.path()).unwrap();

    // Assert
    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1, ChainParams::default().prefix_args());
}

#[test]
fn given_entities_a_and_b_when_running_then_pairs_reference_their_files_in_name_order() {
    // Arrange
    let temp = TempDir::new().unwrap();
    create_entities(&temp, &["B", "A"]);
    let root = temp.path().canonicalize().unwrap();
    let runner = Arc::new(MockRunner::exiting_with(0));
    let service = service_with(runner.clone(), Settings::default());

    // Act
    service.run(temp.path()).unwrap();

    // Assert
    let args = lossy(&runner.calls()[0].1);
    let prefix_len = ChainParams::default().prefix_args().len();
    let (a_entity, a_node) = pair_for(&root, "A");
    let (b_entity, b_node) = pair_for(&root, "B");
    assert_eq!(
        args[prefix_len..].to_vec(),
        vec![
            "--entity".to_string(),
            a_entity.display().to_string(),
            "--node".to_string(),
            a_node.display().to_string(),
            "--entity".to_string(),
            b_entity.display().to_string(),
            "--node".to_string(),
            b_node.display().to_string(),
        ]
    );
}

#[test]
fn given_missing_dir_when_running_then_fails_before_spawning() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(MockRunner::exiting_with(0));
    let service = service_with(runner.clone(), Settings::default());

    // Act
    let result = service.run(&temp.path().join("does-not-exist"));

    // Assert
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::EntitiesDirNotFound(_)))
    ));
    assert!(runner.calls().is_empty());
}

#[test]
fn given_file_instead_of_dir_when_running_then_fails_before_spawning() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("entities.tar");
    std::fs::write(&file, "not a dir").unwrap();
    let runner = Arc::new(MockRunner::exiting_with(0));
    let service = service_with(runner.clone(), Settings::default());

    // Act
    let result = service.run(&file);

    // Assert
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::NotADirectory(_)))
    ));
    assert!(runner.calls().is_empty());
}

#[test]
fn given_node_exits_nonzero_when_running_then_fails_without_retry() {
    // Arrange
    let temp = TempDir::new().unwrap();
    create_entities(&temp, &["validator"]);
    let runner = Arc::new(MockRunner::exiting_with(3));
    let service = service_with(runner.clone(), Settings::default());

    // Act
    let result = service.run(temp.path());

    // Assert
    match result {
        Err(ApplicationError::NodeFailed { program, exit_code }) => {
            assert_eq!(program, "oasis-node");
            assert_eq!(exit_code, Some(3));
        }
        other => panic!("expected NodeFailed, got {other:?}"),
    }
    assert_eq!(runner.calls().len(), 1);
}

#[test]
fn given_node_killed_by_signal_when_running_then_fails_without_exit_code() {
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(MockRunner::killed());
    let service = service_with(runner.clone(), Settings::default());

    let result = service.run(temp.path());

    assert!(matches!(
        result,
        Err(ApplicationError::NodeFailed { exit_code: None, .. })
    ));
    assert_eq!(runner.calls().len(), 1);
}

#[test]
fn given_unspawnable_binary_when_running_then_returns_spawn_error() {
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(MockRunner::unspawnable());
    let service = service_with(runner.clone(), Settings::default());

    let result = service.run(temp.path());

    assert!(matches!(result, Err(ApplicationError::NodeSpawn { .. })));
    assert_eq!(runner.calls().len(), 1);
}

#[test]
fn given_stray_files_next_to_entities_when_discovering_then_skips_them() {
    // Arrange
    let temp = TempDir::new().unwrap();
    create_entities(&temp, &["alice", "bob"]);
    std::fs::write(temp.path().join(".DS_Store"), "").unwrap();
    std::fs::write(temp.path().join("README.md"), "# entities").unwrap();
    let runner = Arc::new(MockRunner::exiting_with(0));
    let service = service_with(runner, Settings::default());

    // Act
    let dir = service.resolve_entities_dir(temp.path()).unwrap();
    let entities = service.discover_entities(&dir).unwrap();

    // Assert
    let names: Vec<_> = entities
        .iter()
        .map(|e| e.name.to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["alice", "bob"]);
}

#[rstest]
#[case(true, vec!["alpha", "bravo", "charlie"])]
#[case(false, vec!["charlie", "alpha", "bravo"])]
fn given_sort_setting_when_discovering_then_orders_accordingly(
    #[case] sort_entities: bool,
    #[case] expected: Vec<&str>,
) {
    // Arrange
    init_test_setup();
    let root = PathBuf::from("/entities");
    let fs = Arc::new(FixedOrderFileSystem {
        root: root.clone(),
        children: vec!["charlie", "alpha", "bravo"],
    });
    let settings = Settings {
        sort_entities,
        ..Settings::default()
    };
    let service = GenesisService::new(fs, Arc::new(MockRunner::exiting_with(0)), Arc::new(settings));

    // Act
    let entities = service.discover_entities(&root).unwrap();

    // Assert
    let names: Vec<_> = entities
        .iter()
        .map(|e| e.name.to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, expected);
}

#[test]
fn given_custom_settings_when_running_then_passes_them_to_node() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let runner = Arc::new(MockRunner::exiting_with(0));
    let settings = Settings {
        node_binary: "/opt/oasis/bin/oasis-node".into(),
        sort_entities: true,
        chain: ChainParams {
            chain_id: "quest-chain".into(),
            epoch_interval: 30,
            ..ChainParams::default()
        },
    };
    let service = service_with(runner.clone(), settings);

    // Act
    service.run(temp.path()).unwrap();

    // Assert
    let calls = runner.calls();
    assert_eq!(calls[0].0, "/opt/oasis/bin/oasis-node");
    let args = lossy(&calls[0].1);
    let chain_id_at = args.iter().position(|a| a == "--chain.id").unwrap();
    assert_eq!(args[chain_id_at + 1], "quest-chain");
    let interval_at = args
        .iter()
        .position(|a| a == "--epochtime.tendermint.interval")
        .unwrap();
    assert_eq!(args[interval_at + 1], "30");
}

#[test]
fn given_unnormalized_path_when_planning_then_entity_paths_are_canonical() {
    // Arrange
    let temp = TempDir::new().unwrap();
    create_entities(&temp, &["solo"]);
    let service = service_with(Arc::new(MockRunner::exiting_with(0)), Settings::default());
    let indirect = temp.path().join("solo").join("..");

    // Act
    let command = service.plan(&indirect).unwrap();

    // Assert
    let pairs = command.entity_pairs();
    assert_eq!(pairs.len(), 1);
    assert!(pairs[0].0.is_absolute());
    assert!(!pairs[0].0.to_string_lossy().contains(".."));
}
