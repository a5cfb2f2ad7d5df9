//! Tests for ExportService: offered actions and archival hand-over

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use generational_arena::Index;
use rstest::rstest;

use flowexport::application::services::{ExportAction, StatusLevel, RESELECT_MESSAGE};
use flowexport::application::ApplicationError;
use flowexport::config::Settings;
use flowexport::domain::TreeArena;
use flowexport::infrastructure::di::ServiceContainer;
use flowexport::infrastructure::snapshot::load_snapshot;
use flowexport::infrastructure::traits::{
    ArchivalService, ArchiveMode, ArchiveRequest, RealFileSystem,
};
use flowexport::util::testing;

/// Records every request instead of talking to a server.
#[derive(Default)]
struct MockArchival {
    requests: Mutex<Vec<ArchiveRequest>>,
    fail: bool,
}

impl MockArchival {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    fn requests(&self) -> Vec<ArchiveRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl ArchivalService for MockArchival {
    fn copy_datasets_to_user_dir(&self, request: &ArchiveRequest) -> io::Result<()> {
        if self.fail {
            return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "server down"));
        }
        self.requests.lock().unwrap().push(request.clone());
        Ok(())
    }
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/resources")
        .join(name)
}

fn load(name: &str) -> TreeArena {
    load_snapshot(&RealFileSystem, &fixture(name)).expect("load fixture")
}

fn container(enable_user_folder: bool, archival: Arc<MockArchival>) -> ServiceContainer {
    testing::init_test_setup();
    let settings = Settings {
        enable_export_to_user_folder: enable_user_folder,
        ..Settings::default()
    };
    ServiceContainer::with_deps(settings, Arc::new(RealFileSystem), archival)
}

fn node(tree: &TreeArena, path: &[&str]) -> Index {
    tree.find_by_titles(path).expect("node in fixture")
}

// ============================================================
// Action panel
// ============================================================

#[test]
fn given_folder_export_disabled_when_building_panel_then_offers_archive_only() {
    // Arrange
    let services = container(false, Arc::new(MockArchival::default()));
    let tree = load("experiment_tree.json");
    let idx = node(&tree, &["EXP1", "Plates", "PLATE1", "Specimen_B"]);

    // Act
    let panel = services.export_service().panel(&tree, idx).unwrap();

    // Assert
    assert_eq!(panel.status, None);
    assert_eq!(panel.actions.len(), 1);
    match &panel.actions[0] {
        ExportAction::DownloadArchive(d) => {
            assert_eq!(d.type_code, "LSR_FORTESSA_PLATE");
            assert_eq!(d.identifier, "/SPACE/PROJ/PLATE1");
            assert_eq!(d.specimen_name, "Specimen_B");
        }
        other => panic!("unexpected action: {other:?}"),
    }
}

#[test]
fn given_folder_export_enabled_when_building_panel_then_offers_both_in_order() {
    let services = container(true, Arc::new(MockArchival::default()));
    let tree = load("experiment_tree.json");
    let idx = node(&tree, &["EXP1", "Tubes"]);

    let panel = services.export_service().panel(&tree, idx).unwrap();

    let labels: Vec<String> = panel.actions.iter().map(ExportAction::label).collect();
    assert_eq!(labels, vec!["Export to your folder", "Download archive"]);
    let modes: Vec<ArchiveMode> = panel
        .actions
        .iter()
        .filter_map(ExportAction::archive_request)
        .map(|r| r.mode)
        .collect();
    assert_eq!(modes, vec![ArchiveMode::Normal, ArchiveMode::Zip]);
}

#[test]
fn given_fcs_data_set_with_url_when_building_panel_then_adds_direct_download() {
    let services = container(false, Arc::new(MockArchival::default()));
    let tree = load("experiment_tree.json");
    let idx = node(&tree, &["EXP1", "Tubes", "Specimen_A", "Tube_001", "Tube_001.fcs"]);

    let panel = services.export_service().panel(&tree, idx).unwrap();

    assert_eq!(panel.actions.len(), 2);
    assert_eq!(
        panel.actions[1],
        ExportAction::DownloadFile {
            url: "https://lims.example.org/datastore/20140327101501234-7/Tube_001.fcs".into(),
            filename: "Tube_001.fcs".into(),
        }
    );
    assert!(panel.actions[1].archive_request().is_none());
}

#[test]
fn given_loading_tubesets_when_building_panel_then_asks_to_reselect() {
    let services = container(true, Arc::new(MockArchival::default()));
    let tree = load("pending_tree.json");
    let idx = node(&tree, &["EXP2", "Tubes"]);

    let panel = services.export_service().panel(&tree, idx).unwrap();

    let status = panel.status.expect("status message");
    assert_eq!(status.level, StatusLevel::Info);
    assert_eq!(status.text, RESELECT_MESSAGE);
    assert!(panel.actions.is_empty());
}

#[test]
fn given_plates_with_only_placeholder_when_building_panel_then_empty() {
    let services = container(true, Arc::new(MockArchival::default()));
    let tree = load("pending_tree.json");
    let idx = node(&tree, &["EXP2", "Plates"]);

    let panel = services.export_service().panel(&tree, idx).unwrap();

    assert_eq!(panel.status, None);
    assert!(panel.actions.is_empty());
}

#[test]
fn given_placeholder_node_when_building_panel_then_empty() {
    let services = container(true, Arc::new(MockArchival::default()));
    let tree = load("pending_tree.json");
    let idx = node(&tree, &["EXP2", "Plates", "None"]);

    let panel = services.export_service().panel(&tree, idx).unwrap();

    assert_eq!(panel, Default::default());
}

// ============================================================
// Export hand-over
// ============================================================

#[rstest]
#[case(&["EXP1"], "LSR_FORTESSA_EXPERIMENT", "/SPACE/PROJ/EXP1", "")]
#[case(&["EXP1", "Tubes"], "LSR_FORTESSA_TUBESET", "/SPACE/PROJ/EXP1", "")]
#[case(&["EXP1", "Tubes", "Specimen_A"], "LSR_FORTESSA_TUBESET", "/SPACE/PROJ/EXP1", "Specimen_A")]
#[case(&["EXP1", "Plates"], "LSR_FORTESSA_ALL_PLATES", "/SPACE/PROJ/EXP1", "")]
#[case(&["EXP1", "Plates", "PLATE1", "Specimen_B", "A1"], "LSR_FORTESSA_WELL", "/SPACE/PROJ/PLATE1:A1", "")]
fn given_exportable_node_when_exporting_then_hands_request_to_archival(
    #[case] path: &[&str],
    #[case] type_code: &str,
    #[case] identifier: &str,
    #[case] specimen: &str,
) {
    let archival = Arc::new(MockArchival::default());
    let services = container(false, Arc::clone(&archival));
    let tree = load("experiment_tree.json");

    let request = services
        .export_service()
        .export(&tree, node(&tree, path), ArchiveMode::Zip)
        .unwrap();

    assert_eq!(request.type_code, type_code);
    assert_eq!(request.identifier, identifier);
    assert_eq!(request.specimen_name, specimen);
    assert_eq!(request.experiment_id, "/SPACE/PROJ/EXP1");
    assert_eq!(request.mode, ArchiveMode::Zip);
    assert_eq!(archival.requests(), vec![request]);
}

#[test]
fn given_folder_export_disabled_when_exporting_normal_then_rejected() {
    let archival = Arc::new(MockArchival::default());
    let services = container(false, Arc::clone(&archival));
    let tree = load("experiment_tree.json");

    let result = services
        .export_service()
        .export(&tree, node(&tree, &["EXP1"]), ArchiveMode::Normal);

    assert!(matches!(result, Err(ApplicationError::ExportDisabled)));
    assert!(archival.requests().is_empty());
}

#[test]
fn given_loading_node_when_exporting_then_not_ready_and_nothing_sent() {
    let archival = Arc::new(MockArchival::default());
    let services = container(true, Arc::clone(&archival));
    let tree = load("pending_tree.json");

    let result = services
        .export_service()
        .export(&tree, node(&tree, &["EXP2", "Tubes"]), ArchiveMode::Normal);

    match result {
        Err(ApplicationError::NotReady(title)) => assert_eq!(title, "EXP2 / Tubes"),
        other => panic!("expected NotReady, got {other:?}"),
    }
    assert!(archival.requests().is_empty());
}

#[test]
fn given_no_action_node_when_exporting_then_nothing_to_export() {
    let archival = Arc::new(MockArchival::default());
    let services = container(false, Arc::clone(&archival));
    let tree = load("pending_tree.json");

    let result = services
        .export_service()
        .export(&tree, node(&tree, &["EXP2", "Plates"]), ArchiveMode::Zip);

    assert!(matches!(result, Err(ApplicationError::NothingToExport(_))));
    assert!(archival.requests().is_empty());
}

#[test]
fn given_failing_archival_when_exporting_then_operation_failed() {
    let services = container(false, Arc::new(MockArchival::failing()));
    let tree = load("experiment_tree.json");

    let result = services
        .export_service()
        .export(&tree, node(&tree, &["EXP1", "Tubes"]), ArchiveMode::Zip);

    match result {
        Err(ApplicationError::OperationFailed { context, .. }) => {
            assert_eq!(context, "archive LSR_FORTESSA_TUBESET /SPACE/PROJ/EXP1");
        }
        other => panic!("expected OperationFailed, got {other:?}"),
    }
}
