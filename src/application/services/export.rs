//! Export action service
//!
//! Turns a resolution into the actions offered for a node and hands confirmed
//! exports to the archival collaborator.

use std::fmt;
use std::sync::Arc;

use generational_arena::Index;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::config::Settings;
use crate::domain::{ExportDescriptor, ExportResolver, Record, Resolution, TreeArena};
use crate::infrastructure::traits::{ArchivalService, ArchiveMode, ArchiveRequest};

pub const RESELECT_MESSAGE: &str = "Please reselect this node to display export option.";

/// Severity of a status message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    #[default]
    Default,
    Success,
    Info,
    Warning,
    Danger,
}

impl StatusLevel {
    /// Unknown level names fall back to `Default`.
    pub fn parse(name: &str) -> Self {
        match name {
            "success" => StatusLevel::Success,
            "info" => StatusLevel::Info,
            "warning" => StatusLevel::Warning,
            "danger" => StatusLevel::Danger,
            _ => StatusLevel::Default,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExportAction {
    /// Copy into the personal folder (archive mode `normal`)
    ExportToUserFolder(ExportDescriptor),
    /// Server-side zip (archive mode `zip`)
    DownloadArchive(ExportDescriptor),
    /// Plain browser download of a single file
    DownloadFile { url: String, filename: String },
}

impl ExportAction {
    pub fn label(&self) -> String {
        match self {
            ExportAction::ExportToUserFolder(_) => "Export to your folder".to_string(),
            ExportAction::DownloadArchive(_) => "Download archive".to_string(),
            ExportAction::DownloadFile { filename, .. } => format!("Download {filename}"),
        }
    }

    /// Archival request behind this action; None for direct downloads.
    pub fn archive_request(&self) -> Option<ArchiveRequest> {
        match self {
            ExportAction::ExportToUserFolder(d) => Some(ArchiveRequest::new(d, ArchiveMode::Normal)),
            ExportAction::DownloadArchive(d) => Some(ArchiveRequest::new(d, ArchiveMode::Zip)),
            ExportAction::DownloadFile { .. } => None,
        }
    }
}

impl fmt::Display for ExportAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportAction::ExportToUserFolder(d) | ExportAction::DownloadArchive(d) => {
                write!(f, "{}: {}", self.label(), d)
            }
            ExportAction::DownloadFile { url, .. } => write!(f, "{}: {}", self.label(), url),
        }
    }
}

/// Everything the action area shows for one node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportPanel {
    pub status: Option<StatusMessage>,
    pub actions: Vec<ExportAction>,
}

/// Service offering and performing exports for tree nodes.
pub struct ExportService {
    settings: Arc<Settings>,
    archival: Arc<dyn ArchivalService>,
    resolver: ExportResolver,
}

impl ExportService {
    pub fn new(settings: Arc<Settings>, archival: Arc<dyn ArchivalService>) -> Self {
        let resolver =
            ExportResolver::new(settings.type_codes()).with_max_depth(settings.max_ancestor_depth);
        Self {
            settings,
            archival,
            resolver,
        }
    }

    pub fn resolve(&self, tree: &TreeArena, idx: Index) -> ApplicationResult<Resolution> {
        Ok(self.resolver.resolve(tree, idx)?)
    }

    /// Build the action panel for the node at `idx`.
    #[instrument(level = "debug", skip(self, tree))]
    pub fn panel(&self, tree: &TreeArena, idx: Index) -> ApplicationResult<ExportPanel> {
        let node = tree.node(idx)?;
        let mut panel = ExportPanel::default();
        if node.data.unselectable {
            debug!("'{}' is unselectable", node.data.title);
            return Ok(panel);
        }

        match self.resolver.resolve(tree, idx)? {
            Resolution::Export(descriptor) => {
                if self.settings.enable_export_to_user_folder {
                    panel
                        .actions
                        .push(ExportAction::ExportToUserFolder(descriptor.clone()));
                }
                panel.actions.push(ExportAction::DownloadArchive(descriptor));
            }
            Resolution::NotReady => {
                panel.status = Some(StatusMessage {
                    level: StatusLevel::Info,
                    text: RESELECT_MESSAGE.to_string(),
                });
            }
            Resolution::NoAction => {}
        }

        if let Some(Record::DataSet(ds)) = &node.data.record {
            if let Some(url) = &ds.url {
                panel.actions.push(ExportAction::DownloadFile {
                    url: url.clone(),
                    filename: ds.filename.clone().unwrap_or_else(|| ds.code.clone()),
                });
            }
        }

        Ok(panel)
    }

    /// Resolve the node and hand the export to the archival service.
    #[instrument(level = "debug", skip(self, tree))]
    pub fn export(
        &self,
        tree: &TreeArena,
        idx: Index,
        mode: ArchiveMode,
    ) -> ApplicationResult<ArchiveRequest> {
        if mode == ArchiveMode::Normal && !self.settings.enable_export_to_user_folder {
            return Err(ApplicationError::ExportDisabled);
        }

        let title = || tree.titles_to(idx).join(" / ");
        let descriptor = match self.resolver.resolve(tree, idx)? {
            Resolution::Export(descriptor) => descriptor,
            Resolution::NotReady => return Err(ApplicationError::NotReady(title())),
            Resolution::NoAction => return Err(ApplicationError::NothingToExport(title())),
        };

        let request = ArchiveRequest::new(&descriptor, mode);
        self.archival
            .copy_datasets_to_user_dir(&request)
            .map_err(|e| ApplicationError::OperationFailed {
                context: format!("archive {} {}", request.type_code, request.identifier),
                source: Box::new(e),
            })?;
        info!("requested {} export of {}", mode, descriptor);
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn descriptor() -> ExportDescriptor {
        ExportDescriptor {
            type_code: "LSR_FORTESSA_PLATE".into(),
            identifier: "/S/P/PLATE1".into(),
            specimen_name: "Specimen_A".into(),
            experiment_id: "/S/P/EXP1".into(),
        }
    }

    #[rstest]
    #[case("success", StatusLevel::Success)]
    #[case("info", StatusLevel::Info)]
    #[case("warning", StatusLevel::Warning)]
    #[case("danger", StatusLevel::Danger)]
    #[case("default", StatusLevel::Default)]
    #[case("shouting", StatusLevel::Default)]
    fn given_level_name_when_parsing_then_maps_or_falls_back(
        #[case] name: &str,
        #[case] expected: StatusLevel,
    ) {
        assert_eq!(StatusLevel::parse(name), expected);
    }

    #[test]
    fn given_folder_action_when_building_request_then_uses_normal_mode() {
        let request = ExportAction::ExportToUserFolder(descriptor())
            .archive_request()
            .expect("request");
        assert_eq!(request.mode, ArchiveMode::Normal);
        assert_eq!(request.specimen_name, "Specimen_A");
    }

    #[test]
    fn given_archive_action_when_displayed_then_shows_label_and_target() {
        let action = ExportAction::DownloadArchive(descriptor());
        assert_eq!(
            action.to_string(),
            "Download archive: LSR_FORTESSA_PLATE /S/P/PLATE1 (specimen Specimen_A) in /S/P/EXP1"
        );
    }

    #[test]
    fn given_panel_when_serialized_then_actions_are_tagged_by_kind() {
        let panel = ExportPanel {
            status: None,
            actions: vec![ExportAction::DownloadFile {
                url: "https://lims/file.fcs".into(),
                filename: "file.fcs".into(),
            }],
        };
        let json = serde_json::to_value(&panel).unwrap();
        assert_eq!(json["actions"][0]["kind"], "download_file");
        assert_eq!(json["actions"][0]["filename"], "file.fcs");
    }
}
