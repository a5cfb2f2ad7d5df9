//! Export target resolution
//!
//! Decides, for a selected tree node, which entity the archival service has to
//! copy: its type code, identifier, specimen filter and experiment context.

use std::fmt;

use generational_arena::Index;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::arena::{GroupingKind, TreeArena, TreeNode, MAX_ANCESTOR_DEPTH};
use crate::domain::error::DomainResult;
use crate::domain::record::{ExperimentRecord, Record, TypeCodes};

/// Parameters handed to the archival service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExportDescriptor {
    #[serde(rename = "type")]
    pub type_code: String,
    pub identifier: String,
    pub specimen_name: String,
    pub experiment_id: String,
}

impl fmt::Display for ExportDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.type_code, self.identifier)?;
        if !self.specimen_name.is_empty() {
            write!(f, " (specimen {})", self.specimen_name)?;
        }
        write!(f, " in {}", self.experiment_id)
    }
}

/// Outcome of resolving a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "descriptor", rename_all = "snake_case")]
pub enum Resolution {
    Export(ExportDescriptor),
    /// Children are still loading; re-resolve once they arrived.
    NotReady,
    /// Nothing to export for this node.
    NoAction,
}

impl Resolution {
    pub fn descriptor(&self) -> Option<&ExportDescriptor> {
        match self {
            Resolution::Export(descriptor) => Some(descriptor),
            _ => None,
        }
    }

    /// Empty type codes never make it into an export.
    fn export(descriptor: ExportDescriptor) -> Self {
        if descriptor.type_code.is_empty() {
            Resolution::NoAction
        } else {
            Resolution::Export(descriptor)
        }
    }
}

/// Resolves export targets against a tree snapshot.
#[derive(Debug, Clone)]
pub struct ExportResolver {
    codes: TypeCodes,
    max_depth: usize,
}

impl ExportResolver {
    pub fn new(codes: TypeCodes) -> Self {
        Self {
            codes,
            max_depth: MAX_ANCESTOR_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn codes(&self) -> &TypeCodes {
        &self.codes
    }

    /// Resolve the node at `idx`.
    ///
    /// A record on the node takes priority over its grouping tag. Only an index
    /// that is not part of `tree` is an error.
    #[instrument(level = "debug", skip(self, tree))]
    pub fn resolve(&self, tree: &TreeArena, idx: Index) -> DomainResult<Resolution> {
        let node = tree.node(idx)?;

        let resolution = match (&node.data.record, node.data.grouping) {
            (Some(record), _) => Self::resolve_record(record),
            (None, Some(GroupingKind::Specimen)) => self.resolve_specimen(tree, idx, node),
            (None, Some(GroupingKind::Tubesets)) => {
                self.resolve_collection(tree, idx, node, self.codes.tubeset())
            }
            (None, Some(GroupingKind::PlateContainer)) => {
                self.resolve_collection(tree, idx, node, self.codes.all_plates())
            }
            (None, None) => Resolution::NoAction,
        };

        debug!("resolved '{}': {:?}", node.data.title, resolution);
        Ok(resolution)
    }

    fn resolve_record(record: &Record) -> Resolution {
        let descriptor = match record {
            Record::Experiment(exp) => ExportDescriptor {
                type_code: exp.experiment_type_code.clone(),
                identifier: exp.identifier.clone(),
                specimen_name: String::new(),
                experiment_id: exp.identifier.clone(),
            },
            Record::Sample(sample) => ExportDescriptor {
                type_code: sample.sample_type_code.clone(),
                identifier: sample.identifier.clone(),
                specimen_name: String::new(),
                experiment_id: sample.experiment_identifier_or_null.clone().unwrap_or_default(),
            },
            Record::DataSet(ds) => ExportDescriptor {
                type_code: ds.data_set_type_code.clone(),
                identifier: ds.code.clone(),
                specimen_name: String::new(),
                experiment_id: ds.experiment_identifier.clone(),
            },
            Record::Other => return Resolution::NoAction,
        };
        Resolution::export(descriptor)
    }

    /// Wells are reached through their plate; tubes have no structural parent and
    /// are filtered from the whole experiment.
    fn resolve_specimen(&self, tree: &TreeArena, idx: Index, node: &TreeNode) -> Resolution {
        let specimen_name = node.data.title.clone();
        let plate_code = self.codes.plate();

        let plate = node
            .parent
            .and_then(|parent| tree.get_node(parent))
            .and_then(|parent| parent.data.record.as_ref())
            .and_then(Record::as_sample)
            .filter(|sample| sample.sample_type_code == plate_code);

        if let Some(plate) = plate {
            return Resolution::export(ExportDescriptor {
                type_code: plate_code,
                identifier: plate.identifier.clone(),
                specimen_name,
                experiment_id: plate.experiment_identifier_or_null.clone().unwrap_or_default(),
            });
        }

        // Any other parent, including a non-plate sample, exports the specimen
        // across the whole experiment.
        self.experiment_export(tree, idx, self.codes.tubeset(), specimen_name)
    }

    /// "All tubes" / "all plates" groupings: no specimen filter.
    fn resolve_collection(
        &self,
        tree: &TreeArena,
        idx: Index,
        node: &TreeNode,
        type_code: String,
    ) -> Resolution {
        if node.children.is_empty() {
            if node.data.loading {
                return Resolution::NotReady;
            }
            return Resolution::NoAction;
        }

        let only_placeholder = match node.children.as_slice() {
            [only] => tree.get_node(*only).is_some_and(|child| child.data.placeholder),
            _ => false,
        };
        if only_placeholder {
            return Resolution::NoAction;
        }

        self.experiment_export(tree, idx, type_code, String::new())
    }

    fn experiment_export(
        &self,
        tree: &TreeArena,
        idx: Index,
        type_code: String,
        specimen_name: String,
    ) -> Resolution {
        match self.nearest_experiment(tree, idx) {
            Some(exp) => Resolution::export(ExportDescriptor {
                type_code,
                identifier: exp.identifier.clone(),
                specimen_name,
                experiment_id: exp.identifier.clone(),
            }),
            None => {
                debug!("no experiment above {:?}", idx);
                Resolution::NoAction
            }
        }
    }

    /// Nearest strict ancestor carrying an Experiment record.
    pub fn nearest_experiment<'a>(
        &self,
        tree: &'a TreeArena,
        idx: Index,
    ) -> Option<&'a ExperimentRecord> {
        tree.ancestors_bounded(idx, self.max_depth)
            .find_map(|(_, node)| node.data.record.as_ref().and_then(Record::as_experiment))
    }
}

/// Resolve `idx` with a one-off resolver for `codes`.
pub fn resolve(tree: &TreeArena, idx: Index, codes: &TypeCodes) -> DomainResult<Resolution> {
    ExportResolver::new(codes.clone()).resolve(tree, idx)
}
