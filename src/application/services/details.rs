//! Node and experiment details

use std::sync::Arc;

use generational_arena::Index;
use serde::Serialize;
use tracing::instrument;

use crate::application::ApplicationResult;
use crate::config::Settings;
use crate::domain::{ExperimentSummary, ExportResolver, NodeDetails, Record, TreeArena};

/// Detail pane content: the node itself plus the experiment it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailsView {
    pub node: NodeDetails,
    pub experiment: Option<ExperimentSummary>,
}

pub struct DetailsService {
    settings: Arc<Settings>,
}

impl DetailsService {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }

    /// Unselectable nodes have no details.
    #[instrument(level = "debug", skip(self, tree))]
    pub fn details(&self, tree: &TreeArena, idx: Index) -> ApplicationResult<Option<DetailsView>> {
        let node = tree.node(idx)?;
        if node.data.unselectable {
            return Ok(None);
        }

        let codes = self.settings.type_codes();
        let experiment = match &node.data.record {
            Some(Record::Experiment(exp)) => Some(exp),
            _ => ExportResolver::new(codes.clone())
                .with_max_depth(self.settings.max_ancestor_depth)
                .nearest_experiment(tree, idx),
        };

        Ok(Some(DetailsView {
            node: NodeDetails::for_node(&node.data, &codes),
            experiment: experiment.map(|exp| ExperimentSummary::from_record(exp, &codes)),
        }))
    }
}
