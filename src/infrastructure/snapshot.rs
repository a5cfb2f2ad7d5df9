//! JSON tree snapshots as exported by the record source
//!
//! A snapshot is the nested tree the viewer holds in memory at selection time:
//!
//! ```json
//! { "title": "EXP1", "element": { "@type": "Experiment", ... },
//!   "children": [ { "title": "Tubes", "type": "tubesets", "isLoading": true } ] }
//! ```

use std::path::Path;

use generational_arena::Index;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::{GroupingKind, NodeData, ParameterInfo, Record, TreeArena};
use crate::infrastructure::error::{InfraError, InfraResult};
use crate::infrastructure::traits::FileSystem;

/// Icon and title of the "no records" child older record sources emit.
const LEGACY_EMPTY_ICON: &str = "empty.png";
const LEGACY_EMPTY_TITLE: &str = "<i>None</i>";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotNode {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<Record>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub grouping: Option<GroupingKind>,
    #[serde(default)]
    pub is_loading: bool,
    #[serde(default)]
    pub unselectable: bool,
    #[serde(default)]
    pub placeholder: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_info: Option<ParameterInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SnapshotNode>,
}

impl SnapshotNode {
    fn is_legacy_placeholder(&self) -> bool {
        self.icon.as_deref() == Some(LEGACY_EMPTY_ICON) && self.title == LEGACY_EMPTY_TITLE
    }

    fn to_node_data(&self) -> NodeData {
        let placeholder = self.placeholder || self.is_legacy_placeholder();
        NodeData {
            title: if placeholder { "None".to_string() } else { self.title.clone() },
            icon: self.icon.clone(),
            record: self.element.clone(),
            grouping: self.grouping,
            loading: self.is_loading,
            placeholder,
            unselectable: self.unselectable || placeholder,
            parameter_info: self.parameter_info.clone(),
        }
    }
}

/// Parse a snapshot from JSON.
pub fn parse_snapshot(json: &str) -> InfraResult<SnapshotNode> {
    serde_json::from_str(json).map_err(|e| InfraError::json("parse tree snapshot", e))
}

/// Build the arena from a snapshot, depth first.
#[instrument(level = "debug", skip(root), fields(root = %root.title))]
pub fn build_arena(root: &SnapshotNode) -> InfraResult<TreeArena> {
    let mut tree = TreeArena::new();
    let mut pending: Vec<(&SnapshotNode, Option<Index>)> = vec![(root, None)];

    while let Some((node, parent)) = pending.pop() {
        let idx = tree.insert_node(node.to_node_data(), parent)?;
        pending.extend(node.children.iter().rev().map(|child| (child, Some(idx))));
    }

    debug!("built tree with {} nodes", tree.len());
    Ok(tree)
}

/// Read and build a snapshot file.
pub fn load_snapshot(fs: &dyn FileSystem, path: &Path) -> InfraResult<TreeArena> {
    let json = fs
        .read_to_string(path)
        .map_err(|e| InfraError::io(format!("read snapshot {}", path.display()), e))?;
    build_arena(&parse_snapshot(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_legacy_sentinel_when_building_then_marks_placeholder() {
        let root = parse_snapshot(
            r#"{"title":"Tubes","type":"tubesets",
                "children":[{"title":"<i>None</i>","icon":"empty.png"}]}"#,
        )
        .unwrap();
        let tree = build_arena(&root).unwrap();
        let (_, child) = tree.children_of(tree.root().unwrap()).next().unwrap();
        assert!(child.data.placeholder);
        assert!(child.data.unselectable);
        assert_eq!(child.data.title, "None");
    }

    #[test]
    fn given_sentinel_icon_with_other_title_when_building_then_keeps_node() {
        let root = parse_snapshot(
            r#"{"title":"Tubes","type":"tubesets",
                "children":[{"title":"Tube_001","icon":"empty.png"}]}"#,
        )
        .unwrap();
        let tree = build_arena(&root).unwrap();
        let (_, child) = tree.children_of(tree.root().unwrap()).next().unwrap();
        assert!(!child.data.placeholder);
    }

    #[test]
    fn given_nested_snapshot_when_building_then_preserves_child_order() {
        let root = parse_snapshot(
            r#"{"title":"root","children":[
                {"title":"a","children":[{"title":"a1"}]},
                {"title":"b"}]}"#,
        )
        .unwrap();
        let tree = build_arena(&root).unwrap();
        let titles: Vec<_> = tree.iter().map(|(_, n)| n.data.title.clone()).collect();
        assert_eq!(titles, vec!["root", "a", "a1", "b"]);
    }

    #[test]
    fn given_malformed_json_when_parsing_then_json_error() {
        assert!(matches!(parse_snapshot("{"), Err(InfraError::Json { .. })));
    }
}
