use std::fmt;

use generational_arena::{Arena, Index};
use serde::{Deserialize, Serialize};
use termtree::Tree;
use tracing::instrument;

use crate::domain::details::ParameterInfo;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::record::Record;

/// Upper bound on parent hops when walking towards the root.
///
/// Trees built through [`TreeArena::insert_node`] cannot contain cycles, but
/// `get_node_mut` allows rewiring parent links, so walks stay bounded.
pub const MAX_ANCESTOR_DEPTH: usize = 256;

/// Synthetic grouping represented by a node without a record of its own.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GroupingKind {
    /// All wells or tubes sharing a specimen name
    Specimen,
    /// All tubes of an experiment
    Tubesets,
    /// All plates of an experiment
    PlateContainer,
}

impl fmt::Display for GroupingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GroupingKind::Specimen => "specimen",
            GroupingKind::Tubesets => "tubesets",
            GroupingKind::PlateContainer => "plate_container",
        };
        f.write_str(name)
    }
}

/// Data payload for tree nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeData {
    /// Display label; doubles as the specimen name for specimen groupings
    pub title: String,
    pub icon: Option<String>,
    pub record: Option<Record>,
    pub grouping: Option<GroupingKind>,
    /// Children are still being fetched by the record source
    pub loading: bool,
    /// "No records" marker the record source inserts into empty groupings
    pub placeholder: bool,
    pub unselectable: bool,
    pub parameter_info: Option<ParameterInfo>,
}

impl NodeData {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_record(title: impl Into<String>, record: Record) -> Self {
        Self {
            record: Some(record),
            ..Self::new(title)
        }
    }

    pub fn with_grouping(title: impl Into<String>, grouping: GroupingKind) -> Self {
        Self {
            grouping: Some(grouping),
            ..Self::new(title)
        }
    }

    /// The child a record source inserts when a grouping turned out to be empty.
    pub fn placeholder() -> Self {
        Self {
            placeholder: true,
            unselectable: true,
            ..Self::new("None")
        }
    }

    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)?;
        match (&self.record, self.grouping) {
            (Some(record), _) => write!(f, " ({})", record)?,
            (None, Some(grouping)) => write!(f, " <{}>", grouping)?,
            (None, None) => {}
        }
        if self.loading {
            write!(f, " [loading]")?;
        }
        Ok(())
    }
}

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct TreeNode {
    pub data: NodeData,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Indices of child nodes in load order
    pub children: Vec<Index>,
}

/// Arena-based experiment tree.
///
/// The arena owns all nodes top-down; `parent` links are navigational only.
#[derive(Debug)]
pub struct TreeArena {
    arena: Arena<TreeNode>,
    root: Option<Index>,
}

impl Default for TreeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeArena {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    /// Insert a node below `parent`, or as the root when `parent` is None.
    ///
    /// A tree has exactly one root; inserting a second one is rejected.
    #[instrument(level = "trace", skip(self, data), fields(title = %data.title))]
    pub fn insert_node(&mut self, data: NodeData, parent: Option<Index>) -> DomainResult<Index> {
        match parent {
            Some(parent_idx) if !self.arena.contains(parent_idx) => {
                return Err(DomainError::NodeNotFound(parent_idx));
            }
            None if self.root.is_some() => {
                return Err(DomainError::InvalidSnapshot {
                    message: format!("second root node: {}", data.title),
                });
            }
            _ => {}
        }

        let node_idx = self.arena.insert(TreeNode {
            data,
            parent,
            children: Vec::new(),
        });

        match parent.and_then(|p| self.arena.get_mut(p)) {
            Some(parent_node) => parent_node.children.push(node_idx),
            None => self.root = Some(node_idx),
        }

        Ok(node_idx)
    }

    /// Lazy-load completion: append children and clear the loading flag.
    #[instrument(level = "debug", skip(self, children))]
    pub fn append_children(
        &mut self,
        idx: Index,
        children: Vec<NodeData>,
    ) -> DomainResult<Vec<Index>> {
        let mut inserted = Vec::with_capacity(children.len());
        for data in children {
            inserted.push(self.insert_node(data, Some(idx))?);
        }
        self.node_mut(idx)?.data.loading = false;
        Ok(inserted)
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn get_node_mut(&mut self, idx: Index) -> Option<&mut TreeNode> {
        self.arena.get_mut(idx)
    }

    /// Like [`get_node`](Self::get_node) but with a typed error.
    pub fn node(&self, idx: Index) -> DomainResult<&TreeNode> {
        self.arena.get(idx).ok_or(DomainError::NodeNotFound(idx))
    }

    fn node_mut(&mut self, idx: Index) -> DomainResult<&mut TreeNode> {
        self.arena.get_mut(idx).ok_or(DomainError::NodeNotFound(idx))
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn parent_of(&self, idx: Index) -> Option<Index> {
        self.get_node(idx).and_then(|node| node.parent)
    }

    /// Children of `idx` in load order; empty for unknown indices.
    pub fn children_of(&self, idx: Index) -> impl Iterator<Item = (Index, &TreeNode)> {
        self.get_node(idx)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(move |&child| self.get_node(child).map(|node| (child, node)))
    }

    /// Strict ancestors of `idx`, nearest first, bounded by [`MAX_ANCESTOR_DEPTH`].
    pub fn ancestors(&self, idx: Index) -> Ancestors<'_> {
        self.ancestors_bounded(idx, MAX_ANCESTOR_DEPTH)
    }

    pub fn ancestors_bounded(&self, idx: Index, max_depth: usize) -> Ancestors<'_> {
        Ancestors {
            arena: self,
            next: self.parent_of(idx),
            remaining: max_depth,
        }
    }

    /// Locate a node by the titles on the path from the root.
    ///
    /// The first title must match the root.
    #[instrument(level = "debug", skip(self))]
    pub fn find_by_titles<S: AsRef<str> + fmt::Debug>(&self, titles: &[S]) -> DomainResult<Index> {
        let path = || {
            titles
                .iter()
                .map(|t| t.as_ref())
                .collect::<Vec<_>>()
                .join(" / ")
        };
        let root = self.root.ok_or(DomainError::EmptyTree)?;
        let (first, rest) = titles
            .split_first()
            .ok_or_else(|| DomainError::PathNotFound(String::new()))?;

        if self.node(root)?.data.title != first.as_ref() {
            return Err(DomainError::PathNotFound(path()));
        }

        let mut current = root;
        for title in rest {
            current = self
                .children_of(current)
                .find(|(_, node)| node.data.title == title.as_ref())
                .map(|(child, _)| child)
                .ok_or_else(|| DomainError::PathNotFound(path()))?;
        }
        Ok(current)
    }

    /// Titles from the root down to `idx`.
    pub fn titles_to(&self, idx: Index) -> Vec<String> {
        let mut titles: Vec<String> = self
            .ancestors(idx)
            .map(|(_, node)| node.data.title.clone())
            .collect();
        titles.reverse();
        if let Some(node) = self.get_node(idx) {
            titles.push(node.data.title.clone());
        }
        titles
    }

    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    pub fn depth(&self) -> usize {
        self.root.map_or(0, |root| self.calculate_depth(root))
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        self.get_node(node_idx).map_or(0, |node| {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        })
    }

    /// Render as an ASCII tree for terminal display.
    pub fn to_termtree(&self) -> Tree<String> {
        fn build(arena: &TreeArena, node_idx: Index) -> Tree<String> {
            let label = arena
                .get_node(node_idx)
                .map(|node| node.data.to_string())
                .unwrap_or_default();
            let leaves: Vec<_> = arena
                .children_of(node_idx)
                .map(|(child, _)| build(arena, child))
                .collect();
            Tree::new(label).with_leaves(leaves)
        }

        match self.root {
            Some(root) => build(self, root),
            None => Tree::new("Empty tree".to_string()),
        }
    }
}

/// Iterator over the strict ancestors of a node, nearest first.
pub struct Ancestors<'a> {
    arena: &'a TreeArena,
    next: Option<Index>,
    remaining: usize,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next?;
        let node = self.arena.get_node(current)?;
        self.remaining -= 1;
        self.next = node.parent;
        Some((current, node))
    }
}

/// Pre-order iterator.
pub struct TreeIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a TreeArena) -> Self {
        Self {
            arena,
            stack: arena.root().into_iter().collect(),
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                self.stack.extend(node.children.iter().rev());
                return Some((current_idx, node));
            }
        }
        None
    }
}
