//! Domain layer: tree model, records, and export resolution
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod details;
pub mod error;
pub mod record;
pub mod resolver;

pub use arena::{GroupingKind, NodeData, TreeArena, TreeNode, MAX_ANCESTOR_DEPTH};
pub use details::{
    attachment_link, attachment_summary, AxisOption, ExperimentSummary, NodeDetails, ParameterInfo,
    PlotRequest,
};
pub use error::{DomainError, DomainResult};
pub use record::{
    Attachment, DataSetRecord, ExperimentRecord, Metaproject, Record, SampleRecord, TypeCodes,
};
pub use resolver::{resolve, ExportDescriptor, ExportResolver, Resolution};
