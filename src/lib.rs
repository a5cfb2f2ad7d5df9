//! Export target resolution for flow-cytometry experiment trees.
//!
//! Given a node selected in an experiment/sample/dataset tree, decide which
//! entity the archival service has to copy or zip, and which export actions
//! the node offers.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;

pub use domain::{resolve, ExportDescriptor, ExportResolver, Resolution};
