//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (ArchivalService, FileSystem)
//! but are themselves concrete structs, not traits.

mod details;
mod export;

pub use details::{DetailsService, DetailsView};
pub use export::{
    ExportAction, ExportPanel, ExportService, StatusLevel, StatusMessage, RESELECT_MESSAGE,
};
