//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::{DetailsService, ExportService};
use crate::config::Settings;
use crate::infrastructure::archival::JsonLinesArchival;
use crate::infrastructure::traits::{ArchivalService, FileSystem, RealFileSystem};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Archival collaborator
    pub archival: Arc<dyn ArchivalService>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(
            settings,
            Arc::new(RealFileSystem),
            Arc::new(JsonLinesArchival::stdout()),
        )
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        archival: Arc<dyn ArchivalService>,
    ) -> Self {
        let settings = Arc::new(settings);

        Self {
            settings,
            fs,
            archival,
        }
    }

    pub fn export_service(&self) -> ExportService {
        ExportService::new(Arc::clone(&self.settings), Arc::clone(&self.archival))
    }

    pub fn details_service(&self) -> DetailsService {
        DetailsService::new(Arc::clone(&self.settings))
    }
}
