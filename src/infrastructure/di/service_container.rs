//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::SurveyService;
use crate::config::Settings;
use crate::infrastructure::source::DirectorySource;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Survey snapshots under `settings.data_dir`
    pub source: Arc<DirectorySource>,

    pub survey: SurveyService,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        let settings = Arc::new(settings);
        let source = Arc::new(DirectorySource::with_fs(
            settings.data_dir.clone(),
            fs,
        ));
        let survey = SurveyService::new(source.clone(), source.clone());

        Self {
            settings,
            source,
            survey,
        }
    }
}
