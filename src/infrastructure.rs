// Infrastructure layer modules
pub mod config;
pub mod healthcare_client;
pub mod logging;

// Re-exports
pub use config::{ExporterConfig, ExporterConfigError};
pub use healthcare_client::{DicomExporter, ExportError, HealthcareApiClient};
pub use logging::init_logging;
