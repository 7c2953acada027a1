// Domain layer modules
pub mod export_destination;
pub mod store_path;

// Re-exports
pub use export_destination::GcsDestination;
pub use store_path::{DicomStorePath, StorePathError};
