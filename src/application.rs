// Application layer modules
pub mod export_handler;
pub mod trigger_event;

// Re-exports
pub use export_handler::{ExportHandler, ExportOutcome};
pub use trigger_event::{TriggerEvent, TriggerEventError};
