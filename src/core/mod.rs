// Ambient infrastructure shared by the resolver, walker and coordinator

pub mod config;
pub mod errors;
pub mod events;

// Re-export commonly used types
pub use config::{SearchPath, VendorConfig};
pub use errors::{Result, VendorError};
pub use events::{
    BufferingEventSink, EventBus, EventEnvelope, EventSink, JsonLinesEventSink, LoggingEventSink,
    VendorEvent,
};
