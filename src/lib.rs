//! Copies the external dependency closure of a unit under a destination
//! prefix and optionally rewrites imports to point at the copies.

// Ambient infrastructure: errors, configuration, events
pub mod core;

pub mod resolve; // Unit lookup and the per-run resolver cache
pub mod source; // Import scanning and rewriting
pub mod vendor; // Graph walker, coordinator, materialization

// Re-exports for convenience
pub use crate::core::config::{SearchPath, VendorConfig};
pub use crate::core::errors::{Result, VendorError};
pub use crate::core::events::{EventSink, VendorEvent};
pub use resolve::{BuildContext, GoPathResolver, MemoryResolver, ResolveError, Unit, UnitResolver};
pub use vendor::{run_vendorize, VendorReport, Vendorizer};
