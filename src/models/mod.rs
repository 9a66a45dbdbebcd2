//! Data models for Entre

pub mod host;
pub mod visitor;

// Re-export commonly used types
pub use host::Host;
pub use visitor::{CheckInOrder, FrequentName, VisitorEvent, VisitorRecord, VisitorType};
