//! Domain types and DTOs
//!
//! Data structures for the BOQ workflow: projects, role-tagged submissions,
//! generated artifacts, extracted line items and the price catalog.

pub mod artifacts;
pub mod boq;
pub mod catalog;
pub mod projects;
pub mod submissions;

// Re-export commonly used types
pub use artifacts::*;
pub use boq::*;
pub use catalog::*;
pub use projects::*;
pub use submissions::*;
