//! Service layer modules.
//!
//! The BOQ pipeline stages (extraction, parsing, matching, costing, export),
//! the price catalog store, the submission ledger and the AI collaborator
//! client all live here.

pub mod ai_client;
pub mod catalog;
pub mod costing;
pub mod extractor;
pub mod ledger;
pub mod matcher;
pub mod parser;
pub mod review;
pub mod workbook;

pub use ai_client::{AiClient, ExtractionBackend, HeuristicBackend, ReviewOutcome};
pub use catalog::CatalogStore;
pub use extractor::{DocumentKind, TextExtractor};
pub use ledger::Ledger;
