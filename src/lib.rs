//! boqflow-backend: blueprint-to-BOQ extraction, pricing and submission
//! ledger service.

pub mod api;
pub mod app;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod routes;
pub mod services;
