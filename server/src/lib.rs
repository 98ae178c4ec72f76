//! elastic-builder server
//!
//! Hosts the filter codec for an external query editor: a JSON HTTP API,
//! one-shot conversion commands and the configuration holding the FieldMap.

pub mod api;
pub mod app;
pub mod core;
pub mod utils;
