//! API route handlers

pub mod fields;
pub mod filters;
pub mod health;
pub mod styles;
