//! Foundational data structures, error types, and configuration.

pub mod error;
pub mod models;
pub mod options;
