//! Data models for extracted invoices and pipeline configuration.

pub mod config;
pub mod record;
