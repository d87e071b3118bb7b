//! Duplicate invoice detection across source files.
//!
//! The same invoice is often submitted twice under different file names.
//! Two files are considered the same invoice when they share an invoice code
//! or an invoice number, transitively. [`DuplicateGrouper`] maintains that
//! partition incrementally, one record at a time.

mod grouper;

pub use grouper::{DuplicateGrouper, GroupId, GroupMerge, GroupOutcome};
