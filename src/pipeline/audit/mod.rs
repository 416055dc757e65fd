//! Audit logging module
//!
//! Append-only record of pipeline outcomes: levels, faults, counts and
//! keyed content hashes. Never text or previews.

pub mod logger;

pub use logger::AuditLogger;
