//! CLI command implementations
//!
//! Commands return a process exit code: 0 on success, 2 for configuration
//! errors, 5 for fatal errors.

pub mod init;
pub mod process;
pub mod subject;
pub mod validate;

/// Successful run
pub const EXIT_OK: i32 = 0;
/// Configuration could not be loaded or is invalid
pub const EXIT_CONFIG_ERROR: i32 = 2;
/// Unrecoverable runtime error
pub const EXIT_FATAL: i32 = 5;
