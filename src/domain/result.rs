//! Result type alias for mailprep

use super::errors::MailprepError;

/// Result type alias for mailprep operations outside the pipeline
///
/// ```
/// use mailprep::domain::{MailprepError, Result};
///
/// fn load() -> Result<String> {
///     Err(MailprepError::Validation("pii_key is required".to_string()))
/// }
///
/// assert!(load().is_err());
/// ```
pub type Result<T> = std::result::Result<T, MailprepError>;
