//! Domain error and result types.
//!
//! Two error families live here:
//! - [`MailprepError`] for everything around the pipeline (configuration,
//!   pattern library loading, I/O), returned through [`Result`];
//! - [`PipelineFault`] for faults raised inside the pipeline. Faults never
//!   reach callers of the engine; they are classified by [`FaultCategory`]
//!   and absorbed by the degradation ladder.

pub mod errors;
pub mod result;

pub use errors::{FaultCategory, MailprepError, PipelineFault};
pub use result::Result;
