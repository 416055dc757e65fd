//! Subject command implementation

use super::EXIT_OK;
use crate::pipeline::canonicalize_subject;
use clap::Args;

/// Arguments for the subject command
#[derive(Args, Debug)]
pub struct SubjectArgs {
    /// Subject line to canonicalize
    pub subject: String,
}

impl SubjectArgs {
    /// Execute the subject command
    ///
    /// Only canonicalizes; no configuration or key is needed.
    pub async fn execute(&self) -> anyhow::Result<i32> {
        println!("{}", canonicalize_subject(&self.subject));
        Ok(EXIT_OK)
    }
}
