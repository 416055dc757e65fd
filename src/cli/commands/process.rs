//! Process command implementation
//!
//! Runs the engine on one message body read from a file or stdin and prints
//! the outcome as JSON on stdout. Logs go to stderr.

use super::{EXIT_CONFIG_ERROR, EXIT_FATAL, EXIT_OK};
use crate::config::load_config;
use crate::pipeline::{PipelineEngine, PipelineOutcome};
use anyhow::Context;
use clap::Args;
use serde::Serialize;
use std::collections::BTreeMap;
use tokio::io::AsyncReadExt;

/// Arguments for the process command
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Message body file (reads stdin when omitted)
    #[arg(short, long)]
    pub input: Option<String>,

    /// Subject line to canonicalize and redact alongside the body
    #[arg(short, long)]
    pub subject: Option<String>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,
}

/// JSON document printed by the process command
#[derive(Debug, Serialize)]
pub struct ProcessOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub outcome: PipelineOutcome,
}

impl ProcessArgs {
    /// Execute the process command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Processing message");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("❌ Failed to load configuration file");
                eprintln!("   Error: {e}");
                return Ok(EXIT_CONFIG_ERROR);
            }
        };

        let engine = match PipelineEngine::new(&config.pipeline) {
            Ok(engine) => engine,
            Err(e) => {
                eprintln!("❌ Failed to initialize engine");
                eprintln!("   Error: {e}");
                return Ok(EXIT_CONFIG_ERROR);
            }
        };

        let input = match self.read_input().await {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("❌ Failed to read input");
                eprintln!("   Error: {e:#}");
                return Ok(EXIT_FATAL);
            }
        };

        let output = run(&engine, &input, self.subject.as_deref()).await;
        let rendered = if self.pretty {
            serde_json::to_string_pretty(&output)
        } else {
            serde_json::to_string(&output)
        }
        .context("Failed to serialize outcome")?;

        println!("{rendered}");
        Ok(EXIT_OK)
    }

    async fn read_input(&self) -> anyhow::Result<Vec<u8>> {
        match &self.input {
            Some(path) => tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read input file {path}")),
            None => {
                let mut buffer = Vec::new();
                tokio::io::stdin()
                    .read_to_end(&mut buffer)
                    .await
                    .context("Failed to read stdin")?;
                Ok(buffer)
            }
        }
    }
}

/// Process a body and optional subject
pub async fn run(engine: &PipelineEngine, body: &[u8], subject: Option<&str>) -> ProcessOutput {
    let subject = match subject {
        Some(subject) => {
            let headers: BTreeMap<String, String> =
                engine.redact_headers([("subject", subject)]).await;
            headers.get("subject").cloned()
        }
        None => None,
    };

    ProcessOutput {
        subject,
        outcome: engine.process_bytes(body).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{DegradationLevel, PipelineConfig};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn engine() -> PipelineEngine {
        PipelineEngine::new(&PipelineConfig::with_key("Zq8vN2mR7tLw4xKc")).unwrap()
    }

    #[tokio::test]
    async fn test_run_redacts_body_and_subject() {
        let output = run(
            &engine(),
            b"Scrivete a info@azienda.it\n> vecchio messaggio",
            Some("Re: contatto info@azienda.it"),
        )
        .await;

        assert_eq!(output.subject.as_deref(), Some("contatto [PII_EMAIL]"));
        assert_eq!(output.outcome.text, "Scrivete a [PII_EMAIL]");
        assert_eq!(
            output.outcome.degradation_level,
            DegradationLevel::PiiStructuredOnly
        );
    }

    #[tokio::test]
    async fn test_output_json_has_no_subject_when_absent() {
        let output = run(&engine(), b"ciao", None).await;
        let json = serde_json::to_value(&output).unwrap();
        assert!(json.get("subject").is_none());
        assert_eq!(json["outcome"]["text"], "ciao");
    }

    #[tokio::test]
    async fn test_execute_with_missing_config() {
        let args = ProcessArgs {
            input: None,
            subject: None,
            pretty: false,
        };
        let code = args.execute("does-not-exist.toml").await.unwrap();
        assert_eq!(code, EXIT_CONFIG_ERROR);
    }

    #[tokio::test]
    async fn test_execute_with_missing_input() {
        let mut config = NamedTempFile::new().unwrap();
        writeln!(config, "[pipeline]\npii_key = \"Zq8vN2mR7tLw4xKc\"").unwrap();
        config.flush().unwrap();

        let args = ProcessArgs {
            input: Some("does-not-exist.eml".to_string()),
            subject: None,
            pretty: false,
        };
        let code = args
            .execute(config.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, EXIT_FATAL);
    }
}
