//! Pattern library for canonicalization and structured PII detection
//!
//! The library is loaded once (embedded default or a custom TOML file),
//! compiled, and then shared read-only behind an `Arc`. Section patterns keep
//! their file order, which is part of the canonicalization contract.

use crate::domain::{MailprepError, Result};
use crate::pipeline::models::{PiiType, SectionCategory};
use regex::Regex;
use serde::Deserialize;
use std::path::Path;

/// Embedded default library
const DEFAULT_LIBRARY: &str = include_str!("../../../patterns/mail_patterns.toml");

/// Section pattern definition from TOML
#[derive(Debug, Clone, Deserialize)]
struct SectionDefinition {
    name: String,
    category: SectionCategory,
    #[serde(default = "default_section_confidence")]
    confidence: f32,
    pattern: String,
}

fn default_section_confidence() -> f32 {
    1.0
}

/// PII pattern definition from TOML
#[derive(Debug, Clone, Deserialize)]
struct PiiDefinition {
    name: String,
    pii_type: PiiType,
    pattern: String,
}

/// Whitelist pattern definition from TOML
#[derive(Debug, Clone, Deserialize)]
struct WhitelistDefinition {
    name: String,
    pattern: String,
}

/// Library file layout
#[derive(Debug, Deserialize)]
struct LibraryFile {
    version: String,
    #[serde(default)]
    sections: Vec<SectionDefinition>,
    #[serde(default)]
    pii: Vec<PiiDefinition>,
    #[serde(default)]
    whitelist: Vec<WhitelistDefinition>,
}

/// Compiled section pattern
#[derive(Debug, Clone)]
pub struct SectionPattern {
    pub name: String,
    pub category: SectionCategory,
    pub confidence: f32,
    pub regex: Regex,
}

/// Compiled structured PII pattern
#[derive(Debug, Clone)]
pub struct PiiPattern {
    pub name: String,
    pub pii_type: PiiType,
    pub regex: Regex,
}

/// Compiled whitelist pattern
#[derive(Debug, Clone)]
pub struct WhitelistPattern {
    pub name: String,
    pub regex: Regex,
}

/// Ordered, versioned, compiled pattern library
#[derive(Debug, Clone)]
pub struct PatternLibrary {
    version: String,
    sections: Vec<SectionPattern>,
    pii: Vec<PiiPattern>,
    whitelist: Vec<WhitelistPattern>,
}

impl PatternLibrary {
    /// Load the embedded default library
    pub fn embedded() -> Result<Self> {
        Self::from_toml(DEFAULT_LIBRARY)
    }

    /// Load a library from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            MailprepError::PatternLibrary(format!(
                "Failed to read pattern library {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml(&content)
    }

    /// Parse and compile a library from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: LibraryFile = toml::from_str(content).map_err(|e| {
            MailprepError::PatternLibrary(format!("Failed to parse pattern library TOML: {e}"))
        })?;

        if file.version.trim().is_empty() {
            return Err(MailprepError::PatternLibrary(
                "Pattern library version cannot be empty".to_string(),
            ));
        }

        let mut sections = Vec::with_capacity(file.sections.len());
        for def in file.sections {
            if !(0.0..=1.0).contains(&def.confidence) {
                return Err(MailprepError::PatternLibrary(format!(
                    "Section pattern '{}' has confidence {} outside [0, 1]",
                    def.name, def.confidence
                )));
            }
            let regex = compile(&def.name, &def.pattern)?;
            sections.push(SectionPattern {
                name: def.name,
                category: def.category,
                confidence: def.confidence,
                regex,
            });
        }

        let mut pii = Vec::with_capacity(file.pii.len());
        for def in file.pii {
            if def.pii_type.is_entity_type() {
                return Err(MailprepError::PatternLibrary(format!(
                    "PII pattern '{}' uses {} which is reserved for the entity recognizer",
                    def.name, def.pii_type
                )));
            }
            let regex = compile(&def.name, &def.pattern)?;
            pii.push(PiiPattern {
                name: def.name,
                pii_type: def.pii_type,
                regex,
            });
        }

        let mut whitelist = Vec::with_capacity(file.whitelist.len());
        for def in file.whitelist {
            let regex = compile(&def.name, &def.pattern)?;
            whitelist.push(WhitelistPattern {
                name: def.name,
                regex,
            });
        }

        tracing::debug!(
            version = %file.version,
            sections = sections.len(),
            pii = pii.len(),
            whitelist = whitelist.len(),
            "Pattern library compiled"
        );

        Ok(Self {
            version: file.version,
            sections,
            pii,
            whitelist,
        })
    }

    /// Library version
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Section patterns in application order
    pub fn sections(&self) -> &[SectionPattern] {
        &self.sections
    }

    /// Structured PII patterns
    pub fn pii_patterns(&self) -> &[PiiPattern] {
        &self.pii
    }

    /// Whitelist patterns
    pub fn whitelist(&self) -> &[WhitelistPattern] {
        &self.whitelist
    }
}

fn compile(name: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| {
        MailprepError::PatternLibrary(format!("Invalid regex in pattern '{name}': {e}"))
    })
}
