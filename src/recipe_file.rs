//! Recipe documents on disk.
//!
//! A recipe file describes one [`SoftwareVersion`]: optional name, version
//! and architecture, the starting parameter, and the flat step list. TOML
//! and JSON are accepted, chosen by file extension:
//!
//! ```toml
//! name = "firefox"
//! version = "67.0"
//! arch = "X86_64"
//! parameter = "firefox/67.0/Firefox Setup.exe"
//!
//! [[steps]]
//! op = "DOWNLOAD"
//! parameter = "{{0}}"
//!
//! [[steps]]
//! op = "COMMAND"
//! parameter = "{{0}} -ms"
//!
//! [[steps]]
//! op = "POP"
//!
//! [[steps]]
//! op = "POP"
//! ```

use anyhow::{Context, Result, bail};
use std::path::Path;

use crate::software::SoftwareVersion;

/// Serialization format of a recipe file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeFormat {
    Toml,
    Json,
}

impl RecipeFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(Self::Toml),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::Json),
            _ => bail!(
                "unsupported recipe file {} (expected .toml or .json)",
                path.display()
            ),
        }
    }
}

/// Parse recipe text in the given format.
pub fn parse(text: &str, format: RecipeFormat) -> Result<SoftwareVersion> {
    match format {
        RecipeFormat::Toml => toml::from_str(text).context("invalid TOML recipe"),
        RecipeFormat::Json => serde_json::from_str(text).context("invalid JSON recipe"),
    }
}

/// Load a recipe file.
pub fn load(path: &Path) -> Result<SoftwareVersion> {
    let format = RecipeFormat::from_path(path)?;
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut software = parse(&text, format).with_context(|| format!("in {}", path.display()))?;
    if software.name.is_none() {
        software.name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned());
    }
    tracing::debug!(path = %path.display(), steps = software.steps.len(), "loaded recipe");
    Ok(software)
}
