//! The software descriptor a recipe installs.

use serde::{Deserialize, Serialize};

use crate::core::step::Step;
use crate::platform::Arch;

/// One installable software version: its recipe and starting parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftwareVersion {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub arch: Option<Arch>,
    /// Seed value for the stack; may contain named-constant placeholders.
    #[serde(default)]
    pub parameter: String,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl SoftwareVersion {
    pub fn new(steps: Vec<Step>, parameter: impl Into<String>) -> Self {
        Self {
            steps,
            parameter: parameter.into(),
            ..Default::default()
        }
    }

    pub fn with_version(mut self, version: impl Into<String>, arch: Arch) -> Self {
        self.version = Some(version.into());
        self.arch = Some(arch);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Display name: explicit name, else version, else "recipe".
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.version.as_deref())
            .unwrap_or("recipe")
    }
}

/// Reads numeric components out of a human-readable version string.
///
/// Only a leading run of `digits.` groups counts; anything unparseable is 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionParser {
    readable: String,
}

impl VersionParser {
    pub fn new(readable: Option<&str>) -> Self {
        Self {
            readable: readable.unwrap_or_default().to_string(),
        }
    }

    pub fn major(&self) -> u32 {
        self.get(0)
    }

    pub fn minor(&self) -> u32 {
        self.get(1)
    }

    /// Component at `index` (0 = major).
    pub fn get(&self, index: usize) -> u32 {
        let mut rest = self.readable.as_str();
        let mut version = 0;

        for i in 0..=index {
            let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
            if digits == 0 {
                return 0;
            }
            let dotted = rest[digits..].starts_with('.');
            if !dotted && i != index {
                // the group ends without a dot, so later components don't exist
                return 0;
            }
            version = rest[..digits].parse().unwrap_or(0);
            rest = &rest[digits + usize::from(dotted)..];
        }

        version
    }
}

impl std::fmt::Display for VersionParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.readable)
    }
}
