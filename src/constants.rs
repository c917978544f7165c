//! Named constants usable as `{{NAME}}` placeholders in recipes.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::core::error::{RecipeError, Result};
use crate::mirror::UrlBuilder;
use crate::platform::{Arch, OsFacts, OsFamily};

/// Environment-dependent values a recipe can refer to by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constant {
    /// Desktop folder of the test user, with trailing separator.
    Desktop,
    /// Path separator of the target OS.
    Delimiter,
    /// Base URL of the software mirror.
    SwMirror,
    /// Unique id of this machine.
    Uuid,
    /// 32-bit program files folder on Windows, empty elsewhere.
    ProgramFilesX86,
}

impl Constant {
    pub const ALL: [Constant; 5] = [
        Constant::Desktop,
        Constant::Delimiter,
        Constant::SwMirror,
        Constant::Uuid,
        Constant::ProgramFilesX86,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Desktop => "DESKTOP",
            Self::Delimiter => "DELIMITER",
            Self::SwMirror => "SW_MIRROR",
            Self::Uuid => "UUID",
            Self::ProgramFilesX86 => "PROGRAM_FILES_X86",
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Constant {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown constant: {}", s))
    }
}

/// Supplies values for named constants.
pub trait ConstantSource {
    /// Constants this source knows. Only these are matched as placeholders.
    fn supported(&self) -> &[Constant];

    /// Value of `constant`; an error if it has no meaning on this machine.
    fn resolve(&self, constant: Constant) -> Result<String>;
}

/// Constants derived from the OS facts of the target machine.
pub struct SystemConstants {
    facts: Arc<dyn OsFacts>,
    mirror: UrlBuilder,
}

impl SystemConstants {
    pub fn new(facts: Arc<dyn OsFacts>, mirror: UrlBuilder) -> Self {
        Self { facts, mirror }
    }

    fn desktop(&self, family: OsFamily) -> Result<String> {
        let path = match family {
            OsFamily::Win => {
                if self.facts.os_version().contains("5.1") {
                    "C:\\Documents and Settings\\testbirds\\Desktop\\"
                } else {
                    "C:\\Users\\testbirds\\Desktop\\"
                }
            }
            OsFamily::Mac | OsFamily::Ios => "/Users/testbirds/Desktop/",
            OsFamily::Ubuntu | OsFamily::Fedora | OsFamily::Hub | OsFamily::Testbirds => {
                "/home/testbirds/Desktop/"
            }
            OsFamily::Android => "/sdcard/Download/",
            other => {
                return Err(RecipeError::InvalidRecipe(format!(
                    "can't resolve DESKTOP on os {}",
                    other
                )));
            }
        };
        Ok(path.to_string())
    }
}

impl ConstantSource for SystemConstants {
    fn supported(&self) -> &[Constant] {
        &Constant::ALL
    }

    fn resolve(&self, constant: Constant) -> Result<String> {
        let family = self.facts.os_family();
        match constant {
            Constant::SwMirror => Ok(self.mirror.software_mirror().to_string()),
            Constant::Desktop => self.desktop(family),
            Constant::Delimiter => Ok(family.path_separator().to_string()),
            Constant::Uuid => Ok(self.facts.unique_id().hyphenated().to_string()),
            Constant::ProgramFilesX86 => Ok(match (family, self.facts.os_architecture()) {
                (OsFamily::Win, Arch::X86_64) => "C:\\Program Files (x86)\\".to_string(),
                (OsFamily::Win, _) => "C:\\Program Files\\".to_string(),
                _ => String::new(),
            }),
        }
    }
}
