//! Recipe steps and the operations they name.
//!
//! A recipe is a tree of steps flattened into a list. Every step except
//! [`Operation::Pop`] opens a nesting level; a POP closes the innermost open
//! level and discards the value that level pushed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// All operations a step can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    /// Close the current level, running the popped frame's cleanup.
    Pop,
    /// Download a URL (or mirror-relative path) to a temporary file.
    Download,
    /// Upload a local file to the VM host.
    Upload,
    /// Push the parameter itself.
    Set,
    /// Run a shell command; pushes the exit code plus captured output.
    Command,
    /// Start a shell command without waiting for it.
    Async,
    /// Mount a .dmg image.
    Dmg,
    /// Install a .pkg file.
    Pkg,
    /// Extract a .zip archive to a temporary directory.
    Unzip,
    /// Convert a .dmg with a license agreement into a mountable image.
    DmgEula,
    ApkUninstall,
    ApkInstall,
    ApkInstallSystem,
    /// Copy the top value to the parameter path.
    Copy,
    /// Move the top value to the parameter path.
    Move,
    Adb,
    /// Write the parameter into a temporary file.
    ToFile,
    /// Push the content of a file.
    FromFile,
    Reboot,
    /// Reboot the machine immediately.
    RebootNow,
    Wait,
    AfterInstall,
    /// Compare the top value with the parameter.
    Equals,
    IosInstall,
    /// Install a certificate into the system trust store.
    InstallCert,
    /// Move the top value into a fresh Firefox profile.
    MoveFf,
}

impl Operation {
    pub const ALL: [Operation; 26] = [
        Operation::Pop,
        Operation::Download,
        Operation::Upload,
        Operation::Set,
        Operation::Command,
        Operation::Async,
        Operation::Dmg,
        Operation::Pkg,
        Operation::Unzip,
        Operation::DmgEula,
        Operation::ApkUninstall,
        Operation::ApkInstall,
        Operation::ApkInstallSystem,
        Operation::Copy,
        Operation::Move,
        Operation::Adb,
        Operation::ToFile,
        Operation::FromFile,
        Operation::Reboot,
        Operation::RebootNow,
        Operation::Wait,
        Operation::AfterInstall,
        Operation::Equals,
        Operation::IosInstall,
        Operation::InstallCert,
        Operation::MoveFf,
    ];

    /// The recipe spelling of this operation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pop => "POP",
            Self::Download => "DOWNLOAD",
            Self::Upload => "UPLOAD",
            Self::Set => "SET",
            Self::Command => "COMMAND",
            Self::Async => "ASYNC",
            Self::Dmg => "DMG",
            Self::Pkg => "PKG",
            Self::Unzip => "UNZIP",
            Self::DmgEula => "DMG_EULA",
            Self::ApkUninstall => "APK_UNINSTALL",
            Self::ApkInstall => "APK_INSTALL",
            Self::ApkInstallSystem => "APK_INSTALL_SYSTEM",
            Self::Copy => "COPY",
            Self::Move => "MOVE",
            Self::Adb => "ADB",
            Self::ToFile => "TO_FILE",
            Self::FromFile => "FROM_FILE",
            Self::Reboot => "REBOOT",
            Self::RebootNow => "REBOOT_NOW",
            Self::Wait => "WAIT",
            Self::AfterInstall => "AFTER_INSTALL",
            Self::Equals => "EQUALS",
            Self::IosInstall => "IOS_INSTALL",
            Self::InstallCert => "INSTALL_CERT",
            Self::MoveFf => "MOVE_FF",
        }
    }

    /// True for the scope-closing marker.
    pub fn is_pop(self) -> bool {
        self == Self::Pop
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == upper)
            .ok_or_else(|| format!("unknown operation: {}", s))
    }
}

/// A single recipe step. The parameter may still contain placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    #[serde(rename = "op")]
    pub operation: Operation,
    #[serde(default)]
    pub parameter: String,
}

impl Step {
    pub fn new(operation: Operation, parameter: impl Into<String>) -> Self {
        Self {
            operation,
            parameter: parameter.into(),
        }
    }

    pub fn pop() -> Self {
        Self::new(Operation::Pop, "")
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.parameter.is_empty() {
            write!(f, "{}", self.operation)
        } else {
            write!(f, "{}({})", self.operation, self.parameter)
        }
    }
}

/// Fluent builder for step lists.
///
/// `build()` appends as many POPs as are needed to close every level that is
/// still open, so a builder can describe a chain without spelling out the
/// trailing POPs.
#[derive(Debug, Default, Clone)]
pub struct StepsBuilder {
    steps: Vec<Step>,
}

impl StepsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, operation: Operation, parameter: impl Into<String>) -> Self {
        self.steps.push(Step::new(operation, parameter));
        self
    }

    pub fn pop(self) -> Self {
        self.add(Operation::Pop, "")
    }

    pub fn cmd(self, command: impl Into<String>) -> Self {
        self.add(Operation::Command, command)
    }

    pub fn move_to(self, target: impl Into<String>) -> Self {
        self.add(Operation::Move, target)
    }

    pub fn to_file(self, content: impl Into<String>) -> Self {
        self.add(Operation::ToFile, content)
    }

    /// Steps added so far, without the closing POPs.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn build(mut self) -> Vec<Step> {
        let open: isize = self
            .steps
            .iter()
            .map(|s| if s.operation.is_pop() { -1 } else { 1 })
            .sum();
        for _ in 0..open.max(0) {
            self.steps.push(Step::pop());
        }
        self.steps
    }
}
