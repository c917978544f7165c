//! Facts about the target machine.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;
use uuid::Uuid;

use crate::helpers::process;

/// Operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OsFamily {
    Win,
    Mac,
    /// Generic Linux; treated as a hub.
    Linux,
    Ubuntu,
    Debian,
    Fedora,
    Android,
    Ios,
    Hub,
    Testbirds,
    Unknown,
}

impl OsFamily {
    const ALL: [OsFamily; 11] = [
        OsFamily::Win,
        OsFamily::Mac,
        OsFamily::Linux,
        OsFamily::Ubuntu,
        OsFamily::Debian,
        OsFamily::Fedora,
        OsFamily::Android,
        OsFamily::Ios,
        OsFamily::Hub,
        OsFamily::Testbirds,
        OsFamily::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Win => "WIN",
            Self::Mac => "MAC",
            Self::Linux => "LINUX",
            Self::Ubuntu => "UBUNTU",
            Self::Debian => "DEBIAN",
            Self::Fedora => "FEDORA",
            Self::Android => "ANDROID",
            Self::Ios => "IOS",
            Self::Hub => "HUB",
            Self::Testbirds => "TESTBIRDS",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub fn is_hub(self) -> bool {
        matches!(self, Self::Linux | Self::Hub)
    }

    pub fn path_separator(self) -> &'static str {
        if self == Self::Win { "\\" } else { "/" }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OsFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == upper)
            .ok_or_else(|| format!("unknown OS family: {}", s))
    }
}

/// CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Arch {
    X86,
    X86_64,
    Aarch64,
}

impl Arch {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::X86 => "X86",
            Self::X86_64 => "X86_64",
            Self::Aarch64 => "AARCH64",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Arch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x86" | "i386" | "i686" => Ok(Self::X86),
            "x86_64" | "amd64" => Ok(Self::X86_64),
            "aarch64" | "arm64" => Ok(Self::Aarch64),
            _ => Err(format!("unknown architecture: {}", s)),
        }
    }
}

/// Provider of facts about the machine recipes run on.
pub trait OsFacts {
    fn unique_id(&self) -> Uuid;
    fn os_family(&self) -> OsFamily;
    fn os_architecture(&self) -> Arch;
    fn os_version(&self) -> String;
    fn reboot(&self) -> Result<()>;
}

/// Facts of the machine this process runs on, detected once at startup.
#[derive(Debug, Clone)]
pub struct LocalFacts {
    id: Uuid,
    family: OsFamily,
    arch: Arch,
    version: String,
}

impl LocalFacts {
    /// Detect everything not given explicitly.
    pub fn detect(id: Option<Uuid>, family: Option<OsFamily>, arch: Option<Arch>) -> Self {
        let family = family.unwrap_or_else(detect_family);
        Self {
            id: id.unwrap_or_else(detect_machine_id),
            family,
            arch: arch.unwrap_or_else(detect_arch),
            version: detect_version(family),
        }
    }
}

impl OsFacts for LocalFacts {
    fn unique_id(&self) -> Uuid {
        self.id
    }

    fn os_family(&self) -> OsFamily {
        self.family
    }

    fn os_architecture(&self) -> Arch {
        self.arch
    }

    fn os_version(&self) -> String {
        self.version.clone()
    }

    fn reboot(&self) -> Result<()> {
        let cmd: &[&str] = if self.family == OsFamily::Win {
            &["shutdown", "/r", "/t", "0"]
        } else {
            &["sudo", "shutdown", "-r", "now"]
        };
        process::run_command(cmd, None).context("reboot failed")?;
        Ok(())
    }
}

fn detect_family() -> OsFamily {
    match std::env::consts::OS {
        "windows" => OsFamily::Win,
        "macos" => OsFamily::Mac,
        "ios" => OsFamily::Ios,
        "android" => OsFamily::Android,
        "linux" => {
            let release = std::fs::read_to_string("/etc/os-release").unwrap_or_default();
            let id = release
                .lines()
                .find_map(|l| l.strip_prefix("ID="))
                .map(|v| v.trim_matches('"').to_ascii_lowercase());
            match id.as_deref() {
                Some("ubuntu") => OsFamily::Ubuntu,
                Some("debian") => OsFamily::Debian,
                Some("fedora") => OsFamily::Fedora,
                _ => OsFamily::Linux,
            }
        }
        _ => OsFamily::Unknown,
    }
}

fn detect_arch() -> Arch {
    std::env::consts::ARCH.parse().unwrap_or(Arch::X86_64)
}

fn detect_machine_id() -> Uuid {
    std::fs::read_to_string("/etc/machine-id")
        .ok()
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
        .unwrap_or_else(|| {
            warn!("no machine id found, using a random one");
            Uuid::new_v4()
        })
}

fn detect_version(family: OsFamily) -> String {
    let cmd: &[&str] = match family {
        OsFamily::Win => &["cmd", "/C", "ver"],
        OsFamily::Mac => &["sw_vers", "-productVersion"],
        _ => &["uname", "-r"],
    };
    match process::run_command(cmd, None) {
        Ok(out) => out.trim().to_string(),
        Err(e) => {
            warn!("cannot determine OS version: {:#}", e);
            String::new()
        }
    }
}

/// Facts fixed at construction. Reboots are recorded, not performed.
#[derive(Debug)]
pub struct StaticFacts {
    id: Uuid,
    family: OsFamily,
    arch: Arch,
    version: String,
    rebooted: AtomicBool,
}

impl StaticFacts {
    pub fn new(family: OsFamily, arch: Arch) -> Self {
        Self {
            id: Uuid::new_v4(),
            family,
            arch,
            version: String::new(),
            rebooted: AtomicBool::new(false),
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Whether `reboot()` was called.
    pub fn rebooted(&self) -> bool {
        self.rebooted.load(Ordering::SeqCst)
    }
}

impl OsFacts for StaticFacts {
    fn unique_id(&self) -> Uuid {
        self.id
    }

    fn os_family(&self) -> OsFamily {
        self.family
    }

    fn os_architecture(&self) -> Arch {
        self.arch
    }

    fn os_version(&self) -> String {
        self.version.clone()
    }

    fn reboot(&self) -> Result<()> {
        self.rebooted.store(true, Ordering::SeqCst);
        Ok(())
    }
}
