//! Installer configuration.
//!
//! Layers, lowest precedence first: built-in defaults, the user config file
//! (`$XDG_CONFIG_HOME/recipe/config.toml`), an explicit `--config` file,
//! `RECIPE_*` environment variables, and finally CLI flags applied by the
//! binary.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::mirror::{DEFAULT_LOCAL_VMHOST, DEFAULT_SOFTWARE_MIRROR, UrlBuilder};
use crate::platform::{Arch, OsFamily};

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DOWNLOAD_ATTEMPTS: u32 = 3;

const MIN_HTTP_TIMEOUT_SECS: u64 = 5;
const MAX_HTTP_TIMEOUT_SECS: u64 = 300;

/// One config file; every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigToml {
    software_mirror: Option<String>,
    local_vmhost: Option<String>,
    download_attempts: Option<u32>,
    http_timeout_secs: Option<u64>,
    download_not_before: Option<u64>,
    machine_id: Option<Uuid>,
    os_family: Option<OsFamily>,
    arch: Option<Arch>,
}

impl ConfigToml {
    fn merge(&mut self, other: ConfigToml) {
        if other.software_mirror.is_some() {
            self.software_mirror = other.software_mirror;
        }
        if other.local_vmhost.is_some() {
            self.local_vmhost = other.local_vmhost;
        }
        if other.download_attempts.is_some() {
            self.download_attempts = other.download_attempts;
        }
        if other.http_timeout_secs.is_some() {
            self.http_timeout_secs = other.http_timeout_secs;
        }
        if other.download_not_before.is_some() {
            self.download_not_before = other.download_not_before;
        }
        if other.machine_id.is_some() {
            self.machine_id = other.machine_id;
        }
        if other.os_family.is_some() {
            self.os_family = other.os_family;
        }
        if other.arch.is_some() {
            self.arch = other.arch;
        }
    }

    /// Overrides taken from `RECIPE_*` variables, read through `var`.
    fn from_env(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        fn parsed<T: std::str::FromStr>(
            var: &impl Fn(&str) -> Option<String>,
            key: &str,
        ) -> Result<Option<T>>
        where
            T::Err: std::fmt::Display,
        {
            var(key)
                .map(|raw| {
                    raw.trim()
                        .parse::<T>()
                        .map_err(|e| anyhow::anyhow!("invalid {}={:?}: {}", key, raw, e))
                })
                .transpose()
        }

        Ok(Self {
            software_mirror: var("RECIPE_SOFTWARE_MIRROR"),
            local_vmhost: var("RECIPE_LOCAL_VMHOST"),
            download_attempts: parsed(&var, "RECIPE_DOWNLOAD_ATTEMPTS")?,
            http_timeout_secs: parsed(&var, "RECIPE_HTTP_TIMEOUT")?,
            download_not_before: parsed(&var, "RECIPE_DOWNLOAD_NOT_BEFORE")?,
            ..Default::default()
        })
    }
}

/// Effective settings for one installer process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallerConfig {
    pub software_mirror: String,
    pub local_vmhost: String,
    /// Attempts per DOWNLOAD step, at least 1.
    pub download_attempts: u32,
    /// HTTP timeout, clamped to 5-300 s.
    pub http_timeout_secs: u64,
    /// Unix time (seconds) before which no download attempt starts.
    pub download_not_before: Option<u64>,
    /// Overrides the detected machine id.
    pub machine_id: Option<Uuid>,
    /// Overrides the detected OS family.
    pub os_family: Option<OsFamily>,
    /// Overrides the detected architecture.
    pub arch: Option<Arch>,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            software_mirror: DEFAULT_SOFTWARE_MIRROR.to_string(),
            local_vmhost: DEFAULT_LOCAL_VMHOST.to_string(),
            download_attempts: DEFAULT_DOWNLOAD_ATTEMPTS,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            download_not_before: None,
            machine_id: None,
            os_family: None,
            arch: None,
        }
    }
}

impl InstallerConfig {
    /// Load from the user config file, `explicit` (if given) and the
    /// process environment.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let user = user_config_path();
        let files: Vec<&Path> = user
            .as_deref()
            .filter(|p| p.exists())
            .into_iter()
            .chain(explicit)
            .collect();
        Self::load_from(&files, |key| std::env::var(key).ok())
    }

    /// Load from `files` in order, then from variables read through `var`.
    pub fn load_from(files: &[&Path], var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut merged = ConfigToml::default();
        for path in files {
            merged.merge(read_toml(path)?);
            tracing::debug!(path = %path.display(), "loaded config file");
        }
        merged.merge(ConfigToml::from_env(var)?);
        Ok(Self::default().apply(merged))
    }

    fn apply(mut self, cfg: ConfigToml) -> Self {
        if let Some(mirror) = cfg.software_mirror {
            self.software_mirror = mirror;
        }
        if let Some(host) = cfg.local_vmhost {
            self.local_vmhost = host;
        }
        if let Some(attempts) = cfg.download_attempts {
            self.download_attempts = attempts;
        }
        if let Some(secs) = cfg.http_timeout_secs {
            self.http_timeout_secs = secs;
        }
        self.download_not_before = cfg.download_not_before.or(self.download_not_before);
        self.machine_id = cfg.machine_id.or(self.machine_id);
        self.os_family = cfg.os_family.or(self.os_family);
        self.arch = cfg.arch.or(self.arch);
        self.normalized()
    }

    /// Clamp values into their valid ranges.
    pub fn normalized(mut self) -> Self {
        self.download_attempts = self.download_attempts.max(1);
        self.http_timeout_secs = self
            .http_timeout_secs
            .clamp(MIN_HTTP_TIMEOUT_SECS, MAX_HTTP_TIMEOUT_SECS);
        self
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn download_not_before(&self) -> Option<SystemTime> {
        self.download_not_before
            .map(|secs| UNIX_EPOCH + Duration::from_secs(secs))
    }

    pub fn url_builder(&self) -> UrlBuilder {
        UrlBuilder::new(&self.software_mirror, &self.local_vmhost)
    }
}

fn xdg_config_home() -> Option<PathBuf> {
    if let Ok(raw) = std::env::var("XDG_CONFIG_HOME") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    dirs::config_dir()
}

/// `$XDG_CONFIG_HOME/recipe/config.toml`, if a config directory is known.
pub fn user_config_path() -> Option<PathBuf> {
    xdg_config_home().map(|dir| dir.join("recipe").join("config.toml"))
}

fn read_toml(path: &Path) -> Result<ConfigToml> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("Invalid TOML in {}", path.display()))
}
