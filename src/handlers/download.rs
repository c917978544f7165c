//! DOWNLOAD: fetch a file over HTTP(S) or FTP into a temporary file.
//!
//! Complete URLs are used as given; anything else is a path on the
//! software mirror. Failed attempts are retried a bounded number of times.

use anyhow::{Context, Result, bail};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

use crate::config::InstallerConfig;
use crate::core::output;
use crate::core::stack::{Cleanup, Frame};
use crate::helpers::progress::{self, ProgressGuard, upgrade_to_bytes};
use crate::helpers::{fs_utils, url_utils};
use crate::installer::Installer;
use crate::mirror::{UrlBuilder, is_absolute_url};

#[derive(Debug, Clone)]
pub struct DownloadHandler {
    urls: UrlBuilder,
    attempts: u32,
    timeout: Duration,
    wait_until: Option<SystemTime>,
    quiet: bool,
}

impl DownloadHandler {
    pub fn new(urls: UrlBuilder, attempts: u32, timeout: Duration) -> Self {
        Self {
            urls,
            attempts: attempts.max(1),
            timeout,
            wait_until: None,
            quiet: false,
        }
    }

    pub fn from_config(config: &InstallerConfig) -> Self {
        let handler = Self::new(
            config.url_builder(),
            config.download_attempts,
            config.http_timeout(),
        );
        match config.download_not_before() {
            Some(when) => handler.wait_until(when),
            None => handler,
        }
    }

    /// Hold every attempt until `when`.
    pub fn wait_until(mut self, when: SystemTime) -> Self {
        self.wait_until = Some(when);
        self
    }

    /// No progress bar or detail output.
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    /// Full URL for a DOWNLOAD parameter.
    pub fn url_for(&self, parameter: &str) -> String {
        if is_absolute_url(parameter) {
            parameter.to_string()
        } else {
            self.urls.build_software_download(parameter)
        }
    }

    fn wait(&self) {
        let Some(when) = self.wait_until else {
            return;
        };
        if let Ok(remaining) = when.duration_since(SystemTime::now()) {
            debug!(ms = remaining.as_millis() as u64, "waiting before download");
            std::thread::sleep(remaining);
        }
    }

    fn fetch(&self, url: &str, dest: &Path) -> Result<u64> {
        let name = url_utils::extract_filename(url);
        let pb = if self.quiet {
            progress::hidden()
        } else {
            progress::create_spinner(&format!("downloading {}", name))
        };
        let _guard = ProgressGuard::new(&pb);

        let agent = ureq::AgentBuilder::new().timeout(self.timeout).build();
        let response = agent
            .get(url)
            .call()
            .map_err(|e| anyhow::anyhow!("download failed: {}", e))?;

        if let Some(len) = response
            .header("content-length")
            .and_then(|s| s.parse().ok())
        {
            upgrade_to_bytes(&pb, len);
        }

        let mut file = File::create(dest)
            .with_context(|| format!("cannot create file {}", dest.display()))?;
        let mut reader = response.into_reader();
        let mut buffer = [0u8; 8192];
        let mut total_bytes = 0u64;

        loop {
            let bytes_read = reader.read(&mut buffer).context("read error")?;
            if bytes_read == 0 {
                break;
            }
            file.write_all(&buffer[..bytes_read])
                .context("write error")?;
            total_bytes += bytes_read as u64;
            pb.set_position(total_bytes);
        }

        Ok(total_bytes)
    }
}

impl super::Handler for DownloadHandler {
    fn handle(&self, parameter: &str, _installer: &mut Installer<'_>) -> Result<Frame> {
        let url = self.url_for(parameter);
        let suffix = format!("-{}", url_utils::extract_filename(parameter));
        let target = fs_utils::persistent_temp_file(&suffix)?;

        let mut attempt = 1;
        let fetched = loop {
            self.wait();
            debug!(%url, attempt, "starting download");
            match self.fetch(&url, &target) {
                Ok(bytes) => break bytes,
                Err(e) if attempt < self.attempts => {
                    warn!(%url, attempt, "download failed, retrying: {:#}", e);
                    attempt += 1;
                }
                Err(e) => {
                    let _ = fs_utils::delete_recursive(&target);
                    bail!("exception during download of {}: {:#}", url, e);
                }
            }
        };

        if !self.quiet {
            output::detail(&format!("downloaded {} ({} bytes)", url, fetched));
        }
        fs_utils::set_executable(&target)?;
        let path = fs_utils::canonical(&target)?;
        Ok(Frame::new(path.clone()).with_cleanup(Cleanup::delete(path)))
    }
}
