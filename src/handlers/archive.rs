//! Handlers that unpack or mount archives.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::core::stack::{Cleanup, Frame};
use crate::helpers::{extract, fs_utils, process};
use crate::installer::Installer;

/// UNZIP: extract the archive at the parameter path into a fresh directory.
pub fn unzip(parameter: &str, _installer: &mut Installer<'_>) -> Result<Frame> {
    let dir = fs_utils::persistent_temp_dir("recipe-zip")?;
    if let Err(e) = extract::extract_zip(Path::new(parameter), &dir) {
        let _ = fs_utils::delete_recursive(&dir);
        return Err(e.context("exception while unzipping"));
    }
    let dir = fs_utils::canonical(&dir)?;
    Ok(Frame::new(dir.clone()).with_cleanup(Cleanup::delete(dir)))
}

/// DMG: mount a disk image under `/Volumes/techmountN`.
///
/// N counts up per handler so nested mounts never collide.
#[derive(Debug, Default)]
pub struct DmgHandler {
    counter: AtomicUsize,
}

impl DmgHandler {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_mount_dir(&self) -> String {
        format!("/Volumes/techmount{}", self.counter.fetch_add(1, Ordering::SeqCst))
    }
}

impl super::Handler for DmgHandler {
    fn handle(&self, parameter: &str, _installer: &mut Installer<'_>) -> Result<Frame> {
        let mount_dir = self.next_mount_dir();
        process::run_command(
            &[
                "hdiutil",
                "attach",
                parameter,
                "-mountpoint",
                &mount_dir,
                "-nobrowse",
                "-quiet",
            ],
            None,
        )
        .context("can't mount the dmg")?;
        Ok(Frame::new(mount_dir.clone()).with_cleanup(Cleanup::unmount(mount_dir)))
    }
}

/// DMG_EULA: convert an image with a license prompt into a plain CD master.
pub fn dmg_eula(parameter: &str, _installer: &mut Installer<'_>) -> Result<Frame> {
    let cdr = std::env::temp_dir().join("tech.cdr");
    let cdr = cdr.to_string_lossy().into_owned();
    process::run_command(
        &["hdiutil", "convert", parameter, "-format", "UDTO", "-o", &cdr],
        None,
    )
    .context("error while converting dmg file")?;
    Ok(Frame::new(cdr.clone()).with_cleanup(Cleanup::delete(cdr)))
}
