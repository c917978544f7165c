//! Run exclusion for recipe files.
//!
//! `recipe run` holds an advisory lock on `<recipe>.lock` while it executes.
//! The lock file records the holder's process id so a second run can say
//! who it is waiting on. The operating system drops the lock with its
//! process, so a leftover file from a crashed run is simply taken over.

use anyhow::{Context, Result, bail};
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};

/// Exclusive hold on one recipe file; released and removed on drop.
#[derive(Debug)]
pub struct RunLock {
    file: File,
    path: PathBuf,
}

impl RunLock {
    /// Lock file guarding `recipe`: the same name plus `.lock`.
    pub fn path_for(recipe: &Path) -> PathBuf {
        let mut name = recipe.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Take the lock without waiting. Fails if another run holds it.
    pub fn acquire(recipe: &Path) -> Result<Self> {
        let path = Self::path_for(recipe);
        let mut file = File::options()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)
            .with_context(|| format!("cannot open lock file {}", path.display()))?;

        if file.try_lock_exclusive().is_err() {
            let holder = read_pid(&mut file)
                .map(|pid| format!(" (process {})", pid))
                .unwrap_or_default();
            bail!(
                "{} is already being executed{}; remove {} if no run is active",
                recipe.display(),
                holder,
                path.display()
            );
        }

        file.set_len(0)
            .and_then(|_| file.rewind())
            .and_then(|_| write!(file, "{}", std::process::id()))
            .with_context(|| format!("cannot write lock file {}", path.display()))?;
        tracing::debug!(path = %path.display(), "recipe lock taken");

        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
        let _ = FileExt::unlock(&self.file);
    }
}

fn read_pid(file: &mut File) -> Option<u32> {
    let mut text = String::new();
    file.read_to_string(&mut text).ok()?;
    text.trim().parse().ok()
}
