//! Archive extraction
//!
//! Native zip extraction; no external tools needed.

use anyhow::{Context, Result, bail};
use std::fs::File;
use std::path::Path;

/// Extract a zip archive into `dest`, which must exist.
///
/// Entries whose path would land outside `dest` abort the extraction.
/// Returns the number of files written.
pub fn extract_zip(archive_path: &Path, dest: &Path) -> Result<usize> {
    let file = File::open(archive_path)
        .with_context(|| format!("cannot open {}", archive_path.display()))?;

    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("zip read error: {}", archive_path.display()))?;

    let mut written = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).context("zip entry error")?;

        let Some(rel) = entry.enclosed_name() else {
            bail!("zip entry escapes destination: {}", entry.name());
        };
        let outpath = dest.join(rel);

        if entry.is_dir() {
            std::fs::create_dir_all(&outpath)
                .with_context(|| format!("cannot create directory {}", outpath.display()))?;
            continue;
        }

        if let Some(parent) = outpath.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("cannot create directory {}", parent.display()))?;
        }

        let mut outfile = File::create(&outpath)
            .with_context(|| format!("cannot create {}", outpath.display()))?;
        std::io::copy(&mut entry, &mut outfile)
            .with_context(|| format!("write error for {}", outpath.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode)).ok();
            }
        }
        written += 1;
    }

    Ok(written)
}
