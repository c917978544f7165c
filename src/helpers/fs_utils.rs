//! Common filesystem utilities
//!
//! Shared filesystem operations used by the file-producing handlers and by
//! stack cleanup.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Ensure a file's parent directory exists.
///
/// Creates the parent directory (and all ancestors) if it doesn't exist.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create directory {}", parent.display()))?;
    }
    Ok(())
}

/// Canonical form of an existing path, as a string.
pub fn canonical(path: &Path) -> Result<String> {
    let path = std::fs::canonicalize(path)
        .with_context(|| format!("can't get the canonical path of {}", path.display()))?;
    Ok(path.to_string_lossy().into_owned())
}

/// Where a move or copy of `src` to `dest` actually lands.
///
/// A file targeted at an existing directory goes inside it under its own
/// name. A directory source always lands exactly at `dest`.
pub fn landing_path(src: &Path, dest: &Path) -> PathBuf {
    match src.file_name() {
        Some(name) if dest.is_dir() && !src.is_dir() => dest.join(name),
        _ => dest.to_path_buf(),
    }
}

/// Delete a file or directory tree. A path that doesn't exist is fine.
pub fn delete_recursive(path: &Path) -> Result<()> {
    let meta = match std::fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e).with_context(|| format!("cannot stat {}", path.display())),
    };

    if meta.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    }
    .with_context(|| format!("cannot delete {}", path.display()))
}

/// Copy a file or directory tree, creating parent directories as needed.
///
/// Returns the path of the copy.
pub fn copy_recursive(src: &Path, dest: &Path) -> Result<PathBuf> {
    let target = landing_path(src, dest);
    ensure_parent_dir(&target)?;

    if !src.is_dir() {
        std::fs::copy(src, &target).with_context(|| {
            format!("copy failed: {} -> {}", src.display(), target.display())
        })?;
        return Ok(target);
    }

    for entry in WalkDir::new(src) {
        let entry = entry.with_context(|| format!("cannot walk {}", src.display()))?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .with_context(|| format!("{} escaped {}", entry.path().display(), src.display()))?;
        let out = target.join(rel);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&out)
                .with_context(|| format!("cannot create directory {}", out.display()))?;
        } else {
            std::fs::copy(entry.path(), &out).with_context(|| {
                format!("copy failed: {} -> {}", entry.path().display(), out.display())
            })?;
        }
    }
    Ok(target)
}

/// Move a file or directory tree, creating parent directories as needed.
///
/// Falls back to copy-then-delete when a rename crosses filesystems.
/// Returns the new path.
pub fn move_path(src: &Path, dest: &Path) -> Result<PathBuf> {
    if !src.exists() {
        anyhow::bail!("cannot move {}: no such file or directory", src.display());
    }
    let target = landing_path(src, dest);
    ensure_parent_dir(&target)?;

    if std::fs::rename(src, &target).is_err() {
        copy_recursive(src, &target)?;
        delete_recursive(src)?;
    }
    Ok(target)
}

/// Set file permissions (Unix only).
///
/// No-op on non-Unix platforms.
#[cfg(unix)]
pub fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .with_context(|| format!("chmod failed for {}", path.display()))
}

#[cfg(not(unix))]
pub fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}

/// Create a fresh temporary directory that outlives this process.
///
/// The caller owns its removal (normally via a Delete cleanup).
pub fn persistent_temp_dir(prefix: &str) -> Result<PathBuf> {
    let dir = tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .context("cannot create temporary directory")?;
    Ok(dir.keep())
}

/// Create a fresh temporary file whose name ends with `suffix`.
///
/// Like [`persistent_temp_dir`], the file is not removed on drop.
pub fn persistent_temp_file(suffix: &str) -> Result<PathBuf> {
    let file = tempfile::Builder::new()
        .prefix("recipe-")
        .suffix(suffix)
        .tempfile()
        .context("cannot create temporary file")?;
    let (_, path) = file
        .keep()
        .context("cannot keep temporary file")?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_ensure_parent_dir() {
        let temp = tempdir().unwrap();
        let nested = temp.path().join("a/b/c/file.txt");

        ensure_parent_dir(&nested).unwrap();
        assert!(temp.path().join("a/b/c").exists());
    }

    #[test]
    fn test_ensure_parent_dir_already_exists() {
        let temp = tempdir().unwrap();
        ensure_parent_dir(&temp.path().join("file.txt")).unwrap();
    }

    #[test]
    fn test_delete_missing_is_ok() {
        let temp = tempdir().unwrap();
        delete_recursive(&temp.path().join("nope")).unwrap();
    }

    #[test]
    fn test_delete_tree() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("tree");
        std::fs::create_dir_all(dir.join("x/y")).unwrap();
        std::fs::write(dir.join("x/y/z.txt"), "z").unwrap();

        delete_recursive(&dir).unwrap();
        assert!(!dir.exists());
    }

    #[test]
    fn test_copy_file_creates_parents() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src.txt");
        let dest = temp.path().join("a/b/c/dest.txt");

        std::fs::write(&src, "content").unwrap();
        let out = copy_recursive(&src, &dest).unwrap();

        assert_eq!(out, dest);
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "content");
        assert!(src.exists());
    }

    #[test]
    fn test_copy_into_existing_directory() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("setup.exe");
        let dir = temp.path().join("target");
        std::fs::write(&src, "bin").unwrap();
        std::fs::create_dir(&dir).unwrap();

        let out = copy_recursive(&src, &dir).unwrap();
        assert_eq!(out, dir.join("setup.exe"));
        assert!(out.is_file());
    }

    #[test]
    fn test_copy_directory_tree() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("profile");
        std::fs::create_dir_all(src.join("chrome")).unwrap();
        std::fs::write(src.join("prefs.js"), "p").unwrap();
        std::fs::write(src.join("chrome/user.css"), "c").unwrap();

        let dest = temp.path().join("copy");
        copy_recursive(&src, &dest).unwrap();
        assert_eq!(std::fs::read_to_string(dest.join("chrome/user.css")).unwrap(), "c");
        assert_eq!(std::fs::read_to_string(dest.join("prefs.js")).unwrap(), "p");
    }

    #[test]
    fn test_move_file() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("a.txt");
        std::fs::write(&src, "a").unwrap();

        let out = move_path(&src, &temp.path().join("sub/b.txt")).unwrap();
        assert!(!src.exists());
        assert_eq!(std::fs::read_to_string(out).unwrap(), "a");
    }

    #[test]
    fn test_move_missing_source_fails() {
        let temp = tempdir().unwrap();
        let err = move_path(&temp.path().join("ghost"), &temp.path().join("x")).unwrap_err();
        assert!(err.to_string().contains("no such file"));
    }

    #[test]
    fn test_canonical_requires_existing_path() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("x.txt");
        assert!(canonical(&file).is_err());
        std::fs::write(&file, "").unwrap();
        assert!(canonical(&file).unwrap().ends_with("x.txt"));
    }

    #[test]
    fn test_persistent_temp_file_suffix_survives() {
        let path = persistent_temp_file("-setup.exe").unwrap();
        assert!(path.exists());
        assert!(path.to_string_lossy().ends_with("-setup.exe"));
        delete_recursive(&path).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_set_executable() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempdir().unwrap();
        let file = temp.path().join("test.sh");
        std::fs::write(&file, "#!/bin/sh").unwrap();

        set_executable(&file).unwrap();

        let perms = std::fs::metadata(&file).unwrap().permissions();
        assert_eq!(perms.mode() & 0o777, 0o755);
    }
}
