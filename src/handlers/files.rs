//! Handlers that move data between files and the stack.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tracing::debug;

use crate::core::stack::{Cleanup, Frame};
use crate::helpers::fs_utils;
use crate::installer::Installer;

/// MOVE: move the parent's result to the parameter path.
pub fn move_to(parameter: &str, installer: &mut Installer<'_>) -> Result<Frame> {
    let source = installer.additional_parameter()?;
    debug!(from = %source, to = %parameter, "moving");
    let target = fs_utils::move_path(Path::new(&source), Path::new(parameter))
        .context("problem while moving files")?;
    Ok(Frame::new(fs_utils::canonical(&target)?))
}

/// COPY: copy the parent's result, recursively, to the parameter path.
pub fn copy_to(parameter: &str, installer: &mut Installer<'_>) -> Result<Frame> {
    let source = installer.additional_parameter()?;
    debug!(from = %source, to = %parameter, "copying");
    let target = fs_utils::copy_recursive(Path::new(&source), Path::new(parameter))
        .context("problem while copying recursive")?;
    Ok(Frame::new(fs_utils::canonical(&target)?))
}

/// TO_FILE: write the parameter to a fresh temporary file.
pub fn to_file(parameter: &str, _installer: &mut Installer<'_>) -> Result<Frame> {
    let mut file = tempfile::Builder::new()
        .prefix("recipe-w")
        .tempfile()
        .context("can't create tmp file")?;
    file.write_all(parameter.as_bytes())
        .context("can't write string to file")?;
    let (_, path) = file.keep().context("can't keep tmp file")?;

    fs_utils::set_executable(&path)?;
    let path = fs_utils::canonical(&path)?;
    Ok(Frame::new(path.clone()).with_cleanup(Cleanup::delete(path)))
}

/// FROM_FILE: push the content of the file at the parameter path.
pub fn from_file(parameter: &str, _installer: &mut Installer<'_>) -> Result<Frame> {
    let content = std::fs::read_to_string(parameter)
        .with_context(|| format!("can't read {}", parameter))?;
    Ok(Frame::new(content))
}
