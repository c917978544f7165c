//! Value stack with attached cleanup obligations.
//!
//! Every executed step pushes one [`Frame`]; every POP removes one and runs
//! its [`Cleanup`], if any. Frames therefore release their resources in
//! reverse order of acquisition.

use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::debug;

use super::error::{RecipeError, Result};
use crate::helpers::{fs_utils, process};

/// What a cleanup obligation does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupKind {
    /// Delete a file or directory tree.
    Delete,
    /// Unmount a mounted disk image.
    Unmount,
}

impl fmt::Display for CleanupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delete => f.write_str("delete"),
            Self::Unmount => f.write_str("unmount"),
        }
    }
}

/// Undo action tied to the frame that created it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cleanup {
    pub kind: CleanupKind,
    pub resource: String,
}

impl Cleanup {
    pub fn delete(resource: impl Into<String>) -> Self {
        Self {
            kind: CleanupKind::Delete,
            resource: resource.into(),
        }
    }

    pub fn unmount(resource: impl Into<String>) -> Self {
        Self {
            kind: CleanupKind::Unmount,
            resource: resource.into(),
        }
    }

    /// Perform the undo action.
    pub fn run(&self) -> Result<()> {
        debug!(kind = %self.kind, resource = %self.resource, "running cleanup");
        let outcome = match self.kind {
            CleanupKind::Delete => fs_utils::delete_recursive(Path::new(&self.resource)),
            CleanupKind::Unmount => {
                process::run_command(&["hdiutil", "unmount", &self.resource], None).map(|_| ())
            }
        };
        outcome.map_err(|source| RecipeError::Cleanup {
            kind: self.kind,
            resource: self.resource.clone(),
            source,
        })
    }
}

/// One stack element: a value, optionally an undo action and the captured
/// output of the command that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frame {
    value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    cleanup: Option<Cleanup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stderr: Option<String>,
}

impl Frame {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            cleanup: None,
            stdout: None,
            stderr: None,
        }
    }

    pub fn with_cleanup(mut self, cleanup: Cleanup) -> Self {
        self.cleanup = Some(cleanup);
        self
    }

    pub fn with_output(mut self, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        self.stdout = Some(stdout.into());
        self.stderr = Some(stderr.into());
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cleanup(&self) -> Option<&Cleanup> {
        self.cleanup.as_ref()
    }

    pub fn stdout(&self) -> Option<&str> {
        self.stdout.as_deref()
    }

    pub fn stderr(&self) -> Option<&str> {
        self.stderr.as_deref()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)?;
        if self.stdout.is_some() || self.stderr.is_some() {
            write!(
                f,
                " [{}|{}]",
                self.stdout.as_deref().unwrap_or_default(),
                self.stderr.as_deref().unwrap_or_default()
            )?;
        }
        Ok(())
    }
}

/// Ordered frames, top = most recently pushed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueStack {
    // last element is the top
    frames: Vec<Frame>,
}

impl ValueStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    /// Remove the top frame without running its cleanup.
    pub fn pop(&mut self) -> Result<Frame> {
        self.frames.pop().ok_or(RecipeError::StackUnderflow)
    }

    /// Remove the top frame and run its cleanup.
    pub fn pop_and_clean(&mut self) -> Result<()> {
        let frame = self.pop()?;
        if let Some(cleanup) = frame.cleanup() {
            cleanup.run()?;
        }
        Ok(())
    }

    /// The frame `depth` positions below the top (0 = top).
    pub fn peek_at(&self, depth: usize) -> Result<&Frame> {
        let size = self.frames.len();
        if depth >= size {
            return Err(RecipeError::IndexOutOfRange { depth, size });
        }
        Ok(&self.frames[size - 1 - depth])
    }

    pub fn top(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// Values of the `count` topmost frames, top first.
    pub fn top_values(&self, count: usize) -> Result<Vec<String>> {
        (0..count)
            .map(|depth| self.peek_at(depth).map(|f| f.value().to_string()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames from the top down.
    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter().rev()
    }

    /// Copies of all frames, top first.
    pub fn snapshot(&self) -> Vec<Frame> {
        self.iter().cloned().collect()
    }

    /// Pop every frame, running cleanups as it goes.
    ///
    /// Stops at the first failing cleanup; frames below it stay on the stack
    /// untouched.
    pub fn drain_all(&mut self) -> Result<()> {
        debug!(frames = self.frames.len(), "draining stack");
        while !self.frames.is_empty() {
            self.pop_and_clean()?;
        }
        Ok(())
    }
}

impl fmt::Display for ValueStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, frame) in self.frames.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", frame.value())?;
        }
        f.write_str("]")
    }
}
