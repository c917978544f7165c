//! Low-level utilities shared by the handlers and by stack cleanup.
//!
//! - **fs_utils**: copy, move, delete, temporary paths
//! - **process**: script and command execution with captured output
//! - **progress**: indicatif spinners and byte bars
//! - **url_utils**: file names from URLs
//! - **extract**: zip extraction

pub mod extract;
pub mod fs_utils;
pub mod process;
pub mod progress;
pub mod url_utils;
