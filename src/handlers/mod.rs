//! Step handlers and their registry.
//!
//! A handler performs one operation kind. It receives the fully resolved
//! parameter and the running [`Installer`], and returns the frame to push.
//! Handlers may read the stack, pull their children out of the pending
//! program, or run extra steps through [`Installer::insert`].
//!
//! Plain functions and closures with the right signature are handlers:
//!
//! ```ignore
//! let mut registry = HandlerRegistry::new();
//! registry.register_fn(Operation::Set, |p, _| Ok(Frame::new(p)));
//! ```

pub mod archive;
pub mod basic;
pub mod command;
pub mod download;
pub mod files;
pub mod firefox;
pub mod upload;

use std::collections::HashMap;
use std::fmt;

use anyhow::Result;

use crate::config::InstallerConfig;
use crate::core::stack::Frame;
use crate::core::step::Operation;
use crate::installer::Installer;

pub use archive::DmgHandler;
pub use download::DownloadHandler;
pub use upload::UploadHandler;

/// Performs one kind of operation.
pub trait Handler {
    fn handle(&self, parameter: &str, installer: &mut Installer<'_>) -> Result<Frame>;
}

impl<F> Handler for F
where
    F: Fn(&str, &mut Installer<'_>) -> Result<Frame>,
{
    fn handle(&self, parameter: &str, installer: &mut Installer<'_>) -> Result<Frame> {
        self(parameter, installer)
    }
}

/// Fixed mapping from operation kind to handler.
///
/// Built once before any recipe runs and shared by reference afterwards.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<Operation, Box<dyn Handler>>,
}

impl HandlerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in handler, configured from `config`.
    ///
    /// APK_*, ADB, REBOOT, WAIT, AFTER_INSTALL and IOS_INSTALL are left
    /// unregistered.
    pub fn with_defaults(config: &InstallerConfig) -> Self {
        let mut registry = Self::new();
        registry
            .register(Operation::Set, basic::set)
            .register(Operation::Equals, basic::equals)
            .register(Operation::RebootNow, basic::reboot_now)
            .register(Operation::Command, command::run)
            .register(Operation::Async, command::run_async)
            .register(Operation::Pkg, command::pkg)
            .register(Operation::InstallCert, command::install_cert)
            .register(Operation::Download, DownloadHandler::from_config(config))
            .register(Operation::Upload, UploadHandler::from_config(config))
            .register(Operation::Move, files::move_to)
            .register(Operation::Copy, files::copy_to)
            .register(Operation::ToFile, files::to_file)
            .register(Operation::FromFile, files::from_file)
            .register(Operation::Unzip, archive::unzip)
            .register(Operation::Dmg, DmgHandler::new())
            .register(Operation::DmgEula, archive::dmg_eula)
            .register(Operation::MoveFf, firefox::move_ff);
        registry
    }

    /// Register `handler` for `operation`, replacing any previous one.
    ///
    /// A handler registered for POP is never called; POP is built in.
    pub fn register(
        &mut self,
        operation: Operation,
        handler: impl Handler + 'static,
    ) -> &mut Self {
        self.handlers.insert(operation, Box::new(handler));
        self
    }

    /// Register a closure. Same as [`register`](Self::register), but lets
    /// the compiler infer the closure's argument types.
    pub fn register_fn<F>(&mut self, operation: Operation, handler: F) -> &mut Self
    where
        F: Fn(&str, &mut Installer<'_>) -> Result<Frame> + 'static,
    {
        self.register(operation, handler)
    }

    pub fn get(&self, operation: Operation) -> Option<&dyn Handler> {
        self.handlers.get(&operation).map(|h| h.as_ref())
    }

    pub fn contains(&self, operation: Operation) -> bool {
        self.handlers.contains_key(&operation)
    }

    /// Registered operations, in declaration order.
    pub fn operations(&self) -> Vec<Operation> {
        Operation::ALL
            .into_iter()
            .filter(|op| self.handlers.contains_key(op))
            .collect()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("operations", &self.operations())
            .finish()
    }
}
