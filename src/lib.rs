//! Stack-based install recipe executor.
//!
//! A recipe is a flat list of steps. Every step except `POP` runs a handler
//! and pushes its result onto a value stack; `POP` removes the top frame and
//! runs the cleanup that frame carries (delete a temporary file, unmount an
//! image). Nesting is therefore expressed by position alone:
//!
//! ```text
//! DOWNLOAD  firefox/67.0/setup.exe      push /tmp/recipe-…-setup.exe
//!   COMMAND "{{0}}" -ms                 runs the download
//!   POP                                 drop the command result
//! POP                                   delete the download
//! ```
//!
//! # Parameters
//!
//! Step parameters may refer to earlier results and to machine constants:
//!
//! - `{{N}}` - value N frames below the top (`{{0}}` is the top)
//! - `{{STD_OUT}}`, `{{STD_ERR}}` - output captured by the top frame
//! - `{{DESKTOP}}`, `{{DELIMITER}}`, `{{SW_MIRROR}}`, `{{UUID}}`,
//!   `{{PROGRAM_FILES_X86}}` - facts about the target machine
//!
//! # Handlers
//!
//! Operations map to [`handlers::Handler`]s through a
//! [`HandlerRegistry`]. The defaults cover `SET`, `EQUALS`, `COMMAND`,
//! `ASYNC`, `PKG`, `DOWNLOAD`, `MOVE`, `COPY`, `TO_FILE`, `FROM_FILE`,
//! `UNZIP`, `DMG`, `DMG_EULA`, `INSTALL_CERT`, `MOVE_FF` and `REBOOT_NOW`;
//! anything else must be registered by the embedding program.

pub mod config;
pub mod constants;
pub mod core;
pub mod handlers;
pub mod helpers;
pub mod installer;
pub mod mirror;
pub mod platform;
pub mod recipe_file;
pub mod report;
pub mod software;

pub use crate::config::InstallerConfig;
pub use crate::constants::{Constant, ConstantSource, SystemConstants};
pub use crate::core::error::{ErrorKind, RecipeError, Result};
pub use crate::core::output;
pub use crate::core::program::{Program, StepNode};
pub use crate::core::resolve::Resolver;
pub use crate::core::stack::{Cleanup, CleanupKind, Frame, ValueStack};
pub use crate::core::step::{Operation, Step, StepsBuilder};
pub use crate::handlers::{Handler, HandlerRegistry};
pub use crate::installer::{Installer, Runtime};
pub use crate::platform::{Arch, LocalFacts, OsFacts, OsFamily, StaticFacts};
pub use crate::report::{ConsoleReporter, MemoryReporter, Reporter, StepReport};
pub use crate::software::{SoftwareVersion, VersionParser};
