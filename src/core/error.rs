//! Recipe execution error types.

use thiserror::Error;

use super::stack::CleanupKind;
use super::step::Operation;

/// Coarse classification of a [`RecipeError`].
///
/// Every kind currently aborts the run; the tag exists so callers can tell a
/// broken recipe apart from a broken environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The recipe references something that does not exist.
    InvalidRecipe,
    /// The runtime was assembled without a required piece.
    Configuration,
    /// A POP ran against an empty stack.
    StackUnderflow,
    /// A concrete handler failed.
    Handler,
    /// A cleanup obligation failed.
    Cleanup,
}

/// Errors that can occur while executing a recipe.
#[derive(Error, Debug)]
pub enum RecipeError {
    #[error("invalid recipe: {0}")]
    InvalidRecipe(String),

    #[error("invalid recipe: requested stack element {depth} but stack has size {size}")]
    IndexOutOfRange { depth: usize, size: usize },

    #[error("can't handle {0} because there is no handler for it")]
    NoHandler(Operation),

    #[error("cannot build placeholder grammar: {0}")]
    Grammar(#[from] regex::Error),

    #[error("stack underflow: POP executed on an empty stack")]
    StackUnderflow,

    #[error("{operation} failed: {source:#}")]
    Handler {
        operation: Operation,
        #[source]
        source: anyhow::Error,
    },

    #[error("cleanup ({kind}) of {resource} failed: {source:#}")]
    Cleanup {
        kind: CleanupKind,
        resource: String,
        #[source]
        source: anyhow::Error,
    },
}

impl RecipeError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRecipe(_) | Self::IndexOutOfRange { .. } => ErrorKind::InvalidRecipe,
            Self::NoHandler(_) | Self::Grammar(_) => ErrorKind::Configuration,
            Self::StackUnderflow => ErrorKind::StackUnderflow,
            Self::Handler { .. } => ErrorKind::Handler,
            Self::Cleanup { .. } => ErrorKind::Cleanup,
        }
    }

    /// Wrap a handler failure.
    ///
    /// Handlers that re-enter the installer (via `insert`) may fail with a
    /// `RecipeError` of their own; that error is passed through untouched so
    /// its kind survives.
    pub(crate) fn from_handler(operation: Operation, err: anyhow::Error) -> Self {
        match err.downcast::<RecipeError>() {
            Ok(inner) => inner,
            Err(source) => Self::Handler { operation, source },
        }
    }
}

pub type Result<T, E = RecipeError> = std::result::Result<T, E>;
