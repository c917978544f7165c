//! Core infrastructure for recipe execution
//!
//! The program model, the value stack, placeholder resolution and the error
//! taxonomy. Concrete operations live in `handlers`.

pub mod error;
pub mod lock;
pub mod output;
pub mod program;
pub mod resolve;
pub mod stack;
pub mod step;
