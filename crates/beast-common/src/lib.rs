//! # Beast Common
//!
//! Shared types, utilities, and common functionality for Beast Bot.
//!
//! This crate provides the foundational pieces used across all other crates
//! in the workspace: platform identifiers, the error taxonomy, schedule time
//! parsing, command-name normalization and the outbound [`Platform`] trait.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod logging;
pub mod names;
pub mod platform;
pub mod time;
pub mod types;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;

pub use error::*;
pub use logging::*;
pub use names::*;
pub use platform::*;
pub use time::*;
pub use types::*;
pub use utils::*;
