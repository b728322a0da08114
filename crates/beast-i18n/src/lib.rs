//! # Beast I18n
//!
//! Internationalization support using the Fluent localization system for Beast Bot.
//!
//! Every user-visible string the bot produces lives in the Fluent catalogues
//! under `locales/`, which are embedded into the binary at compile time.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod error;
pub mod locale;

pub use catalog::*;
pub use error::*;
pub use locale::*;
