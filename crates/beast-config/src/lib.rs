//! # Beast Config
//!
//! Configuration for Beast Bot in two layers.
//!
//! [`Settings`] are the process settings read once at startup from a TOML or
//! YAML file plus environment overrides. [`ConfigDocument`] is the persisted
//! per-guild document; it is owned by a single writer task behind
//! [`StoreHandle`] so concurrent handlers never lose each other's updates.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod defaults;
pub mod document;
pub mod error;
pub mod handle;
pub mod loader;
pub mod settings;
pub mod store;
pub mod tickets;
pub mod validator;

pub use cache::*;
pub use document::*;
pub use error::*;
pub use handle::*;
pub use loader::*;
pub use settings::*;
pub use store::*;
pub use tickets::*;
pub use validator::*;
