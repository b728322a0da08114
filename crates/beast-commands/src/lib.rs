//! # Beast Commands
//!
//! Command handling for Beast Bot.
//!
//! Every inbound invocation goes through one [`Router`]: the command is looked
//! up in a single dispatch table, the [`GuardPipeline`] decides whether it may
//! run, its options are validated against the [`CommandDefinition`], and
//! exactly one handler produces exactly one [`Reply`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod args;
pub mod auth;
pub mod broadcast;
pub mod commands;
pub mod cooldown;
pub mod definition;
pub mod framework;
pub mod guard;
pub mod invocation;
pub mod reply;
pub mod router;

pub use args::*;
pub use auth::*;
pub use broadcast::*;
pub use cooldown::*;
pub use definition::*;
pub use framework::*;
pub use guard::*;
pub use invocation::*;
pub use reply::*;
pub use router::*;
