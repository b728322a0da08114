//! # Beast Bot
//!
//! Discord community bot: guarded command routing, per-guild settings,
//! scheduled announcements and support tickets.
//!
//! This crate wires the command core to the gateway through the Poise
//! framework and runs the background work (scheduler, cooldown sweep).

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod bot;
pub mod error;
pub mod events;
pub mod platform;
pub mod registration;
pub mod scheduler;

pub use bot::*;
pub use error::*;
pub use events::*;
pub use platform::*;
pub use registration::*;
pub use scheduler::*;
