//! C64 game of the day launcher
//!
//! [`GameManager`] ties the catalog, the play history and the emulator
//! lifecycle together. The `gotd` binary wires the default instances and
//! provides the CLI and terminal front end.

mod game_manager;
pub mod logutil;
mod ratings;
pub mod rotation;

pub use game_manager::{GameManager, GameState, Subscription};
pub use ratings::{RatingError, RatingService};
