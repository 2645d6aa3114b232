//! Core building blocks: identifiers, RNG, clock.
//!
//! These types know nothing about War itself; the game rules live in
//! `engine` and the card types in `deck`.

pub mod clock;
pub mod id;
pub mod rng;

pub use clock::{Clock, ManualClock, SystemClock};
pub use id::{MatchId, PlayerId};
pub use rng::GameRng;
