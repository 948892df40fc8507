//! Deterministic runtime collaborators.
//!
//! The advisor never reaches for ambient randomness or wall-clock time;
//! both are injected so a fixed seed reproduces every suggestion and every
//! persisted timestamp in tests.

pub mod clock;
pub mod rng;

pub use clock::{Clock, ManualClock, SystemClock};
pub use rng::BrewRng;
