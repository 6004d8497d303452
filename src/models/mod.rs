//! Row types mirrored from the hosted data store.

mod duel;
mod player;
mod profile;

pub use duel::*;
pub use player::*;
pub use profile::*;
