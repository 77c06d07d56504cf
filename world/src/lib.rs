#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Static topology and per-turn navigation for the Torus Duel engine.
//!
//! [`WallMask`] is derived once per match from the first snapshot and cached by
//! the engine. [`DistanceField`] is rebuilt from scratch every turn from the
//! agent's cell and orientation.

mod navigation;
mod topology;

pub use navigation::{ArrivalSet, DistanceField, UNREACHABLE};
pub use topology::WallMask;
