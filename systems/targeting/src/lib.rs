#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that picks the agent's destination for the current turn.
//!
//! Candidates are turret vantage points and power-up cells, ranked by the turn
//! counts of the agent's distance field. When neither category offers a
//! reachable cell the opponent becomes the destination.

mod vantage;

pub use vantage::{vantage_points, VantagePoint, VantageRegistry};

use torus_duel_core::{CellCoord, TurretId};
use torus_duel_world::DistanceField;

/// Where the agent should head this turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Destination {
    /// Walk to a vantage point and engage its turret from there.
    Vantage {
        /// The chosen vantage point.
        point: VantagePoint,
        /// Turns needed to reach it.
        turns: u32,
    },
    /// Collect the power-up lying on `cell`.
    PowerUp {
        /// Pickup cell.
        cell: CellCoord,
        /// Turns needed to reach it.
        turns: u32,
    },
    /// Nothing better to do; close in on the opponent.
    Opponent {
        /// Opponent's current cell.
        cell: CellCoord,
    },
}

impl Destination {
    /// Cell the agent is heading for.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        match self {
            Self::Vantage { point, .. } => point.cell,
            Self::PowerUp { cell, .. } | Self::Opponent { cell } => *cell,
        }
    }

    /// Turret targeted by the destination, if any.
    #[must_use]
    pub const fn turret(&self) -> Option<TurretId> {
        match self {
            Self::Vantage { point, .. } => Some(point.turret),
            Self::PowerUp { .. } | Self::Opponent { .. } => None,
        }
    }
}

/// Destination selector with a configurable preference for vantage points.
#[derive(Clone, Copy, Debug, Default)]
pub struct TargetSelector {
    margin: u32,
}

impl TargetSelector {
    /// Creates a selector that keeps a vantage point unless a power-up is more
    /// than `margin` turns closer.
    #[must_use]
    pub const fn new(margin: u32) -> Self {
        Self { margin }
    }

    /// Turn advantage a power-up needs before it beats a vantage point.
    #[must_use]
    pub const fn margin(&self) -> u32 {
        self.margin
    }

    /// Chooses the destination for this turn.
    ///
    /// Only cells the field reports reachable are considered, so the result
    /// can always be fed into path reconstruction, except for the opponent
    /// fallback which callers must check themselves.
    #[must_use]
    pub fn select_destination(
        &self,
        field: &DistanceField,
        points: &[VantagePoint],
        power_ups: &[CellCoord],
        opponent: CellCoord,
    ) -> Destination {
        let vantage = nearest(points.iter().filter_map(|point| {
            field.turns(point.cell).map(|turns| Candidate {
                turns,
                cell: point.cell,
                payload: *point,
            })
        }));
        let power_up = nearest(power_ups.iter().filter_map(|cell| {
            field.turns(*cell).map(|turns| Candidate {
                turns,
                cell: *cell,
                payload: *cell,
            })
        }));

        let destination = match (vantage, power_up) {
            (Some(vantage), Some(power_up)) => {
                if vantage.turns.saturating_sub(power_up.turns) > self.margin {
                    Destination::PowerUp {
                        cell: power_up.cell,
                        turns: power_up.turns,
                    }
                } else {
                    Destination::Vantage {
                        point: vantage.payload,
                        turns: vantage.turns,
                    }
                }
            }
            (Some(vantage), None) => Destination::Vantage {
                point: vantage.payload,
                turns: vantage.turns,
            },
            (None, Some(power_up)) => Destination::PowerUp {
                cell: power_up.cell,
                turns: power_up.turns,
            },
            (None, None) => Destination::Opponent { cell: opponent },
        };

        tracing::trace!(?destination, margin = self.margin, "destination selected");
        destination
    }
}

#[derive(Clone, Copy, Debug)]
struct Candidate<T> {
    turns: u32,
    cell: CellCoord,
    payload: T,
}

impl<T> Candidate<T> {
    fn precedes(&self, other: &Self) -> bool {
        if self.turns != other.turns {
            return self.turns < other.turns;
        }

        self.cell < other.cell
    }
}

fn nearest<T>(candidates: impl Iterator<Item = Candidate<T>>) -> Option<Candidate<T>> {
    let mut best: Option<Candidate<T>> = None;
    for current in candidates {
        match &mut best {
            Some(existing) => {
                if current.precedes(existing) {
                    *existing = current;
                }
            }
            None => best = Some(current),
        }
    }
    best
}
