//! Vantage points from which a turret can be shot without standing in its lanes.

use torus_duel_core::{CellCoord, Orientation, TurretId};
use torus_duel_system_threat::ThreatModel;

/// A cell one forward step away from a turret's firing axis.
///
/// Standing on `cell` keeps the agent outside the turret's lanes; moving once
/// along `approach` puts it on the axis, within range and unobstructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VantagePoint {
    /// Cell the agent waits on.
    pub cell: CellCoord,
    /// Turret the point is tied to.
    pub turret: TurretId,
    /// Heading of the single step onto the firing axis.
    pub approach: Orientation,
}

/// Derives every vantage point for the live turrets in the snapshot.
///
/// The result is sorted and free of duplicates.
#[must_use]
pub fn vantage_points(threat: &ThreatModel<'_>) -> Vec<VantagePoint> {
    let mask = threat.mask();
    let size = mask.size();
    let mut points = Vec::new();

    for turret in threat.snapshot().turrets.live() {
        for axis in Orientation::ALL {
            for (_, axis_cell) in mask.lane(turret.cell, axis, threat.fire_range()) {
                for side in axis.perpendicular() {
                    let cell = size.step(axis_cell, side);
                    if mask.is_blocked(cell) || threat.is_in_turret_lane(cell, turret) {
                        continue;
                    }
                    points.push(VantagePoint {
                        cell,
                        turret: turret.id,
                        approach: side.opposite(),
                    });
                }
            }
        }
    }

    points.sort_unstable();
    points.dedup();
    points
}

/// Vantage set that only shrinks between turret deaths.
///
/// A fresh generation starts whenever the number of live turrets changes.
/// Within a generation entries may be dropped but never re-added, so a point
/// the agent is walking toward cannot flicker in and out of the set.
#[derive(Debug, Default)]
pub struct VantageRegistry {
    live_turrets: Option<usize>,
    generation: u32,
    points: Vec<VantagePoint>,
}

impl VantageRegistry {
    /// Creates an empty registry; the first refresh starts generation one.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Brings the set up to date with the current snapshot.
    ///
    /// Returns `true` when a new generation was started.
    pub fn refresh(&mut self, threat: &ThreatModel<'_>) -> bool {
        let live = threat.snapshot().turrets.live().count();
        let candidates = vantage_points(threat);

        if self.live_turrets != Some(live) {
            self.live_turrets = Some(live);
            self.generation = self.generation.wrapping_add(1);
            self.points = candidates;
            tracing::debug!(
                generation = self.generation,
                live_turrets = live,
                points = self.points.len(),
                "vantage generation started"
            );
            return true;
        }

        self.points
            .retain(|point| candidates.binary_search(point).is_ok());
        tracing::trace!(points = self.points.len(), "vantage set pruned");
        false
    }

    /// Drops every point tied to `turret`.
    pub fn retire(&mut self, turret: TurretId) {
        self.points.retain(|point| point.turret != turret);
    }

    /// Current vantage points in sorted order.
    #[must_use]
    pub fn points(&self) -> &[VantagePoint] {
        &self.points
    }

    /// Vantage points located on `cell`.
    pub fn at(&self, cell: CellCoord) -> impl Iterator<Item = &VantagePoint> {
        self.points.iter().filter(move |point| point.cell == cell)
    }

    /// Counter of generations started so far.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}
