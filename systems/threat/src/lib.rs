#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-turn threat queries against turret fire lanes and projectiles in flight.

use torus_duel_core::{
    AgentSnapshot, BulletSnapshot, CellCoord, Orientation, Snapshot, TurretSnapshot,
};
use torus_duel_world::WallMask;

/// A projectile heading straight back at a probed cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Inbound {
    /// The projectile found by the scan.
    pub bullet: BulletSnapshot,
    /// Cells between the probed cell and the projectile.
    pub distance: u32,
}

/// Read-only threat queries over one turn's snapshot.
#[derive(Clone, Copy, Debug)]
pub struct ThreatModel<'a> {
    snapshot: &'a Snapshot,
    mask: &'a WallMask,
    fire_range: u32,
}

impl<'a> ThreatModel<'a> {
    /// Captures the snapshot and the cached wall mask for this turn.
    #[must_use]
    pub fn new(snapshot: &'a Snapshot, mask: &'a WallMask, fire_range: u32) -> Self {
        Self {
            snapshot,
            mask,
            fire_range,
        }
    }

    /// Snapshot the model was built over.
    #[must_use]
    pub fn snapshot(&self) -> &'a Snapshot {
        self.snapshot
    }

    /// Wall mask the model was built over.
    #[must_use]
    pub fn mask(&self) -> &'a WallMask {
        self.mask
    }

    /// Reach of turret and agent fire, in cells.
    #[must_use]
    pub fn fire_range(&self) -> u32 {
        self.fire_range
    }

    /// Reports whether any turret firing next round covers `cell`.
    ///
    /// Turrets about to be destroyed by an inbound projectile are ignored.
    #[must_use]
    pub fn is_cell_threatened_by_fire_lane(&self, cell: CellCoord) -> bool {
        self.snapshot
            .turrets
            .live()
            .filter(|turret| turret.firing_next_turn)
            .filter(|turret| !self.is_turret_doomed(turret))
            .any(|turret| !self.is_safe_from_directed_source(cell, turret.cell))
    }

    /// Reports whether a projectile adjacent to the turret is heading into it.
    #[must_use]
    pub fn is_turret_doomed(&self, turret: &TurretSnapshot) -> bool {
        let size = self.mask.size();
        let doomed = Orientation::ALL.iter().any(|side| {
            let neighbor = size.step(turret.cell, *side);
            self.snapshot
                .bullets
                .iter()
                .any(|bullet| bullet.cell == neighbor && bullet.heading == side.opposite())
        });
        if doomed {
            tracing::trace!(turret = turret.id.get(), "turret will be destroyed this round");
        }
        doomed
    }

    /// Reports whether `cell` lies on one of `turret`'s lanes, whatever its schedule.
    #[must_use]
    pub fn is_in_turret_lane(&self, cell: CellCoord, turret: &TurretSnapshot) -> bool {
        !self.is_safe_from_directed_source(cell, turret.cell)
    }

    /// Reports whether `cell` is out of reach of a source firing along any axis.
    ///
    /// A cell is unsafe iff it lies on one of the four rays from `source`,
    /// within range, with no blocked cell in between.
    #[must_use]
    pub fn is_safe_from_directed_source(&self, cell: CellCoord, source: CellCoord) -> bool {
        let size = self.mask.size();
        let cell = size.wrap(cell);
        !Orientation::ALL.iter().any(|direction| {
            self.mask
                .lane(source, *direction, self.fire_range)
                .any(|(_, lane_cell)| lane_cell == cell)
        })
    }

    /// Reports whether the agent can stay out of the opponent's fire this turn.
    ///
    /// Either the agent's cell is already safe, or the cell ahead of it is open
    /// and safe, so a single forward step clears the lane.
    #[must_use]
    pub fn is_agent_safe_from_opponent_fire(
        &self,
        agent: &AgentSnapshot,
        opponent: &AgentSnapshot,
    ) -> bool {
        if self.is_safe_from_directed_source(agent.cell, opponent.cell) {
            return true;
        }
        let ahead = self.mask.size().step(agent.cell, agent.orientation);
        !self.mask.is_blocked(ahead) && self.is_safe_from_directed_source(ahead, opponent.cell)
    }

    /// Turns until `bullet` enters `cell`, looking at most `horizon` turns ahead.
    ///
    /// Projectiles advance one cell per turn and stop at the first blocked cell.
    #[must_use]
    pub fn projectile_steps_to(
        &self,
        bullet: &BulletSnapshot,
        cell: CellCoord,
        horizon: u32,
    ) -> Option<u32> {
        let size = self.mask.size();
        let cell = size.wrap(cell);
        let mut position = bullet.cell;
        for step in 1..=horizon {
            position = size.step(position, bullet.heading);
            if self.mask.is_blocked(position) {
                return None;
            }
            if position == cell {
                return Some(step);
            }
        }
        None
    }

    /// Reports whether any known projectile enters `cell` within `horizon` turns.
    #[must_use]
    pub fn is_cell_hit_within(&self, cell: CellCoord, horizon: u32) -> bool {
        self.snapshot
            .bullets
            .iter()
            .any(|bullet| self.projectile_steps_to(bullet, cell, horizon).is_some())
    }

    /// Nearest projectile on a cross around `cell` whose heading points at it.
    ///
    /// Each arm extends `arm` cells and stops at the first blocked cell.
    #[must_use]
    pub fn inbound_projectile(&self, cell: CellCoord, arm: u32) -> Option<Inbound> {
        let mut nearest: Option<Inbound> = None;
        for direction in Orientation::ALL {
            for (distance, lane_cell) in self.mask.lane(cell, direction, arm) {
                let incoming = self.snapshot.bullets.iter().find(|bullet| {
                    bullet.cell == lane_cell && bullet.heading == direction.opposite()
                });
                if let Some(bullet) = incoming {
                    if nearest.map_or(true, |current| distance < current.distance) {
                        nearest = Some(Inbound {
                            bullet: *bullet,
                            distance,
                        });
                    }
                    break;
                }
            }
        }
        nearest
    }

    /// Reports whether the agent could stand on `cell` next turn unharmed.
    ///
    /// The cell must be enterable, outside every active fire lane, and not on
    /// the path of a projectile arriving next turn.
    #[must_use]
    pub fn is_open(&self, cell: CellCoord) -> bool {
        !self.mask.is_blocked(cell)
            && !self.is_cell_threatened_by_fire_lane(cell)
            && !self.is_cell_hit_within(cell, 1)
    }
}
