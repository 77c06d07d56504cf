//! Static wall mask derived once per match.

use torus_duel_core::{CellCoord, GridSize, Orientation, Snapshot};

/// Dense impassability grid covering the whole torus.
///
/// Static walls and every turret cell, dead or alive, are blocked. The mask is
/// built from the first snapshot of a match and never mutated afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WallMask {
    size: GridSize,
    blocked: Vec<bool>,
}

impl WallMask {
    /// Builds the mask from a host snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let turret_cells = snapshot.turrets.iter().map(|turret| turret.cell);
        Self::from_cells(
            snapshot.size,
            snapshot.walls.iter().copied().chain(turret_cells),
        )
    }

    /// Builds a mask that blocks exactly the provided cells.
    #[must_use]
    pub fn from_cells<I>(size: GridSize, cells: I) -> Self
    where
        I: IntoIterator<Item = CellCoord>,
    {
        let mut blocked = vec![false; size.cell_count()];
        for cell in cells {
            if let Some(index) = size.index(size.wrap(cell)) {
                blocked[index] = true;
            }
        }
        Self { size, blocked }
    }

    /// Dimensions of the masked grid.
    #[must_use]
    pub const fn size(&self) -> GridSize {
        self.size
    }

    /// Reports whether the cell cannot be entered. Coordinates wrap.
    #[must_use]
    pub fn is_blocked(&self, cell: CellCoord) -> bool {
        self.size
            .index(self.size.wrap(cell))
            .and_then(|index| self.blocked.get(index).copied())
            .unwrap_or(true)
    }

    /// Iterator over every enterable cell in row-major order.
    pub fn open_cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.blocked
            .iter()
            .enumerate()
            .filter(|(_, blocked)| !**blocked)
            .filter_map(|(index, _)| self.size.cell_at(index))
    }

    /// Open cells along a ray from `from`, nearest first, up to `range`.
    ///
    /// The ray stops before the first blocked cell; `from` itself is never
    /// yielded. Each item carries its distance from the origin.
    pub fn lane(
        &self,
        from: CellCoord,
        orientation: Orientation,
        range: u32,
    ) -> impl Iterator<Item = (u32, CellCoord)> + '_ {
        let size = self.size;
        let mut cell = size.wrap(from);
        (1..=range)
            .map(move |distance| {
                cell = size.step(cell, orientation);
                (distance, cell)
            })
            .take_while(move |(_, cell)| !self.is_blocked(*cell))
    }

    /// First blocked cell along a ray within `range`, with its distance.
    #[must_use]
    pub fn first_obstacle(
        &self,
        from: CellCoord,
        orientation: Orientation,
        range: u32,
    ) -> Option<(u32, CellCoord)> {
        let mut cell = self.size.wrap(from);
        for distance in 1..=range {
            cell = self.size.step(cell, orientation);
            if self.is_blocked(cell) {
                return Some((distance, cell));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use torus_duel_core::{AgentSnapshot, TurretId, TurretSnapshot, TurretView};

    #[test]
    fn turrets_and_walls_are_blocked() {
        let agent = AgentSnapshot {
            cell: CellCoord::new(0, 0),
            orientation: Orientation::Right,
            hit_points: 3,
            shields: 0,
            teleports: 0,
            lasers: 0,
            shield_active: false,
        };
        let snapshot = Snapshot {
            size: GridSize::new(4, 4),
            walls: vec![CellCoord::new(1, 1)],
            turrets: TurretView::from_snapshots(vec![TurretSnapshot {
                id: TurretId::new(7),
                cell: CellCoord::new(2, 3),
                fire_time: 1,
                cooldown_time: 1,
                firing_next_turn: false,
                dead: true,
            }]),
            bullets: Vec::new(),
            power_ups: Vec::new(),
            teleport_cells: Vec::new(),
            agent,
            opponent: agent,
            turn: 0,
        };

        let mask = WallMask::from_snapshot(&snapshot);

        assert!(mask.is_blocked(CellCoord::new(1, 1)));
        assert!(mask.is_blocked(CellCoord::new(2, 3)));
        assert!(!mask.is_blocked(CellCoord::new(0, 0)));
        assert_eq!(mask.open_cells().count(), 14);
    }

    #[test]
    fn lane_stops_before_first_wall_and_wraps() {
        let size = GridSize::new(6, 3);
        let mask = WallMask::from_cells(size, [CellCoord::new(2, 0)]);

        let cells: Vec<_> = mask
            .lane(CellCoord::new(3, 0), Orientation::Right, 4)
            .collect();
        assert_eq!(
            cells,
            vec![
                (1, CellCoord::new(4, 0)),
                (2, CellCoord::new(5, 0)),
                (3, CellCoord::new(0, 0)),
                (4, CellCoord::new(1, 0)),
            ]
        );

        let blocked: Vec<_> = mask
            .lane(CellCoord::new(3, 0), Orientation::Left, 4)
            .collect();
        assert!(blocked.is_empty());
        assert_eq!(
            mask.first_obstacle(CellCoord::new(0, 0), Orientation::Right, 4),
            Some((2, CellCoord::new(2, 0)))
        );
    }
}
