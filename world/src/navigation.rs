//! Orientation-aware distance field rebuilt every turn.

use torus_duel_core::{Action, CellCoord, GridSize, Orientation};

use crate::topology::WallMask;

/// Sentinel distance stored for cells the wavefront never reaches.
pub const UNREACHABLE: u32 = u32::MAX;

/// Orientations an agent may face on first arriving at a cell.
///
/// Entries keep discovery order and never repeat.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ArrivalSet {
    slots: [Option<Orientation>; 4],
    len: u8,
}

impl ArrivalSet {
    fn single(orientation: Orientation) -> Self {
        Self {
            slots: [Some(orientation), None, None, None],
            len: 1,
        }
    }

    fn insert(&mut self, orientation: Orientation) -> bool {
        if self.contains(orientation) {
            return false;
        }
        let slot = usize::from(self.len);
        if slot >= self.slots.len() {
            return false;
        }
        self.slots[slot] = Some(orientation);
        self.len += 1;
        true
    }

    /// Reports whether `orientation` was recorded.
    #[must_use]
    pub fn contains(&self, orientation: Orientation) -> bool {
        self.iter().any(|entry| entry == orientation)
    }

    /// Earliest recorded orientation.
    #[must_use]
    pub fn first(&self) -> Option<Orientation> {
        self.slots[0]
    }

    /// Number of recorded orientations.
    #[must_use]
    pub fn len(&self) -> usize {
        usize::from(self.len)
    }

    /// Reports whether nothing was recorded, which marks an unreachable cell.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Recorded orientations in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = Orientation> + '_ {
        self.slots.iter().flatten().copied()
    }
}

/// Minimum action counts from the agent's cell and orientation to every cell.
///
/// Continuing straight into an open neighbor costs one turn; entering a
/// neighbor along any other heading costs two (turn, then move). The field is
/// solved with a two-bucket wavefront: the bucket for `distance + 1` and the
/// bucket for `distance + 2` rotate every round, so each round drains exactly
/// the cells settled at the current distance. Expansion follows
/// [`Orientation::ALL`], which makes the output identical for identical inputs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DistanceField {
    size: GridSize,
    origin: CellCoord,
    orientation: Option<Orientation>,
    turns: Vec<u32>,
    arrivals: Vec<ArrivalSet>,
    frontier: Vec<CellCoord>,
    next_one: Vec<CellCoord>,
    next_two: Vec<CellCoord>,
}

impl DistanceField {
    /// Computes a fresh field seeded at `origin` facing `orientation`.
    #[must_use]
    pub fn compute(mask: &WallMask, origin: CellCoord, orientation: Orientation) -> Self {
        let mut field = Self::default();
        field.rebuild(mask, origin, orientation);
        field
    }

    /// Recomputes the field in place, reusing the scratch buffers.
    pub fn rebuild(&mut self, mask: &WallMask, origin: CellCoord, orientation: Orientation) {
        let size = mask.size();
        let cell_count = size.cell_count();

        self.size = size;
        self.origin = if cell_count == 0 {
            origin
        } else {
            size.wrap(origin)
        };
        self.orientation = Some(orientation);
        self.turns.clear();
        self.turns.resize(cell_count, UNREACHABLE);
        self.arrivals.clear();
        self.arrivals.resize(cell_count, ArrivalSet::default());
        self.frontier.clear();
        self.next_one.clear();
        self.next_two.clear();

        let Some(origin_index) = size.index(self.origin) else {
            return;
        };
        self.turns[origin_index] = 0;
        self.arrivals[origin_index] = ArrivalSet::single(orientation);
        self.frontier.push(self.origin);

        let mut distance = 0u32;
        while !(self.frontier.is_empty() && self.next_one.is_empty() && self.next_two.is_empty()) {
            for position in 0..self.frontier.len() {
                let cell = self.frontier[position];
                self.expand(mask, cell, distance);
            }

            self.frontier.clear();
            std::mem::swap(&mut self.frontier, &mut self.next_one);
            std::mem::swap(&mut self.next_one, &mut self.next_two);
            distance = distance.saturating_add(1);
        }
    }

    fn expand(&mut self, mask: &WallMask, cell: CellCoord, distance: u32) {
        let Some(index) = self.size.index(cell) else {
            return;
        };
        // Entries left behind after a later improvement are skipped.
        if self.turns[index] != distance {
            return;
        }
        let held = self.arrivals[index];

        for heading in Orientation::ALL {
            let neighbor = self.size.step(cell, heading);
            if mask.is_blocked(neighbor) {
                continue;
            }
            let Some(neighbor_index) = self.size.index(neighbor) else {
                continue;
            };

            let straight = held.contains(heading);
            let candidate = distance.saturating_add(if straight { 1 } else { 2 });
            let settled = self.turns[neighbor_index];

            if candidate > settled {
                continue;
            }
            if candidate == settled {
                let _ = self.arrivals[neighbor_index].insert(heading);
                continue;
            }

            self.turns[neighbor_index] = candidate;
            self.arrivals[neighbor_index] = ArrivalSet::single(heading);
            if straight {
                self.next_one.push(neighbor);
            } else {
                self.next_two.push(neighbor);
            }
        }
    }

    /// Grid dimensions the field was computed over.
    #[must_use]
    pub const fn size(&self) -> GridSize {
        self.size
    }

    /// Cell the wavefront was seeded from.
    #[must_use]
    pub const fn origin(&self) -> CellCoord {
        self.origin
    }

    /// Orientation held at the origin, if the field has been computed.
    #[must_use]
    pub const fn orientation(&self) -> Option<Orientation> {
        self.orientation
    }

    /// Minimum number of actions to reach `cell`, or `None` when unreachable.
    #[must_use]
    pub fn turns(&self, cell: CellCoord) -> Option<u32> {
        self.raw_turns(cell).filter(|turns| *turns != UNREACHABLE)
    }

    /// Raw stored distance, including the [`UNREACHABLE`] sentinel.
    #[must_use]
    pub fn raw_turns(&self, cell: CellCoord) -> Option<u32> {
        let index = self.index_of(cell)?;
        self.turns.get(index).copied()
    }

    /// Reports whether the wavefront reached `cell`.
    #[must_use]
    pub fn is_reachable(&self, cell: CellCoord) -> bool {
        self.turns(cell).is_some()
    }

    /// Orientations the agent may hold on first reaching `cell` optimally.
    #[must_use]
    pub fn arrivals(&self, cell: CellCoord) -> ArrivalSet {
        self.index_of(cell)
            .and_then(|index| self.arrivals.get(index).copied())
            .unwrap_or_default()
    }

    /// Reconstructs a shortest path from the origin to `target`.
    ///
    /// Each entry is a cell entered along the path together with the heading
    /// used to enter it, origin excluded. Walking backward, a cell's arrival
    /// matching the heading the path leaves it with is preferred; otherwise the
    /// first recorded arrival is taken. Counting one action per straight step
    /// and two per turned step over the result reproduces [`Self::turns`].
    ///
    /// Requesting an unreachable target is a caller bug: it trips a debug
    /// assertion and yields an empty path in release builds.
    #[must_use]
    pub fn path(&self, target: CellCoord) -> Vec<(CellCoord, Orientation)> {
        let Some(turns) = self.raw_turns(target) else {
            return Vec::new();
        };
        debug_assert!(
            turns != UNREACHABLE,
            "path requested to unreachable cell {target}"
        );
        if turns == UNREACHABLE {
            return Vec::new();
        }

        let mut cell = self.size.wrap(target);
        let mut leaving: Option<Orientation> = None;
        let mut steps = Vec::new();

        for _ in 0..turns {
            if cell == self.origin {
                break;
            }
            let arrivals = self.arrivals(cell);
            let Some(heading) = leaving
                .filter(|heading| arrivals.contains(*heading))
                .or_else(|| arrivals.first())
            else {
                break;
            };
            steps.push((cell, heading));
            leaving = Some(heading);
            cell = self.size.step(cell, heading.opposite());
        }

        steps.reverse();
        steps
    }

    /// Orientation the agent must face right now to follow a shortest path.
    #[must_use]
    pub fn first_orientation(&self, target: CellCoord) -> Option<Orientation> {
        self.path(target).first().map(|(_, heading)| *heading)
    }

    /// Action that starts a shortest path toward `target`.
    ///
    /// `None` when the agent already stands on `target`.
    #[must_use]
    pub fn first_action(&self, target: CellCoord) -> Option<Action> {
        let current = self.orientation?;
        self.first_orientation(target)
            .map(|desired| Action::toward(current, desired))
    }

    fn index_of(&self, cell: CellCoord) -> Option<usize> {
        if self.size.cell_count() == 0 {
            return None;
        }
        self.size.index(self.size.wrap(cell))
    }
}
