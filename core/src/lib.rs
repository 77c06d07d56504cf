#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Torus Duel decision engine.
//!
//! This crate defines the read-only snapshot the host hands the engine every
//! turn, the toroidal grid geometry every system reasons about, and the closed
//! [`Action`] set the engine answers with. Systems never mutate a
//! [`Snapshot`]; they query it, and the decision engine returns exactly one
//! action per call.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of teleport slots addressable by [`Action::Teleport`].
pub const TELEPORT_SLOTS: u8 = 6;

/// Cardinal orientations an agent or projectile may face.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Facing toward decreasing `y`.
    Up,
    /// Facing toward increasing `y`.
    Down,
    /// Facing toward decreasing `x`.
    Left,
    /// Facing toward increasing `x`.
    Right,
}

impl Orientation {
    /// Every orientation in the fixed order used for neighbor expansion.
    pub const ALL: [Orientation; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// Orientation pointing the other way along the same axis.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// The two orientations at right angles to this one.
    #[must_use]
    pub const fn perpendicular(self) -> [Self; 2] {
        match self {
            Self::Up | Self::Down => [Self::Left, Self::Right],
            Self::Left | Self::Right => [Self::Up, Self::Down],
        }
    }

    /// Reports whether `other` lies on the crossing axis.
    #[must_use]
    pub const fn is_perpendicular_to(self, other: Self) -> bool {
        self.is_vertical() != other.is_vertical()
    }

    /// Reports whether the orientation runs along the `y` axis.
    #[must_use]
    pub const fn is_vertical(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }
}

/// Location of a single grid cell.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CellCoord {
    x: u32,
    y: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based column of the cell.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row of the cell.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Dimensions of the toroidal grid.
///
/// All coordinate arithmetic wraps modulo the width and height, so stepping
/// off one edge re-enters from the opposite edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    width: u32,
    height: u32,
}

impl GridSize {
    /// Creates a grid description with explicit dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Total number of cells on the grid.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        usize::try_from(u64::from(self.width) * u64::from(self.height)).unwrap_or(0)
    }

    /// Reports whether the cell lies inside the grid without wrapping.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.x < self.width && cell.y < self.height
    }

    /// Folds an arbitrary cell back onto the torus.
    #[must_use]
    pub const fn wrap(&self, cell: CellCoord) -> CellCoord {
        CellCoord::new(cell.x % self.width, cell.y % self.height)
    }

    /// Neighbor reached by moving one cell in `orientation`.
    #[must_use]
    pub const fn step(&self, cell: CellCoord, orientation: Orientation) -> CellCoord {
        let x = cell.x % self.width;
        let y = cell.y % self.height;
        match orientation {
            Orientation::Up => CellCoord::new(x, (y + self.height - 1) % self.height),
            Orientation::Down => CellCoord::new(x, (y + 1) % self.height),
            Orientation::Left => CellCoord::new((x + self.width - 1) % self.width, y),
            Orientation::Right => CellCoord::new((x + 1) % self.width, y),
        }
    }

    /// Cell reached after `distance` steps in `orientation`.
    #[must_use]
    pub fn advance(&self, cell: CellCoord, orientation: Orientation, distance: u32) -> CellCoord {
        (0..distance).fold(self.wrap(cell), |current, _| self.step(current, orientation))
    }

    /// Row-major index of a cell, or `None` when it lies outside the grid.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let width = usize::try_from(self.width).ok()?;
        let row = usize::try_from(cell.y).ok()?;
        let column = usize::try_from(cell.x).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }

    /// Cell stored at a row-major index.
    #[must_use]
    pub fn cell_at(&self, index: usize) -> Option<CellCoord> {
        if index >= self.cell_count() {
            return None;
        }
        let width = usize::try_from(self.width).ok()?;
        let x = u32::try_from(index % width).ok()?;
        let y = u32::try_from(index / width).ok()?;
        Some(CellCoord::new(x, y))
    }

    /// Manhattan distance measured the short way around the torus.
    #[must_use]
    pub fn manhattan_distance(&self, a: CellCoord, b: CellCoord) -> u32 {
        wrapped_delta(a.x, b.x, self.width) + wrapped_delta(a.y, b.y, self.height)
    }

    /// Orientation and distance from `from` to `to` when both share an axis.
    ///
    /// The shorter way around the torus wins; on an exact tie the positive
    /// direction (`Right`/`Down`) is reported. Identical cells yield `None`.
    #[must_use]
    pub fn axial_offset(&self, from: CellCoord, to: CellCoord) -> Option<(Orientation, u32)> {
        let from = self.wrap(from);
        let to = self.wrap(to);
        if from == to {
            return None;
        }
        if from.y == to.y {
            let forward = (to.x + self.width - from.x) % self.width;
            let backward = self.width - forward;
            return Some(if forward <= backward {
                (Orientation::Right, forward)
            } else {
                (Orientation::Left, backward)
            });
        }
        if from.x == to.x {
            let forward = (to.y + self.height - from.y) % self.height;
            let backward = self.height - forward;
            return Some(if forward <= backward {
                (Orientation::Down, forward)
            } else {
                (Orientation::Up, backward)
            });
        }
        None
    }
}

fn wrapped_delta(a: u32, b: u32, span: u32) -> u32 {
    let direct = a.abs_diff(b);
    direct.min(span.saturating_sub(direct))
}

/// Index into the host's teleport landing list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct TeleportSlot(u8);

impl TeleportSlot {
    /// Creates a slot, rejecting indices past [`TELEPORT_SLOTS`].
    pub fn new(index: u8) -> Result<Self, TeleportSlotError> {
        if index < TELEPORT_SLOTS {
            Ok(Self(index))
        } else {
            Err(TeleportSlotError { index })
        }
    }

    /// Zero-based slot index.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for TeleportSlot {
    type Error = TeleportSlotError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TeleportSlot> for u8 {
    fn from(slot: TeleportSlot) -> Self {
        slot.0
    }
}

/// Raised when a teleport slot index exceeds the host's slot range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("teleport slot {index} is out of range (max {max})", max = TELEPORT_SLOTS - 1)]
pub struct TeleportSlotError {
    /// Rejected index.
    pub index: u8,
}

/// Every command the engine may answer with. Exactly one is issued per turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Stay in place and do nothing.
    Hold,
    /// Step one cell along the current orientation.
    MoveForward,
    /// Turn on the spot to face the given orientation.
    Face(Orientation),
    /// Fire the primary weapon along the current orientation.
    Fire,
    /// Raise a shield, consuming one charge.
    Shield,
    /// Teleport to the landing cell in the given slot.
    Teleport(TeleportSlot),
    /// Fire the secondary weapon.
    Laser,
}

impl Action {
    /// Action that makes progress toward facing or moving along `desired`.
    ///
    /// Already facing `desired` means the agent can step forward; anything else
    /// costs a turn to reorient first.
    #[must_use]
    pub const fn toward(current: Orientation, desired: Orientation) -> Self {
        if current as u8 == desired as u8 {
            Self::MoveForward
        } else {
            Self::Face(desired)
        }
    }

    /// Reports whether the action leaves the agent on its current cell.
    #[must_use]
    pub const fn is_stationary(&self) -> bool {
        !matches!(self, Self::MoveForward | Self::Teleport(_))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hold => write!(f, "hold"),
            Self::MoveForward => write!(f, "forward"),
            Self::Face(Orientation::Up) => write!(f, "face-up"),
            Self::Face(Orientation::Down) => write!(f, "face-down"),
            Self::Face(Orientation::Left) => write!(f, "face-left"),
            Self::Face(Orientation::Right) => write!(f, "face-right"),
            Self::Fire => write!(f, "fire"),
            Self::Shield => write!(f, "shield"),
            Self::Teleport(slot) => write!(f, "teleport-{}", slot.get()),
            Self::Laser => write!(f, "laser"),
        }
    }
}

/// Unique identifier assigned to a turret by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TurretId(u32);

impl TurretId {
    /// Creates a new turret identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Immutable representation of a single turret's state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurretSnapshot {
    /// Identifier allocated to the turret by the host.
    pub id: TurretId,
    /// Cell the turret occupies. Turret cells are never enterable.
    pub cell: CellCoord,
    /// Number of consecutive turns the turret fires per cycle.
    pub fire_time: u32,
    /// Number of consecutive turns the turret rests per cycle.
    pub cooldown_time: u32,
    /// Indicates the turret will fire on the next round.
    pub firing_next_turn: bool,
    /// Indicates the turret has been destroyed.
    pub dead: bool,
}

impl TurretSnapshot {
    /// Length of one fire/cooldown cycle in turns.
    #[must_use]
    pub const fn period(&self) -> u32 {
        self.fire_time + self.cooldown_time
    }

    /// Reports whether `turn` is the first turn of the turret's cooldown.
    #[must_use]
    pub const fn cooldown_begins_at(&self, turn: u32) -> bool {
        let period = self.period();
        period != 0 && turn % period == self.fire_time
    }
}

/// Read-only view of all turrets, ordered by identifier.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<TurretSnapshot>", into = "Vec<TurretSnapshot>")]
pub struct TurretView {
    snapshots: Vec<TurretSnapshot>,
}

impl TurretView {
    /// Creates a new turret view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TurretSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over every turret in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TurretSnapshot> {
        self.snapshots.iter()
    }

    /// Iterator over turrets that have not been destroyed.
    pub fn live(&self) -> impl Iterator<Item = &TurretSnapshot> {
        self.snapshots.iter().filter(|snapshot| !snapshot.dead)
    }

    /// Looks up a turret by identifier.
    #[must_use]
    pub fn get(&self, id: TurretId) -> Option<&TurretSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }
}

impl From<Vec<TurretSnapshot>> for TurretView {
    fn from(snapshots: Vec<TurretSnapshot>) -> Self {
        Self::from_snapshots(snapshots)
    }
}

impl From<TurretView> for Vec<TurretSnapshot> {
    fn from(view: TurretView) -> Self {
        view.snapshots
    }
}

/// A projectile in flight. Projectiles advance one cell per turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BulletSnapshot {
    /// Cell the projectile currently occupies.
    pub cell: CellCoord,
    /// Direction of travel.
    pub heading: Orientation,
}

/// Immutable state of one agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    /// Cell the agent occupies.
    pub cell: CellCoord,
    /// Direction the agent faces.
    pub orientation: Orientation,
    /// Remaining hit points.
    pub hit_points: u32,
    /// Shield charges held.
    #[serde(default)]
    pub shields: u32,
    /// Teleport charges held.
    #[serde(default)]
    pub teleports: u32,
    /// Secondary weapon charges held.
    #[serde(default)]
    pub lasers: u32,
    /// Indicates a shield is currently raised.
    #[serde(default)]
    pub shield_active: bool,
}

impl AgentSnapshot {
    /// Reports whether the agent can raise a fresh shield this turn.
    #[must_use]
    pub const fn can_shield(&self) -> bool {
        self.shields > 0 && !self.shield_active
    }
}

/// Everything the host reveals about one turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Grid dimensions.
    pub size: GridSize,
    /// Static obstacle cells.
    #[serde(default)]
    pub walls: Vec<CellCoord>,
    /// Hazard emitters.
    #[serde(default)]
    pub turrets: TurretView,
    /// Projectiles in flight.
    #[serde(default)]
    pub bullets: Vec<BulletSnapshot>,
    /// Power-up pickup cells.
    #[serde(default)]
    pub power_ups: Vec<CellCoord>,
    /// Teleport landing cells, addressed by slot index.
    #[serde(default)]
    pub teleport_cells: Vec<CellCoord>,
    /// The agent this engine controls.
    pub agent: AgentSnapshot,
    /// The opposing agent.
    pub opponent: AgentSnapshot,
    /// Zero-based turn index.
    #[serde(default)]
    pub turn: u32,
}

impl Snapshot {
    /// Checks the structural assumptions the engine relies on.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.size.width() == 0 || self.size.height() == 0 {
            return Err(SnapshotError::EmptyGrid);
        }
        if !self.size.contains(self.agent.cell) {
            return Err(SnapshotError::OutOfBounds {
                what: "agent",
                cell: self.agent.cell,
            });
        }
        if !self.size.contains(self.opponent.cell) {
            return Err(SnapshotError::OutOfBounds {
                what: "opponent",
                cell: self.opponent.cell,
            });
        }
        if self.teleport_cells.len() > usize::from(TELEPORT_SLOTS) {
            return Err(SnapshotError::TooManyTeleportCells(
                self.teleport_cells.len(),
            ));
        }
        Ok(())
    }
}

/// Structural problems detected in a host snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SnapshotError {
    /// The grid has a zero dimension.
    #[error("grid must have non-zero width and height")]
    EmptyGrid,
    /// An agent sits outside the grid.
    #[error("{what} cell {cell} lies outside the grid")]
    OutOfBounds {
        /// Which agent was misplaced.
        what: &'static str,
        /// Offending cell.
        cell: CellCoord,
    },
    /// More teleport cells than addressable slots.
    #[error("{0} teleport cells exceed the slot range")]
    TooManyTeleportCells(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_wraps_around_every_edge() {
        let size = GridSize::new(5, 4);
        let corner = CellCoord::new(0, 0);
        assert_eq!(size.step(corner, Orientation::Up), CellCoord::new(0, 3));
        assert_eq!(size.step(corner, Orientation::Left), CellCoord::new(4, 0));
        let far = CellCoord::new(4, 3);
        assert_eq!(size.step(far, Orientation::Right), CellCoord::new(0, 3));
        assert_eq!(size.step(far, Orientation::Down), CellCoord::new(4, 0));
    }

    #[test]
    fn manhattan_distance_takes_short_way_round() {
        let size = GridSize::new(10, 10);
        let a = CellCoord::new(1, 1);
        let b = CellCoord::new(9, 2);
        assert_eq!(size.manhattan_distance(a, b), 3);
        assert_eq!(size.manhattan_distance(b, a), 3);
    }

    #[test]
    fn axial_offset_reports_direction_and_distance() {
        let size = GridSize::new(8, 8);
        let origin = CellCoord::new(1, 4);
        assert_eq!(
            size.axial_offset(origin, CellCoord::new(3, 4)),
            Some((Orientation::Right, 2))
        );
        assert_eq!(
            size.axial_offset(origin, CellCoord::new(7, 4)),
            Some((Orientation::Left, 2))
        );
        assert_eq!(
            size.axial_offset(origin, CellCoord::new(1, 1)),
            Some((Orientation::Up, 3))
        );
        assert_eq!(size.axial_offset(origin, CellCoord::new(2, 2)), None);
        assert_eq!(size.axial_offset(origin, origin), None);
    }

    #[test]
    fn index_and_cell_at_agree() {
        let size = GridSize::new(3, 2);
        for index in 0..size.cell_count() {
            let cell = size.cell_at(index).expect("cell in range");
            assert_eq!(size.index(cell), Some(index));
        }
        assert_eq!(size.index(CellCoord::new(3, 0)), None);
    }

    #[test]
    fn toward_turns_before_moving() {
        assert_eq!(
            Action::toward(Orientation::Left, Orientation::Left),
            Action::MoveForward
        );
        assert_eq!(
            Action::toward(Orientation::Left, Orientation::Up),
            Action::Face(Orientation::Up)
        );
    }

    #[test]
    fn perpendicular_pairs_cross_the_axis() {
        for orientation in Orientation::ALL {
            for side in orientation.perpendicular() {
                assert!(orientation.is_perpendicular_to(side));
            }
            assert!(!orientation.is_perpendicular_to(orientation.opposite()));
        }
    }

    #[test]
    fn teleport_slot_rejects_out_of_range_index() {
        assert!(TeleportSlot::new(TELEPORT_SLOTS - 1).is_ok());
        assert_eq!(
            TeleportSlot::new(TELEPORT_SLOTS),
            Err(TeleportSlotError {
                index: TELEPORT_SLOTS
            })
        );
    }

    #[test]
    fn action_round_trips_through_bincode() {
        let action = Action::Teleport(TeleportSlot::new(2).expect("slot"));
        let bytes = bincode::serialize(&action).expect("serialize");
        let restored: Action = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, action);
    }

    #[test]
    fn cooldown_phase_matches_cycle() {
        let turret = TurretSnapshot {
            id: TurretId::new(1),
            cell: CellCoord::new(0, 0),
            fire_time: 2,
            cooldown_time: 3,
            firing_next_turn: false,
            dead: false,
        };
        assert!(turret.cooldown_begins_at(2));
        assert!(turret.cooldown_begins_at(7));
        assert!(!turret.cooldown_begins_at(3));
    }

    #[test]
    fn validate_rejects_misplaced_agent() {
        let agent = AgentSnapshot {
            cell: CellCoord::new(9, 0),
            orientation: Orientation::Up,
            hit_points: 1,
            shields: 0,
            teleports: 0,
            lasers: 0,
            shield_active: false,
        };
        let snapshot = Snapshot {
            size: GridSize::new(4, 4),
            walls: Vec::new(),
            turrets: TurretView::default(),
            bullets: Vec::new(),
            power_ups: Vec::new(),
            teleport_cells: Vec::new(),
            agent,
            opponent: AgentSnapshot {
                cell: CellCoord::new(0, 0),
                ..agent
            },
            turn: 0,
        };
        assert!(matches!(
            snapshot.validate(),
            Err(SnapshotError::OutOfBounds { what: "agent", .. })
        ));
    }
}
