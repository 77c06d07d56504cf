#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that drives the close-range turret engagement.
//!
//! An engagement starts on a vantage point once every entry precondition
//! holds, then runs three turns: step onto the firing axis, face the
//! turret, fire. Entry checks never touch the state; only a successful entry,
//! a step or an abort does.

use torus_duel_core::{Action, AgentSnapshot, Orientation, TurretId, TurretSnapshot};
use torus_duel_system_targeting::VantagePoint;
use torus_duel_system_threat::ThreatModel;
use torus_duel_world::DistanceField;

/// Uninterrupted turns an engagement needs when the axis cell touches the turret.
const ADJACENT_WINDOW: u32 = 3;
/// Uninterrupted turns an engagement needs otherwise.
const DISTANT_WINDOW: u32 = 4;

/// Phase of the engagement sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EngagementPhase {
    /// Next step moves onto the firing axis.
    #[default]
    Approach,
    /// Next step turns to face the turret.
    Orient,
    /// Next step fires at the turret.
    Fire,
}

/// Reason an engagement was not entered this turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryVeto {
    /// The agent is not standing on a vantage point.
    NoVantage,
    /// The vantage point's turret is gone.
    TargetGone(TurretId),
    /// The turret is not at the start of its cooldown.
    OffCycle,
    /// A projectile is heading for the agent within the engagement window.
    InboundProjectile {
        /// Cells between the agent and the projectile.
        distance: u32,
    },
    /// The opponent could walk onto the agent within the engagement window.
    OpponentInRange {
        /// Opponent turns to the agent's cell.
        turns: u32,
    },
    /// The opponent could teleport and reach the agent within the window.
    TeleportLanding {
        /// Index of the risky landing cell.
        slot: usize,
    },
}

/// Outcome of an entry evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryDecision {
    /// Turn to a usable approach heading first; no engagement yet.
    Reorient(Action),
    /// Engagement entered against the turret.
    Enter(TurretId),
    /// Preconditions failed; fall back to normal behaviour this turn.
    Withhold(EntryVeto),
}

/// Action produced by one engagement step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngagementStep {
    /// The sequence continues with `action`.
    Act(Action),
    /// The final shot was issued; the turret's vantage points can be retired.
    Completed {
        /// Action to issue this turn.
        action: Action,
        /// Turret the sequence was aimed at.
        turret: TurretId,
    },
    /// The turret could not be found from the axis cell; the sequence reset.
    Aborted,
}

impl EngagementStep {
    /// Action to issue, if the step produced one.
    #[must_use]
    pub const fn action(&self) -> Option<Action> {
        match self {
            Self::Act(action) | Self::Completed { action, .. } => Some(*action),
            Self::Aborted => None,
        }
    }
}

/// Everything an entry evaluation looks at.
#[derive(Clone, Copy, Debug)]
pub struct EntryContext<'a> {
    /// Threat queries over the current snapshot.
    pub threat: ThreatModel<'a>,
    /// Vantage points located on the agent's cell.
    pub entries: &'a [VantagePoint],
    /// Whether the opponent's teleport landings count as a threat.
    pub teleport_risk_check: bool,
}

/// Engagement state machine with a scratch field for opponent reach checks.
#[derive(Debug, Default)]
pub struct Engagement {
    phase: EngagementPhase,
    target: Option<TurretId>,
    reach: DistanceField,
}

impl Engagement {
    /// Creates an idle engagement.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> EngagementPhase {
        self.phase
    }

    /// Turret currently engaged, if any.
    #[must_use]
    pub const fn target(&self) -> Option<TurretId> {
        self.target
    }

    /// Reports whether the sequence is past its first step and must not be
    /// overridden.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.target.is_some() && self.phase != EngagementPhase::Approach
    }

    /// Drops the engaged turret and returns to [`EngagementPhase::Approach`].
    pub fn abort(&mut self) {
        if let Some(turret) = self.target.take() {
            tracing::debug!(turret = turret.get(), phase = ?self.phase, "engagement reset");
        }
        self.phase = EngagementPhase::Approach;
    }

    /// Checks whether an engagement may start from the agent's cell.
    ///
    /// Every entry whose approach matches the agent's heading is tried in
    /// order; the first one passing all checks is entered. When all of them
    /// fail, the first veto is reported. Only [`EntryDecision::Enter`]
    /// changes the state.
    pub fn evaluate_entry(&mut self, context: &EntryContext<'_>) -> EntryDecision {
        let agent = &context.threat.snapshot().agent;

        let Some(first) = context.entries.first() else {
            return EntryDecision::Withhold(EntryVeto::NoVantage);
        };

        let mut first_veto = None;
        for entry in context
            .entries
            .iter()
            .filter(|entry| entry.approach == agent.orientation)
        {
            match self.admit(context, entry) {
                Ok((turret, window)) => {
                    self.target = Some(turret);
                    self.phase = EngagementPhase::Approach;
                    tracing::debug!(
                        turret = turret.get(),
                        cell = %agent.cell,
                        window,
                        "engagement entered"
                    );
                    return EntryDecision::Enter(turret);
                }
                Err(veto) => {
                    tracing::trace!(turret = entry.turret.get(), ?veto, "vantage entry vetoed");
                    if first_veto.is_none() {
                        first_veto = Some(veto);
                    }
                }
            }
        }

        match first_veto {
            Some(veto) => EntryDecision::Withhold(veto),
            None => EntryDecision::Reorient(Action::Face(first.approach)),
        }
    }

    /// Runs the entry checks for one vantage entry.
    ///
    /// Yields the turret and the engagement window when the entry is usable.
    fn admit(
        &mut self,
        context: &EntryContext<'_>,
        entry: &VantagePoint,
    ) -> Result<(TurretId, u32), EntryVeto> {
        let snapshot = context.threat.snapshot();
        let agent = &snapshot.agent;

        let turret = snapshot
            .turrets
            .get(entry.turret)
            .filter(|turret| !turret.dead)
            .ok_or(EntryVeto::TargetGone(entry.turret))?;

        if !turret.cooldown_begins_at(snapshot.turn) {
            return Err(EntryVeto::OffCycle);
        }

        let window = engagement_window(&context.threat, agent, entry, turret);

        if let Some(inbound) = context.threat.inbound_projectile(agent.cell, window) {
            return Err(EntryVeto::InboundProjectile {
                distance: inbound.distance,
            });
        }

        if let Some(veto) = self.opponent_veto(context, window) {
            return Err(veto);
        }

        Ok((turret.id, window))
    }

    /// Advances the sequence by one turn.
    ///
    /// Returns `None` when no engagement is active.
    pub fn step(&mut self, threat: &ThreatModel<'_>) -> Option<EngagementStep> {
        let turret = self.target?;
        let step = match self.phase {
            EngagementPhase::Approach => {
                self.phase = EngagementPhase::Orient;
                EngagementStep::Act(Action::MoveForward)
            }
            EngagementPhase::Orient => match facing_toward(threat, turret) {
                Some(direction) => {
                    self.phase = EngagementPhase::Fire;
                    EngagementStep::Act(Action::Face(direction))
                }
                None => {
                    tracing::debug!(turret = turret.get(), "turret not in sight from axis cell");
                    self.abort();
                    EngagementStep::Aborted
                }
            },
            EngagementPhase::Fire => {
                self.target = None;
                self.phase = EngagementPhase::Approach;
                EngagementStep::Completed {
                    action: Action::Fire,
                    turret,
                }
            }
        };
        Some(step)
    }

    fn opponent_veto(&mut self, context: &EntryContext<'_>, window: u32) -> Option<EntryVeto> {
        let threat = &context.threat;
        let snapshot = threat.snapshot();
        let mask = threat.mask();
        let agent = snapshot.agent.cell;
        let opponent = &snapshot.opponent;

        self.reach.rebuild(mask, opponent.cell, opponent.orientation);
        if let Some(turns) = self.reach.turns(agent).filter(|turns| *turns <= window) {
            return Some(EntryVeto::OpponentInRange { turns });
        }

        if !context.teleport_risk_check || opponent.teleports == 0 {
            return None;
        }

        for (slot, landing) in snapshot.teleport_cells.iter().enumerate() {
            if mask.is_blocked(*landing) {
                continue;
            }
            self.reach.rebuild(mask, *landing, opponent.orientation);
            let within = self
                .reach
                .turns(agent)
                .is_some_and(|turns| turns.saturating_add(1) <= window);
            if within {
                return Some(EntryVeto::TeleportLanding { slot });
            }
        }
        None
    }
}

fn engagement_window(
    threat: &ThreatModel<'_>,
    agent: &AgentSnapshot,
    entry: &VantagePoint,
    turret: &TurretSnapshot,
) -> u32 {
    let size = threat.mask().size();
    let axis_cell = size.step(agent.cell, entry.approach);
    if size.manhattan_distance(axis_cell, turret.cell) == 1 {
        ADJACENT_WINDOW
    } else {
        DISTANT_WINDOW
    }
}

fn facing_toward(threat: &ThreatModel<'_>, turret: TurretId) -> Option<Orientation> {
    let snapshot = threat.snapshot();
    let target = snapshot.turrets.get(turret).filter(|turret| !turret.dead)?;
    let cell = snapshot.agent.cell;
    Orientation::ALL.into_iter().find(|direction| {
        threat
            .mask()
            .first_obstacle(cell, *direction, threat.fire_range())
            .is_some_and(|(_, obstacle)| obstacle == target.cell)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use torus_duel_core::{BulletSnapshot, CellCoord, GridSize, Snapshot, TurretView};
    use torus_duel_system_targeting::vantage_points;
    use torus_duel_world::WallMask;

    const TURRET: TurretId = TurretId::new(1);

    fn agent_at(x: u32, y: u32, orientation: Orientation) -> AgentSnapshot {
        AgentSnapshot {
            cell: CellCoord::new(x, y),
            orientation,
            hit_points: 3,
            shields: 0,
            teleports: 0,
            lasers: 0,
            shield_active: false,
        }
    }

    fn snapshot(agent: AgentSnapshot, turn: u32) -> Snapshot {
        Snapshot {
            size: GridSize::new(12, 12),
            walls: Vec::new(),
            turrets: TurretView::from_snapshots(vec![TurretSnapshot {
                id: TURRET,
                cell: CellCoord::new(5, 5),
                fire_time: 1,
                cooldown_time: 4,
                firing_next_turn: false,
                dead: false,
            }]),
            bullets: Vec::new(),
            power_ups: Vec::new(),
            teleport_cells: Vec::new(),
            agent,
            opponent: agent_at(0, 10, Orientation::Up),
            turn,
        }
    }

    fn evaluate(
        engagement: &mut Engagement,
        snapshot: &Snapshot,
        teleport_risk: bool,
    ) -> EntryDecision {
        let mask = WallMask::from_snapshot(snapshot);
        let threat = ThreatModel::new(snapshot, &mask, 4);
        let entries: Vec<_> = vantage_points(&threat)
            .into_iter()
            .filter(|point| point.cell == snapshot.agent.cell)
            .collect();
        engagement.evaluate_entry(&EntryContext {
            threat,
            entries: &entries,
            teleport_risk_check: teleport_risk,
        })
    }

    fn step(engagement: &mut Engagement, snapshot: &Snapshot) -> Option<EngagementStep> {
        let mask = WallMask::from_snapshot(snapshot);
        let threat = ThreatModel::new(snapshot, &mask, 4);
        engagement.step(&threat)
    }

    #[test]
    fn full_cycle_takes_three_steps() {
        let mut engagement = Engagement::new();
        let start = snapshot(agent_at(6, 3, Orientation::Left), 1);

        assert_eq!(evaluate(&mut engagement, &start, true), EntryDecision::Enter(TURRET));
        assert!(!engagement.is_committed());
        assert_eq!(
            step(&mut engagement, &start),
            Some(EngagementStep::Act(Action::MoveForward))
        );
        assert_eq!(engagement.phase(), EngagementPhase::Orient);
        assert!(engagement.is_committed());

        let on_axis = snapshot(agent_at(5, 3, Orientation::Left), 2);
        let orient = step(&mut engagement, &on_axis);
        assert_eq!(orient, Some(EngagementStep::Act(Action::Face(Orientation::Down))));
        assert_ne!(orient.and_then(|step| step.action()), Some(Action::Fire));

        let facing = snapshot(agent_at(5, 3, Orientation::Down), 3);
        assert_eq!(
            step(&mut engagement, &facing),
            Some(EngagementStep::Completed {
                action: Action::Fire,
                turret: TURRET,
            })
        );
        assert!(!engagement.is_committed());
        assert_eq!(engagement.target(), None);
        assert_eq!(step(&mut engagement, &facing), None);
    }

    #[test]
    fn wrong_heading_asks_for_reorientation_without_entering() {
        let mut engagement = Engagement::new();
        let start = snapshot(agent_at(6, 3, Orientation::Up), 1);

        assert_eq!(
            evaluate(&mut engagement, &start, true),
            EntryDecision::Reorient(Action::Face(Orientation::Left))
        );
        assert_eq!(engagement.target(), None);
    }

    #[test]
    fn entry_waits_for_cooldown_start() {
        let mut engagement = Engagement::new();
        let start = snapshot(agent_at(6, 3, Orientation::Left), 2);

        assert_eq!(
            evaluate(&mut engagement, &start, true),
            EntryDecision::Withhold(EntryVeto::OffCycle)
        );
        assert_eq!(engagement.target(), None);
    }

    #[test]
    fn inbound_projectile_vetoes_entry() {
        let mut engagement = Engagement::new();
        let mut start = snapshot(agent_at(6, 3, Orientation::Left), 1);
        start.bullets.push(BulletSnapshot {
            cell: CellCoord::new(6, 0),
            heading: Orientation::Down,
        });

        assert_eq!(
            evaluate(&mut engagement, &start, true),
            EntryDecision::Withhold(EntryVeto::InboundProjectile { distance: 3 })
        );
    }

    #[test]
    fn nearby_opponent_vetoes_entry() {
        let mut engagement = Engagement::new();
        let mut start = snapshot(agent_at(6, 3, Orientation::Left), 1);
        start.opponent = agent_at(8, 3, Orientation::Left);

        assert_eq!(
            evaluate(&mut engagement, &start, true),
            EntryDecision::Withhold(EntryVeto::OpponentInRange { turns: 2 })
        );
    }

    #[test]
    fn teleport_landing_risk_follows_the_flag() {
        let mut start = snapshot(agent_at(6, 3, Orientation::Left), 1);
        start.opponent.teleports = 1;
        start.teleport_cells = vec![CellCoord::new(0, 0), CellCoord::new(7, 3)];

        let mut guarded = Engagement::new();
        assert_eq!(
            evaluate(&mut guarded, &start, true),
            EntryDecision::Withhold(EntryVeto::TeleportLanding { slot: 1 })
        );

        let mut relaxed = Engagement::new();
        assert_eq!(evaluate(&mut relaxed, &start, false), EntryDecision::Enter(TURRET));
    }

    #[test]
    fn orient_aborts_when_turret_is_out_of_sight() {
        let mut engagement = Engagement::new();
        let start = snapshot(agent_at(6, 3, Orientation::Left), 1);
        assert_eq!(evaluate(&mut engagement, &start, true), EntryDecision::Enter(TURRET));
        let _ = step(&mut engagement, &start);

        // The forward step never happened.
        let stuck = snapshot(agent_at(6, 3, Orientation::Left), 2);
        assert_eq!(step(&mut engagement, &stuck), Some(EngagementStep::Aborted));
        assert_eq!(engagement.phase(), EngagementPhase::Approach);
        assert!(!engagement.is_committed());
    }

    #[test]
    fn off_cycle_entry_does_not_hide_a_ready_turret() {
        let mut engagement = Engagement::new();
        let mut start = snapshot(agent_at(6, 3, Orientation::Left), 1);
        let resting = TurretId::new(0);
        let mut turrets: Vec<_> = start.turrets.iter().copied().collect();
        turrets.push(TurretSnapshot {
            id: resting,
            cell: CellCoord::new(10, 10),
            fire_time: 2,
            cooldown_time: 3,
            firing_next_turn: false,
            dead: false,
        });
        start.turrets = TurretView::from_snapshots(turrets);

        let mask = WallMask::from_snapshot(&start);
        let threat = ThreatModel::new(&start, &mask, 4);
        let shared = |turret| VantagePoint {
            cell: CellCoord::new(6, 3),
            turret,
            approach: Orientation::Left,
        };
        let entries = [shared(resting), shared(TURRET)];
        let context = EntryContext {
            threat,
            entries: &entries,
            teleport_risk_check: true,
        };

        assert_eq!(engagement.evaluate_entry(&context), EntryDecision::Enter(TURRET));
        assert_eq!(engagement.target(), Some(TURRET));

        let mut lone = Engagement::new();
        let context = EntryContext {
            entries: &entries[..1],
            ..context
        };
        assert_eq!(
            lone.evaluate_entry(&context),
            EntryDecision::Withhold(EntryVeto::OffCycle)
        );
        assert_eq!(lone.target(), None);
    }
}
