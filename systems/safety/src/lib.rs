#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Reactive safety pass applied to the action chosen by path following.
//!
//! Rules are tried in a fixed order and the first one that matches decides the
//! outcome. A matching rule may still keep the original action when every
//! alternative is exhausted; the result is always exactly one action.

use torus_duel_core::{Action, AgentSnapshot, BulletSnapshot, CellCoord, TeleportSlot};
use torus_duel_system_threat::ThreatModel;

/// Rule that decided a [`Verdict`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SafetyRule {
    /// Forward move into an active turret lane.
    FireLane,
    /// Forward move into a projectile coming straight at the agent.
    HeadOnProjectile,
    /// Projectile two or three cells out that will cross the destination.
    Crossfire,
    /// Forward move into the opponent's muzzle line while facing it.
    FaceOff,
    /// Standing still on a threatened cell.
    ThreatenedStandstill,
}

/// Final action together with the rule that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Verdict {
    /// Action to issue.
    pub action: Action,
    /// Matching rule, or `None` when the original action passed untouched.
    pub rule: Option<SafetyRule>,
}

impl Verdict {
    fn keep(action: Action) -> Self {
        Self { action, rule: None }
    }

    fn by(rule: SafetyRule, action: Action) -> Self {
        Self {
            action,
            rule: Some(rule),
        }
    }

    /// Reports whether the reviewed action was replaced.
    #[must_use]
    pub fn overrides(&self, original: Action) -> bool {
        self.action != original
    }
}

/// Inputs for one safety review.
#[derive(Clone, Copy, Debug)]
pub struct SafetyContext<'a> {
    /// Threat queries over the current snapshot.
    pub threat: ThreatModel<'a>,
    /// Turns ahead to follow projectiles.
    pub projectile_horizon: u32,
    /// Consecutive turns of pre-emptive fire allowed in a face-off.
    pub faceoff_fire_limit: u32,
    /// Whether the opponent answered earlier fire by shielding.
    pub opponent_reactive_to_fire: bool,
}

/// Safety override with the face-off fire streak carried across turns.
#[derive(Debug, Default)]
pub struct MoveSafety {
    faceoff_streak: u32,
}

impl MoveSafety {
    /// Creates a safety pass with no face-off in progress.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consecutive turns fired in the current face-off.
    #[must_use]
    pub const fn faceoff_streak(&self) -> u32 {
        self.faceoff_streak
    }

    /// Reviews `action` and returns the action to issue.
    pub fn review(&mut self, action: Action, context: &SafetyContext<'_>) -> Verdict {
        let verdict = self.apply_rules(action, context);
        if verdict.rule != Some(SafetyRule::FaceOff) || verdict.action != Action::Fire {
            self.faceoff_streak = 0;
        }
        if let Some(rule) = verdict.rule {
            tracing::debug!(
                ?rule,
                original = %action,
                chosen = %verdict.action,
                "safety rule matched"
            );
        }
        verdict
    }

    fn apply_rules(&mut self, action: Action, context: &SafetyContext<'_>) -> Verdict {
        let threat = &context.threat;
        let snapshot = threat.snapshot();
        let agent = &snapshot.agent;
        let size = threat.mask().size();
        let moving = action == Action::MoveForward;
        let destination = if moving {
            size.step(agent.cell, agent.orientation)
        } else {
            agent.cell
        };

        if moving && threat.is_cell_threatened_by_fire_lane(destination) {
            return Verdict::by(SafetyRule::FireLane, Action::Hold);
        }

        if moving && has_head_on_projectile(snapshot.bullets.as_slice(), agent, destination) {
            let chosen = defensive_resource(threat, agent).unwrap_or(action);
            return Verdict::by(SafetyRule::HeadOnProjectile, chosen);
        }

        if let Some(bullet) = crossing_projectile(context, destination) {
            return Verdict::by(
                SafetyRule::Crossfire,
                dodge(context, &bullet).unwrap_or(action),
            );
        }

        if moving && is_faceoff(threat, destination) {
            let opponent = &snapshot.opponent;
            let shielded_reactor = context.opponent_reactive_to_fire && opponent.shields > 0;
            if self.faceoff_streak < context.faceoff_fire_limit && !shielded_reactor {
                self.faceoff_streak += 1;
                return Verdict::by(SafetyRule::FaceOff, Action::Fire);
            }
            let breakoff = agent
                .orientation
                .perpendicular()
                .into_iter()
                .find(|side| threat.is_open(size.step(agent.cell, *side)))
                .map(Action::Face);
            return Verdict::by(SafetyRule::FaceOff, breakoff.unwrap_or(action));
        }

        let standing_in_danger = threat.is_cell_threatened_by_fire_lane(agent.cell)
            || threat.is_cell_hit_within(agent.cell, 1);
        if action.is_stationary() && standing_in_danger {
            let ahead = size.step(agent.cell, agent.orientation);
            let chosen = if threat.is_open(ahead) {
                Action::MoveForward
            } else {
                defensive_resource(threat, agent).unwrap_or(action)
            };
            return Verdict::by(SafetyRule::ThreatenedStandstill, chosen);
        }

        Verdict::keep(action)
    }
}

fn has_head_on_projectile(
    bullets: &[BulletSnapshot],
    agent: &AgentSnapshot,
    destination: CellCoord,
) -> bool {
    bullets
        .iter()
        .any(|bullet| bullet.cell == destination && bullet.heading == agent.orientation.opposite())
}

/// First projectile two or three cells out whose path crosses `destination`.
fn crossing_projectile(
    context: &SafetyContext<'_>,
    destination: CellCoord,
) -> Option<BulletSnapshot> {
    let threat = &context.threat;
    let snapshot = threat.snapshot();
    let size = threat.mask().size();
    let agent = snapshot.agent.cell;
    snapshot
        .bullets
        .iter()
        .filter(|bullet| bullet.cell != destination)
        .filter(|bullet| (2..=3).contains(&size.manhattan_distance(bullet.cell, agent)))
        .find(|bullet| {
            threat
                .projectile_steps_to(bullet, destination, context.projectile_horizon)
                .is_some()
        })
        .copied()
}

/// Sidestep for a crossing projectile.
///
/// Holding is enough when the agent already stands clear of the path facing
/// across it. Shields and teleports are the last resort.
fn dodge(context: &SafetyContext<'_>, bullet: &BulletSnapshot) -> Option<Action> {
    let threat = &context.threat;
    let agent = &threat.snapshot().agent;
    let size = threat.mask().size();
    let horizon = context.projectile_horizon;

    let clear_here = threat.projectile_steps_to(bullet, agent.cell, horizon).is_none();
    if agent.orientation.is_perpendicular_to(bullet.heading) && clear_here {
        return Some(Action::Hold);
    }

    let mut sides = bullet.heading.perpendicular();
    if sides[1] == agent.orientation {
        sides.swap(0, 1);
    }
    let escape = sides.into_iter().find(|side| {
        let cell = size.step(agent.cell, *side);
        threat.is_open(cell) && threat.projectile_steps_to(bullet, cell, horizon).is_none()
    });
    if let Some(side) = escape {
        return Some(Action::toward(agent.orientation, side));
    }

    defensive_resource(threat, agent)
}

fn is_faceoff(threat: &ThreatModel<'_>, destination: CellCoord) -> bool {
    let snapshot = threat.snapshot();
    let agent = &snapshot.agent;
    let opponent = &snapshot.opponent;
    agent.orientation == opponent.orientation.opposite()
        && threat
            .mask()
            .lane(opponent.cell, opponent.orientation, threat.fire_range())
            .any(|(_, cell)| cell == destination)
}

/// Shield if one can be raised, else teleport to the first open landing cell.
fn defensive_resource(threat: &ThreatModel<'_>, agent: &AgentSnapshot) -> Option<Action> {
    if agent.can_shield() {
        return Some(Action::Shield);
    }
    if agent.teleports == 0 {
        return None;
    }
    threat
        .snapshot()
        .teleport_cells
        .iter()
        .enumerate()
        .filter(|(_, cell)| threat.is_open(**cell))
        .find_map(|(index, _)| {
            u8::try_from(index)
                .ok()
                .and_then(|index| TeleportSlot::new(index).ok())
        })
        .map(Action::Teleport)
}
