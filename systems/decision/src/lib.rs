#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-turn decision engine that ties the duel systems together.
//!
//! One [`DuelEngine`] is created at match start and asked for exactly one
//! action per turn. It owns every piece of state that survives between turns:
//! the cached wall mask, the vantage generation, the engagement sequence, the
//! face-off streak and the learned opponent traits.

mod config;
mod profile;

pub use config::{ConfigError, EngineConfig};
pub use profile::OpponentProfile;

use torus_duel_core::{Action, Snapshot, TurretId};
use torus_duel_system_engagement::{
    Engagement, EngagementPhase, EngagementStep, EntryContext, EntryDecision,
};
use torus_duel_system_safety::{MoveSafety, SafetyContext, SafetyRule};
use torus_duel_system_targeting::{Destination, TargetSelector, VantagePoint, VantageRegistry};
use torus_duel_system_threat::ThreatModel;
use torus_duel_world::{DistanceField, WallMask};

/// Which part of the engine produced the action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DecisionSource {
    /// A step of the engagement sequence.
    Engagement(EngagementPhase),
    /// Turning on a vantage point toward a usable approach heading.
    Reorient,
    /// Following the distance field toward the destination.
    Path,
    /// Nowhere reachable to go.
    Idle,
    /// A safety rule replaced the candidate action.
    Safety(SafetyRule),
    /// The snapshot failed validation.
    Rejected,
}

/// Action chosen for one turn with a short account of how it was reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Decision {
    /// Action to send to the host.
    pub action: Action,
    /// Origin of the action.
    pub source: DecisionSource,
    /// Destination selected this turn, if selection ran.
    pub destination: Option<Destination>,
}

/// Decision engine for a single match.
#[derive(Debug, Default)]
pub struct DuelEngine {
    config: EngineConfig,
    mask: WallMask,
    field: DistanceField,
    registry: VantageRegistry,
    engagement: Engagement,
    safety: MoveSafety,
    selector: TargetSelector,
    profile: OpponentProfile,
    entries: Vec<VantagePoint>,
}

impl DuelEngine {
    /// Creates an engine for a new match.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            selector: TargetSelector::new(config.vantage_margin),
            ..Self::default()
        }
    }

    /// Configuration the engine was created with.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Traits learned about the opponent so far.
    #[must_use]
    pub const fn profile(&self) -> &OpponentProfile {
        &self.profile
    }

    /// Turret currently engaged, if any.
    #[must_use]
    pub const fn engaged_turret(&self) -> Option<TurretId> {
        self.engagement.target()
    }

    /// Vantage points of the current generation.
    #[must_use]
    pub fn vantage_points(&self) -> &[VantagePoint] {
        self.registry.points()
    }

    /// Chooses the action for this turn.
    pub fn decide(&mut self, snapshot: &Snapshot) -> Action {
        self.plan(snapshot).action
    }

    /// Chooses the action for this turn and reports how it was reached.
    pub fn plan(&mut self, snapshot: &Snapshot) -> Decision {
        if let Err(error) = snapshot.validate() {
            tracing::warn!(%error, turn = snapshot.turn, "snapshot rejected");
            return Decision {
                action: Action::Hold,
                source: DecisionSource::Rejected,
                destination: None,
            };
        }

        if self.mask.size() != snapshot.size {
            self.mask = WallMask::from_snapshot(snapshot);
            tracing::debug!(
                width = snapshot.size.width(),
                height = snapshot.size.height(),
                "wall mask cached"
            );
        }

        self.profile.resolve(snapshot);

        let agent = &snapshot.agent;
        let opponent = &snapshot.opponent;
        let mask = &self.mask;
        self.field.rebuild(mask, agent.cell, agent.orientation);
        let threat = ThreatModel::new(snapshot, mask, self.config.fire_range);
        let _ = self.registry.refresh(&threat);

        if let Some(turret) = self.engagement.target() {
            let live = snapshot.turrets.get(turret).is_some_and(|turret| !turret.dead);
            if !live {
                self.engagement.abort();
            }
        }

        if self.engagement.is_committed() {
            let phase = self.engagement.phase();
            if let Some(step) = self.engagement.step(&threat) {
                if let EngagementStep::Completed { turret, .. } = step {
                    self.registry.retire(turret);
                }
                if let Some(action) = step.action() {
                    self.profile.record(action, &threat);
                    let decision = Decision {
                        action,
                        source: DecisionSource::Engagement(phase),
                        destination: None,
                    };
                    log_decision(snapshot, &decision);
                    return decision;
                }
            }
        }

        let mut candidate = None;
        self.entries.clear();
        self.entries.extend(self.registry.at(agent.cell).copied());
        if !self.entries.is_empty() {
            let shielded = agent.shield_active || agent.shields > 0;
            let exposed = (!shielded || self.profile.aggressive_while_shielded())
                && !threat.is_agent_safe_from_opponent_fire(agent, opponent);
            if exposed {
                tracing::trace!(cell = %agent.cell, "vantage point exposed to opponent fire");
            } else {
                let context = EntryContext {
                    threat,
                    entries: &self.entries,
                    teleport_risk_check: self.config.teleport_risk_check,
                };
                match self.engagement.evaluate_entry(&context) {
                    EntryDecision::Reorient(action) => {
                        candidate = Some((action, DecisionSource::Reorient, None));
                    }
                    EntryDecision::Enter(_) => {
                        candidate = self
                            .engagement
                            .step(&threat)
                            .and_then(|step| step.action())
                            .map(|action| {
                                let source = DecisionSource::Engagement(EngagementPhase::Approach);
                                (action, source, None)
                            });
                    }
                    EntryDecision::Withhold(veto) => {
                        tracing::trace!(?veto, "engagement withheld");
                    }
                }
            }
        }

        let (action, source, destination) = candidate.unwrap_or_else(|| {
            let destination = self.selector.select_destination(
                &self.field,
                self.registry.points(),
                &snapshot.power_ups,
                opponent.cell,
            );
            let cell = destination.cell();
            let step = if self.field.is_reachable(cell) {
                self.field.first_action(cell)
            } else {
                None
            };
            match step {
                Some(action) => (action, DecisionSource::Path, Some(destination)),
                None => (Action::Hold, DecisionSource::Idle, Some(destination)),
            }
        });

        let safety = SafetyContext {
            threat,
            projectile_horizon: self.config.projectile_horizon,
            faceoff_fire_limit: self.config.faceoff_fire_limit,
            opponent_reactive_to_fire: self.profile.reactive_to_fire(),
        };
        let verdict = self.safety.review(action, &safety);
        let source = match verdict.rule {
            Some(rule) if verdict.overrides(action) => {
                if self.engagement.target().is_some() {
                    self.engagement.abort();
                }
                DecisionSource::Safety(rule)
            }
            _ => source,
        };

        self.profile.record(verdict.action, &threat);
        let decision = Decision {
            action: verdict.action,
            source,
            destination,
        };
        log_decision(snapshot, &decision);
        decision
    }
}

fn log_decision(snapshot: &Snapshot, decision: &Decision) {
    tracing::debug!(
        turn = snapshot.turn,
        action = %decision.action,
        source = ?decision.source,
        "turn decided"
    );
}
