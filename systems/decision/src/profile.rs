//! Opponent traits learned from probing actions.

use torus_duel_core::{Action, Snapshot};
use torus_duel_system_threat::ThreatModel;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Probe {
    /// The agent fired along the opponent's axis.
    Fire { shields: u32 },
    /// The agent stood in the opponent's line while holding a shield.
    Shield { lasers: u32 },
}

/// Two behavioural traits of the opponent, each observed one turn after a
/// probe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OpponentProfile {
    reactive_to_fire: bool,
    aggressive_while_shielded: bool,
    pending: Option<Probe>,
}

impl OpponentProfile {
    /// Creates a profile that assumes nothing about the opponent.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the opponent raised a shield after being fired at.
    #[must_use]
    pub const fn reactive_to_fire(&self) -> bool {
        self.reactive_to_fire
    }

    /// Whether the opponent attacks the agent even while it is shielded.
    #[must_use]
    pub const fn aggressive_while_shielded(&self) -> bool {
        self.aggressive_while_shielded
    }

    /// Resolves last turn's probe against the fresh snapshot.
    pub fn resolve(&mut self, snapshot: &Snapshot) {
        let Some(probe) = self.pending.take() else {
            return;
        };
        let opponent = &snapshot.opponent;
        match probe {
            Probe::Fire { shields } => {
                self.reactive_to_fire = opponent.shields < shields || opponent.shield_active;
                tracing::debug!(reactive = self.reactive_to_fire, "fire probe resolved");
            }
            Probe::Shield { lasers } => {
                let muzzle = snapshot.size.step(opponent.cell, opponent.orientation);
                let fired = snapshot
                    .bullets
                    .iter()
                    .any(|bullet| bullet.cell == muzzle && bullet.heading == opponent.orientation);
                self.aggressive_while_shielded = opponent.lasers < lasers || fired;
                tracing::debug!(
                    aggressive = self.aggressive_while_shielded,
                    "shield probe resolved"
                );
            }
        }
    }

    /// Records a probe if `action` tests one of the traits.
    pub fn record(&mut self, action: Action, threat: &ThreatModel<'_>) {
        let snapshot = threat.snapshot();
        let agent = &snapshot.agent;
        let opponent = &snapshot.opponent;

        let on_firing_axis = threat
            .mask()
            .lane(agent.cell, agent.orientation, threat.fire_range())
            .any(|(_, cell)| cell == opponent.cell);
        if action == Action::Fire && on_firing_axis {
            self.pending = Some(Probe::Fire {
                shields: opponent.shields,
            });
            return;
        }

        let holds_shield = agent.shield_active || action == Action::Shield;
        if holds_shield && !threat.is_safe_from_directed_source(agent.cell, opponent.cell) {
            self.pending = Some(Probe::Shield {
                lasers: opponent.lasers,
            });
        }
    }
}
