use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use torus_duel_core::{
    Action, AgentSnapshot, BulletSnapshot, CellCoord, GridSize, Orientation, Snapshot, TurretId,
    TurretSnapshot, TurretView,
};
use torus_duel_system_safety::{MoveSafety, SafetyContext, SafetyRule, Verdict};
use torus_duel_system_threat::ThreatModel;
use torus_duel_world::WallMask;

#[test]
fn unavoidable_projectile_keeps_the_forward_move() {
    let agent = agent_at(CellCoord::new(3, 3), Orientation::Right);
    let snapshot = Snapshot {
        size: GridSize::new(8, 8),
        walls: vec![CellCoord::new(3, 2), CellCoord::new(3, 4)],
        turrets: TurretView::default(),
        bullets: vec![BulletSnapshot {
            cell: CellCoord::new(5, 3),
            heading: Orientation::Left,
        }],
        power_ups: Vec::new(),
        teleport_cells: Vec::new(),
        agent,
        opponent: agent_at(CellCoord::new(7, 7), Orientation::Up),
        turn: 0,
    };

    let verdict = review(&mut MoveSafety::new(), &snapshot, Action::MoveForward);

    assert_eq!(
        verdict,
        Verdict {
            action: Action::MoveForward,
            rule: Some(SafetyRule::Crossfire),
        }
    );
}

#[test]
fn never_steps_into_an_active_fire_lane() {
    let mut rng = ChaCha8Rng::seed_from_u64(0xfa11_5afe);
    let actions = [
        Action::MoveForward,
        Action::Hold,
        Action::Fire,
        Action::Face(Orientation::Up),
        Action::Face(Orientation::Left),
    ];

    for round in 0..200 {
        let snapshot = random_snapshot(&mut rng);
        let mask = WallMask::from_snapshot(&snapshot);
        let threat = ThreatModel::new(&snapshot, &mask, 4);
        let action = actions[rng.gen_range(0..actions.len())];

        let verdict = review(&mut MoveSafety::new(), &snapshot, action);
        let again = review(&mut MoveSafety::new(), &snapshot, action);
        assert_eq!(verdict, again, "round {round}: review is not deterministic");

        if verdict.action == Action::MoveForward {
            let agent = &snapshot.agent;
            let ahead = snapshot.size.step(agent.cell, agent.orientation);
            assert!(
                !threat.is_cell_threatened_by_fire_lane(ahead),
                "round {round}: {action} became a forward move into a fire lane at {ahead}"
            );
        }
        if verdict.action == Action::Shield {
            assert!(snapshot.agent.can_shield(), "round {round}: shield without a charge");
        }
    }
}

fn review(safety: &mut MoveSafety, snapshot: &Snapshot, action: Action) -> Verdict {
    let mask = WallMask::from_snapshot(snapshot);
    let context = SafetyContext {
        threat: ThreatModel::new(snapshot, &mask, 4),
        projectile_horizon: 3,
        faceoff_fire_limit: 2,
        opponent_reactive_to_fire: false,
    };
    safety.review(action, &context)
}

fn agent_at(cell: CellCoord, orientation: Orientation) -> AgentSnapshot {
    AgentSnapshot {
        cell,
        orientation,
        hit_points: 3,
        shields: 0,
        teleports: 0,
        lasers: 0,
        shield_active: false,
    }
}

fn random_snapshot(rng: &mut ChaCha8Rng) -> Snapshot {
    let size = GridSize::new(rng.gen_range(6..11), rng.gen_range(6..11));
    let cells: Vec<_> = (0..size.cell_count())
        .filter_map(|index| size.cell_at(index))
        .collect();

    let mut free = Vec::new();
    let mut walls = Vec::new();
    for cell in cells {
        if rng.gen_bool(0.15) {
            walls.push(cell);
        } else {
            free.push(cell);
        }
    }

    let mut take = |rng: &mut ChaCha8Rng| free.swap_remove(rng.gen_range(0..free.len()));
    let agent_cell = take(rng);
    let opponent_cell = take(rng);
    let turrets = (0..rng.gen_range(1..4))
        .map(|id| TurretSnapshot {
            id: TurretId::new(id),
            cell: take(rng),
            fire_time: 2,
            cooldown_time: 2,
            firing_next_turn: rng.gen_bool(0.7),
            dead: false,
        })
        .collect();
    let bullets = (0..rng.gen_range(0..3))
        .map(|_| BulletSnapshot {
            cell: take(rng),
            heading: Orientation::ALL[rng.gen_range(0..4)],
        })
        .collect();

    let mut agent = agent_at(agent_cell, Orientation::ALL[rng.gen_range(0..4)]);
    agent.shields = rng.gen_range(0..2);
    Snapshot {
        size,
        walls,
        turrets: TurretView::from_snapshots(turrets),
        bullets,
        power_ups: Vec::new(),
        teleport_cells: Vec::new(),
        agent,
        opponent: agent_at(opponent_cell, Orientation::ALL[rng.gen_range(0..4)]),
        turn: 0,
    }
}
