use std::f32::consts::PI;

use rand::rngs::mock::StepRng;
use sheep_arena::game::rules::EndReason;
use sheep_arena::game::{
    GameError, GameEvent, MatchRules, ObstacleField, Team, TickInput, Tuning, Winner, World,
};
use sheep_arena::util::time::tick_delta;
use sheep_arena::util::vector::{distance, shortest_angle_diff};

/// Every `gen::<f32>()` yields 0.5, so all jitter terms vanish.
fn flat_rng() -> Box<StepRng> {
    Box::new(StepRng::new(0x8000_0000_8000_0000, 0))
}

fn ffa_world(sheep: usize) -> World {
    World::with_rng(
        Tuning::free_for_all(),
        MatchRules::FreeForAll { sheep },
        None,
        flat_rng(),
    )
    .expect("valid world")
}

fn place(world: &mut World, id: u32, x: f32, y: f32, angle: f32) {
    let sheep = world.get_mut(id).expect("sheep exists");
    sheep.x = x;
    sheep.y = y;
    sheep.angle = angle;
    sheep.vx = 0.0;
    sheep.vy = 0.0;
}

#[test]
fn kinematic_bounds_hold_every_tick() {
    let mut world = World::new(Tuning::free_for_all(), MatchRules::free_for_all(), None, 7)
        .expect("valid world");
    let dt = tick_delta();
    let max_turn = world.tuning().max_angular_speed * dt;
    let input = TickInput {
        up: true,
        left: true,
        ..TickInput::default()
    };

    for _ in 0..1200 {
        if world.is_game_over() {
            break;
        }
        let before: Vec<(u32, f32)> = world.sheep().iter().map(|s| (s.id, s.angle)).collect();
        world.update(dt, &input);

        for (sheep, (id, old_angle)) in world.sheep().iter().zip(before) {
            assert_eq!(sheep.id, id);
            assert!(
                sheep.angle > -PI && sheep.angle <= PI,
                "heading {} out of range",
                sheep.angle
            );
            if !sheep.is_alive() {
                continue;
            }
            assert!(
                sheep.speed() <= sheep.max_speed() + 1e-3,
                "sheep {} at {} over cap {}",
                sheep.id,
                sheep.speed(),
                sheep.max_speed()
            );
            let turned = shortest_angle_diff(sheep.angle, old_angle).abs();
            assert!(turned <= max_turn + 1e-4, "sheep {id} turned {turned}");
        }
    }
}

#[test]
fn static_overlap_is_separated_in_one_pass() {
    let mut world = ffa_world(2);
    place(&mut world, 1, 480.0, 300.0, PI / 2.0);
    place(&mut world, 2, 520.0, 300.0, PI / 2.0);

    let events = world.resolve_collisions();
    assert!(events.is_empty());

    let (a, b) = (world.get(1).unwrap(), world.get(2).unwrap());
    let gap = distance(a.x, a.y, b.x, b.y);
    assert!(gap >= world.tuning().min_separation() - 1e-3, "gap {gap}");
    // Pushed apart evenly around the old midpoint
    assert!(((a.x + b.x) * 0.5 - 500.0).abs() < 1e-3);
}

#[test]
fn head_on_clash_kills_nobody() {
    let mut world = ffa_world(2);
    place(&mut world, 1, 460.0, 300.0, 0.0);
    place(&mut world, 2, 540.0, 300.0, PI);

    let events = world.resolve_collisions();

    assert!(world.sheep().iter().all(|s| s.is_alive()));
    assert!(matches!(
        events.as_slice(),
        [GameEvent::Clash { a: 1, b: 2, .. }]
    ));

    let (a, b) = (world.get(1).unwrap(), world.get(2).unwrap());
    assert!(a.vx < 0.0 && b.vx > 0.0, "clash must push the pair apart");
    assert_eq!(a.stats.clashes, 1);
    assert_eq!(b.stats.clashes, 1);
    assert_eq!(world.evaluate_match_end(), None);
}

#[test]
fn clash_wins_over_a_horn_already_in_the_body() {
    let mut world = ffa_world(2);
    // Horn tips 2 apart; each tip also sits 35 from the other center
    place(&mut world, 1, 464.0, 300.0, 0.0);
    place(&mut world, 2, 536.0, 300.0, PI);

    let events = world.resolve_collisions();

    assert!(matches!(
        events.as_slice(),
        [GameEvent::Clash { a: 1, b: 2, .. }]
    ));
    assert!(!events.iter().any(|e| matches!(e, GameEvent::Kill { .. })));
    assert_eq!(world.alive_count(), 2);
    for sheep in world.sheep() {
        assert_eq!(sheep.stats.clashes, 1);
        assert_eq!(sheep.stats.kills, 0);
        assert_eq!(sheep.stats.grazes, 0);
    }
}

#[test]
fn two_attackers_on_one_victim_kill_once() {
    let mut world = ffa_world(3);
    // Victim faces down between two attackers whose horns sit in its body
    place(&mut world, 1, 429.0, 300.0, 0.0);
    place(&mut world, 2, 500.0, 300.0, PI / 2.0);
    place(&mut world, 3, 571.0, 300.0, PI);

    let events = world.resolve_collisions();

    let kills: Vec<&GameEvent> = events
        .iter()
        .filter(|e| matches!(e, GameEvent::Kill { .. }))
        .collect();
    assert_eq!(kills.len(), 1);
    assert!(matches!(kills[0], GameEvent::Kill { victim: 2, .. }));
    assert_eq!(world.alive_count(), 2);

    let victim = world.get(2).unwrap();
    assert!(!victim.is_alive());
    assert_eq!((victim.vx, victim.vy), (0.0, 0.0));

    let total_kills: u32 = world.sheep().iter().map(|s| s.stats.kills).sum();
    assert_eq!(total_kills, 1);
    // First recorded hit wins; with flat jitter the recoil is purely forward
    let attacker = world.get(1).unwrap();
    assert_eq!(attacker.stats.kills, 1);
    assert!((attacker.vx - world.tuning().kill_recoil).abs() < 1e-3);

    let stats = world.match_stats();
    let victim_line = stats.sheep_stats.iter().find(|s| s.id == 2).unwrap();
    assert!(!victim_line.survived);
    assert_eq!(victim_line.placement, 3);
}

#[test]
fn off_axis_horn_only_grazes() {
    let tuning = Tuning {
        kill_cone: 0.1,
        ..Tuning::free_for_all()
    };
    let mut world = World::with_rng(tuning, MatchRules::FreeForAll { sheep: 2 }, None, flat_rng())
        .expect("valid world");
    // Horn lands in the body while the nose points 0.2 rad past the center
    place(&mut world, 1, 430.0, 300.0, 0.2);
    place(&mut world, 2, 500.0, 300.0, PI / 2.0);
    world.get_mut(1).unwrap().vx = 100.0;

    let events = world.resolve_collisions();

    assert!(world.sheep().iter().all(|s| s.is_alive()));
    assert!(matches!(
        events.as_slice(),
        [GameEvent::Graze {
            attacker: 1,
            victim: 2
        }]
    ));
    let attacker = world.get(1).unwrap();
    assert!((attacker.vx + 40.0).abs() < 1e-3, "graze reverses the attacker");
    assert_eq!(attacker.stats.grazes, 1);
}

#[test]
fn crossed_horns_are_adjudicated_both_ways() {
    let tuning = Tuning {
        separation_slack: 71.0,
        kill_cone: PI / 4.0,
        ..Tuning::free_for_all()
    };
    let mut world = World::with_rng(tuning, MatchRules::FreeForAll { sheep: 2 }, None, flat_rng())
        .expect("valid world");
    // Each horn sits in the other's body with the tips far apart. Sheep 1
    // faces 56° off its victim, sheep 2 only 36°.
    place(&mut world, 1, 500.0, 300.0, 0.0);
    place(&mut world, 2, 520.0, 330.0, -PI + 20f32.to_radians());

    let events = world.resolve_collisions();

    assert!(matches!(
        events.as_slice(),
        [
            GameEvent::Graze {
                attacker: 1,
                victim: 2
            },
            GameEvent::Kill {
                attacker: 2,
                victim: 1,
                ..
            }
        ]
    ));
    assert!(!world.get(1).unwrap().is_alive());
    assert!(world.get(2).unwrap().is_alive());
    assert_eq!(world.get(2).unwrap().stats.kills, 1);
}

#[test]
fn free_for_all_ends_with_a_single_survivor() {
    let mut world = World::with_rng(
        Tuning::free_for_all(),
        MatchRules::free_for_all(),
        None,
        flat_rng(),
    )
    .expect("valid world");
    assert_eq!(world.sheep().len(), 7);
    let dt = tick_delta();

    for _ in 0..60 * 120 {
        world.update(dt, &TickInput::default());
        if world.is_game_over() {
            break;
        }
    }

    // With all jitter flattened the round plays out the same way every time
    assert!(world.is_game_over(), "no result after {} ticks", world.tick());
    let outcome = world.outcome().expect("ended match has an outcome");
    assert_eq!(outcome.reason, EndReason::LastStanding);
    assert_eq!(world.alive_count(), 1);
    assert_eq!(world.winner(), Some(Winner::Sheep(2)));
    assert!(world.get(2).unwrap().is_alive());
}

#[test]
fn last_two_falling_together_is_a_draw() {
    let mut world = ffa_world(3);
    world.eliminate(1);
    world.eliminate(2);
    world.eliminate(3);

    let ended = world.evaluate_match_end();
    assert!(matches!(ended, Some(GameEvent::MatchEnded { .. })));
    assert!(world.is_game_over());
    assert_eq!(world.winner(), None);
}

#[test]
fn eliminating_blue_team_hands_red_the_win() {
    let mut world = World::new(Tuning::team_chase(), MatchRules::team_chase(), None, 11)
        .expect("valid world");
    let blues: Vec<u32> = world
        .sheep()
        .iter()
        .filter(|s| s.team == Some(Team::Blue))
        .map(|s| s.id)
        .collect();
    assert_eq!(blues.len(), 3);

    for id in blues {
        assert!(world.eliminate(id));
    }
    let events = world.update(tick_delta(), &TickInput::default());

    assert!(world.is_game_over());
    assert_eq!(world.winner(), Some(Winner::Team(Team::Red)));
    assert!(events
        .iter()
        .any(|e| matches!(e, GameEvent::MatchEnded { .. })));

    // Ended worlds no longer advance
    let tick = world.tick();
    assert!(world.update(tick_delta(), &TickInput::default()).is_empty());
    assert_eq!(world.tick(), tick);
}

#[test]
fn speed_caps_are_fixed_per_team_at_spawn() {
    let mut world = World::new(Tuning::team_chase(), MatchRules::team_chase(), None, 12)
        .expect("valid world");
    let base = world.tuning().max_speed;
    for sheep in world.sheep() {
        let expected = match sheep.team {
            Some(Team::Blue) => base * 2.0,
            _ => base,
        };
        assert_eq!(sheep.max_speed(), expected, "sheep {}", sheep.id);
    }

    let input = TickInput {
        up: true,
        ..TickInput::default()
    };
    for _ in 0..120 {
        world.update(tick_delta(), &input);
    }
    for sheep in world.sheep().iter().filter(|s| s.is_alive()) {
        assert!(sheep.speed() <= sheep.max_speed() + 1e-3);
    }
    assert_eq!(world.player().unwrap().max_speed(), base);
}

#[test]
fn blue_team_wins_when_the_clock_runs_out() {
    let mut world = World::new(
        Tuning::team_chase(),
        MatchRules::team_chase_for(0.5),
        None,
        3,
    )
    .expect("valid world");

    for _ in 0..40 {
        world.update(tick_delta(), &TickInput::default());
        if world.is_game_over() {
            break;
        }
    }

    let outcome = world.outcome().expect("countdown expired");
    assert_eq!(outcome.winner, Some(Winner::Team(Team::Blue)));
    assert_eq!(outcome.reason, EndReason::TimeUp);
    assert_eq!(world.remaining(), Some(0.0));
}

#[test]
fn terrain_pushes_sheep_back_out() {
    let tuning = Tuning::team_chase();
    let field = ObstacleField::open(tuning.world_width, tuning.world_height)
        .with_rect(450.0, 150.0, 550.0, 450.0);
    let mut world = World::new(tuning, MatchRules::team_chase(), Some(field), 5)
        .expect("valid world");

    // Blue sheep 2 with its rim poking into the block
    place(&mut world, 2, 420.0, 300.0, PI);
    world.get_mut(2).unwrap().vx = 100.0;
    world.resolve_collisions();

    let sheep = world.get(2).unwrap();
    assert!((sheep.x - 418.5).abs() < 1e-3);
    assert!((sheep.vx - 80.0).abs() < 1e-3);
    assert_eq!(sheep.y, 300.0);
}

#[test]
fn same_seed_replays_identically() {
    let run = || {
        let mut world = World::new(Tuning::free_for_all(), MatchRules::free_for_all(), None, 99)
            .expect("valid world");
        for _ in 0..300 {
            world.update(tick_delta(), &TickInput::default());
        }
        world.snapshot()
    };

    let (a, b) = (run(), run());
    assert_eq!(a.sheep, b.sheep);
    assert_eq!(a.tick, b.tick);
}

#[test]
fn restart_builds_a_fresh_world() {
    let mut world = World::new(Tuning::free_for_all(), MatchRules::free_for_all(), None, 1)
        .expect("valid world");
    for _ in 0..30 {
        world.update(tick_delta(), &TickInput::default());
    }
    world.eliminate(3);
    let old_id = world.id();

    let fresh = world.restart();
    assert_ne!(fresh.id(), old_id);
    assert_eq!(fresh.tick(), 0);
    assert_eq!(fresh.alive_count(), 7);
    assert!(fresh.seed().is_some());
    assert!(!fresh.is_game_over());
}

#[test]
fn snapshot_reports_roster_and_clock() {
    let world = World::new(Tuning::team_chase(), MatchRules::team_chase(), None, 2)
        .expect("valid world");
    let snapshot = world.snapshot();

    assert_eq!(snapshot.sheep.len(), 4);
    assert_eq!(snapshot.alive_ids(), vec![1, 2, 3, 4]);
    assert_eq!(snapshot.remaining, Some(20.0));
    assert!(!snapshot.game_over);
    assert_eq!(snapshot.winner, None);

    let json = serde_json::to_string(&snapshot).expect("snapshot serializes");
    assert!(json.contains("\"team\":\"blue\""));
}

#[test]
fn construction_rejects_bad_input() {
    let bad = Tuning {
        max_speed: 0.0,
        ..Tuning::free_for_all()
    };
    assert!(matches!(
        World::new(bad, MatchRules::free_for_all(), None, 0),
        Err(GameError::InvalidTuning(_))
    ));

    assert!(matches!(
        World::new(
            Tuning::free_for_all(),
            MatchRules::FreeForAll { sheep: 0 },
            None,
            0
        ),
        Err(GameError::EmptyRoster)
    ));

    let wrong_size = ObstacleField::open(10.0, 10.0);
    assert!(matches!(
        World::new(
            Tuning::team_chase(),
            MatchRules::team_chase(),
            Some(wrong_size),
            0
        ),
        Err(GameError::InvalidMap(_))
    ));
}
