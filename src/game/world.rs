//! The simulation world: roster ownership, the two-phase tick and the
//! collision/combat resolver

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::agent::{Sheep, SteerContext};
use super::combat::{CombatSystem, HitOutcome, HitParams, HornContact, HornHit, StrikeGeometry};
use super::error::{GameError, Result};
use super::obstacle::ObstacleField;
use super::perception::Perception;
use super::physics::PhysicsSystem;
use super::rules::{MatchOutcome, MatchPhase, MatchRules, Winner};
use super::snapshot::{GameEvent, MatchStats, SheepMatchStats, SheepSnapshot, WorldSnapshot};
use super::tuning::Tuning;
use super::TickInput;

/// Sole owner of the roster for one match.
///
/// Roster order is fixed at spawn and drives every pairwise pass, so ties
/// always break the same way. Dead sheep stay in place.
pub struct World {
    id: Uuid,
    seed: Option<u64>,
    tuning: Tuning,
    rules: MatchRules,
    obstacles: Option<ObstacleField>,
    sheep: Vec<Sheep>,
    rng: Box<dyn RngCore + Send>,
    tick: u64,
    elapsed: f32,
    phase: MatchPhase,
    outcome: Option<MatchOutcome>,
}

impl World {
    /// Seeded world using the default generator.
    pub fn new(
        tuning: Tuning,
        rules: MatchRules,
        obstacles: Option<ObstacleField>,
        seed: u64,
    ) -> Result<Self> {
        let mut world = Self::with_rng(
            tuning,
            rules,
            obstacles,
            Box::new(ChaCha8Rng::seed_from_u64(seed)),
        )?;
        world.seed = Some(seed);
        Ok(world)
    }

    /// World drawing every random decision from `rng`.
    pub fn with_rng(
        tuning: Tuning,
        rules: MatchRules,
        obstacles: Option<ObstacleField>,
        rng: Box<dyn RngCore + Send>,
    ) -> Result<Self> {
        tuning.validate()?;

        if let Some(field) = &obstacles {
            if field.width() != tuning.world_width || field.height() != tuning.world_height {
                return Err(GameError::InvalidMap(format!(
                    "field is {}x{} but the world is {}x{}",
                    field.width(),
                    field.height(),
                    tuning.world_width,
                    tuning.world_height
                )));
            }
        }

        let world = Self::assemble(tuning, rules, obstacles, rng, None);
        if world.sheep.is_empty() {
            return Err(GameError::EmptyRoster);
        }
        Ok(world)
    }

    fn assemble(
        tuning: Tuning,
        rules: MatchRules,
        obstacles: Option<ObstacleField>,
        mut rng: Box<dyn RngCore + Send>,
        seed: Option<u64>,
    ) -> Self {
        let obstacles = if rules.uses_obstacles() {
            Some(obstacles.unwrap_or_else(|| {
                ObstacleField::open(tuning.world_width, tuning.world_height)
            }))
        } else {
            if obstacles.is_some() {
                warn!(rules = rules.name(), "Rules ignore terrain, dropping obstacle field");
            }
            None
        };

        let sheep: Vec<Sheep> = rules
            .spawn_layout(&tuning, rng.as_mut())
            .iter()
            .map(|point| Sheep::spawn(point, &rules, &tuning, rng.as_mut()))
            .collect();

        let id = Uuid::new_v4();
        info!(
            match_id = %id,
            rules = rules.name(),
            sheep = sheep.len(),
            terrain = obstacles.is_some(),
            "World created"
        );

        Self {
            id,
            seed,
            tuning,
            rules,
            obstacles,
            sheep,
            rng,
            tick: 0,
            elapsed: 0.0,
            phase: MatchPhase::InProgress,
            outcome: None,
        }
    }

    /// Throw this world away and build a fresh one with the same tuning,
    /// rules and terrain. The new seed comes from this world's generator.
    pub fn restart(mut self) -> World {
        let seed = self.rng.next_u64();
        info!(match_id = %self.id, seed, "Restarting match");
        Self::assemble(
            self.tuning,
            self.rules,
            self.obstacles,
            Box::new(ChaCha8Rng::seed_from_u64(seed)),
            Some(seed),
        )
    }

    /// Advance the whole simulation by one fixed step.
    ///
    /// Every living sheep decides and moves, in roster order, before the
    /// resolver sees any of them. Does nothing once the match has ended.
    pub fn update(&mut self, dt: f32, input: &TickInput) -> Vec<GameEvent> {
        if self.phase == MatchPhase::Ended {
            return Vec::new();
        }

        self.tick += 1;
        self.elapsed += dt;

        // Move phase
        for i in 0..self.sheep.len() {
            if !self.sheep[i].is_alive() {
                continue;
            }
            let mut sheep = self.sheep[i].clone();
            {
                let view = Perception::new(
                    &self.sheep,
                    &self.rules,
                    &self.tuning,
                    self.obstacles.as_ref(),
                );
                let mut ctx = SteerContext {
                    dt,
                    world: &view,
                    rng: self.rng.as_mut(),
                };
                sheep.update(input, &mut ctx);
            }
            self.sheep[i] = sheep;
        }

        // Resolve phase
        let mut events = self.resolve_collisions();
        events.extend(self.evaluate_match_end());
        events
    }

    /// Apply every cross-sheep effect for the current positions: body
    /// separation, terrain correction, horn clashes, then deferred hits.
    pub fn resolve_collisions(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        let living: Vec<usize> = (0..self.sheep.len())
            .filter(|&i| self.sheep[i].is_alive())
            .collect();

        self.separate_bodies(&living);

        if self.obstacles.is_some() {
            self.correct_terrain(&living);
        }

        let hits = self.horn_pass(&living, &mut events);
        self.resolve_hits(&hits, &mut events);

        for &i in &living {
            let sheep = &mut self.sheep[i];
            let (vx, vy) = PhysicsSystem::clamp_speed(sheep.vx, sheep.vy, sheep.max_speed());
            sheep.vx = vx;
            sheep.vy = vy;
        }

        events
    }

    fn separate_bodies(&mut self, living: &[usize]) {
        let min_dist = self.tuning.min_separation();
        let restitution = self.tuning.contact_restitution;

        for (n, &i) in living.iter().enumerate() {
            for &j in &living[n + 1..] {
                let (a, b) = (&self.sheep[i], &self.sheep[j]);
                if !PhysicsSystem::check_overlap(a.x, a.y, b.x, b.y, min_dist) {
                    continue;
                }
                let Some(contact) = PhysicsSystem::resolve_contact(
                    (a.x, a.y, a.vx, a.vy),
                    (b.x, b.y, b.vx, b.vy),
                    min_dist,
                    restitution,
                ) else {
                    continue;
                };

                let a = &mut self.sheep[i];
                (a.x, a.y) = contact.a_pos;
                (a.vx, a.vy) = contact.a_vel;
                let b = &mut self.sheep[j];
                (b.x, b.y) = contact.b_pos;
                (b.vx, b.vy) = contact.b_vel;
            }
        }
    }

    fn correct_terrain(&mut self, living: &[usize]) {
        let Some(field) = self.obstacles.as_ref() else {
            return;
        };
        let tuning = &self.tuning;

        for &i in living {
            let sheep = &mut self.sheep[i];
            if let Some((x, y, vx, vy)) = PhysicsSystem::correct_against_terrain(
                sheep.x,
                sheep.y,
                sheep.vx,
                sheep.vy,
                tuning.sheep_radius,
                tuning.obstacle_samples,
                tuning.obstacle_push,
                tuning.obstacle_damping,
                |x, y| field.is_obstacle(x, y),
            ) {
                sheep.x = x;
                sheep.y = y;
                sheep.vx = vx;
                sheep.vy = vy;
            }
        }
    }

    /// Clashes are applied immediately; hits are only recorded.
    fn horn_pass(&mut self, living: &[usize], events: &mut Vec<GameEvent>) -> Vec<HornHit> {
        let geometry = StrikeGeometry {
            horn_offset: self.tuning.horn_offset,
            horn_radius: self.tuning.horn_radius,
            body_radius: self.tuning.sheep_radius,
        };
        let mut hits = Vec::new();

        for (n, &i) in living.iter().enumerate() {
            for &j in &living[n + 1..] {
                let (a, b) = (&self.sheep[i], &self.sheep[j]);
                if !self.rules.is_hostile(a, b) {
                    continue;
                }

                match CombatSystem::classify(a, b, &geometry) {
                    HornContact::Clash => {
                        let (da, db) = CombatSystem::clash_impulse(a, b, self.tuning.clash_impulse);
                        let x = (a.x + b.x) * 0.5;
                        let y = (a.y + b.y) * 0.5;
                        let (id_a, id_b) = (a.id, b.id);

                        let a = &mut self.sheep[i];
                        a.vx += da.0;
                        a.vy += da.1;
                        a.stats.clashes += 1;
                        let b = &mut self.sheep[j];
                        b.vx += db.0;
                        b.vy += db.1;
                        b.stats.clashes += 1;

                        debug!(tick = self.tick, a = id_a, b = id_b, "Horn clash");
                        events.push(GameEvent::Clash {
                            a: id_a,
                            b: id_b,
                            x,
                            y,
                        });
                    }
                    contact => {
                        // Both directions are recorded; the rules filter who may strike
                        if contact.first_hits_second() && self.rules.can_strike(a, b) {
                            hits.push(HornHit {
                                attacker: i,
                                victim: j,
                            });
                        }
                        if contact.second_hits_first() && self.rules.can_strike(b, a) {
                            hits.push(HornHit {
                                attacker: j,
                                victim: i,
                            });
                        }
                    }
                }
            }
        }

        hits
    }

    fn resolve_hits(&mut self, hits: &[HornHit], events: &mut Vec<GameEvent>) {
        let params = HitParams {
            kill_recoil: self.tuning.kill_recoil,
            kill_jitter: self.tuning.kill_jitter,
            graze_reversal: self.tuning.graze_reversal,
            graze_jitter: self.tuning.graze_jitter,
        };

        for hit in hits {
            let (attacker, victim) = (&self.sheep[hit.attacker], &self.sheep[hit.victim]);
            // An earlier hit this tick may already have settled either side
            if !attacker.is_alive() || !victim.is_alive() {
                continue;
            }

            let outcome = CombatSystem::resolve_hit(
                attacker,
                victim,
                self.tuning.kill_cone,
                &params,
                self.rng.as_mut(),
            );
            let (attacker_id, victim_id) = (attacker.id, victim.id);
            let (vx, vy) = (victim.x, victim.y);

            match outcome {
                HitOutcome::Kill { recoil } => {
                    let victim = &mut self.sheep[hit.victim];
                    victim.die();
                    victim.stats.died_at = Some(self.elapsed);
                    if self.rules.freezes_corpses() {
                        victim.halt();
                    }

                    let attacker = &mut self.sheep[hit.attacker];
                    attacker.vx += recoil.0;
                    attacker.vy += recoil.1;
                    attacker.stats.kills += 1;

                    debug!(
                        match_id = %self.id,
                        tick = self.tick,
                        attacker = attacker_id,
                        victim = victim_id,
                        "Sheep killed"
                    );
                    events.push(GameEvent::Kill {
                        attacker: attacker_id,
                        victim: victim_id,
                        x: vx,
                        y: vy,
                    });
                }
                HitOutcome::Graze { velocity } => {
                    let attacker = &mut self.sheep[hit.attacker];
                    (attacker.vx, attacker.vy) = velocity;
                    attacker.stats.grazes += 1;

                    debug!(
                        tick = self.tick,
                        attacker = attacker_id,
                        victim = victim_id,
                        "Glancing blow"
                    );
                    events.push(GameEvent::Graze {
                        attacker: attacker_id,
                        victim: victim_id,
                    });
                }
            }
        }
    }

    /// Ask the rules whether the match is over; latches once it is.
    pub fn evaluate_match_end(&mut self) -> Option<GameEvent> {
        if self.phase == MatchPhase::Ended {
            return None;
        }

        let outcome = self.rules.evaluate(&self.sheep, self.elapsed)?;
        self.phase = MatchPhase::Ended;
        self.outcome = Some(outcome);

        info!(
            match_id = %self.id,
            tick = self.tick,
            elapsed = self.elapsed,
            winner = ?outcome.winner,
            reason = ?outcome.reason,
            "Match ended"
        );
        Some(GameEvent::MatchEnded { outcome })
    }

    /// Kill a sheep outright, bypassing combat. Returns false if it was
    /// already dead or unknown.
    pub fn eliminate(&mut self, id: u32) -> bool {
        let elapsed = self.elapsed;
        let freeze = self.rules.freezes_corpses();
        match self.sheep.iter_mut().find(|s| s.id == id && s.is_alive()) {
            Some(sheep) => {
                sheep.die();
                sheep.stats.died_at = Some(elapsed);
                if freeze {
                    sheep.halt();
                }
                true
            }
            None => false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Seed of the default generator, if this world was built from one
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn rules(&self) -> &MatchRules {
        &self.rules
    }

    pub fn obstacles(&self) -> Option<&ObstacleField> {
        self.obstacles.as_ref()
    }

    pub fn sheep(&self) -> &[Sheep] {
        &self.sheep
    }

    pub fn get(&self, id: u32) -> Option<&Sheep> {
        self.sheep.iter().find(|s| s.id == id)
    }

    /// Direct access for scenario setup and tooling. Not used by the tick.
    #[doc(hidden)]
    pub fn get_mut(&mut self, id: u32) -> Option<&mut Sheep> {
        self.sheep.iter_mut().find(|s| s.id == id)
    }

    pub fn player(&self) -> Option<&Sheep> {
        self.sheep.iter().find(|s| s.is_player)
    }

    pub fn alive_count(&self) -> usize {
        self.sheep.iter().filter(|s| s.is_alive()).count()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn remaining(&self) -> Option<f32> {
        self.rules
            .time_limit()
            .map(|limit| (limit - self.elapsed).max(0.0))
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == MatchPhase::Ended
    }

    pub fn outcome(&self) -> Option<MatchOutcome> {
        self.outcome
    }

    pub fn winner(&self) -> Option<Winner> {
        self.outcome.and_then(|o| o.winner)
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            tick: self.tick,
            elapsed: self.elapsed,
            remaining: self.remaining(),
            phase: self.phase,
            game_over: self.is_game_over(),
            winner: self.winner(),
            sheep: self
                .sheep
                .iter()
                .map(|s| SheepSnapshot {
                    id: s.id,
                    team: s.team,
                    is_player: s.is_player,
                    x: s.x,
                    y: s.y,
                    angle: s.angle,
                    alive: s.is_alive(),
                    behavior: s.behavior(),
                })
                .collect(),
            events: Vec::new(),
        }
    }

    pub fn match_stats(&self) -> MatchStats {
        let mut sheep_stats: Vec<SheepMatchStats> = self
            .sheep
            .iter()
            .map(|s| SheepMatchStats {
                id: s.id,
                team: s.team,
                is_player: s.is_player,
                kills: s.stats.kills,
                clashes: s.stats.clashes,
                grazes: s.stats.grazes,
                survived: s.is_alive(),
                alive_time_secs: s.stats.died_at.unwrap_or(self.elapsed),
                placement: 0, // Will be calculated below
            })
            .collect();

        // Survivors first, then longer-lived; stable so roster order breaks ties
        sheep_stats.sort_by(|a, b| {
            b.survived
                .cmp(&a.survived)
                .then(b.alive_time_secs.total_cmp(&a.alive_time_secs))
        });
        for (i, stat) in sheep_stats.iter_mut().enumerate() {
            stat.placement = (i + 1) as u32;
        }

        MatchStats {
            duration_secs: self.elapsed,
            ticks: self.tick,
            total_sheep: self.sheep.len() as u32,
            outcome: self.outcome,
            sheep_stats,
        }
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("id", &self.id)
            .field("rules", &self.rules)
            .field("tick", &self.tick)
            .field("alive", &self.alive_count())
            .field("phase", &self.phase)
            .finish()
    }
}
