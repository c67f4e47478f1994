//! A single sheep: kinematic state plus the steering state machine
//!
//! Every behavior turns through [`Sheep::rotate_towards`] at most once per
//! tick, so the heading never moves faster than the configured angular
//! speed. Thrust follows the current heading, except for the feint, which
//! pushes along a heading kicked off to one side.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;
use tracing::trace;

use super::perception::WorldQueries;
use super::physics::PhysicsSystem;
use super::rules::{FleeStrategy, MatchRules, Role, SpawnPoint, Team};
use super::tuning::Tuning;
use super::TickInput;
use crate::util::vector::{
    angle_to_vector, clamp, distance, length, normalize, shortest_angle_diff, vector_to_angle,
    wrap_angle,
};

/// Top-level AI mode, exposed for rendering and debugging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Behavior {
    Wander,
    Flee,
    Hunt,
    /// Hunting with the dash suppressed after a predicted horn conflict
    Avoid,
}

/// Per-sheep combat record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheepStats {
    pub kills: u32,
    pub clashes: u32,
    pub grazes: u32,
    /// Match clock at the moment of death
    pub died_at: Option<f32>,
}

/// Everything a sheep needs for one decision step
pub struct SteerContext<'a> {
    pub dt: f32,
    pub world: &'a dyn WorldQueries,
    pub rng: &'a mut dyn RngCore,
}

#[derive(Debug, Clone)]
pub struct Sheep {
    pub id: u32,
    pub team: Option<Team>,
    pub is_player: bool,

    // Position and movement
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Heading in radians, always within (-π, π]
    pub angle: f32,

    pub stats: SheepStats,

    /// Fixed at spawn
    max_speed: f32,

    alive: bool,
    role: Role,
    bounce_off_walls: bool,

    // AI state
    behavior: Behavior,
    /// Fixed at spawn
    coward: bool,
    fear_timer: f32,
    avoid_timer: f32,
    wander_timer: f32,
    wander_heading: f32,
    target: Option<u32>,
}

impl Sheep {
    pub fn spawn(
        point: &SpawnPoint,
        rules: &MatchRules,
        tuning: &Tuning,
        rng: &mut dyn RngCore,
    ) -> Self {
        let temperamental = !point.is_player && point.role == Role::Temperamental;
        let coward = temperamental && rng.gen::<f32>() < tuning.coward_fraction;
        let fear_timer = if temperamental {
            tuning.spawn_fear
        } else {
            0.0
        };
        let angle = wrap_angle(point.angle);

        Self {
            id: point.id,
            team: point.team,
            is_player: point.is_player,
            x: point.x,
            y: point.y,
            vx: 0.0,
            vy: 0.0,
            angle,
            max_speed: point.max_speed,
            stats: SheepStats::default(),
            alive: true,
            role: point.role,
            bounce_off_walls: rules.bounces_off_walls(),
            behavior: if fear_timer > 0.0 {
                Behavior::Flee
            } else {
                Behavior::Wander
            },
            coward,
            fear_timer,
            avoid_timer: 0.0,
            wander_timer: rng.gen::<f32>() * 3.0,
            wander_heading: angle,
            target: None,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Permanent. A dead sheep never moves, collides or gets targeted again.
    pub fn die(&mut self) {
        self.alive = false;
    }

    pub fn halt(&mut self) {
        self.vx = 0.0;
        self.vy = 0.0;
    }

    pub fn speed(&self) -> f32 {
        length(self.vx, self.vy)
    }

    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    pub fn behavior(&self) -> Behavior {
        self.behavior
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_coward(&self) -> bool {
        self.coward
    }

    pub fn target(&self) -> Option<u32> {
        self.target
    }

    pub fn horn_point(&self, offset: f32) -> (f32, f32) {
        (
            self.x + self.angle.cos() * offset,
            self.y + self.angle.sin() * offset,
        )
    }

    /// Horn point after drifting `t` seconds at the current velocity.
    pub fn future_horn_point(&self, t: f32, offset: f32) -> (f32, f32) {
        let (hx, hy) = self.horn_point(offset);
        (hx + self.vx * t, hy + self.vy * t)
    }

    /// One decision-and-integration step. No-op once dead.
    pub fn update(&mut self, input: &TickInput, ctx: &mut SteerContext<'_>) {
        if !self.alive {
            return;
        }

        if self.is_player {
            self.player_control(input, ctx);
        } else {
            self.ai_control(ctx);
        }

        let tuning = ctx.world.tuning();
        let (x, y, vx, vy) = PhysicsSystem::integrate(
            self.x,
            self.y,
            self.vx,
            self.vy,
            tuning.drag,
            self.max_speed,
            ctx.dt,
        );
        self.x = x;
        self.y = y;
        self.vx = vx;
        self.vy = vy;
        self.angle = wrap_angle(self.angle);

        if self.bounce_off_walls {
            let (x, y, vx, vy) = PhysicsSystem::bounce_off_walls(
                self.x,
                self.y,
                self.vx,
                self.vy,
                tuning.sheep_radius,
                tuning.world_width,
                tuning.world_height,
                tuning.wall_restitution,
            );
            self.x = x;
            self.y = y;
            self.vx = vx;
            self.vy = vy;
        }
    }

    /// Turn toward `target_angle` by at most `max_angular_speed * dt`.
    pub fn rotate_towards(&mut self, target_angle: f32, max_angular_speed: f32, dt: f32) {
        let diff = shortest_angle_diff(target_angle, self.angle);
        let max_turn = max_angular_speed * dt;
        self.angle = wrap_angle(self.angle + clamp(diff, -max_turn, max_turn));
    }

    fn thrust_along(&mut self, heading: f32, multiplier: f32, tuning: &Tuning, dt: f32) {
        let (fx, fy) = angle_to_vector(heading);
        self.vx += fx * tuning.max_force * multiplier * dt;
        self.vy += fy * tuning.max_force * multiplier * dt;
    }

    fn set_behavior(&mut self, behavior: Behavior) {
        if self.behavior != behavior {
            trace!(sheep = self.id, from = ?self.behavior, to = ?behavior, "Behavior change");
            self.behavior = behavior;
        }
    }

    fn player_control(&mut self, input: &TickInput, ctx: &mut SteerContext<'_>) {
        let Some((dx, dy)) = input.direction() else {
            return;
        };
        let tuning = ctx.world.tuning();

        let (ndx, ndy) = normalize(dx, dy);
        self.rotate_towards(vector_to_angle(ndx, ndy), tuning.max_angular_speed, ctx.dt);

        // Heading-locked: thrust follows the nose, not the keys
        let (fx, fy) = angle_to_vector(self.angle);
        let (ax, ay) = if ctx.world.has_terrain() {
            let (wx, wy) = self.whisker_avoidance(self.angle, ctx.world);
            (
                fx + wx * tuning.whisker_force,
                fy + wy * tuning.whisker_force,
            )
        } else {
            (fx, fy)
        };
        self.vx += ax * tuning.max_force * ctx.dt;
        self.vy += ay * tuning.max_force * ctx.dt;
    }

    fn ai_control(&mut self, ctx: &mut SteerContext<'_>) {
        match self.role {
            Role::Hunter => self.hunt(ctx),
            Role::Prey => self.flee(ctx),
            Role::Temperamental => {
                let tuning = ctx.world.tuning();
                if self.fear_timer > 0.0 {
                    self.fear_timer -= ctx.dt;
                }

                if self.fear_timer <= 0.0
                    && self.coward
                    && ctx.rng.gen::<f32>() < tuning.relapse_rate * ctx.dt
                {
                    self.fear_timer = tuning.relapse_min + ctx.rng.gen::<f32>() * tuning.relapse_span;
                    trace!(sheep = self.id, seconds = self.fear_timer, "Coward panics");
                }

                if self.fear_timer > 0.0 {
                    self.flee(ctx);
                } else {
                    self.hunt(ctx);
                }
            }
        }
    }

    fn flee(&mut self, ctx: &mut SteerContext<'_>) {
        let world = ctx.world;
        let tuning = world.tuning();

        let desired = match world.flee_strategy() {
            FleeStrategy::NearestThreat => {
                let Some(threat) = world.nearest_threat(self) else {
                    return self.wander(ctx);
                };
                self.away_from(threat.x, threat.y, tuning)
            }
            FleeStrategy::EscapeScan => {
                let threats = world.threats(self);
                if threats.is_empty() {
                    return self.wander(ctx);
                }
                Some(self.best_escape_heading(&threats, world))
            }
        };

        self.set_behavior(Behavior::Flee);
        self.target = None;
        if let Some(angle) = desired {
            self.rotate_towards(angle, tuning.max_angular_speed, ctx.dt);
        }
        self.thrust_along(self.angle, tuning.flee_thrust, tuning, ctx.dt);
    }

    /// Heading straight away from a point, pushed off nearby walls.
    fn away_from(&self, tx: f32, ty: f32, tuning: &Tuning) -> Option<f32> {
        let mut dx = self.x - tx;
        let mut dy = self.y - ty;

        let margin = tuning.wall_margin;
        if self.x < margin {
            dx += tuning.wall_nudge;
        } else if self.x > tuning.world_width - margin {
            dx -= tuning.wall_nudge;
        }
        if self.y < margin {
            dy += tuning.wall_nudge;
        } else if self.y > tuning.world_height - margin {
            dy -= tuning.wall_nudge;
        }

        if dx.abs() > 1e-6 || dy.abs() > 1e-6 {
            Some(vector_to_angle(dx, dy))
        } else {
            None
        }
    }

    /// Pick the ring direction pointing furthest from the threats, closer
    /// threats weighing more, never into terrain.
    fn best_escape_heading(&self, threats: &[&Sheep], world: &dyn WorldQueries) -> f32 {
        let tuning = world.tuning();
        let mut best_score = f32::NEG_INFINITY;
        let mut best_angle = self.angle;

        for i in 0..tuning.escape_directions {
            let angle = wrap_angle(i as f32 * TAU / tuning.escape_directions as f32);
            let mut score = 0.0;

            for threat in threats {
                let toward = vector_to_angle(threat.x - self.x, threat.y - self.y);
                let spread = shortest_angle_diff(angle, toward).abs() / std::f32::consts::PI;
                let d = distance(self.x, self.y, threat.x, threat.y);
                score += spread / (d / tuning.threat_distance_scale + 1.0);
            }

            let (px, py) = angle_to_vector(angle);
            if world.is_obstacle(
                self.x + px * tuning.escape_reach,
                self.y + py * tuning.escape_reach,
            ) {
                score -= tuning.escape_obstacle_penalty;
            }

            if score > best_score {
                best_score = score;
                best_angle = angle;
            }
        }

        best_angle
    }

    fn hunt(&mut self, ctx: &mut SteerContext<'_>) {
        let world = ctx.world;
        let tuning = world.tuning();
        let dt = ctx.dt;

        if self.avoid_timer > 0.0 {
            self.avoid_timer -= dt;
        }

        let candidates = world.targets(self);
        let Some(target) = self.pick_target(&candidates, tuning.facing_penalty) else {
            self.target = None;
            return self.wander(ctx);
        };
        self.target = Some(target.id);

        let approach = self.approach_point(target, world);
        let steer_x = approach.0 - self.x;
        let steer_y = approach.1 - self.y;
        let mut desired = if length(steer_x, steer_y) > 1e-6 {
            vector_to_angle(steer_x, steer_y)
        } else {
            self.angle
        };

        if world.has_terrain() {
            let (ax, ay) = self.whisker_avoidance(desired, world);
            if length(ax, ay) > 0.1 {
                desired = vector_to_angle(
                    steer_x + ax * tuning.hunter_whisker_weight,
                    steer_y + ay * tuning.hunter_whisker_weight,
                );
            }
        }

        if let Some((ax, ay)) = world.predict_horn_conflict(self) {
            self.set_behavior(Behavior::Avoid);
            self.rotate_towards(vector_to_angle(ax, ay), tuning.max_angular_speed, dt);
            self.thrust_along(self.angle, tuning.avoid_thrust, tuning, dt);
            self.avoid_timer = tuning.avoid_cooldown;
            return;
        }

        self.rotate_towards(desired, tuning.max_angular_speed, dt);

        let head_on = self.approaching_head_on(target, tuning.head_on_cone);
        let close = distance(self.x, self.y, target.x, target.y) < tuning.close_range;

        if self.avoid_timer > 0.0 {
            self.set_behavior(Behavior::Avoid);
            self.thrust_along(self.angle, tuning.cruise_thrust, tuning, dt);
        } else if close && head_on {
            // Break the symmetry of a mutual charge with a sideways lunge
            self.set_behavior(Behavior::Hunt);
            let side = if ctx.rng.gen::<f32>() < 0.5 { 1.0 } else { -1.0 };
            let feint = wrap_angle(self.angle + side * tuning.feint_kick);
            self.thrust_along(feint, tuning.feint_thrust, tuning, dt);
        } else if close {
            self.set_behavior(Behavior::Hunt);
            self.thrust_along(self.angle, tuning.dash_thrust, tuning, dt);
        } else {
            self.set_behavior(Behavior::Hunt);
            self.thrust_along(self.angle, tuning.cruise_thrust, tuning, dt);
        }
    }

    /// Closest candidate, heavily penalizing ones already facing us.
    fn pick_target<'s>(&self, candidates: &[&'s Sheep], facing_penalty: f32) -> Option<&'s Sheep> {
        candidates
            .iter()
            .map(|s| {
                let d = distance(self.x, self.y, s.x, s.y);
                let toward_me = vector_to_angle(self.x - s.x, self.y - s.y);
                let facing = shortest_angle_diff(toward_me, s.angle).abs().cos();
                let penalty = if facing > 0.5 { facing_penalty } else { 0.0 };
                (*s, d + penalty)
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(s, _)| s)
    }

    /// Flank or rear point around the target's predicted position that
    /// stays out of every strike zone, or the nearest one if none does.
    fn approach_point(&mut self, target: &Sheep, world: &dyn WorldQueries) -> (f32, f32) {
        let tuning = world.tuning();
        let future_x = target.x + target.vx * tuning.hunt_lead_time;
        let future_y = target.y + target.vy * tuning.hunt_lead_time;

        let (fx, fy) = angle_to_vector(target.angle);
        let side = tuning.flank_side_offset;
        let rear = tuning.flank_rear_offset;
        let candidates = [
            (future_x - fy * side, future_y + fx * side),
            (future_x + fy * side, future_y - fx * side),
            (future_x - fx * rear, future_y - fy * rear),
        ];

        let (sx, sy) = (self.x, self.y);
        let by_distance = move |a: &(f32, f32), b: &(f32, f32)| {
            distance(sx, sy, a.0, a.1).total_cmp(&distance(sx, sy, b.0, b.1))
        };

        let safe = candidates
            .iter()
            .copied()
            .filter(|&(cx, cy)| !world.danger_at_point(cx, cy, self))
            .min_by(by_distance);
        if let Some(point) = safe {
            return point;
        }

        self.avoid_timer = tuning.blocked_cooldown;
        candidates
            .iter()
            .copied()
            .min_by(by_distance)
            .unwrap_or((future_x, future_y))
    }

    /// Both sheep are looking at each other within `cone`.
    pub fn approaching_head_on(&self, other: &Sheep, cone: f32) -> bool {
        let to_other = vector_to_angle(other.x - self.x, other.y - self.y);
        let mine = shortest_angle_diff(to_other, self.angle).abs();
        let to_me = vector_to_angle(self.x - other.x, self.y - other.y);
        let theirs = shortest_angle_diff(to_me, other.angle).abs();
        mine < cone && theirs < cone
    }

    fn wander(&mut self, ctx: &mut SteerContext<'_>) {
        let world = ctx.world;
        let tuning = world.tuning();
        self.set_behavior(Behavior::Wander);

        self.wander_timer -= ctx.dt;
        let (px, py) = angle_to_vector(self.wander_heading);
        let blocked = world.has_terrain()
            && world.is_obstacle(
                self.x + px * tuning.wander_lookahead,
                self.y + py * tuning.wander_lookahead,
            );

        if self.wander_timer <= 0.0 || blocked {
            self.wander_timer =
                tuning.wander_interval_min + ctx.rng.gen::<f32>() * tuning.wander_interval_span;
            self.wander_heading = wrap_angle(ctx.rng.gen::<f32>() * TAU);
        }

        self.rotate_towards(self.wander_heading, tuning.max_angular_speed, ctx.dt);
        self.thrust_along(self.angle, tuning.wander_thrust, tuning, ctx.dt);
    }

    /// Unit push away from terrain sampled by three forward whiskers.
    fn whisker_avoidance(&self, heading: f32, world: &dyn WorldQueries) -> (f32, f32) {
        let tuning = world.tuning();
        let mut force = (0.0, 0.0);
        for a in [
            heading,
            heading - tuning.whisker_angle,
            heading + tuning.whisker_angle,
        ] {
            let (dx, dy) = angle_to_vector(a);
            if world.is_obstacle(
                self.x + dx * tuning.whisker_reach,
                self.y + dy * tuning.whisker_reach,
            ) {
                force.0 -= dx;
                force.1 -= dy;
            }
        }
        normalize(force.0, force.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::perception::Perception;
    use rand::rngs::mock::StepRng;
    use std::f32::consts::PI;

    fn half_rng() -> StepRng {
        StepRng::new(0x8000_0000_8000_0000, 0)
    }

    fn sheep_at(id: u32, x: f32, y: f32, angle: f32, is_player: bool) -> Sheep {
        let rules = MatchRules::free_for_all();
        let tuning = Tuning::free_for_all();
        let point = SpawnPoint {
            id,
            team: None,
            is_player,
            role: Role::Temperamental,
            x,
            y,
            angle,
            max_speed: tuning.max_speed,
        };
        let mut sheep = Sheep::spawn(&point, &rules, &tuning, &mut half_rng());
        sheep.fear_timer = 0.0;
        sheep
    }

    #[test]
    fn rotate_towards_is_rate_limited() {
        let mut sheep = sheep_at(1, 100.0, 100.0, 0.0, true);
        sheep.rotate_towards(PI / 2.0, 8.0, 1.0 / 60.0);
        assert!((sheep.angle - 8.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn rotate_towards_takes_short_way_across_seam() {
        let mut sheep = sheep_at(1, 100.0, 100.0, PI - 0.05, true);
        sheep.rotate_towards(-PI + 0.05, 8.0, 1.0 / 60.0);
        // Crossed the seam instead of sweeping back through zero
        assert!(sheep.angle < -PI + 0.1 || sheep.angle > PI - 0.01);
        assert!(sheep.angle > -PI && sheep.angle <= PI);
    }

    #[test]
    fn player_thrust_is_heading_locked() {
        let rules = MatchRules::free_for_all();
        let tuning = Tuning::free_for_all();
        let roster = vec![sheep_at(1, 500.0, 300.0, 0.0, true)];
        let view = Perception::new(&roster, &rules, &tuning, None);
        let mut rng = half_rng();
        let mut ctx = SteerContext {
            dt: 1.0 / 60.0,
            world: &view,
            rng: &mut rng,
        };

        let mut player = roster[0].clone();
        let input = TickInput {
            down: true,
            ..TickInput::default()
        };
        player.update(&input, &mut ctx);

        // Asked to go straight down, but the nose only turned a little
        assert!(player.angle > 0.0 && player.angle < 0.2);
        assert!(player.vx > player.vy);
    }

    #[test]
    fn idle_player_only_drifts() {
        let rules = MatchRules::free_for_all();
        let tuning = Tuning::free_for_all();
        let roster = vec![sheep_at(1, 500.0, 300.0, 0.0, true)];
        let view = Perception::new(&roster, &rules, &tuning, None);
        let mut rng = half_rng();
        let mut ctx = SteerContext {
            dt: 1.0 / 60.0,
            world: &view,
            rng: &mut rng,
        };

        let mut player = roster[0].clone();
        player.vx = 100.0;
        player.update(&TickInput::default(), &mut ctx);
        assert!((player.vx - 95.0).abs() < 1e-4);
        assert_eq!(player.angle, 0.0);
    }

    #[test]
    fn lone_ai_falls_back_to_wander() {
        let rules = MatchRules::free_for_all();
        let tuning = Tuning::free_for_all();
        let roster = vec![sheep_at(2, 500.0, 300.0, 0.0, false)];
        let view = Perception::new(&roster, &rules, &tuning, None);
        let mut rng = half_rng();
        let mut ctx = SteerContext {
            dt: 1.0 / 60.0,
            world: &view,
            rng: &mut rng,
        };

        let mut sheep = roster[0].clone();
        sheep.update(&TickInput::default(), &mut ctx);
        assert_eq!(sheep.behavior(), Behavior::Wander);
        assert_eq!(sheep.target(), None);
    }

    #[test]
    fn hunter_prefers_target_not_facing_it() {
        let rules = MatchRules::free_for_all();
        let tuning = Tuning::free_for_all();
        // Sheep 2 is closer but staring at the hunter; sheep 3 looks away
        let roster = vec![
            sheep_at(1, 300.0, 300.0, 0.0, false),
            sheep_at(2, 450.0, 300.0, PI, false),
            sheep_at(3, 300.0, 550.0, PI / 2.0, false),
        ];
        let view = Perception::new(&roster, &rules, &tuning, None);
        let mut rng = half_rng();
        let mut ctx = SteerContext {
            dt: 1.0 / 60.0,
            world: &view,
            rng: &mut rng,
        };

        let mut hunter = roster[0].clone();
        hunter.update(&TickInput::default(), &mut ctx);
        assert_eq!(hunter.target(), Some(3));
    }

    #[test]
    fn head_on_requires_both_facing() {
        let a = sheep_at(1, 0.0, 0.0, 0.0, false);
        let b = sheep_at(2, 100.0, 0.0, PI, false);
        let c = sheep_at(3, 100.0, 0.0, PI / 2.0, false);
        assert!(a.approaching_head_on(&b, PI / 6.0));
        assert!(!a.approaching_head_on(&c, PI / 6.0));
    }

    #[test]
    fn feint_pushes_off_the_heading() {
        let rules = MatchRules::free_for_all();
        let tuning = Tuning::free_for_all();
        // Close, mutual charge with nothing predicted to collide yet
        let roster = vec![
            sheep_at(1, 300.0, 300.0, 0.0, false),
            sheep_at(2, 450.0, 300.0, PI, false),
        ];
        let view = Perception::new(&roster, &rules, &tuning, None);
        let mut rng = half_rng();
        let mut ctx = SteerContext {
            dt: 1.0 / 60.0,
            world: &view,
            rng: &mut rng,
        };

        let mut hunter = roster[0].clone();
        hunter.update(&TickInput::default(), &mut ctx);

        assert_eq!(hunter.behavior(), Behavior::Hunt);
        assert!(hunter.angle.abs() <= tuning.max_angular_speed / 60.0 + 1e-6);
        let drift = shortest_angle_diff(vector_to_angle(hunter.vx, hunter.vy), hunter.angle);
        assert!(
            (drift.abs() - tuning.feint_kick).abs() < 1e-3,
            "thrust should leave the heading by the feint kick, got {drift}"
        );
    }

    #[test]
    fn dead_sheep_does_not_move() {
        let rules = MatchRules::free_for_all();
        let tuning = Tuning::free_for_all();
        let roster = vec![sheep_at(1, 500.0, 300.0, 0.0, true)];
        let view = Perception::new(&roster, &rules, &tuning, None);
        let mut rng = half_rng();
        let mut ctx = SteerContext {
            dt: 1.0 / 60.0,
            world: &view,
            rng: &mut rng,
        };

        let mut sheep = roster[0].clone();
        sheep.vx = 50.0;
        sheep.die();
        sheep.update(
            &TickInput {
                right: true,
                ..TickInput::default()
            },
            &mut ctx,
        );
        assert_eq!((sheep.x, sheep.y), (500.0, 300.0));
        assert!(!sheep.is_alive());
    }
}
