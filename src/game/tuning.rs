//! Sheep physics and behavior constants

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use super::error::{GameError, Result};

/// Immutable tunables handed to a [`World`](super::World) at construction.
///
/// Distances are in world units (window pixels), times in
/// seconds, forces in units/s². Use one of the presets and override fields
/// with struct update syntax.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tuning {
    // === ARENA ===
    pub world_width: f32,
    pub world_height: f32,

    // === BODY ===
    /// Body radius, also the radius a horn must reach to land a hit
    pub sheep_radius: f32,
    /// Distance from the body center to the horn (strike) point
    pub horn_offset: f32,
    /// Radius of the strike zone around the horn point
    pub horn_radius: f32,

    // === KINEMATICS ===
    /// Base speed cap; rules may scale it per team
    pub max_speed: f32,
    /// Full-thrust acceleration
    pub max_force: f32,
    /// Multiplicative velocity retention per tick
    pub drag: f32,
    /// Turn rate in radians per second
    pub max_angular_speed: f32,
    /// Fraction of velocity kept (and reversed) when bouncing off a wall
    pub wall_restitution: f32,

    // === BODY CONTACT ===
    /// Bodies may overlap by this much before being separated
    pub separation_slack: f32,
    /// Fraction of closing speed removed by a contact impulse
    pub contact_restitution: f32,

    // === HORN COMBAT ===
    pub clash_impulse: f32,
    /// Half-angle of the cone an attacker must be facing to kill
    pub kill_cone: f32,
    pub kill_recoil: f32,
    pub kill_jitter: f32,
    pub graze_reversal: f32,
    pub graze_jitter: f32,

    // === HUNT ===
    /// How far ahead the target's position is extrapolated
    pub hunt_lead_time: f32,
    /// Score penalty for a target that is already facing the hunter
    pub facing_penalty: f32,
    pub flank_side_offset: f32,
    pub flank_rear_offset: f32,
    /// Approach points within this distance of a foreign horn are unsafe
    pub strike_zone_margin: f32,
    /// Cooldown armed when every approach point is unsafe
    pub blocked_cooldown: f32,
    pub conflict_lookahead: f32,
    pub conflict_radius: f32,
    /// Dash suppression after a predicted horn conflict
    pub avoid_cooldown: f32,
    pub close_range: f32,
    pub head_on_cone: f32,
    pub feint_kick: f32,

    // === THRUST (multiples of max_force) ===
    pub wander_thrust: f32,
    pub flee_thrust: f32,
    pub cruise_thrust: f32,
    pub dash_thrust: f32,
    pub feint_thrust: f32,
    pub avoid_thrust: f32,

    // === TEMPERAMENT ===
    /// Fear window every AI sheep starts the match with
    pub spawn_fear: f32,
    pub coward_fraction: f32,
    /// Per-second chance that an idle coward panics again
    pub relapse_rate: f32,
    pub relapse_min: f32,
    pub relapse_span: f32,
    pub wander_interval_min: f32,
    pub wander_interval_span: f32,
    /// Look-ahead used to abandon a wander heading that runs into terrain
    pub wander_lookahead: f32,

    // === WALLS AND TERRAIN ===
    pub wall_margin: f32,
    pub wall_nudge: f32,
    pub whisker_angle: f32,
    pub whisker_reach: f32,
    /// Weight of the whisker vector in player thrust
    pub whisker_force: f32,
    /// Weight of the whisker vector in a hunter's desired heading
    pub hunter_whisker_weight: f32,
    pub escape_directions: usize,
    pub escape_reach: f32,
    pub escape_obstacle_penalty: f32,
    /// Distance scale for weighting threats during the escape scan
    pub threat_distance_scale: f32,
    pub obstacle_samples: usize,
    pub obstacle_push: f32,
    pub obstacle_damping: f32,
}

impl Tuning {
    /// Constants of the last-sheep-standing arena.
    pub fn free_for_all() -> Self {
        let radius = 36.0;
        let horn_radius = 15.0;
        Self {
            world_width: 1000.0,
            world_height: 600.0,
            sheep_radius: radius,
            horn_offset: 37.0,
            horn_radius,
            max_speed: 400.0,
            max_force: 700.0,
            drag: 0.95,
            max_angular_speed: 8.0,
            wall_restitution: 0.4,
            separation_slack: 2.0,
            contact_restitution: 0.9,
            clash_impulse: 250.0,
            kill_cone: PI / 2.5,
            kill_recoil: 140.0,
            kill_jitter: 40.0,
            graze_reversal: 0.4,
            graze_jitter: 60.0,
            hunt_lead_time: 0.25,
            facing_penalty: 400.0,
            flank_side_offset: radius * 1.6,
            flank_rear_offset: radius * 1.4,
            strike_zone_margin: horn_radius * 1.2,
            blocked_cooldown: 0.3,
            conflict_lookahead: 0.22,
            conflict_radius: horn_radius * 3.0,
            avoid_cooldown: 0.25,
            close_range: 220.0,
            head_on_cone: PI / 6.0,
            feint_kick: 0.6,
            wander_thrust: 0.25,
            flee_thrust: 1.1,
            cruise_thrust: 0.45,
            dash_thrust: 1.6,
            feint_thrust: 1.0,
            avoid_thrust: 0.8,
            spawn_fear: 0.6,
            coward_fraction: 0.2,
            relapse_rate: 0.1,
            relapse_min: 2.0,
            relapse_span: 2.5,
            wander_interval_min: 1.0,
            wander_interval_span: 3.0,
            wander_lookahead: radius * 2.0,
            wall_margin: radius * 3.0,
            wall_nudge: 1.5,
            whisker_angle: 0.4,
            whisker_reach: radius * 1.3,
            whisker_force: 1.5,
            hunter_whisker_weight: 500.0,
            escape_directions: 16,
            escape_reach: radius * 4.0,
            escape_obstacle_penalty: 1000.0,
            threat_distance_scale: 100.0,
            obstacle_samples: 8,
            obstacle_push: 1.5,
            obstacle_damping: 0.8,
        }
    }

    /// Constants of the red-chases-blue arena with terrain.
    pub fn team_chase() -> Self {
        Self {
            horn_offset: 38.0,
            separation_slack: 0.0,
            kill_recoil: 100.0,
            kill_jitter: 0.0,
            hunt_lead_time: 0.2,
            cruise_thrust: 1.2,
            spawn_fear: 0.0,
            coward_fraction: 0.0,
            wander_interval_min: 1.5,
            wander_interval_span: 2.0,
            ..Self::free_for_all()
        }
    }

    /// Minimum center distance two bodies are separated to.
    pub fn min_separation(&self) -> f32 {
        self.sheep_radius * 2.0 - self.separation_slack
    }

    pub fn validate(&self) -> Result<()> {
        if self.world_width <= 0.0 || self.world_height <= 0.0 {
            return Err(GameError::InvalidTuning("world dimensions must be positive"));
        }
        if self.sheep_radius <= 0.0 || self.horn_radius <= 0.0 || self.horn_offset <= 0.0 {
            return Err(GameError::InvalidTuning(
                "sheep radius, horn offset and horn radius must be positive",
            ));
        }
        if self.separation_slack < 0.0 || self.separation_slack >= self.sheep_radius * 2.0 {
            return Err(GameError::InvalidTuning(
                "separation slack must be non-negative and below the body diameter",
            ));
        }
        if self.max_speed <= 0.0 || self.max_force <= 0.0 || self.max_angular_speed <= 0.0 {
            return Err(GameError::InvalidTuning(
                "max speed, force and angular speed must be positive",
            ));
        }
        if !(self.drag > 0.0 && self.drag <= 1.0) {
            return Err(GameError::InvalidTuning("drag must be in (0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.wall_restitution)
            || !(0.0..=1.0).contains(&self.contact_restitution)
            || !(0.0..=1.0).contains(&self.coward_fraction)
        {
            return Err(GameError::InvalidTuning(
                "restitution coefficients and coward fraction must be in [0, 1]",
            ));
        }
        if self.kill_cone <= 0.0 || self.kill_cone > PI || self.head_on_cone <= 0.0 {
            return Err(GameError::InvalidTuning("cone half-angles must be in (0, π]"));
        }
        if self.wander_interval_min <= 0.0
            || self.wander_interval_span < 0.0
            || self.relapse_min < 0.0
            || self.relapse_span < 0.0
            || self.spawn_fear < 0.0
        {
            return Err(GameError::InvalidTuning(
                "timers must be non-negative and the wander interval positive",
            ));
        }
        if self.escape_directions == 0 || self.obstacle_samples == 0 {
            return Err(GameError::InvalidTuning(
                "escape directions and obstacle samples must be non-zero",
            ));
        }
        if self.threat_distance_scale <= 0.0 {
            return Err(GameError::InvalidTuning("threat distance scale must be positive"));
        }
        Ok(())
    }
}

impl Default for Tuning {
    fn default() -> Self {
        Self::free_for_all()
    }
}
