//! Horn combat - strike zones, clashes and hit adjudication

use rand::{Rng, RngCore};

use super::agent::Sheep;
use crate::util::vector::{distance_sq, normalize, shortest_angle_diff, vector_to_angle};

/// What the horns of a pair are touching this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HornContact {
    None,
    /// Strike zones overlap; nobody dies
    Clash,
    /// First sheep's horn is in the second's body
    FirstHitsSecond,
    /// Second sheep's horn is in the first's body
    SecondHitsFirst,
    /// Each horn is in the other's body
    Mutual,
}

impl HornContact {
    pub fn first_hits_second(self) -> bool {
        matches!(self, Self::FirstHitsSecond | Self::Mutual)
    }

    pub fn second_hits_first(self) -> bool {
        matches!(self, Self::SecondHitsFirst | Self::Mutual)
    }
}

/// A horn-in-body contact waiting for end-of-pass adjudication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HornHit {
    /// Roster index of the attacker
    pub attacker: usize,
    /// Roster index of the victim
    pub victim: usize,
}

/// How a confirmed horn contact plays out
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitOutcome {
    /// Victim dies; attacker surges forward by this velocity change
    Kill { recoil: (f32, f32) },
    /// Glancing blow; attacker's velocity is replaced
    Graze { velocity: (f32, f32) },
}

/// Geometry parameters of a strike
#[derive(Debug, Clone, Copy)]
pub struct StrikeGeometry {
    pub horn_offset: f32,
    pub horn_radius: f32,
    pub body_radius: f32,
}

/// Combat system for horn contacts
pub struct CombatSystem;

impl CombatSystem {
    /// Classify a pair, clash taking precedence over either hit.
    pub fn classify(a: &Sheep, b: &Sheep, geometry: &StrikeGeometry) -> HornContact {
        let (afx, afy) = a.horn_point(geometry.horn_offset);
        let (bfx, bfy) = b.horn_point(geometry.horn_offset);
        let clash_reach = geometry.horn_radius * 2.0;

        if distance_sq(afx, afy, bfx, bfy) <= clash_reach * clash_reach {
            return HornContact::Clash;
        }
        match (
            Self::horn_in_body(a, b, geometry),
            Self::horn_in_body(b, a, geometry),
        ) {
            (true, true) => HornContact::Mutual,
            (true, false) => HornContact::FirstHitsSecond,
            (false, true) => HornContact::SecondHitsFirst,
            (false, false) => HornContact::None,
        }
    }

    /// The attacker's horn point lies within the victim's body radius.
    pub fn horn_in_body(attacker: &Sheep, victim: &Sheep, geometry: &StrikeGeometry) -> bool {
        let (hx, hy) = attacker.horn_point(geometry.horn_offset);
        distance_sq(hx, hy, victim.x, victim.y) <= geometry.body_radius * geometry.body_radius
    }

    /// Equal and opposite velocity kicks along the line between two bodies.
    /// Returns (delta for a, delta for b).
    pub fn clash_impulse(a: &Sheep, b: &Sheep, impulse: f32) -> ((f32, f32), (f32, f32)) {
        let (nx, ny) = normalize(b.x - a.x, b.y - a.y);
        ((-nx * impulse, -ny * impulse), (nx * impulse, ny * impulse))
    }

    /// The attacker's heading points at the victim within `cone`.
    pub fn in_kill_cone(attacker: &Sheep, victim: &Sheep, cone: f32) -> bool {
        let toward = vector_to_angle(victim.x - attacker.x, victim.y - attacker.y);
        shortest_angle_diff(toward, attacker.angle).abs() < cone
    }

    /// Adjudicate a horn hit.
    pub fn resolve_hit(
        attacker: &Sheep,
        victim: &Sheep,
        kill_cone: f32,
        params: &HitParams,
        rng: &mut dyn RngCore,
    ) -> HitOutcome {
        if Self::in_kill_cone(attacker, victim, kill_cone) {
            let (fx, fy) = (attacker.angle.cos(), attacker.angle.sin());
            let jx = (rng.gen::<f32>() - 0.5) * params.kill_jitter;
            let jy = (rng.gen::<f32>() - 0.5) * params.kill_jitter;
            HitOutcome::Kill {
                recoil: (fx * params.kill_recoil + jx, fy * params.kill_recoil + jy),
            }
        } else {
            let jx = (rng.gen::<f32>() - 0.5) * params.graze_jitter;
            let jy = (rng.gen::<f32>() - 0.5) * params.graze_jitter;
            HitOutcome::Graze {
                velocity: (
                    -attacker.vx * params.graze_reversal + jx,
                    -attacker.vy * params.graze_reversal + jy,
                ),
            }
        }
    }
}

/// Recoil and graze magnitudes
#[derive(Debug, Clone, Copy)]
pub struct HitParams {
    pub kill_recoil: f32,
    pub kill_jitter: f32,
    pub graze_reversal: f32,
    pub graze_jitter: f32,
}
