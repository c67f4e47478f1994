//! Match-rule strategy: who may hurt whom, where sheep spawn, how a match ends
//!
//! Both arenas share one steering core and one resolver; everything that
//! differs between them is answered here.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

use super::agent::Sheep;
use super::tuning::Tuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Red,
    Blue,
}

/// How an AI sheep decides between fleeing and hunting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Starts scared, then hunts; cowards relapse into fear at random
    Temperamental,
    /// Always hunts
    Hunter,
    /// Always flees
    Prey,
}

/// How a fleeing sheep picks its escape heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FleeStrategy {
    /// Run directly away from the closest threat, nudged off the walls
    NearestThreat,
    /// Score a ring of headings against every threat and the terrain
    EscapeScan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Winner {
    Sheep(u32),
    Team(Team),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// At most one sheep is left standing
    LastStanding,
    /// A whole team was eliminated
    Elimination,
    /// The countdown ran out
    TimeUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// `None` when the last sheep fell together
    pub winner: Option<Winner>,
    pub reason: EndReason,
}

/// Match phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    InProgress,
    Ended,
}

/// Initial pose and allegiance of one sheep
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnPoint {
    pub id: u32,
    pub team: Option<Team>,
    pub is_player: bool,
    pub role: Role,
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub max_speed: f32,
}

/// The two arenas of the game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MatchRules {
    /// Every sheep for itself; last one standing wins
    FreeForAll {
        /// Roster size including the player
        sheep: usize,
    },
    /// Red hunters chase blue prey across terrain before the clock runs out
    TeamChase {
        /// Round length in seconds
        duration: f32,
        /// Red roster size including the player
        hunters: usize,
        prey: usize,
        /// Blue sheep are categorically faster
        prey_speed_multiplier: f32,
    },
}

impl MatchRules {
    pub fn free_for_all() -> Self {
        Self::FreeForAll { sheep: 7 }
    }

    pub fn team_chase() -> Self {
        Self::team_chase_for(20.0)
    }

    /// One red hunter against three faster blue prey for `duration` seconds
    pub fn team_chase_for(duration: f32) -> Self {
        Self::TeamChase {
            duration,
            hunters: 1,
            prey: 3,
            prey_speed_multiplier: 2.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::FreeForAll { .. } => "free_for_all",
            Self::TeamChase { .. } => "team_chase",
        }
    }

    /// Terrain participates in steering and collision
    pub fn uses_obstacles(&self) -> bool {
        matches!(self, Self::TeamChase { .. })
    }

    /// Sheep bounce off the world rectangle themselves
    pub fn bounces_off_walls(&self) -> bool {
        matches!(self, Self::FreeForAll { .. })
    }

    /// Killed sheep stop dead instead of keeping their last velocity
    pub fn freezes_corpses(&self) -> bool {
        matches!(self, Self::FreeForAll { .. })
    }

    pub fn flee_strategy(&self) -> FleeStrategy {
        match self {
            Self::FreeForAll { .. } => FleeStrategy::NearestThreat,
            Self::TeamChase { .. } => FleeStrategy::EscapeScan,
        }
    }

    pub fn time_limit(&self) -> Option<f32> {
        match self {
            Self::FreeForAll { .. } => None,
            Self::TeamChase { duration, .. } => Some(*duration),
        }
    }

    pub fn max_speed(&self, team: Option<Team>, tuning: &Tuning) -> f32 {
        match (self, team) {
            (
                Self::TeamChase {
                    prey_speed_multiplier,
                    ..
                },
                Some(Team::Blue),
            ) => tuning.max_speed * prey_speed_multiplier,
            _ => tuning.max_speed,
        }
    }

    /// `other` counts as a threat to `me` and their horns can meet
    pub fn is_hostile(&self, me: &Sheep, other: &Sheep) -> bool {
        match self {
            Self::FreeForAll { .. } => true,
            Self::TeamChase { .. } => me.team != other.team,
        }
    }

    /// A horn from `attacker` landing on `victim` can be lethal
    pub fn can_strike(&self, attacker: &Sheep, victim: &Sheep) -> bool {
        match self {
            Self::FreeForAll { .. } => true,
            Self::TeamChase { .. } => {
                attacker.team == Some(Team::Red) && victim.team == Some(Team::Blue)
            }
        }
    }

    pub fn spawn_layout(&self, tuning: &Tuning, rng: &mut dyn RngCore) -> Vec<SpawnPoint> {
        let (w, h) = (tuning.world_width, tuning.world_height);
        match *self {
            Self::FreeForAll { sheep } => {
                let cx = w / 2.0;
                let cy = h / 2.0;
                let ring = w.min(h) * 0.25;
                (0..sheep)
                    .map(|i| {
                        let a = TAU * i as f32 / sheep as f32;
                        let rx = ring + rng.gen::<f32>() * 40.0 - 20.0;
                        let ry = ring + rng.gen::<f32>() * 40.0 - 20.0;
                        SpawnPoint {
                            id: i as u32 + 1,
                            team: None,
                            is_player: i == 0,
                            role: Role::Temperamental,
                            x: cx + a.cos() * rx,
                            y: cy + a.sin() * ry,
                            angle: 0.0,
                            max_speed: self.max_speed(None, tuning),
                        }
                    })
                    .collect()
            }
            Self::TeamChase { hunters, prey, .. } => {
                let mut points = Vec::with_capacity(hunters + prey);
                for i in 0..hunters {
                    points.push(SpawnPoint {
                        id: points.len() as u32 + 1,
                        team: Some(Team::Red),
                        is_player: i == 0,
                        role: Role::Hunter,
                        x: 100.0,
                        y: h / 2.0 - 50.0 + 100.0 * i as f32,
                        angle: 0.0,
                        max_speed: self.max_speed(Some(Team::Red), tuning),
                    });
                }
                for i in 0..prey {
                    let offset = (i as f32 - (prey as f32 - 1.0) / 2.0) * 80.0;
                    points.push(SpawnPoint {
                        id: points.len() as u32 + 1,
                        team: Some(Team::Blue),
                        is_player: false,
                        role: Role::Prey,
                        x: w - 100.0,
                        y: h / 2.0 + offset,
                        angle: PI,
                        max_speed: self.max_speed(Some(Team::Blue), tuning),
                    });
                }
                points
            }
        }
    }

    /// Decide whether the match is over after a resolved tick.
    pub fn evaluate(&self, sheep: &[Sheep], elapsed: f32) -> Option<MatchOutcome> {
        match self {
            Self::FreeForAll { .. } => {
                let mut alive = sheep.iter().filter(|s| s.is_alive());
                let first = alive.next();
                if alive.next().is_some() {
                    return None;
                }
                Some(MatchOutcome {
                    winner: first.map(|s| Winner::Sheep(s.id)),
                    reason: EndReason::LastStanding,
                })
            }
            Self::TeamChase { duration, .. } => {
                let living = |team: Team| {
                    sheep
                        .iter()
                        .filter(|s| s.is_alive() && s.team == Some(team))
                        .count()
                };

                if living(Team::Blue) == 0 {
                    Some(MatchOutcome {
                        winner: Some(Winner::Team(Team::Red)),
                        reason: EndReason::Elimination,
                    })
                } else if living(Team::Red) == 0 {
                    Some(MatchOutcome {
                        winner: Some(Winner::Team(Team::Blue)),
                        reason: EndReason::Elimination,
                    })
                } else if elapsed >= *duration {
                    // The prey held out
                    Some(MatchOutcome {
                        winner: Some(Winner::Team(Team::Blue)),
                        reason: EndReason::TimeUp,
                    })
                } else {
                    None
                }
            }
        }
    }
}

impl Default for MatchRules {
    fn default() -> Self {
        Self::free_for_all()
    }
}
