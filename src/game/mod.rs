//! Game simulation modules

pub mod agent;
pub mod combat;
pub mod error;
pub mod r#match;
pub mod obstacle;
pub mod perception;
pub mod physics;
pub mod rules;
pub mod snapshot;
pub mod tuning;
pub mod world;

pub use agent::{Behavior, Sheep};
pub use error::{GameError, Result};
pub use obstacle::ObstacleField;
pub use r#match::{GameMatch, MatchCommand, MatchHandle, MatchReport, Pace};
pub use rules::{MatchOutcome, MatchPhase, MatchRules, Team, Winner};
pub use snapshot::{GameEvent, MatchStats, WorldSnapshot};
pub use tuning::Tuning;
pub use world::World;

use serde::{Deserialize, Serialize};

/// Directional keys held by the player for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl TickInput {
    /// Raw key direction in screen space (y grows downward), or `None`
    /// when no key or only opposing keys are held.
    pub fn direction(&self) -> Option<(f32, f32)> {
        let axis = |neg: bool, pos: bool| match (neg, pos) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        };
        let dx = axis(self.left, self.right);
        let dy = axis(self.up, self.down);

        if dx == 0.0 && dy == 0.0 {
            None
        } else {
            Some((dx, dy))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposing_keys_cancel() {
        let input = TickInput {
            left: true,
            right: true,
            ..TickInput::default()
        };
        assert_eq!(input.direction(), None);
        assert_eq!(TickInput::default().direction(), None);
    }

    #[test]
    fn diagonal_direction() {
        let input = TickInput {
            up: true,
            right: true,
            ..TickInput::default()
        };
        assert_eq!(input.direction(), Some((1.0, -1.0)));
    }
}
