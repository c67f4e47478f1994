//! Read-only views of a world for renderers and observers

use serde::{Deserialize, Serialize};

use super::agent::Behavior;
use super::rules::{MatchOutcome, MatchPhase, Team, Winner};
use super::world::World;

/// Pose and status of one sheep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheepSnapshot {
    pub id: u32,
    pub team: Option<Team>,
    pub is_player: bool,
    pub x: f32,
    pub y: f32,
    /// Heading in radians, within (-π, π]
    pub angle: f32,
    pub alive: bool,
    pub behavior: Behavior,
}

/// Everything a renderer may draw for one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub elapsed: f32,
    /// Countdown for timed rules
    pub remaining: Option<f32>,
    pub phase: MatchPhase,
    pub game_over: bool,
    pub winner: Option<Winner>,
    pub sheep: Vec<SheepSnapshot>,
    /// Events since the previous emitted snapshot
    pub events: Vec<GameEvent>,
}

impl WorldSnapshot {
    pub fn alive_ids(&self) -> Vec<u32> {
        self.sheep.iter().filter(|s| s.alive).map(|s| s.id).collect()
    }
}

/// Things that happened during a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum GameEvent {
    /// Mutual horn contact, both bounced
    Clash { a: u32, b: u32, x: f32, y: f32 },

    Kill {
        attacker: u32,
        victim: u32,
        x: f32,
        y: f32,
    },

    /// Horn landed outside the kill cone
    Graze { attacker: u32, victim: u32 },

    MatchEnded { outcome: MatchOutcome },
}

/// Per-sheep result line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheepMatchStats {
    pub id: u32,
    pub team: Option<Team>,
    pub is_player: bool,
    pub kills: u32,
    pub clashes: u32,
    pub grazes: u32,
    pub survived: bool,
    pub alive_time_secs: f32,
    pub placement: u32,
}

/// Match statistics at end
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchStats {
    pub duration_secs: f32,
    pub ticks: u64,
    pub total_sheep: u32,
    pub outcome: Option<MatchOutcome>,
    pub sheep_stats: Vec<SheepMatchStats>,
}

/// Throttles snapshot emission and collects events in between
pub struct SnapshotBuilder {
    /// Tick counter since last snapshot
    ticks_since_snapshot: u32,
    /// Snapshot interval in ticks
    snapshot_interval: u32,
    pending_events: Vec<GameEvent>,
}

impl SnapshotBuilder {
    pub fn new(snapshot_interval: u32) -> Self {
        Self {
            ticks_since_snapshot: 0,
            snapshot_interval: snapshot_interval.max(1),
            pending_events: Vec::new(),
        }
    }

    /// Queue events for the next snapshot
    pub fn record(&mut self, events: impl IntoIterator<Item = GameEvent>) {
        self.pending_events.extend(events);
    }

    /// Check if it's time to send a snapshot
    pub fn should_send(&mut self) -> bool {
        self.ticks_since_snapshot += 1;
        if self.ticks_since_snapshot >= self.snapshot_interval {
            self.ticks_since_snapshot = 0;
            true
        } else {
            false
        }
    }

    /// Force snapshot on next check (used for important events)
    pub fn force_next(&mut self) {
        self.ticks_since_snapshot = self.snapshot_interval;
    }

    /// Build a snapshot carrying every event queued since the last one
    pub fn build(&mut self, world: &World) -> WorldSnapshot {
        let mut snapshot = world.snapshot();
        snapshot.events = std::mem::take(&mut self.pending_events);
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_throttles_and_forces() {
        let mut builder = SnapshotBuilder::new(3);
        assert!(!builder.should_send());
        assert!(!builder.should_send());
        assert!(builder.should_send());
        assert!(!builder.should_send());
        builder.force_next();
        assert!(builder.should_send());
    }

    #[test]
    fn events_serialize_tagged() {
        let json = serde_json::to_string(&GameEvent::Graze {
            attacker: 1,
            victim: 2,
        })
        .unwrap();
        assert!(json.contains("\"event_type\":\"graze\""));
    }
}
