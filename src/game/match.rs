//! Match driver: runs a World on a fixed step as its own task

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::util::time::{
    tick_delta, tick_duration, Timer, SIMULATION_TPS, SNAPSHOT_TPS, TICK_DURATION_MICROS,
};

use super::rules::MatchOutcome;
use super::snapshot::{GameEvent, MatchStats, SnapshotBuilder, WorldSnapshot};
use super::world::World;
use super::TickInput;

/// Messages accepted by a running match
#[derive(Debug, Clone, PartialEq)]
pub enum MatchCommand {
    /// Replace the held keys; applies from the next tick on
    Input(TickInput),
    /// Throw the world away and start a fresh one
    Restart,
    Stop,
}

/// How ticks are spaced in wall-clock time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pace {
    /// One tick per `1 / SIMULATION_TPS` seconds, late ticks skipped
    RealTime,
    /// As fast as possible, yielding between ticks
    Unpaced,
}

/// Why the loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The rules declared an outcome
    Finished,
    TickLimit,
    /// A `MatchCommand::Stop` arrived
    Stopped,
}

/// Summary returned once the loop exits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReport {
    pub match_id: Uuid,
    pub seed: Option<u64>,
    pub rules: String,
    pub reason: StopReason,
    pub outcome: Option<MatchOutcome>,
    pub stats: MatchStats,
}

/// Handle to a running match
#[derive(Clone)]
pub struct MatchHandle {
    /// Id of the world the match started with
    pub id: Uuid,
    pub command_tx: mpsc::Sender<MatchCommand>,
    pub snapshot_tx: broadcast::Sender<WorldSnapshot>,
}

impl MatchHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<WorldSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Queue a command without waiting. Returns false if it was dropped.
    pub fn send(&self, command: MatchCommand) -> bool {
        match self.command_tx.try_send(command) {
            Ok(()) => true,
            Err(TrySendError::Full(command)) => {
                warn!(match_id = %self.id, ?command, "Command queue full, dropping command");
                false
            }
            Err(TrySendError::Closed(command)) => {
                warn!(match_id = %self.id, ?command, "Match is gone, dropping command");
                false
            }
        }
    }
}

/// The authoritative game match
pub struct GameMatch {
    world: World,
    command_rx: mpsc::Receiver<MatchCommand>,
    snapshot_tx: broadcast::Sender<WorldSnapshot>,
    snapshot_builder: SnapshotBuilder,
    input: TickInput,
    pace: Pace,
    max_ticks: Option<u64>,
}

impl GameMatch {
    /// Wrap a world in a driver. `max_ticks` bounds each world's run.
    pub fn new(world: World, pace: Pace, max_ticks: Option<u64>) -> (Self, MatchHandle) {
        let (command_tx, command_rx) = mpsc::channel(256);
        let (snapshot_tx, _) = broadcast::channel(64);

        let handle = MatchHandle {
            id: world.id(),
            command_tx,
            snapshot_tx: snapshot_tx.clone(),
        };

        let snapshot_interval = SIMULATION_TPS / SNAPSHOT_TPS;
        let game_match = Self {
            world,
            command_rx,
            snapshot_tx,
            snapshot_builder: SnapshotBuilder::new(snapshot_interval),
            input: TickInput::default(),
            pace,
            max_ticks,
        };

        (game_match, handle)
    }

    /// Run the authoritative tick loop until the match ends, the tick limit
    /// is hit or a stop command arrives.
    pub async fn run(mut self) -> MatchReport {
        info!(
            match_id = %self.world.id(),
            seed = ?self.world.seed(),
            rules = self.world.rules().name(),
            pace = ?self.pace,
            "Match started"
        );

        let mut ticker = match self.pace {
            Pace::RealTime => {
                let mut ticker = interval(tick_duration());
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                Some(ticker)
            }
            Pace::Unpaced => None,
        };
        let dt = tick_delta();

        let reason = loop {
            match ticker.as_mut() {
                Some(ticker) => {
                    ticker.tick().await;
                }
                None => tokio::task::yield_now().await,
            }

            // Drain command queue
            let mut restart = false;
            let mut stop = false;
            while let Ok(command) = self.command_rx.try_recv() {
                match command {
                    MatchCommand::Input(input) => self.input = input,
                    MatchCommand::Restart => restart = true,
                    MatchCommand::Stop => stop = true,
                }
            }
            if stop {
                info!(match_id = %self.world.id(), "Stop requested");
                break StopReason::Stopped;
            }
            if restart {
                self.world = self.world.restart();
                self.snapshot_builder = SnapshotBuilder::new(SIMULATION_TPS / SNAPSHOT_TPS);
                self.snapshot_builder.force_next();
            }

            let timer = Timer::new();
            let events = self.world.update(dt, &self.input);
            let cost = timer.elapsed_micros();
            if cost > TICK_DURATION_MICROS {
                warn!(
                    match_id = %self.world.id(),
                    tick = self.world.tick(),
                    cost_micros = cost,
                    "Tick overran its budget"
                );
            }

            if events
                .iter()
                .any(|e| matches!(e, GameEvent::Kill { .. } | GameEvent::MatchEnded { .. }))
            {
                self.snapshot_builder.force_next();
            }
            self.snapshot_builder.record(events);

            if self.snapshot_builder.should_send() {
                let snapshot = self.snapshot_builder.build(&self.world);
                // Nobody listening is fine
                let _ = self.snapshot_tx.send(snapshot);
            }

            if self.world.is_game_over() {
                break StopReason::Finished;
            }
            if self.max_ticks.is_some_and(|limit| self.world.tick() >= limit) {
                debug!(match_id = %self.world.id(), tick = self.world.tick(), "Tick limit reached");
                break StopReason::TickLimit;
            }
        };

        let report = MatchReport {
            match_id: self.world.id(),
            seed: self.world.seed(),
            rules: self.world.rules().name().to_string(),
            reason,
            outcome: self.world.outcome(),
            stats: self.world.match_stats(),
        };

        info!(
            match_id = %report.match_id,
            reason = ?report.reason,
            ticks = report.stats.ticks,
            "Match finished"
        );
        report
    }
}
