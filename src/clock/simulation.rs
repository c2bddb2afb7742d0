//! Fixed-period simulation loop
//!
//! Each tick samples the aim input, diffs it against what was last sent and
//! forwards any change to the network. The next tick is scheduled after
//! whatever is left of the tick period, never a negative delay. Under
//! sustained overload ticks simply run back to back.
//!
//! Once the local player is reported inactive the loop enters `GameOver` and
//! stops for good; a new game needs a new clock.

use std::time::Duration;

use tracing::{info, trace};

use crate::clock::TimeSource;
use crate::input::InputSampler;
use crate::net::sender::{ConnectionHandle, NetworkSender};
use crate::net::snapshot::WorldSnapshotProvider;
use crate::sync::diff;
use crate::telemetry::Telemetry;
use crate::world::{PlayerId, PlayerState};

/// Loop timing as shown on the stats overlay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClockStats {
    /// Start of this tick
    pub current: Duration,
    /// Start of the previous tick
    pub last: Duration,
    /// Time between the two starts
    pub delta: Duration,
    /// Processing time of this tick
    pub elapsed: Duration,
    /// Delay before the next tick
    pub sleep: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationPhase {
    Running,
    GameOver,
}

/// What the driver should do after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Run the next tick after this delay
    Reschedule(Duration),
    /// Game over, do not reschedule
    Stopped,
}

/// Remaining budget until the next tick boundary, floored at zero
#[inline]
pub fn sleep_for(tick_period: Duration, elapsed: Duration) -> Duration {
    tick_period.saturating_sub(elapsed)
}

/// Collaborators a tick reads from and writes to
pub struct SimulationContext<'a> {
    pub time: &'a dyn TimeSource,
    pub world: &'a dyn WorldSnapshotProvider,
    pub input: &'a dyn InputSampler,
    pub sender: &'a mut dyn NetworkSender,
    pub connection: ConnectionHandle,
    pub telemetry: &'a mut dyn Telemetry,
}

#[derive(Debug)]
pub struct SimulationClock {
    tick_period: Duration,
    stats: ClockStats,
    phase: SimulationPhase,
    /// Aim last handed to the sender, keyed by player so a new session starts clean
    last_sent_aim: Option<(PlayerId, f32)>,
    ticks: u64,
    sends: u64,
}

impl SimulationClock {
    /// `now` seeds the first tick's `delta`
    pub fn new(tick_period: Duration, now: Duration) -> Self {
        Self {
            tick_period,
            stats: ClockStats {
                current: now,
                ..Default::default()
            },
            phase: SimulationPhase::Running,
            last_sent_aim: None,
            ticks: 0,
            sends: 0,
        }
    }

    #[inline]
    pub fn phase(&self) -> SimulationPhase {
        self.phase
    }

    #[inline]
    pub fn stats(&self) -> &ClockStats {
        &self.stats
    }

    #[inline]
    pub fn tick_period(&self) -> Duration {
        self.tick_period
    }

    #[inline]
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    #[inline]
    pub fn send_count(&self) -> u64 {
        self.sends
    }

    /// Run one tick
    pub fn tick(&mut self, ctx: &mut SimulationContext<'_>) -> TickOutcome {
        if self.phase == SimulationPhase::GameOver {
            return TickOutcome::Stopped;
        }

        self.stats.last = self.stats.current;
        self.stats.current = ctx.time.now();
        self.stats.delta = self.stats.current.saturating_sub(self.stats.last);
        self.ticks += 1;

        if let Some(player) = ctx.world.player_state() {
            if !player.active {
                self.phase = SimulationPhase::GameOver;
                info!("Player {} eliminated, simulation loop stopped", player.id);
                ctx.telemetry.game_over();
                return TickOutcome::Stopped;
            }
            self.sync_input(&player, ctx);
        }

        self.stats.elapsed = ctx.time.now().saturating_sub(self.stats.current);
        self.stats.sleep = sleep_for(self.tick_period, self.stats.elapsed);
        ctx.telemetry.clock(&self.stats);
        TickOutcome::Reschedule(self.stats.sleep)
    }

    fn sync_input(&mut self, player: &PlayerState, ctx: &mut SimulationContext<'_>) {
        let baseline_aim = match self.last_sent_aim {
            Some((id, aim)) if id == player.id => aim,
            _ => player.mouse_angle_degrees,
        };
        let mut previous = player.clone();
        previous.mouse_angle_degrees = baseline_aim;
        let updated = PlayerState {
            mouse_angle_degrees: ctx.input.aim_degrees(),
            ..player.clone()
        };

        match diff(&previous, &updated) {
            Some(record) => {
                ctx.sender.send_data(ctx.connection, &record);
                self.last_sent_aim = Some((player.id, updated.mouse_angle_degrees));
                self.sends += 1;
                trace!(aim = updated.mouse_angle_degrees, "input sent");
            }
            None => trace!("input unchanged, send skipped"),
        }
    }
}
