//! Loop driver and scheduling
//!
//! Both clocks run on one execution context. The host's timer and display
//! refresh callbacks are modelled by [`Scheduler`]: after each tick the driver
//! asks for the next one after a delay, after each frame it asks for the next
//! refresh. [`TokioScheduler`] maps that onto a current-thread tokio runtime;
//! [`ManualScheduler`] replays it on a [`ManualClock`] for tests.

use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, info};

use crate::clock::render::{FrameOutcome, RenderClock, RenderContext};
use crate::clock::simulation::{SimulationClock, SimulationContext, TickOutcome};
use crate::clock::{ManualClock, TimeSource};
use crate::config::ClientConfig;
use crate::input::InputSampler;
use crate::net::sender::{ConnectionHandle, NetworkSender};
use crate::net::snapshot::WorldSnapshotProvider;
use crate::render::DrawSurface;
use crate::telemetry::Telemetry;

/// Host scheduling primitives
pub trait Scheduler {
    /// Run the next simulation tick after `delay`
    fn schedule_after(&mut self, delay: Duration);
    /// Run the next frame on the next display refresh
    fn schedule_next_frame(&mut self);
}

/// Callbacks the scheduler invokes
pub trait LoopHandler {
    fn on_tick(&mut self, scheduler: &mut dyn Scheduler);
    fn on_frame(&mut self, scheduler: &mut dyn Scheduler);
}

/// External systems the loops talk to
pub struct Collaborators<W, I, N, D, T, C> {
    pub world: W,
    pub input: I,
    pub sender: N,
    pub surface: D,
    pub telemetry: T,
    pub time: C,
}

/// Owns both clocks and their collaborators
pub struct GameDriver<W, I, N, D, T, C> {
    simulation: SimulationClock,
    render: RenderClock,
    parts: Collaborators<W, I, N, D, T, C>,
    connection: ConnectionHandle,
}

impl<W, I, N, D, T, C> GameDriver<W, I, N, D, T, C>
where
    W: WorldSnapshotProvider,
    I: InputSampler,
    N: NetworkSender,
    D: DrawSurface,
    T: Telemetry,
    C: TimeSource,
{
    pub fn new(
        config: &ClientConfig,
        parts: Collaborators<W, I, N, D, T, C>,
        connection: ConnectionHandle,
    ) -> Self {
        let now = parts.time.now();
        Self {
            simulation: SimulationClock::new(config.tick_period, now),
            render: RenderClock::new(config, now),
            parts,
            connection,
        }
    }

    /// Kick off both loops: first tick immediately, first frame on the next refresh
    pub fn start(&mut self, scheduler: &mut dyn Scheduler) {
        info!(
            "Client loops starting: tick every {}ms, connection {}",
            self.simulation.tick_period().as_millis(),
            self.connection.id()
        );
        scheduler.schedule_after(Duration::ZERO);
        scheduler.schedule_next_frame();
    }

    pub fn tick(&mut self) -> TickOutcome {
        let parts = &mut self.parts;
        let mut ctx = SimulationContext {
            time: &parts.time,
            world: &parts.world,
            input: &parts.input,
            sender: &mut parts.sender,
            connection: self.connection,
            telemetry: &mut parts.telemetry,
        };
        self.simulation.tick(&mut ctx)
    }

    pub fn frame(&mut self) -> FrameOutcome {
        let parts = &mut self.parts;
        let mut ctx = RenderContext {
            time: &parts.time,
            world: &parts.world,
            surface: &mut parts.surface,
            telemetry: &mut parts.telemetry,
        };
        self.render.frame(&mut ctx)
    }

    pub fn simulation(&self) -> &SimulationClock {
        &self.simulation
    }

    pub fn render(&self) -> &RenderClock {
        &self.render
    }

    pub fn parts(&self) -> &Collaborators<W, I, N, D, T, C> {
        &self.parts
    }

    pub fn parts_mut(&mut self) -> &mut Collaborators<W, I, N, D, T, C> {
        &mut self.parts
    }
}

impl<W, I, N, D, T, C> LoopHandler for GameDriver<W, I, N, D, T, C>
where
    W: WorldSnapshotProvider,
    I: InputSampler,
    N: NetworkSender,
    D: DrawSurface,
    T: Telemetry,
    C: TimeSource,
{
    fn on_tick(&mut self, scheduler: &mut dyn Scheduler) {
        match self.tick() {
            TickOutcome::Reschedule(delay) => scheduler.schedule_after(delay),
            TickOutcome::Stopped => debug!("simulation loop not rescheduled"),
        }
    }

    fn on_frame(&mut self, scheduler: &mut dyn Scheduler) {
        self.frame();
        scheduler.schedule_next_frame();
    }
}

/// Scheduler backed by tokio timers.
///
/// Ticks use a one-shot sleep per delay; the display refresh is a fixed
/// interval. Run it on a current-thread runtime to keep the loops on one thread.
#[derive(Debug)]
pub struct TokioScheduler {
    next_tick: Option<tokio::time::Instant>,
    frame_requested: bool,
    frame_interval: Duration,
}

impl TokioScheduler {
    pub fn new(frame_interval: Duration) -> Self {
        Self {
            next_tick: None,
            frame_requested: false,
            frame_interval,
        }
    }

    /// Dispatch callbacks until `shutdown` resolves or nothing is scheduled
    pub async fn run<H, F>(&mut self, handler: &mut H, shutdown: F)
    where
        H: LoopHandler,
        F: Future<Output = ()>,
    {
        let mut frames = tokio::time::interval(self.frame_interval);
        frames.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            if self.next_tick.is_none() && !self.frame_requested {
                debug!("nothing scheduled, scheduler exiting");
                break;
            }
            let tick_at = self.next_tick;
            let frame_wanted = self.frame_requested;

            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep_until(tick_at.unwrap_or_else(tokio::time::Instant::now)), if tick_at.is_some() => {
                    self.next_tick = None;
                    handler.on_tick(self);
                }
                _ = frames.tick(), if frame_wanted => {
                    self.frame_requested = false;
                    handler.on_frame(self);
                }
            }
        }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_after(&mut self, delay: Duration) {
        self.next_tick = Some(tokio::time::Instant::now() + delay);
    }

    fn schedule_next_frame(&mut self) {
        self.frame_requested = true;
    }
}

/// Which callback fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wakeup {
    Tick,
    Frame,
}

/// Deterministic scheduler over a [`ManualClock`].
///
/// Jumps virtual time straight to the next due callback. Frames fire every
/// `frame_interval` while requested; on a tie the tick runs first.
#[derive(Debug)]
pub struct ManualScheduler {
    clock: Rc<ManualClock>,
    frame_interval: Duration,
    tick_due: Option<Duration>,
    frame_due: Option<Duration>,
    /// Every delay passed to `schedule_after`, in order
    tick_delays: Vec<Duration>,
    log: Vec<(Duration, Wakeup)>,
}

impl ManualScheduler {
    pub fn new(clock: Rc<ManualClock>, frame_interval: Duration) -> Self {
        Self {
            clock,
            frame_interval,
            tick_due: None,
            frame_due: None,
            tick_delays: Vec::new(),
            log: Vec::new(),
        }
    }

    pub fn tick_delays(&self) -> &[Duration] {
        &self.tick_delays
    }

    /// Fired callbacks with the virtual time they fired at
    pub fn log(&self) -> &[(Duration, Wakeup)] {
        &self.log
    }

    pub fn count(&self, wakeup: Wakeup) -> usize {
        self.log.iter().filter(|(_, w)| *w == wakeup).count()
    }

    pub fn tick_pending(&self) -> bool {
        self.tick_due.is_some()
    }

    /// Fire callbacks in time order until the next one would be after `until`
    pub fn run_until(&mut self, handler: &mut dyn LoopHandler, until: Duration) {
        loop {
            let next = match (self.tick_due, self.frame_due) {
                (Some(t), Some(f)) if f < t => (f, Wakeup::Frame),
                (Some(t), _) => (t, Wakeup::Tick),
                (None, Some(f)) => (f, Wakeup::Frame),
                (None, None) => break,
            };
            if next.0 > until {
                break;
            }

            self.clock.set(next.0.max(self.clock.now()));
            self.log.push((self.clock.now(), next.1));
            match next.1 {
                Wakeup::Tick => {
                    self.tick_due = None;
                    handler.on_tick(self);
                }
                Wakeup::Frame => {
                    self.frame_due = None;
                    handler.on_frame(self);
                }
            }
        }
        if self.clock.now() < until {
            self.clock.set(until);
        }
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_after(&mut self, delay: Duration) {
        self.tick_delays.push(delay);
        self.tick_due = Some(self.clock.now() + delay);
    }

    fn schedule_next_frame(&mut self) {
        self.frame_due = Some(self.clock.now() + self.frame_interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::simulation::SimulationPhase;
    use crate::net::snapshot::SnapshotStore;
    use crate::render::RecordingSurface;
    use crate::sync::PlayerDiff;
    use crate::telemetry::TracingTelemetry;
    use crate::util::vec2::Vec2;
    use crate::world::{ItemKind, ItemState, PlayerState, WorldState};
    use std::cell::Cell;
    use std::sync::Arc;
    use uuid::Uuid;

    #[derive(Default)]
    struct CountingSender {
        sent: Vec<PlayerDiff>,
    }

    impl NetworkSender for CountingSender {
        fn send_data(&mut self, _connection: ConnectionHandle, diff: &PlayerDiff) {
            self.sent.push(*diff);
        }
    }

    struct SharedAim(Rc<Cell<f32>>);

    impl InputSampler for SharedAim {
        fn aim_degrees(&self) -> f32 {
            self.0.get()
        }
    }

    type TestDriver = GameDriver<
        Arc<SnapshotStore>,
        SharedAim,
        CountingSender,
        RecordingSurface,
        TracingTelemetry,
        Rc<ManualClock>,
    >;

    struct Setup {
        clock: Rc<ManualClock>,
        store: Arc<SnapshotStore>,
        aim: Rc<Cell<f32>>,
        driver: TestDriver,
        scheduler: ManualScheduler,
    }

    fn setup() -> Setup {
        let clock = Rc::new(ManualClock::new());
        let store = Arc::new(SnapshotStore::new());
        let aim = Rc::new(Cell::new(0.0));
        let mut config = ClientConfig::default();
        config.tick_period = Duration::from_millis(30);
        config.show_performance_metrics = true;
        config.fps_sample_window = Duration::from_millis(100);

        let driver = GameDriver::new(
            &config,
            Collaborators {
                world: store.clone(),
                input: SharedAim(aim.clone()),
                sender: CountingSender::default(),
                surface: RecordingSurface::new(640.0, 480.0),
                telemetry: TracingTelemetry::new(),
                time: clock.clone(),
            },
            ConnectionHandle::new(7),
        );
        let scheduler = ManualScheduler::new(clock.clone(), Duration::from_millis(16));
        Setup {
            clock,
            store,
            aim,
            driver,
            scheduler,
        }
    }

    fn join(store: &SnapshotStore) -> PlayerState {
        let player = PlayerState::new(Uuid::new_v4(), "me", Vec2::new(0.0, 0.0));
        store.replace_player(player.clone());
        store.replace_world(
            WorldState::default()
                .with_player(player.clone())
                .with_item(ItemState {
                    id: 1,
                    position: Vec2::new(10.0, 10.0),
                    width: 8.0,
                    height: 8.0,
                    kind: ItemKind::Blood,
                }),
        );
        player
    }

    #[test]
    fn test_loops_interleave_at_their_own_rates() {
        let mut s = setup();
        s.driver.start(&mut s.scheduler);
        s.scheduler.run_until(&mut s.driver, Duration::from_millis(300));

        // Ticks at 0, 30, ..., 300; frames every 16ms from 16
        assert_eq!(s.scheduler.count(Wakeup::Tick), 11);
        assert_eq!(s.scheduler.count(Wakeup::Frame), 18);
        assert!(s
            .scheduler
            .tick_delays()
            .iter()
            .skip(1)
            .all(|&d| d == Duration::from_millis(30)));
        assert_eq!(s.clock.now(), Duration::from_millis(300));
    }

    #[test]
    fn test_frames_continue_without_snapshot() {
        let mut s = setup();
        s.driver.start(&mut s.scheduler);
        s.scheduler.run_until(&mut s.driver, Duration::from_millis(100));
        assert!(s.scheduler.count(Wakeup::Frame) > 0);
        assert_eq!(s.driver.parts().surface.frames(), 0);
        assert!(s.driver.parts().sender.sent.is_empty());
    }

    #[test]
    fn test_end_to_end_sends_and_draws() {
        let mut s = setup();
        join(&s.store);
        s.aim.set(45.0);
        s.driver.start(&mut s.scheduler);
        s.scheduler.run_until(&mut s.driver, Duration::from_millis(200));

        assert_eq!(
            s.driver.parts().sender.sent,
            vec![PlayerDiff {
                mouse_angle_degrees: Some(45.0)
            }]
        );
        assert!(s.driver.parts().surface.frames() > 0);
        assert_eq!(s.driver.parts().surface.items().count(), 1);
        assert_eq!(s.driver.parts().telemetry.stats().fps, Some(63));
    }

    #[test]
    fn test_game_over_stops_tick_but_not_frames() {
        let mut s = setup();
        let mut player = join(&s.store);
        s.driver.start(&mut s.scheduler);
        s.scheduler.run_until(&mut s.driver, Duration::from_millis(100));
        let ticks_before = s.scheduler.count(Wakeup::Tick);

        player.active = false;
        s.store.replace_player(player);
        s.scheduler.run_until(&mut s.driver, Duration::from_millis(200));
        assert_eq!(s.driver.simulation().phase(), SimulationPhase::GameOver);
        assert!(!s.scheduler.tick_pending());
        let ticks_after = s.scheduler.count(Wakeup::Tick);

        s.aim.set(120.0);
        let frames_before = s.scheduler.count(Wakeup::Frame);
        s.scheduler.run_until(&mut s.driver, Duration::from_millis(400));
        assert_eq!(s.scheduler.count(Wakeup::Tick), ticks_after);
        assert_eq!(ticks_after, ticks_before + 1);
        assert!(s.scheduler.count(Wakeup::Frame) > frames_before);
        assert!(s.driver.parts().sender.sent.is_empty());
        assert_eq!(s.driver.parts().telemetry.stats().game_over_shown, 1);
    }

    struct CountingHandler {
        ticks: u32,
        frames: u32,
    }

    impl LoopHandler for CountingHandler {
        fn on_tick(&mut self, scheduler: &mut dyn Scheduler) {
            self.ticks += 1;
            scheduler.schedule_after(Duration::from_millis(5));
        }

        fn on_frame(&mut self, scheduler: &mut dyn Scheduler) {
            self.frames += 1;
            scheduler.schedule_next_frame();
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_tokio_scheduler_runs_both_loops() {
        let mut scheduler = TokioScheduler::new(Duration::from_millis(5));
        let mut handler = CountingHandler { ticks: 0, frames: 0 };
        scheduler.schedule_after(Duration::ZERO);
        scheduler.schedule_next_frame();

        scheduler
            .run(&mut handler, tokio::time::sleep(Duration::from_millis(100)))
            .await;

        assert!(handler.ticks > 1);
        assert!(handler.frames > 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_tokio_scheduler_exits_when_idle() {
        let mut scheduler = TokioScheduler::new(Duration::from_millis(5));
        let mut handler = CountingHandler { ticks: 0, frames: 0 };
        scheduler
            .run(&mut handler, std::future::pending::<()>())
            .await;
        assert_eq!(handler.ticks, 0);
    }
}
