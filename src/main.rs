use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use arena_client::clock::MonotonicClock;
use arena_client::config::ClientConfig;
use arena_client::driver::{Collaborators, GameDriver, TokioScheduler};
use arena_client::input::PointerInput;
use arena_client::net::protocol::{decode, ClientMessage};
use arena_client::net::sender::{ChannelSender, ConnectionHandle, OutboundMessage};
use arena_client::net::snapshot::SnapshotStore;
use arena_client::render::RecordingSurface;
use arena_client::telemetry::{NullTelemetry, Telemetry, TracingTelemetry};
use arena_client::util::vec2::Vec2;
use arena_client::world::{ItemKind, ItemState, LeaderboardEntry, PlayerId, PlayerState, WorldState};

/// Outbound queue depth between the simulation loop and the socket task
const OUTBOUND_CAPACITY: usize = 256;
/// Arena side length for the generated world
const ARENA_SIZE: f32 = 4000.0;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Arena Client v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = ClientConfig::load_or_default();
    config.validate()?;
    info!(
        "Configuration loaded: tick={}ms, frame={}ms, metrics={}",
        config.tick_period.as_millis(),
        config.frame_interval.as_millis(),
        config.show_performance_metrics
    );

    let viewport_width: f32 = env_or("VIEWPORT_WIDTH", 1280.0);
    let viewport_height: f32 = env_or("VIEWPORT_HEIGHT", 720.0);

    // Seed the snapshot store
    let store = Arc::new(SnapshotStore::new());
    let (world, local_id) = match std::env::var("WORLD_FIXTURE") {
        Ok(path) => {
            info!("Loading world fixture {}", path);
            let world = SnapshotStore::load_json(&path)?;
            let local_id = fixture_local_id(&world)?;
            (world, local_id)
        }
        Err(_) => random_world(),
    };
    let local = world
        .players
        .get(&local_id)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("local player {} not in world", local_id))?;
    store.replace_player(local);
    store.replace_world(world);

    // Loopback socket: echo the aim back as the server would
    let (sender, outbound) = ChannelSender::new(OUTBOUND_CAPACITY);
    let echo_store = store.clone();
    let echo = tokio::task::spawn_blocking(move || {
        let mut echoed = 0u64;
        while let Ok(message) = outbound.recv() {
            if let Err(e) = echo_input(&echo_store, &message) {
                warn!("Loopback dropped message: {}", e);
                continue;
            }
            echoed += 1;
        }
        echoed
    });

    // Wander the pointer so the aim keeps changing
    let input = Arc::new(PointerInput::new(viewport_width, viewport_height));
    let pointer = input.clone();
    let wander = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(100));
        let mut angle: f32 = 0.0;
        loop {
            interval.tick().await;
            angle = (angle + 7.5) % 360.0;
            let radians = angle.to_radians();
            pointer.pointer_moved(
                viewport_width * 0.5 + radians.cos() * 200.0,
                viewport_height * 0.5 + radians.sin() * 200.0,
            );
        }
    });

    let telemetry: Box<dyn Telemetry> = if config.show_performance_metrics {
        Box::new(TracingTelemetry::new())
    } else {
        Box::new(NullTelemetry)
    };

    let mut driver = GameDriver::new(
        &config,
        Collaborators {
            world: store.clone(),
            input,
            sender,
            surface: RecordingSurface::new(viewport_width, viewport_height),
            telemetry,
            time: MonotonicClock::new(),
        },
        ConnectionHandle::new(1),
    );
    let mut scheduler = TokioScheduler::new(config.frame_interval);
    driver.start(&mut scheduler);

    // Shutdown after RUN_SECONDS or on Ctrl+C
    let run_for = std::env::var("RUN_SECONDS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs);
    let shutdown = async move {
        match run_for {
            Some(duration) => {
                tokio::select! {
                    _ = tokio::time::sleep(duration) => info!("Run time elapsed"),
                    _ = tokio::signal::ctrl_c() => info!("Shutdown signal received"),
                }
            }
            None => {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!("Failed to listen for Ctrl+C: {}", e);
                }
                info!("Shutdown signal received");
            }
        }
    };

    scheduler.run(&mut driver, shutdown).await;

    info!(
        "Stopped after {} ticks ({} sends) and {} frames",
        driver.simulation().tick_count(),
        driver.simulation().send_count(),
        driver.render().frame_count()
    );
    info!(
        "Last frame: {} draw calls",
        driver.parts().surface.commands().len()
    );

    // Dropping the driver closes the outbound channel and ends the echo task
    wander.abort();
    drop(driver);
    let echoed = echo.await?;
    info!("Loopback echoed {} inputs", echoed);

    Ok(())
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Apply an outbound input to the local player the way the server would
fn echo_input(store: &SnapshotStore, message: &OutboundMessage) -> anyhow::Result<()> {
    let ClientMessage::Input(diff) = decode::<ClientMessage>(&message.payload)?;
    if let Some(aim) = diff.mouse_angle_degrees {
        store.modify_player(|player| player.mouse_angle_degrees = aim);
    }
    Ok(())
}

/// LOCAL_PLAYER_ID if set, else the alphabetically first username
fn fixture_local_id(world: &WorldState) -> anyhow::Result<PlayerId> {
    if let Ok(raw) = std::env::var("LOCAL_PLAYER_ID") {
        return Ok(Uuid::parse_str(&raw)?);
    }
    world
        .players
        .values()
        .min_by(|a, b| a.username.cmp(&b.username))
        .map(|p| p.id)
        .ok_or_else(|| anyhow::anyhow!("world fixture has no players"))
}

fn random_position<R: Rng>(rng: &mut R) -> Vec2 {
    Vec2::new(rng.gen_range(0.0..ARENA_SIZE), rng.gen_range(0.0..ARENA_SIZE))
}

/// A populated arena for running without a fixture
fn random_world() -> (WorldState, PlayerId) {
    let mut rng = rand::thread_rng();

    let local = PlayerState::new(
        Uuid::new_v4(),
        "local",
        Vec2::new(ARENA_SIZE * 0.5, ARENA_SIZE * 0.5),
    );
    let mut world = WorldState::default().with_player(local.clone());
    world.leaderboard.push(LeaderboardEntry {
        id: local.id,
        username: local.username.clone(),
        score: 0,
    });

    for i in 0..24 {
        let mut bot = PlayerState::new(Uuid::new_v4(), format!("bot-{}", i), random_position(&mut rng));
        bot.mouse_angle_degrees = rng.gen_range(-180.0..180.0);
        bot.boost_value = rng.gen_range(0.0..100.0);
        world.leaderboard.push(LeaderboardEntry {
            id: bot.id,
            username: bot.username.clone(),
            score: rng.gen_range(0..500),
        });
        world = world.with_player(bot);
    }

    const KINDS: [ItemKind; 6] = [
        ItemKind::Armor,
        ItemKind::Helm,
        ItemKind::Sword,
        ItemKind::Life,
        ItemKind::Blood,
        ItemKind::Other,
    ];
    for id in 0..400u64 {
        let kind = KINDS[rng.gen_range(0..KINDS.len())];
        world = world.with_item(ItemState {
            id,
            position: random_position(&mut rng),
            width: 0.0,
            height: 0.0,
            kind,
        });
    }

    world.leaderboard.sort_by(|a, b| b.score.cmp(&a.score));
    info!(
        "Generated world: {} players, {} items",
        world.players.len(),
        world.items.len()
    );
    (world, local.id)
}
