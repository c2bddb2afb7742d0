//! Render-path benchmarks for the arena client
//!
//! Measures the per-frame quadtree rebuild and viewport query at various
//! world sizes, plus a full render pass against a recording surface.
//!
//! Run with: cargo bench --bench spatial

use std::time::Duration;

use arena_client::clock::render::{RenderClock, RenderContext};
use arena_client::clock::ManualClock;
use arena_client::config::ClientConfig;
use arena_client::constants::quadtree::{CAPACITY, MAX_DEPTH};
use arena_client::net::snapshot::SnapshotStore;
use arena_client::render::RecordingSurface;
use arena_client::spatial::{Quadtree, Rectangle, Region};
use arena_client::telemetry::NullTelemetry;
use arena_client::util::vec2::Vec2;
use arena_client::world::{ItemKind, ItemState, PlayerState, WorldState};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use uuid::Uuid;

const ARENA: f32 = 4000.0;
const VIEW_W: f32 = 1280.0;
const VIEW_H: f32 = 720.0;

/// Random boxes scattered over the arena
fn create_boxes(count: usize) -> Vec<Rectangle<usize>> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| {
            Rectangle::new(
                rng.gen_range(0.0..ARENA),
                rng.gen_range(0.0..ARENA),
                rng.gen_range(16.0..56.0),
                rng.gen_range(16.0..56.0),
                i,
            )
        })
        .collect()
}

fn viewport_region() -> Region {
    Region::region(
        ARENA * 0.5 - VIEW_W * 0.5,
        ARENA * 0.5 - VIEW_H * 0.5,
        VIEW_W,
        VIEW_H,
    )
}

/// Create a world with the specified number of items and a tenth as many players
fn create_world(count: usize) -> (WorldState, PlayerState) {
    let mut rng = rand::thread_rng();
    let local = PlayerState::new(Uuid::new_v4(), "local", Vec2::new(ARENA * 0.5, ARENA * 0.5));
    let mut world = WorldState::default().with_player(local.clone());

    for i in 0..count / 10 {
        let position = Vec2::new(rng.gen_range(0.0..ARENA), rng.gen_range(0.0..ARENA));
        world = world.with_player(PlayerState::new(Uuid::new_v4(), format!("Player{}", i), position));
    }
    for id in 0..count as u64 {
        world = world.with_item(ItemState {
            id,
            position: Vec2::new(rng.gen_range(0.0..ARENA), rng.gen_range(0.0..ARENA)),
            width: 0.0,
            height: 0.0,
            kind: ItemKind::Blood,
        });
    }
    (world, local)
}

/// Build over the whole arena, then cull to the viewport
fn bench_build_and_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("quadtree");
    group.sample_size(50);

    for count in [100, 500, 1000, 2000] {
        let boxes = create_boxes(count);
        let universe = Region::region(0.0, 0.0, ARENA, ARENA);
        let view = viewport_region();

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("build", count), &count, |b, _| {
            b.iter(|| {
                let mut tree = Quadtree::with_max_depth(universe, CAPACITY, MAX_DEPTH);
                for rect in &boxes {
                    tree.insert(*rect);
                }
                black_box(tree.len())
            })
        });

        // Reuses node and entry buffers across frames
        let mut tree = Quadtree::with_max_depth(universe, CAPACITY, MAX_DEPTH);
        group.bench_with_input(BenchmarkId::new("build_reset", count), &count, |b, _| {
            b.iter(|| {
                tree.reset(universe);
                for rect in &boxes {
                    tree.insert(*rect);
                }
                black_box(tree.len())
            })
        });

        let mut built = Quadtree::with_max_depth(universe, CAPACITY, MAX_DEPTH);
        for rect in &boxes {
            built.insert(*rect);
        }
        group.bench_with_input(BenchmarkId::new("query_viewport", count), &count, |b, _| {
            b.iter(|| black_box(built.query_unique(&view).len()))
        });
    }
    group.finish();
}

/// One complete frame: snapshot capture, two tree builds, queries and draw calls
fn bench_render_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_frame");
    group.sample_size(50);

    for count in [100, 500, 1000, 2000] {
        let (world, local) = create_world(count);
        let store = SnapshotStore::new();
        store.replace_player(local);
        store.replace_world(world);

        let config = ClientConfig::default();
        let clock = ManualClock::new();
        let mut render = RenderClock::new(&config, Duration::ZERO);
        let mut surface = RecordingSurface::new(VIEW_W, VIEW_H);
        let mut telemetry = NullTelemetry;

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("frame", count), &count, |b, _| {
            b.iter(|| {
                clock.advance(Duration::from_millis(16));
                let mut ctx = RenderContext {
                    time: &clock,
                    world: &store,
                    surface: &mut surface,
                    telemetry: &mut telemetry,
                };
                black_box(render.frame(&mut ctx))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_build_and_query, bench_render_frame);

criterion_main!(benches);
