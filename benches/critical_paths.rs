//! Criterion benchmarks for tileblend critical paths
//!
//! Benchmarks the core performance-critical operations:
//! - Blend: one edge band of a 32x32 tile
//! - Transition: cache hit against a full composition
//! - Map: rendering a map whose cells mostly reuse cached transitions

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use image::Rgba;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

use tileblend::asset::{AssetKey, ImageStore, MemorySource};
use tileblend::catalog::{Catalog, CategorySpec, FLOORS};
use tileblend::map::TileMap;
use tileblend::pixel::PixelBuffer;
use tileblend::tile::{Direction, Neighbors, TileId};
use tileblend::transition::{blend_edge, BlendParams, TransitionEngine};

// =============================================================================
// Test Data Generators
// =============================================================================

const TILE: u32 = 32;
const TILES: u32 = 6;

fn make_store() -> ImageStore {
    let mut source = MemorySource::new();
    for id in 0..TILES {
        let color = Rgba([(id * 40) as u8, 255 - (id * 30) as u8, 90, 255]);
        source.insert(AssetKey::new(FLOORS, id.to_string()), PixelBuffer::filled(TILE, TILE, color));
    }
    let catalog = Catalog::new().with_category(FLOORS, CategorySpec::new(TILE, TILE).retained());
    let mut store = ImageStore::new(catalog, Arc::new(source));
    let ids: Vec<String> = (0..TILES).map(|id| id.to_string()).collect();
    let batch = store.retain(FLOORS, &ids, |_| {}).expect("floors are retainable");
    store.wait(batch);
    store
}

/// Square map whose ids follow diagonal stripes
fn make_map(size: u32) -> TileMap {
    let rows = (0..size).map(|y| (0..size).map(|x| ((x + y) / 3) % TILES).collect()).collect();
    TileMap::from_rows(rows).expect("rows are rectangular")
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_blend(c: &mut Criterion) {
    let mut group = c.benchmark_group("blend");
    let neighbor = PixelBuffer::filled(TILE, TILE, Rgba([200, 180, 90, 255]));
    let params = BlendParams::default();
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    for direction in Direction::ALL {
        group.bench_with_input(BenchmarkId::new("edge", direction), &direction, |b, &direction| {
            let mut result = PixelBuffer::filled(TILE, TILE, Rgba([0, 200, 0, 255]));
            b.iter(|| blend_edge(&mut result, black_box(&neighbor), direction, &params, &mut rng))
        });
    }

    group.finish();
}

fn bench_transition(c: &mut Criterion) {
    let mut group = c.benchmark_group("transition");
    let store = make_store();
    let neighbors = Neighbors::from([1, 2, 3, 4]);

    let mut engine = TransitionEngine::default().with_seed(1);
    engine.get_transition(&store, TileId(0), neighbors).expect("sources retained");
    group.bench_function("cache_hit", |b| {
        b.iter(|| engine.get_transition(&store, black_box(TileId(0)), black_box(neighbors)))
    });

    group.bench_function("compose", |b| {
        b.iter(|| {
            let mut fresh = TransitionEngine::default().with_seed(1);
            fresh.get_transition(&store, black_box(TileId(0)), black_box(neighbors))
        })
    });

    group.finish();
}

fn bench_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("map");
    let store = make_store();

    for size in [8u32, 32].iter() {
        let map = make_map(*size);
        group.throughput(Throughput::Elements((*size * *size) as u64));
        group.bench_with_input(BenchmarkId::new("render", size), &map, |b, map| {
            b.iter(|| {
                let mut engine = TransitionEngine::default().with_seed(2);
                map.render(&mut engine, &store)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_blend, bench_transition, bench_map);
criterion_main!(benches);
