//! Performance benchmarks for viewport-query-lib
//!
//! Run with: cargo bench --package viewport-query-lib

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use geo::{Coord, LineString, Point, Polygon, Rect};
use std::hint::black_box;
use viewport_query_lib::{
    Config, Feature, Frustum, QueryOptions, Tile, TileCoord, ViewportFeatureQueryEngine,
};

/// Generate a full zoom-`z` tile pyramid level with `features_per_tile` mixed features each.
///
/// Every fourth feature reuses an identifier from the neighbouring tile, so deduplication has
/// real work to do.
fn generate_tiles(z: u8, features_per_tile: usize) -> Vec<Tile> {
    let n = 1u32 << z;
    let mut tiles = Vec::with_capacity((n * n) as usize);
    let mut next_id = 0i64;

    for x in 0..n {
        for y in 0..n {
            let mut content = Vec::with_capacity(features_per_tile);
            for i in 0..features_per_tile {
                let t = i as f64 / features_per_tile as f64;
                let id = if i % 4 == 0 && next_id > 0 {
                    next_id - 1
                } else {
                    next_id += 1;
                    next_id
                };

                let feature = match i % 3 {
                    0 => Feature::new(Point::new(t, 1.0 - t)),
                    1 => Feature::new(LineString::from(
                        (0..16)
                            .map(|k| Coord {
                                x: t + k as f64 * 0.01,
                                y: (t * 7.0 + k as f64 * 0.3).sin() * 0.5 + 0.5,
                            })
                            .collect::<Vec<_>>(),
                    )),
                    _ => Feature::new(Polygon::new(
                        LineString::from(vec![
                            Coord { x: t, y: t },
                            Coord { x: t + 0.05, y: t },
                            Coord { x: t + 0.05, y: t + 0.05 },
                            Coord { x: t, y: t + 0.05 },
                        ]),
                        vec![],
                    )),
                };

                content.push(
                    feature
                        .with_property("cartodb_id", id)
                        .with_property("pop", (id % 1000) as f64 * 1.5)
                        .with_property("name", format!("feature-{id}")),
                );
            }
            tiles.push(Tile::new(TileCoord::new(x, y, z), content));
        }
    }

    tiles
}

fn view(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Frustum {
    Frustum::from_rect(Rect::new(
        Coord { x: min_x, y: min_y },
        Coord { x: max_x, y: max_y },
    ))
}

fn engine_for(
    tiles: Vec<Tile>,
    frustum: Frustum,
) -> ViewportFeatureQueryEngine<Vec<Frustum>, Vec<Tile>> {
    let mut engine = ViewportFeatureQueryEngine::new(Config::default());
    engine.set_tile_layer(tiles);
    engine.set_camera(vec![frustum]);
    engine
}

// ============================================================================
// Core Benchmarks - Key performance indicators
// ============================================================================

fn bench_query_performance(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");

    // 64 tiles with 500 features each - a typical resident set at street level
    let tiles = generate_tiles(3, 500);
    let total_features: usize = tiles.iter().map(|t| t.content.len()).sum();
    group.throughput(Throughput::Elements(total_features as u64));

    let small = engine_for(tiles.clone(), view(200.0, 200.0, 260.0, 260.0));
    group.bench_function("small_viewport_64x500", |b| {
        b.iter(|| small.get_features(black_box(&QueryOptions::default())).unwrap());
    });

    let large = engine_for(tiles, view(0.0, 0.0, 512.0, 512.0));
    group.bench_function("large_viewport_64x500", |b| {
        b.iter(|| large.get_features(black_box(&QueryOptions::default())).unwrap());
    });

    group.finish();
}

fn bench_aggregations(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregations");
    group.sample_size(20);

    let engine = engine_for(generate_tiles(3, 500), view(0.0, 0.0, 512.0, 512.0));

    for ops in [
        vec!["count", "sum"],
        vec!["count", "sum", "avg", "min", "max"],
        vec!["avg", "percentile_50", "percentile_90", "percentile_99"],
    ] {
        let options = QueryOptions::default()
            .with_properties(["name"])
            .with_aggregation("pop", ops.clone());
        group.bench_with_input(
            BenchmarkId::from_parameter(ops.join("+")),
            &options,
            |b, options| {
                b.iter(|| engine.get_features(options).unwrap());
            },
        );
    }

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(benches, bench_query_performance, bench_aggregations);

criterion_main!(benches);
