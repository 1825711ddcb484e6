use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use prop_edge::config::{EdgeStrategy, EngineConfig};
use prop_edge::edge::score_rows;
use prop_edge::fake_slate::seeded_slate;
use prop_edge::identity::{KeyScheme, resolve};
use prop_edge::merge::merge;
use prop_edge::pipeline::publish;
use prop_edge::projection::ProjectionFeed;

const PITCHERS: usize = 600;

fn bench_resolve(c: &mut Criterion) {
    let slate = seeded_slate(1, PITCHERS);
    let names: Vec<&str> = slate
        .primary
        .records
        .iter()
        .map(|r| r.player.as_str())
        .collect();
    c.bench_function("resolve_short_key", |b| {
        b.iter(|| {
            for name in &names {
                black_box(resolve(black_box(name), KeyScheme::ShortKey));
            }
        })
    });
}

fn bench_merge(c: &mut Criterion) {
    let slate = seeded_slate(2, PITCHERS);
    let cfg = EngineConfig::default();
    c.bench_function("merge_three_sources", |b| {
        b.iter(|| {
            let merged = merge(black_box(&slate.primary), black_box(&slate.secondaries), &cfg);
            black_box(merged.rows.len());
        })
    });
}

fn bench_score(c: &mut Criterion) {
    let slate = seeded_slate(3, PITCHERS);
    for strategy in [EdgeStrategy::TwoSided, EdgeStrategy::Magnitude] {
        let cfg = EngineConfig {
            strategy,
            ..EngineConfig::default()
        };
        let merged = merge(&slate.primary, &slate.secondaries, &cfg);
        c.bench_function(&format!("score_rows_{strategy:?}"), |b| {
            b.iter(|| {
                let mut rows = merged.rows.clone();
                score_rows(black_box(&mut rows), &cfg);
                black_box(rows.len());
            })
        });
    }
}

fn bench_publish(c: &mut Criterion) {
    let slate = seeded_slate(4, PITCHERS);
    let cfg = EngineConfig::default();
    let feed = ProjectionFeed::new(&slate.projections, KeyScheme::FullName);
    c.bench_function("publish_end_to_end", |b| {
        b.iter(|| {
            let published = publish(&slate.primary, &slate.secondaries, Some(&feed), &cfg);
            black_box(published.report.render_text().len());
        })
    });
}

criterion_group!(benches, bench_resolve, bench_merge, bench_score, bench_publish);
criterion_main!(benches);
