use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use drugspace::autoencoder::{Autoencoder, AutoencoderConfig};
use drugspace::ratings::RatingsMatrix;
use drugspace::scaling::MinMaxScaler;
use drugspace::EngineBuilder;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::hint::black_box;
use std::time::Duration;

fn make_ratings(n: usize, seed: u64) -> RatingsMatrix {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let ids: Vec<String> = (0..n).map(|i| format!("D{:05}", i)).collect();
    let rows: Vec<Vec<f64>> = (0..n)
        .map(|_| {
            (0..n)
                .map(|_| {
                    if rng.random::<f64>() < 0.8 {
                        0.0
                    } else {
                        rng.random_range(1.0..5.0)
                    }
                })
                .collect()
        })
        .collect();
    RatingsMatrix::new(ids.clone(), ids, rows).unwrap()
}

fn bench_training_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("autoencoder_fit_10_passes");
    group.measurement_time(Duration::from_secs(10));
    for &n in &[64usize, 256] {
        let ratings = make_ratings(n, 7);
        let scaled = MinMaxScaler::new().fit_transform(ratings.values());
        let config = AutoencoderConfig::for_input_width(n).with_seed(1).with_passes(10);
        group.bench_with_input(BenchmarkId::from_parameter(n), &scaled, |b, scaled| {
            b.iter_batched(
                || Autoencoder::new(config.clone()).unwrap(),
                |mut model| black_box(model.fit(scaled)),
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_end_to_end(c: &mut Criterion) {
    let ratings = make_ratings(128, 3);
    let builder = EngineBuilder::new().with_seed(3).with_report_every(0);
    c.bench_function("train_and_query_128", |b| {
        b.iter(|| {
            let table = builder.train(&ratings).unwrap();
            black_box(table.top_similar("D00000", 5).unwrap())
        })
    });
}

criterion_group!(benches, bench_training_pass, bench_end_to_end);
criterion_main!(benches);
