//! Benchmarks for sequential vs parallel extraction

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use feature_engine::FeatureExtractor;
use ndarray::Array3;

const SFREQ: f64 = 256.0;
const FREQ_BANDS: [f64; 6] = [0.1, 4.0, 8.0, 12.0, 30.0, 70.0];

/// Sinusoids with pseudo-noise, one phase per channel
fn generate_epochs(n_epochs: usize, n_channels: usize, n_times: usize) -> Array3<f64> {
    use std::f64::consts::PI;

    Array3::from_shape_fn((n_epochs, n_channels, n_times), |(e, c, t)| {
        let t = t as f64 / SFREQ;
        let signal = (2.0 * PI * 10.0 * t + c as f64).sin();
        let noise = ((e * 31 + c * 17) as f64 + t * 123.0).sin() * 0.3;
        (signal + noise) * 50.0
    })
}

fn bench_spectral_battery(c: &mut Criterion) {
    let mut group = c.benchmark_group("spectral_battery");
    let data = generate_epochs(32, 16, 512);

    for n_jobs in [1, 2, -1] {
        let extractor = FeatureExtractor::new(SFREQ, FREQ_BANDS)
            .with_funcs(["pow_freq_bands", "spect_entropy", "spect_edge_freq", "spect_slope"])
            .with_n_jobs(n_jobs);

        group.bench_with_input(BenchmarkId::from_parameter(n_jobs), &n_jobs, |b, _| {
            b.iter(|| black_box(extractor.extract(black_box(data.view()))))
        });
    }

    group.finish();
}

fn bench_complexity_battery(c: &mut Criterion) {
    let mut group = c.benchmark_group("complexity_battery");
    group.sample_size(10);
    let data = generate_epochs(16, 8, 512);

    for n_jobs in [1, -1] {
        let extractor = FeatureExtractor::new(SFREQ, FREQ_BANDS)
            .with_funcs(["higuchi_fd", "katz_fd", "svd_entropy", "samp_entropy", "hurst_exp"])
            .with_n_jobs(n_jobs);

        group.bench_with_input(BenchmarkId::from_parameter(n_jobs), &n_jobs, |b, _| {
            b.iter(|| black_box(extractor.extract(black_box(data.view()))))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_spectral_battery, bench_complexity_battery);
criterion_main!(benches);
