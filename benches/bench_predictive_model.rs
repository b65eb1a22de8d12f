use criterion::{
    black_box, criterion_group, criterion_main, AxisScale, BenchmarkId, Criterion,
    PlotConfiguration,
};

use fleet_intelligence::config::PredictionConfig;
use fleet_intelligence::flow_analyzer::predictive_model::{predict, rank_by_escalation, Prediction};
use fleet_intelligence::models::{VehicleId, VehicleSnapshot};

/// Generates `n` snapshots with spread-out carbon, speed and efficiency.
fn dummy_snapshots(n: usize) -> Vec<VehicleSnapshot> {
    (0..n)
        .map(|i| {
            let mut s = VehicleSnapshot::new(VehicleId::new(format!("V-{:04}", i)), 0);
            s.carbon_kg = (i % 50) as f64 * 8.0;
            s.avg_speed_kmh = 40.0 + (i % 10) as f64 * 8.0;
            s.fuel_efficiency = 2.0 + (i % 7) as f64;
            s
        })
        .collect()
}

fn bench_predict_and_rank(c: &mut Criterion) {
    let fleet_sizes = [10, 100, 1000];
    let config = PredictionConfig::default();

    let mut group = c.benchmark_group("Prediction_Benchmarks");
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Linear));

    for &size in fleet_sizes.iter() {
        let snapshots = dummy_snapshots(size);

        group.bench_with_input(BenchmarkId::new("predict_fleet", size), &size, |b, &_size| {
            b.iter(|| {
                let predictions: Vec<Prediction> = snapshots
                    .iter()
                    .map(|s| predict(black_box(s), 2, 35.0, &config))
                    .collect();
                black_box(predictions);
            });
        });

        let predictions: Vec<Prediction> = snapshots
            .iter()
            .map(|s| predict(s, 2, 35.0, &config))
            .collect();
        group.bench_with_input(BenchmarkId::new("rank_by_escalation", size), &size, |b, &_size| {
            b.iter(|| {
                let mut ranked = predictions.clone();
                rank_by_escalation(black_box(&mut ranked));
                black_box(ranked);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_predict_and_rank);
criterion_main!(benches);
