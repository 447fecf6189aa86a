//! Benchmarks for filter performance

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use head_anchor::filters::{
    exponential::ExponentialSmoother, slerp::SlerpSmoother, ChannelTargets, PoseFilters, Smoother,
};
use nalgebra::{UnitQuaternion, Vector3};

fn benchmark_filters(c: &mut Criterion) {
    let mut group = c.benchmark_group("filters");

    // Test data - simulating noisy head motion
    let positions: Vec<Vector3<f64>> = (0..100)
        .map(|i| {
            let t = f64::from(i) * 0.1;
            Vector3::new(
                200.0 * t.sin() + 2.0 * rand::random::<f64>(),
                80.0 * t.cos() + 2.0 * rand::random::<f64>(),
                0.0,
            )
        })
        .collect();
    let orientations: Vec<UnitQuaternion<f64>> = (0..100)
        .map(|i| {
            let t = f64::from(i) * 0.1;
            UnitQuaternion::from_euler_angles(
                0.1 * t.sin() + 0.01 * rand::random::<f64>(),
                0.2 * t.cos(),
                0.8 * t.sin() + 0.01 * rand::random::<f64>(),
            )
        })
        .collect();

    for alpha in [0.2, 0.35, 0.8] {
        group.bench_with_input(BenchmarkId::new("scalar_sequence_100", alpha), &positions, |b, data| {
            let mut filter = ExponentialSmoother::new(1.0);
            b.iter(|| {
                filter.reset(1.0);
                for p in data {
                    black_box(filter.update(black_box(&p.x), alpha));
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("vector_sequence_100", alpha), &positions, |b, data| {
            let mut filter = ExponentialSmoother::new(Vector3::zeros());
            b.iter(|| {
                filter.reset(Vector3::zeros());
                for p in data {
                    black_box(filter.update(black_box(p), alpha));
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("slerp_sequence_100", alpha), &orientations, |b, data| {
            let mut filter = SlerpSmoother::default();
            b.iter(|| {
                filter.reset(UnitQuaternion::identity());
                for q in data {
                    black_box(filter.update(black_box(q), alpha));
                }
            });
        });
    }

    group.finish();
}

fn benchmark_filter_bundle(c: &mut Criterion) {
    let targets = ChannelTargets {
        position: Vector3::new(120.0, -40.0, 0.0),
        orientation: UnitQuaternion::from_euler_angles(0.2, -0.6, 0.1),
        scale: 1.8,
        compensation: 1.4,
        roll_correction: -6.0,
    };

    c.bench_function("pose_filters_update", |b| {
        let mut filters = PoseFilters::default();
        b.iter(|| {
            filters.position.update(black_box(&targets.position), 0.35);
            filters.orientation.update(black_box(&targets.orientation), 0.35);
            filters.scale.update(black_box(&targets.scale), 0.35);
            filters.compensation.update(black_box(&targets.compensation), 0.2);
            filters.roll_correction.update(black_box(&targets.roll_correction), 0.2);
        });
    });
}

criterion_group!(benches, benchmark_filters, benchmark_filter_bundle);
criterion_main!(benches);
