use criterion::{black_box, criterion_group, criterion_main, Criterion};

use irtdeck_core::grm::{evaluate_item, item_information, logistic};
use irtdeck_core::model::{EvaluationGrid, ItemSpec};
use irtdeck_core::presets::cladribine_edss;
use irtdeck_core::statistics::evaluate_battery;

fn bench_logistic(c: &mut Criterion) {
    let mut group = c.benchmark_group("logistic");

    group.bench_function("moderate", |b| b.iter(|| logistic(black_box(1.25))));
    group.bench_function("clamped", |b| b.iter(|| logistic(black_box(-800.0))));

    let thresholds = [-1.55, -0.302, 0.516, 1.944, 3.257];
    group.bench_function("item_information_5", |b| {
        b.iter(|| item_information(black_box(3.172), black_box(&thresholds), black_box(0.4)))
    });

    group.finish();
}

fn bench_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluation");

    let params = cladribine_edss().expect("preset parses");
    let ambulation = ItemSpec::new(
        "Ambulation",
        vec![1.133, 0.244, 0.225, 0.423, 0.448, 0.484, 0.139, 0.261, 0.351],
        3.64,
        10,
    )
    .expect("valid item");

    for points in [200usize, 2_000, 20_000] {
        let grid = EvaluationGrid::linspace(-3.0, 6.0, points).expect("valid grid");

        group.bench_function(format!("ambulation_{points}"), |b| {
            b.iter(|| evaluate_item(black_box(&ambulation), black_box(&grid)))
        });

        group.bench_function(format!("battery_{points}"), |b| {
            b.iter(|| evaluate_battery(black_box(&params.items), black_box(&grid)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_logistic, bench_evaluation);
criterion_main!(benches);
