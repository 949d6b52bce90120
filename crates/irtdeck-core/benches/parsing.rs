use criterion::{black_box, criterion_group, criterion_main, Criterion};

use irtdeck_core::parser::{parse_model_str, validate_parameters};
use irtdeck_core::presets::CLADRIBINE_EDSS_TOML;

fn bench_toml_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("toml_parsing");

    // Generate model TOML strings with batteries of various sizes
    let small_toml = generate_model_toml(8);
    let medium_toml = generate_model_toml(80);
    let large_toml = generate_model_toml(400);

    group.bench_function("preset", |b| {
        b.iter(|| {
            parse_model_str(
                black_box(CLADRIBINE_EDSS_TOML),
                black_box("bench.toml".as_ref()),
            )
        })
    });

    group.bench_function("8_items", |b| {
        b.iter(|| parse_model_str(black_box(&small_toml), black_box("bench.toml".as_ref())))
    });

    group.bench_function("80_items", |b| {
        b.iter(|| parse_model_str(black_box(&medium_toml), black_box("bench.toml".as_ref())))
    });

    group.bench_function("400_items", |b| {
        b.iter(|| parse_model_str(black_box(&large_toml), black_box("bench.toml".as_ref())))
    });

    group.finish();
}

fn bench_validation(c: &mut Criterion) {
    let params = parse_model_str(&generate_model_toml(400), "bench.toml".as_ref())
        .expect("generated model parses");

    c.bench_function("validate_400_items", |b| {
        b.iter(|| validate_parameters(black_box(&params)))
    });
}

fn generate_model_toml(n: usize) -> String {
    let mut s = String::new();
    s.push_str(
        r#"[model]
id = "bench"
title = "Benchmark"

[progression]
slope = 0.1
power = 0.7

[drug_effect]
emax = 0.2
ec50 = 400.0
protective = 0.2

[random_effects]
names = ["Disability", "Slope"]
variances = [1.0, 0.2]

[[random_effects.correlations]]
first = "Disability"
second = "Slope"
value = 0.1
"#,
    );
    for i in 0..n {
        let slope = 0.5 + (i % 7) as f64 * 0.4;
        s.push_str(&format!(
            r#"
[[items]]
name = "item_{i}"
boundaries = [-1.0, 0.8, 0.6, 1.1, 0.9]
slope = {slope}
max_score = 6
"#
        ));
    }
    s
}

criterion_group!(benches, bench_toml_parsing, bench_validation);
criterion_main!(benches);
