use criterion::{criterion_group, criterion_main, Criterion};
use ludex_core::normalize::normalize;

const SAMPLE: &str = "Halo Infinite is a first-person shooter developed by 343 Industries. \
The Master Chief returns in the most expansive Master Chief campaign yet, exploring the \
massive Zeta Halo ring. Open-world exploration, grappling hooks, and classic arena \
multiplayer across platforms. Released 2021, metascore 87.";

fn bench_normalize(c: &mut Criterion) {
    let text = SAMPLE.repeat(64);
    c.bench_function("normalize_build_mode", |b| b.iter(|| normalize(&text, false)));
    c.bench_function("normalize_query_mode", |b| b.iter(|| normalize(&text, true)));
}

criterion_group!(benches, bench_normalize);
criterion_main!(benches);
