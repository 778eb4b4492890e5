use criterion::{criterion_group, criterion_main, Criterion};
use rai_types::BlockHash;
use rai_work::{validate_work, WorkPool};

fn bench_validate(c: &mut Criterion) {
    let root = BlockHash::new([0xAB; 32]);
    c.bench_function("validate_work", |b| {
        b.iter(|| validate_work(std::hint::black_box(&root), 123456789, 0xFF00_0000_0000_0000))
    });
}

fn bench_generate(c: &mut Criterion) {
    let pool = WorkPool::new(0xFF00_0000_0000_0000);
    let root = BlockHash::new([0xCD; 32]);
    c.bench_function("generate_test_difficulty", |b| {
        b.iter(|| pool.generate(std::hint::black_box(&root)).unwrap())
    });
}

criterion_group!(benches, bench_validate, bench_generate);
criterion_main!(benches);
