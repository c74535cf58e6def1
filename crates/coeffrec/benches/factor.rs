//! Factorization benchmarks over Z/pZ.
//!
//! ```bash
//! cargo bench -p coeffrec --bench factor
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use coeffrec::poly::{distinct_degree, factor, square_free_decomposition, Poly};
use rand::rngs::StdRng;
use rand::SeedableRng;

const PRIME: u64 = 1_000_003;

fn random_monic(degree: usize, rng: &mut StdRng) -> Poly {
    &Poly::random(PRIME, degree, rng) + &Poly::monomial(PRIME, 1, degree)
}

/// Product of `count` random monic polynomials of `degree`, one of them
/// squared so the square-free stage has work to do.
fn product(count: usize, degree: usize, seed: u64) -> Poly {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut acc = Poly::one(PRIME);
    for i in 0..count {
        let f = random_monic(degree, &mut rng);
        acc = &acc * &f;
        if i == 0 {
            acc = &acc * &f;
        }
    }
    acc
}

fn bench_factor(c: &mut Criterion) {
    let mut group = c.benchmark_group("factor");
    for &(count, degree) in &[(4, 2), (8, 2), (4, 4), (6, 5)] {
        let f = product(count, degree, 7);
        let label = format!("{count}x{degree}");
        group.bench_with_input(BenchmarkId::new("full", &label), &f, |b, f| {
            b.iter(|| factor(black_box(f), 0))
        });
        group.bench_with_input(BenchmarkId::new("square_free", &label), &f, |b, f| {
            b.iter(|| square_free_decomposition(black_box(f)))
        });
    }
    group.finish();
}

fn bench_distinct_degree(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(3);
    let f = random_monic(24, &mut rng);
    c.bench_function("distinct_degree/24", |b| b.iter(|| distinct_degree(black_box(&f))));
}

criterion_group!(benches, bench_factor, bench_distinct_degree);
criterion_main!(benches);
