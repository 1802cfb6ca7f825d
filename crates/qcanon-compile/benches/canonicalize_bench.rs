//! Benchmarks for operator canonicalization
//!
//! Run with: cargo bench -p qcanon-compile

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use qcanon_compile::{CanonicalizationConfig, canonicalize_with, normalize_math};
use qcanon_ir::{MathExpr, Operator};
use qcanon_parse::parse_math;

/// Pauli `p` on site `site` of an `n`-qubit chain, identity elsewhere.
fn on_site(p: &Operator, site: usize, n: usize) -> Operator {
    Operator::kron_chain((0..n).map(|i| if i == site { p.clone() } else { Operator::PauliI }))
        .unwrap()
}

/// Transverse-field Ising Hamiltonian written the long way round.
fn ising(n: usize) -> Operator {
    let zz = (0..n - 1).map(|i| {
        (on_site(&Operator::PauliZ, i, n) * on_site(&Operator::PauliZ, i + 1, n))
            .scale(MathExpr::var("J"))
    });
    let x = (0..n).map(|i| on_site(&Operator::PauliX, i, n).scale(MathExpr::var("h")));
    Operator::sum(zz.chain(x)).unwrap()
}

/// Qubit coupled to a mode, with `σ±` and an unordered ladder word.
fn jaynes_cummings() -> Operator {
    let omega = MathExpr::var("omega");
    let g = MathExpr::var("g");
    (Operator::PauliZ.kron(Operator::Identity)).scale(omega / MathExpr::real(2.0))
        + (Operator::PauliPlus.kron(Operator::Annihilation)
            + Operator::PauliMinus.kron(Operator::Creation))
        .scale(g)
        + Operator::PauliI.kron(Operator::Annihilation * Operator::Creation)
}

/// Benchmark the full pipeline on spin chains
fn bench_ising(c: &mut Criterion) {
    let mut group = c.benchmark_group("ising_chain");
    let config = CanonicalizationConfig::default();

    for n in &[2, 4, 6, 8] {
        let op = ising(*n);
        group.bench_with_input(BenchmarkId::new("canonicalize", n), &op, |b, op| {
            b.iter(|| canonicalize_with(black_box(op.clone()), &config).unwrap());
        });
    }

    group.finish();
}

/// Benchmark a mixed qubit/mode Hamiltonian
fn bench_jaynes_cummings(c: &mut Criterion) {
    let config = CanonicalizationConfig::default();
    let op = jaynes_cummings();
    c.bench_function("jaynes_cummings", |b| {
        b.iter(|| canonicalize_with(black_box(op.clone()), &config).unwrap());
    });
}

/// Benchmark coefficient normalization
fn bench_math(c: &mut Criterion) {
    let config = CanonicalizationConfig::default();
    let expr = parse_math("(a + b) * (a - b) * (2 + c) / 4 - a*a*c").unwrap();
    c.bench_function("normalize_math", |b| {
        b.iter(|| normalize_math(black_box(expr.clone()), &config).unwrap());
    });
}

criterion_group!(benches, bench_ising, bench_jaynes_cummings, bench_math);
criterion_main!(benches);
