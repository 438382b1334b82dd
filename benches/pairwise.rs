use std::iter::Enumerate;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use gsd::distance::calc_pairwise_distances_with;
use gsd::distance::ppi::PpiPathDistanceMetric;
use gsd::distance::set::SetDistanceMetric;
use gsd::utils::Combinations;
use gsd::{DistanceMetric, GeneSet, InteractionRow, InteractionTable};

const N_GENES: u32 = 5_000;

fn gene_sets(rng: &mut StdRng, n: usize) -> Vec<GeneSet> {
    (0..n)
        .map(|i| {
            let size = rng.random_range(5..100);
            let genes: Vec<u32> = (0..size).map(|_| rng.random_range(0..N_GENES)).collect();
            GeneSet::new(&format!("set {i}"), genes)
        })
        .collect()
}

fn interactions(rng: &mut StdRng, n: usize) -> InteractionTable {
    (0..n)
        .map(|_| InteractionRow::new(rng.random_range(0..N_GENES), rng.random_range(0..N_GENES)))
        .collect()
}

fn ppi_parallel(metric: &PpiPathDistanceMetric, sets: &[GeneSet]) -> Vec<f64> {
    let indices: Vec<Vec<usize>> = sets.iter().map(|s| metric.gene_indices(s)).collect();
    calc_pairwise_distances_with(&indices, |combs: Enumerate<Combinations<'_, Vec<usize>>>| {
        combs
            .par_bridge()
            .map(|(pos, (a, b))| (pos, metric.path_distance(a, b)))
            .collect()
    })
    .unwrap()
}

fn set_benchmark(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let sets = gene_sets(&mut rng, 200);

    let jaccard = SetDistanceMetric::jaccard();
    c.bench_function("jaccard 200", |b| {
        b.iter(|| jaccard.calc(black_box(&sets)).unwrap())
    });

    let kappa = SetDistanceMetric::kappa();
    c.bench_function("kappa 200", |b| {
        b.iter(|| kappa.calc(black_box(&sets)).unwrap())
    });
}

fn ppi_benchmark(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let sets = gene_sets(&mut rng, 50);
    let metric = PpiPathDistanceMetric::new(&interactions(&mut rng, 20_000)).unwrap();

    c.bench_function("ppi path 50", |b| {
        b.iter(|| metric.calc(black_box(&sets)).unwrap())
    });

    c.bench_function("ppi path-parallel 50", |b| {
        b.iter(|| ppi_parallel(black_box(&metric), black_box(&sets)))
    });
}

criterion_group!(pairwise, set_benchmark, ppi_benchmark);
criterion_main!(pairwise);
