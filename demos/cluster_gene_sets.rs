//! Compares a small collection of gene sets with all built-in metrics
//!
//! Usage:
//!
//! ```text
//! cargo run --example cluster_gene_sets [/path/to/biogrid.mitab.txt]
//! ```
//!
//! Without a MITAB file, a tiny built-in interaction network is used.
//! Set `RUST_LOG=debug` to see what the metrics are doing.
use std::fs::File;
use std::io::{BufRead, BufReader};

use rayon::prelude::*;

use gsd::distance::benchmark::RandomDistanceMetric;
use gsd::distance::calc_pairwise_distances_with;
use gsd::distance::ppi::{DirectPpiDistanceMetric, PathAggregation, PpiPathDistanceMetric};
use gsd::distance::set::{FreqDistanceMetric, SetDistanceMetric};
use gsd::distance::tree::TreePathDistanceMetric;
use gsd::evaluation::evaluate_all;
use gsd::gene_set::GeneAnnotation;
use gsd::{Condensed, DistanceMetric, GeneSet, Hierarchy, InteractionRow, InteractionTable};

/// Reads columns 1, 2, 10 and 11 of a PSI-MITAB file
fn read_mitab(path: &str) -> InteractionTable {
    let reader = BufReader::new(File::open(path).unwrap());
    reader
        .lines()
        .skip(1)
        .map(|line| line.unwrap())
        .filter_map(|line| {
            let cols: Vec<&str> = line.split('\t').collect();
            InteractionRow::from_mitab_fields(cols[0], cols[1], cols[9], cols[10]).ok()
        })
        .collect()
}

fn builtin_interactions() -> InteractionTable {
    [
        (8908u32, 2997u32),
        (2997, 2998),
        (2998, 5507),
        (5507, 2992),
        (925, 926),
        (926, 930),
        (930, 2992),
    ]
    .into_iter()
    .map(|(a, b)| InteractionRow::new(a, b).with_taxa(9606, 9606))
    .collect()
}

fn anno(traits: &[&str]) -> GeneAnnotation {
    GeneAnnotation {
        traits: traits.iter().map(|t| (*t).to_string()).collect(),
        description: None,
    }
}

fn gene_sets() -> Vec<GeneSet> {
    vec![
        GeneSet::new("Glycogen synthesis", [8908u32, 2998, 2997])
            .with_symbols(["GYG2", "GYS2", "GYS1"])
            .with_annotation(2997u32, anno(&["glycogen storage disease"])),
        GeneSet::new("Glycogen metabolism", [5507u32, 8908, 2998])
            .with_symbols(["PPP1R3C", "GYG2", "GYS2"])
            .with_annotation(2998u32, anno(&["glycogen storage disease", "BMI"])),
        GeneSet::new("Glycogen breakdown", [2998u32, 2997, 2992])
            .with_symbols(["GYS2", "GYS1", "GYG1"]),
        GeneSet::new("T cell", [925u32, 926])
            .with_symbols(["CD8A", "CD8B"])
            .with_annotation(925u32, anno(&["asthma"])),
        GeneSet::new("B cell", [930u32]).with_symbols(["CD19"]),
    ]
}

fn hierarchy() -> Hierarchy {
    let mut tree = Hierarchy::new("Metabolism");
    tree.add_child("Metabolism", "Glycogen metabolism").unwrap();
    tree.add_child("Glycogen metabolism", "Glycogen synthesis").unwrap();
    tree.add_child("Glycogen metabolism", "Glycogen breakdown").unwrap();
    tree.add_child("Metabolism", "Immune system").unwrap();
    tree.add_child("Immune system", "T cell").unwrap();
    tree.add_child("Immune system", "B cell").unwrap();
    tree
}

fn print_matrix(names: &[&str], distances: &Condensed) {
    let square = distances.to_square();
    for (name, row) in names.iter().zip(square.rows()) {
        let values: Vec<String> = row.iter().map(|v| format!("{v:>6.3}")).collect();
        println!("{name:>20} {}", values.join(" "));
    }
}

fn main() {
    simple_logger::init_with_env().unwrap();

    let mut args = std::env::args();
    let mut interactions = match args.nth(1) {
        Some(path) => read_mitab(&path),
        None => builtin_interactions(),
    };
    interactions.retain_taxon(9606);

    let tree = hierarchy();
    let sets = tree
        .propagate_gene_sets(&gene_sets())
        .unwrap()
        .into_iter()
        .filter(|set| !set.genes().is_empty())
        .collect::<Vec<GeneSet>>();
    let names: Vec<&str> = sets.iter().map(GeneSet::name).collect();

    let metrics: Vec<Box<dyn DistanceMetric>> = vec![
        Box::new(SetDistanceMetric::jaccard()),
        Box::new(SetDistanceMetric::minkowski(2.0).unwrap()),
        Box::new(SetDistanceMetric::kappa()),
        Box::new(SetDistanceMetric::overlap()),
        Box::new(FreqDistanceMetric::cosine_over_traits()),
        Box::new(PpiPathDistanceMetric::new(&interactions).unwrap()),
        Box::new(
            PpiPathDistanceMetric::new(&interactions)
                .unwrap()
                .with_aggregation(PathAggregation::BestPair),
        ),
        Box::new(DirectPpiDistanceMetric::new(&interactions).unwrap()),
        Box::new(TreePathDistanceMetric::new(&tree).unwrap()),
        Box::new(RandomDistanceMetric::seeded(42)),
    ];

    for eval in evaluate_all(&metrics, &sets).unwrap() {
        println!("{} ({:?})", eval.metric_name(), eval.duration());
        print_matrix(&names, eval.results());
        println!();
    }

    // The same path distances, calculated in parallel
    let ppi = PpiPathDistanceMetric::new(&interactions).unwrap();
    let indices: Vec<Vec<usize>> = sets.iter().map(|set| ppi.gene_indices(set)).collect();
    let parallel = calc_pairwise_distances_with(&indices, |combs| {
        let pairs: Vec<(usize, (&Vec<usize>, &Vec<usize>))> = combs.collect();
        pairs
            .par_iter()
            .map(|(pos, (a, b))| (*pos, ppi.path_distance(a, b)))
            .collect()
    })
    .unwrap();
    println!("PPI path distance (parallel)");
    print_matrix(&names, &Condensed::new(sets.len(), parallel).unwrap());
}
