use std::env;
use std::fs;
use std::hint::black_box;
use std::path::PathBuf;
use std::time::Instant;

use avlindex_core::{AvlCore, BstCore, GuardedTree, SearchTree};
use rand::Rng;

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct Output {
    implementation: &'static str,
    workload: String,
    timestamp: String,
    total_ops: u64,
    duration_ms: f64,
    ops_per_sec: f64,
    extra: Extra,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct Extra {
    count: u64,
    order: &'static str,
    depth: usize,
    lookup_us: f64,
}

fn ids(count: u64, sorted: bool) -> Vec<String> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| {
            let n = if sorted { i + 1 } else { rng.gen_range(1..999_999_999u64) };
            format!("{n:012}")
        })
        .collect()
}

fn run<C>(implementation: &'static str, order: &'static str, data: &[String]) -> Output
where
    C: SearchTree<Item = String>,
{
    let tree: GuardedTree<C> = GuardedTree::new();

    let start = Instant::now();
    tree.bulk_load(data.iter().cloned());
    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

    let lookup_us = match data.last() {
        Some(last) => {
            let start = Instant::now();
            black_box(tree.contains(black_box(last)));
            start.elapsed().as_secs_f64() * 1_000_000.0
        }
        None => 0.0,
    };

    let count = data.len() as u64;
    Output {
        implementation,
        workload: format!("bulk-load-{order}-{count}"),
        timestamp: chrono::Utc::now().to_rfc3339(),
        total_ops: count,
        duration_ms,
        ops_per_sec: if duration_ms > 0.0 {
            count as f64 / duration_ms * 1000.0
        } else {
            f64::INFINITY
        },
        extra: Extra {
            count,
            order,
            depth: tree.depth(),
            lookup_us,
        },
    }
}

fn main() {
    let mut count: u64 = 10_000;
    let mut out_file: Option<PathBuf> = None;
    for arg in env::args().skip(1) {
        if let Some(val) = arg.strip_prefix("--count=") {
            count = val.parse().unwrap_or(count);
        } else if let Some(val) = arg.strip_prefix("--out=") {
            out_file = Some(PathBuf::from(val));
        }
    }

    let mut outputs = Vec::new();
    for (order, sorted) in [("sorted", true), ("random", false)] {
        let data = ids(count, sorted);
        outputs.push(run::<AvlCore<String>>("avl", order, &data));
        outputs.push(run::<BstCore<String>>("bst", order, &data));
    }

    let json = serde_json::to_string_pretty(&outputs).expect("serialize");
    if let Some(path) = out_file {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdirs");
        }
        fs::write(&path, &json).expect("write output");
    }
    println!("{}", json);
}
