use std::hint::black_box;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use avlindex_core::{AvlCore, BstCore, GuardedTree, SearchTree};
use avlindex_registry::{citizen, csv, open, Citizen, Registry, RegistryConfig};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "avlindex")]
#[command(about = "Citizen registry backed by a balanced search tree", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scripted walk through insert, search, update, remove, range, paging and persistence
    Demo,

    /// Load the AVL and unbalanced engines with the same ids and compare them
    Bench {
        /// Records per run; repeat for several sizes (defaults to the config)
        #[arg(short = 'n', long = "count")]
        counts: Vec<usize>,

        #[arg(short, long, value_enum, default_value_t = Order::Both)]
        order: Order,
    },

    /// Read citizens from a CSV file into the snapshot
    Import {
        csv: PathBuf,
    },

    /// Write the snapshot out as CSV
    Export {
        csv: PathBuf,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Order {
    Sorted,
    Random,
    Both,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = RegistryConfig::load(cli.config.as_deref()).context("loading config")?;

    match cli.command {
        Commands::Demo => demo(&config),
        Commands::Bench { counts, order } => {
            let counts = if counts.is_empty() {
                config.bench.sizes.clone()
            } else {
                counts
            };
            bench(&counts, order);
            Ok(())
        }
        Commands::Import { csv } => import(&config, &csv),
        Commands::Export { csv } => export(&config, &csv),
    }
}

fn ms(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64() * 1000.0
}

fn section(title: &str) {
    println!("-------------------------------------------------");
    println!(" {title}");
    println!("-------------------------------------------------");
}

fn add(registry: &Registry, id: &str, name: &str, sex: &str, born: &str) {
    let Ok(birth_date) = NaiveDate::parse_from_str(born, "%Y-%m-%d") else {
        println!("[-] bad birth date {born} (expected yyyy-mm-dd)");
        return;
    };
    let start = Instant::now();
    match registry.insert(Citizen::new(id, name, sex, birth_date)) {
        Ok(true) => println!("[+] added {id} in {:.4} ms", ms(start.elapsed())),
        Ok(false) => println!("[=] {id} already registered, kept the existing record"),
        Err(err) => println!("[-] {err}"),
    }
}

fn search(registry: &Registry, id: &str) {
    let start = Instant::now();
    let found = registry.find(&Citizen::key(id));
    let elapsed = ms(start.elapsed());
    match found {
        Some(citizen) => println!("=> found {citizen} ({elapsed:.4} ms)"),
        None => println!("=> {id} not found ({elapsed:.4} ms)"),
    }
}

fn demo(config: &RegistryConfig) -> Result<()> {
    let registry = open(config).context("opening registry")?;
    println!("audit log: {}", config.audit_log.display());

    section("seed data");
    add(&registry, "0850$@#@##01", "Hacker", "M", "1990-01-01");
    add(&registry, "085001000000", "Nguyen Van An", "M", "1990-01-01");
    add(&registry, "072234234002", "Tran Thi Bich", "F", "1995-05-20");
    add(&registry, "061002234243", "Le Van Cuong", "M", "1988-12-10");

    section("search");
    search(&registry, "085001000000");

    section("insert and duplicate insert");
    add(&registry, "099123456789", "Pham Van Moi", "M", "1999-09-09");
    add(&registry, "099123456789", "Lu Vo Hoang Phuc", "M", "2000-01-01");
    search(&registry, "099123456789");

    section("search miss");
    search(&registry, "999999999999");

    section("update");
    let moved = Citizen::new(
        "072234234099",
        "Tran Thi Bich",
        "F",
        NaiveDate::from_ymd_opt(1995, 5, 20).context("fixed date")?,
    );
    match registry.update(&Citizen::key("072234234002"), moved) {
        Ok(true) => println!("=> 072234234002 re-registered as 072234234099"),
        Ok(false) => println!("=> 072234234002 not found"),
        Err(err) => println!("=> update refused: {err}"),
    }

    section("remove");
    let start = Instant::now();
    match registry.remove(&Citizen::key("061002234243")) {
        Some(c) => println!("=> removed {c} in {:.4} ms", ms(start.elapsed())),
        None => println!("=> 061002234243 not found"),
    }
    search(&registry, "061002234243");

    section("sorted report");
    let start = Instant::now();
    let report = registry.sorted_snapshot();
    let elapsed = ms(start.elapsed());
    for citizen in &report {
        println!("{citizen}");
    }
    println!("({} records in-order in {elapsed:.4} ms)", report.len());

    section("range and paging");
    for c in registry.range_query(&Citizen::key("080000000000"), &Citizen::key("099999999999")) {
        println!("range: {c}");
    }
    for (i, c) in registry.page(1, 2).into_iter().enumerate() {
        println!("page 1 #{i}: {c}");
    }

    section("persistence");
    let key = config.snapshot_key()?;
    registry.save(&config.snapshot_path, &key)?;
    let before = registry.len();
    registry.load(&config.snapshot_path, &key)?;
    println!(
        "=> saved and reloaded {} ({} -> {} records)",
        config.snapshot_path.display(),
        before,
        registry.len()
    );
    registry.validate_invariants()?;
    Ok(())
}

fn run<C: SearchTree<Item = Citizen>>(label: &str, data: &[Citizen]) {
    let tree: GuardedTree<C> = GuardedTree::new();
    let start = Instant::now();
    let report = tree.bulk_load(data.iter().cloned());
    let insert_ms = ms(start.elapsed());

    let lookup_ms = data
        .last()
        .map(|last| {
            let start = Instant::now();
            black_box(tree.contains(black_box(last)));
            ms(start.elapsed())
        })
        .unwrap_or_default();

    println!(
        " -> {label:<14} insert {insert_ms:>10.2} ms | worst-case search {lookup_ms:>8.4} ms | depth {:>6} | {} stored, {} duplicates",
        tree.depth(),
        report.inserted,
        report.duplicates
    );
}

fn bench(counts: &[usize], order: Order) {
    for &count in counts {
        section(&format!("benchmark: {count} records"));
        if matches!(order, Order::Random | Order::Both) {
            let data = citizen::generate(count, false);
            run::<BstCore<Citizen>>("BST (random)", &data);
            run::<AvlCore<Citizen>>("AVL (random)", &data);
        }
        if matches!(order, Order::Sorted | Order::Both) {
            let data = citizen::generate(count, true);
            run::<AvlCore<Citizen>>("AVL (sorted)", &data);
            run::<BstCore<Citizen>>("BST (sorted)", &data);
        }
    }
}

fn import(config: &RegistryConfig, path: &Path) -> Result<()> {
    let registry = open(config).context("opening registry")?;
    let imported = csv::import(path).with_context(|| format!("reading {}", path.display()))?;
    for row in &imported.malformed {
        tracing::warn!(line = row.line, reason = %row.reason, "skipped malformed row");
    }
    let report = registry.bulk_load(imported.citizens);
    registry
        .save(&config.snapshot_path, &config.snapshot_key()?)
        .context("saving snapshot")?;
    println!(
        "imported {} ({} duplicates, {} rejected, {} malformed); registry now holds {}",
        report.inserted,
        report.duplicates,
        report.rejected,
        imported.malformed.len(),
        registry.len()
    );
    Ok(())
}

fn export(config: &RegistryConfig, path: &Path) -> Result<()> {
    let registry = open(config).context("opening registry")?;
    let citizens = registry.sorted_snapshot();
    csv::export(path, &citizens).with_context(|| format!("writing {}", path.display()))?;
    println!("exported {} records to {}", citizens.len(), path.display());
    Ok(())
}
