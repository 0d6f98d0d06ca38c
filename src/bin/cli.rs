//! MemStore CLI
//!
//! Loads synthetic rows into a memstore and exercises the write, scan and
//! snapshot paths from the command line.

use std::cmp::Ordering;

use clap::{Parser, Subcommand};
use region_memstore::memstore::compare_scanners;
use region_memstore::{Config, MemStore, Mutation, RowScanner, ScanRequest, SchemaPolicy};
use tracing_subscriber::{fmt, EnvFilter};

/// MemStore CLI
#[derive(Parser, Debug)]
#[command(name = "memstore-cli")]
#[command(about = "Drive a region memstore with synthetic rows")]
#[command(version)]
struct Args {
    /// Number of rows to load (keys are zero-padded to 7 digits)
    #[arg(short, long, default_value = "50")]
    rows: usize,

    /// Column family of the loaded cells
    #[arg(short, long, default_value = "cf")]
    family: String,

    /// Reject malformed read schemas instead of scanning unfiltered
    #[arg(long)]
    strict_schema: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan rows, optionally projecting columns
    Scan {
        /// First row to return
        #[arg(short, long)]
        start_row: Option<String>,

        /// Qualifiers to project (repeatable)
        #[arg(short, long)]
        column: Vec<String>,

        /// Snapshot half of the rows first, so the scan merges two maps
        #[arg(long)]
        split: bool,
    },

    /// Snapshot the loaded rows and report what a flush would write
    Snapshot,

    /// Log every buffered row
    Dump,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,region_memstore=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("MemStore CLI v{}", region_memstore::VERSION);

    let policy = if args.strict_schema {
        SchemaPolicy::Reject
    } else {
        SchemaPolicy::FailOpen
    };
    let config = Config::builder().schema_policy(policy).build();

    let memstore = match MemStore::new(config) {
        Ok(m) => m,
        Err(e) => {
            tracing::error!("Failed to create memstore: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&memstore, &args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(memstore: &MemStore, args: &Args) -> region_memstore::Result<()> {
    let split_at = match &args.command {
        Commands::Scan { split: true, .. } => args.rows / 2,
        _ => args.rows,
    };

    for i in 1..=split_at {
        memstore.add(people_row(i, &args.family))?;
    }

    match &args.command {
        Commands::Scan {
            start_row,
            column,
            split,
        } => {
            if *split {
                // leave the snapshot pending so the scan sees both maps
                let _pending = memstore.snapshot();
                for i in split_at + 1..=args.rows {
                    memstore.add(people_row(i, &args.family))?;
                }
            }

            let mut scan = ScanRequest::new();
            if !column.is_empty() {
                scan = scan.with_read_schema(people_schema(&args.family, column));
            }
            let start = start_row.as_deref().unwrap_or("").as_bytes();
            let scanners = memstore.scanners(start, &scan)?;
            print_merged(scanners);
        }
        Commands::Snapshot => {
            let flushable = memstore.flushable_size();
            match memstore.snapshot() {
                Some(snapshot) => {
                    println!(
                        "snapshot {}: {} rows, {} bytes (flushable {}), range {:?}..={:?}",
                        snapshot.id(),
                        snapshot.record_count(),
                        snapshot.size(),
                        flushable,
                        snapshot.start_key().map(|k| String::from_utf8_lossy(k).into_owned()),
                        snapshot.end_key().map(|k| String::from_utf8_lossy(k).into_owned()),
                    );
                    memstore.clear_snapshot(snapshot.id())?;
                }
                None => println!("snapshot already pending"),
            }
        }
        Commands::Dump => memstore.dump(),
    }

    Ok(())
}

fn people_row(i: usize, family: &str) -> Mutation {
    Mutation::put(format!("{:07}", i))
        .with_column(family.to_string(), "name", format!("name{}", i))
        .with_column(family.to_string(), "age", i.to_string())
        .with_column(family.to_string(), "job", format!("student{}", i))
}

fn people_schema(family: &str, columns: &[String]) -> String {
    let mut schema = String::from("message people { required binary rowkey; ");
    for c in columns {
        schema.push_str(&format!("required binary {}:{}; ", family, c));
    }
    schema.push('}');
    schema
}

/// Print rows from all scanners in key order; on equal keys the later
/// scanner (the active map) wins.
fn print_merged(mut scanners: Vec<RowScanner>) {
    loop {
        let mut winner: Option<usize> = None;
        for (i, s) in scanners.iter().enumerate() {
            if !s.has_next() {
                continue;
            }
            winner = match winner {
                Some(w) if compare_scanners(s, &scanners[w]) == Ordering::Greater => Some(w),
                _ => Some(i),
            };
        }
        let Some(w) = winner else { break };

        // drop the same row from older scanners
        let row = scanners[w].current_row().map(<[u8]>::to_vec);
        for (i, s) in scanners.iter_mut().enumerate() {
            if i != w && s.current_row() == row.as_deref() {
                s.next();
            }
        }

        if let Some(cells) = scanners[w].next() {
            let line: Vec<String> = cells
                .iter()
                .map(|c| {
                    format!(
                        "{}={}",
                        String::from_utf8_lossy(c.qualifier()),
                        String::from_utf8_lossy(c.value())
                    )
                })
                .collect();
            println!(
                "{}\t{}",
                String::from_utf8_lossy(row.as_deref().unwrap_or_default()),
                line.join("\t")
            );
        }
    }
}
