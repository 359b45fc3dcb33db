//! Strata CLI
//!
//! Inspect the store files of a data directory and scan them at a read point.

use std::process;

use clap::{Parser, Subcommand};
use strata::record::Record;
use strata::{compare_scanners, Config, KeyValueScanner, RecordScanner, ScanOptions, StorageManager};
use tracing_subscriber::{fmt, EnvFilter};

/// Strata CLI
#[derive(Parser, Debug)]
#[command(name = "strata-cli")]
#[command(about = "Inspect and scan strata store files")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./strata_data")]
    data_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List store files, newest first
    Files,

    /// Print the records visible at a read point, merged across files
    Scan {
        /// Highest sequence number that is visible
        #[arg(long)]
        read_point: u64,

        /// Start row (forward) or row to scan back from (reverse)
        #[arg(long)]
        row: Option<String>,

        /// Scan rows in descending order
        #[arg(long)]
        reverse: bool,

        /// Maximum number of records to print
        #[arg(long, default_value = "100")]
        limit: usize,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,strata=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder().data_dir(&args.data_dir).build();
    let manager = match StorageManager::open(config) {
        Ok(m) => m,
        Err(e) => {
            tracing::error!("Failed to open storage: {}", e);
            process::exit(1);
        }
    };

    let result = match args.command {
        Commands::Files => {
            list_files(&manager);
            Ok(())
        }
        Commands::Scan {
            read_point,
            row,
            reverse,
            limit,
        } => scan(&manager, read_point, row, reverse, limit),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

fn list_files(manager: &StorageManager) {
    for file in manager.files() {
        let reader = file.reader();
        println!(
            "{:>6}  {}  entries={} seq={} bulk={} ts=[{}, {}] bloom={:?} bytes={}",
            file.id(),
            file.path().display(),
            reader.entry_count(),
            reader.sequence_id(),
            reader.is_bulk_loaded(),
            reader.min_timestamp(),
            reader.max_timestamp(),
            reader.bloom_type(),
            file.file_size()
        );
    }
    println!(
        "{} files, {} bytes",
        manager.file_count(),
        manager.total_size()
    );
}

/// Index of the scanner holding the smallest record, if any
fn smallest(scanners: &[RecordScanner]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, scanner) in scanners.iter().enumerate() {
        if scanner.peek().is_none() {
            continue;
        }
        best = match best {
            Some(b) if compare_scanners(&scanners[b], scanner).is_le() => Some(b),
            _ => Some(i),
        };
    }
    best
}

fn scan(
    manager: &StorageManager,
    read_point: u64,
    row: Option<String>,
    reverse: bool,
    limit: usize,
) -> strata::Result<()> {
    let mut scanners = manager.scanners(ScanOptions::default(), None, read_point);

    if !reverse {
        let start = Record::first_on_row(row.unwrap_or_default());
        for scanner in scanners.iter_mut() {
            scanner.seek(&start)?;
        }
        let mut printed = 0;
        while printed < limit {
            let Some(i) = smallest(&scanners) else { break };
            if let Some(record) = scanners[i].next()? {
                println!("{}  value={}", record, String::from_utf8_lossy(&record.value));
                printed += 1;
            }
        }
        return Ok(());
    }

    // Reverse: walk rows backwards, printing each row in forward order
    for scanner in scanners.iter_mut() {
        match &row {
            Some(r) => scanner.backward_seek(&Record::first_on_row(r.clone()))?,
            None => scanner.seek_to_last_row()?,
        };
    }
    let mut printed = 0;
    while printed < limit {
        // Largest current row across scanners is the next row to emit
        let Some(row) = scanners
            .iter()
            .filter_map(|s| s.peek().map(|r| r.row.clone()))
            .max()
        else {
            break;
        };
        let row_end = Record::last_on_row(row.clone());
        for scanner in scanners.iter_mut() {
            scanner.seek(&Record::first_on_row(row.clone()))?;
        }
        while printed < limit {
            let Some(i) = smallest(&scanners) else { break };
            let in_row = scanners[i]
                .peek()
                .is_some_and(|r| strata::record::compare_keys(r, &row_end).is_lt());
            if !in_row {
                break;
            }
            if let Some(record) = scanners[i].next()? {
                println!("{}  value={}", record, String::from_utf8_lossy(&record.value));
                printed += 1;
            }
        }
        let previous = Record::first_on_row(row);
        for scanner in scanners.iter_mut() {
            scanner.seek_to_previous_row(&previous)?;
        }
    }
    Ok(())
}
