//! flagdb command line: inspect and maintain fixed-record files.
//!
//! Run: cargo run --bin flagdb -- --width 8 dump ./ids.fdb
//!
//! Log verbosity comes from `FLAGDB_LOG` (default `warn`).

use std::ops::ControlFlow;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use flagdb::{FixDb, FixDbConfig, FlagError};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "flagdb", version, about = "Fixed-record sorted file store")]
struct Cli {
    /// Payload width in bytes (must match the width the file was written with)
    #[arg(long, global = true, default_value_t = flagdb::config::DEFAULT_PAYLOAD_WIDTH)]
    width: usize,

    /// Read/write the width from `<file>.json`, creating it if absent
    #[arg(long, global = true)]
    sidecar: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the record count
    Size { path: PathBuf },
    /// Print the payload stored under a key
    Get {
        path: PathBuf,
        #[arg(allow_negative_numbers = true)]
        key: i64,
    },
    /// Append a record at the end (file is unsorted until `sort`)
    Put {
        path: PathBuf,
        #[arg(allow_negative_numbers = true)]
        key: i64,
        payload: String,
    },
    /// Insert a record at its sorted position
    Insert {
        path: PathBuf,
        #[arg(allow_negative_numbers = true)]
        key: i64,
        payload: String,
    },
    /// Replace the payload of an existing key
    Update {
        path: PathBuf,
        #[arg(allow_negative_numbers = true)]
        key: i64,
        payload: String,
    },
    /// Sort the file by key
    Sort { path: PathBuf },
    /// Print records in file order
    Dump {
        path: PathBuf,
        /// Stop after this many records
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Report record count and whether keys are sorted
    Check { path: PathBuf },
}

impl Command {
    fn path(&self) -> &PathBuf {
        match self {
            Command::Size { path }
            | Command::Get { path, .. }
            | Command::Put { path, .. }
            | Command::Insert { path, .. }
            | Command::Update { path, .. }
            | Command::Sort { path }
            | Command::Dump { path, .. }
            | Command::Check { path } => path,
        }
    }
}

/// Zero-pad a command-line payload to the store width.
fn pad_payload(payload: &str, width: usize) -> anyhow::Result<Vec<u8>> {
    let bytes = payload.as_bytes();
    if bytes.len() > width {
        bail!(
            "payload is {} bytes, store width is {}",
            bytes.len(),
            width
        );
    }
    let mut padded = bytes.to_vec();
    padded.resize(width, 0);
    Ok(padded)
}

/// Printable form of a payload: trailing zero padding dropped.
fn show_payload(payload: &[u8]) -> String {
    let end = payload.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    String::from_utf8_lossy(&payload[..end]).into_owned()
}

fn open(cli: &Cli) -> anyhow::Result<FixDb> {
    let path = cli.command.path();
    let config = FixDbConfig::new(cli.width);
    let db = if cli.sidecar {
        FixDb::open_with_sidecar(path, config)
    } else {
        FixDb::open_with(path, config)
    };
    db.with_context(|| format!("failed to open {}", path.display()))
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut db = open(&cli)?;
    let width = db.config().payload_width;

    match &cli.command {
        Command::Size { .. } => println!("{}", db.len()?),
        Command::Get { key, .. } => println!("{}", show_payload(&db.get(*key)?)),
        Command::Put { key, payload, .. } => {
            let index = db.append(*key, &pad_payload(payload, width)?)?;
            println!("appended at {}", index);
        }
        Command::Insert { key, payload, .. } => {
            let index = db.insert(*key, &pad_payload(payload, width)?)?;
            println!("inserted at {}", index);
        }
        Command::Update { key, payload, .. } => {
            db.update(*key, &pad_payload(payload, width)?)?;
        }
        Command::Sort { .. } => db.sort()?,
        Command::Dump { limit, .. } => {
            let limit = limit.unwrap_or(usize::MAX);
            let mut printed = 0usize;
            db.iterate(|key, payload| -> flagdb::Result<ControlFlow<()>> {
                if printed == limit {
                    return Ok(ControlFlow::Break(()));
                }
                println!("{}\t{}", key, show_payload(payload));
                printed += 1;
                Ok(ControlFlow::Continue(()))
            })?;
        }
        Command::Check { .. } => {
            let records = db.len()?;
            let sorted = db.is_sorted()?;
            println!("records: {}", records);
            println!("sorted:  {}", sorted);
        }
    }

    db.close()?;
    Ok(())
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_env("FLAGDB_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = e
                .downcast_ref::<FlagError>()
                .map_or("ERROR", FlagError::code);
            eprintln!("[flagdb] {}: {:#}", code, e);
            ExitCode::FAILURE
        }
    }
}
