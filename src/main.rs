use clap::{Parser, Subcommand};
use ggpk::diff::{self, LabelStyle};
use ggpk::{Archive, Record};
use serde::Serialize;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ggpk", about = "Inspect and extract GGPK pack archives")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every entry in the archive
    List {
        input: PathBuf,
        /// Print one JSON array instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show header fields and entry counts
    Info {
        input: PathBuf,
    },
    /// Extract the whole archive, or only the given archive paths
    Extract {
        input: PathBuf,
        #[arg(short = 'C', long, default_value = ".")]
        output_dir: PathBuf,
        /// Archive paths (files or directories) to extract
        paths: Vec<String>,
    },
    /// Write one file's raw contents to stdout
    Cat {
        input: PathBuf,
        path: String,
    },
    /// Summarise what changed between two extraction directories
    Diff {
        /// First (old) extraction directory
        dir1: PathBuf,
        /// Second (new) extraction directory
        dir2: PathBuf,
        /// Size of buffer to use when comparing files
        #[arg(short, long, default_value_t = diff::DEFAULT_BUFFER_SIZE)]
        buffer_size: usize,
        /// Also write results to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Show +, -, * instead of ADDED, DELETED, MODIFIED
        #[arg(short, long)]
        shorthand: bool,
    },
}

#[derive(Serialize)]
struct ListRow<'a> {
    path:   &'a str,
    kind:   &'static str,
    offset: u64,
    length: Option<u64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    match Cli::parse().command {

        // ── List ─────────────────────────────────────────────────────────────
        Commands::List { input, json } => {
            let ar = Archive::open(&input)?;
            let mut entries = Vec::new();
            for entry in ar.walk() {
                entries.push(entry?);
            }
            let rows: Vec<ListRow> = entries
                .iter()
                .map(|e| match &e.record {
                    Record::File(f) => ListRow {
                        path: &e.path, kind: "file", offset: f.offset(), length: Some(f.length()),
                    },
                    other => ListRow {
                        path: &e.path,
                        kind: other.kind(),
                        offset: other.as_directory().map(|d| d.offset()).unwrap_or_default(),
                        length: None,
                    },
                })
                .collect();

            let stdout = io::stdout();
            let mut out = stdout.lock();
            if json {
                serde_json::to_writer_pretty(&mut out, &rows)?;
                writeln!(out)?;
            } else {
                writeln!(out, "{:<5} {:>12} {:>12}  Path", "Kind", "Offset", "Size")?;
                for row in &rows {
                    let size = row.length.map(|l| l.to_string()).unwrap_or_else(|| "-".into());
                    writeln!(out, "{:<5} {:>#12x} {:>12}  {}", row.kind, row.offset, size, row.path)?;
                }
            }
        }

        // ── Info ─────────────────────────────────────────────────────────────
        Commands::Info { input } => {
            let ar = Archive::open(&input)?;
            let header = ar.header();
            let (mut dirs, mut files, mut bytes) = (0u64, 0u64, 0u64);
            let mut tombstones = ar.root().children().filter(|r| matches!(r, Ok(Record::Tombstone))).count();
            for entry in ar.walk() {
                match entry?.record {
                    Record::Directory(d) => {
                        dirs += 1;
                        tombstones += d.children().filter(|r| matches!(r, Ok(Record::Tombstone))).count();
                    }
                    Record::File(f) => {
                        files += 1;
                        bytes += f.length();
                    }
                    Record::Tombstone => {}
                }
            }

            println!("── GGPK Archive ─────────────────────────────────────────");
            println!("  Path           {}", input.display());
            println!("  Format version {}", header.version);
            println!("  Identifier     {}", String::from_utf8_lossy(&header.identifier));
            println!("  Root offset    {:#x}", header.root_offset);
            println!("  Directories    {dirs}");
            println!("  Files          {files}");
            println!("  Free records   {tombstones}");
            println!("  File bytes     {bytes}");
        }

        // ── Extract ──────────────────────────────────────────────────────────
        Commands::Extract { input, output_dir, paths } => {
            let ar = Archive::open(&input)?;
            let mut total = ggpk::ExtractStats::default();
            let targets = if paths.is_empty() { vec![String::new()] } else { paths };
            for path in &targets {
                let stats = ar.extract_path(path, &output_dir)?;
                total.directories += stats.directories;
                total.files += stats.files;
                total.bytes += stats.bytes;
            }
            println!(
                "Extracted {} file(s), {} dir(s), {} bytes to {}",
                total.files, total.directories, total.bytes, output_dir.display()
            );
        }

        // ── Cat ──────────────────────────────────────────────────────────────
        Commands::Cat { input, path } => {
            let ar = Archive::open(&input)?;
            let file = match ar.lookup(&path)? {
                Some(Record::File(f)) => f,
                Some(_) => return Err(format!("not a file: {path}").into()),
                None => return Err(format!("not in archive: {path}").into()),
            };
            let stdout = io::stdout();
            let mut out = stdout.lock();
            ar.extract_to(&file, &mut out)?;
            out.flush()?;
        }

        // ── Diff ─────────────────────────────────────────────────────────────
        Commands::Diff { dir1, dir2, buffer_size, output, shorthand } => {
            for dir in [&dir1, &dir2] {
                if !dir.exists() {
                    return Err(format!("directory does not exist: {}", dir.display()).into());
                }
            }
            eprintln!("Comparing {} to {}...", dir1.display(), dir2.display());

            let style = if shorthand { LabelStyle::Short } else { LabelStyle::Long };
            let changes = diff::diff_dirs(&dir1, &dir2, buffer_size)?;
            diff::write_summary(io::stdout().lock(), &changes, style, false)?;
            if let Some(path) = output {
                diff::write_summary(File::create(path)?, &changes, style, false)?;
            }
        }
    }

    Ok(())
}
