//! Seedperm CLI
//!
//! Recover a mnemonic whose words are known but whose order is not.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use tracing::{info, warn};

use seedperm_core::{
    all_coins, get_coin, parse_address_kind, AddressKind, Bip44Wallet, Coin, Enumeration, Partition, SearchConfig,
    SearchOutcome, SearchReport, SeedSearch, SeedSet,
};
use seedperm_wallet::is_mnemonic_length;

#[derive(Parser)]
#[command(name = "seedperm")]
#[command(version = "0.1.0")]
#[command(about = "Recover a BIP39 mnemonic from its words in unknown order", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search word orderings for the one that derives the target address
    Search {
        /// Seed words, comma separated
        #[arg(short, long, value_delimiter = ',')]
        words: Vec<String>,

        /// Known first receive address
        #[arg(short, long)]
        target: Option<String>,

        /// Coin ticker (BTC, TBTC, LTC, DOGE)
        #[arg(short, long)]
        coin: Option<String>,

        /// Address kind: p2pkh (BIP44) or p2wpkh (BIP84)
        #[arg(short, long)]
        kind: Option<String>,

        /// BIP39 passphrase
        #[arg(long)]
        passphrase: Option<String>,

        /// Number of worker threads (default: all cores)
        #[arg(long)]
        workers: Option<usize>,

        /// Orderings per pull under dynamic partitioning
        #[arg(long)]
        batch_size: Option<usize>,

        /// How the ordering space is split between workers
        #[arg(long)]
        partition: Option<PartitionArg>,

        /// Skip orderings that only swap identical words
        #[arg(long)]
        distinct: bool,

        /// Progress log interval in seconds
        #[arg(long)]
        progress_interval: Option<u64>,

        /// Stop after this many derived candidates (0 = unlimited)
        #[arg(long)]
        max_checked: Option<u64>,

        /// Maximum time in seconds (0 = unlimited)
        #[arg(long)]
        max_time: Option<u64>,

        /// JSON job file; flags override its values
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the number of orderings of a word list
    Count {
        /// Seed words, comma separated
        #[arg(short, long, value_delimiter = ',', required = true)]
        words: Vec<String>,
    },

    /// List supported coins
    Coins,
}

#[derive(Clone, Copy, ValueEnum)]
enum PartitionArg {
    Static,
    Dynamic,
}

impl From<PartitionArg> for Partition {
    fn from(arg: PartitionArg) -> Self {
        match arg {
            PartitionArg::Static => Partition::Static,
            PartitionArg::Dynamic => Partition::Dynamic,
        }
    }
}

/// A search job loaded with `--config`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JobFile {
    words: Vec<String>,
    target: Option<String>,
    coin: Option<String>,
    address_kind: Option<String>,
    passphrase: Option<String>,
    search: Option<SearchConfig>,
}

impl JobFile {
    fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
    }
}

/// Resolved `search` arguments
struct Job {
    words: Vec<String>,
    target: String,
    coin: Coin,
    kind: AddressKind,
    passphrase: String,
    config: SearchConfig,
}

fn main() -> Result<ExitCode> {
    // Logs go to stderr so --json output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Search {
            words,
            target,
            coin,
            kind,
            passphrase,
            workers,
            batch_size,
            partition,
            distinct,
            progress_interval,
            max_checked,
            max_time,
            config,
            json,
        } => {
            let mut file = match config {
                Some(path) => JobFile::load(&path)?,
                None => JobFile::default(),
            };

            let mut search = file.search.take().unwrap_or_default();
            if let Some(workers) = workers {
                search.workers = workers;
            }
            if let Some(batch_size) = batch_size {
                search.batch_size = batch_size;
            }
            if let Some(partition) = partition {
                search.partition = partition.into();
            }
            if distinct {
                search.enumeration = Enumeration::Distinct;
            }
            if let Some(secs) = progress_interval {
                search.progress_interval_ms = secs.saturating_mul(1000);
            }
            if let Some(max_checked) = max_checked {
                search.max_checked = max_checked;
            }
            if let Some(max_time) = max_time {
                search.max_time_secs = max_time;
            }

            let coin_name = coin.or(file.coin).unwrap_or_else(|| "BTC".to_string());
            let coin = get_coin(&coin_name).ok_or_else(|| anyhow::anyhow!("Unknown coin: {}", coin_name))?;

            let kind = match kind.or(file.address_kind) {
                Some(k) => parse_address_kind(&k).ok_or_else(|| anyhow::anyhow!("Unknown address kind: {}", k))?,
                None => AddressKind::default(),
            };

            let job = Job {
                words: if words.is_empty() { file.words } else { words },
                target: target
                    .or(file.target)
                    .ok_or_else(|| anyhow::anyhow!("No target address given (--target or job file)"))?,
                coin,
                kind,
                passphrase: passphrase.or(file.passphrase).unwrap_or_default(),
                config: search,
            };

            cmd_search(job, json)
        }
        Commands::Count { words } => {
            cmd_count(words)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Coins => {
            cmd_coins();
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn cmd_search(job: Job, json_output: bool) -> Result<ExitCode> {
    let words: Vec<String> = job.words.iter().map(|w| w.trim().to_lowercase()).collect();
    let seed = SeedSet::new(words)?;

    let wallet = Bip44Wallet::new(job.coin, job.kind, job.passphrase)?;
    preflight(&wallet, &seed, &job.target);

    let wallet = Arc::new(wallet);
    let search = SeedSearch::new(&seed, &job.target, wallet.clone(), wallet.clone(), job.config)?;

    if !json_output {
        eprintln!("Seedperm v0.1.0");
        eprintln!("Coin:       {}", wallet.coin());
        eprintln!("Kind:       {}", wallet.address_kind());
        eprintln!("Path:       {}", wallet.derivation_path());
        eprintln!("Target:     {}", job.target);
        eprintln!("Words:      {}", seed.len());
        eprintln!("Orderings:  {}", search.space());
        eprintln!("Workers:    {}", search.config().workers);
        eprintln!();
    }

    let report = search.run()?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(match report.outcome {
        SearchOutcome::Found(_) => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

/// Warn about inputs that make a match impossible; the search still runs
fn preflight(wallet: &Bip44Wallet, seed: &SeedSet, target: &str) {
    let unknown = wallet.unknown_words(seed.words());
    if !unknown.is_empty() {
        warn!("words not in the English BIP39 list, no ordering can validate: {}", unknown.join(", "));
    }
    if !is_mnemonic_length(seed.len()) {
        warn!(words = seed.len(), "word count is not a valid mnemonic length (12, 15, 18, 21 or 24)");
    }
    if let Err(e) = wallet.check_target(target) {
        warn!("{}", e);
    }
    info!(path = %wallet.derivation_path(), "deriving first receive address");
}

fn cmd_count(words: Vec<String>) -> Result<()> {
    let seed = SeedSet::new(words)?;
    let show = |n: Option<u128>| n.map_or_else(|| "overflows u128".to_string(), |n| n.to_string());

    println!("Words:     {}", seed.len());
    println!("Distinct:  {}", seed.distinct().0.len());
    println!("Full:      {}", show(seed.space(Enumeration::Full)));
    println!("Unique:    {}", show(seed.space(Enumeration::Distinct)));

    if seed.space(Enumeration::Full).is_none() {
        bail!("{} words is beyond the searchable range", seed.len());
    }
    Ok(())
}

fn cmd_coins() {
    println!("Supported Coins:");
    println!("{:-<64}", "");
    println!("{:<8} {:<18} {:<10} {}", "Ticker", "Name", "Coin Type", "Address Kinds");
    println!("{:-<64}", "");

    for coin in all_coins() {
        let kinds: Vec<String> = coin.address_kinds().iter().map(|k| k.to_string()).collect();

        println!(
            "{:<8} {:<18} {:<10} {}",
            coin.ticker(),
            coin.name(),
            coin.coin_type(),
            kinds.join(", ")
        );
    }
}

fn print_report(report: &SearchReport) {
    println!();
    match &report.outcome {
        SearchOutcome::Found(hit) => {
            println!("MATCH FOUND!");
            println!("{:-<60}", "");
            println!("Phrase:      {}", hit.phrase);
            println!("Address:     {}", hit.address);
            println!("Rank:        {}", hit.rank);
        }
        SearchOutcome::Exhausted => {
            println!("No match: every ordering was checked.");
        }
        SearchOutcome::LimitReached => {
            println!("No match within limits.");
        }
    }
    println!("{:-<60}", "");
    println!("Checked:     {}", report.checked);
    println!("Visited:     {} of {}", report.visited, report.space);
    if report.derive_failures > 0 {
        println!("Failures:    {}", report.derive_failures);
    }
    if report.abandoned_units > 0 {
        println!("Abandoned:   {} units", report.abandoned_units);
    }
    println!("Time:        {:.2}s", report.time_secs);
    println!("Speed:       {:.2} checked/s", report.checked_per_second);
}
