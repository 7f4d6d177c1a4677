//! `rlink`: run a configured match end to end.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Runs a match from a config file and writes the pairwise output plus
    /// one crosswalk file per strictness level into `--out-dir`.
    Match {
        /// Path to the match configuration (TOML).
        #[arg(long)]
        config: PathBuf,
        /// Directory the pairwise CSV and crosswalk files are written to.
        #[arg(long)]
        out_dir: PathBuf,
        /// CSV file for the left-hand table, id column named `indv_id`.
        #[arg(long)]
        input_a: PathBuf,
        /// CSV file for the right-hand table. Omit for a `dedup` match,
        /// where `input_a` is matched against itself.
        #[arg(long)]
        input_b: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    rlink_observability::init_subscriber();
    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "match run failed");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> rlink_error::Result<()> {
    match command {
        Command::Match {
            config,
            out_dir,
            input_a,
            input_b,
        } => run_match(&config, &out_dir, &input_a, input_b.as_deref()),
    }
}

fn run_match(
    config_path: &std::path::Path,
    out_dir: &std::path::Path,
    input_a: &std::path::Path,
    input_b: Option<&std::path::Path>,
) -> rlink_error::Result<()> {
    let config = rlink_core::load_config(config_path)?;
    let table_a = rlink_core::demo_loader::load_csv(input_a, "indv_id")?;
    let table_b = match input_b {
        Some(path) => rlink_core::demo_loader::load_csv(path, "indv_id")?,
        None => table_a.clone(),
    };

    tracing::info!(
        matchtype = config.matchtype.as_str(),
        table_a_rows = table_a.len(),
        table_b_rows = table_b.len(),
        "starting match"
    );

    let outcome = rlink_core::run_match(&config, &table_a, &table_b, out_dir)?;
    tracing::info!(pairwise_csv = %outcome.pairwise_csv.display(), "match complete");
    for (strictness, path) in &outcome.crosswalks {
        tracing::info!(strictness = strictness.as_str(), path = %path.display(), "crosswalk written");
    }
    Ok(())
}
