use std::fs::File;
use std::io;
use std::path::PathBuf;

use clap::Parser;
use log::info;

use drugspace::similarity::write_query_report;
use drugspace::{EngineBuilder, DEFAULT_TOP_N};

/// Rank the drugs most similar to one drug, using autoencoder embeddings
/// learned from a drug-by-drug ratings matrix.
#[derive(Parser)]
#[command(name = "drugspace", version)]
struct Cli {
    /// Ratings table: first column drug ids, header row drug ids
    #[arg(long, default_value = "./ratings_mat.csv")]
    ratings: PathBuf,

    /// Drug to find neighbours for
    #[arg(long)]
    drug: String,

    #[arg(long, default_value_t = DEFAULT_TOP_N)]
    top_n: usize,

    #[arg(long)]
    hidden: Option<usize>,

    #[arg(long)]
    latent: Option<usize>,

    #[arg(long)]
    learning_rate: Option<f64>,

    #[arg(long)]
    passes: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    /// Also write the full similarity table here
    #[arg(long)]
    export_table: Option<PathBuf>,

    /// Print the ranked list as CSV instead of aligned text
    #[arg(long)]
    csv: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut builder = EngineBuilder::new();
    if let Some(h) = cli.hidden {
        builder = builder.with_hidden_width(h);
    }
    if let Some(l) = cli.latent {
        builder = builder.with_latent_width(l);
    }
    if let Some(lr) = cli.learning_rate {
        builder = builder.with_learning_rate(lr);
    }
    if let Some(p) = cli.passes {
        builder = builder.with_passes(p);
    }
    if let Some(s) = cli.seed {
        builder = builder.with_seed(s);
    }

    let table = builder.train_from_path(&cli.ratings)?;

    if let Some(path) = &cli.export_table {
        info!("Writing similarity table to {}", path.display());
        table.write_csv(File::create(path)?)?;
    }

    // unknown drug is reported, not failed
    write_query_report(&table, &cli.drug, cli.top_n, cli.csv, io::stdout().lock())?;
    Ok(())
}
