use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use prop_edge::config::EngineConfig;
use prop_edge::identity::KeyScheme;
use prop_edge::ingest::{self, SlateLayout, TableLayout};
use prop_edge::merge::merge;
use prop_edge::report_export;

/// Join the PrizePicks, DraftKings and Underdog tables into one slate file.
#[derive(Parser)]
#[command(name = "merge_slate")]
struct Cli {
    #[arg(long)]
    pp: PathBuf,
    #[arg(long)]
    dk: PathBuf,
    #[arg(long)]
    ud: PathBuf,
    #[arg(long)]
    merge_key: Option<KeyScheme>,
    /// Slate date, defaults to today
    #[arg(long)]
    date: Option<String>,
    #[arg(long, default_value = "data/mlb_slates")]
    out_dir: PathBuf,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut cfg = EngineConfig::from_env().context("invalid PROPS_* environment")?;
    if let Some(scheme) = cli.merge_key {
        cfg.merge_key_scheme = scheme;
    }

    let pp = ingest::load_table(&cli.pp, &TableLayout::prizepicks())?;
    let dk = ingest::load_table(&cli.dk, &TableLayout::draftkings())?;
    let ud = ingest::load_table(&cli.ud, &TableLayout::underdog())?;
    let slate = merge(&pp, &[dk, ud], &cfg);

    let date = cli
        .date
        .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string());
    let path = report_export::slate_path(&cli.out_dir, &date);
    report_export::save_slate_csv(&path, &slate, &SlateLayout::default())?;

    let with_books = slate
        .rows
        .iter()
        .filter(|row| row.present_quotes().next().is_some())
        .count();
    println!("Merged {} pitchers ({with_books} with book quotes)", slate.rows.len());
    println!("Saved {}", path.display());
    Ok(())
}
