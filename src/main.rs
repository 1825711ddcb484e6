use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use prop_edge::config::{EdgeStrategy, EngineConfig};
use prop_edge::fake_slate;
use prop_edge::history;
use prop_edge::identity::KeyScheme;
use prop_edge::ingest::{self, SlateLayout, TableLayout};
use prop_edge::merge::SourceTable;
use prop_edge::pipeline::publish;
use prop_edge::projection::ProjectionFeed;
use prop_edge::report_export;

#[derive(Parser)]
#[command(name = "prop_edge")]
#[command(about = "Rank pitcher strikeout props by market edge and projection gap")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build today's best-lines report
    Run(RunArgs),
    /// List picks recorded for a slate date
    History {
        /// Slate date (YYYY-MM-DD)
        date: String,
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Merged slate written by `merge_slate`
    #[arg(long, conflicts_with_all = ["pp", "demo"])]
    slate: Option<PathBuf>,
    /// PrizePicks table
    #[arg(long)]
    pp: Option<PathBuf>,
    /// DraftKings table
    #[arg(long, requires = "pp")]
    dk: Option<PathBuf>,
    /// Underdog table
    #[arg(long, requires = "pp")]
    ud: Option<PathBuf>,
    /// Generate a synthetic slate with this many pitchers
    #[arg(long, conflicts_with = "pp")]
    demo: Option<usize>,

    /// Model predictions
    #[arg(long, conflicts_with = "logs")]
    projections: Option<PathBuf>,
    #[arg(long, default_value = "player")]
    projection_player_col: String,
    #[arg(long, default_value = "predicted")]
    projection_value_col: String,
    /// Pitching game logs (Name, GS, G, SO) used when no predictions are given
    #[arg(long)]
    logs: Option<PathBuf>,

    /// Engine config JSON; otherwise PROPS_* environment variables
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long)]
    top_n: Option<usize>,
    #[arg(long)]
    strategy: Option<EdgeStrategy>,
    #[arg(long)]
    merge_key: Option<KeyScheme>,

    /// Slate date, defaults to today
    #[arg(long)]
    date: Option<String>,
    #[arg(long, default_value = "best_lines")]
    out_dir: PathBuf,
    #[arg(long)]
    xlsx: Option<PathBuf>,
    /// Record published picks in this SQLite database
    #[arg(long)]
    history_db: Option<PathBuf>,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run(args),
        Commands::History { date, db } => show_history(&date, db),
    }
}

fn run(args: RunArgs) -> Result<()> {
    let cfg = resolve_config(&args)?;
    let date = args.date.clone().unwrap_or_else(today);

    let (primary, secondaries, demo_feed) = load_tables(&args, &cfg)?;
    let feed = match (&args.projections, &args.logs) {
        (Some(path), _) => {
            let records = ingest::load_projections(
                path,
                &args.projection_player_col,
                &args.projection_value_col,
            )?;
            Some(ProjectionFeed::new(&records, cfg.projection_key_scheme))
        }
        (None, Some(path)) => {
            let logs = ingest::load_game_logs(path)?;
            Some(ProjectionFeed::from_game_logs(&logs, cfg.projection_key_scheme))
        }
        (None, None) => demo_feed,
    };
    if feed.as_ref().is_none_or(|f| f.is_empty()) {
        info!("no projections loaded; model picks carry zero edge");
    }

    let published = publish(&primary, &secondaries, feed.as_ref(), &cfg);
    print!("{}", published.report.render_text());

    let csv_path = report_export::best_lines_path(&args.out_dir, &date);
    report_export::save_report_csv(&csv_path, &published.report)?;
    println!("\nSaved {}", csv_path.display());

    if let Some(path) = &args.xlsx {
        report_export::export_report_xlsx(path, &published.report)?;
        println!("Saved {}", path.display());
    }

    if let Some(path) = &args.history_db {
        let mut conn = history::open_db(path)?;
        let stored = history::record_report(&mut conn, &date, &published.report)?;
        println!("Recorded {stored} picks for {date} in {}", path.display());
    }

    Ok(())
}

fn resolve_config(args: &RunArgs) -> Result<EngineConfig> {
    let mut cfg = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::from_env().context("invalid PROPS_* environment")?,
    };
    if let Some(top_n) = args.top_n {
        cfg.top_n = top_n;
        cfg.projection_top_n = top_n;
    }
    if let Some(strategy) = args.strategy {
        cfg.strategy = strategy;
    }
    if let Some(scheme) = args.merge_key {
        cfg.merge_key_scheme = scheme;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn load_tables(
    args: &RunArgs,
    cfg: &EngineConfig,
) -> Result<(SourceTable, Vec<SourceTable>, Option<ProjectionFeed>)> {
    if let Some(pitchers) = args.demo {
        let fake = fake_slate::seeded_slate(rand::random(), pitchers);
        let feed = fake.projection_feed(cfg.projection_key_scheme);
        return Ok((fake.primary, fake.secondaries, Some(feed)));
    }

    if let Some(path) = &args.slate {
        let (primary, secondaries) = ingest::load_slate(path, &SlateLayout::default())?;
        return Ok((primary, secondaries, None));
    }

    let Some(pp) = &args.pp else {
        bail!("pass --slate, --pp with --dk/--ud, or --demo");
    };
    let primary = ingest::load_table(pp, &TableLayout::prizepicks())?;
    let mut secondaries = Vec::new();
    if let Some(path) = &args.dk {
        secondaries.push(ingest::load_table(path, &TableLayout::draftkings())?);
    }
    if let Some(path) = &args.ud {
        secondaries.push(ingest::load_table(path, &TableLayout::underdog())?);
    }
    Ok((primary, secondaries, None))
}

fn show_history(date: &str, db: Option<PathBuf>) -> Result<()> {
    let path = db.unwrap_or_else(history::default_db_path);
    if !path.exists() {
        bail!("no history database at {}", path.display());
    }
    let conn = history::open_db(&path)?;
    let picks = history::picks_for_date(&conn, date)?;
    if picks.is_empty() {
        println!("No picks recorded for {date}");
        return Ok(());
    }
    println!("Picks for {date}:");
    for pick in &picks {
        println!("  {}", pick.summary());
    }
    Ok(())
}

fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}
