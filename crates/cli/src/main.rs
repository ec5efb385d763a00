//! `holdings`: terminal host for the holdings core library.
//!
//! Plays the part of the page: wires commands to core operations, renders
//! the state after every change, and runs the refresh timer in `watch`.

mod config;
mod render;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use holdings_core::models::asset::AssetCandidate;
use holdings_core::models::settings::Fiat;
use holdings_core::providers::coingecko::{CoinGeckoProvider, DEFAULT_BASE_URL};
use holdings_core::services::portfolio_service::UpsertOutcome;
use holdings_core::services::scheduler::SyncScheduler;
use holdings_core::storage::format::EXPORT_FILE_NAME;
use holdings_core::storage::store::FileStore;
use holdings_core::HoldingsTracker;

use config::Config;
use render::print_portfolio;

#[derive(Parser)]
#[command(name = "holdings", about = "Track crypto holdings with live prices")]
struct Cli {
    /// Directory for the state document. Defaults to the platform data dir.
    #[arg(long, env = "HOLDINGS_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Price API base URL.
    #[arg(long, env = "HOLDINGS_API_BASE", default_value = DEFAULT_BASE_URL, global = true)]
    api_base: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show holdings and totals from the last sync.
    List,
    /// Fetch current prices now.
    Refresh,
    /// Refresh on the configured interval until Ctrl-C.
    Watch,
    /// Search assets by name or symbol.
    Search {
        query: String,
    },
    /// Add a holding, or edit amount / average cost of an existing one.
    Add {
        /// Asset id (e.g. "bitcoin") or a search query
        asset: String,

        #[arg(long)]
        amount: f64,

        /// Average cost per unit in the reference currency
        #[arg(long, default_value_t = 0.0)]
        avg_cost: f64,
    },
    /// Remove a holding by id.
    Remove {
        id: String,
    },
    /// Remove all holdings.
    Clear {
        /// Required: confirm removing everything
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    /// Replace holdings with a sample portfolio.
    Sample,
    /// Show or change settings.
    Settings {
        /// Reference currency (eur or usd)
        #[arg(long)]
        fiat: Option<Fiat>,

        #[arg(long)]
        refresh_mins: Option<u32>,

        #[arg(long)]
        spark: Option<bool>,

        #[arg(long)]
        badges: Option<bool>,
    },
    /// Write the state document to a file.
    Export {
        #[arg(default_value = EXPORT_FILE_NAME)]
        path: PathBuf,
    },
    /// Merge a previously exported state document.
    Import {
        path: PathBuf,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = Config::resolve(cli.data_dir, cli.api_base)?;
    debug!(?config, "Config resolved");

    let store = FileStore::open(&config.data_dir)
        .with_context(|| format!("Failed to open data dir {}", config.data_dir.display()))?;
    let provider = Arc::new(CoinGeckoProvider::with_base_url(config.api_base.clone()));
    let mut tracker = HoldingsTracker::open(Box::new(store), provider)?;

    match cli.command {
        Commands::List => print_portfolio(tracker.portfolio(), &tracker.totals()),
        Commands::Refresh => {
            let report = tracker.refresh_prices().await?;
            print_portfolio(tracker.portfolio(), &tracker.totals());
            if report.holdings > 0 && report.priced == 0 {
                eprintln!("No prices received; showing last known values.");
            }
        }
        Commands::Watch => {
            let tracker = tracker.with_render_callback(|portfolio, totals| {
                println!("──────── {}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));
                print_portfolio(portfolio, totals);
            });
            let scheduler = SyncScheduler::new(tracker);
            scheduler
                .run(async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await;
        }
        Commands::Search { query } => {
            let results = tracker.search(&query).await;
            if results.is_empty() {
                println!("No matches.");
            }
            for c in results {
                println!("{:<28} {:<8} {}", c.id, c.symbol, c.name);
            }
        }
        Commands::Add {
            asset,
            amount,
            avg_cost,
        } => {
            let candidate = match tracker.holding(&asset) {
                Some(h) => Some(AssetCandidate::new(&h.id, &h.symbol, &h.name)),
                None => {
                    let results = tracker.search(&asset).await;
                    results
                        .iter()
                        .find(|c| c.id == asset)
                        .or_else(|| results.first())
                        .cloned()
                }
            };
            let Some(candidate) = candidate else {
                bail!("No asset found for '{asset}'");
            };
            let outcome = tracker
                .add_or_update_holding(&candidate, amount, avg_cost)
                .await?;
            match outcome {
                UpsertOutcome::Added => println!("Added {} ({})", candidate.name, candidate.symbol),
                UpsertOutcome::Updated => println!("Updated {} ({})", candidate.name, candidate.symbol),
            }
            print_portfolio(tracker.portfolio(), &tracker.totals());
        }
        Commands::Remove { id } => {
            if !tracker.remove_holding(&id)? {
                bail!("No holding with id '{id}'");
            }
            print_portfolio(tracker.portfolio(), &tracker.totals());
        }
        Commands::Clear { yes } => {
            if !yes {
                bail!("Refusing to clear all holdings without --yes");
            }
            let removed = tracker.clear_holdings()?;
            println!("Removed {removed} holdings.");
        }
        Commands::Sample => {
            tracker.load_sample().await?;
            print_portfolio(tracker.portfolio(), &tracker.totals());
        }
        Commands::Settings {
            fiat,
            refresh_mins,
            spark,
            badges,
        } => {
            let mut settings = tracker.settings().clone();
            let changed = fiat.is_some() || refresh_mins.is_some() || spark.is_some() || badges.is_some();
            if let Some(fiat) = fiat {
                settings.fiat = fiat;
            }
            if let Some(mins) = refresh_mins {
                settings.refresh_mins = mins;
            }
            if let Some(spark) = spark {
                settings.show_spark = spark;
            }
            if let Some(badges) = badges {
                settings.show_badges = badges;
            }
            if changed {
                if let Some(conversion) = tracker.save_settings(settings).await? {
                    println!("{conversion}");
                }
            }
            let s = tracker.settings();
            println!(
                "currency {}  refresh every {} min  sparkline {}  badges {}",
                s.fiat, s.refresh_mins, s.show_spark, s.show_badges
            );
        }
        Commands::Export { path } => {
            tracker.export_to_file(&path)?;
            println!("Exported to {}", path.display());
        }
        Commands::Import { path } => {
            tracker.import_from_file(&path).await?;
            print_portfolio(tracker.portfolio(), &tracker.totals());
        }
    }

    Ok(())
}
