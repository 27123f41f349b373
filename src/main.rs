use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, BufRead, Write};

use anime_ingest::modules::data_import::domain::services::import_components::id_generator::{
    DEFAULT_SEED, REFERENCE_TARGET,
};
use anime_ingest::modules::data_import::{
    CampaignMode, CampaignOutcome, CampaignReport, MassImportService, Strategy,
};
use anime_ingest::shared::utils::init_logger;
use anime_ingest::shared::{ImportProfile, IngestConfig, ProfileKind};
use anime_ingest::{log_info, log_warn};

#[derive(Parser)]
#[command(name = "anime-ingest")]
#[command(about = "Bulk anime catalog ingestion from Shikimori")]
#[command(version)]
struct Cli {
    /// Keep imported records in memory instead of the database
    #[arg(long, global = true)]
    dry_run: bool,

    /// Override the worker count of the selected profile
    #[arg(long, global = true)]
    workers: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full staged campaign (ranges, years, genres, random)
    MassImport {
        #[arg(long, default_value_t = REFERENCE_TARGET)]
        target: usize,
        /// Ten times the workers with no throttling; the source may ban the client
        #[arg(long)]
        ultra: bool,
        #[arg(long)]
        accept_ban_risk: bool,
        /// Continue from the saved checkpoint
        #[arg(long)]
        resume: bool,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
    },
    /// Run a single sourcing strategy
    Import {
        #[arg(long, value_enum)]
        strategy: StrategyArg,
        #[arg(long, default_value_t = 1000)]
        limit: usize,
        #[arg(long)]
        start_year: Option<i32>,
        #[arg(long)]
        end_year: Option<i32>,
        #[arg(long)]
        per_year: Option<usize>,
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
    },
    /// Look up posters for records still on the missing image
    RefreshPosters {
        #[arg(long, default_value_t = 500)]
        limit: usize,
    },
    /// Print catalog counts
    Stats,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Popular,
    Years,
    Genres,
    Classics,
    Random,
    Ranges,
}

fn build_strategy(
    kind: StrategyArg,
    limit: usize,
    start_year: Option<i32>,
    end_year: Option<i32>,
    per_year: Option<usize>,
    seed: u64,
) -> Strategy {
    match kind {
        StrategyArg::Popular => Strategy::popular(limit),
        StrategyArg::Classics => Strategy::classics(),
        StrategyArg::Random => Strategy::random(limit, seed),
        StrategyArg::Ranges => Strategy::ranges(limit, seed),
        StrategyArg::Genres => Strategy::genres(limit),
        StrategyArg::Years => {
            let start = start_year.unwrap_or(2010);
            let end = end_year.unwrap_or(2024);
            let span = (start - end).unsigned_abs() as usize + 1;
            let per_year = per_year.unwrap_or_else(|| limit.div_ceil(span).max(1));
            Strategy::year_span(start, end, per_year)
        }
    }
}

/// Reads one line and compares it to `expected`, ignoring case.
fn confirm(question: &str, expected: &str) -> io::Result<bool> {
    print!("{} ", question);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case(expected))
}

fn print_report(report: &CampaignReport) {
    let stats = &report.stats;
    println!();
    match report.outcome {
        CampaignOutcome::Completed => println!("Campaign '{}' completed", report.campaign),
        CampaignOutcome::Interrupted => println!("Campaign '{}' interrupted", report.campaign),
    }
    println!("   Duration: {:.1}s", stats.elapsed.as_secs_f64());
    println!("   Speed: {:.2} records/s", report.throughput());
    println!(
        "   Imported: {} (attempted {}, errors {}, not found {}, rate limited {}, already present {})",
        stats.imported,
        stats.attempted,
        stats.errors,
        stats.not_found,
        stats.rate_limited,
        stats.already_present
    );
    for strategy in &report.strategies {
        println!(
            "   - {}: {}/{} ({:?})",
            strategy.name, strategy.imported, strategy.target, strategy.status
        );
    }
    println!(
        "   Catalog: {} anime, {} genres, {} studios",
        report.counts.anime, report.counts.genres, report.counts.studios
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let cli = Cli::parse();
    let config = IngestConfig::from_env().context("Failed to load configuration")?;

    let kind = match &cli.command {
        Commands::MassImport { ultra: true, .. } => ProfileKind::Ultra,
        _ => ProfileKind::Standard,
    };
    let mut profile = ImportProfile::from_config(&config, kind);
    if let Some(workers) = cli.workers {
        profile = profile.with_workers(workers);
    }

    let service = MassImportService::connect(&config, profile, cli.dry_run)
        .context("Failed to initialise the import pipeline")?;

    let cancel = service.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log_warn!("Interrupt received, finishing in-flight requests");
            cancel.cancel();
        }
    });

    match cli.command {
        Commands::MassImport {
            target,
            ultra,
            accept_ban_risk,
            resume,
            yes,
            seed,
        } => {
            let mut accepted = accept_ban_risk;
            if ultra && !accepted {
                println!("Ultra mode runs {} workers with no throttling.", service.profile().workers);
                println!("The source is likely to rate limit or ban this client.");
                accepted = confirm("Type 'ultra' to continue:", "ultra")?;
                if !accepted {
                    bail!("Ultra mode was not confirmed");
                }
            }

            if !yes && !resume {
                let question = format!("Import up to {} records? (yes/no):", target);
                if !confirm(&question, "yes")? {
                    println!("Aborted");
                    return Ok(());
                }
            }

            let mode = if ultra {
                CampaignMode::Ultra {
                    accept_ban_risk: accepted,
                }
            } else {
                CampaignMode::Staged
            };

            let report = service.run_mass_import(mode, target, seed, resume).await?;
            print_report(&report);
        }
        Commands::Import {
            strategy,
            limit,
            start_year,
            end_year,
            per_year,
            seed,
        } => {
            let strategy = build_strategy(strategy, limit, start_year, end_year, per_year, seed);
            log_info!("Importing up to {} records with '{}'", limit, strategy.name());
            let report = service.import_strategy(&strategy, limit).await?;
            print_report(&report);
        }
        Commands::RefreshPosters { limit } => {
            let report = service.refresh_posters(limit).await?;
            println!(
                "Posters: {} checked, {} updated, {} unresolved",
                report.checked, report.updated, report.unresolved
            );
        }
        Commands::Stats => {
            let counts = service.catalog_counts().await?;
            println!(
                "Catalog: {} anime, {} genres, {} studios",
                counts.anime, counts.genres, counts.studios
            );
        }
    }

    Ok(())
}
