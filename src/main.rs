use chrono::Utc;
use clap::Parser;
use historic_borders::config::{Command, ExportArgs};
use historic_borders::core::etl::{EtlEngine, ExportOutcome};
use historic_borders::core::points::PointsStore;
use historic_borders::core::presenter::TracingPresenter;
use historic_borders::core::sealed::SealingKey;
use historic_borders::core::session::{Commit, TimelineSession};
use historic_borders::core::year_format::{data_token, display_label};
use historic_borders::core::ConfigProvider;
use historic_borders::domain::model::MapEvent;
use historic_borders::utils::error::ErrorSeverity;
use historic_borders::utils::{logger, validation::Validate};
use historic_borders::{
    BorderPipeline, CliConfig, HttpYearSource, LocalStorage, Partitioner, Result, TomlConfig,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting historic-borders");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match cli.resolve().and_then(|config| config.validate().map(|_| config)) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    let result = match &cli.command {
        Command::Years => print_years(&config),
        Command::Export(args) => run_export(&config, args).await,
        Command::Browse(_) => run_browse(&config).await,
    };

    if let Err(e) = result {
        tracing::error!(
            "❌ {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

fn print_years(config: &TomlConfig) -> Result<()> {
    let timeline = config.timeline()?;
    println!("{:>5}  {:>10}  token", "index", "year");
    for (index, label, token) in timeline.entries() {
        println!("{:>5}  {:>10}  {}", index, label, token);
    }
    Ok(())
}

async fn run_export(config: &TomlConfig, args: &ExportArgs) -> Result<()> {
    let timeline = config.timeline()?;
    let years = if args.all {
        timeline.years().to_vec()
    } else if args.years.is_empty() {
        vec![timeline.current_year()]
    } else {
        args.years.clone()
    };

    for &year in &years {
        if timeline.index_of(year).is_none() {
            tracing::warn!(
                "{} is not on the timeline; trying token {} anyway",
                display_label(year),
                data_token(year)
            );
        }
    }

    let source = HttpYearSource::new(config.dataset_base_url(), config.request_timeout())?;
    let storage = LocalStorage::new(config.output_path());
    let pipeline = BorderPipeline::new(storage, source, config.clone());
    let engine = EtlEngine::new_with_monitoring(pipeline, config.monitoring_enabled());

    let exports = engine.run(&years).await?;

    let mut failures = 0;
    for export in &exports {
        let label = display_label(export.year);
        match &export.outcome {
            ExportOutcome::Written {
                location,
                borders,
                labels,
                skipped,
            } => {
                println!(
                    "✅ {:>10}: {} borders, {} labels, {} skipped -> {}",
                    label, borders, labels, skipped, location
                );
            }
            ExportOutcome::NoData => println!("📭 {:>10}: no data", label),
            ExportOutcome::FetchFailed { message } => {
                failures += 1;
                println!("❌ {:>10}: {}", label, message);
            }
        }
    }

    if failures > 0 {
        eprintln!("❌ {} of {} year(s) could not be fetched", failures, exports.len());
        std::process::exit(2);
    }

    Ok(())
}

const BROWSE_HELP: &str = "commands: next | prev | goto <index> | year <year> | zoom <level> | style | redeem | status | help | quit";

async fn run_browse(config: &TomlConfig) -> Result<()> {
    let timeline = config.timeline()?;
    let start = timeline.index() as i64;
    let source = HttpYearSource::new(config.dataset_base_url(), config.request_timeout())?;
    let session = Arc::new(
        TimelineSession::new(source, timeline, Partitioner::new(config.label_precision()))
            .with_presenter(Box::new(TracingPresenter::new())),
    );

    let points_storage = LocalStorage::new(&config.points.store_dir);
    let key = SealingKey::resolve(
        config.points.key.as_deref(),
        &points_storage,
        &config.points.key_file,
    )
    .await?;
    let mut points = PointsStore::load(
        points_storage,
        config.points.store_file.clone(),
        key,
        config.points.milestones.clone(),
    )
    .await?;

    let (commits_tx, mut commits_rx) = mpsc::unbounded_channel::<Commit>();
    let navigate = |target: Navigate| {
        let session = Arc::clone(&session);
        let commits_tx = commits_tx.clone();
        tokio::spawn(async move {
            let commit = match target {
                Navigate::Index(index) => session.select(index).await,
                Navigate::Step(delta) => session.step(delta).await,
            };
            let _ = commits_tx.send(commit);
        });
    };

    println!("{}", BROWSE_HELP);
    navigate(Navigate::Index(start));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let mut parts = line.split_whitespace();
                match (parts.next(), parts.next()) {
                    (Some("next" | "n"), _) => navigate(Navigate::Step(1)),
                    (Some("prev" | "p"), _) => navigate(Navigate::Step(-1)),
                    (Some("goto"), Some(arg)) => match arg.parse::<i64>() {
                        Ok(index) => navigate(Navigate::Index(index)),
                        Err(_) => println!("not an index: {}", arg),
                    },
                    (Some("year"), Some(arg)) => match arg.parse::<i32>() {
                        Ok(year) => match session.timeline().await.index_of(year) {
                            Some(index) => navigate(Navigate::Index(index as i64)),
                            None => println!("{} is not on the timeline", display_label(year)),
                        },
                        Err(_) => println!("not a year: {}", arg),
                    },
                    (Some("zoom"), Some(arg)) => match arg.parse::<f64>() {
                        Ok(zoom) => session.handle_map_event(MapEvent::ZoomChanged(zoom)).await,
                        Err(_) => println!("not a zoom level: {}", arg),
                    },
                    (Some("style"), _) => session.handle_map_event(MapEvent::StyleLoaded).await,
                    (Some("redeem"), _) => match points.redeem(Utc::now()).await? {
                        Some(milestone) => println!(
                            "🎉 Redeemed {} points for {} ad-free minutes",
                            milestone.points, milestone.ad_free_minutes
                        ),
                        None => println!("No milestone reached yet ({} points)", points.ledger().points),
                    },
                    (Some("status"), _) => print_status(&session, &points).await,
                    (Some("quit" | "q" | "exit"), _) => break,
                    (None, _) => {}
                    _ => println!("{}", BROWSE_HELP),
                }
            }
            Some(commit) = commits_rx.recv() => {
                match commit {
                    Commit::Applied { year, borders, labels, skipped } => {
                        let total = points.award(config.points.per_view).await?;
                        println!(
                            "🗺️  {}: {} countries, {} labels{} | {} points",
                            display_label(year),
                            borders,
                            labels,
                            if skipped > 0 { format!(", {} skipped", skipped) } else { String::new() },
                            total
                        );
                    }
                    Commit::NoData { year } => println!("📭 {}: no data, map cleared", display_label(year)),
                    Commit::Failed { year, .. } => {
                        println!("⚠️  {}: could not load, keeping previous map", display_label(year))
                    }
                    Commit::Stale { year } => tracing::debug!("Dropped stale result for {}", display_label(year)),
                }
            }
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum Navigate {
    Index(i64),
    Step(i64),
}

async fn print_status<S: historic_borders::core::Storage>(
    session: &TimelineSession<HttpYearSource>,
    points: &PointsStore<S>,
) {
    let timeline = session.timeline().await;
    let now = Utc::now();
    println!(
        "index {}/{} ({}), showing {}, zoom {:.1}",
        timeline.index(),
        timeline.len() - 1,
        display_label(timeline.current_year()),
        session
            .displayed_year()
            .await
            .map(display_label)
            .unwrap_or_else(|| "nothing".to_string()),
        session.zoom().await
    );
    match points.ledger().remaining_ad_free(now) {
        Some(left) => println!(
            "{} points, ad-free for {} more minutes",
            points.ledger().points,
            left.num_minutes()
        ),
        None => println!("{} points", points.ledger().points),
    }
}
