//! Sublingo - subtitle analysis for language learners
//!
//! Command line entry point: decodes SRT/WebVTT files, analyzes them, and manages
//! the stored entries and cached analyses of fetched movies.

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use sublingo::analysis::{AnalysisReport, format_duration};
use sublingo::cli::{Args, CacheAction, Commands};
use sublingo::config::Config;
use sublingo::service::create_service;
use sublingo::workflow::Workflow;

const DEFAULT_CONFIG_FILE: &str = "sublingo.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if std::path::Path::new(DEFAULT_CONFIG_FILE).exists() {
                info!("Found {} in current directory, loading...", DEFAULT_CONFIG_FILE);
                Config::from_file(DEFAULT_CONFIG_FILE)?
            } else {
                Config::default()
            }
        }
    };

    match args.command {
        Commands::Decode { input, format, output } => {
            let workflow = Workflow::new(&config);
            match output {
                Some(output) => {
                    let decoded = workflow.convert_file(&input, &output, format).await?;
                    println!(
                        "Wrote {} entries to {} ({} blocks skipped)",
                        decoded.entries.len(),
                        output.display(),
                        decoded.skipped.len()
                    );
                }
                None => {
                    let decoded = workflow.decode_file(&input, format).await?;
                    print_json(&decoded.entries)?;
                }
            }
        }
        Commands::Analyze { input, format, gap_ms, summary } => {
            if let Some(gap_ms) = gap_ms {
                config.analysis.dialogue_gap_ms = gap_ms;
            }

            let workflow = Workflow::new(&config);
            let file = workflow.analyze_file(&input, format).await?;

            if summary {
                print_summary(&file.report);
            } else {
                print_json(&file.report)?;
            }
        }
        Commands::Batch { input_dir } => {
            let workflow = Workflow::new(&config);
            let items = workflow.process_directory(&input_dir).await?;

            if items.is_empty() {
                println!("No subtitle files found.");
            } else {
                println!("{:<40} {:<8} {:<10} {:<12} {:<18}", "File", "Entries", "Duration", "Vocabulary", "Level");
                println!("{}", "-".repeat(92));

                for item in &items {
                    let name = item
                        .path
                        .strip_prefix(&input_dir)
                        .unwrap_or(&item.path)
                        .display()
                        .to_string();

                    match &item.outcome {
                        Ok(file) => {
                            let summary = file.report.summary();
                            let level = summary
                                .difficulty_level
                                .map(|level| level.to_string())
                                .unwrap_or_else(|| "-".to_string());
                            println!(
                                "{:<40} {:<8} {:<10} {:<12} {:<18}",
                                name, summary.total_subtitles, summary.duration, summary.estimated_vocabulary_size, level
                            );
                        }
                        Err(e) => println!("{:<40} error: {}", name, e),
                    }
                }

                let failed = items.iter().filter(|item| item.outcome.is_err()).count();
                println!("\nAnalyzed {} files, {} failed", items.len() - failed, failed);
            }
        }
        Commands::Fetch { id, language, force } => {
            let language = language.unwrap_or_else(|| config.source.default_language.clone());
            let (service, _) = create_service(&config);

            let fetch = service.fetch_subtitles(&id, &language, force).await?;
            if fetch.cached {
                println!("Using {} stored entries for {}", fetch.entries.len(), fetch.movie_id);
            } else {
                println!(
                    "Stored {} entries for {} ({} blocks skipped)",
                    fetch.entries.len(),
                    fetch.movie_id,
                    fetch.skipped_blocks
                );
            }
        }
        Commands::Report { id, stats } => {
            let (service, _) = create_service(&config);

            if stats {
                print_json(&service.statistics(&id).await?)?;
            } else {
                let analysis = service.analyze(&id).await?;
                if analysis.cached {
                    info!("Report for {} served from cache ({})", id, analysis.created_at);
                }
                print_json(&analysis)?;
            }
        }
        Commands::Cache { action } => {
            let (_, store) = create_service(&config);

            match action {
                CacheAction::List => {
                    let records = store.list_analyses().await?;

                    if records.is_empty() {
                        println!("No cached analyses found.");
                    } else {
                        println!("\nCached Analyses:");
                        println!("{:<20} {:<15} {:<15} {:<18}", "Movie", "Type", "Cached", "Level");
                        println!("{}", "-".repeat(70));

                        for record in records {
                            let cached_ago = Utc::now()
                                .signed_duration_since(record.created_at)
                                .num_milliseconds()
                                .max(0) as u64;
                            let level = record
                                .report
                                .summary()
                                .difficulty_level
                                .map(|level| level.to_string())
                                .unwrap_or_else(|| "-".to_string());

                            println!(
                                "{:<20} {:<15} {:<15} {:<18}",
                                record.movie_id,
                                record.analysis_type,
                                format_duration(cached_ago),
                                level
                            );
                        }
                    }
                }
                CacheAction::Clear => {
                    let count = store.clear_analyses().await?;
                    println!("Cleared {} cached analyses", count);
                }
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_summary(report: &AnalysisReport) {
    let summary = report.summary();
    let level = summary
        .difficulty_level
        .map(|level| level.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    println!("Subtitles:        {}", summary.total_subtitles);
    println!("Duration:         {}", summary.duration);
    println!("Dialogues:        {}", report.dialogue_analysis.total_dialogues);
    println!("Vocabulary size:  {}", summary.estimated_vocabulary_size);
    println!("Difficulty:       {}", level);

    if let Some(recommendations) = &report.learning_recommendations {
        println!("Prerequisite:     {}", recommendations.prerequisite_level);
        println!("Study time:       {}", recommendations.estimated_study_time);
    }
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".sublingo").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "sublingo.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Console output goes to stderr so JSON on stdout stays clean
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(verbose)
        .with_line_number(verbose);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Logging initialized - console: {}, file: {}",
        log_level,
        log_dir.join("sublingo.log").display()
    );

    Ok(())
}
