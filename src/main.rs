use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use transcript_cascade::cli::{Cli, Commands};
use transcript_cascade::config::Config;
use transcript_cascade::identifier::{self, VideoId};
use transcript_cascade::output;
use transcript_cascade::pipeline::TranscriptPipeline;

fn init_tracing(cli: &Cli) {
    let default_filter = if cli.verbose {
        "transcript_cascade=debug"
    } else {
        "transcript_cascade=info"
    };
    let registry = tracing_subscriber::registry().with(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| default_filter.into()),
    );

    if cli.log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn spinner(quiet: bool, message: String) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let progress = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        progress.set_style(template);
    }
    progress.set_message(message);
    progress.enable_steady_tick(Duration::from_millis(120));
    progress
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let config = Config::load(cli.config.as_deref()).await?;

    match &cli.command {
        Commands::Fetch { url, output, format } => {
            let pipeline = TranscriptPipeline::from_config(&config)?;

            tracing::info!("Starting transcript fetch for URL: {}", url);

            let progress = spinner(cli.quiet, format!("Fetching transcript for {}", url));
            let result = pipeline.get_transcript(url).await;
            progress.finish_and_clear();
            let transcript = result?;

            match output {
                Some(path) => {
                    output::save_to_file(&transcript, path, format).await?;
                    println!(
                        "Transcript for {} ({}) saved to: {}",
                        transcript.video_id,
                        transcript.source,
                        path.display()
                    );
                }
                None => {
                    output::print_to_console(&transcript, format)?;
                }
            }
        }
        Commands::Extract { url } => {
            let (video_id, shape) = identifier::extract_with_shape(url)?;
            println!("{}\t{}", video_id, shape);
        }
        Commands::Probe { ids } => {
            let pipeline = TranscriptPipeline::from_config(&config)?;
            let ids: Vec<String> = if ids.is_empty() {
                pipeline.cache().ids().into_iter().map(str::to_string).collect()
            } else {
                ids.clone()
            };

            let mut success_count = 0;
            for raw in &ids {
                let outcome = match VideoId::new(raw) {
                    Ok(video_id) => pipeline.get_transcript_for(&video_id).await,
                    Err(e) => Err(e),
                };
                match outcome {
                    Ok(transcript) => {
                        success_count += 1;
                        println!(
                            "{} {} via {} ({} chars)",
                            style("ok").green().bold(),
                            raw,
                            transcript.source,
                            transcript.full_text.chars().count()
                        );
                    }
                    Err(e) => println!("{} {} {}", style("failed").red().bold(), raw, e),
                }
            }

            println!(
                "Results: {}/{} videos had accessible transcripts",
                success_count,
                ids.len()
            );
        }
        Commands::Sources => {
            let pipeline = TranscriptPipeline::from_config(&config)?;
            println!("Transcript sources, in order:");
            if !pipeline.cache().is_empty() {
                println!("  • cache ({} built-in transcripts)", pipeline.cache().len());
            }
            for name in pipeline.source_names() {
                println!("  • {}", name);
            }
        }
        Commands::Config { show, init } => {
            if *init {
                let path = Config::user_config_path()
                    .context("Could not determine config directory")?;
                Config::default().save(&path).await?;
                println!("Default configuration written to: {}", path.display());
            } else if *show {
                config.display();
            } else {
                println!("Configuration is read from --config, ./transcript-cascade.yaml or:");
                if let Some(path) = Config::user_config_path() {
                    println!("  {}", path.display());
                }
                println!("Run with --show to print the effective settings or --init to write defaults.");
            }
        }
    }

    Ok(())
}
