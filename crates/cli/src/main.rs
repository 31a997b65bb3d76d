//! StepProof CLI - Main Entry Point
//!
//! Compares a recorded test run's planning log against its proofs
//! video and reports, per planned step, whether the step was observed
//! or deviated from.

use std::path::PathBuf;

use clap::Parser;

mod output;

use stepproof_core::{report, sampler, Analyzer, AnalyzerConfig, LlmConfig, OpenAiVisionClient};

/// StepProof - Plan-versus-video deviation analysis
#[derive(Parser)]
#[command(name = "stepproof")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the planning log JSON file (agent_inner_thoughts.json)
    #[arg(long = "planning_log")]
    planning_log: PathBuf,

    /// Path to the final output HTML file (test.feature_result.html)
    #[arg(long = "final_output")]
    final_output: PathBuf,

    /// Seconds between sampled video frames
    #[arg(long, default_value_t = 1.0)]
    interval_secs: f64,

    /// Output format
    #[arg(long, default_value = "table")]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    sampler::check_tools_available().await;

    let config = AnalyzerConfig {
        interval_secs: cli.interval_secs,
        llm: LlmConfig::from_env(),
    };
    let client = OpenAiVisionClient::new(config.llm.clone())?;
    let analyzer = Analyzer::new(&config, client);

    let deviation_report = analyzer.analyze(&cli.planning_log, &cli.final_output).await;

    println!("Deviation Report:");
    output::print_report(&deviation_report, cli.format);

    report::write_report(&deviation_report, &cli.final_output)?;

    if deviation_report.is_failure() {
        std::process::exit(1);
    }
    Ok(())
}
