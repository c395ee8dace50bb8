use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use pv_sanitizer::cli::{Args, summary};
use pv_sanitizer::{FixedTimezone, Sanitizer, io};
use std::process;
use std::time::Instant;
use tracing::{debug, info};

fn main() {
    let args = Args::parse();
    setup_logging(args.verbose);

    if let Err(error) = run(&args) {
        eprintln!("{} {:#}", "Error:".bright_red().bold(), error);
        process::exit(1);
    }
}

/// Set up structured logging based on CLI arguments
fn setup_logging(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pv_sanitizer={}", log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr),
        )
        .init();

    debug!("Logging initialized at level: {}", log_level);
}

fn run(args: &Args) -> Result<()> {
    let start_time = Instant::now();

    let array = io::read_array_metadata_csv(&args.array)
        .with_context(|| format!("Failed to load array metadata from {}", args.array.display()))?;
    let telemetry = io::read_series_csv(&args.telemetry)
        .with_context(|| format!("Failed to load telemetry from {}", args.telemetry.display()))?;
    let weather = io::read_series_csv(&args.weather)
        .with_context(|| format!("Failed to load weather from {}", args.weather.display()))?;

    let sanitizer = Sanitizer::new(
        args.site_metadata(),
        array,
        &FixedTimezone(args.timezone.clone()),
    )
    .context("Invalid site configuration")?
    .with_config(args.sanitizer_config());
    debug!("Effective configuration: {:?}", sanitizer.config());

    let result = sanitizer
        .run(&telemetry, &weather)
        .context("Sanitization failed")?;

    let output_path = args.get_output_path();
    io::write_series_csv(&result.sanitized, &output_path)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;
    info!("Sanitized telemetry written to {}", output_path.display());

    if let Some(path) = &args.clear_sky_output {
        io::write_series_csv(&result.clear_sky, path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Clear-sky reference written to {}", path.display());
    }

    if let Some(path) = &args.report_output {
        let mut report = io::report_to_dataframe(&result.report)?;
        io::write_csv(&mut report, path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        let mut breakdown = io::breakdown_to_dataframe(&result.breakdown_post)?;
        let breakdown_path = path.with_file_name(format!(
            "{}_inputs.csv",
            path.file_stem().unwrap_or_default().to_string_lossy()
        ));
        io::write_csv(&mut breakdown, &breakdown_path)
            .with_context(|| format!("Failed to write {}", breakdown_path.display()))?;
        info!("Quality report written to {}", path.display());
    }

    summary::print_summary(&result);
    println!(
        "\n{} in {:.2?}",
        "Done".bright_green().bold(),
        start_time.elapsed()
    );
    Ok(())
}
