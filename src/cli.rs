//! Command-line interface components.

use crate::config::{ClearSkyModel, SanitizerConfig};
use crate::models::{IrradianceType, SiteMetadata};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "pv-sanitizer")]
#[command(about = "Sanitize photovoltaic telemetry against a clear-sky reference")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Telemetry CSV with a timestamp column and `<group>-<subgroup>-<channel>` columns
    #[arg(value_name = "TELEMETRY")]
    pub telemetry: PathBuf,

    /// Weather CSV keyed the same way as the telemetry
    #[arg(value_name = "WEATHER")]
    pub weather: PathBuf,

    /// Array metadata CSV, one row per input
    #[arg(short, long, value_name = "PATH")]
    pub array: PathBuf,

    /// Site latitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub latitude: f64,

    /// Site longitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub longitude: f64,

    /// Site altitude in metres
    #[arg(long, default_value_t = 0.0)]
    pub altitude: f64,

    /// IANA timezone of the timestamps
    #[arg(long, default_value = "UTC")]
    pub timezone: String,

    /// Whether the weather irradiance is horizontal or in-plane
    #[arg(long, value_enum, default_value = "poa")]
    pub irradiance: IrradianceArg,

    /// Declared telemetry resolution in minutes (inferred when omitted)
    #[arg(long, value_name = "MINUTES")]
    pub telemetry_resolution: Option<u32>,

    /// Declared weather resolution in minutes (inferred when omitted)
    #[arg(long, value_name = "MINUTES")]
    pub weather_resolution: Option<u32>,

    /// Missing percentage above which regression imputation runs
    #[arg(long, value_name = "PCT")]
    pub imputation_threshold: Option<f64>,

    /// Ridge regularization strength
    #[arg(long)]
    pub ridge_alpha: Option<f64>,

    /// Clear-sky value a row must exceed to count as daylight
    #[arg(long, value_name = "W/M2")]
    pub daylight_threshold: Option<f64>,

    /// Multiplier on Isc x strings for the current ceiling
    #[arg(long)]
    pub current_headroom: Option<f64>,

    /// Clear-sky model
    #[arg(long, value_enum, default_value = "solis")]
    pub clear_sky_model: ClearSkyArg,

    /// Linke turbidity for the Ineichen model
    #[arg(long)]
    pub linke_turbidity: Option<f64>,

    /// Ground reflectance for transposition
    #[arg(long)]
    pub albedo: Option<f64>,

    /// Fail instead of estimating missing module temperature from ambient
    #[arg(long)]
    pub no_tmod_estimate: bool,

    /// Fit the per-input regressions on a single thread
    #[arg(long)]
    pub sequential: bool,

    /// Output path for the sanitized telemetry CSV
    #[arg(short, long)]
    pub output_path: Option<PathBuf>,

    /// Also write the clear-sky reference to this CSV
    #[arg(long, value_name = "PATH")]
    pub clear_sky_output: Option<PathBuf>,

    /// Also write the quality report and per-input breakdown to this CSV
    #[arg(long, value_name = "PATH")]
    pub report_output: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IrradianceArg {
    /// Global horizontal irradiance, transposed per input
    Ghi,
    /// Plane-of-array irradiance, used as-is
    Poa,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ClearSkyArg {
    Solis,
    Ineichen,
}

impl Args {
    pub fn site_metadata(&self) -> SiteMetadata {
        SiteMetadata {
            latitude: self.latitude,
            longitude: self.longitude,
            altitude: self.altitude,
            timezone: Some(self.timezone.clone()),
            irradiance_type: match self.irradiance {
                IrradianceArg::Ghi => IrradianceType::Ghi,
                IrradianceArg::Poa => IrradianceType::PlaneOfArray,
            },
            telemetry_resolution_min: self.telemetry_resolution,
            weather_resolution_min: self.weather_resolution,
        }
    }

    /// Defaults overridden by whatever was given on the command line
    pub fn sanitizer_config(&self) -> SanitizerConfig {
        let mut config = SanitizerConfig::default().with_clear_sky_model(match self.clear_sky_model {
            ClearSkyArg::Solis => ClearSkyModel::SimplifiedSolis,
            ClearSkyArg::Ineichen => ClearSkyModel::Ineichen,
        });
        if let Some(pct) = self.imputation_threshold {
            config = config.with_imputation_threshold(pct);
        }
        if let Some(alpha) = self.ridge_alpha {
            config = config.with_ridge_alpha(alpha);
        }
        if let Some(threshold) = self.daylight_threshold {
            config = config.with_daylight_threshold(threshold);
        }
        if let Some(headroom) = self.current_headroom {
            config = config.with_current_headroom(headroom);
        }
        if let Some(albedo) = self.albedo {
            config = config.with_albedo(albedo);
        }
        if let Some(turbidity) = self.linke_turbidity {
            config.linke_turbidity = turbidity;
        }
        if self.no_tmod_estimate {
            config = config.without_module_temperature_estimate();
        }
        if self.sequential {
            config = config.sequential();
        }
        config
    }

    /// Get the output path, defaulting to `<telemetry stem>_sanitized.csv` beside the input
    pub fn get_output_path(&self) -> PathBuf {
        match &self.output_path {
            Some(path) => path.clone(),
            None => sibling_with_suffix(&self.telemetry, "sanitized"),
        }
    }
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy();
    path.with_file_name(format!("{stem}_{suffix}.csv"))
}

/// Terminal rendering of a finished run
pub mod summary {
    use crate::sanitizer::{SanitizationResult, Status};
    use colored::*;

    fn paint(status: Status) -> ColoredString {
        match status {
            Status::Superb => status.as_str().bright_green().bold(),
            Status::Good => status.as_str().green(),
            Status::Normal => status.as_str().yellow(),
            Status::Poor => status.as_str().bright_red().bold(),
        }
    }

    pub fn print_summary(result: &SanitizationResult) {
        println!("\n{}", "Data Quality Report".bright_green().bold());
        for (field, value) in result.report.rows() {
            println!("  {:<36} {}", field.bright_cyan(), value.bright_white().bold());
        }
        println!(
            "  {:<36} {}",
            "Fill strategy".bright_cyan(),
            result.strategy.to_string().bright_white()
        );
        println!(
            "  {:<36} {}",
            "Pre-sanitation status".bright_cyan(),
            paint(result.report.pre_sanitation_status())
        );
        println!(
            "  {:<36} {}",
            "Post-sanitation status".bright_cyan(),
            paint(result.report.post_sanitation_status())
        );

        println!("\n{}", "Per-input availability".bright_yellow());
        for (pre, post) in result.breakdown_pre.iter().zip(&result.breakdown_post) {
            println!(
                "  {:<24} missing {:>6.2}% -> {:>6.2}%",
                format!("{} ({})", pre.name, pre.input),
                pre.missing_pct,
                post.missing_pct
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec![
            "pv-sanitizer",
            "data/telemetry.csv",
            "data/weather.csv",
            "--array",
            "data/array.csv",
            "--latitude",
            "47.37",
            "--longitude",
            "-8.54",
        ];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.get_output_path(), PathBuf::from("data/telemetry_sanitized.csv"));
        assert_eq!(args.sanitizer_config(), SanitizerConfig::default());

        let site = args.site_metadata();
        assert_eq!(site.longitude, -8.54);
        assert_eq!(site.irradiance_type, IrradianceType::PlaneOfArray);
        assert_eq!(site.timezone.as_deref(), Some("UTC"));
    }

    #[test]
    fn test_overrides_reach_config() {
        let args = parse(&[
            "--imputation-threshold",
            "2.5",
            "--clear-sky-model",
            "ineichen",
            "--irradiance",
            "ghi",
            "--sequential",
            "--no-tmod-estimate",
        ]);
        let config = args.sanitizer_config();
        assert_eq!(config.imputation_threshold_pct, 2.5);
        assert_eq!(config.clear_sky_model, ClearSkyModel::Ineichen);
        assert!(!config.parallel_imputation);
        assert!(!config.estimate_module_temperature);
        assert_eq!(args.site_metadata().irradiance_type, IrradianceType::Ghi);
    }

    #[test]
    fn test_missing_array_is_rejected() {
        let result = Args::try_parse_from(["pv-sanitizer", "t.csv", "w.csv", "--latitude", "1", "--longitude", "1"]);
        assert!(result.is_err());
    }
}
