//! Configuration management and validation.
//!
//! Provides the policy knobs for every sanitization stage. A configuration is
//! passed explicitly into each stage; nothing is read from process-wide state.

use crate::constants::*;
use crate::error::{Result, SanitizeError};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Clear-sky irradiance models
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ClearSkyModel {
    /// Simplified Solis (Ineichen 2008) with fixed aerosol and water content
    SimplifiedSolis,
    /// Ineichen-Perez driven by a Linke turbidity factor
    Ineichen,
}

/// Diffuse-sky transposition models
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TranspositionModel {
    /// Uniform sky dome
    Isotropic,
}

/// Global configuration for a sanitization run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanitizerConfig {
    /// Clear-sky value that must be exceeded for a row to count as daylight
    pub daylight_threshold: f64,

    /// Exclusive lower irradiance bound
    pub irradiance_low: f64,

    /// Exclusive upper irradiance bound
    pub irradiance_high: f64,

    /// Multiplier on Isc × strings for the current ceiling
    pub current_headroom: f64,

    /// Missing percentage above which regression imputation is used
    pub imputation_threshold_pct: f64,

    /// Ridge regularization strength
    pub ridge_alpha: f64,

    pub clear_sky_model: ClearSkyModel,

    pub transposition_model: TranspositionModel,

    /// Ground reflectance for transposition
    pub albedo: f64,

    /// Linke turbidity (Ineichen model only)
    pub linke_turbidity: f64,

    /// Estimate module temperature from ambient temperature when absent
    pub estimate_module_temperature: bool,

    /// Fit per-input regressions on worker threads
    pub parallel_imputation: bool,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            daylight_threshold: DEFAULT_DAYLIGHT_THRESHOLD,
            irradiance_low: DEFAULT_IRRADIANCE_LOW,
            irradiance_high: DEFAULT_IRRADIANCE_HIGH,
            current_headroom: DEFAULT_CURRENT_HEADROOM,
            imputation_threshold_pct: DEFAULT_IMPUTATION_THRESHOLD_PCT,
            ridge_alpha: DEFAULT_RIDGE_ALPHA,
            clear_sky_model: ClearSkyModel::SimplifiedSolis,
            transposition_model: TranspositionModel::Isotropic,
            albedo: DEFAULT_ALBEDO,
            linke_turbidity: DEFAULT_LINKE_TURBIDITY,
            estimate_module_temperature: true,
            parallel_imputation: true,
        }
    }
}

impl SanitizerConfig {
    /// Set the daylight threshold
    pub fn with_daylight_threshold(mut self, threshold: f64) -> Self {
        self.daylight_threshold = threshold;
        self
    }

    /// Set the exclusive irradiance bounds
    pub fn with_irradiance_bounds(mut self, low: f64, high: f64) -> Self {
        self.irradiance_low = low;
        self.irradiance_high = high;
        self
    }

    /// Set the current headroom multiplier
    pub fn with_current_headroom(mut self, headroom: f64) -> Self {
        self.current_headroom = headroom;
        self
    }

    /// Set the missingness threshold that gates regression imputation
    pub fn with_imputation_threshold(mut self, pct: f64) -> Self {
        self.imputation_threshold_pct = pct;
        self
    }

    /// Set the ridge regularization strength
    pub fn with_ridge_alpha(mut self, alpha: f64) -> Self {
        self.ridge_alpha = alpha;
        self
    }

    /// Select the clear-sky model
    pub fn with_clear_sky_model(mut self, model: ClearSkyModel) -> Self {
        self.clear_sky_model = model;
        self
    }

    /// Set the ground albedo
    pub fn with_albedo(mut self, albedo: f64) -> Self {
        self.albedo = albedo;
        self
    }

    /// Disable the module temperature estimate
    pub fn without_module_temperature_estimate(mut self) -> Self {
        self.estimate_module_temperature = false;
        self
    }

    /// Run per-input imputation on the calling thread only
    pub fn sequential(mut self) -> Self {
        self.parallel_imputation = false;
        self
    }

    /// Check the knobs for internal consistency
    pub fn validate(&self) -> Result<()> {
        let finite = [
            ("daylight_threshold", self.daylight_threshold),
            ("irradiance_low", self.irradiance_low),
            ("irradiance_high", self.irradiance_high),
            ("current_headroom", self.current_headroom),
            ("imputation_threshold_pct", self.imputation_threshold_pct),
            ("ridge_alpha", self.ridge_alpha),
            ("albedo", self.albedo),
            ("linke_turbidity", self.linke_turbidity),
        ];
        if let Some((name, _)) = finite.iter().find(|(_, value)| !value.is_finite()) {
            return Err(SanitizeError::configuration(format!("{name} must be finite")));
        }
        if self.irradiance_low >= self.irradiance_high {
            return Err(SanitizeError::configuration(format!(
                "irradiance bounds are empty: low {} >= high {}",
                self.irradiance_low, self.irradiance_high
            )));
        }
        if self.current_headroom <= 0.0 {
            return Err(SanitizeError::configuration("current headroom must be positive"));
        }
        if self.ridge_alpha < 0.0 {
            return Err(SanitizeError::configuration("ridge alpha must not be negative"));
        }
        if !(0.0..=1.0).contains(&self.albedo) {
            return Err(SanitizeError::configuration("albedo must lie in [0, 1]"));
        }
        if self.imputation_threshold_pct < 0.0 {
            return Err(SanitizeError::configuration(
                "imputation threshold must not be negative",
            ));
        }

        debug!("Sanitizer configuration validated: {:?}", self);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SanitizerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.daylight_threshold, 10.0);
        assert_eq!(config.imputation_threshold_pct, 0.5);
        assert_eq!(config.ridge_alpha, 1.0);
        assert_eq!(config.clear_sky_model, ClearSkyModel::SimplifiedSolis);
    }

    #[test]
    fn test_builder_methods() {
        let config = SanitizerConfig::default()
            .with_imputation_threshold(2.0)
            .with_ridge_alpha(0.1)
            .with_irradiance_bounds(10.0, 1500.0)
            .sequential();
        assert_eq!(config.imputation_threshold_pct, 2.0);
        assert_eq!(config.ridge_alpha, 0.1);
        assert_eq!(config.irradiance_high, 1500.0);
        assert!(!config.parallel_imputation);
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        let config = SanitizerConfig::default().with_irradiance_bounds(500.0, 100.0);
        assert!(matches!(
            config.validate(),
            Err(SanitizeError::Configuration { .. })
        ));
    }

    #[test]
    fn test_non_finite_knob_rejected() {
        let config = SanitizerConfig::default().with_daylight_threshold(f64::NAN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_alpha_rejected() {
        let config = SanitizerConfig::default().with_ridge_alpha(-1.0);
        assert!(config.validate().is_err());
    }
}
