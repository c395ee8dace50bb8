//! Solar geometry and the clear-sky reference engine.
//!
//! Everything here is a pure function of the timestamp axis and the site and
//! array metadata: recomputing with the same inputs yields bit-identical
//! output.

pub mod clearsky;
pub mod decomposition;
pub mod position;
pub mod transposition;

pub use clearsky::Components;
pub use position::{SolarPosition, solar_position};
pub use transposition::Surface;

use crate::config::{ClearSkyModel, SanitizerConfig};
use crate::error::Result;
use crate::models::{ArrayMetadata, Channel, InputId, IrradianceType, SiteMetadata};
use crate::series::TimeSeries;
use crate::timezone::local_to_utc;
use chrono::{Datelike, NaiveDateTime};
use chrono_tz::Tz;
use tracing::{debug, info};

/// Sun position and extraterrestrial irradiance along a site-local axis
#[derive(Debug, Clone)]
pub struct SolarGeometry {
    positions: Vec<SolarPosition>,
    dni_extra: Vec<f64>,
}

impl SolarGeometry {
    /// Compute geometry for each site-local timestamp
    pub fn compute(index: &[NaiveDateTime], site: &SiteMetadata, tz: &Tz) -> Self {
        let (positions, dni_extra) = index
            .iter()
            .map(|local| {
                let utc = local_to_utc(tz, *local);
                (
                    solar_position(utc, site.latitude, site.longitude),
                    clearsky::extraterrestrial_irradiance(utc.ordinal()),
                )
            })
            .unzip();
        Self {
            positions,
            dni_extra,
        }
    }

    pub fn positions(&self) -> &[SolarPosition] {
        &self.positions
    }

    pub fn dni_extra(&self) -> &[f64] {
        &self.dni_extra
    }

    /// Modeled cloudless-sky horizontal irradiance for every timestamp
    pub fn clear_sky(&self, site: &SiteMetadata, config: &SanitizerConfig) -> Vec<Components> {
        let pressure = clearsky::altitude_to_pressure(site.altitude);
        self.positions
            .iter()
            .zip(&self.dni_extra)
            .map(|(pos, &dni_extra)| match config.clear_sky_model {
                ClearSkyModel::SimplifiedSolis => {
                    clearsky::simplified_solis(pos.apparent_elevation(), pressure, dni_extra)
                }
                ClearSkyModel::Ineichen => clearsky::ineichen(
                    pos.apparent_zenith,
                    site.altitude,
                    config.linke_turbidity,
                    dni_extra,
                ),
            })
            .collect()
    }
}

/// Surface orientation of every input, failing on the first one without it
fn surfaces(array: &ArrayMetadata) -> Result<Vec<(InputId, Surface)>> {
    array
        .inputs()
        .iter()
        .map(|input| {
            let (tilt, azimuth) = input.orientation()?;
            Ok((input.id.clone(), Surface { tilt, azimuth }))
        })
        .collect()
}

/// Clear-sky plane-of-array irradiance for every input.
///
/// Returns one `CS_G` column per input on the given axis.
pub fn clear_sky_reference(
    index: &[NaiveDateTime],
    site: &SiteMetadata,
    array: &ArrayMetadata,
    tz: &Tz,
    config: &SanitizerConfig,
) -> Result<TimeSeries> {
    let surfaces = surfaces(array)?;
    let geometry = SolarGeometry::compute(index, site, tz);
    let horizontal = geometry.clear_sky(site, config);

    let mut reference = TimeSeries::new(index.to_vec())?;
    for (id, surface) in surfaces {
        let values = geometry
            .positions()
            .iter()
            .zip(&horizontal)
            .map(|(pos, &irradiance)| {
                Some(transposition::plane_of_array(
                    config.transposition_model,
                    surface,
                    pos,
                    irradiance,
                    config.albedo,
                ))
            })
            .collect();
        reference.insert_column(id.key(Channel::ClearSky), values)?;
    }

    info!(
        "Computed {:?} clear-sky reference for {} inputs over {} timestamps",
        config.clear_sky_model,
        reference.width(),
        reference.len()
    );
    Ok(reference)
}

/// Plane-of-array irradiance the inputs actually saw.
///
/// For a GHI site every input's `GHI` column is decomposed (Erbs) and
/// transposed onto that input's surface as its `G` column. A POA site's
/// weather is returned unchanged.
pub fn operational_irradiance(
    weather: &TimeSeries,
    site: &SiteMetadata,
    array: &ArrayMetadata,
    tz: &Tz,
    config: &SanitizerConfig,
) -> Result<TimeSeries> {
    if site.irradiance_type == IrradianceType::PlaneOfArray {
        return Ok(weather.clone());
    }

    let geometry = SolarGeometry::compute(weather.index(), site, tz);
    let mut transposed = weather.clone();
    for (id, surface) in surfaces(array)? {
        let Some(ghi) = transposed.remove_column(&id.key(Channel::Ghi)) else {
            debug!("No GHI measurement for input {}", id);
            continue;
        };
        let poa = ghi
            .iter()
            .zip(geometry.positions())
            .zip(geometry.dni_extra())
            .map(|((cell, pos), &dni_extra)| {
                cell.map(|ghi| {
                    let parts = decomposition::erbs(ghi, pos.zenith, dni_extra);
                    transposition::plane_of_array(
                        config.transposition_model,
                        surface,
                        pos,
                        parts,
                        config.albedo,
                    )
                })
            })
            .collect();
        transposed.insert_column(id.key(Channel::Irradiance), poa)?;
        debug!("Transposed measured GHI onto the plane of input {}", id);
    }
    Ok(transposed)
}
