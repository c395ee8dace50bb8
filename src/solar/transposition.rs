//! Transposition of horizontal irradiance onto a tilted plane.

use super::clearsky::Components;
use super::position::SolarPosition;
use crate::config::TranspositionModel;
use crate::constants::solar::MIN_COS_ZENITH;

/// Orientation of a module plane, degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    pub tilt: f64,
    /// Clockwise from north
    pub azimuth: f64,
}

/// Cosine of the angle between the sun and the surface normal
pub fn cos_angle_of_incidence(surface: Surface, zenith: f64, azimuth: f64) -> f64 {
    let tilt = surface.tilt.to_radians();
    let zenith = zenith.to_radians();
    let cos_aoi = zenith.cos() * tilt.cos()
        + zenith.sin() * tilt.sin() * (azimuth - surface.azimuth).to_radians().cos();
    cos_aoi.clamp(-1.0, 1.0)
}

/// Plane-of-array global irradiance
pub fn plane_of_array(
    model: TranspositionModel,
    surface: Surface,
    position: &SolarPosition,
    irradiance: Components,
    albedo: f64,
) -> f64 {
    match model {
        TranspositionModel::Isotropic => isotropic(surface, position, irradiance, albedo),
    }
}

/// Isotropic sky: beam + uniform sky dome diffuse + ground reflection.
///
/// With the sun on or below the horizon only the diffuse terms remain.
pub fn isotropic(
    surface: Surface,
    position: &SolarPosition,
    irradiance: Components,
    albedo: f64,
) -> f64 {
    let cos_tilt = surface.tilt.to_radians().cos();
    let sky_diffuse = irradiance.dhi * (1.0 + cos_tilt) / 2.0;
    let ground_diffuse = irradiance.ghi * albedo * (1.0 - cos_tilt) / 2.0;

    let cos_zenith = position.apparent_zenith.to_radians().cos();
    let beam = if cos_zenith > MIN_COS_ZENITH {
        let cos_aoi = cos_angle_of_incidence(surface, position.apparent_zenith, position.azimuth);
        (irradiance.dni * cos_aoi).max(0.0)
    } else {
        0.0
    };

    (beam + sky_diffuse + ground_diffuse).max(0.0)
}
