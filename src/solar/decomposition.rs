//! Erbs decomposition of measured GHI into direct and diffuse parts.

use super::clearsky::Components;
use crate::constants::solar::{CLEARNESS_MIN_COS_ZENITH, ERBS_MAX_ZENITH, MAX_CLEARNESS_INDEX};

/// Ratio of measured GHI to extraterrestrial horizontal irradiance
pub fn clearness_index(ghi: f64, zenith: f64, dni_extra: f64) -> f64 {
    let cos_zenith = zenith.to_radians().cos().max(CLEARNESS_MIN_COS_ZENITH);
    (ghi / (dni_extra * cos_zenith)).clamp(0.0, MAX_CLEARNESS_INDEX)
}

/// Diffuse fraction of GHI as a function of clearness index
fn diffuse_fraction(kt: f64) -> f64 {
    if kt <= 0.22 {
        1.0 - 0.09 * kt
    } else if kt <= 0.8 {
        0.9511 - 0.1604 * kt + 4.388 * kt.powi(2) - 16.638 * kt.powi(3) + 12.336 * kt.powi(4)
    } else {
        0.165
    }
}

/// Split a GHI measurement into DNI and DHI.
///
/// Beyond [`ERBS_MAX_ZENITH`], or for negative inputs, everything is treated
/// as diffuse.
pub fn erbs(ghi: f64, zenith: f64, dni_extra: f64) -> Components {
    let kt = clearness_index(ghi, zenith, dni_extra);
    let dhi = diffuse_fraction(kt) * ghi;
    let dni = (ghi - dhi) / zenith.to_radians().cos();

    if zenith > ERBS_MAX_ZENITH || ghi < 0.0 || !dni.is_finite() || dni < 0.0 {
        return Components {
            ghi,
            dni: 0.0,
            dhi: ghi,
        };
    }
    Components { ghi, dni, dhi }
}
