//! Cloudless-sky irradiance models.

use crate::constants::solar::{
    SEA_LEVEL_PRESSURE, SOLAR_CONSTANT, SOLIS_AOD700, SOLIS_PRECIPITABLE_WATER,
};
use std::f64::consts::PI;

/// Horizontal global, direct normal and horizontal diffuse irradiance, W/m²
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Components {
    pub ghi: f64,
    pub dni: f64,
    pub dhi: f64,
}

impl Components {
    pub const DARK: Components = Components {
        ghi: 0.0,
        dni: 0.0,
        dhi: 0.0,
    };
}

// ===================== ATMOSPHERE =====================

/// Extraterrestrial normal irradiance with the Spencer (1971) eccentricity correction
pub fn extraterrestrial_irradiance(day_of_year: u32) -> f64 {
    let b = 2.0 * PI * (day_of_year as f64 - 1.0) / 365.0;

    let eccentricity_correction = 1.000110
        + 0.034221 * b.cos()
        + 0.001280 * b.sin()
        + 0.000719 * (2.0 * b).cos()
        + 0.000077 * (2.0 * b).sin();

    SOLAR_CONSTANT * eccentricity_correction
}

/// Standard-atmosphere pressure at an altitude, Pa
pub fn altitude_to_pressure(altitude_m: f64) -> f64 {
    100.0 * ((44331.514 - altitude_m) / 11880.516).powf(1.0 / 0.1902632)
}

/// Kasten-Young (1989) relative air mass; infinite with the sun down
pub fn relative_air_mass(zenith_deg: f64) -> f64 {
    if zenith_deg >= 90.0 {
        return f64::INFINITY;
    }
    1.0 / (zenith_deg.to_radians().cos() + 0.50572 * (96.07995 - zenith_deg).powf(-1.6364))
}

// ===================== SIMPLIFIED SOLIS =====================

/// Simplified Solis (Ineichen 2008) at the default aerosol optical depth
/// and precipitable water.
pub fn simplified_solis(apparent_elevation: f64, pressure: f64, dni_extra: f64) -> Components {
    simplified_solis_with(
        apparent_elevation,
        SOLIS_AOD700,
        SOLIS_PRECIPITABLE_WATER,
        pressure,
        dni_extra,
    )
}

/// Simplified Solis with explicit aerosol optical depth at 700 nm and
/// precipitable water in cm.
pub fn simplified_solis_with(
    apparent_elevation: f64,
    aod700: f64,
    precipitable_water: f64,
    pressure: f64,
    dni_extra: f64,
) -> Components {
    if apparent_elevation <= 0.0 {
        return Components::DARK;
    }

    let w = precipitable_water.max(0.2);
    let ln_w = w.ln();
    let ln_p = (pressure / SEA_LEVEL_PRESSURE).ln();
    let sin_elev = apparent_elevation.to_radians().sin();

    // Enhanced extraterrestrial irradiance
    let io0 = 1.08 * w.powf(0.0051);
    let i01 = 0.97 * w.powf(0.032);
    let i02 = 0.12 * w.powf(0.56);
    let i0p = dni_extra * (i02 * aod700 * aod700 + i01 * aod700 + io0 + 0.071 * ln_p);

    // Beam
    let tb1 = 1.82 + 0.056 * ln_w + 0.0071 * ln_w * ln_w;
    let tb0 = 0.33 + 0.045 * ln_w + 0.0096 * ln_w * ln_w;
    let tbp = 0.0089 * w + 0.13;
    let taub = tb1 * aod700 + tb0 + tbp * ln_p;
    let b1 = 0.00925 * aod700 * aod700 + 0.0148 * aod700 - 0.0172;
    let b0 = -0.7565 * aod700 * aod700 + 0.5057 * aod700 + 0.4557;
    let b = b1 * ln_w + b0;
    let dni = i0p * (-taub / sin_elev.powf(b)).exp();

    // Global
    let tg1 = 1.24 + 0.047 * ln_w + 0.0061 * ln_w * ln_w;
    let tg0 = 0.27 + 0.043 * ln_w + 0.0090 * ln_w * ln_w;
    let tgp = 0.0079 * w + 0.1;
    let taug = tg1 * aod700 + tg0 + tgp * ln_p;
    let g = -0.0147 * ln_w - 0.3079 * aod700 * aod700 + 0.2846 * aod700 + 0.3798;
    let ghi = i0p * (-taug / sin_elev.powf(g)).exp() * sin_elev;

    // Diffuse
    let (td4, td3, td2, td1, td0) = if aod700 < 0.05 {
        (
            86.0 * w - 13800.0,
            -3.11 * w + 79.4,
            -0.23 * w + 74.8,
            0.092 * w - 8.86,
            0.0042 * w + 3.12,
        )
    } else {
        (
            -0.21 * w + 11.6,
            0.27 * w - 20.7,
            -0.134 * w + 15.5,
            0.0554 * w - 5.71,
            0.0057 * w + 2.94,
        )
    };
    let tdp = -0.83 * (1.0 + aod700).powf(-17.2);
    let taud = td4 * aod700.powi(4)
        + td3 * aod700.powi(3)
        + td2 * aod700.powi(2)
        + td1 * aod700
        + td0
        + tdp * ln_p;
    let d = -0.337 * aod700 * aod700 + 0.63 * aod700 + 0.116 + ln_p / (18.0 + 152.0 * aod700);
    let dhi = i0p * (-taud / sin_elev.powf(d)).exp();

    Components {
        ghi: ghi.max(0.0),
        dni: dni.max(0.0),
        dhi: dhi.max(0.0),
    }
}

// ===================== INEICHEN-PEREZ =====================

/// Ineichen-Perez clear sky driven by a Linke turbidity factor
pub fn ineichen(
    apparent_zenith: f64,
    altitude_m: f64,
    linke_turbidity: f64,
    dni_extra: f64,
) -> Components {
    if apparent_zenith >= 90.0 {
        return Components::DARK;
    }

    let am_relative = relative_air_mass(apparent_zenith);
    let am = am_relative * altitude_to_pressure(altitude_m) / SEA_LEVEL_PRESSURE;
    if !am.is_finite() || am <= 0.0 {
        return Components::DARK;
    }

    let cos_zenith = apparent_zenith.to_radians().cos().max(0.0);
    let alt = altitude_m.clamp(-500.0, 11000.0);
    let fh1 = (-alt / 8000.0).exp();
    let fh2 = (-alt / 1250.0).exp();
    let cg1 = 5.09e-5 * alt + 0.868;
    let cg2 = 3.92e-5 * alt + 0.0387;
    let tl = linke_turbidity;

    let ghi = cg1 * dni_extra * cos_zenith * (-cg2 * am * (fh1 + fh2 * (tl - 1.0))).exp();

    let b = 0.664 + 0.163 / fh1;
    let bnci = (b * dni_extra * (-0.09 * am * (tl - 1.0)).exp()).max(0.0);
    // Beam can't exceed what the global model allows through
    let bnci_2 = if cos_zenith > 0.0 {
        ((1.0 - (0.1 - 0.2 * (-tl).exp()) / (0.1 + 0.882 / fh1)) / cos_zenith).clamp(0.0, 1e20)
            * ghi
    } else {
        0.0
    };
    let dni = bnci.min(bnci_2);
    let dhi = ghi - dni * cos_zenith;

    Components {
        ghi: ghi.max(0.0),
        dni: dni.max(0.0),
        dhi: dhi.max(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraterrestrial_irradiance_range() {
        // Perihelion early January, aphelion early July
        let jan = extraterrestrial_irradiance(3);
        let jul = extraterrestrial_irradiance(185);
        assert!(jan > 1405.0 && jan < 1420.0, "jan {jan}");
        assert!(jul > 1315.0 && jul < 1330.0, "jul {jul}");
    }

    #[test]
    fn test_pressure_from_altitude() {
        assert!((altitude_to_pressure(0.0) - 101325.0).abs() < 10.0);
        let high = altitude_to_pressure(2000.0);
        assert!(high > 79000.0 && high < 80000.0, "pressure {high}");
    }

    #[test]
    fn test_air_mass() {
        assert!((relative_air_mass(0.0) - 1.0).abs() < 0.01);
        assert!((relative_air_mass(60.0) - 2.0).abs() < 0.02);
        assert!(relative_air_mass(95.0).is_infinite());
    }

    #[test]
    fn test_solis_high_sun_plausible() {
        let cs = simplified_solis(60.0, 101325.0, 1366.1);
        assert!(cs.ghi > 800.0 && cs.ghi < 1100.0, "ghi {}", cs.ghi);
        assert!(cs.dni > 800.0 && cs.dni < 1100.0, "dni {}", cs.dni);
        assert!(cs.dhi > 30.0 && cs.dhi < 200.0, "dhi {}", cs.dhi);
    }

    #[test]
    fn test_solis_dark_below_horizon() {
        assert_eq!(simplified_solis(0.0, 101325.0, 1366.1), Components::DARK);
        assert_eq!(simplified_solis(-10.0, 101325.0, 1366.1), Components::DARK);
    }

    #[test]
    fn test_solis_increases_with_elevation() {
        let low = simplified_solis(10.0, 101325.0, 1366.1);
        let high = simplified_solis(50.0, 101325.0, 1366.1);
        assert!(high.ghi > low.ghi);
    }

    #[test]
    fn test_ineichen_high_sun_plausible() {
        let cs = ineichen(30.0, 0.0, 3.0, 1366.1);
        assert!(cs.ghi > 700.0 && cs.ghi < 1050.0, "ghi {}", cs.ghi);
        assert!(cs.dni > 600.0, "dni {}", cs.dni);
        assert!(cs.dhi >= 0.0);
    }

    #[test]
    fn test_ineichen_turbidity_reduces_beam() {
        let clear = ineichen(30.0, 0.0, 2.0, 1366.1);
        let hazy = ineichen(30.0, 0.0, 6.0, 1366.1);
        assert!(hazy.dni < clear.dni);
        assert_eq!(ineichen(91.0, 0.0, 3.0, 1366.1), Components::DARK);
    }
}
