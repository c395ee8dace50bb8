//! Solar position from the NOAA fractional-year equations.
//!
//! Accuracy is well within a degree, which is ample for a reference curve
//! used to separate day from night and to bound expected irradiance.

use chrono::{Datelike, NaiveDateTime, Timelike};
use std::f64::consts::PI;

/// Sun position at one instant. All angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarPosition {
    /// Geometric zenith angle
    pub zenith: f64,
    /// Zenith corrected for atmospheric refraction
    pub apparent_zenith: f64,
    /// Clockwise from north
    pub azimuth: f64,
}

impl SolarPosition {
    pub fn elevation(&self) -> f64 {
        90.0 - self.zenith
    }

    pub fn apparent_elevation(&self) -> f64 {
        90.0 - self.apparent_zenith
    }
}

/// Calculate the sun position for a UTC instant at the given coordinates
pub fn solar_position(utc: NaiveDateTime, latitude: f64, longitude: f64) -> SolarPosition {
    let year = utc.year();
    let is_leap_year = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
    let days_in_year = if is_leap_year { 366.0 } else { 365.0 };

    let hour = utc.hour() as f64 + utc.minute() as f64 / 60.0 + utc.second() as f64 / 3600.0;
    let gamma = 2.0 * PI / days_in_year * (utc.ordinal() as f64 - 1.0 + (hour - 12.0) / 24.0);

    // Equation of time, minutes
    let eqtime = 229.18
        * (0.000075 + 0.001868 * gamma.cos()
            - 0.032077 * gamma.sin()
            - 0.014615 * (2.0 * gamma).cos()
            - 0.040849 * (2.0 * gamma).sin());

    // Declination, radians
    let decl = 0.006918 - 0.399912 * gamma.cos() + 0.070257 * gamma.sin()
        - 0.006758 * (2.0 * gamma).cos()
        + 0.000907 * (2.0 * gamma).sin()
        - 0.002697 * (3.0 * gamma).cos()
        + 0.00148 * (3.0 * gamma).sin();

    let true_solar_minutes = hour * 60.0 + eqtime + 4.0 * longitude;
    let hour_angle = (true_solar_minutes / 4.0 - 180.0).to_radians();

    let lat = latitude.to_radians();
    let cos_zenith = (lat.sin() * decl.sin() + lat.cos() * decl.cos() * hour_angle.cos())
        .clamp(-1.0, 1.0);
    let zenith = cos_zenith.acos().to_degrees();

    let azimuth = (hour_angle
        .sin()
        .atan2(hour_angle.cos() * lat.sin() - decl.tan() * lat.cos())
        .to_degrees()
        + 180.0)
        .rem_euclid(360.0);

    let elevation = 90.0 - zenith;
    let apparent_zenith = 90.0 - (elevation + refraction_correction(elevation));

    SolarPosition {
        zenith,
        apparent_zenith,
        azimuth,
    }
}

/// Atmospheric refraction (NOAA approximation), degrees
fn refraction_correction(elevation: f64) -> f64 {
    let arcsec = if elevation > 85.0 {
        0.0
    } else if elevation > 5.0 {
        let t = elevation.to_radians().tan();
        58.1 / t - 0.07 / t.powi(3) + 0.000086 / t.powi(5)
    } else if elevation > -0.575 {
        1735.0
            + elevation * (-518.2 + elevation * (103.4 + elevation * (-12.79 + elevation * 0.711)))
    } else {
        -20.772 / elevation.to_radians().tan()
    };
    arcsec / 3600.0
}
