//! Module temperature estimate from ambient temperature and irradiance.

use crate::constants::module_temperature::SANDIA_A;
use crate::error::Result;
use crate::models::{Channel, InputId};
use crate::series::{Cell, TimeSeries};
use tracing::info;

/// Sandia module temperature with no wind: `G · e^a + Tamb`
pub fn sandia_module_temperature(irradiance: f64, ambient: f64) -> f64 {
    irradiance * SANDIA_A.exp() + ambient
}

/// Fill an absent or entirely null `Tmod` column from `G` and `Tamb`.
///
/// Inputs that already report module temperature, or lack ambient
/// temperature, are left untouched. Returns the number of inputs estimated.
pub fn estimate_module_temperature<'a>(
    weather: &mut TimeSeries,
    inputs: impl IntoIterator<Item = &'a InputId>,
) -> Result<usize> {
    let mut estimated = 0;
    for input in inputs {
        let tmod_key = input.key(Channel::ModuleTemperature);
        let has_tmod = weather
            .column(&tmod_key)
            .is_some_and(|values| values.iter().any(Option::is_some));
        if has_tmod {
            continue;
        }
        let (Some(irradiance), Some(ambient)) = (
            weather.column(&input.key(Channel::Irradiance)),
            weather.column(&input.key(Channel::AmbientTemperature)),
        ) else {
            continue;
        };
        if ambient.iter().all(Option::is_none) {
            continue;
        }

        let values: Vec<Cell> = irradiance
            .iter()
            .zip(ambient)
            .map(|(g, t)| match (g, t) {
                (Some(g), Some(t)) => Some(sandia_module_temperature(*g, *t)),
                _ => None,
            })
            .collect();
        weather.insert_column(tmod_key, values)?;
        info!("Estimated module temperature for input {} from ambient", input);
        estimated += 1;
    }
    Ok(estimated)
}
