//! Regression-based gap filling, one input at a time.
//!
//! Voltage is completed first from irradiance, module temperature and time;
//! current is then completed from the imputed voltage plus the same
//! features. Inputs are independent of each other and may be processed on
//! worker threads.

use super::regression::{RidgeRegression, StandardScaler};
use crate::config::SanitizerConfig;
use crate::error::{Result, SanitizeError};
use crate::models::{Channel, InputId};
use crate::series::{Cell, TimeSeries};
use rayon::prelude::*;
use tracing::{debug, info};

const STAGE: &str = "imputation";

/// Filled channels for one input
#[derive(Debug, Clone, PartialEq)]
pub struct InputImputation {
    pub input: InputId,
    pub voltage: Vec<Cell>,
    pub current: Vec<Cell>,
    /// Cells that were null before and hold a prediction now
    pub imputed_cells: usize,
}

/// Fill the nulls of one channel from a set of predictor channels.
///
/// Rows with the target and every predictor present train the model; null
/// target rows with every predictor present are predicted. Anything else is
/// carried through unchanged. A channel without nulls is returned as is.
/// Every predictor must share the target's length.
pub fn impute_channel(
    input: &InputId,
    channel: Channel,
    target: &[Cell],
    predictors: &[&[Cell]],
    alpha: f64,
) -> Result<Vec<Cell>> {
    if let Some(column) = predictors.iter().find(|column| column.len() != target.len()) {
        return Err(SanitizeError::alignment(format!(
            "input {input} channel {channel}: predictor has {} rows but the target has {}",
            column.len(),
            target.len()
        )));
    }
    if target.iter().all(Option::is_some) {
        return Ok(target.to_vec());
    }

    let features = |row: usize| -> Option<Vec<f64>> {
        predictors.iter().map(|column| column[row]).collect()
    };

    let mut train_x = Vec::new();
    let mut train_y = Vec::new();
    let mut test = Vec::new();
    for (row, value) in target.iter().enumerate() {
        let Some(x) = features(row) else { continue };
        match value {
            Some(y) => {
                train_x.push(x);
                train_y.push(*y);
            }
            None => test.push((row, x)),
        }
    }

    if train_x.is_empty() {
        return Err(SanitizeError::missing_feature(
            input.to_string(),
            channel.tag(),
            STAGE,
            "no rows with the target and all predictors present",
        ));
    }

    let scaler = StandardScaler::fit(&train_x);
    let model = RidgeRegression::new(alpha)
        .fit(&scaler.transform_all(&train_x), &train_y)
        .map_err(|e| {
            SanitizeError::missing_feature(input.to_string(), channel.tag(), STAGE, e.to_string())
        })?;

    let mut filled = target.to_vec();
    for (row, x) in &test {
        filled[*row] = Some(model.predict(&scaler.transform(x)));
    }
    debug!(
        "Input {} channel {}: trained on {} rows, predicted {} rows",
        input,
        channel,
        train_y.len(),
        test.len()
    );
    Ok(filled)
}

/// Predictor column from the aligned weather, required to carry data
fn predictor<'a>(
    weather: &'a TimeSeries,
    input: &InputId,
    channel: Channel,
    target: Channel,
) -> Result<&'a [Cell]> {
    match weather.column(&input.key(channel)) {
        Some(values) if values.iter().any(Option::is_some) => Ok(values),
        Some(_) => Err(SanitizeError::missing_feature(
            input.to_string(),
            channel.tag(),
            STAGE,
            format!("predictor for {target} has no observations"),
        )),
        None => Err(SanitizeError::missing_feature(
            input.to_string(),
            channel.tag(),
            STAGE,
            format!("predictor for {target} is absent"),
        )),
    }
}

fn telemetry_column<'a>(
    telemetry: &'a TimeSeries,
    input: &InputId,
    channel: Channel,
) -> Result<&'a [Cell]> {
    telemetry.column(&input.key(channel)).ok_or_else(|| {
        SanitizeError::missing_feature(
            input.to_string(),
            channel.tag(),
            STAGE,
            "telemetry channel is absent",
        )
    })
}

/// Complete voltage, then current, for one input
pub fn impute_input(
    input: &InputId,
    telemetry: &TimeSeries,
    weather: &TimeSeries,
    alpha: f64,
) -> Result<InputImputation> {
    let voltage = telemetry_column(telemetry, input, Channel::Voltage)?;
    let current = telemetry_column(telemetry, input, Channel::Current)?;

    let needs_voltage = voltage.iter().any(Option::is_none);
    let needs_current = current.iter().any(Option::is_none);
    if !needs_voltage && !needs_current {
        return Ok(InputImputation {
            input: input.clone(),
            voltage: voltage.to_vec(),
            current: current.to_vec(),
            imputed_cells: 0,
        });
    }

    let target = if needs_voltage { Channel::Voltage } else { Channel::Current };
    let irradiance = predictor(weather, input, Channel::Irradiance, target)?;
    let module_temperature = predictor(weather, input, Channel::ModuleTemperature, target)?;
    let seconds: Vec<Cell> = telemetry
        .index()
        .iter()
        .map(|ts| Some(ts.and_utc().timestamp() as f64))
        .collect();

    let filled_voltage = impute_channel(
        input,
        Channel::Voltage,
        voltage,
        &[irradiance, module_temperature, seconds.as_slice()],
        alpha,
    )?;
    let filled_current = impute_channel(
        input,
        Channel::Current,
        current,
        &[filled_voltage.as_slice(), irradiance, module_temperature, seconds.as_slice()],
        alpha,
    )?;

    let gained = |before: &[Cell], after: &[Cell]| {
        before
            .iter()
            .zip(after)
            .filter(|(b, a)| b.is_none() && a.is_some())
            .count()
    };
    let imputed_cells = gained(voltage, filled_voltage.as_slice())
        + gained(current, filled_current.as_slice());

    Ok(InputImputation {
        input: input.clone(),
        voltage: filled_voltage,
        current: filled_current,
        imputed_cells,
    })
}

/// Impute every input of `telemetry` and write the filled channels back.
///
/// `weather` must already be aligned to the telemetry axis.
pub fn impute_missing(
    telemetry: &TimeSeries,
    weather: &TimeSeries,
    config: &SanitizerConfig,
) -> Result<TimeSeries> {
    if telemetry.index() != weather.index() {
        return Err(SanitizeError::alignment(
            "weather must share the telemetry axis before imputation",
        ));
    }

    let inputs: Vec<InputId> = telemetry.inputs().into_iter().collect();
    let alpha = config.ridge_alpha;
    let results: Vec<InputImputation> = if config.parallel_imputation {
        inputs
            .par_iter()
            .map(|input| impute_input(input, telemetry, weather, alpha))
            .collect::<Result<_>>()?
    } else {
        inputs
            .iter()
            .map(|input| impute_input(input, telemetry, weather, alpha))
            .collect::<Result<_>>()?
    };

    let mut imputed = telemetry.clone();
    let mut total = 0;
    for result in results {
        total += result.imputed_cells;
        imputed.insert_column(result.input.key(Channel::Voltage), result.voltage)?;
        imputed.insert_column(result.input.key(Channel::Current), result.current)?;
    }
    info!("Imputed {} cells across {} inputs", total, inputs.len());
    Ok(imputed)
}
