//! Core data structures for PV sanitization.
//!
//! Defines the composite column key, physical channels, and the static
//! site and array metadata read (never written) by every pipeline stage.

use crate::constants::{COLUMN_SEPARATOR, channel_tags};
use crate::error::{Result, SanitizeError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Physical quantity carried by a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Channel {
    Current,
    Voltage,
    Power,
    Irradiance,
    Ghi,
    AmbientTemperature,
    ModuleTemperature,
    ClearSky,
}

impl Channel {
    /// Channels every telemetry input must carry
    pub const TELEMETRY: [Channel; 3] = [Channel::Current, Channel::Voltage, Channel::Power];

    /// Short tag used in flat column names
    pub fn tag(&self) -> &'static str {
        match self {
            Channel::Current => channel_tags::CURRENT,
            Channel::Voltage => channel_tags::VOLTAGE,
            Channel::Power => channel_tags::POWER,
            Channel::Irradiance => channel_tags::IRRADIANCE,
            Channel::Ghi => channel_tags::GHI,
            Channel::AmbientTemperature => channel_tags::AMBIENT_TEMPERATURE,
            Channel::ModuleTemperature => channel_tags::MODULE_TEMPERATURE,
            Channel::ClearSky => channel_tags::CLEAR_SKY,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Channel {
    type Err = SanitizeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            channel_tags::CURRENT => Ok(Channel::Current),
            channel_tags::VOLTAGE => Ok(Channel::Voltage),
            channel_tags::POWER => Ok(Channel::Power),
            channel_tags::IRRADIANCE => Ok(Channel::Irradiance),
            channel_tags::GHI => Ok(Channel::Ghi),
            channel_tags::AMBIENT_TEMPERATURE => Ok(Channel::AmbientTemperature),
            channel_tags::MODULE_TEMPERATURE => Ok(Channel::ModuleTemperature),
            channel_tags::CLEAR_SKY => Ok(Channel::ClearSky),
            other => Err(SanitizeError::configuration(format!(
                "unknown channel tag '{other}'"
            ))),
        }
    }
}

/// One physical measurement point, e.g. an inverter and one of its MPPT inputs
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InputId {
    pub group: String,
    pub subgroup: String,
}

impl InputId {
    pub fn new(group: impl Into<String>, subgroup: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            subgroup: subgroup.into(),
        }
    }

    /// Key for one channel of this input
    pub fn key(&self, channel: Channel) -> ChannelKey {
        ChannelKey {
            group: self.group.clone(),
            subgroup: self.subgroup.clone(),
            channel,
        }
    }
}

impl fmt::Display for InputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.group, COLUMN_SEPARATOR, self.subgroup)
    }
}

/// Three-part column key: `(group, subgroup, channel)`
///
/// Ordering is group, then subgroup, then channel, so all channels of one
/// input sit next to each other in ordered maps.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChannelKey {
    pub group: String,
    pub subgroup: String,
    pub channel: Channel,
}

impl ChannelKey {
    pub fn new(group: impl Into<String>, subgroup: impl Into<String>, channel: Channel) -> Self {
        Self {
            group: group.into(),
            subgroup: subgroup.into(),
            channel,
        }
    }

    pub fn input(&self) -> InputId {
        InputId::new(self.group.clone(), self.subgroup.clone())
    }

    pub fn belongs_to(&self, input: &InputId) -> bool {
        self.group == input.group && self.subgroup == input.subgroup
    }

    /// Parse a flat `group-subgroup-channel` column name
    pub fn parse_flat(name: &str) -> Result<Self> {
        let parts: Vec<&str> = name.split(COLUMN_SEPARATOR).collect();
        if parts.len() != 3 || parts.iter().any(|p| p.trim().is_empty()) {
            return Err(SanitizeError::configuration(format!(
                "column '{name}' is not of the form group-subgroup-channel"
            )));
        }
        Ok(Self::new(parts[0].trim(), parts[1].trim(), parts[2].trim().parse()?))
    }

    /// Flat `group-subgroup-channel` name used at the CSV boundary
    pub fn flat_name(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}",
            self.group,
            self.subgroup,
            self.channel,
            sep = COLUMN_SEPARATOR
        )
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.flat_name())
    }
}

/// Whether the weather irradiance channel is horizontal or already in-plane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IrradianceType {
    Ghi,
    PlaneOfArray,
}

impl FromStr for IrradianceType {
    type Err = SanitizeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GHI" => Ok(IrradianceType::Ghi),
            "POA" | "G" | "GPOA" => Ok(IrradianceType::PlaneOfArray),
            other => Err(SanitizeError::configuration(format!(
                "unknown irradiance type '{other}' (expected GHI or POA)"
            ))),
        }
    }
}

/// Static attributes of one input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputMetadata {
    pub id: InputId,
    pub name: String,
    /// Degrees from horizontal
    pub surface_tilt: Option<f64>,
    /// Degrees clockwise from north
    pub surface_azimuth: Option<f64>,
    /// Module nameplate short-circuit current, A
    pub i_sc: Option<f64>,
    /// Module nameplate open-circuit voltage, V
    pub v_oc: Option<f64>,
    pub modules_per_string: Option<u32>,
    pub strings_per_input: Option<u32>,
}

impl InputMetadata {
    /// Surface orientation as (tilt, azimuth), failing when either is absent
    pub fn orientation(&self) -> Result<(f64, f64)> {
        match (self.surface_tilt, self.surface_azimuth) {
            (Some(tilt), Some(azimuth)) if tilt.is_finite() && azimuth.is_finite() => {
                Ok((tilt, azimuth))
            }
            _ => Err(SanitizeError::configuration(format!(
                "input '{}' is missing surface tilt or azimuth",
                self.name
            ))),
        }
    }

    /// Upper admissible current: headroom × Isc × strings
    pub fn current_ceiling(&self, headroom: f64) -> Result<f64> {
        match (self.i_sc, self.strings_per_input) {
            (Some(isc), Some(strings)) if isc.is_finite() && isc > 0.0 && strings > 0 => {
                Ok(headroom * isc * strings as f64)
            }
            _ => Err(SanitizeError::configuration(format!(
                "input '{}' needs a positive short-circuit current and string count",
                self.name
            ))),
        }
    }

    /// Upper admissible voltage: Voc × modules per string
    pub fn voltage_ceiling(&self) -> Result<f64> {
        match (self.v_oc, self.modules_per_string) {
            (Some(voc), Some(modules)) if voc.is_finite() && voc > 0.0 && modules > 0 => {
                Ok(voc * modules as f64)
            }
            _ => Err(SanitizeError::configuration(format!(
                "input '{}' needs a positive open-circuit voltage and modules per string",
                self.name
            ))),
        }
    }
}

/// Static attributes of every input on the site
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayMetadata {
    inputs: Vec<InputMetadata>,
}

impl ArrayMetadata {
    pub fn new(inputs: Vec<InputMetadata>) -> Result<Self> {
        let mut seen = std::collections::HashSet::new();
        for input in &inputs {
            if !seen.insert(input.id.clone()) {
                return Err(SanitizeError::configuration(format!(
                    "input {} appears more than once in array metadata",
                    input.id
                )));
            }
        }
        Ok(Self { inputs })
    }

    pub fn inputs(&self) -> &[InputMetadata] {
        &self.inputs
    }

    pub fn ids(&self) -> impl Iterator<Item = &InputId> {
        self.inputs.iter().map(|input| &input.id)
    }

    pub fn get(&self, id: &InputId) -> Option<&InputMetadata> {
        self.inputs.iter().find(|input| &input.id == id)
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

/// Site-wide attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteMetadata {
    pub latitude: f64,
    pub longitude: f64,
    /// Metres above sea level
    pub altitude: f64,
    /// IANA timezone name; looked up from coordinates when absent
    pub timezone: Option<String>,
    pub irradiance_type: IrradianceType,
    /// Declared telemetry resolution in minutes
    pub telemetry_resolution_min: Option<u32>,
    /// Declared weather resolution in minutes
    pub weather_resolution_min: Option<u32>,
}

impl SiteMetadata {
    pub fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(SanitizeError::configuration(format!(
                "latitude {} outside [-90, 90]",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(SanitizeError::configuration(format!(
                "longitude {} outside [-180, 180]",
                self.longitude
            )));
        }
        if !self.altitude.is_finite() {
            return Err(SanitizeError::configuration("altitude must be finite"));
        }
        for (label, value) in [
            ("telemetry", self.telemetry_resolution_min),
            ("weather", self.weather_resolution_min),
        ] {
            if value == Some(0) {
                return Err(SanitizeError::configuration(format!(
                    "{label} resolution must be positive"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(isc: Option<f64>, strings: Option<u32>) -> InputMetadata {
        InputMetadata {
            id: InputId::new("Inv01", "M1"),
            name: "Inv01-M1".to_string(),
            surface_tilt: Some(20.0),
            surface_azimuth: None,
            i_sc: isc,
            v_oc: Some(45.0),
            modules_per_string: Some(20),
            strings_per_input: strings,
        }
    }

    #[test]
    fn test_channel_key_flat_name_round_trip() {
        let key = ChannelKey::parse_flat("Inv01-M1-Tmod").unwrap();
        assert_eq!(key, ChannelKey::new("Inv01", "M1", Channel::ModuleTemperature));
        assert_eq!(key.flat_name(), "Inv01-M1-Tmod");
    }

    #[test]
    fn test_channel_key_rejects_malformed_names() {
        assert!(ChannelKey::parse_flat("Inv01-I").is_err());
        assert!(ChannelKey::parse_flat("Inv01-M1-X").is_err());
        assert!(ChannelKey::parse_flat("Inv01--I").is_err());
    }

    #[test]
    fn test_channel_keys_group_by_input_when_ordered() {
        let mut keys = vec![
            ChannelKey::new("Inv02", "M1", Channel::Current),
            ChannelKey::new("Inv01", "M2", Channel::Voltage),
            ChannelKey::new("Inv01", "M1", Channel::Voltage),
            ChannelKey::new("Inv01", "M1", Channel::Current),
        ];
        keys.sort();
        assert_eq!(keys[0], ChannelKey::new("Inv01", "M1", Channel::Current));
        assert_eq!(keys[1], ChannelKey::new("Inv01", "M1", Channel::Voltage));
        assert_eq!(keys[3].group, "Inv02");
    }

    #[test]
    fn test_missing_orientation_is_configuration_error() {
        let err = input(Some(9.0), Some(2)).orientation().unwrap_err();
        assert!(matches!(err, SanitizeError::Configuration { .. }));
    }

    #[test]
    fn test_ceilings() {
        let meta = input(Some(9.0), Some(2));
        assert!((meta.current_ceiling(1.2).unwrap() - 21.6).abs() < 1e-12);
        assert!((meta.voltage_ceiling().unwrap() - 900.0).abs() < 1e-12);
        assert!(input(None, Some(2)).current_ceiling(1.2).is_err());
        assert!(input(Some(9.0), Some(0)).current_ceiling(1.2).is_err());
    }

    #[test]
    fn test_duplicate_inputs_rejected() {
        let result = ArrayMetadata::new(vec![input(Some(9.0), Some(2)), input(Some(9.0), Some(2))]);
        assert!(result.is_err());
    }

    #[test]
    fn test_irradiance_type_parse() {
        assert_eq!("ghi".parse::<IrradianceType>().unwrap(), IrradianceType::Ghi);
        assert_eq!("POA".parse::<IrradianceType>().unwrap(), IrradianceType::PlaneOfArray);
        assert!("dni".parse::<IrradianceType>().is_err());
    }
}
