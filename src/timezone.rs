//! Timezone resolution for site-local timestamps.
//!
//! The coordinate → timezone lookup is an external collaborator; the pipeline
//! only depends on the [`TimezoneLookup`] trait.

use crate::error::{Result, SanitizeError};
use crate::models::SiteMetadata;
use chrono::{Duration, LocalResult, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use tracing::debug;

/// Resolves a timezone identifier from coordinates
pub trait TimezoneLookup: Send + Sync {
    fn timezone_at(&self, latitude: f64, longitude: f64) -> Result<String>;
}

/// Lookup that always answers with one configured timezone
#[derive(Debug, Clone)]
pub struct FixedTimezone(pub String);

impl TimezoneLookup for FixedTimezone {
    fn timezone_at(&self, _latitude: f64, _longitude: f64) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Parse an IANA timezone identifier
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| SanitizeError::configuration(format!("unknown timezone '{name}'")))
}

/// Timezone declared in site metadata, falling back to the lookup
pub fn resolve_site_timezone(site: &SiteMetadata, lookup: &dyn TimezoneLookup) -> Result<Tz> {
    let name = match &site.timezone {
        Some(name) => name.clone(),
        None => {
            let name = lookup.timezone_at(site.latitude, site.longitude)?;
            debug!(
                "Looked up timezone {} for ({}, {})",
                name, site.latitude, site.longitude
            );
            name
        }
    };
    parse_timezone(&name)
}

/// Convert a site-local wall-clock time to UTC.
///
/// Ambiguous times (clocks falling back) take the earliest instant; times
/// inside a DST gap are shifted forward by the gap.
pub fn local_to_utc(tz: &Tz, local: NaiveDateTime) -> NaiveDateTime {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt.naive_utc(),
        LocalResult::Ambiguous(earliest, _) => earliest.naive_utc(),
        LocalResult::None => {
            let shifted = local + Duration::hours(1);
            match tz.from_local_datetime(&shifted) {
                LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.naive_utc(),
                LocalResult::None => local,
            }
        }
    }
}
