use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::constants::{
    MIN_NEAR_EARTH_MEAN_MOTION, TLE_EPOCH_CENTURY_PIVOT, TWO_PI, XMNPDA,
};
use crate::coords::julian_date_of_year;

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("element line {line} does not start with '{expected}'")]
    BadLinePrefix { line: u8, expected: char },
    #[error("element line {line} is too short")]
    LineTooShort { line: u8 },
    #[error("invalid {name} field on line {line}")]
    BadField { line: u8, name: &'static str },
    #[error("mean motion must be positive, got {value}")]
    BadMeanMotion { value: f64 },
    #[error("invalid epoch timestamp '{0}'")]
    BadEpoch(String),
}

/// A validated, immutable element set. Angles are stored both as parsed
/// (degrees) and in the radian/rad-per-minute form the propagators consume;
/// the derived fields are computed once here and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitalElements {
    pub name: String,
    pub catnum: u32,
    /// Full epoch year (century pivot already applied).
    pub epoch_year: i32,
    /// Day of year including fraction, 1.0 = Jan 1 00:00 UTC.
    pub epoch_day: f64,
    /// Mean motion, rev/day.
    pub mean_motion: f64,
    pub eccentricity: f64,
    pub inclination: f64,  // deg
    pub raan: f64,         // deg
    pub arg_perigee: f64,  // deg
    pub mean_anomaly: f64, // deg
    pub bstar: f64,

    // Derived at construction.
    pub epoch_jd: f64,
    pub xincl: f64,  // rad
    pub xnodeo: f64, // rad
    pub omegao: f64, // rad
    pub xmo: f64,    // rad
    pub xno: f64,    // rad/min
    pub period_min: f64,
}

impl OrbitalElements {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        catnum: u32,
        epoch_year: i32,
        epoch_day: f64,
        mean_motion: f64,
        eccentricity: f64,
        inclination: f64,
        raan: f64,
        arg_perigee: f64,
        mean_anomaly: f64,
        bstar: f64,
    ) -> Result<Self, ParseError> {
        if !(mean_motion > 0.0) {
            return Err(ParseError::BadMeanMotion { value: mean_motion });
        }
        Ok(Self {
            name,
            catnum,
            epoch_year,
            epoch_day,
            mean_motion,
            eccentricity,
            inclination,
            raan,
            arg_perigee,
            mean_anomaly,
            bstar,
            epoch_jd: julian_date_of_year(epoch_year) + epoch_day,
            xincl: inclination.to_radians(),
            xnodeo: raan.to_radians(),
            omegao: arg_perigee.to_radians(),
            xmo: mean_anomaly.to_radians(),
            xno: mean_motion * TWO_PI / XMNPDA,
            period_min: XMNPDA / mean_motion,
        })
    }

    /// Parse a classic two-line element set. `name` is the optional line 0.
    pub fn from_tle(name: &str, line1: &str, line2: &str) -> Result<Self, ParseError> {
        if !line1.starts_with('1') {
            return Err(ParseError::BadLinePrefix { line: 1, expected: '1' });
        }
        if !line2.starts_with('2') {
            return Err(ParseError::BadLinePrefix { line: 2, expected: '2' });
        }

        let catnum = field(line1, 1, 2, 7)?.trim().parse::<u32>().map_err(|_| {
            ParseError::BadField { line: 1, name: "catalog number" }
        })?;
        let epoch_year = parse_f64(line1, 1, 18, 20, "epoch year")? as i32;
        let epoch_day = parse_f64(line1, 1, 20, 32, "epoch day")?;
        let bstar = parse_exponent_field(line1, 53, "drag term")?;

        let inclination = parse_f64(line2, 2, 8, 16, "inclination")?;
        let raan = parse_f64(line2, 2, 17, 25, "RAAN")?;
        let eccentricity =
            format!("0.{}", field(line2, 2, 26, 33)?.trim()).parse::<f64>().map_err(|_| {
                ParseError::BadField { line: 2, name: "eccentricity" }
            })?;
        let arg_perigee = parse_f64(line2, 2, 34, 42, "argument of perigee")?;
        let mean_anomaly = parse_f64(line2, 2, 43, 51, "mean anomaly")?;
        let mean_motion = parse_f64(line2, 2, 52, 63, "mean motion")?;

        let full_year = if epoch_year < TLE_EPOCH_CENTURY_PIVOT {
            epoch_year + 2000
        } else {
            epoch_year + 1900
        };

        Self::new(
            name.trim().to_string(),
            catnum,
            full_year,
            epoch_day,
            mean_motion,
            eccentricity,
            inclination,
            raan,
            arg_perigee,
            mean_anomaly,
            bstar,
        )
    }

    /// Deep-space objects (period above 225 minutes) take the SDP4 model.
    pub fn is_deep_space(&self) -> bool {
        self.mean_motion < MIN_NEAR_EARTH_MEAN_MOTION
    }

    /// Minutes from the element epoch to the given Julian date.
    pub fn minutes_since_epoch(&self, jd: f64) -> f64 {
        (jd - self.epoch_jd) * XMNPDA
    }
}

fn field<'a>(line: &'a str, lineno: u8, start: usize, end: usize) -> Result<&'a str, ParseError> {
    line.get(start..end).ok_or(ParseError::LineTooShort { line: lineno })
}

fn parse_f64(
    line: &str,
    lineno: u8,
    start: usize,
    end: usize,
    name: &'static str,
) -> Result<f64, ParseError> {
    field(line, lineno, start, end)?
        .trim()
        .parse::<f64>()
        .map_err(|_| ParseError::BadField { line: lineno, name })
}

/// TLE "assumed decimal point" exponent notation, e.g. ` 66816-4` = 0.66816e-4.
fn parse_exponent_field(line: &str, start: usize, name: &'static str) -> Result<f64, ParseError> {
    let raw = field(line, 1, start, start + 8)?;
    let bad = || ParseError::BadField { line: 1, name };
    let mantissa = raw.get(..6).ok_or_else(bad)?.trim().parse::<f64>().map_err(|_| bad())?;
    let exponent = raw.get(6..8).ok_or_else(bad)?.trim().parse::<i32>().map_err(|_| bad())?;
    Ok(mantissa * 1e-5 * 10f64.powi(exponent))
}

/// Walk a multi-record TLE text (2-line or 3-line groups), skipping
/// malformed records. Parse failures are recoverable by design: a bad
/// record costs a warning, never the batch.
pub fn parse_tle_stream(text: &str) -> Vec<OrbitalElements> {
    let lines: Vec<&str> = text.lines().map(str::trim_end).filter(|l| !l.is_empty()).collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if lines[i].starts_with('1') && i + 1 < lines.len() && lines[i + 1].starts_with('2') {
            let name = if i > 0 && !lines[i - 1].starts_with('1') && !lines[i - 1].starts_with('2')
            {
                lines[i - 1]
            } else {
                ""
            };
            match OrbitalElements::from_tle(name, lines[i], lines[i + 1]) {
                Ok(elements) => out.push(elements),
                Err(e) => warn!(error = %e, line = i + 1, "skipping malformed element set"),
            }
            i += 2;
        } else {
            i += 1;
        }
    }
    out
}

/// OMM-style record with Celestrak field names, the serde boundary for
/// JSON/CSV catalogs. Derived fields are computed on conversion so a
/// deserialized record can never carry inconsistent radians.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OmmElements {
    #[serde(rename = "OBJECT_NAME")]
    pub object_name: String,
    #[serde(rename = "EPOCH")]
    pub epoch: String,
    #[serde(rename = "MEAN_MOTION")]
    pub mean_motion: f64,
    #[serde(rename = "ECCENTRICITY")]
    pub eccentricity: f64,
    #[serde(rename = "INCLINATION")]
    pub inclination: f64,
    #[serde(rename = "RA_OF_ASC_NODE")]
    pub ra_of_asc_node: f64,
    #[serde(rename = "ARG_OF_PERICENTER")]
    pub arg_of_pericenter: f64,
    #[serde(rename = "MEAN_ANOMALY")]
    pub mean_anomaly: f64,
    #[serde(rename = "NORAD_CAT_ID")]
    pub norad_cat_id: u32,
    #[serde(rename = "BSTAR")]
    pub bstar: f64,
}

impl TryFrom<OmmElements> for OrbitalElements {
    type Error = ParseError;

    fn try_from(omm: OmmElements) -> Result<Self, ParseError> {
        let epoch = NaiveDateTime::parse_from_str(&omm.epoch, "%Y-%m-%dT%H:%M:%S%.f")
            .map_err(|_| ParseError::BadEpoch(omm.epoch.clone()))?;
        let day_fraction = (epoch.num_seconds_from_midnight() as f64
            + epoch.nanosecond() as f64 * 1e-9)
            / 86400.0;
        OrbitalElements::new(
            omm.object_name,
            omm.norad_cat_id,
            epoch.year(),
            epoch.ordinal() as f64 + day_fraction,
            omm.mean_motion,
            omm.eccentricity,
            omm.inclination,
            omm.ra_of_asc_node,
            omm.arg_of_pericenter,
            omm.mean_anomaly,
            omm.bstar,
        )
    }
}
