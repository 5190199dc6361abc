use chrono::{DateTime, Utc};

use crate::coords::{calculate_look_angles, eci_to_geodetic, julian_date_from_unix_ms};
use crate::observer::Observer;
use crate::propagator::Propagator;
use crate::sun::{eclipse_state, solar_position};
use crate::tle::OrbitalElements;

/// An orbiting object: its element set plus the propagation model chosen
/// for it at construction. Shareable across threads; every position
/// computation is a pure function of (elements, observer, time).
#[derive(Debug, Clone)]
pub struct Satellite {
    pub name: String,
    pub elements: OrbitalElements,
    propagator: Propagator,
}

/// One instantaneous observation sample. Degrees/km at this boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct SatellitePosition {
    pub time: DateTime<Utc>,
    pub azimuth: f64,           // degrees, 0..360 from north
    pub elevation: f64,         // degrees
    pub latitude: f64,          // degrees
    pub longitude: f64,         // degrees, ±180
    pub altitude_km: f64,
    pub range_km: f64,
    pub range_rate_km_s: f64,   // positive receding
    pub phase: f64,             // orbital phase, radians 0..2pi
    pub eclipsed: bool,
    pub eclipse_depth: f64,     // radians, positive inside the shadow
}

impl SatellitePosition {
    pub fn is_visible(&self) -> bool {
        self.elevation > 0.0
    }
}

impl Satellite {
    pub fn new(elements: OrbitalElements) -> Self {
        Self {
            name: elements.name.clone(),
            propagator: Propagator::select(&elements),
            elements,
        }
    }

    pub fn is_deep_space(&self) -> bool {
        self.elements.is_deep_space()
    }

    /// Orbital period in minutes.
    pub fn period_min(&self) -> f64 {
        self.elements.period_min
    }

    /// Observe the satellite from `observer` at `time`: propagate, then
    /// derive look angles, subpoint, and eclipse state from the one ECI
    /// sample.
    pub fn position_at(&self, time: DateTime<Utc>, observer: &Observer) -> SatellitePosition {
        let jd = julian_date_from_unix_ms(time.timestamp_millis());
        let tsince = self.elements.minutes_since_epoch(jd);
        let state = self.propagator.propagate(&self.elements, tsince);

        let look = calculate_look_angles(&state.position, &state.velocity, observer, jd);
        let (lat, lon, alt_km) = eci_to_geodetic(&state.position, jd);
        let sun = solar_position(jd);
        let (eclipsed, eclipse_depth) = eclipse_state(&state.position, &sun);

        SatellitePosition {
            time,
            azimuth: look.azimuth,
            elevation: look.elevation,
            latitude: lat.to_degrees(),
            longitude: lon.to_degrees(),
            altitude_km: alt_km,
            range_km: look.range,
            range_rate_km_s: look.range_rate,
            phase: state.phase,
            eclipsed,
            eclipse_depth,
        }
    }
}
