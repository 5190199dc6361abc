use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::constants::XKMPER;
use crate::observer::Observer;
use crate::satellite::Satellite;

/// Coarse step while above the horizon (walking out of a pass already in
/// progress), seconds.
const LOS_SCAN_STEP_S: i64 = 30;
/// Coarse step while below the horizon hunting the next rise, seconds.
const AOS_SCAN_STEP_S: i64 = 60;
/// Refinement step near a horizon crossing, seconds.
const FINE_STEP_S: i64 = 3;
/// Deep-space objects are treated as continuously visible over a ±24 h
/// window around the reference time.
const DEEP_SPACE_WINDOW_H: i64 = 24;

/// One visibility window. `progress` is the only mutable field of the
/// core's outputs; an external ticking collaborator recomputes it against
/// wall-clock time and discards the pass once it reaches 1.
#[derive(Debug, Clone, PartialEq)]
pub struct SatellitePass {
    pub name: String,
    pub catnum: u32,
    pub aos_time: DateTime<Utc>,
    pub los_time: DateTime<Utc>,
    pub aos_azimuth: f64, // degrees
    pub los_azimuth: f64, // degrees
    pub tca_time: DateTime<Utc>,
    pub max_elevation: f64, // degrees
    pub altitude_km: f64,   // at max elevation
    pub progress: f64,      // fraction 0..1
}

impl SatellitePass {
    pub fn duration_seconds(&self) -> f64 {
        (self.los_time - self.aos_time).num_milliseconds() as f64 / 1000.0
    }

    /// Fraction of the window elapsed at `now`, clamped to 0..1.
    pub fn update_progress(&mut self, now: DateTime<Utc>) {
        let total = (self.los_time - self.aos_time).num_milliseconds() as f64;
        let elapsed = (now - self.aos_time).num_milliseconds() as f64;
        self.progress = (elapsed / total).clamp(0.0, 1.0);
    }
}

impl Satellite {
    /// Whether the object can ever clear the observer's horizon: an
    /// approximate apogee/line-of-sight test, kept deliberately coarse —
    /// it pre-filters the scan, it does not replace it.
    pub fn will_be_seen(&self, observer: &Observer) -> bool {
        let mut incl = self.elements.inclination;
        if incl >= 90.0 {
            incl = 180.0 - incl;
        }
        let sma = 331.25 * ((1440.0 / self.elements.mean_motion).ln() * (2.0 / 3.0)).exp();
        let apogee = sma * (1.0 + self.elements.eccentricity) - XKMPER;
        (XKMPER / (apogee + XKMPER)).acos() + incl.to_radians()
            > observer.latitude.to_radians().abs()
    }
}

/// Search the `hours_ahead` window after `ref_time` for passes over
/// `observer`, dropping any whose peak stays below `min_elevation_deg`.
/// A pass already in progress at `ref_time` is included.
pub fn predict_passes(
    satellite: &Satellite,
    observer: &Observer,
    ref_time: DateTime<Utc>,
    hours_ahead: u32,
    min_elevation_deg: f64,
) -> Vec<SatellitePass> {
    if !satellite.will_be_seen(observer) {
        debug!(name = %satellite.name, "object never clears the horizon here");
        return Vec::new();
    }
    if satellite.is_deep_space() {
        return deep_space_pass(satellite, observer, ref_time, min_elevation_deg)
            .into_iter()
            .collect();
    }

    let end = ref_time + Duration::hours(i64::from(hours_ahead));
    let quarter_period = Duration::seconds((satellite.period_min() * 60.0 / 4.0) as i64);

    let mut passes = Vec::new();
    // Rewind a quarter period to catch a pass already in progress.
    let mut t = ref_time - quarter_period;
    while t < end {
        let Some(pass) = next_pass(satellite, observer, t, end) else {
            break;
        };
        let next_t = pass.los_time + quarter_period * 3;
        if pass.aos_time <= end
            && pass.los_time > ref_time
            && pass.max_elevation >= min_elevation_deg
        {
            passes.push(pass);
        }
        t = next_t;
    }
    passes
}

/// Deep-space regime: once visible at all, the object is treated as
/// continuously trackable; the window is ±24 h around the reference time
/// with TCA at its midpoint.
fn deep_space_pass(
    satellite: &Satellite,
    observer: &Observer,
    ref_time: DateTime<Utc>,
    min_elevation_deg: f64,
) -> Option<SatellitePass> {
    let pos = satellite.position_at(ref_time, observer);
    if pos.elevation < min_elevation_deg {
        return None;
    }
    Some(SatellitePass {
        name: satellite.name.clone(),
        catnum: satellite.elements.catnum,
        aos_time: ref_time - Duration::hours(DEEP_SPACE_WINDOW_H),
        los_time: ref_time + Duration::hours(DEEP_SPACE_WINDOW_H),
        aos_azimuth: pos.azimuth,
        los_azimuth: pos.azimuth,
        tca_time: ref_time,
        max_elevation: pos.elevation,
        altitude_km: pos.altitude_km,
        progress: 0.0,
    })
}

/// Find the next complete AOS→LOS window at or after `start`. Coarse
/// stepping refined to 3 s near the crossings; maximum elevation and its
/// time/altitude are sampled opportunistically during the same scan.
fn next_pass(
    satellite: &Satellite,
    observer: &Observer,
    start: DateTime<Utc>,
    deadline: DateTime<Utc>,
) -> Option<SatellitePass> {
    let period = Duration::seconds((satellite.period_min() * 60.0) as i64);
    let elevation_at = |t: DateTime<Utc>| satellite.position_at(t, observer).elevation;

    // Walk out of any pass in progress first (LOS of the prior pass).
    let mut t = start;
    let scan_out_limit = start + period;
    while elevation_at(t) >= 0.0 {
        t += Duration::seconds(LOS_SCAN_STEP_S);
        if t > scan_out_limit {
            return None;
        }
    }

    // Coarse hunt for the next rise; one period of slack past the search
    // horizon covers a pass starting right at the boundary.
    let hunt_limit = deadline + period;
    while elevation_at(t) < 0.0 {
        t += Duration::seconds(AOS_SCAN_STEP_S);
        if t > hunt_limit {
            return None;
        }
    }

    // Refine AOS: back up one coarse step, creep forward.
    let mut aos = t - Duration::seconds(AOS_SCAN_STEP_S);
    while elevation_at(aos) < 0.0 {
        aos += Duration::seconds(FINE_STEP_S);
    }

    let aos_pos = satellite.position_at(aos, observer);
    let mut max_elevation = aos_pos.elevation;
    let mut tca_time = aos;
    let mut tca_altitude = aos_pos.altitude_km;
    let mut track_max = |t: DateTime<Utc>, elevation: f64| {
        if elevation > max_elevation {
            let pos = satellite.position_at(t, observer);
            max_elevation = elevation;
            tca_time = t;
            tca_altitude = pos.altitude_km;
        }
    };

    // Scan through the pass to LOS.
    let mut t = aos;
    let los_limit = aos + period;
    loop {
        let next = t + Duration::seconds(LOS_SCAN_STEP_S);
        let elevation = elevation_at(next);
        if elevation < 0.0 || next > los_limit {
            break;
        }
        track_max(next, elevation);
        t = next;
    }
    // Refine LOS from the last above-horizon sample.
    let mut los = t;
    loop {
        let next = los + Duration::seconds(FINE_STEP_S);
        let elevation = elevation_at(next);
        if elevation < 0.0 || next > los_limit {
            break;
        }
        track_max(next, elevation);
        los = next;
    }

    // A grazing pass shorter than the fine step still gets a nonzero window.
    let los = los.max(aos + Duration::seconds(FINE_STEP_S));
    let los_pos = satellite.position_at(los, observer);
    Some(SatellitePass {
        name: satellite.name.clone(),
        catnum: satellite.elements.catnum,
        aos_time: aos,
        los_time: los,
        aos_azimuth: aos_pos.azimuth,
        los_azimuth: los_pos.azimuth,
        tca_time,
        max_elevation,
        altitude_km: tca_altitude,
        progress: 0.0,
    })
}
