//! Ground-track sampling and the visibility footprint (range circle).

use std::f64::consts::{FRAC_PI_2, PI};

use chrono::{DateTime, Duration, Utc};

use crate::constants::XKMPER;
use crate::observer::Observer;
use crate::satellite::{Satellite, SatellitePosition};

/// Default ground-track sampling interval, seconds.
pub const TRACK_STEP_S: i64 = 15;
/// Footprint resolution: one point per degree of azimuth.
const FOOTPRINT_POINTS: usize = 360;
/// Below this the range-circle tangent denominator is treated as
/// undefined and the sub-satellite longitude is used instead.
const TANGENT_EPS: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundTrackPoint {
    pub latitude: f64,  // degrees
    pub longitude: f64, // degrees, ±180
    pub altitude_km: f64,
}

/// Sub-satellite track between two instants, sampled every
/// `TRACK_STEP_S`. Split into segments at ±180° longitude crossings so a
/// renderer can draw each segment as one polyline.
pub fn ground_track(
    satellite: &Satellite,
    observer: &Observer,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<Vec<GroundTrackPoint>> {
    let mut segments = Vec::new();
    let mut current: Vec<GroundTrackPoint> = Vec::new();
    let mut t = start;
    while t <= end {
        let pos = satellite.position_at(t, observer);
        let point = GroundTrackPoint {
            latitude: pos.latitude,
            longitude: pos.longitude,
            altitude_km: pos.altitude_km,
        };
        if let Some(prev) = current.last() {
            if (prev.longitude - point.longitude).abs() > 180.0 {
                segments.push(std::mem::take(&mut current));
            }
        }
        current.push(point);
        t += Duration::seconds(TRACK_STEP_S);
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// The locus of ground points at the satellite's radio horizon: exactly
/// 360 (latitude, longitude) pairs in degrees, one per degree of azimuth
/// around the sub-satellite point.
pub fn footprint(position: &SatellitePosition) -> Vec<(f64, f64)> {
    let lat = position.latitude.to_radians();
    let lon = position.longitude.to_radians();
    let beta = (XKMPER / (XKMPER + position.altitude_km)).acos();

    let mut points = Vec::with_capacity(FOOTPRINT_POINTS);
    for azi in 0..FOOTPRINT_POINTS {
        let az = (azi as f64).to_radians();
        let rangelat = (lat.sin() * beta.cos() + az.cos() * beta.sin() * lat.cos()).asin();
        let num = beta.cos() - lat.sin() * rangelat.sin();
        let den = lat.cos() * rangelat.cos();

        let rangelon = if azi == 0 && beta > FRAC_PI_2 - lat {
            // North pole inside the circle: the boundary point along
            // azimuth 0 sits on the antipodal meridian.
            lon + PI
        } else if azi == 180 && beta > FRAC_PI_2 + lat {
            lon + PI
        } else if den.abs() < TANGENT_EPS || (num / den).abs() > 1.0 {
            lon
        } else if azi < 180 {
            lon - (num / den).acos()
        } else {
            lon + (num / den).acos()
        };

        points.push((rangelat.to_degrees(), normalize_lon(rangelon).to_degrees()));
    }
    points
}

/// Wrap a longitude in radians to ±pi.
fn normalize_lon(lon: f64) -> f64 {
    (lon + PI).rem_euclid(2.0 * PI) - PI
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::satellite::Satellite;
    use crate::tle::OrbitalElements;

    fn position(latitude: f64, longitude: f64, altitude_km: f64) -> SatellitePosition {
        SatellitePosition {
            time: DateTime::from_timestamp_millis(1_704_110_400_000).unwrap(),
            azimuth: 0.0,
            elevation: 0.0,
            latitude,
            longitude,
            altitude_km,
            range_km: 0.0,
            range_rate_km_s: 0.0,
            phase: 0.0,
            eclipsed: false,
            eclipse_depth: -0.5,
        }
    }

    #[test]
    fn footprint_has_exactly_360_points() {
        let points = footprint(&position(0.0, 0.0, 800.0));
        assert_eq!(points.len(), 360);
        for (lat, lon) in &points {
            assert!(lat.is_finite() && lon.is_finite());
            assert!(*lat >= -90.0 && *lat <= 90.0);
            assert!(*lon >= -180.0 && *lon <= 180.0);
        }
    }

    #[test]
    fn equatorial_footprint_is_symmetric() {
        let altitude = 800.0;
        let points = footprint(&position(0.0, 0.0, altitude));
        let beta = (XKMPER / (XKMPER + altitude)).acos().to_degrees();
        // Azimuth 0 reaches due north of the subpoint, 180 due south.
        assert!((points[0].0 - beta).abs() < 1e-9);
        assert!(points[0].1.abs() < 1e-9);
        assert!((points[180].0 + beta).abs() < 1e-9);
        // Due-east and due-west points mirror across the subpoint meridian.
        assert!((points[90].1 + points[270].1).abs() < 1e-6);
        assert!(points[90].0.abs() < 1e-9 && points[270].0.abs() < 1e-9);
    }

    #[test]
    fn polar_footprint_wraps_the_pole() {
        // Satellite almost over the pole: the circle encloses it, so the
        // azimuth-0 boundary point lands on the antipodal meridian.
        let points = footprint(&position(89.0, 10.0, 800.0));
        assert_eq!(points.len(), 360);
        for (lat, lon) in &points {
            assert!(lat.is_finite() && lon.is_finite());
            assert!(*lon >= -180.0 && *lon <= 180.0);
        }
        // Boundary along azimuth 0 crosses the pole onto longitude 10-180.
        assert!((points[0].1 - -170.0).abs() < 1e-6);
    }

    #[test]
    fn dateline_footprint_stays_normalized() {
        let points = footprint(&position(0.0, 179.5, 800.0));
        assert_eq!(points.len(), 360);
        assert!(points.iter().all(|(_, lon)| *lon >= -180.0 && *lon <= 180.0));
        // The circle spans the dateline, so both signs appear.
        assert!(points.iter().any(|(_, lon)| *lon > 170.0));
        assert!(points.iter().any(|(_, lon)| *lon < -170.0));
    }

    #[test]
    fn ground_track_splits_at_the_dateline() {
        let satellite = Satellite::new(
            OrbitalElements::from_tle(
                "ISS (ZARYA)",
                "1 25544U 98067A   24001.50000000  .00016717  00000-0  10270-3 0  9994",
                "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.49541811428342",
            )
            .unwrap(),
        );
        let observer = Observer::new("EQ".into(), 0.0, 0.0, 0.0);
        // Covers the pass over lon ~160E heading for the dateline.
        let start = DateTime::from_timestamp_millis(1_704_110_400_000 + 30 * 60_000).unwrap();
        let end = start + Duration::minutes(30);
        let segments = ground_track(&satellite, &observer, start, end);

        let total: usize = segments.iter().map(Vec::len).sum();
        assert_eq!(total, 121); // 30 min at 15 s steps, inclusive
        assert!(segments.len() >= 2, "expected a dateline split");
        for segment in &segments {
            assert!(!segment.is_empty());
            for pair in segment.windows(2) {
                assert!((pair[0].longitude - pair[1].longitude).abs() <= 180.0);
            }
        }
    }
}
