//! Time and coordinate plumbing shared by the propagators and the
//! observation engine: Julian dates, Greenwich sidereal time, observer
//! ECI state, topocentric look angles, and the geodetic subpoint solver.

use nalgebra::Vector3;

use crate::constants::{
    FLATTENING, GEODETIC_TOLERANCE, MAX_SOLVER_ITERATIONS, MFACTOR, OMEGA_E, SECDAY, TWO_PI,
    XKMPER,
};
use crate::observer::Observer;

#[derive(Debug, Clone, Copy)]
pub struct LookAngles {
    pub azimuth: f64,    // degrees, 0..360 from north
    pub elevation: f64,  // degrees
    pub range: f64,      // km
    pub range_rate: f64, // km/s, positive receding
}

pub fn julian_date_from_unix_ms(ms: i64) -> f64 {
    ms as f64 / 86_400_000.0 + 2_440_587.5
}

/// Julian date of Jan 0.0 of `year` (so adding a 1-based day-of-year with
/// fraction gives the instant directly).
pub fn julian_date_of_year(year: i32) -> f64 {
    let year = i64::from(year) - 1;
    let a = year / 100;
    let b = 2 - a + a / 4;
    (365.25 * year as f64).floor() + 428.0 + 1_720_994.5 + b as f64
}

/// Greenwich mean sidereal time in radians for a UTC Julian date.
pub fn theta_g_jd(jd: f64) -> f64 {
    let ut = (jd + 0.5).fract();
    let jd = jd - ut;
    let tu = (jd - 2_451_545.0) / 36_525.0;
    let gmst = 24_110.54841 + tu * (8_640_184.812866 + tu * (0.093104 - tu * 6.2e-6));
    let gmst = (gmst + SECDAY * OMEGA_E * ut).rem_euclid(SECDAY);
    TWO_PI * gmst / SECDAY
}

/// Observer ECI position (km) and velocity (km/s) at a Julian date.
pub fn observer_eci(observer: &Observer, jd: f64) -> (Vector3<f64>, Vector3<f64>) {
    let lat = observer.latitude.to_radians();
    let lon = observer.longitude.to_radians();
    let alt_km = observer.altitude / 1000.0;

    let theta = (theta_g_jd(jd) + lon).rem_euclid(TWO_PI);
    let c = 1.0 / (1.0 + FLATTENING * (FLATTENING - 2.0) * lat.sin().powi(2)).sqrt();
    let sq = (1.0 - FLATTENING).powi(2) * c;
    let achcp = (XKMPER * c + alt_km) * lat.cos();

    let pos = Vector3::new(
        achcp * theta.cos(),
        achcp * theta.sin(),
        (XKMPER * sq + alt_km) * lat.sin(),
    );
    let vel = Vector3::new(-MFACTOR * pos.y, MFACTOR * pos.x, 0.0);
    (pos, vel)
}

/// Topocentric azimuth/elevation/range/range-rate of a satellite ECI state
/// as seen from the observer.
pub fn calculate_look_angles(
    sat_pos: &Vector3<f64>,
    sat_vel: &Vector3<f64>,
    observer: &Observer,
    jd: f64,
) -> LookAngles {
    let (obs_pos, obs_vel) = observer_eci(observer, jd);
    let range = sat_pos - obs_pos;
    let range_vel = sat_vel - obs_vel;
    let range_mag = range.norm();

    let lat = observer.latitude.to_radians();
    let lon = observer.longitude.to_radians();
    let theta = (theta_g_jd(jd) + lon).rem_euclid(TWO_PI);
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_theta, cos_theta) = theta.sin_cos();

    let top_s = sin_lat * cos_theta * range.x + sin_lat * sin_theta * range.y - cos_lat * range.z;
    let top_e = -sin_theta * range.x + cos_theta * range.y;
    let top_z = cos_lat * cos_theta * range.x + cos_lat * sin_theta * range.y + sin_lat * range.z;

    let mut azimuth = (-top_e / top_s).atan();
    if top_s > 0.0 {
        azimuth += std::f64::consts::PI;
    }
    if azimuth < 0.0 {
        azimuth += TWO_PI;
    }
    let elevation = (top_z / range_mag).asin();

    LookAngles {
        azimuth: azimuth.to_degrees(),
        elevation: elevation.to_degrees(),
        range: range_mag,
        range_rate: range.dot(&range_vel) / range_mag,
    }
}

/// Geodetic subpoint (latitude rad, longitude rad in ±pi, altitude km) of an
/// ECI position. Latitude is solved by fixed-point iteration; if it has not
/// converged after the iteration cap the last estimate is used — near-polar
/// precision loss is an accepted approximation, not a fault.
pub fn eci_to_geodetic(pos: &Vector3<f64>, jd: f64) -> (f64, f64, f64) {
    let theta = pos.y.atan2(pos.x);
    let mut lon = (theta - theta_g_jd(jd)).rem_euclid(TWO_PI);
    if lon > std::f64::consts::PI {
        lon -= TWO_PI;
    }

    let r = (pos.x * pos.x + pos.y * pos.y).sqrt();
    let e2 = FLATTENING * (2.0 - FLATTENING);
    let mut lat = pos.z.atan2(r);
    let mut c = 1.0;
    for _ in 0..MAX_SOLVER_ITERATIONS {
        let phi = lat;
        c = 1.0 / (1.0 - e2 * phi.sin().powi(2)).sqrt();
        lat = (pos.z + XKMPER * c * e2 * phi.sin()).atan2(r);
        if (lat - phi).abs() < GEODETIC_TOLERANCE {
            break;
        }
    }
    let alt = r / lat.cos() - XKMPER * c;
    (lat, lon, alt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn julian_date_helpers() {
        assert_eq!(julian_date_from_unix_ms(0), 2_440_587.5);
        assert_eq!(julian_date_of_year(2024), 2_460_309.5);
        assert_eq!(julian_date_of_year(1957), 2_435_838.5);
    }

    #[test]
    fn greenwich_sidereal_time_at_j2000() {
        // 2000-01-01 12:00 UT: GMST = 280.46062 degrees.
        let gmst = theta_g_jd(2_451_545.0);
        assert!((gmst - 4.894961212789146).abs() < 1e-9);
        assert!((gmst.to_degrees() - 280.46062).abs() < 1e-4);
    }

    #[test]
    fn geodetic_round_trips_observer_position() {
        let observer = Observer::new("QTH".into(), 45.0, -93.0, 300.0);
        let jd = 2_460_311.0208333335;
        let (pos, _) = observer_eci(&observer, jd);
        let (lat, lon, alt) = eci_to_geodetic(&pos, jd);
        assert!((lat.to_degrees() - 45.0).abs() < 1e-9);
        assert!((lon.to_degrees() - -93.0).abs() < 1e-9);
        assert!((alt - 0.3).abs() < 1e-6);
    }

    #[test]
    fn observer_velocity_is_eastward_rotation() {
        let observer = Observer::new("EQ".into(), 0.0, 0.0, 0.0);
        let (pos, vel) = observer_eci(&observer, 2_451_545.0);
        assert!((pos.norm() - XKMPER).abs() < 1.0);
        // Rotation speed at the equator is ~0.465 km/s, perpendicular to r.
        assert!((vel.norm() - 0.465).abs() < 0.005);
        assert!(pos.dot(&vel).abs() < 1e-9);
    }

    #[test]
    fn look_angles_straight_up() {
        // A point far above the observer's own position reads ~90 degrees
        // elevation regardless of azimuth.
        let observer = Observer::new("QTH".into(), 45.0, -93.0, 0.0);
        let jd = 2_460_311.0;
        let (pos, _) = observer_eci(&observer, jd);
        let overhead = pos * ((pos.norm() + 1000.0) / pos.norm());
        let look = calculate_look_angles(&overhead, &nalgebra::Vector3::zeros(), &observer, jd);
        // Geodetic vs geocentric latitude keeps this just off true zenith.
        assert!(look.elevation > 89.5);
        assert!((look.range - 1000.0).abs() < 1.0);
    }
}
