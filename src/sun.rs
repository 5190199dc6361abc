//! Low-order solar ephemeris and the satellite eclipse test.

use nalgebra::Vector3;

use crate::constants::{ASTRONOMICAL_UNIT, SECDAY, SOLAR_RADIUS_KM, TWO_PI, XKMPER};

/// Approximate ECI position of the Sun in km at a UTC Julian date.
/// Mean-element series, valid to the same precision class as the
/// propagators themselves.
pub fn solar_position(jd: f64) -> Vector3<f64> {
    let mjd = jd - 2_415_020.0;
    let year = 1900.0 + mjd / 365.25;
    let t = (mjd + delta_et(year) / SECDAY) / 36_525.0;

    let m = (358.47583 + (35_999.04975 * t).rem_euclid(360.0)
        - (0.000150 + 0.0000033 * t) * t * t)
        .to_radians();
    let l = (279.69668 + (36_000.76892 * t).rem_euclid(360.0) + 0.0003025 * t * t).to_radians();
    let e = 0.01675104 - (0.0000418 + 0.000000126 * t) * t;
    let c = ((1.919460 - (0.004789 + 0.000014 * t) * t) * m.sin()
        + (0.020094 - 0.000100 * t) * (2.0 * m).sin()
        + 0.000293 * (3.0 * m).sin())
    .to_radians();
    let o = ((259.18 - 1_934.142 * t).rem_euclid(360.0)).to_radians();
    let lsa = (l + c - (0.00569 - 0.00479 * o.sin()).to_radians()).rem_euclid(TWO_PI);
    let nu = (m + c).rem_euclid(TWO_PI);
    let r = 1.0000002 * (1.0 - e * e) / (1.0 + e * nu.cos()) * ASTRONOMICAL_UNIT;
    let eps = (23.452294 - (0.0130125 + (0.00000164 - 0.000000503 * t) * t) * t
        + 0.00256 * o.cos())
    .to_radians();

    Vector3::new(
        r * lsa.cos(),
        r * lsa.sin() * eps.cos(),
        r * lsa.sin() * eps.sin(),
    )
}

/// Smoothed correction from UT to ephemeris time, seconds.
fn delta_et(year: f64) -> f64 {
    26.465 + 0.747622 * (year - 1950.0) + 1.886913 * (TWO_PI * (year - 1975.0) / 33.0).sin()
}

/// Whether the satellite is inside Earth's shadow, plus the shadow depth in
/// radians (positive = eclipsed, by how much the umbral cone overlaps).
pub fn eclipse_state(sat_pos: &Vector3<f64>, sun_pos: &Vector3<f64>) -> (bool, f64) {
    let sd_earth = (XKMPER / sat_pos.norm()).asin();
    let rho = sun_pos - sat_pos;
    let sd_sun = (SOLAR_RADIUS_KM / rho.norm()).asin();
    let earthward = -sat_pos;
    let cos_delta =
        (sun_pos.dot(&earthward) / (sun_pos.norm() * earthward.norm())).clamp(-1.0, 1.0);
    let depth = sd_earth - sd_sun - cos_delta.acos();
    if sd_earth < sd_sun {
        (false, depth)
    } else {
        (depth >= 0.0, depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sun_points_at_vernal_equinox_in_march() {
        // 2000-03-20 07:35 UT.
        let sun = solar_position(2_451_623.816);
        let unit = sun / sun.norm();
        assert!(unit.x > 0.9999);
        assert!(unit.y.abs() < 2e-3);
        assert!(unit.z.abs() < 1e-3);
        // Earth-Sun distance stays within the orbit's bounds.
        let au = sun.norm() / ASTRONOMICAL_UNIT;
        assert!(au > 0.983 && au < 1.017);
    }

    #[test]
    fn satellite_behind_earth_is_eclipsed() {
        let sun = Vector3::new(ASTRONOMICAL_UNIT, 0.0, 0.0);
        let (eclipsed, depth) = eclipse_state(&Vector3::new(-7000.0, 0.0, 0.0), &sun);
        assert!(eclipsed);
        assert!(depth > 0.0);
    }

    #[test]
    fn sunlit_satellite_is_not_eclipsed() {
        let sun = Vector3::new(ASTRONOMICAL_UNIT, 0.0, 0.0);
        let (eclipsed, depth) = eclipse_state(&Vector3::new(7000.0, 0.0, 0.0), &sun);
        assert!(!eclipsed);
        assert!(depth < 0.0);

        let (eclipsed, _) = eclipse_state(&Vector3::new(0.0, 7000.0, 0.0), &sun);
        assert!(!eclipsed);
    }
}
