//! Propagator dispatch and the plumbing both models share: Brouwer mean
//! motion recovery, low-perigee density adjustment, the bounded Kepler
//! solver, and short-period periodics with orientation-vector assembly.
//!
//! Every intermediate term is call-scoped; propagation is a pure function
//! of (element set, minutes since epoch), safe to run concurrently against
//! the same elements from any number of threads.

use nalgebra::Vector3;

use crate::constants::{
    AE, CK2, KEPLER_TOLERANCE, MAX_SOLVER_ITERATIONS, MIN_DENSITY_DENOM, QOMS2T, SECDAY,
    S_DENSITY, TOTHRD, TWO_PI, XKE, XKMPER, XMNPDA,
};
use crate::tle::OrbitalElements;
use crate::{sdp4, sgp4};

/// Raw inertial state from a propagator: position in km, velocity in km/s,
/// plus the orbital phase angle in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EciState {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub phase: f64,
}

/// Two-variant model dispatch, chosen once from the element set. No
/// state lives here; the variants only route the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagator {
    NearEarth,
    DeepSpace,
}

impl Propagator {
    pub fn select(elements: &OrbitalElements) -> Self {
        if elements.is_deep_space() {
            Propagator::DeepSpace
        } else {
            Propagator::NearEarth
        }
    }

    /// ECI state at `tsince` minutes after the element epoch.
    pub fn propagate(&self, elements: &OrbitalElements, tsince: f64) -> EciState {
        match self {
            Propagator::NearEarth => sgp4::propagate(elements, tsince),
            Propagator::DeepSpace => sdp4::propagate(elements, tsince),
        }
    }
}

/// Brouwer mean motion (xnodp, rad/min) and semimajor axis (aodp, Earth
/// radii) recovered from the Kozai mean elements.
pub(crate) struct Brouwer {
    pub xnodp: f64,
    pub aodp: f64,
}

pub(crate) fn brouwer_mean_motion(elements: &OrbitalElements) -> Brouwer {
    let a1 = (XKE / elements.xno).powf(TOTHRD);
    let cosio = elements.xincl.cos();
    let x3thm1 = 3.0 * cosio * cosio - 1.0;
    let betao2 = 1.0 - elements.eccentricity * elements.eccentricity;
    let betao = betao2.sqrt();
    let del1 = 1.5 * CK2 * x3thm1 / (a1 * a1 * betao * betao2);
    let ao = a1 * (1.0 - del1 * (0.5 * TOTHRD + del1 * (1.0 + 134.0 / 81.0 * del1)));
    let delo = 1.5 * CK2 * x3thm1 / (ao * ao * betao * betao2);
    Brouwer {
        xnodp: elements.xno / (1.0 + delo),
        aodp: ao / (1.0 - delo),
    }
}

/// Atmospheric density parameters, altered for perigee below 156 km.
pub(crate) struct DensityParams {
    pub s4: f64,
    pub qoms24: f64,
}

pub(crate) fn density_params(aodp: f64, eccentricity: f64) -> DensityParams {
    let mut s4 = S_DENSITY;
    let mut qoms24 = QOMS2T;
    let perigee = (aodp * (1.0 - eccentricity) - AE) * XKMPER;
    if perigee < 156.0 {
        s4 = if perigee <= 98.0 { 20.0 } else { perigee - 78.0 };
        qoms24 = ((120.0 - s4) * AE / XKMPER).powi(4);
        s4 = s4 / XKMPER + AE;
    }
    DensityParams { s4, qoms24 }
}

/// Inverse of the (aodp - s4) density denominator, floored for
/// near-decayed orbits whose perigee has fallen to the density boundary.
pub(crate) fn density_tsi(aodp: f64, s4: f64) -> f64 {
    1.0 / (aodp - s4).max(MIN_DENSITY_DENOM)
}

/// Kepler's equation for the eccentric-anomaly-like variable, fixed-point
/// iteration bounded by `MAX_SOLVER_ITERATIONS`; returns the last estimate
/// if the tolerance was not reached.
pub(crate) fn solve_kepler(capu: f64, axn: f64, ayn: f64) -> f64 {
    let mut epw = capu;
    for _ in 0..MAX_SOLVER_ITERATIONS {
        let (sinepw, cosepw) = epw.sin_cos();
        let next = epw
            + (capu - ayn * cosepw + axn * sinepw - epw)
                / (1.0 - axn * cosepw - ayn * sinepw);
        let delta = next - epw;
        epw = next;
        if delta.abs() <= KEPLER_TOLERANCE {
            break;
        }
    }
    epw
}

/// Angle in [0, 2pi).
pub(crate) fn fmod2p(x: f64) -> f64 {
    x.rem_euclid(TWO_PI)
}

/// Inputs to the short-period update common to both models, in the
/// propagators' canonical units (Earth radii, radians, minutes).
pub(crate) struct ShortPeriodInput {
    pub a: f64,
    pub axn: f64,
    pub ayn: f64,
    pub epw: f64,
    pub xnode: f64,
    pub xinc: f64,
    pub xn: f64,
    pub cosio: f64,
    pub sinio: f64,
    pub x3thm1: f64,
    pub x1mth2: f64,
    pub x7thm1: f64,
}

/// Short-period periodic corrections followed by orientation-vector
/// assembly: the raw position/velocity in canonical units.
pub(crate) fn calculate_pos_and_vel(input: &ShortPeriodInput) -> (Vector3<f64>, Vector3<f64>) {
    let ShortPeriodInput {
        a,
        axn,
        ayn,
        epw,
        xnode,
        xinc,
        xn,
        cosio,
        sinio,
        x3thm1,
        x1mth2,
        x7thm1,
    } = *input;

    let (sinepw, cosepw) = epw.sin_cos();
    let ecose = axn * cosepw + ayn * sinepw;
    let esine = axn * sinepw - ayn * cosepw;
    let elsq = axn * axn + ayn * ayn;
    let pl = a * (1.0 - elsq);
    let r = a * (1.0 - ecose);
    let rdot = XKE * a.sqrt() * esine / r;
    let rfdot = XKE * pl.sqrt() / r;
    let betal = (1.0 - elsq).sqrt();
    let temp3 = 1.0 / (1.0 + betal);
    let cosu = a / r * (cosepw - axn + ayn * esine * temp3);
    let sinu = a / r * (sinepw - ayn - axn * esine * temp3);
    let u = fmod2p(sinu.atan2(cosu));
    let sin2u = 2.0 * sinu * cosu;
    let cos2u = 2.0 * cosu * cosu - 1.0;
    let temp1 = CK2 / pl;
    let temp2 = temp1 / pl;

    let rk = r * (1.0 - 1.5 * temp2 * betal * x3thm1) + 0.5 * temp1 * x1mth2 * cos2u;
    let uk = u - 0.25 * temp2 * x7thm1 * sin2u;
    let xnodek = xnode + 1.5 * temp2 * cosio * sin2u;
    let xinck = xinc + 1.5 * temp2 * cosio * sinio * cos2u;
    let rdotk = rdot - xn * temp1 * x1mth2 * sin2u;
    let rfdotk = rfdot + xn * temp1 * (x1mth2 * cos2u + 1.5 * x3thm1);

    let (sinuk, cosuk) = uk.sin_cos();
    let (sinik, cosik) = xinck.sin_cos();
    let (sinnok, cosnok) = xnodek.sin_cos();
    let xmx = -sinnok * cosik;
    let xmy = cosnok * cosik;
    let ux = xmx * sinuk + cosnok * cosuk;
    let uy = xmy * sinuk + sinnok * cosuk;
    let uz = sinik * sinuk;
    let vx = xmx * cosuk - cosnok * sinuk;
    let vy = xmy * cosuk - sinnok * sinuk;
    let vz = sinik * cosuk;

    (
        Vector3::new(rk * ux, rk * uy, rk * uz),
        Vector3::new(
            rdotk * ux + rfdotk * vx,
            rdotk * uy + rfdotk * vy,
            rdotk * uz + rfdotk * vz,
        ),
    )
}

/// Scale canonical units to km and km/s.
pub(crate) fn to_km_state(pos: Vector3<f64>, vel: Vector3<f64>, phase: f64) -> EciState {
    EciState {
        position: pos * XKMPER,
        velocity: vel * (XKMPER * XMNPDA / SECDAY),
        phase,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elements(mean_motion: f64) -> OrbitalElements {
        OrbitalElements::new(
            "T".into(), 1, 2024, 1.5, mean_motion, 0.0006703, 51.6416, 247.4627, 130.536,
            325.0288, 1.027e-4,
        )
        .unwrap()
    }

    #[test]
    fn dispatch_follows_mean_motion_threshold() {
        assert_eq!(Propagator::select(&elements(15.49541811)), Propagator::NearEarth);
        assert_eq!(Propagator::select(&elements(6.4)), Propagator::NearEarth);
        assert_eq!(Propagator::select(&elements(6.399)), Propagator::DeepSpace);
        assert_eq!(Propagator::select(&elements(1.00271529)), Propagator::DeepSpace);
    }

    #[test]
    fn propagation_is_bit_identical_across_calls() {
        for mean_motion in [15.49541811, 2.00603401] {
            let tle = elements(mean_motion);
            let propagator = Propagator::select(&tle);
            let first = propagator.propagate(&tle, 137.5);
            let second = propagator.propagate(&tle, 137.5);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn kepler_solver_converges() {
        // With no eccentricity vector the anomaly equals the argument.
        assert_eq!(solve_kepler(1.234, 0.0, 0.0), 1.234);
        // Eccentric case: one more iteration step moves the solution by
        // no more than the documented tolerance.
        let (capu, axn, ayn) = (1.0, 0.3, 0.1);
        let epw = solve_kepler(capu, axn, ayn);
        let next = epw
            + (capu - ayn * epw.cos() + axn * epw.sin() - epw)
                / (1.0 - axn * epw.cos() - ayn * epw.sin());
        assert!((next - epw).abs() <= KEPLER_TOLERANCE);
    }

    #[test]
    fn brouwer_recovery_matches_orbit_scale() {
        // ISS-class orbit: semimajor axis ~6790 km.
        let tle = elements(15.49541811);
        let brouwer = brouwer_mean_motion(&tle);
        assert!((brouwer.aodp * XKMPER - 6790.0).abs() < 10.0);
        assert!(brouwer.xnodp < tle.xno);
    }
}
