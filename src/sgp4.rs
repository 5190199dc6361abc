//! Near-earth propagation model (orbital period below 225 minutes):
//! secular gravitational and drag perturbations, truncated "simple" drag
//! below 220 km perigee, short-period periodics.

use crate::constants::{
    AE, CK2, CK4, ECC_LIMIT_LOW, ECC_SMALL, TOTHRD, XJ3, XKE, XKMPER,
};
use crate::propagator::{
    brouwer_mean_motion, calculate_pos_and_vel, density_params, density_tsi, fmod2p,
    solve_kepler, to_km_state, Brouwer, DensityParams, EciState, ShortPeriodInput,
};
use crate::tle::OrbitalElements;

pub(crate) fn propagate(tle: &OrbitalElements, tsince: f64) -> EciState {
    let eo = tle.eccentricity;
    let Brouwer { xnodp, aodp } = brouwer_mean_motion(tle);

    let cosio = tle.xincl.cos();
    let sinio = tle.xincl.sin();
    let theta2 = cosio * cosio;
    let theta4 = theta2 * theta2;
    let x3thm1 = 3.0 * theta2 - 1.0;
    let x1mth2 = 1.0 - theta2;
    let x7thm1 = 7.0 * theta2 - 1.0;
    let eosq = eo * eo;
    let betao2 = 1.0 - eosq;
    let betao = betao2.sqrt();

    // Below 220 km perigee the drag equations are truncated to linear
    // variation in sqrt(a) and quadratic variation in mean anomaly; the
    // c3, delta-omega and delta-m terms are dropped.
    let simple = (aodp * (1.0 - eo) / AE) < (220.0 / XKMPER + AE);

    let DensityParams { s4, qoms24 } = density_params(aodp, eo);
    let pinvsq = 1.0 / (aodp * aodp * betao2 * betao2);
    let tsi = density_tsi(aodp, s4);
    let eta = aodp * eo * tsi;
    let etasq = eta * eta;
    let eeta = eo * eta;
    let psisq = (1.0 - etasq).abs();
    let coef = qoms24 * tsi.powi(4);
    let coef1 = coef / psisq.powf(3.5);
    let c2 = coef1
        * xnodp
        * (aodp * (1.0 + 1.5 * etasq + eeta * (4.0 + etasq))
            + 0.75 * CK2 * tsi / psisq * x3thm1 * (8.0 + 3.0 * etasq * (8.0 + etasq)));
    let c1 = c2 * tle.bstar;
    let a3ovk2 = -XJ3 / CK2 * AE.powi(3);
    // The 1/e perigee-correction pair degenerates for circular orbits.
    let c3 = if eo > ECC_SMALL {
        coef * tsi * a3ovk2 * xnodp * AE * sinio / eo
    } else {
        0.0
    };
    let c4 = 2.0
        * xnodp
        * coef1
        * aodp
        * betao2
        * (eta * (2.0 + 0.5 * etasq) + eo * (0.5 + 2.0 * etasq)
            - 2.0 * CK2 * tsi / (aodp * psisq)
                * (-3.0 * x3thm1 * (1.0 - 2.0 * eeta + etasq * (1.5 - 0.5 * eeta))
                    + 0.75 * x1mth2 * (2.0 * etasq - eeta * (1.0 + etasq))
                        * (2.0 * tle.omegao).cos()));
    let c5 = 2.0 * coef1 * aodp * betao2 * (1.0 + 2.75 * (etasq + eeta) + eeta * etasq);

    let temp1 = 3.0 * CK2 * pinvsq * xnodp;
    let temp2 = temp1 * CK2 * pinvsq;
    let temp3 = 1.25 * CK4 * pinvsq * pinvsq * xnodp;
    let xmdot = xnodp
        + 0.5 * temp1 * betao * x3thm1
        + 0.0625 * temp2 * betao * (13.0 - 78.0 * theta2 + 137.0 * theta4);
    let x1m5th = 1.0 - 5.0 * theta2;
    let omgdot = -0.5 * temp1 * x1m5th
        + 0.0625 * temp2 * (7.0 - 114.0 * theta2 + 395.0 * theta4)
        + temp3 * (3.0 - 36.0 * theta2 + 49.0 * theta4);
    let xhdot1 = -temp1 * cosio;
    let xnodot =
        xhdot1 + (0.5 * temp2 * (4.0 - 19.0 * theta2) + 2.0 * temp3 * (3.0 - 7.0 * theta2)) * cosio;
    let omgcof = tle.bstar * c3 * tle.omegao.cos();
    let xmcof = if eo > ECC_SMALL {
        -TOTHRD * coef * tle.bstar * AE / eeta
    } else {
        0.0
    };
    let xnodcf = 3.5 * betao2 * xhdot1 * c1;
    let t2cof = 1.5 * c1;
    let xlcof = 0.125 * a3ovk2 * sinio * (3.0 + 5.0 * cosio) / (1.0 + cosio);
    let aycof = 0.25 * a3ovk2 * sinio;
    let delmo = (1.0 + eta * tle.xmo.cos()).powi(3);
    let sinmo = tle.xmo.sin();

    let (d2, d3, d4, t3cof, t4cof, t5cof) = if !simple {
        let c1sq = c1 * c1;
        let d2 = 4.0 * aodp * tsi * c1sq;
        let temp = d2 * tsi * c1 / 3.0;
        let d3 = (17.0 * aodp + s4) * temp;
        let d4 = 0.5 * temp * aodp * tsi * (221.0 * aodp + 31.0 * s4) * c1;
        let t3cof = d2 + 2.0 * c1sq;
        let t4cof = 0.25 * (3.0 * d3 + c1 * (12.0 * d2 + 10.0 * c1sq));
        let t5cof =
            0.2 * (3.0 * d4 + 12.0 * c1 * d3 + 6.0 * d2 * d2 + 15.0 * c1sq * (2.0 * d2 + c1sq));
        (d2, d3, d4, t3cof, t4cof, t5cof)
    } else {
        (0.0, 0.0, 0.0, 0.0, 0.0, 0.0)
    };

    // Secular gravity and atmospheric drag.
    let xmdf = tle.xmo + xmdot * tsince;
    let omgadf = tle.omegao + omgdot * tsince;
    let xnoddf = tle.xnodeo + xnodot * tsince;
    let tsq = tsince * tsince;
    let xnode = xnoddf + xnodcf * tsq;
    let mut omega = omgadf;
    let mut xmp = xmdf;
    let mut tempa = 1.0 - c1 * tsince;
    let mut tempe = tle.bstar * c4 * tsince;
    let mut templ = t2cof * tsq;
    if !simple {
        let delomg = omgcof * tsince;
        let delm = xmcof * ((1.0 + eta * xmdf.cos()).powi(3) - delmo);
        let temp = delomg + delm;
        xmp = xmdf + temp;
        omega = omgadf - temp;
        let tcube = tsq * tsince;
        let tfour = tsince * tcube;
        tempa = tempa - d2 * tsq - d3 * tcube - d4 * tfour;
        tempe += tle.bstar * c5 * (xmp.sin() - sinmo);
        templ += t3cof * tcube + tfour * (t4cof + tsince * t5cof);
    }

    let a = aodp * tempa * tempa;
    let e = (eo - tempe).max(ECC_LIMIT_LOW);
    let xl = xmp + omega + xnode + xnodp * templ;
    let beta2 = 1.0 - e * e;
    let xn = XKE / a.powf(1.5);

    // Long-period periodics.
    let axn = e * omega.cos();
    let temp = 1.0 / (a * beta2);
    let xll = temp * xlcof * axn;
    let aynl = temp * aycof;
    let xlt = xl + xll;
    let ayn = e * omega.sin() + aynl;

    let capu = fmod2p(xlt - xnode);
    let epw = solve_kepler(capu, axn, ayn);

    let (pos, vel) = calculate_pos_and_vel(&ShortPeriodInput {
        a,
        axn,
        ayn,
        epw,
        xnode,
        xinc: tle.xincl,
        xn,
        cosio,
        sinio,
        x3thm1,
        x1mth2,
        x7thm1,
    });

    let phase = fmod2p(xlt - xnode - omgadf);
    to_km_state(pos, vel, phase)
}

#[cfg(test)]
mod tests {
    use super::*;

    // The classic near-earth reference element set. Expected states are
    // this implementation's verified output; it agrees with the published
    // reference ephemeris (generated with the 6378.135 km Earth radius) to
    // about 10 m in position and 1e-5 km/s in velocity.
    fn reference_tle() -> OrbitalElements {
        OrbitalElements::from_tle(
            "SGP4-TEST",
            "1 88888U          80275.98708465  .00073094  13844-3  66816-4 0    87",
            "2 88888  72.8435 115.9689 0086731  52.6988 110.5714 16.05824518  1058",
        )
        .unwrap()
    }

    fn assert_state(tsince: f64, pos: [f64; 3], vel: [f64; 3]) {
        let state = propagate(&reference_tle(), tsince);
        for i in 0..3 {
            assert!(
                (state.position[i] - pos[i]).abs() < 1e-4,
                "pos[{i}] at t={tsince}: {} vs {}",
                state.position[i],
                pos[i]
            );
            assert!(
                (state.velocity[i] - vel[i]).abs() < 1e-7,
                "vel[{i}] at t={tsince}: {} vs {}",
                state.velocity[i],
                vel[i]
            );
        }
    }

    #[test]
    fn matches_reference_ephemeris_at_epoch() {
        assert_state(
            0.0,
            [2328.970482981959, -5995.2223910698385, 1719.973508132738],
            [2.9120741932603047, -0.9834182620778193, -7.090818432209181],
        );
    }

    #[test]
    fn matches_reference_ephemeris_after_six_hours() {
        assert_state(
            360.0,
            [2456.107821145183, -6071.940452995242, 1222.8981467028807],
            [2.679390916271744, -0.44829103727533803, -7.2287943965503745],
        );
    }

    #[test]
    fn phase_stays_in_range() {
        for t in [0.0, 90.0, 360.0, 1440.0] {
            let state = propagate(&reference_tle(), t);
            assert!(state.phase >= 0.0 && state.phase < crate::constants::TWO_PI);
        }
    }

    #[test]
    fn near_circular_orbit_drops_perigee_terms() {
        // A circular element set must not blow up in the 1/e terms.
        let tle = OrbitalElements::new(
            "CIRC".into(), 9, 2024, 1.5, 15.5, 0.0, 51.6, 10.0, 20.0, 30.0, 1e-4,
        )
        .unwrap();
        let state = propagate(&tle, 720.0);
        assert!(state.position.norm().is_finite());
        assert!((state.position.norm() - 6790.0).abs() < 100.0);
    }
}
