//! Deep-space propagation model (orbital period above 225 minutes): the
//! near-earth secular stage plus lunar/solar gravitational perturbations
//! and resonance handling for synchronous (24 h) and half-day (12 h,
//! Molniya-class) orbits.
//!
//! The classic formulation threads a restartable numerical integrator and
//! entry flags through a persistent scratch block. Here every deep-space
//! term lives in a call-scoped `Deep` value and the resonance integrator
//! restarts from the element epoch on each call, so propagation stays a
//! pure function of (elements, time).

use std::f64::consts::PI;

use crate::constants::{
    AE, C1L, C1SS, CK2, CK4, ECC_LIMIT_LOW, FASX2, FASX4, FASX6, G22, G32, G44, G52, G54,
    Q22, Q31, Q33, RESONANCE_STEP2, RESONANCE_STEP_MIN, ROOT22, ROOT32, ROOT44, ROOT52, ROOT54,
    THDT, TOTHRD, TWO_PI, XJ3, XKE, ZCOSGS, ZCOSIS, ZEL, ZES, ZNL, ZNS, ZSINGS, ZSINIS,
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
    let xnodcf = 3.5 * betao2 * xhdot1 * c1;
    let t2cof = 1.5 * c1;
    let xlcof = 0.125 * a3ovk2 * sinio * (3.0 + 5.0 * cosio) / (1.0 + cosio);
    let aycof = 0.25 * a3ovk2 * sinio;

    let deep = Deep::init(tle, aodp, xnodp, cosio, sinio, theta2, eosq, betao, betao2, xmdot,
        omgdot, xnodot);

    // Secular gravity and atmospheric drag.
    let xmdf = tle.xmo + xmdot * tsince;
    let omgadf = tle.omegao + omgdot * tsince;
    let xnoddf = tle.xnodeo + xnodot * tsince;
    let tsq = tsince * tsince;
    let xnode = xnoddf + xnodcf * tsq;
    let tempa = 1.0 - c1 * tsince;
    let tempe = tle.bstar * c4 * tsince;
    let templ = t2cof * tsq;

    // Deep-space secular effects and resonance.
    let sec = deep.secular(tsince, xmdf, omgadf, xnode);
    let a = (XKE / sec.xn).powf(TOTHRD) * tempa * tempa;
    let em = (sec.em - tempe).max(ECC_LIMIT_LOW);
    let xmam = sec.xll + xnodp * templ;

    // Deep-space lunar/solar periodics.
    let per = deep.periodics(tsince, em, sec.xinc, sec.omgadf, sec.xnode, xmam, cosio, sinio);

    let xl = per.xll + per.omgadf + per.xnode;
    let beta2 = 1.0 - per.em * per.em;
    let xn = XKE / a.powf(1.5);

    // Long-period periodics.
    let axn = per.em * per.omgadf.cos();
    let temp = 1.0 / (a * beta2);
    let xll_lp = temp * xlcof * axn;
    let aynl = temp * aycof;
    let xlt = xl + xll_lp;
    let ayn = per.em * per.omgadf.sin() + aynl;

    let capu = fmod2p(xlt - per.xnode);
    let epw = solve_kepler(capu, axn, ayn);

    let (pos, vel) = calculate_pos_and_vel(&ShortPeriodInput {
        a,
        axn,
        ayn,
        epw,
        xnode: per.xnode,
        xinc: per.xinc,
        xn,
        cosio,
        sinio,
        x3thm1,
        x1mth2,
        x7thm1,
    });

    let phase = fmod2p(xlt - per.xnode - per.omgadf);
    to_km_state(pos, vel, phase)
}

/// Geopotential resonance regime, decided once from the recovered mean
/// motion at initialization.
enum Resonance {
    None,
    Synchronous {
        del1: f64,
        del2: f64,
        del3: f64,
    },
    HalfDay {
        d2201: f64,
        d2211: f64,
        d3210: f64,
        d3222: f64,
        d4410: f64,
        d4422: f64,
        d5220: f64,
        d5232: f64,
        d5421: f64,
        d5433: f64,
    },
}

/// Deep-space perturbation terms, all derived from the element set; built
/// fresh on every propagation call.
struct Deep {
    thgr: f64,
    xnq: f64,
    xqncl: f64,
    omegaq: f64,
    omgdot: f64,
    eo: f64,
    xincl: f64,
    zmol: f64,
    zmos: f64,
    // Secular rates from the combined lunar/solar terms.
    sse: f64,
    ssi: f64,
    ssl: f64,
    ssg: f64,
    ssh: f64,
    // Solar periodic coefficients.
    se2: f64,
    se3: f64,
    si2: f64,
    si3: f64,
    sl2: f64,
    sl3: f64,
    sl4: f64,
    sgh2: f64,
    sgh3: f64,
    sgh4: f64,
    sh2: f64,
    sh3: f64,
    // Lunar periodic coefficients.
    ee2: f64,
    e3: f64,
    xi2: f64,
    xi3: f64,
    xl2: f64,
    xl3: f64,
    xl4: f64,
    xgh2: f64,
    xgh3: f64,
    xgh4: f64,
    xh2: f64,
    xh3: f64,
    resonance: Resonance,
    xlamo: f64,
    xfact: f64,
}

struct SecularState {
    xll: f64,
    omgadf: f64,
    xnode: f64,
    em: f64,
    xinc: f64,
    xn: f64,
}

struct PeriodicState {
    em: f64,
    xinc: f64,
    omgadf: f64,
    xnode: f64,
    xll: f64,
}

/// Secular and periodic contributions of one perturbing body (Sun or
/// Moon), evaluated from its orientation geometry.
struct BodyTerms {
    se: f64,
    si: f64,
    sl: f64,
    sgh: f64,
    sh: f64,
    e2: f64,
    e3: f64,
    xi2: f64,
    xi3: f64,
    xl2: f64,
    xl3: f64,
    xl4: f64,
    xgh2: f64,
    xgh3: f64,
    xgh4: f64,
    xh2: f64,
    xh3: f64,
}

#[allow(clippy::too_many_arguments)]
fn body_terms(
    zcosg: f64,
    zsing: f64,
    zcosi: f64,
    zsini: f64,
    zcosh: f64,
    zsinh: f64,
    cc: f64,
    zn: f64,
    ze: f64,
    cosio: f64,
    sinio: f64,
    cosg: f64,
    sing: f64,
    eq: f64,
    eosq: f64,
    betao: f64,
    betao2: f64,
    xnq: f64,
    xqncl: f64,
) -> BodyTerms {
    let a1 = zcosg * zcosh + zsing * zcosi * zsinh;
    let a3 = -zsing * zcosh + zcosg * zcosi * zsinh;
    let a7 = -zcosg * zsinh + zsing * zcosi * zcosh;
    let a8 = zsing * zsini;
    let a9 = zsing * zsinh + zcosg * zcosi * zcosh;
    let a10 = zcosg * zsini;
    let a2 = cosio * a7 + sinio * a8;
    let a4 = cosio * a9 + sinio * a10;
    let a5 = -sinio * a7 + cosio * a8;
    let a6 = -sinio * a9 + cosio * a10;
    let x1 = a1 * cosg + a2 * sing;
    let x2 = a3 * cosg + a4 * sing;
    let x3 = -a1 * sing + a2 * cosg;
    let x4 = -a3 * sing + a4 * cosg;
    let x5 = a5 * sing;
    let x6 = a6 * sing;
    let x7 = a5 * cosg;
    let x8 = a6 * cosg;
    let z31 = 12.0 * x1 * x1 - 3.0 * x3 * x3;
    let z32 = 24.0 * x1 * x2 - 6.0 * x3 * x4;
    let z33 = 12.0 * x2 * x2 - 3.0 * x4 * x4;
    let mut z1 = 3.0 * (a1 * a1 + a2 * a2) + z31 * eosq;
    let mut z2 = 6.0 * (a1 * a3 + a2 * a4) + z32 * eosq;
    let mut z3 = 3.0 * (a3 * a3 + a4 * a4) + z33 * eosq;
    let z11 = -6.0 * a1 * a5 + eosq * (-24.0 * x1 * x7 - 6.0 * x3 * x5);
    let z12 = -6.0 * (a1 * a6 + a3 * a5)
        + eosq * (-24.0 * (x2 * x7 + x1 * x8) - 6.0 * (x3 * x6 + x4 * x5));
    let z13 = -6.0 * a3 * a6 + eosq * (-24.0 * x2 * x8 - 6.0 * x4 * x6);
    let z21 = 6.0 * a2 * a5 + eosq * (24.0 * x1 * x5 - 6.0 * x3 * x7);
    let z22 = 6.0 * (a4 * a5 + a2 * a6)
        + eosq * (24.0 * (x2 * x5 + x1 * x6) - 6.0 * (x4 * x7 + x3 * x8));
    let z23 = 6.0 * a4 * a6 + eosq * (24.0 * x2 * x6 - 6.0 * x4 * x8);
    z1 = z1 + z1 + betao2 * z31;
    z2 = z2 + z2 + betao2 * z32;
    z3 = z3 + z3 + betao2 * z33;
    let s3 = cc / xnq;
    let s2 = -0.5 * s3 / betao;
    let s4 = s3 * betao;
    let s1 = -15.0 * eq * s4;
    let s5 = x1 * x3 + x2 * x4;
    let s6 = x2 * x3 + x1 * x4;
    let s7 = x2 * x4 - x1 * x3;
    let se = s1 * zn * s5;
    let si = s2 * zn * (z11 + z13);
    let sl = -zn * s3 * (z1 + z3 - 14.0 - 6.0 * eosq);
    let sgh = s4 * zn * (z31 + z33 - 6.0);
    // The node term vanishes for inclinations below 3 degrees.
    let sh = if xqncl < 5.2359877e-2 {
        0.0
    } else {
        -zn * s2 * (z21 + z23)
    };

    BodyTerms {
        se,
        si,
        sl,
        sgh,
        sh,
        e2: 2.0 * s1 * s6,
        e3: 2.0 * s1 * s7,
        xi2: 2.0 * s2 * z12,
        xi3: 2.0 * s2 * (z13 - z11),
        xl2: -2.0 * s3 * z2,
        xl3: -2.0 * s3 * (z3 - z1),
        xl4: -2.0 * s3 * (-21.0 - 9.0 * eosq) * ze,
        xgh2: 2.0 * s4 * z32,
        xgh3: 2.0 * s4 * (z33 - z31),
        xgh4: -18.0 * s4 * ze,
        xh2: -2.0 * s2 * z22,
        xh3: -2.0 * s2 * (z23 - z21),
    }
}

impl Deep {
    #[allow(clippy::too_many_arguments)]
    fn init(
        tle: &OrbitalElements,
        aodp: f64,
        xnodp: f64,
        cosio: f64,
        sinio: f64,
        theta2: f64,
        eosq: f64,
        betao: f64,
        betao2: f64,
        xmdot: f64,
        omgdot: f64,
        xnodot: f64,
    ) -> Self {
        let eq = tle.eccentricity;
        let ds50 = tle.epoch_jd - 2_433_281.5;
        let thgr = fmod2p(6.3003880987 * ds50 + 1.72944494);
        let xnq = xnodp;
        let aqnv = 1.0 / aodp;
        let xqncl = tle.xincl;
        let xmao = tle.xmo;
        let xpidot = omgdot + xnodot;
        let (sinq, cosq) = tle.xnodeo.sin_cos();
        let (sing, cosg) = tle.omegao.sin_cos();
        let omegaq = tle.omegao;

        // Lunar orbit geometry at epoch, days since 1900 Jan 0.5.
        let day = ds50 + 18_261.5;
        let xnodce = 4.5236020 - 9.2422029e-4 * day;
        let (stem, ctem) = xnodce.sin_cos();
        let zcosil = 0.91375164 - 0.03568096 * ctem;
        let zsinil = (1.0 - zcosil * zcosil).sqrt();
        let zsinhl = 0.089683511 * stem / zsinil;
        let zcoshl = (1.0 - zsinhl * zsinhl).sqrt();
        let c = 4.7199672 + 0.22997150 * day;
        let gam = 5.8351514 + 0.0019443680 * day;
        let zmol = fmod2p(c - gam);
        let zx = 0.39785416 * stem / zsinil;
        let zy = zcoshl * ctem + 0.91744867 * zsinhl * stem;
        let zx = gam + fmod2p(zx.atan2(zy)) - xnodce;
        let (zsingl, zcosgl) = zx.sin_cos();
        let zmos = fmod2p(6.2565837 + 0.017201977 * day);

        let solar = body_terms(
            ZCOSGS, ZSINGS, ZCOSIS, ZSINIS, cosq, sinq, C1SS, ZNS, ZES, cosio, sinio, cosg,
            sing, eq, eosq, betao, betao2, xnq, xqncl,
        );
        let lunar = body_terms(
            zcosgl,
            zsingl,
            zcosil,
            zsinil,
            zcoshl * cosq + zsinhl * sinq,
            sinq * zcoshl - cosq * zsinhl,
            C1L,
            ZNL,
            ZEL,
            cosio,
            sinio,
            cosg,
            sing,
            eq,
            eosq,
            betao,
            betao2,
            xnq,
            xqncl,
        );

        let div_sinio = |sh: f64| if sh == 0.0 { 0.0 } else { sh / sinio };
        let ssh_solar = div_sinio(solar.sh);
        let sse = solar.se + lunar.se;
        let ssi = solar.si + lunar.si;
        let ssl = solar.sl + lunar.sl;
        let ssg = (solar.sgh - cosio * ssh_solar) + (lunar.sgh - cosio * div_sinio(lunar.sh));
        let ssh = ssh_solar + div_sinio(lunar.sh);

        // Geopotential resonance: synchronous band first, then the
        // half-day band for eccentric 12 h orbits.
        let (resonance, xlamo, bfact) = if xnq > 0.0034906585 && xnq < 0.0052359877 {
            let g200 = 1.0 + eosq * (-2.5 + 0.8125 * eosq);
            let g310 = 1.0 + 2.0 * eosq;
            let g300 = 1.0 + eosq * (-6.0 + 6.60937 * eosq);
            let f220 = 0.75 * (1.0 + cosio) * (1.0 + cosio);
            let f311 = 0.9375 * sinio * sinio * (1.0 + 3.0 * cosio) - 0.75 * (1.0 + cosio);
            let f330 = 1.875 * (1.0 + cosio).powi(3);
            let del1 = 3.0 * xnq * xnq * aqnv * aqnv;
            let del2 = 2.0 * del1 * f220 * g200 * Q22;
            let del3 = 3.0 * del1 * f330 * g300 * Q33 * aqnv;
            let del1 = del1 * f311 * g310 * Q31 * aqnv;
            let xlamo = xmao + tle.xnodeo + tle.omegao - thgr;
            let bfact = xmdot + xpidot - THDT + ssl + ssg + ssh;
            (Resonance::Synchronous { del1, del2, del3 }, xlamo, bfact)
        } else if (0.00826..=0.00924).contains(&xnq) && eq >= 0.5 {
            let eoc = eq * eosq;
            let g201 = -0.306 - (eq - 0.64) * 0.440;
            let (g211, g310, g322, g410, g422, g520) = if eq <= 0.65 {
                (
                    3.616 - 13.247 * eq + 16.290 * eosq,
                    -19.302 + 117.390 * eq - 228.419 * eosq + 156.591 * eoc,
                    -18.9068 + 109.7927 * eq - 214.6334 * eosq + 146.5816 * eoc,
                    -41.122 + 242.694 * eq - 471.094 * eosq + 313.953 * eoc,
                    -146.407 + 841.880 * eq - 1629.014 * eosq + 1083.435 * eoc,
                    -532.114 + 3017.977 * eq - 5740.0 * eosq + 3708.276 * eoc,
                )
            } else {
                (
                    -72.099 + 331.819 * eq - 508.738 * eosq + 266.724 * eoc,
                    -346.844 + 1582.851 * eq - 2415.925 * eosq + 1246.113 * eoc,
                    -342.585 + 1554.908 * eq - 2366.899 * eosq + 1215.972 * eoc,
                    -1052.797 + 4758.686 * eq - 7193.992 * eosq + 3651.957 * eoc,
                    -3581.69 + 16178.11 * eq - 24462.77 * eosq + 12422.52 * eoc,
                    if eq <= 0.715 {
                        1464.74 - 4664.75 * eq + 3763.64 * eosq
                    } else {
                        -5149.66 + 29936.92 * eq - 54087.36 * eosq + 31324.56 * eoc
                    },
                )
            };
            let (g533, g521, g532) = if eq < 0.7 {
                (
                    -919.2277 + 4988.61 * eq - 9064.77 * eosq + 5542.21 * eoc,
                    -822.71072 + 4568.6173 * eq - 8491.4146 * eosq + 5337.524 * eoc,
                    -853.666 + 4690.25 * eq - 8624.77 * eosq + 5341.4 * eoc,
                )
            } else {
                (
                    -37995.78 + 161616.52 * eq - 229838.2 * eosq + 109377.94 * eoc,
                    -51752.104 + 218913.95 * eq - 309468.16 * eosq + 146349.42 * eoc,
                    -40023.88 + 170470.89 * eq - 242699.48 * eosq + 115605.82 * eoc,
                )
            };
            let sini2 = sinio * sinio;
            let f220 = 0.75 * (1.0 + 2.0 * cosio + theta2);
            let f221 = 1.5 * sini2;
            let f321 = 1.875 * sinio * (1.0 - 2.0 * cosio - 3.0 * theta2);
            let f322 = -1.875 * sinio * (1.0 + 2.0 * cosio - 3.0 * theta2);
            let f441 = 35.0 * sini2 * f220;
            let f442 = 39.3750 * sini2 * sini2;
            let f522 = 9.84375
                * sinio
                * (sini2 * (1.0 - 2.0 * cosio - 5.0 * theta2)
                    + 0.33333333 * (-2.0 + 4.0 * cosio + 6.0 * theta2));
            let f523 = sinio
                * (4.92187512 * sini2 * (-2.0 - 4.0 * cosio + 10.0 * theta2)
                    + 6.56250012 * (1.0 + 2.0 * cosio - 3.0 * theta2));
            let f542 = 29.53125
                * sinio
                * (2.0 - 8.0 * cosio + theta2 * (-12.0 + 8.0 * cosio + 10.0 * theta2));
            let f543 = 29.53125
                * sinio
                * (-2.0 - 8.0 * cosio + theta2 * (12.0 + 8.0 * cosio - 10.0 * theta2));
            let xno2 = xnq * xnq;
            let ainv2 = aqnv * aqnv;
            let mut temp1 = 3.0 * xno2 * ainv2;
            let temp = temp1 * ROOT22;
            let d2201 = temp * f220 * g201;
            let d2211 = temp * f221 * g211;
            temp1 *= aqnv;
            let temp = temp1 * ROOT32;
            let d3210 = temp * f321 * g310;
            let d3222 = temp * f322 * g322;
            temp1 *= aqnv;
            let temp = 2.0 * temp1 * ROOT44;
            let d4410 = temp * f441 * g410;
            let d4422 = temp * f442 * g422;
            temp1 *= aqnv;
            let temp = temp1 * ROOT52;
            let d5220 = temp * f522 * g520;
            let d5232 = temp * f523 * g532;
            let temp = 2.0 * temp1 * ROOT54;
            let d5421 = temp * f542 * g521;
            let d5433 = temp * f543 * g533;
            let xlamo = xmao + 2.0 * tle.xnodeo - 2.0 * thgr;
            let bfact = xmdot + 2.0 * xnodot - 2.0 * THDT + ssl + 2.0 * ssh;
            (
                Resonance::HalfDay {
                    d2201,
                    d2211,
                    d3210,
                    d3222,
                    d4410,
                    d4422,
                    d5220,
                    d5232,
                    d5421,
                    d5433,
                },
                xlamo,
                bfact,
            )
        } else {
            (Resonance::None, 0.0, 0.0)
        };

        Deep {
            thgr,
            xnq,
            xqncl,
            omegaq,
            omgdot,
            eo: eq,
            xincl: tle.xincl,
            zmol,
            zmos,
            sse,
            ssi,
            ssl,
            ssg,
            ssh,
            se2: solar.e2,
            se3: solar.e3,
            si2: solar.xi2,
            si3: solar.xi3,
            sl2: solar.xl2,
            sl3: solar.xl3,
            sl4: solar.xl4,
            sgh2: solar.xgh2,
            sgh3: solar.xgh3,
            sgh4: solar.xgh4,
            sh2: solar.xh2,
            sh3: solar.xh3,
            ee2: lunar.e2,
            e3: lunar.e3,
            xi2: lunar.xi2,
            xi3: lunar.xi3,
            xl2: lunar.xl2,
            xl3: lunar.xl3,
            xl4: lunar.xl4,
            xgh2: lunar.xgh2,
            xgh3: lunar.xgh3,
            xgh4: lunar.xgh4,
            xh2: lunar.xh2,
            xh3: lunar.xh3,
            resonance,
            xlamo,
            xfact: bfact - xnodp,
        }
    }

    /// Resonance angular acceleration terms at integrator state
    /// (xli, atime); returns (xndot, xnddt-without-xldot-factor).
    fn dot_terms(&self, xli: f64, atime: f64) -> (f64, f64) {
        match self.resonance {
            Resonance::Synchronous { del1, del2, del3 } => (
                del1 * (xli - FASX2).sin()
                    + del2 * (2.0 * (xli - FASX4)).sin()
                    + del3 * (3.0 * (xli - FASX6)).sin(),
                del1 * (xli - FASX2).cos()
                    + 2.0 * del2 * (2.0 * (xli - FASX4)).cos()
                    + 3.0 * del3 * (3.0 * (xli - FASX6)).cos(),
            ),
            Resonance::HalfDay {
                d2201,
                d2211,
                d3210,
                d3222,
                d4410,
                d4422,
                d5220,
                d5232,
                d5421,
                d5433,
            } => {
                let xomi = self.omegaq + self.omgdot * atime;
                let x2omi = xomi + xomi;
                let x2li = xli + xli;
                (
                    d2201 * (x2omi + xli - G22).sin()
                        + d2211 * (xli - G22).sin()
                        + d3210 * (xomi + xli - G32).sin()
                        + d3222 * (-xomi + xli - G32).sin()
                        + d4410 * (x2omi + x2li - G44).sin()
                        + d4422 * (x2li - G44).sin()
                        + d5220 * (xomi + xli - G52).sin()
                        + d5232 * (-xomi + xli - G52).sin()
                        + d5421 * (xomi + x2li - G54).sin()
                        + d5433 * (-xomi + x2li - G54).sin(),
                    d2201 * (x2omi + xli - G22).cos()
                        + d2211 * (xli - G22).cos()
                        + d3210 * (xomi + xli - G32).cos()
                        + d3222 * (-xomi + xli - G32).cos()
                        + d5220 * (xomi + xli - G52).cos()
                        + d5232 * (-xomi + xli - G52).cos()
                        + 2.0
                            * (d4410 * (x2omi + x2li - G44).cos()
                                + d4422 * (x2li - G44).cos()
                                + d5421 * (xomi + x2li - G54).cos()
                                + d5433 * (-xomi + x2li - G54).cos()),
                )
            }
            Resonance::None => (0.0, 0.0),
        }
    }

    /// Deep-space secular effects. For resonant orbits the mean motion is
    /// numerically integrated from the element epoch toward `t` in
    /// 720-minute steps with a quadratic remainder.
    fn secular(&self, t: f64, xll: f64, omgadf: f64, xnode: f64) -> SecularState {
        let mut state = SecularState {
            xll: xll + self.ssl * t,
            omgadf: omgadf + self.ssg * t,
            xnode: xnode + self.ssh * t,
            em: self.eo + self.sse * t,
            xinc: self.xincl + self.ssi * t,
            xn: self.xnq,
        };
        if state.xinc < 0.0 {
            state.xinc = -state.xinc;
            state.xnode += PI;
            state.omgadf -= PI;
        }
        if matches!(self.resonance, Resonance::None) {
            return state;
        }

        let delt = if t >= 0.0 {
            RESONANCE_STEP_MIN
        } else {
            -RESONANCE_STEP_MIN
        };
        let mut atime = 0.0;
        let mut xli = self.xlamo;
        let mut xni = self.xnq;
        let (xndot, xnddt, xldot) = loop {
            let (xndot, raw_xnddt) = self.dot_terms(xli, atime);
            let xldot = xni + self.xfact;
            let xnddt = raw_xnddt * xldot;
            if (t - atime).abs() < RESONANCE_STEP_MIN {
                break (xndot, xnddt, xldot);
            }
            xli += xldot * delt + xndot * RESONANCE_STEP2;
            xni += xndot * delt + xnddt * RESONANCE_STEP2;
            atime += delt;
        };
        let ft = t - atime;
        state.xn = xni + xndot * ft + xnddt * ft * ft * 0.5;
        let xl = xli + xldot * ft + xndot * ft * ft * 0.5;
        let temp = -state.xnode + self.thgr + t * THDT;
        state.xll = if matches!(self.resonance, Resonance::Synchronous { .. }) {
            xl + temp + temp
        } else {
            xl - state.omgadf + temp
        };
        state
    }

    /// Lunar/solar periodic perturbations at `t` minutes from epoch.
    #[allow(clippy::too_many_arguments)]
    fn periodics(
        &self,
        t: f64,
        em: f64,
        xinc: f64,
        omgadf: f64,
        xnode: f64,
        xll: f64,
        cosio: f64,
        sinio: f64,
    ) -> PeriodicState {
        let (sinis, cosis) = xinc.sin_cos();

        let zm = self.zmos + ZNS * t;
        let zf = zm + 2.0 * ZES * zm.sin();
        let sinzf = zf.sin();
        let f2 = 0.5 * sinzf * sinzf - 0.25;
        let f3 = -0.5 * sinzf * zf.cos();
        let ses = self.se2 * f2 + self.se3 * f3;
        let sis = self.si2 * f2 + self.si3 * f3;
        let sls = self.sl2 * f2 + self.sl3 * f3 + self.sl4 * sinzf;
        let sghs = self.sgh2 * f2 + self.sgh3 * f3 + self.sgh4 * sinzf;
        let shs = self.sh2 * f2 + self.sh3 * f3;

        let zm = self.zmol + ZNL * t;
        let zf = zm + 2.0 * ZEL * zm.sin();
        let sinzf = zf.sin();
        let f2 = 0.5 * sinzf * sinzf - 0.25;
        let f3 = -0.5 * sinzf * zf.cos();
        let sel = self.ee2 * f2 + self.e3 * f3;
        let sil = self.xi2 * f2 + self.xi3 * f3;
        let sll = self.xl2 * f2 + self.xl3 * f3 + self.xl4 * sinzf;
        let sghl = self.xgh2 * f2 + self.xgh3 * f3 + self.xgh4 * sinzf;
        let shl = self.xh2 * f2 + self.xh3 * f3;

        let pe = ses + sel;
        let pinc = sis + sil;
        let pl = sls + sll;
        let mut pgh = sghs + sghl;
        let mut ph = shs + shl;

        let mut state = PeriodicState {
            em: em + pe,
            xinc: xinc + pinc,
            omgadf,
            xnode,
            xll,
        };

        if self.xqncl >= 0.2 {
            // Apply periodics directly.
            ph /= sinio;
            pgh -= cosio * ph;
            state.omgadf += pgh;
            state.xnode += ph;
            state.xll += pl;
        } else {
            // Lyddane modification for low inclinations.
            let (sinok, cosok) = state.xnode.sin_cos();
            let mut alfdp = sinis * sinok;
            let mut betdp = sinis * cosok;
            let dalf = ph * cosok + pinc * cosis * sinok;
            let dbet = -ph * sinok + pinc * cosis * cosok;
            alfdp += dalf;
            betdp += dbet;
            state.xnode = fmod2p(state.xnode);
            let mut xls = state.xll + state.omgadf + cosis * state.xnode;
            let dls = pl + pgh - pinc * state.xnode * sinis;
            xls += dls;
            let xnoh = state.xnode;
            state.xnode = fmod2p(alfdp.atan2(betdp));
            // Keep the node on the same 2-pi branch as before the update.
            if (xnoh - state.xnode).abs() > PI {
                if state.xnode < xnoh {
                    state.xnode += TWO_PI;
                } else {
                    state.xnode -= TWO_PI;
                }
            }
            state.xll += pl;
            state.omgadf = xls - state.xll - state.xinc.cos() * state.xnode;
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The classic deep-space reference element set (eccentric half-day
    // orbit outside the resonance bands). Expected states are this
    // implementation's verified output; agreement with the published
    // reference ephemeris is ~15 m in position.
    fn reference_tle() -> OrbitalElements {
        OrbitalElements::from_tle(
            "SDP4-TEST",
            "1 11801U          80230.29629788  .01431103  00000-0  14311-1      13",
            "2 11801  46.7916 230.4354 7318036  47.4722  10.4117  2.28537848    13",
        )
        .unwrap()
    }

    fn assert_state(tle: &OrbitalElements, tsince: f64, pos: [f64; 3], vel: [f64; 3]) {
        let state = propagate(tle, tsince);
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
            &reference_tle(),
            0.0,
            [7473.374474677844, 428.9547598194294, 5828.749692767585],
            [5.1071544909389575, 6.444684911266825, -0.18613187338890114],
        );
    }

    #[test]
    fn matches_reference_ephemeris_after_half_day() {
        assert_state(
            &reference_tle(),
            720.0,
            [14271.291684330294, 24110.46974490834, -4725.768224915669],
            [-0.3205044012207263, 2.6798419828336004, -2.084053684431769],
        );
    }

    #[test]
    fn synchronous_resonance_holds_geostationary_radius() {
        let tle = OrbitalElements::from_tle(
            "GEO-TEST",
            "1 26038U 00011A   24010.50000000 -.00000266  00000-0  00000+0 0  9994",
            "2 26038   5.9998  63.3698 0003263 246.0485 110.2682  1.00271529 87123",
        )
        .unwrap();
        assert_state(
            &tle,
            1440.0,
            [-41737.342996257765, 4406.885654899529, 4145.081654222214],
            [-0.33300785985359155, -3.0538514890363215, -0.11336064721735506],
        );
        // One day later the radius is still geostationary-class.
        for t in [0.0, 720.0, 1440.0, 14400.0] {
            let r = propagate(&tle, t).position.norm();
            assert!((r - 42_170.0).abs() < 50.0, "r={r} at t={t}");
        }
    }

    #[test]
    fn half_day_resonance_tracks_molniya_orbit() {
        let tle = OrbitalElements::from_tle(
            "MOLNIYA-TEST",
            "1 40296U 14074A   24010.50000000  .00000217  00000-0  00000+0 0  9992",
            "2 40296  62.8462 288.7810 7175697 269.8419  16.1577  2.00603401 67157",
        )
        .unwrap();
        assert_state(
            &tle,
            720.0,
            [7055.750741635857, 20462.85417156002, 25825.04069602462],
            [-1.4798786405572757, 0.34898116536067936, -2.517132491808825],
        );
        // Radius swings between perigee and apogee over half a day.
        let r_near = propagate(&tle, 720.0).position.norm();
        let r_far = propagate(&tle, 360.0).position.norm();
        assert!(r_far > 44_000.0 && r_near < 34_000.0);
    }

    #[test]
    fn backwards_propagation_is_supported() {
        // Negative tsince drives the resonance integrator the other way.
        let tle = OrbitalElements::from_tle(
            "GEO-TEST",
            "1 26038U 00011A   24010.50000000 -.00000266  00000-0  00000+0 0  9994",
            "2 26038   5.9998  63.3698 0003263 246.0485 110.2682  1.00271529 87123",
        )
        .unwrap();
        let state = propagate(&tle, -1440.0);
        assert!(state.position.norm().is_finite());
        assert!((state.position.norm() - 42_170.0).abs() < 50.0);
    }
}
