//! Physical and model constants shared by the propagators and the
//! observation geometry. The SGP4/SDP4 values are the classic WGS72-lineage
//! set; they are part of the model definition and must not be tuned.

pub const TWO_PI: f64 = std::f64::consts::PI * 2.0;
pub const TOTHRD: f64 = 2.0 / 3.0;

/// Earth equatorial radius, km.
pub const XKMPER: f64 = 6378.137;
/// Earth flattening.
pub const FLATTENING: f64 = 3.35281066474748e-3;
/// Distance units inside the propagators (Earth radii).
pub const AE: f64 = 1.0;
/// sqrt(GM) in (Earth radii)^1.5 per minute.
pub const XKE: f64 = 7.43669161e-2;
/// 0.5 * J2 * AE^2.
pub const CK2: f64 = 5.413079e-4;
/// -0.375 * J4 * AE^4.
pub const CK4: f64 = 6.209887e-7;
/// J3 zonal harmonic.
pub const XJ3: f64 = -2.53881e-6;
/// SGP4 density parameter s, Earth radii.
pub const S_DENSITY: f64 = 1.012229;
/// (q0 - s)^4, (Earth radii)^4.
pub const QOMS2T: f64 = 1.880279e-9;

pub const XMNPDA: f64 = 1440.0;
pub const SECDAY: f64 = 86400.0;
/// Sidereal to solar day ratio.
pub const OMEGA_E: f64 = 1.00273790934;
/// Earth rotation rate, rad/s.
pub const MFACTOR: f64 = 7.292115e-5;
/// Earth rotation rate, rad/min (deep-space resonance geometry).
pub const THDT: f64 = 4.3752691e-3;

pub const SPEED_OF_LIGHT: f64 = 2.99792458e8; // m/s
pub const ASTRONOMICAL_UNIT: f64 = 1.49597870691e8; // km
pub const SOLAR_RADIUS_KM: f64 = 6.96000e5;

// Lunar/solar perturbation series.
pub const ZNS: f64 = 1.19459e-5;
pub const C1SS: f64 = 2.9864797e-6;
pub const ZES: f64 = 0.01675;
pub const ZNL: f64 = 1.5835218e-4;
pub const C1L: f64 = 4.7968065e-7;
pub const ZEL: f64 = 0.05490;
pub const ZCOSIS: f64 = 0.91744867;
pub const ZSINIS: f64 = 0.39785416;
pub const ZSINGS: f64 = -0.98088458;
pub const ZCOSGS: f64 = 0.1945905;

// Geopotential resonance coefficients.
pub const Q22: f64 = 1.7891679e-6;
pub const Q31: f64 = 2.1460748e-6;
pub const Q33: f64 = 2.2123015e-7;
pub const G22: f64 = 5.7686396;
pub const G32: f64 = 0.95240898;
pub const G44: f64 = 1.8014998;
pub const G52: f64 = 1.0508330;
pub const G54: f64 = 4.4108898;
pub const ROOT22: f64 = 1.7891679e-6;
pub const ROOT32: f64 = 3.7393792e-7;
pub const ROOT44: f64 = 7.3636953e-9;
pub const ROOT52: f64 = 1.1428639e-7;
pub const ROOT54: f64 = 2.1765803e-9;
pub const FASX2: f64 = 0.13130908;
pub const FASX4: f64 = 2.8843198;
pub const FASX6: f64 = 0.37448087;

/// Resonance integrator step, minutes.
pub const RESONANCE_STEP_MIN: f64 = 720.0;
/// Half the squared resonance step (quadratic integration term).
pub const RESONANCE_STEP2: f64 = 259200.0;

/// Kepler solver convergence bound, radians.
pub const KEPLER_TOLERANCE: f64 = 1e-12;
/// Geodetic latitude solver convergence bound, radians.
pub const GEODETIC_TOLERANCE: f64 = 1e-12;
/// Iteration cap for both bounded solvers; the last estimate is used on
/// non-convergence rather than failing the computation.
pub const MAX_SOLVER_ITERATIONS: usize = 10;

/// Floor for the drag-updated eccentricity of near-decayed orbits.
pub const ECC_LIMIT_LOW: f64 = 1e-6;
/// Below this eccentricity the 1/e perigee-correction terms are dropped.
pub const ECC_SMALL: f64 = 1e-4;
/// Floor for the (aodp - s4) atmospheric density denominator, Earth radii.
pub const MIN_DENSITY_DENOM: f64 = 1e-6;

/// Orbits slower than this are propagated with the deep-space model
/// (period above 225 minutes), rev/day.
pub const MIN_NEAR_EARTH_MEAN_MOTION: f64 = 6.4;

/// Two-digit TLE epoch years below this land in the 2000s.
pub const TLE_EPOCH_CENTURY_PIVOT: i32 = 57;
