//! Orbital prediction core: SGP4/SDP4 propagation, topocentric and
//! geodetic transforms, AOS/LOS/TCA pass search, and per-sample derived
//! quantities (Doppler, eclipse state, footprint, ground track).
//!
//! Everything here is pure, CPU-bound computation over immutable inputs;
//! callers own scheduling, ingestion, and presentation.

pub mod constants;
pub mod coords;
pub mod observer;
pub mod pass_prediction;
mod propagator;
pub mod radio;
mod sdp4;
mod sgp4;
pub mod sun;
pub mod tle;
pub mod track;

mod satellite;

pub use observer::Observer;
pub use pass_prediction::{predict_passes, SatellitePass};
pub use propagator::{EciState, Propagator};
pub use satellite::{Satellite, SatellitePosition};
pub use tle::{parse_tle_stream, OmmElements, OrbitalElements, ParseError};
