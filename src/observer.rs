use serde::{Deserialize, Serialize};

/// A fixed ground location. Degrees and meters at this boundary; the
/// engine converts to radians/km internally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observer {
    pub name: String,
    pub latitude: f64,  // degrees, north positive
    pub longitude: f64, // degrees, east positive
    pub altitude: f64,  // meters above the ellipsoid
}

impl Observer {
    pub fn new(name: String, lat: f64, lon: f64, alt: f64) -> Self {
        Self {
            name,
            latitude: lat,
            longitude: lon,
            altitude: alt,
        }
    }
}
