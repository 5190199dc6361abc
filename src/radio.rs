use crate::constants::SPEED_OF_LIGHT;
use crate::satellite::SatellitePosition;

/// Doppler-corrected frequencies for one position sample, Hz.
#[derive(Debug, Clone)]
pub struct DopplerShift {
    pub downlink_hz: f64,
    pub downlink_shift_hz: f64,
    pub uplink_hz: f64,
    pub uplink_shift_hz: f64,
}

/// Frequency the ground station hears a satellite downlink at, given the
/// sample's range-rate (receding satellite shifts the signal down).
pub fn downlink_freq(freq_hz: f64, position: &SatellitePosition) -> f64 {
    freq_hz * (SPEED_OF_LIGHT - position.range_rate_km_s * 1000.0) / SPEED_OF_LIGHT
}

/// Frequency to transmit at so the satellite receives the nominal uplink
/// (pre-compensated in the opposite direction).
pub fn uplink_freq(freq_hz: f64, position: &SatellitePosition) -> f64 {
    freq_hz * (SPEED_OF_LIGHT + position.range_rate_km_s * 1000.0) / SPEED_OF_LIGHT
}

pub fn doppler_shift(
    downlink_hz: f64,
    uplink_hz: f64,
    position: &SatellitePosition,
) -> DopplerShift {
    let downlink = downlink_freq(downlink_hz, position);
    let uplink = uplink_freq(uplink_hz, position);
    DopplerShift {
        downlink_hz: downlink,
        downlink_shift_hz: downlink - downlink_hz,
        uplink_hz: uplink,
        uplink_shift_hz: uplink - uplink_hz,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample(range_rate_km_s: f64) -> SatellitePosition {
        SatellitePosition {
            time: Utc.timestamp_millis_opt(1_704_110_400_000).unwrap(),
            azimuth: 180.0,
            elevation: 45.0,
            latitude: 0.0,
            longitude: 0.0,
            altitude_km: 420.0,
            range_km: 1000.0,
            range_rate_km_s,
            phase: 0.0,
            eclipsed: false,
            eclipse_depth: -0.5,
        }
    }

    #[test]
    fn zero_range_rate_leaves_frequency_unchanged() {
        let position = sample(0.0);
        assert_eq!(downlink_freq(145_800_000.0, &position), 145_800_000.0);
        assert_eq!(uplink_freq(435_000_000.0, &position), 435_000_000.0);
    }

    #[test]
    fn receding_satellite_shifts_downlink_down_and_uplink_up() {
        let position = sample(5.0);
        assert!(downlink_freq(145_800_000.0, &position) < 145_800_000.0);
        assert!(uplink_freq(435_000_000.0, &position) > 435_000_000.0);
    }

    #[test]
    fn approaching_satellite_shift_magnitude() {
        // 7 km/s closing at 145.8 MHz is about +3.4 kHz.
        let position = sample(-7.0);
        let shift = doppler_shift(145_800_000.0, 435_000_000.0, &position);
        assert!((shift.downlink_shift_hz - 3_404.0).abs() < 10.0);
        assert!(shift.uplink_shift_hz < 0.0);
        assert!((shift.downlink_hz - (145_800_000.0 + shift.downlink_shift_hz)).abs() < 1e-6);
    }
}
