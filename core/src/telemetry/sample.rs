//! One upload unit

use hal_abstractions::EnvironmentReading;

use crate::sensors::ParticulateReading;

/// Pascal per hectopascal
const PA_PER_HPA: f32 = 100.0;

/// Values uploaded on one upload tick
///
/// Built fresh every time and dropped once handed to the sink. Particulate
/// values may be stale; environmental values may be NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TelemetrySample {
    /// Temperature [°C]
    pub temperature_c: f32,
    /// Pressure [hPa]
    pub pressure_hpa: f32,
    /// Relative humidity [%RH]
    pub humidity_pct: f32,
    /// PM1 [µg/m³]
    pub pm1: f32,
    /// PM2.5 [µg/m³]
    pub pm2_5: f32,
    /// PM10 [µg/m³]
    pub pm10: f32,
}

impl TelemetrySample {
    pub fn new(environment: EnvironmentReading, particulates: ParticulateReading) -> Self {
        Self {
            temperature_c: environment.temperature_c,
            pressure_hpa: environment.pressure_pa / PA_PER_HPA,
            humidity_pct: environment.humidity_pct,
            pm1: particulates.pm1,
            pm2_5: particulates.pm2_5,
            pm10: particulates.pm10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pressure_in_hpa() {
        let sample = TelemetrySample::new(
            EnvironmentReading {
                temperature_c: 21.5,
                pressure_pa: 101_325.0,
                humidity_pct: 40.0,
            },
            ParticulateReading {
                pm1: 1.0,
                pm2_5: 2.0,
                pm10: 3.0,
                valid: false,
            },
        );
        assert_eq!(sample.pressure_hpa, 1013.25);
        assert_eq!(sample.temperature_c, 21.5);
        assert_eq!((sample.pm1, sample.pm2_5, sample.pm10), (1.0, 2.0, 3.0));
    }

    #[test]
    fn test_nan_passes_through() {
        let sample = TelemetrySample::new(
            EnvironmentReading {
                temperature_c: f32::NAN,
                pressure_pa: f32::NAN,
                humidity_pct: 55.0,
            },
            ParticulateReading::default(),
        );
        assert!(sample.temperature_c.is_nan());
        assert!(sample.pressure_hpa.is_nan());
        assert_eq!(sample.humidity_pct, 55.0);
    }
}
