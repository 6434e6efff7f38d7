//! Temperature / pressure / humidity sensor

/// One set of environmental values
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EnvironmentReading {
    /// Temperature [°C]
    pub temperature_c: f32,
    /// Pressure [Pa]
    pub pressure_pa: f32,
    /// Relative humidity [%RH]
    pub humidity_pct: f32,
}

/// Environmental sensor driver
///
/// Reads never fail at the type level: drivers report NaN when the
/// underlying measurement failed.
pub trait EnvironmentSensor {
    /// Temperature [°C]
    fn read_temperature(&mut self) -> f32;

    /// Pressure [Pa]
    fn read_pressure(&mut self) -> f32;

    /// Relative humidity [%RH]
    fn read_humidity(&mut self) -> f32;

    /// Read all three values
    ///
    /// Drivers that measure everything in one transaction should override
    /// this instead of issuing three.
    fn read_all(&mut self) -> EnvironmentReading {
        EnvironmentReading {
            temperature_c: self.read_temperature(),
            pressure_pa: self.read_pressure(),
            humidity_pct: self.read_humidity(),
        }
    }
}
