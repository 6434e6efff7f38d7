#![deny(unsafe_code)]
//! Feather peripherals behind the node's traits

use defmt::warn;
use embassy_stm32::gpio::Output;
use embassy_stm32::i2c::I2c;
use embassy_stm32::mode::Blocking;
use embassy_stm32::usart::BufferedUart;
use embassy_time::Delay;
use embedded_hal::delay::DelayNs;
use hal_abstractions::{
    Clock, EnvironmentReading, EnvironmentSensor, Instant, NetworkIndicator, SensorIndicator,
    StatusIndicator,
};

/// Milliseconds since boot from the embassy time driver
#[derive(Clone, Copy)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now(&self) -> Instant {
        Instant::from_ticks(embassy_time::Instant::now().as_millis())
    }
}

/// UART error wrapper for the NextPM port
#[derive(Debug, Clone, Copy, defmt::Format)]
pub struct UartError(pub embassy_stm32::usart::Error);

impl core::fmt::Display for UartError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "UART error: {:?}", self.0)
    }
}

impl core::error::Error for UartError {}

impl embedded_io::Error for UartError {
    fn kind(&self) -> embedded_io::ErrorKind {
        embedded_io::ErrorKind::Other
    }
}

/// Interrupt-driven buffered USART wired to the NextPM
pub struct NextPmPort(pub BufferedUart<'static>);

impl embedded_io::ErrorType for NextPmPort {
    type Error = UartError;
}

impl embedded_io::Read for NextPmPort {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        embedded_io_06::Read::read(&mut self.0, buf).map_err(UartError)
    }
}

impl embedded_io::ReadReady for NextPmPort {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        embedded_io_06::ReadReady::read_ready(&mut self.0).map_err(UartError)
    }
}

impl embedded_io::Write for NextPmPort {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        embedded_io_06::Write::write(&mut self.0, buf).map_err(UartError)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        embedded_io_06::Write::flush(&mut self.0).map_err(UartError)
    }
}

const NAN_READING: EnvironmentReading = EnvironmentReading {
    temperature_c: f32::NAN,
    pressure_pa: f32::NAN,
    humidity_pct: f32::NAN,
};

/// BME280 at 0x76; failed measurements read as NaN
pub struct Bme280Sensor {
    dev: bme280::i2c::BME280<I2c<'static, Blocking>>,
    delay: Delay,
}

impl Bme280Sensor {
    pub fn new(i2c: I2c<'static, Blocking>) -> Self {
        let mut delay = Delay;
        let mut dev = bme280::i2c::BME280::new_primary(i2c);
        if dev.init(&mut delay).is_err() {
            warn!("BME280 init failed, environment values will be NaN");
        }
        Self { dev, delay }
    }
}

impl EnvironmentSensor for Bme280Sensor {
    fn read_temperature(&mut self) -> f32 {
        self.read_all().temperature_c
    }

    fn read_pressure(&mut self) -> f32 {
        self.read_all().pressure_pa
    }

    fn read_humidity(&mut self) -> f32 {
        self.read_all().humidity_pct
    }

    fn read_all(&mut self) -> EnvironmentReading {
        match self.dev.measure(&mut self.delay) {
            Ok(m) => EnvironmentReading {
                temperature_c: m.temperature,
                pressure_pa: m.pressure,
                humidity_pct: m.humidity,
            },
            Err(_) => {
                warn!("BME280 measurement failed");
                NAN_READING
            }
        }
    }
}

/// Network LED on PC1, sensor LED on PB8
pub struct StatusLeds {
    network: Output<'static>,
    sensor: Output<'static>,
    delay: Delay,
}

impl StatusLeds {
    pub fn new(network: Output<'static>, sensor: Output<'static>) -> Self {
        Self {
            network,
            sensor,
            delay: Delay,
        }
    }
}

impl StatusIndicator for StatusLeds {
    fn show_network(&mut self, state: NetworkIndicator) {
        match state {
            NetworkIndicator::Online => {
                for _ in 0..3 {
                    self.network.set_high();
                    self.delay.delay_ms(200);
                    self.network.set_low();
                    self.delay.delay_ms(150);
                }
            }
            NetworkIndicator::Reconnecting => self.network.set_high(),
        }
    }

    fn show_sensor(&mut self, state: SensorIndicator) {
        // Lit means the last particulate reading failed; blinking at the
        // upload rate means no valid reading yet
        match state {
            SensorIndicator::Pending => self.sensor.toggle(),
            SensorIndicator::Ok => self.sensor.set_low(),
            SensorIndicator::Fault => self.sensor.set_high(),
        }
    }
}
