//! Recording fakes for the node's collaborators

extern crate std;

use std::vec::Vec;

use hal_abstractions::{
    EnvironmentReading, EnvironmentSensor, NetworkIndicator, NetworkLink, SensorIndicator,
    StatusIndicator,
};

use crate::sensors::{
    DecodeError, Freshness, ParticulateReading, ParticulateSource, SampleOutcome,
};
use crate::telemetry::{TelemetrySample, TelemetrySink, TelemetryTags};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkCall {
    Disconnect,
    Reconnect,
}

/// Link whose state the test flips by hand
pub struct FakeLink {
    pub up: bool,
    pub calls: Vec<LinkCall>,
}

impl FakeLink {
    pub fn up() -> Self {
        Self {
            up: true,
            calls: Vec::new(),
        }
    }

    pub fn reconnects(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| **c == LinkCall::Reconnect)
            .count()
    }
}

impl NetworkLink for FakeLink {
    fn is_connected(&mut self) -> bool {
        self.up
    }

    fn disconnect(&mut self) {
        self.calls.push(LinkCall::Disconnect);
    }

    fn reconnect(&mut self) {
        self.calls.push(LinkCall::Reconnect);
    }
}

#[derive(Default)]
pub struct Leds {
    pub network: Vec<NetworkIndicator>,
    pub sensor: Vec<SensorIndicator>,
}

impl StatusIndicator for Leds {
    fn show_network(&mut self, state: NetworkIndicator) {
        self.network.push(state);
    }

    fn show_sensor(&mut self, state: SensorIndicator) {
        self.sensor.push(state);
    }
}

/// Environment sensor returning fixed values
pub struct FixedEnvironment(pub EnvironmentReading);

impl Default for FixedEnvironment {
    fn default() -> Self {
        Self(EnvironmentReading {
            temperature_c: 21.5,
            pressure_pa: 101_320.0,
            humidity_pct: 40.0,
        })
    }
}

impl EnvironmentSensor for FixedEnvironment {
    fn read_temperature(&mut self) -> f32 {
        self.0.temperature_c
    }

    fn read_pressure(&mut self) -> f32 {
        self.0.pressure_pa
    }

    fn read_humidity(&mut self) -> f32 {
        self.0.humidity_pct
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkDown;

/// Sink keeping everything it was handed
#[derive(Default)]
pub struct RecordingSink {
    pub sent: Vec<TelemetrySample>,
    pub fail: bool,
}

impl TelemetrySink for RecordingSink {
    type Error = SinkDown;

    fn send(&mut self, sample: &TelemetrySample, _tags: &TelemetryTags) -> Result<(), SinkDown> {
        if self.fail {
            return Err(SinkDown);
        }
        self.sent.push(*sample);
        Ok(())
    }
}

/// Particulate source answering from a script
///
/// Each `sample` pops the next scripted result; an empty script fails
/// with `NoResponse`. Failures keep the held values, like the real
/// sampler.
#[derive(Default)]
pub struct ScriptedSource {
    pub script: Vec<Result<(f32, f32, f32), DecodeError>>,
    pub reading: ParticulateReading,
    pub calls: usize,
    pub escalate: bool,
    pub ever_valid: bool,
}

impl ScriptedSource {
    pub fn then_ok(mut self, pm1: f32, pm2_5: f32, pm10: f32) -> Self {
        self.script.push(Ok((pm1, pm2_5, pm10)));
        self
    }

    pub fn then_err(mut self, e: DecodeError) -> Self {
        self.script.push(Err(e));
        self
    }
}

impl ParticulateSource for ScriptedSource {
    fn sample(&mut self) -> SampleOutcome {
        self.calls += 1;
        let next = if self.script.is_empty() {
            Err(DecodeError::NoResponse)
        } else {
            self.script.remove(0)
        };
        match next {
            Ok((pm1, pm2_5, pm10)) => {
                self.reading = ParticulateReading {
                    pm1,
                    pm2_5,
                    pm10,
                    valid: true,
                };
                self.ever_valid = true;
                SampleOutcome::Updated(self.reading)
            }
            Err(e) => {
                self.reading.valid = false;
                if self.escalate {
                    SampleOutcome::Escalate(e)
                } else {
                    SampleOutcome::Failed(e)
                }
            }
        }
    }

    fn latest(&self) -> ParticulateReading {
        self.reading
    }

    fn freshness(&self) -> Freshness {
        match (self.reading.valid, self.ever_valid) {
            (true, _) => Freshness::Fresh,
            (false, true) => Freshness::Stale,
            (false, false) => Freshness::Never,
        }
    }
}
