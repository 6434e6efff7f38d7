//! Node configuration
//!
//! Compile-time settings with `Default` impls matching the deployed
//! NebuleAir firmware.

use hal_abstractions::Duration;

use crate::network::MonitorConfig;
use crate::sensors::{DecoderConfig, SamplerConfig};
use crate::telemetry::{CycleConfig, TelemetryTags};

/// Everything the node needs to know up front
#[derive(Debug, Clone, Copy)]
pub struct NodeConfig {
    pub decoder: DecoderConfig,
    pub sampler: SamplerConfig,
    pub monitor: MonitorConfig,
    pub cycle: CycleConfig,
    pub tags: TelemetryTags,
    /// Particulate sensor stabilisation time after power-up
    pub sensor_warmup: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            decoder: DecoderConfig::default(),
            sampler: SamplerConfig::default(),
            monitor: MonitorConfig::default(),
            cycle: CycleConfig::default(),
            tags: TelemetryTags::default(),
            sensor_warmup: Duration::millis(15_000),
        }
    }
}
