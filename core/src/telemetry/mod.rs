//! Telemetry: upload cadence, sample assembly and wire encoding

pub mod cycle;
pub mod line_protocol;
pub mod sample;
pub mod sink;

pub use cycle::{
    CycleConfig, CycleReport, CycleTimers, IntervalTimer, TelemetryCycle, UploadOutcome,
};
pub use line_protocol::{encode, encode_into, EncodeError, Line, TelemetryTags, LINE_CAPACITY};
pub use sample::TelemetrySample;
pub use sink::TelemetrySink;
