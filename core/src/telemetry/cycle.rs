//! Sampling and upload cadence
//!
//! Two independent timers, each firing once "elapsed since last fire"
//! reaches its interval. A fire re-arms from the instant it was observed,
//! so late polls push later fires back: drift accumulates, a timer never
//! fires early.

use hal_abstractions::{Duration, EnvironmentSensor, Instant, SensorIndicator, StatusIndicator};

use super::line_protocol::TelemetryTags;
use super::sample::TelemetrySample;
use super::sink::TelemetrySink;
use crate::sensors::{Freshness, ParticulateSource, SampleOutcome};

/// Timer cadences
#[derive(Debug, Clone, Copy)]
pub struct CycleConfig {
    pub sampling_interval: Duration,
    pub upload_interval: Duration,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            sampling_interval: Duration::millis(10_000),
            upload_interval: Duration::millis(10_000),
        }
    }
}

/// "Elapsed since last fire" interval timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalTimer {
    interval: Duration,
    last_fire: Instant,
}

impl IntervalTimer {
    /// Timer phased at `origin`; the first fire is one interval later
    pub fn new(interval: Duration, origin: Instant) -> Self {
        Self {
            interval,
            last_fire: origin,
        }
    }

    pub fn last_fire(&self) -> Instant {
        self.last_fire
    }

    /// Fire and re-arm if the interval has elapsed at `now`
    pub fn poll(&mut self, now: Instant) -> bool {
        match now.checked_duration_since(self.last_fire) {
            Some(elapsed) if elapsed >= self.interval => {
                self.last_fire = now;
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleTimers {
    pub sampling: IntervalTimer,
    pub upload: IntervalTimer,
}

/// What happened on an upload fire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UploadOutcome {
    Sent,
    /// Sink refused the sample; it is gone
    Dropped,
}

/// Everything one cycle poll did
///
/// `upload` is `None` when the timer did not fire or when the sample
/// asked for a restart.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CycleReport {
    pub sample: Option<SampleOutcome>,
    pub upload: Option<UploadOutcome>,
}

/// Periodic sampling and upload orchestrator
pub struct TelemetryCycle {
    timers: CycleTimers,
    tags: TelemetryTags,
}

impl TelemetryCycle {
    pub fn new(config: CycleConfig, tags: TelemetryTags, origin: Instant) -> Self {
        Self {
            timers: CycleTimers {
                sampling: IntervalTimer::new(config.sampling_interval, origin),
                upload: IntervalTimer::new(config.upload_interval, origin),
            },
            tags,
        }
    }

    pub fn timers(&self) -> &CycleTimers {
        &self.timers
    }

    pub fn tags(&self) -> &TelemetryTags {
        &self.tags
    }

    /// Sample the particulate sensor if the sampling timer fired
    pub fn poll_sampling<S>(&mut self, now: Instant, source: &mut S) -> Option<SampleOutcome>
    where
        S: ParticulateSource,
    {
        if !self.timers.sampling.poll(now) {
            return None;
        }
        Some(source.sample())
    }

    /// Build and hand over one sample if the upload timer fired
    ///
    /// Uploads whatever the source holds, stale or not. The sensor
    /// indicator follows the source freshness.
    pub fn poll_upload<S, E, I, K>(
        &mut self,
        now: Instant,
        source: &S,
        environment: &mut E,
        indicator: &mut I,
        sink: &mut K,
    ) -> Option<UploadOutcome>
    where
        S: ParticulateSource,
        E: EnvironmentSensor,
        I: StatusIndicator,
        K: TelemetrySink,
    {
        if !self.timers.upload.poll(now) {
            return None;
        }

        indicator.show_sensor(match source.freshness() {
            Freshness::Never => SensorIndicator::Pending,
            Freshness::Fresh => SensorIndicator::Ok,
            Freshness::Stale => SensorIndicator::Fault,
        });

        let particulates = source.latest();

        let sample = TelemetrySample::new(environment.read_all(), particulates);
        match sink.send(&sample, &self.tags) {
            Ok(()) => {
                debug!("Sample uploaded");
                Some(UploadOutcome::Sent)
            }
            Err(_) => {
                warn!("Upload failed, sample dropped");
                Some(UploadOutcome::Dropped)
            }
        }
    }

    /// Run both timers in order: sampling, then upload
    ///
    /// A sample that escalates ends the poll; nothing is uploaded.
    pub fn poll<S, E, I, K>(
        &mut self,
        now: Instant,
        source: &mut S,
        environment: &mut E,
        indicator: &mut I,
        sink: &mut K,
    ) -> CycleReport
    where
        S: ParticulateSource,
        E: EnvironmentSensor,
        I: StatusIndicator,
        K: TelemetrySink,
    {
        let sample = self.poll_sampling(now, source);
        if let Some(SampleOutcome::Escalate(_)) = sample {
            return CycleReport {
                sample,
                upload: None,
            };
        }
        let upload = self.poll_upload(now, source, environment, indicator, sink);
        CycleReport { sample, upload }
    }
}
