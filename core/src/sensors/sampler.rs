//! Particulate sampling policy
//!
//! Keeps the last good reading across failed attempts. A failure only
//! clears the validity flag; the numbers stay so telemetry keeps
//! reporting the most recent known concentrations.

use embedded_hal::delay::DelayNs;
use hal_abstractions::{Clock, SerialPort};

use super::decoder::ParticulateFrameDecoder;
use super::error::DecodeError;
use super::frame::ParticulateReading;

/// Sampler failure policy
#[derive(Debug, Clone, Copy)]
pub struct SamplerConfig {
    /// Consecutive failures after which a warning is logged
    pub stale_warning_after: u32,
    /// Consecutive failures after which the node should restart.
    /// `None` keeps reporting stale values forever.
    pub escalate_after: Option<u32>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            stale_warning_after: 6,
            escalate_after: None,
        }
    }
}

/// How current the held reading is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Freshness {
    /// No valid frame since boot; values are the zero defaults
    Never,
    /// Last attempt succeeded
    Fresh,
    /// Last attempt failed; values come from an earlier attempt
    Stale,
}

/// Result of one sampling attempt
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleOutcome {
    Updated(ParticulateReading),
    Failed(DecodeError),
    /// Failed, and the configured failure budget is used up
    Escalate(DecodeError),
}

/// Everything the sampler remembers between attempts
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SamplerState {
    reading: ParticulateReading,
    ever_valid: bool,
    consecutive_failures: u32,
}

impl SamplerState {
    /// Latest reading, possibly stale
    pub fn reading(&self) -> ParticulateReading {
        self.reading
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn freshness(&self) -> Freshness {
        match (self.reading.valid, self.ever_valid) {
            (true, _) => Freshness::Fresh,
            (false, true) => Freshness::Stale,
            (false, false) => Freshness::Never,
        }
    }

    /// Fold one attempt into the state
    pub fn record(
        &mut self,
        result: Result<ParticulateReading, DecodeError>,
        config: &SamplerConfig,
    ) -> SampleOutcome {
        match result {
            Ok(reading) => {
                if self.consecutive_failures > 0 {
                    info!(
                        "NextPM recovered after {} failed attempts",
                        self.consecutive_failures
                    );
                }
                self.reading = ParticulateReading {
                    valid: true,
                    ..reading
                };
                self.ever_valid = true;
                self.consecutive_failures = 0;
                SampleOutcome::Updated(self.reading)
            }
            Err(e) => {
                self.reading.valid = false;
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                debug!("NextPM read failed: {}", e);
                if self.consecutive_failures == config.stale_warning_after {
                    warn!(
                        "NextPM unreadable for {} attempts, reporting stale values",
                        self.consecutive_failures
                    );
                }
                match config.escalate_after {
                    Some(limit) if self.consecutive_failures >= limit => {
                        error!(
                            "NextPM unreadable for {} attempts, escalating",
                            self.consecutive_failures
                        );
                        SampleOutcome::Escalate(e)
                    }
                    _ => SampleOutcome::Failed(e),
                }
            }
        }
    }
}

/// Anything that can be asked for particulate readings
///
/// Lets the telemetry cycle run against a scripted source in tests.
pub trait ParticulateSource {
    /// Make one sampling attempt
    fn sample(&mut self) -> SampleOutcome;

    /// Latest reading, possibly stale
    fn latest(&self) -> ParticulateReading;

    /// Whether the latest reading is fresh, stale or was never taken
    fn freshness(&self) -> Freshness;
}

/// Drives the decoder and owns the last known good reading
pub struct ParticulateSampler<P, C, D> {
    decoder: ParticulateFrameDecoder<P, C, D>,
    state: SamplerState,
    config: SamplerConfig,
}

impl<P, C, D> ParticulateSampler<P, C, D>
where
    P: SerialPort,
    C: Clock,
    D: DelayNs,
{
    pub fn new(decoder: ParticulateFrameDecoder<P, C, D>, config: SamplerConfig) -> Self {
        Self {
            decoder,
            state: SamplerState::default(),
            config,
        }
    }

    pub fn state(&self) -> &SamplerState {
        &self.state
    }

    pub fn decoder_mut(&mut self) -> &mut ParticulateFrameDecoder<P, C, D> {
        &mut self.decoder
    }
}

impl<P, C, D> ParticulateSource for ParticulateSampler<P, C, D>
where
    P: SerialPort,
    C: Clock,
    D: DelayNs,
{
    fn sample(&mut self) -> SampleOutcome {
        let result = self.decoder.read_concentration();
        self.state.record(result, &self.config)
    }

    fn latest(&self) -> ParticulateReading {
        self.state.reading()
    }

    fn freshness(&self) -> Freshness {
        self.state.freshness()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::frame::testing::frame_with;
    use crate::serial::testing::{FakeClock, FakeDelay, ScriptedPort};

    type TestSampler = ParticulateSampler<ScriptedPort, FakeClock, FakeDelay>;

    fn sampler(clock: &FakeClock, config: SamplerConfig) -> TestSampler {
        let port = ScriptedPort::default();
        let decoder = ParticulateFrameDecoder::new(port, clock.clone(), FakeDelay(clock.clone()));
        ParticulateSampler::new(decoder, config)
    }

    fn queue_frame(s: &mut TestSampler, pm1: u16, pm2_5: u16, pm10: u16) {
        s.decoder_mut()
            .port_mut()
            .respond_with(&frame_with(pm1, pm2_5, pm10));
    }

    #[test]
    fn test_never_sampled() {
        let clock = FakeClock::at(0);
        let s = sampler(&clock, SamplerConfig::default());
        assert_eq!(s.freshness(), Freshness::Never);
        assert!(!s.latest().valid);
        assert_eq!(s.latest().pm2_5, 0.0);
    }

    #[test]
    fn test_timeout_keeps_previous_values() {
        let clock = FakeClock::at(0);
        let mut s = sampler(&clock, SamplerConfig::default());
        queue_frame(&mut s, 50, 100, 150);
        assert!(matches!(s.sample(), SampleOutcome::Updated(_)));
        assert_eq!(s.state().freshness(), Freshness::Fresh);

        // Nothing queued: sensor stays silent past the 3 s timeout
        let before = clock.ms();
        assert_eq!(s.sample(), SampleOutcome::Failed(DecodeError::NoResponse));
        assert!(clock.ms() - before >= 3_000);

        let latest = s.latest();
        assert!(!latest.valid);
        assert_eq!((latest.pm1, latest.pm2_5, latest.pm10), (5.0, 10.0, 15.0));
        assert_eq!(s.freshness(), Freshness::Stale);
        assert_eq!(s.state().consecutive_failures(), 1);
    }

    #[test]
    fn test_recovery_overwrites_and_resets() {
        let clock = FakeClock::at(0);
        let mut s = sampler(&clock, SamplerConfig::default());
        s.sample();
        s.sample();
        assert_eq!(s.state().consecutive_failures(), 2);

        queue_frame(&mut s, 12, 34, 56);
        assert!(matches!(s.sample(), SampleOutcome::Updated(_)));
        assert_eq!(s.state().consecutive_failures(), 0);
        assert_eq!(s.latest().pm10, 5.6);
        assert!(s.latest().valid);
    }

    #[test]
    fn test_no_escalation_by_default() {
        let mut state = SamplerState::default();
        let config = SamplerConfig::default();
        for _ in 0..1_000 {
            assert_eq!(
                state.record(Err(DecodeError::ChecksumMismatch), &config),
                SampleOutcome::Failed(DecodeError::ChecksumMismatch)
            );
        }
    }

    #[test]
    fn test_escalation_when_configured() {
        let mut state = SamplerState::default();
        let config = SamplerConfig {
            escalate_after: Some(3),
            ..SamplerConfig::default()
        };
        for _ in 0..2 {
            assert_eq!(
                state.record(Err(DecodeError::NoResponse), &config),
                SampleOutcome::Failed(DecodeError::NoResponse)
            );
        }
        assert_eq!(
            state.record(Err(DecodeError::NoResponse), &config),
            SampleOutcome::Escalate(DecodeError::NoResponse)
        );
    }
}
