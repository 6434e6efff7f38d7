//! Cloud write client

use super::line_protocol::TelemetryTags;
use super::sample::TelemetrySample;

/// Destination for telemetry samples
///
/// Fire-and-forget: a failed send is not retried and nothing is queued.
pub trait TelemetrySink {
    type Error;

    fn send(&mut self, sample: &TelemetrySample, tags: &TelemetryTags) -> Result<(), Self::Error>;
}

impl<T: TelemetrySink + ?Sized> TelemetrySink for &mut T {
    type Error = T::Error;

    fn send(&mut self, sample: &TelemetrySample, tags: &TelemetryTags) -> Result<(), Self::Error> {
        (**self).send(sample, tags)
    }
}
