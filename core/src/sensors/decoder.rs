//! NextPM request/response exchange
//!
//! One attempt writes the concentration request once, waits for the
//! answer, synchronises on the frame header and validates what follows.
//! There are no retries inside an attempt; the sampling cadence is the
//! retry policy.

use embedded_hal::delay::DelayNs;
use embedded_io::ErrorKind;
use hal_abstractions::{Clock, Duration, SerialPort};

use super::error::DecodeError;
use super::frame::{
    ParticulateFrame, ParticulateReading, CONCENTRATION_REQUEST, FRAME_HEADER, PAYLOAD_LEN,
};
use crate::serial::TimedReader;

/// Decoder timing
#[derive(Debug, Clone, Copy)]
pub struct DecoderConfig {
    /// How long to wait for the first response byte
    pub response_timeout: Duration,
    /// Per-read stream timeout for the header scan and the frame body
    pub read_timeout: Duration,
    /// Pause between polls of the port while waiting
    pub poll_interval_ms: u32,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            response_timeout: Duration::millis(3_000),
            read_timeout: Duration::millis(3_000),
            poll_interval_ms: 10,
        }
    }
}

fn kind_name(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Interrupted => "interrupted",
        ErrorKind::InvalidData => "invalid data",
        ErrorKind::TimedOut => "timed out",
        ErrorKind::Unsupported => "unsupported",
        ErrorKind::OutOfMemory => "out of memory",
        _ => "other",
    }
}

fn io_error<E: embedded_io::Error>(e: E) -> DecodeError {
    debug!("NextPM serial error: {}", kind_name(e.kind()));
    DecodeError::Io
}

/// Reads concentration frames from a NextPM on a serial port
pub struct ParticulateFrameDecoder<P, C, D> {
    reader: TimedReader<P, C, D>,
    config: DecoderConfig,
}

impl<P, C, D> ParticulateFrameDecoder<P, C, D>
where
    P: SerialPort,
    C: Clock,
    D: DelayNs,
{
    pub fn new(port: P, clock: C, delay: D) -> Self {
        Self::with_config(port, clock, delay, DecoderConfig::default())
    }

    pub fn with_config(port: P, clock: C, delay: D, config: DecoderConfig) -> Self {
        Self {
            reader: TimedReader::new(port, clock, delay, config.poll_interval_ms),
            config,
        }
    }

    /// Give back the port, clock and delay
    pub fn release(self) -> (P, C, D) {
        self.reader.release()
    }

    pub fn port_mut(&mut self) -> &mut P {
        self.reader.port_mut()
    }

    /// Run one request/response exchange
    ///
    /// Leftovers from an earlier exchange, such as a response that came in
    /// after its timeout, are discarded before the request goes out.
    pub fn read_concentration(&mut self) -> Result<ParticulateReading, DecodeError> {
        let stale = self.reader.drain().map_err(io_error)?;
        if stale > 0 {
            debug!("NextPM: discarded {} stale bytes", stale);
        }

        self.reader.send(&CONCENTRATION_REQUEST).map_err(io_error)?;

        if !self
            .reader
            .wait_readable(self.config.response_timeout)
            .map_err(io_error)?
        {
            return Err(DecodeError::NoResponse);
        }

        if !self
            .reader
            .find(&FRAME_HEADER, self.config.read_timeout)
            .map_err(io_error)?
        {
            return Err(DecodeError::FramingError);
        }

        let mut state = [0u8; 1];
        let mut payload = [0u8; PAYLOAD_LEN];
        let mut checksum = [0u8; 1];
        for part in [&mut state[..], &mut payload[..], &mut checksum[..]] {
            let n = self
                .reader
                .read_within(part, self.config.read_timeout)
                .map_err(io_error)?;
            if n != part.len() {
                return Err(DecodeError::TruncatedFrame);
            }
        }

        let frame = ParticulateFrame::from_parts(state[0], &payload, checksum[0]);
        debug!("NextPM frame, state {=u8:#x}", frame.state());
        frame.decode()
    }
}
