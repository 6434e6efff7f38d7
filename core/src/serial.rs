//! Timeout-bounded reads over a serial port
//!
//! Every read call computes its deadline once from the injected clock and
//! checks it on each poll iteration, pausing between polls with the
//! injected delay. Nothing here sleeps on wall-clock time directly, so a
//! fake clock and delay make timeouts deterministic in tests.

use embedded_hal::delay::DelayNs;
use hal_abstractions::{Clock, Duration, Instant, SerialPort};

/// Point in time after which a read gives up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline(Instant);

impl Deadline {
    /// Deadline `timeout` after `now`
    pub fn after(now: Instant, timeout: Duration) -> Self {
        Self(
            now.checked_add_duration(timeout)
                .unwrap_or(Instant::from_ticks(u64::MAX)),
        )
    }

    pub fn has_passed(&self, now: Instant) -> bool {
        now.ticks() >= self.0.ticks()
    }
}

/// Serial port wrapper with deadline-bounded reads
pub struct TimedReader<P, C, D> {
    port: P,
    clock: C,
    delay: D,
    poll_interval_ms: u32,
}

impl<P, C, D> TimedReader<P, C, D>
where
    P: SerialPort,
    C: Clock,
    D: DelayNs,
{
    pub fn new(port: P, clock: C, delay: D, poll_interval_ms: u32) -> Self {
        Self {
            port,
            clock,
            delay,
            poll_interval_ms,
        }
    }

    /// Give back the wrapped parts
    pub fn release(self) -> (P, C, D) {
        (self.port, self.clock, self.delay)
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// Write the whole buffer and flush it out
    pub fn send(&mut self, bytes: &[u8]) -> Result<(), P::Error> {
        self.port.write_all(bytes)?;
        self.port.flush()
    }

    /// Wait until at least one byte can be read
    ///
    /// Returns `Ok(false)` if nothing arrived before `timeout`.
    pub fn wait_readable(&mut self, timeout: Duration) -> Result<bool, P::Error> {
        let deadline = Deadline::after(self.clock.now(), timeout);
        loop {
            if self.port.read_ready()? {
                return Ok(true);
            }
            if deadline.has_passed(self.clock.now()) {
                return Ok(false);
            }
            self.delay.delay_ms(self.poll_interval_ms);
        }
    }

    /// Read one byte before `deadline`
    ///
    /// `Ok(None)` means the stream is exhausted: the deadline passed or the
    /// port reported end of stream.
    pub fn read_byte(&mut self, deadline: Deadline) -> Result<Option<u8>, P::Error> {
        loop {
            if self.port.read_ready()? {
                let mut byte = [0u8; 1];
                return match self.port.read(&mut byte)? {
                    0 => Ok(None),
                    _ => Ok(Some(byte[0])),
                };
            }
            if deadline.has_passed(self.clock.now()) {
                return Ok(None);
            }
            self.delay.delay_ms(self.poll_interval_ms);
        }
    }

    /// Discard whatever the port already holds
    ///
    /// Returns how many bytes were thrown away. Stops at end of stream.
    pub fn drain(&mut self) -> Result<usize, P::Error> {
        let mut scratch = [0u8; 16];
        let mut dropped = 0;
        while self.port.read_ready()? {
            match self.port.read(&mut scratch)? {
                0 => break,
                n => dropped += n,
            }
        }
        Ok(dropped)
    }

    /// Consume input until `pattern` has been read
    ///
    /// Returns `Ok(true)` with the stream positioned right after the
    /// pattern, or `Ok(false)` if the stream ran dry within `timeout`.
    pub fn find<const N: usize>(
        &mut self,
        pattern: &[u8; N],
        timeout: Duration,
    ) -> Result<bool, P::Error> {
        let deadline = Deadline::after(self.clock.now(), timeout);
        let mut window = [0u8; N];
        let mut seen = 0usize;
        while let Some(byte) = self.read_byte(deadline)? {
            if N == 0 {
                return Ok(true);
            }
            window.copy_within(1.., 0);
            window[N - 1] = byte;
            seen = seen.saturating_add(1);
            if seen >= N && window == *pattern {
                return Ok(true);
            }
        }
        Ok(N == 0)
    }

    /// Fill `buf` before `timeout` runs out
    ///
    /// Returns how many bytes were read; fewer than `buf.len()` means the
    /// stream ran dry.
    pub fn read_within(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, P::Error> {
        let deadline = Deadline::after(self.clock.now(), timeout);
        let mut filled = 0;
        while filled < buf.len() {
            match self.read_byte(deadline)? {
                Some(byte) => {
                    buf[filled] = byte;
                    filled += 1;
                }
                None => break,
            }
        }
        Ok(filled)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{FakeClock, FakeDelay, ScriptedPort};
    use super::*;
    use fugit::ExtU64;

    fn reader(
        port: ScriptedPort,
        clock: &FakeClock,
    ) -> TimedReader<ScriptedPort, FakeClock, FakeDelay> {
        TimedReader::new(port, clock.clone(), FakeDelay(clock.clone()), 10)
    }

    #[test]
    fn test_wait_readable_times_out() {
        let clock = FakeClock::at(1_000);
        let mut r = reader(ScriptedPort::default(), &clock);
        assert_eq!(r.wait_readable(3_000.millis()), Ok(false));
        assert!(clock.ms() >= 4_000);
        // Bounded by one poll interval past the deadline
        assert!(clock.ms() <= 4_010);
    }

    #[test]
    fn test_wait_readable_with_data() {
        let clock = FakeClock::at(0);
        let mut port = ScriptedPort::default();
        port.preload(&[0x42]);
        let mut r = reader(port, &clock);
        assert_eq!(r.wait_readable(3_000.millis()), Ok(true));
        assert_eq!(clock.ms(), 0);
    }

    #[test]
    fn test_find_skips_garbage() {
        let clock = FakeClock::at(0);
        let mut port = ScriptedPort::default();
        port.preload(&[0x00, 0x81, 0x81, 0x12, 0x07]);
        let mut r = reader(port, &clock);
        assert_eq!(r.find(&[0x81, 0x12], 3_000.millis()), Ok(true));
        assert_eq!(r.read_byte(Deadline::after(clock.now(), 10.millis())), Ok(Some(0x07)));
    }

    #[test]
    fn test_find_exhausted() {
        let clock = FakeClock::at(0);
        let mut port = ScriptedPort::default();
        port.preload(&[0x12, 0x81]);
        let mut r = reader(port, &clock);
        assert_eq!(r.find(&[0x81, 0x12], 3_000.millis()), Ok(false));
    }

    #[test]
    fn test_read_within_short() {
        let clock = FakeClock::at(0);
        let mut port = ScriptedPort::default();
        port.preload(&[1, 2, 3]);
        let mut r = reader(port, &clock);
        let mut buf = [0u8; 5];
        assert_eq!(r.read_within(&mut buf, 3_000.millis()), Ok(3));
        assert_eq!(&buf[..3], &[1, 2, 3]);
    }

    #[test]
    fn test_find_at_end_of_stream() {
        let clock = FakeClock::at(0);
        let mut port = ScriptedPort::default();
        port.preload(&[0x00, 0x81]);
        port.eof = true;
        let mut r = reader(port, &clock);
        assert_eq!(r.find(&[0x81, 0x12], 3_000.millis()), Ok(false));
        // End of stream is immediate, not a timeout
        assert_eq!(clock.ms(), 0);
    }

    #[test]
    fn test_read_within_at_end_of_stream() {
        let clock = FakeClock::at(0);
        let mut port = ScriptedPort::default();
        port.preload(&[1, 2]);
        port.eof = true;
        let mut r = reader(port, &clock);
        let mut buf = [0u8; 4];
        assert_eq!(r.read_within(&mut buf, 3_000.millis()), Ok(2));
        assert_eq!(&buf[..2], &[1, 2]);
        assert_eq!(clock.ms(), 0);
        assert_eq!(r.read_byte(Deadline::after(clock.now(), 10.millis())), Ok(None));
    }

    #[test]
    fn test_drain() {
        let clock = FakeClock::at(0);
        let mut port = ScriptedPort::default();
        port.preload(&[0u8; 40]);
        let mut r = reader(port, &clock);
        assert_eq!(r.drain(), Ok(40));
        assert_eq!(r.drain(), Ok(0));
        assert_eq!(r.wait_readable(100.millis()), Ok(false));
    }

    #[test]
    fn test_drain_stops_at_end_of_stream() {
        let clock = FakeClock::at(0);
        let mut port = ScriptedPort::default();
        port.preload(&[7, 7, 7]);
        port.eof = true;
        let mut r = reader(port, &clock);
        assert_eq!(r.drain(), Ok(3));
    }

    #[test]
    fn test_deadline_saturates() {
        let d = Deadline::after(Instant::from_ticks(u64::MAX - 5), 100.millis());
        assert!(!d.has_passed(Instant::from_ticks(u64::MAX - 1)));
        assert!(d.has_passed(Instant::from_ticks(u64::MAX)));
    }
}
