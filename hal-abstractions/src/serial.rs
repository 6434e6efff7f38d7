//! Byte-stream serial port

/// Half-duplex byte channel to a UART-attached sensor
///
/// `read_ready` must report whether a `read` would return without
/// blocking, which lets callers enforce their own timeouts.
pub trait SerialPort: embedded_io::Read + embedded_io::Write + embedded_io::ReadReady {}

impl<T> SerialPort for T where T: embedded_io::Read + embedded_io::Write + embedded_io::ReadReady {}
