//! Particulate decoder error types

/// Reasons a single sampling attempt produced no reading
///
/// None of these are fatal: the sampler turns every one of them into an
/// invalid-reading flag and carries on with the previous values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Nothing arrived within the response timeout
    NoResponse,
    /// Stream ran dry before the frame header showed up
    FramingError,
    /// Header found but the rest of the frame was cut short
    TruncatedFrame,
    /// Frame bytes do not sum to zero modulo 256
    ChecksumMismatch,
    /// The serial port reported a transport error
    Io,
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NoResponse => write!(f, "No response from sensor"),
            Self::FramingError => write!(f, "Frame header not found"),
            Self::TruncatedFrame => write!(f, "Truncated frame"),
            Self::ChecksumMismatch => write!(f, "Checksum mismatch"),
            Self::Io => write!(f, "Serial I/O error"),
        }
    }
}

impl core::error::Error for DecodeError {}
