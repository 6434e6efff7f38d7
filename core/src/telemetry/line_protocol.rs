//! InfluxDB line protocol encoding
//!
//! ```text
//! nebuleair,device=NebuleAir,location=exterieur temperature=21.5,pression=1013.2,...
//! ```
//!
//! No timestamp is written; the server stamps the point on arrival.
//! Line protocol has no representation for NaN or infinities, so such
//! fields are left out of the line.

use core::fmt::Write;

use heapless::String;

use super::sample::TelemetrySample;

/// Capacity of an encoded line
pub const LINE_CAPACITY: usize = 256;

/// One encoded point
pub type Line = String<LINE_CAPACITY>;

/// Encoding failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// Line does not fit the output buffer
    Overflow,
    /// Every field was non-finite
    NoFields,
}

impl core::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Overflow => write!(f, "Line buffer overflow"),
            Self::NoFields => write!(f, "No finite field to encode"),
        }
    }
}

impl core::error::Error for EncodeError {}

/// Measurement name and tag set attached to every point
#[derive(Debug, Clone, Copy)]
pub struct TelemetryTags {
    pub measurement: &'static str,
    /// `(key, value)` pairs, written in order
    pub tags: &'static [(&'static str, &'static str)],
}

impl Default for TelemetryTags {
    fn default() -> Self {
        Self {
            measurement: "nebuleair",
            tags: &[("device", "NebuleAir"), ("location", "exterieur")],
        }
    }
}

fn push_escaped<const N: usize>(
    out: &mut String<N>,
    s: &str,
    special: &[char],
) -> Result<(), EncodeError> {
    for c in s.chars() {
        if special.contains(&c) {
            out.push('\\').map_err(|_| EncodeError::Overflow)?;
        }
        out.push(c).map_err(|_| EncodeError::Overflow)?;
    }
    Ok(())
}

const MEASUREMENT_SPECIAL: &[char] = &[',', ' '];
const TAG_SPECIAL: &[char] = &[',', '=', ' '];

/// Field keys in upload order, as the dashboards expect them
fn fields(sample: &TelemetrySample) -> [(&'static str, f32); 6] {
    [
        ("temperature", sample.temperature_c),
        ("pression", sample.pressure_hpa),
        ("humidite", sample.humidity_pct),
        ("pm1", sample.pm1),
        ("pm25", sample.pm2_5),
        ("pm10", sample.pm10),
    ]
}

/// Encode `sample` into `out`, replacing its contents
pub fn encode_into<const N: usize>(
    sample: &TelemetrySample,
    tags: &TelemetryTags,
    out: &mut String<N>,
) -> Result<(), EncodeError> {
    out.clear();
    push_escaped(out, tags.measurement, MEASUREMENT_SPECIAL)?;
    for (key, value) in tags.tags {
        out.push(',').map_err(|_| EncodeError::Overflow)?;
        push_escaped(out, key, TAG_SPECIAL)?;
        out.push('=').map_err(|_| EncodeError::Overflow)?;
        push_escaped(out, value, TAG_SPECIAL)?;
    }

    let mut written = 0usize;
    for (key, value) in fields(sample) {
        if !value.is_finite() {
            continue;
        }
        let sep = if written == 0 { ' ' } else { ',' };
        write!(out, "{}{}={}", sep, key, value).map_err(|_| EncodeError::Overflow)?;
        written += 1;
    }

    if written == 0 {
        out.clear();
        return Err(EncodeError::NoFields);
    }
    Ok(())
}

/// Encode `sample` into a fresh [`Line`]
pub fn encode(sample: &TelemetrySample, tags: &TelemetryTags) -> Result<Line, EncodeError> {
    let mut line = Line::new();
    encode_into(sample, tags, &mut line)?;
    Ok(line)
}
