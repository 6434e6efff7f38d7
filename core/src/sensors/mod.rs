//! Particulate sensor: NextPM frame decoding and sampling

pub mod decoder;
pub mod error;
pub mod frame;
pub mod sampler;

pub use decoder::{DecoderConfig, ParticulateFrameDecoder};
pub use error::DecodeError;
pub use frame::{ParticulateFrame, ParticulateReading};
pub use sampler::{
    Freshness, ParticulateSampler, ParticulateSource, SampleOutcome, SamplerConfig, SamplerState,
};
