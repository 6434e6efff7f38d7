//! Hardware abstraction traits for the NebuleAir node
//!
//! This crate defines traits that abstract over the collaborators the
//! node logic talks to. Boards implement them; host tests fake them.

#![no_std]
#![deny(unsafe_code)]

pub mod environment;
pub mod indicator;
pub mod network;
pub mod serial;
pub mod time;

pub use environment::{EnvironmentReading, EnvironmentSensor};
pub use indicator::{NetworkIndicator, SensorIndicator, StatusIndicator};
pub use network::NetworkLink;
pub use serial::SerialPort;
pub use time::{Clock, Duration, Instant};
