//! Platform-agnostic core logic for the NebuleAir air-quality node
//!
//! This crate contains everything that can run without hardware: the
//! NextPM particulate protocol, the sampling policy, the connectivity
//! monitor, the telemetry cadence and its InfluxDB line encoding. Boards
//! plug in through the traits in `hal-abstractions`.

#![no_std]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod config;
pub mod network;
pub mod node;
pub mod sensors;
pub mod serial;
pub mod telemetry;

#[cfg(test)]
mod testing;

pub use config::NodeConfig;
pub use node::{Control, Node, NodeParts, RestartReason};
