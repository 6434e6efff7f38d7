//! Network availability tracking and recovery

pub mod monitor;

pub use monitor::{
    ConnectivityMonitor, ConnectivityState, LinkState, MonitorAction, MonitorConfig,
};
