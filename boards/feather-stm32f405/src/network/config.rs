#![deny(unsafe_code)]
//! Network configuration structures

use embassy_net::{IpAddress, IpEndpoint};

/// Network stack configuration
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// MAC address for Ethernet
    pub mac_addr: [u8; 6],
    /// Random seed for network stack
    pub seed: u64,
    /// InfluxDB (or Telegraf) UDP line-protocol listener
    pub influx_endpoint: IpEndpoint,
    /// How often the link flag is refreshed while no command is pending
    pub link_poll_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            mac_addr: [0x02, 0x00, 0x00, 0x4e, 0x41, 0x01],
            seed: 0x4e41_5151_u64,
            influx_endpoint: IpEndpoint::new(IpAddress::v4(192, 168, 1, 10), 8089),
            link_poll_ms: 500,
        }
    }
}
