#![deny(unsafe_code)]
//! Network module: W5500 Ethernet with embassy-net
//!
//! The stack is `!Send` and lives inside the network task. Everyone else
//! talks to it through [`NETWORK_CHANNEL`] and reads link state from
//! [`LINK_UP`]:
//! - **`config`**: MAC address, seed and InfluxDB endpoint
//! - **`link`**: `NetworkLink` and `TelemetrySink` handles for the node
//! - **`udp`**: one-shot datagram send

pub mod config;
pub mod link;
pub mod udp;

use core::sync::atomic::{AtomicBool, Ordering};

use defmt::{info, warn};
use embassy_futures::select::{select, Either};
use embassy_net::{ConfigV4, DhcpConfig, Stack};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use embassy_time::Timer;
use nebuleair_core::telemetry::Line;

pub use config::NetworkConfig;
pub use link::{EthLink, UdpSink};

/// Messages that can be sent to the network task
#[derive(Clone, Debug)]
pub enum NetworkMessage {
    /// Drop the current IPv4 configuration
    Disconnect,
    /// Start a fresh DHCP negotiation
    Reconnect,
    /// Send one line-protocol point to InfluxDB
    Publish(Line),
}

/// Channel for sending messages to network task
/// Using CriticalSectionRawMutex makes it safe across all RTIC priorities
pub static NETWORK_CHANNEL: Channel<CriticalSectionRawMutex, NetworkMessage, 8> = Channel::new();

/// Mirrors `Stack::is_config_up`, refreshed by the network task
pub static LINK_UP: AtomicBool = AtomicBool::new(false);

/// Get a sender for the network channel (can be called from any task)
pub fn network_sender() -> Sender<'static, CriticalSectionRawMutex, NetworkMessage, 8> {
    NETWORK_CHANNEL.sender()
}

/// Get a receiver for the network channel (used inside network task)
pub fn network_receiver() -> Receiver<'static, CriticalSectionRawMutex, NetworkMessage, 8> {
    NETWORK_CHANNEL.receiver()
}

pub fn is_link_up() -> bool {
    LINK_UP.load(Ordering::Acquire)
}

fn refresh_link(stack: &Stack<'_>) {
    let up = stack.is_link_up() && stack.is_config_up();
    if LINK_UP.swap(up, Ordering::AcqRel) != up {
        if up {
            log_address(stack);
        } else {
            warn!("Network is DOWN");
        }
    }
}

fn log_address(stack: &Stack<'_>) {
    info!("Network is UP!");
    if let Some(config) = stack.config_v4() {
        let octets = config.address.address().octets();
        info!(
            "IP: {}.{}.{}.{}",
            octets[0], octets[1], octets[2], octets[3]
        );

        if let Some(gateway) = config.gateway {
            let gw_octets = gateway.octets();
            info!(
                "Gateway: {}.{}.{}.{}",
                gw_octets[0], gw_octets[1], gw_octets[2], gw_octets[3]
            );
        }
    }
}

/// Serve node commands and keep [`LINK_UP`] current
pub async fn run_commands(stack: &Stack<'static>, config: &NetworkConfig) -> ! {
    let receiver = network_receiver();

    loop {
        let next = select(receiver.receive(), Timer::after_millis(config.link_poll_ms)).await;
        if let Either::First(msg) = next {
            match msg {
                NetworkMessage::Disconnect => {
                    info!("Dropping network session");
                    stack.set_config_v4(ConfigV4::None);
                }
                NetworkMessage::Reconnect => {
                    info!("Restarting DHCP");
                    stack.set_config_v4(ConfigV4::Dhcp(DhcpConfig::default()));
                }
                NetworkMessage::Publish(line) => {
                    if stack.is_config_up() {
                        // Fire-and-forget: failures are logged by send_to
                        let _ = udp::send_to(stack, line.as_bytes(), config.influx_endpoint).await;
                    } else {
                        warn!("Network down, sample dropped");
                    }
                }
            }
        }
        refresh_link(stack);
    }
}
