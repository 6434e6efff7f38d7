#![deny(unsafe_code)]
//! Node-side handles onto the network task

use core::sync::atomic::Ordering;

use defmt::warn;
use hal_abstractions::NetworkLink;
use nebuleair_core::telemetry::{encode, EncodeError, TelemetrySample, TelemetrySink, TelemetryTags};

use super::{is_link_up, network_sender, NetworkMessage, LINK_UP};

/// Link control backed by the network task
pub struct EthLink;

impl NetworkLink for EthLink {
    fn is_connected(&mut self) -> bool {
        is_link_up()
    }

    fn disconnect(&mut self) {
        LINK_UP.store(false, Ordering::Release);
        if network_sender().try_send(NetworkMessage::Disconnect).is_err() {
            warn!("Network queue full, disconnect not sent");
        }
    }

    fn reconnect(&mut self) {
        if network_sender().try_send(NetworkMessage::Reconnect).is_err() {
            warn!("Network queue full, reconnect not sent");
        }
    }
}

#[derive(Debug, Clone, Copy, defmt::Format)]
pub enum PublishError {
    Encode(EncodeError),
    QueueFull,
}

/// Encodes samples as line protocol and queues them for UDP
pub struct UdpSink;

impl TelemetrySink for UdpSink {
    type Error = PublishError;

    fn send(&mut self, sample: &TelemetrySample, tags: &TelemetryTags) -> Result<(), PublishError> {
        let line = encode(sample, tags).map_err(PublishError::Encode)?;
        network_sender()
            .try_send(NetworkMessage::Publish(line))
            .map_err(|_| PublishError::QueueFull)
    }
}
