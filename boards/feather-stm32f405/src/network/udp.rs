#![deny(unsafe_code)]
//! One-shot UDP datagrams

use defmt::{debug, warn};
use embassy_net::udp::{PacketMetadata, UdpSocket};
use embassy_net::{IpEndpoint, Stack};

/// UDP socket error types
#[derive(Debug, Clone, Copy, defmt::Format)]
pub enum UdpError {
    /// Failed to bind socket to local port
    BindFailed,
    /// Failed to send data
    SendFailed,
}

/// Send one datagram to `endpoint` from an ephemeral port
pub async fn send_to(stack: &Stack<'_>, data: &[u8], endpoint: IpEndpoint) -> Result<(), UdpError> {
    debug!("Sending {} bytes to UDP {:?}", data.len(), endpoint);
    let mut rx_meta = [PacketMetadata::EMPTY; 1];
    let mut rx_buffer = [0u8; 16];
    let mut tx_meta = [PacketMetadata::EMPTY; 1];
    let mut tx_buffer = [0u8; 512];

    let mut socket = UdpSocket::new(
        *stack,
        &mut rx_meta,
        &mut rx_buffer,
        &mut tx_meta,
        &mut tx_buffer,
    );

    socket.bind(0).map_err(|e| {
        warn!("UDP bind failed: {:?}", e);
        UdpError::BindFailed
    })?;

    socket.send_to(data, endpoint).await.map_err(|e| {
        warn!("UDP send failed: {:?}", e);
        UdpError::SendFailed
    })?;

    // Let the datagram leave before the socket is dropped
    socket.flush().await;
    Ok(())
}
