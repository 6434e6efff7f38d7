//! Network link control

/// Network status provider with session control
///
/// Credentials are stored by the implementation; `reconnect` reuses them.
pub trait NetworkLink {
    /// Whether the link is currently up and configured
    fn is_connected(&mut self) -> bool;

    /// Drop the current network session
    fn disconnect(&mut self);

    /// Start a new session with the stored credentials
    ///
    /// Returns once the request is issued, not once the link is up.
    fn reconnect(&mut self);
}
