//! Status LEDs

/// Network status channel commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NetworkIndicator {
    /// Link came up (startup success flash)
    Online,
    /// A reconnection attempt is in progress
    Reconnecting,
}

/// Sensor health channel commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorIndicator {
    /// No valid particulate reading since boot
    Pending,
    /// Last particulate reading was valid
    Ok,
    /// Last particulate reading failed
    Fault,
}

/// Two-channel status indicator sink
pub trait StatusIndicator {
    fn show_network(&mut self, state: NetworkIndicator);

    fn show_sensor(&mut self, state: SensorIndicator);
}
