//! Connectivity monitor
//!
//! Evaluated once per scheduler tick. While the link is down it retries
//! at most once per retry interval, dropping the session, letting the
//! radio settle and reconnecting with stored credentials. If the outage
//! outlasts the outage limit it asks for a restart, once, and then stays
//! terminal until the supervisor acts on it.

use embedded_hal::delay::DelayNs;
use hal_abstractions::{Duration, Instant, NetworkIndicator, NetworkLink, StatusIndicator};

/// Monitor thresholds
#[derive(Debug, Clone, Copy)]
pub struct MonitorConfig {
    /// Minimum time between two reconnection attempts
    pub retry_interval: Duration,
    /// Pause between dropping the session and reconnecting
    pub settle_delay_ms: u32,
    /// Continuous outage after which a restart is requested
    pub outage_limit: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            retry_interval: Duration::millis(10_000),
            settle_delay_ms: 300,
            outage_limit: Duration::millis(300_000),
        }
    }
}

/// Link state as seen by the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    Connected,
    Disconnected,
}

/// Monitor memory between ticks
///
/// `disconnected_since` is set once when an outage starts and cleared
/// exactly when the link comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectivityState {
    pub link: LinkState,
    pub last_reconnect_attempt: Option<Instant>,
    pub disconnected_since: Option<Instant>,
    pub escalated: bool,
}

impl Default for ConnectivityState {
    fn default() -> Self {
        Self {
            link: LinkState::Connected,
            last_reconnect_attempt: None,
            disconnected_since: None,
            escalated: false,
        }
    }
}

/// What a tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MonitorAction {
    /// Link up and already known to be up, or monitor is terminal
    Idle,
    /// Link came back this tick
    Restored,
    /// Link down, retry interval not yet elapsed
    Waiting,
    /// Link down, a reconnection attempt was issued
    Reconnecting,
    /// Outage limit exceeded; restart requested
    Escalate,
}

fn elapsed(now: Instant, since: Instant) -> Duration {
    now.checked_duration_since(since)
        .unwrap_or(Duration::from_ticks(0))
}

/// Tracks link availability and drives recovery
#[derive(Debug, Clone, Default)]
pub struct ConnectivityMonitor {
    state: ConnectivityState,
    config: MonitorConfig,
}

impl ConnectivityMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            state: ConnectivityState::default(),
            config,
        }
    }

    pub fn state(&self) -> &ConnectivityState {
        &self.state
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Run one monitoring step at `now`
    pub fn poll<L, I, D>(
        &mut self,
        now: Instant,
        link: &mut L,
        indicator: &mut I,
        delay: &mut D,
    ) -> MonitorAction
    where
        L: NetworkLink,
        I: StatusIndicator,
        D: DelayNs,
    {
        if self.state.escalated {
            return MonitorAction::Idle;
        }

        if link.is_connected() {
            if self.state.link == LinkState::Connected {
                return MonitorAction::Idle;
            }
            let outage = self
                .state
                .disconnected_since
                .map(|since| elapsed(now, since).to_millis())
                .unwrap_or(0);
            info!("Network restored after {} ms", outage);
            self.state.link = LinkState::Connected;
            self.state.disconnected_since = None;
            return MonitorAction::Restored;
        }

        if self.state.link == LinkState::Connected {
            warn!("Network lost");
            self.state.link = LinkState::Disconnected;
        }
        let since = *self.state.disconnected_since.get_or_insert(now);

        if elapsed(now, since) > self.config.outage_limit {
            error!(
                "Network down for {} ms, requesting restart",
                elapsed(now, since).to_millis()
            );
            self.state.escalated = true;
            return MonitorAction::Escalate;
        }

        if let Some(last) = self.state.last_reconnect_attempt {
            if elapsed(now, last) < self.config.retry_interval {
                return MonitorAction::Waiting;
            }
        }

        self.state.last_reconnect_attempt = Some(now);
        info!("Reconnecting to network");
        indicator.show_network(NetworkIndicator::Reconnecting);
        link.disconnect();
        delay.delay_ms(self.config.settle_delay_ms);
        link.reconnect();
        MonitorAction::Reconnecting
    }
}
