//! Top-level node context
//!
//! One `poll` is one iteration of the main loop: connectivity monitor,
//! then the telemetry cycle (sampling timer, then upload timer). The node
//! never resets the processor itself; it hands a [`Control::Restart`] to
//! whoever runs the loop.

use embedded_hal::delay::DelayNs;
use hal_abstractions::{
    Clock, EnvironmentSensor, Instant, NetworkIndicator, NetworkLink, StatusIndicator,
};

use crate::config::NodeConfig;
use crate::network::{ConnectivityMonitor, MonitorAction};
use crate::sensors::{ParticulateSource, SampleOutcome};
use crate::telemetry::{TelemetryCycle, TelemetrySink};

/// Why a restart was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RestartReason {
    /// Network down for longer than the outage limit
    ConnectivityLost,
    /// Particulate sensor failed too many times in a row
    SensorUnresponsive,
}

/// What the loop runner should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Control {
    Continue,
    /// Reset the device; all in-memory state is discarded
    Restart(RestartReason),
}

/// Board-provided collaborators
pub struct NodeParts<C, D, L, E, I, K> {
    pub clock: C,
    pub delay: D,
    pub link: L,
    pub environment: E,
    pub indicator: I,
    pub sink: K,
}

pub struct Node<C, D, L, E, I, K, S> {
    parts: NodeParts<C, D, L, E, I, K>,
    source: S,
    monitor: ConnectivityMonitor,
    cycle: TelemetryCycle,
}

impl<C, D, L, E, I, K, S> Node<C, D, L, E, I, K, S>
where
    C: Clock,
    D: DelayNs,
    L: NetworkLink,
    E: EnvironmentSensor,
    I: StatusIndicator,
    K: TelemetrySink,
    S: ParticulateSource,
{
    /// Assemble the node; both cycle timers are phased at boot
    pub fn new(parts: NodeParts<C, D, L, E, I, K>, source: S, config: &NodeConfig) -> Self {
        Self {
            parts,
            source,
            monitor: ConnectivityMonitor::new(config.monitor),
            cycle: TelemetryCycle::new(config.cycle, config.tags, Instant::from_ticks(0)),
        }
    }

    /// Startup success flash, shown once when the link first comes up
    pub fn announce_online(&mut self) {
        info!("Network online");
        self.parts.indicator.show_network(NetworkIndicator::Online);
    }

    /// Run one loop iteration
    pub fn poll(&mut self) -> Control {
        let NodeParts {
            clock,
            delay,
            link,
            environment,
            indicator,
            sink,
        } = &mut self.parts;

        if self.monitor.poll(clock.now(), link, indicator, delay) == MonitorAction::Escalate {
            return Control::Restart(RestartReason::ConnectivityLost);
        }

        let report = self
            .cycle
            .poll(clock.now(), &mut self.source, environment, indicator, sink);
        match report.sample {
            Some(SampleOutcome::Escalate(_)) => Control::Restart(RestartReason::SensorUnresponsive),
            _ => Control::Continue,
        }
    }

    pub fn monitor(&self) -> &ConnectivityMonitor {
        &self.monitor
    }

    pub fn cycle(&self) -> &TelemetryCycle {
        &self.cycle
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn parts(&self) -> &NodeParts<C, D, L, E, I, K> {
        &self.parts
    }

    pub fn parts_mut(&mut self) -> &mut NodeParts<C, D, L, E, I, K> {
        &mut self.parts
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::sensors::{DecodeError, SamplerConfig};
    use crate::serial::testing::{FakeClock, FakeDelay};
    use crate::testing::{FakeLink, FixedEnvironment, Leds, RecordingSink, ScriptedSource};
    use hal_abstractions::SensorIndicator;

    type TestNode =
        Node<FakeClock, FakeDelay, FakeLink, FixedEnvironment, Leds, RecordingSink, ScriptedSource>;

    fn node(clock: &FakeClock, source: ScriptedSource) -> TestNode {
        let parts = NodeParts {
            clock: clock.clone(),
            delay: FakeDelay(clock.clone()),
            link: FakeLink::up(),
            environment: FixedEnvironment::default(),
            indicator: Leds::default(),
            sink: RecordingSink::default(),
        };
        Node::new(parts, source, &NodeConfig::default())
    }

    /// Poll every `step` ms until `until`, collecting restart requests
    fn run(node: &mut TestNode, clock: &FakeClock, until: u64, step: u64) -> usize {
        let mut restarts = 0;
        while clock.ms() < until {
            if let Control::Restart(_) = node.poll() {
                restarts += 1;
            }
            clock.advance(step);
        }
        restarts
    }

    #[test]
    fn test_steady_state() {
        let clock = FakeClock::at(15_000);
        let source = ScriptedSource::default()
            .then_ok(5.0, 10.0, 15.0)
            .then_ok(6.0, 11.0, 16.0);
        let mut n = node(&clock, source);
        n.announce_online();

        // Past boot + one interval: both timers fire on the first poll
        assert_eq!(n.poll(), Control::Continue);
        assert_eq!(n.source().calls, 1);
        assert_eq!(n.parts().sink.sent.len(), 1);
        assert_eq!(n.parts().sink.sent[0].pm10, 15.0);

        assert_eq!(run(&mut n, &clock, 35_001, 50), 0);
        assert_eq!(n.source().calls, 3);
        assert_eq!(n.parts().sink.sent.len(), 3);
        assert_eq!(n.parts().indicator.network, [NetworkIndicator::Online]);
        assert_eq!(
            n.parts().indicator.sensor,
            [SensorIndicator::Ok, SensorIndicator::Ok, SensorIndicator::Fault]
        );
        assert!(n.parts().link.calls.is_empty());
    }

    #[test]
    fn test_sampling_continues_while_disconnected() {
        let clock = FakeClock::at(15_000);
        let mut n = node(&clock, ScriptedSource::default());
        n.parts_mut().link.up = false;

        run(&mut n, &clock, 60_000, 1_000);
        assert!(n.source().calls >= 4);
        assert!(n.parts().link.reconnects() >= 4);
        assert!(!n.parts().sink.sent.is_empty());
    }

    #[test]
    fn test_connectivity_escalation() {
        let clock = FakeClock::at(15_000);
        let mut n = node(&clock, ScriptedSource::default());
        n.parts_mut().link.up = false;

        let mut reasons = std::vec::Vec::new();
        while clock.ms() < 15_000 + 400_000 {
            if let Control::Restart(reason) = n.poll() {
                reasons.push(reason);
            }
            clock.advance(1_000);
        }
        assert_eq!(reasons, [RestartReason::ConnectivityLost]);
    }

    #[test]
    fn test_sensor_escalation_when_enabled() {
        let clock = FakeClock::at(15_000);
        let source = ScriptedSource {
            escalate: true,
            ..ScriptedSource::default().then_err(DecodeError::FramingError)
        };
        let mut n = node(&clock, source);
        assert_eq!(n.poll(), Control::Restart(RestartReason::SensorUnresponsive));
        // No upload after a restart request
        assert!(n.parts().sink.sent.is_empty());
    }

    #[test]
    fn test_default_sampler_never_restarts() {
        assert_eq!(SamplerConfig::default().escalate_after, None);
        let clock = FakeClock::at(15_000);
        let mut n = node(&clock, ScriptedSource::default());
        assert_eq!(run(&mut n, &clock, 15_000 + 600_000, 5_000), 0);
        assert!(n.source().calls > 50);
    }
}
