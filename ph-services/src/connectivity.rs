//! Connectivity monitor and reachability probe.
//!
//! The connectivity signal is a `watch` channel of "online?" booleans. The
//! monitor is edge-triggered: only an offline -> online transition starts a
//! replay; going offline only publishes the change. The probe is the signal
//! source for a native process, polling a `Reachability` implementation.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use ph_api::Reachability;

use crate::event_bus::{AppEvent, EventBus};
use crate::sync::{ReplayCoordinator, ReplayTrigger};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityState {
    Online,
    Offline,
}

impl ConnectivityState {
    pub fn from_signal(online: bool) -> Self {
        if online {
            Self::Online
        } else {
            Self::Offline
        }
    }

    pub fn is_online(&self) -> bool {
        matches!(self, Self::Online)
    }
}

impl std::fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Online => write!(f, "online"),
            Self::Offline => write!(f, "offline"),
        }
    }
}

pub struct ConnectivityMonitor {
    coordinator: ReplayCoordinator,
    event_bus: EventBus,
    state: ConnectivityState,
}

impl ConnectivityMonitor {
    pub fn new(coordinator: ReplayCoordinator, event_bus: EventBus, initial: bool) -> Self {
        Self {
            coordinator,
            event_bus,
            state: ConnectivityState::from_signal(initial),
        }
    }

    pub fn state(&self) -> ConnectivityState {
        self.state
    }

    /// Apply one signal value. Returns the replay trigger on a transition
    /// to online, `None` otherwise.
    pub fn on_signal(&mut self, online: bool) -> Option<ReplayTrigger> {
        let next = ConnectivityState::from_signal(online);
        if next == self.state {
            return None;
        }

        info!("connectivity changed: {} -> {next}", self.state);
        self.state = next;
        self.event_bus
            .emit(AppEvent::ConnectivityChanged { online: next.is_online() });

        match next {
            ConnectivityState::Online => Some(self.coordinator.trigger("connectivity")),
            ConnectivityState::Offline => None,
        }
    }

    /// Follow the signal until its sender is dropped.
    pub fn spawn(mut self, mut signal: watch::Receiver<bool>) -> JoinHandle<()> {
        self.state = ConnectivityState::from_signal(*signal.borrow_and_update());
        tokio::spawn(async move {
            debug!("connectivity monitor started ({})", self.state);
            while signal.changed().await.is_ok() {
                let online = *signal.borrow_and_update();
                self.on_signal(online);
            }
            debug!("connectivity signal closed, monitor stopped");
        })
    }
}

/// Polls reachability and publishes the result on a watch channel.
pub struct ConnectivityProbe {
    target: Arc<dyn Reachability>,
    interval: Duration,
    sender: watch::Sender<bool>,
}

impl ConnectivityProbe {
    /// Create a probe and the signal it drives, starting at `initial`.
    pub fn new(
        target: Arc<dyn Reachability>,
        interval: Duration,
        initial: bool,
    ) -> (Self, watch::Receiver<bool>) {
        let (sender, receiver) = watch::channel(initial);
        (
            Self {
                target,
                interval,
                sender,
            },
            receiver,
        )
    }

    /// Probe once and publish the result. Unchanged values are not re-sent.
    pub async fn probe_once(&self) -> bool {
        let online = self.target.is_reachable().await;
        self.sender.send_if_modified(|current| {
            if *current != online {
                *current = online;
                true
            } else {
                false
            }
        });
        online
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }

    /// Probe forever at the configured interval.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            loop {
                ticker.tick().await;
                let online = self.probe_once().await;
                debug!("probe: {}", ConnectivityState::from_signal(online));
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Flag(AtomicBool);

    #[async_trait]
    impl Reachability for Flag {
        async fn is_reachable(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn test_state_from_signal() {
        assert!(ConnectivityState::from_signal(true).is_online());
        assert_eq!(ConnectivityState::from_signal(false).to_string(), "offline");
    }

    #[tokio::test]
    async fn test_probe_publishes_changes_only() {
        let flag = Arc::new(Flag(AtomicBool::new(false)));
        let (probe, mut rx) = ConnectivityProbe::new(flag.clone(), Duration::from_secs(60), false);

        assert!(!probe.probe_once().await);
        assert!(!rx.has_changed().unwrap());

        flag.0.store(true, Ordering::SeqCst);
        assert!(probe.probe_once().await);
        assert!(rx.has_changed().unwrap());
        assert!(*rx.borrow_and_update());
    }
}
