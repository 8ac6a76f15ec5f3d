//! Connectivity state machine and probe loop.

use std::fmt;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::config::ConnectivityConfig;
use super::probe::LivenessProbe;

/// Capacity of the status-change broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Capacity of the command channel feeding the monitor loop.
const COMMAND_CHANNEL_CAPACITY: usize = 8;

/// Backend reachability as the monitor currently understands it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectivityStatus {
    /// No probe has completed yet.
    #[default]
    Unknown,
    /// A probe cycle is in progress.
    Checking,
    /// The last probe succeeded.
    Connected,
    /// Probes are failing but retries remain in the current burst.
    Limited,
    /// The retry burst was exhausted without a success.
    Disconnected,
}

impl fmt::Display for ConnectivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectivityStatus::Unknown => "unknown",
            ConnectivityStatus::Checking => "checking",
            ConnectivityStatus::Connected => "connected",
            ConnectivityStatus::Limited => "limited",
            ConnectivityStatus::Disconnected => "disconnected",
        };
        f.write_str(s)
    }
}

/// A state transition published to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub from: ConnectivityStatus,
    pub to: ConnectivityStatus,
}

/// Commands from handles to the monitor loop.
#[derive(Debug)]
enum Command {
    /// Run an out-of-band probe cycle now.
    Probe,
    /// Environment reports the network came back.
    Online,
    /// Environment reports the network went away.
    Offline,
}

/// What the main loop decided to do after waiting.
enum Step {
    Shutdown,
    Tick,
    Command(Command),
}

/// Periodic liveness monitor over an injected probe.
///
/// Construct, then call [`ConnectivityMonitor::start`] to spawn the
/// probe loop. Status is published through a `watch` channel (for
/// synchronous reads) and transitions through a `broadcast` channel
/// (for subscribers); a slow or dropped subscriber can never break the
/// monitor's own loop.
pub struct ConnectivityMonitor<P> {
    probe: P,
    config: ConnectivityConfig,
    status_tx: watch::Sender<ConnectivityStatus>,
    events: broadcast::Sender<StatusChange>,
    cancel: CancellationToken,
}

impl<P: LivenessProbe + 'static> ConnectivityMonitor<P> {
    pub fn new(probe: P, config: ConnectivityConfig) -> Self {
        let (status_tx, _) = watch::channel(ConnectivityStatus::Unknown);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            probe,
            config,
            status_tx,
            events,
            cancel: CancellationToken::new(),
        }
    }

    /// Spawn the probe loop and return a handle to it.
    pub fn start(self) -> ConnectivityHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let handle = ConnectivityHandle {
            status_rx: self.status_tx.subscribe(),
            events: self.events.clone(),
            cmd_tx,
            cancel: self.cancel.clone(),
            task: None,
        };
        let task = tokio::spawn(self.run(cmd_rx));

        ConnectivityHandle {
            task: Some(task),
            ..handle
        }
    }

    async fn run(self, mut cmd_rx: mpsc::Receiver<Command>) {
        tracing::info!(
            probe_interval_secs = self.config.probe_interval.as_secs(),
            max_retries = self.config.max_retries,
            "connectivity monitor started"
        );

        let mut interval = tokio::time::interval(self.config.probe_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut suspended = false;

        loop {
            let step = tokio::select! {
                _ = self.cancel.cancelled() => Step::Shutdown,
                cmd = cmd_rx.recv() => match cmd {
                    Some(cmd) => Step::Command(cmd),
                    // All handles are gone; the session is over.
                    None => Step::Shutdown,
                },
                _ = interval.tick(), if !suspended => Step::Tick,
            };

            match step {
                Step::Shutdown => break,
                Step::Tick => self.probe_cycle(&mut cmd_rx, &mut suspended).await,
                Step::Command(Command::Probe) => {
                    // Out-of-band probe; the periodic interval is left
                    // untouched so the regular schedule is undisturbed.
                    self.probe_cycle(&mut cmd_rx, &mut suspended).await;
                }
                Step::Command(Command::Offline) => {
                    tracing::info!("offline signal received; suspending probes");
                    suspended = true;
                    self.transition(ConnectivityStatus::Disconnected);
                }
                Step::Command(Command::Online) => {
                    tracing::info!("online signal received; probing now");
                    suspended = false;
                    interval.reset();
                    self.probe_cycle(&mut cmd_rx, &mut suspended).await;
                }
            }
        }

        tracing::info!("connectivity monitor stopped");
    }

    /// One probe cycle: an initial probe followed by a bounded retry
    /// burst. Environment signals pre-empt the burst.
    async fn probe_cycle(&self, cmd_rx: &mut mpsc::Receiver<Command>, suspended: &mut bool) {
        self.transition(ConnectivityStatus::Checking);
        let mut retries: u32 = 0;

        loop {
            let result = self.probe.check().await;
            if self.cancel.is_cancelled() {
                return;
            }

            let error = match result {
                Ok(()) => {
                    self.transition(ConnectivityStatus::Connected);
                    return;
                }
                Err(error) => error,
            };

            retries += 1;
            if retries > self.config.max_retries {
                tracing::warn!(
                    error = %error,
                    retries = retries - 1,
                    "liveness retries exhausted"
                );
                self.transition(ConnectivityStatus::Disconnected);
                return;
            }

            tracing::debug!(
                error = %error,
                retry = retries,
                max_retries = self.config.max_retries,
                "liveness probe failed; retrying"
            );
            self.transition(ConnectivityStatus::Limited);

            // Wait out the retry delay, but let shutdown and
            // environment signals cut it short.
            let deadline = tokio::time::sleep(self.config.retry_delay);
            tokio::pin!(deadline);
            loop {
                let step = tokio::select! {
                    _ = self.cancel.cancelled() => Step::Shutdown,
                    _ = &mut deadline => Step::Tick,
                    cmd = cmd_rx.recv() => match cmd {
                        Some(cmd) => Step::Command(cmd),
                        None => Step::Shutdown,
                    },
                };
                match step {
                    Step::Shutdown => return,
                    Step::Tick => break,
                    Step::Command(Command::Offline) => {
                        tracing::info!("offline signal received; abandoning retry burst");
                        *suspended = true;
                        self.transition(ConnectivityStatus::Disconnected);
                        return;
                    }
                    // Online and Probe both mean "probe right now".
                    Step::Command(Command::Online) => {
                        *suspended = false;
                        break;
                    }
                    Step::Command(Command::Probe) => break,
                }
            }
        }
    }

    /// Apply a state transition, publishing it only when the state
    /// actually changes.
    fn transition(&self, to: ConnectivityStatus) {
        let mut from = None;
        self.status_tx.send_if_modified(|current| {
            if *current == to {
                return false;
            }
            from = Some(*current);
            *current = to;
            true
        });

        if let Some(from) = from {
            tracing::debug!(%from, %to, "connectivity status changed");
            let _ = self.events.send(StatusChange { from, to });
        }
    }
}

/// Handle to a running connectivity monitor.
pub struct ConnectivityHandle {
    status_rx: watch::Receiver<ConnectivityStatus>,
    events: broadcast::Sender<StatusChange>,
    cmd_tx: mpsc::Sender<Command>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ConnectivityHandle {
    /// Current status, read synchronously.
    pub fn status(&self) -> ConnectivityStatus {
        *self.status_rx.borrow()
    }

    /// Subscribe to status transitions. Dropping the receiver
    /// unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusChange> {
        self.events.subscribe()
    }

    /// Force an out-of-band probe without disturbing the periodic
    /// schedule.
    pub async fn check_now(&self) {
        let _ = self.cmd_tx.send(Command::Probe).await;
    }

    /// Environment signal: the network came back. Probes immediately
    /// and resumes the periodic timer.
    pub async fn notify_online(&self) {
        let _ = self.cmd_tx.send(Command::Online).await;
    }

    /// Environment signal: the network went away. Forces
    /// `Disconnected` and suspends the periodic timer.
    pub async fn notify_offline(&self) {
        let _ = self.cmd_tx.send(Command::Offline).await;
    }

    /// Cancel the probe loop and wait for it to finish.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display() {
        assert_eq!(ConnectivityStatus::Limited.to_string(), "limited");
        assert_eq!(ConnectivityStatus::Unknown.to_string(), "unknown");
    }

    #[test]
    fn default_status_is_unknown() {
        assert_eq!(ConnectivityStatus::default(), ConnectivityStatus::Unknown);
    }
}
