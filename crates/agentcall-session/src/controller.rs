//! Single-task runtime that owns the call machine.
//!
//! All state changes happen on one tokio task that drains an event queue one
//! event at a time. Gateway work runs in spawned tasks that report back into
//! the same queue, so transition logic never runs concurrently with itself.

use crate::config::CallConfig;
use crate::event::{CallEvent, Effect};
use crate::machine::CallMachine;
use crate::ticker::DurationTicker;
use agentcall_gateway::SessionGateway;
use agentcall_types::{AlertKind, CallSnapshot};
use std::time::Duration;
use tokio::sync::mpsc::error::SendError;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Capacity of the alert broadcast channel.
const ALERT_BROADCAST_CAPACITY: usize = 16;

/// Handle to a running call.
///
/// Dropping the controller shuts the call down in the background; call
/// [`shutdown`](Self::shutdown) to wait for the teardown to finish.
#[derive(Debug)]
pub struct CallController {
    events: mpsc::UnboundedSender<CallEvent>,
    state: watch::Receiver<CallSnapshot>,
    alerts: broadcast::Sender<AlertKind>,
    task: Option<JoinHandle<()>>,
}

impl CallController {
    /// Mounts a ringing call backed by `gateway`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(gateway: SessionGateway, config: &CallConfig) -> Self {
        let machine = CallMachine::new(Duration::from_secs(config.error_grace_seconds));
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(machine.snapshot());
        let (alerts_tx, _) = broadcast::channel(ALERT_BROADCAST_CAPACITY);

        let runtime = CallRuntime {
            machine,
            gateway,
            events: events_tx.clone(),
            state: state_tx,
            alerts: alerts_tx.clone(),
            tick_period: Duration::from_millis(config.tick_millis.max(1)),
            ticker: None,
            error_grace: None,
        };
        let task = tokio::spawn(runtime.run(events_rx));

        Self {
            events: events_tx,
            state: state_rx,
            alerts: alerts_tx,
            task: Some(task),
        }
    }

    pub fn accept(&self) {
        self.dispatch(CallEvent::AcceptCall);
    }

    pub fn hang_up(&self) {
        self.dispatch(CallEvent::HangUp);
    }

    pub fn toggle_mute(&self) {
        self.dispatch(CallEvent::ToggleMute);
    }

    pub fn toggle_speaker(&self) {
        self.dispatch(CallEvent::ToggleSpeaker);
    }

    pub fn toggle_keypad(&self) {
        self.dispatch(CallEvent::ToggleKeypad);
    }

    /// The state as of the last processed event.
    pub fn snapshot(&self) -> CallSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CallSnapshot> {
        self.state.clone()
    }

    pub fn subscribe_alerts(&self) -> broadcast::Receiver<AlertKind> {
        self.alerts.subscribe()
    }

    /// Tears the call down, closing any open session, and waits for the
    /// runtime task to finish.
    pub async fn shutdown(mut self) {
        self.dispatch(CallEvent::Shutdown);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "call runtime task ended abnormally");
            }
        }
    }

    fn dispatch(&self, event: CallEvent) {
        if let Err(SendError(event)) = self.events.send(event) {
            debug!(?event, "call runtime is gone; dropping event");
        }
    }
}

impl Drop for CallController {
    fn drop(&mut self) {
        if self.task.is_some() {
            let _ = self.events.send(CallEvent::Shutdown);
        }
    }
}

struct CallRuntime {
    machine: CallMachine,
    gateway: SessionGateway,
    events: mpsc::UnboundedSender<CallEvent>,
    state: watch::Sender<CallSnapshot>,
    alerts: broadcast::Sender<AlertKind>,
    tick_period: Duration,
    ticker: Option<DurationTicker>,
    error_grace: Option<(u64, JoinHandle<()>)>,
}

impl CallRuntime {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<CallEvent>) {
        info!("call runtime started");

        while let Some(event) = rx.recv().await {
            let effects = self.machine.handle(event);
            let shutting_down = self.machine.is_shut_down();

            for effect in effects {
                self.execute(effect, shutting_down).await;
            }
            self.reconcile_timers();
            self.state.send_replace(self.machine.snapshot());

            if shutting_down {
                break;
            }
        }

        // Completions queued behind the shutdown may still carry session
        // handles. Drain them so each is closed; a sender that finds the
        // queue closed closes its own handle.
        rx.close();
        while let Some(event) = rx.recv().await {
            for effect in self.machine.handle(event) {
                self.execute(effect, true).await;
            }
        }

        self.ticker = None;
        if let Some((_, task)) = self.error_grace.take() {
            task.abort();
        }
        info!("call runtime stopped");
    }

    /// Runs one effect. While shutting down, session closes are awaited
    /// in place so they finish before the runtime exits.
    async fn execute(&mut self, effect: Effect, shutting_down: bool) {
        match effect {
            Effect::RequestMicrophone { attempt } => {
                let gateway = self.gateway.clone();
                let events = self.events.clone();
                tokio::spawn(async move {
                    let result = gateway.request_microphone_access().await;
                    let _ = events.send(CallEvent::MicrophoneResolved { attempt, result });
                });
            }
            Effect::FetchCredential { attempt } => {
                let gateway = self.gateway.clone();
                let events = self.events.clone();
                tokio::spawn(async move {
                    let result = gateway.fetch_session_credential().await;
                    let _ = events.send(CallEvent::CredentialResolved { attempt, result });
                });
            }
            Effect::OpenSession {
                attempt,
                credential,
            } => {
                let gateway = self.gateway.clone();
                let events = self.events.clone();
                tokio::spawn(async move {
                    let sink = events.clone();
                    let result = gateway
                        .open_session(attempt, &credential, move |event| {
                            let _ = sink.send(CallEvent::Session { attempt, event });
                        })
                        .await;
                    // The runtime has stopped taking events: close it here.
                    if let Err(SendError(CallEvent::SessionOpened {
                        result: Ok(handle), ..
                    })) = events.send(CallEvent::SessionOpened { attempt, result })
                    {
                        let _ = gateway.close_session(handle).await;
                    }
                });
            }
            Effect::CloseSession(handle) => {
                let attempt = handle.attempt();
                if shutting_down {
                    // Failures are already logged by the gateway.
                    let _ = self.gateway.close_session(handle).await;
                } else {
                    let gateway = self.gateway.clone();
                    let events = self.events.clone();
                    tokio::spawn(async move {
                        let result = gateway.close_session(handle).await;
                        let _ = events.send(CallEvent::SessionClosed { attempt, result });
                    });
                }
            }
            Effect::Alert(kind) => {
                warn!(alert = ?kind, text = kind.message(), "raising user alert");
                let _ = self.alerts.send(kind);
            }
            Effect::ArmErrorGrace { attempt, after } => {
                if let Some((_, previous)) = self.error_grace.take() {
                    previous.abort();
                }
                let events = self.events.clone();
                let task = tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    let _ = events.send(CallEvent::ErrorGraceElapsed { attempt });
                });
                self.error_grace = Some((attempt, task));
            }
        }
    }

    /// Starts or stops timers so they match the machine's current state.
    fn reconcile_timers(&mut self) {
        let running = self.ticker.as_ref().map(DurationTicker::attempt);
        match (self.machine.ticking_attempt(), running) {
            (Some(wanted), Some(current)) if wanted == current => {}
            (Some(wanted), _) => {
                self.ticker = Some(DurationTicker::start(
                    wanted,
                    self.tick_period,
                    self.events.clone(),
                ));
            }
            (None, Some(_)) => self.ticker = None,
            (None, None) => {}
        }

        let live = self.machine.live_attempt();
        let grace_is_stale =
            matches!(&self.error_grace, Some((attempt, _)) if Some(*attempt) != live);
        if grace_is_stale {
            if let Some((_, task)) = self.error_grace.take() {
                task.abort();
            }
        }
    }
}
