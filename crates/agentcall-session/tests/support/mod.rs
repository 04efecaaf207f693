//! Test doubles for the gateway boundaries and a controller harness.

#![allow(dead_code)]

use agentcall_gateway::{
    Credential, CredentialSource, GatewayError, MicrophoneAccess, SessionCallbacks,
    SessionGateway, VoiceClient, VoiceSession,
};
use agentcall_session::{CallConfig, CallController};
use agentcall_types::{AgentMode, CallSnapshot};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

pub struct ScriptedMicrophone {
    allowed: bool,
    pub requests: AtomicUsize,
}

#[async_trait]
impl MicrophoneAccess for ScriptedMicrophone {
    async fn request_access(&self) -> Result<(), GatewayError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.allowed {
            Ok(())
        } else {
            Err(GatewayError::PermissionDenied)
        }
    }
}

pub struct ScriptedCredentials {
    signed_url: Option<String>,
    pub fetches: AtomicUsize,
}

#[async_trait]
impl CredentialSource for ScriptedCredentials {
    async fn fetch_credential(&self) -> Result<Credential, GatewayError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match &self.signed_url {
            Some(url) => Ok(Credential::new(url.clone())),
            None => Err(GatewayError::CredentialFetchFailed(
                "endpoint returned 500 Internal Server Error".to_string(),
            )),
        }
    }
}

/// Voice client whose hooks are fired by the test.
#[derive(Default)]
pub struct FakeVoiceClient {
    callbacks: Mutex<Vec<SessionCallbacks>>,
    credentials: Mutex<Vec<String>>,
    pub starts: AtomicUsize,
    pub ends: Arc<AtomicUsize>,
    hold_open: AtomicBool,
    fail_open: AtomicBool,
    release: Notify,
}

impl FakeVoiceClient {
    /// Makes the next `start_session` calls wait for [`release`](Self::release).
    pub fn hold_open(&self) {
        self.hold_open.store(true, Ordering::SeqCst);
    }

    /// Makes every later `start_session` call fail.
    pub fn fail_open(&self) {
        self.fail_open.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.hold_open.store(false, Ordering::SeqCst);
        self.release.notify_waiters();
    }

    pub fn credentials(&self) -> Vec<String> {
        self.credentials.lock().unwrap().clone()
    }

    /// Fires a hook on the session created by the `index`-th start.
    pub fn with_session(&self, index: usize, fire: impl FnOnce(&SessionCallbacks)) {
        let guard = self.callbacks.lock().unwrap();
        fire(guard.get(index).expect("no such session"));
    }

    pub fn connect(&self) {
        self.with_latest(|cb| cb.connected());
    }

    pub fn disconnect(&self) {
        self.with_latest(|cb| cb.disconnected());
    }

    pub fn error(&self, message: &str) {
        self.with_latest(|cb| cb.error(message));
    }

    pub fn mode(&self, mode: AgentMode) {
        self.with_latest(|cb| cb.mode_changed(mode));
    }

    fn with_latest(&self, fire: impl FnOnce(&SessionCallbacks)) {
        let guard = self.callbacks.lock().unwrap();
        fire(guard.last().expect("no session started"));
    }
}

struct FakeSession {
    ends: Arc<AtomicUsize>,
}

#[async_trait]
impl VoiceSession for FakeSession {
    async fn end_session(self: Box<Self>) -> Result<(), GatewayError> {
        self.ends.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl VoiceClient for FakeVoiceClient {
    async fn start_session(
        &self,
        credential: &Credential,
        callbacks: SessionCallbacks,
    ) -> Result<Box<dyn VoiceSession>, GatewayError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.credentials
            .lock()
            .unwrap()
            .push(credential.as_str().to_string());
        self.callbacks.lock().unwrap().push(callbacks);

        let released = self.release.notified();
        if self.hold_open.load(Ordering::SeqCst) {
            released.await;
        }
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(GatewayError::SessionOpenFailed(
                "signaling handshake rejected".to_string(),
            ));
        }

        Ok(Box::new(FakeSession {
            ends: Arc::clone(&self.ends),
        }))
    }
}

pub struct Harness {
    pub controller: CallController,
    pub microphone: Arc<ScriptedMicrophone>,
    pub credentials: Arc<ScriptedCredentials>,
    pub client: Arc<FakeVoiceClient>,
}

pub struct HarnessBuilder {
    microphone_allowed: bool,
    signed_url: Option<String>,
    config: CallConfig,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            microphone_allowed: true,
            signed_url: Some("wss://x".to_string()),
            config: CallConfig::default(),
        }
    }

    pub fn deny_microphone(mut self) -> Self {
        self.microphone_allowed = false;
        self
    }

    pub fn failing_credentials(mut self) -> Self {
        self.signed_url = None;
        self
    }

    pub fn error_grace_seconds(mut self, seconds: u64) -> Self {
        self.config.error_grace_seconds = seconds;
        self
    }

    pub fn spawn(self) -> Harness {
        let microphone = Arc::new(ScriptedMicrophone {
            allowed: self.microphone_allowed,
            requests: AtomicUsize::new(0),
        });
        let credentials = Arc::new(ScriptedCredentials {
            signed_url: self.signed_url,
            fetches: AtomicUsize::new(0),
        });
        let client = Arc::new(FakeVoiceClient::default());
        let gateway = SessionGateway::new(
            microphone.clone(),
            credentials.clone(),
            client.clone(),
        );
        Harness {
            controller: CallController::spawn(gateway, &self.config),
            microphone,
            credentials,
            client,
        }
    }
}

impl Harness {
    /// Waits (on the paused test clock) until the published state matches.
    pub async fn wait_for(&self, predicate: impl Fn(&CallSnapshot) -> bool) -> CallSnapshot {
        let mut rx = self.controller.subscribe();
        let snapshot = tokio::time::timeout(Duration::from_secs(30), rx.wait_for(|s| predicate(s)))
            .await
            .expect("timed out waiting for call state")
            .expect("call runtime stopped")
            .clone();
        snapshot
    }

    /// Accepts the call and drives it until the client reports connected.
    pub async fn connect(&self) -> CallSnapshot {
        self.controller.accept();
        eventually(|| self.client.starts.load(Ordering::SeqCst) == 1).await;
        self.wait_for(|s| s.has_session).await;
        self.client.connect();
        self.wait_for(|s| s.status == agentcall_types::CallStatus::Connected)
            .await
    }
}

/// Polls `condition` on the test clock until it holds.
pub async fn eventually(condition: impl Fn() -> bool) {
    for _ in 0..1_000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition never became true");
}
