use agentcall_gateway::{
    ConfiguredMicrophoneAccess, Credential, CredentialSource, GatewayError, MicrophoneConfig,
    SessionCallbacks, SessionEvent, SessionGateway, VoiceClient, VoiceSession,
};
use agentcall_types::AgentMode;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

struct FixedCredential;

#[async_trait]
impl CredentialSource for FixedCredential {
    async fn fetch_credential(&self) -> Result<Credential, GatewayError> {
        Ok(Credential::new("wss://x"))
    }
}

#[derive(Default)]
struct RecordingClient {
    callbacks: Mutex<Option<SessionCallbacks>>,
    credentials: Mutex<Vec<String>>,
    ended: Arc<AtomicUsize>,
    fail_open: bool,
}

struct RecordingSession {
    ended: Arc<AtomicUsize>,
}

#[async_trait]
impl VoiceSession for RecordingSession {
    async fn end_session(self: Box<Self>) -> Result<(), GatewayError> {
        self.ended.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl VoiceClient for RecordingClient {
    async fn start_session(
        &self,
        credential: &Credential,
        callbacks: SessionCallbacks,
    ) -> Result<Box<dyn VoiceSession>, GatewayError> {
        if self.fail_open {
            return Err(GatewayError::Config("transport unavailable".to_string()));
        }
        self.credentials
            .lock()
            .unwrap()
            .push(credential.as_str().to_string());
        *self.callbacks.lock().unwrap() = Some(callbacks);
        Ok(Box::new(RecordingSession {
            ended: Arc::clone(&self.ended),
        }))
    }
}

fn gateway(client: Arc<RecordingClient>, allowed: bool) -> SessionGateway {
    SessionGateway::new(
        Arc::new(ConfiguredMicrophoneAccess::new(&MicrophoneConfig { allowed })),
        Arc::new(FixedCredential),
        client,
    )
}

#[tokio::test]
async fn test_microphone_denied_by_configuration() {
    let client = Arc::new(RecordingClient::default());

    let denied = gateway(Arc::clone(&client), false);
    assert!(matches!(
        denied.request_microphone_access().await,
        Err(GatewayError::PermissionDenied)
    ));

    let granted = gateway(client, true);
    assert!(granted.request_microphone_access().await.is_ok());
}

#[tokio::test]
async fn test_callbacks_translate_into_session_events() {
    let client = Arc::new(RecordingClient::default());
    let gateway = gateway(Arc::clone(&client), true);

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let credential = gateway.fetch_session_credential().await.unwrap();
    let handle = gateway
        .open_session(7, &credential, move |event| sink.lock().unwrap().push(event))
        .await
        .expect("open should succeed");

    assert_eq!(handle.attempt(), 7);
    assert_eq!(*client.credentials.lock().unwrap(), vec!["wss://x".to_string()]);

    {
        let guard = client.callbacks.lock().unwrap();
        let callbacks = guard.as_ref().expect("callbacks registered");
        callbacks.connected();
        callbacks.mode_changed(AgentMode::Listening);
        callbacks.mode_changed_raw(r#"{"mode":"speaking"}"#);
        callbacks.error("socket hiccup");
        callbacks.disconnected();
    }

    assert_eq!(
        *events.lock().unwrap(),
        vec![
            SessionEvent::Connected,
            SessionEvent::ModeChanged(AgentMode::Listening),
            SessionEvent::ModeChanged(AgentMode::Speaking),
            SessionEvent::Error("socket hiccup".to_string()),
            SessionEvent::Disconnected,
        ]
    );
}

#[tokio::test]
async fn test_close_session_ends_exactly_once() {
    let client = Arc::new(RecordingClient::default());
    let gateway = gateway(Arc::clone(&client), true);

    let handle = gateway
        .open_session(1, &Credential::new("wss://x"), |_| {})
        .await
        .unwrap();
    gateway.close_session(handle).await.unwrap();

    assert_eq!(client.ended.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_open_failure_maps_to_session_open_failed() {
    let client = Arc::new(RecordingClient {
        fail_open: true,
        ..RecordingClient::default()
    });
    let gateway = gateway(client, true);

    let result = gateway
        .open_session(1, &Credential::new("wss://x"), |_| {})
        .await;
    match result {
        Err(GatewayError::SessionOpenFailed(reason)) => {
            assert!(reason.contains("transport unavailable"))
        }
        other => panic!("Expected SessionOpenFailed, got {:?}", other),
    }
}
