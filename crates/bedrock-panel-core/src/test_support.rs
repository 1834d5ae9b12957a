//! Fakes shared by the unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt};

use crate::api::{ApiRequest, ApiResponse, Gateway, Transport, TransportError};
use crate::auth::{CredentialStore, SessionCoordinator};
use crate::navigation::{LocationNavigator, Navigator};

type Reply = Result<ApiResponse, TransportError>;

/// Transport that answers from a queue and records what it was sent.
/// Each send yields once before answering so concurrent calls interleave.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    sent: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn reply(&self, status: u16, body: &str) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(ApiResponse::new(status, body)));
        self
    }

    pub fn fail(&self, error: TransportError) -> &Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn sent(&self) -> Vec<ApiRequest> {
        self.sent.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: ApiRequest) -> BoxFuture<'_, Result<ApiResponse, TransportError>> {
        self.sent.lock().unwrap().push(request);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ApiResponse::new(200, "")));
        async move {
            tokio::task::yield_now().await;
            reply
        }
        .boxed()
    }
}

/// Navigator that also remembers every redirect it was asked for.
pub struct RecordingNavigator {
    inner: LocationNavigator,
    redirects: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new(initial: &str) -> Self {
        Self {
            inner: LocationNavigator::new(initial),
            redirects: Mutex::new(Vec::new()),
        }
    }

    pub fn set_current(&self, path: &str) {
        self.inner.set_current(path);
    }

    /// Oldest first.
    pub fn redirects(&self) -> Vec<String> {
        self.redirects.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn current_path(&self) -> String {
        self.inner.current_path()
    }

    fn redirect(&self, path: &str) {
        self.redirects.lock().unwrap().push(path.to_string());
        self.inner.redirect(path);
    }
}

/// Everything a gateway test needs, wired together.
pub struct Harness {
    pub transport: Arc<ScriptedTransport>,
    pub coordinator: Arc<SessionCoordinator>,
    pub navigator: Arc<RecordingNavigator>,
    pub gateway: Gateway,
}

impl Harness {
    pub fn at(location: &str) -> Self {
        let transport = Arc::new(ScriptedTransport::default());
        let coordinator = Arc::new(SessionCoordinator::new(Arc::new(
            CredentialStore::in_memory(),
        )));
        let navigator = Arc::new(RecordingNavigator::new(location));
        let gateway = Gateway::new(transport.clone(), coordinator.clone(), navigator.clone());
        Self {
            transport,
            coordinator,
            navigator,
            gateway,
        }
    }

    pub fn store(&self) -> &CredentialStore {
        self.coordinator.store()
    }
}
