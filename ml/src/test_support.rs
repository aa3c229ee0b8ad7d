//! Test doubles for exercising the client without a real server
//!
//! Enabled by the `test-support` feature (and always present for this
//! crate's own tests). [`StaticTransport`] answers requests from canned
//! routes and records everything it saw, so assertions can inspect the
//! traffic after the fact.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::transport::{Transport, TransportError};

type CannedResult = Result<Value, (i64, String)>;

#[derive(Default)]
struct Inner {
    routes: Mutex<HashMap<String, VecDeque<CannedResult>>>,
    requests: Mutex<Vec<(String, Value)>>,
    notifications: Mutex<Vec<String>>,
    closed: AtomicBool,
}

/// In-memory transport that replays canned responses
///
/// `initialize` is answered automatically with the server name given to
/// [`StaticTransport::new`], unless a route overrides it. Any other method
/// without a queued route is rejected with JSON-RPC `-32601`, which is what
/// a real server does for unknown methods.
///
/// Cloning is cheap and shares state, so tests can hand one clone to the
/// client and keep another for assertions.
#[derive(Clone)]
pub struct StaticTransport {
    server_name: String,
    inner: Arc<Inner>,
}

impl StaticTransport {
    /// Create a transport whose handshake reports `server_name`
    pub fn new(server_name: impl Into<String>) -> Self {
        Self { server_name: server_name.into(), inner: Arc::new(Inner::default()) }
    }

    /// Queue a successful result for `method`, consumed in FIFO order
    pub fn route(&self, method: &str, result: Value) {
        self.inner
            .routes
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .push_back(Ok(result));
    }

    /// Queue a JSON-RPC error for `method`
    pub fn route_error(&self, method: &str, code: i64, message: &str) {
        self.inner
            .routes
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .push_back(Err((code, message.to_string())));
    }

    /// All requests seen so far, in order
    pub fn requests(&self) -> Vec<(String, Value)> {
        self.inner.requests.lock().unwrap().clone()
    }

    /// All notification methods seen so far, in order
    pub fn notifications(&self) -> Vec<String> {
        self.inner.notifications.lock().unwrap().clone()
    }

    /// True once `close()` has been called
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    fn default_initialize(&self) -> Value {
        json!({
            "protocolVersion": crate::client::PROTOCOL_VERSION,
            "serverInfo": { "name": self.server_name, "version": "0.0.0-test" },
            "capabilities": {},
        })
    }
}

#[async_trait]
impl Transport for StaticTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value, TransportError> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        self.inner.requests.lock().unwrap().push((method.to_string(), params));
        // Suspend once, like a wire round trip waiting on the response
        tokio::task::yield_now().await;

        let canned = self.inner.routes.lock().unwrap().get_mut(method).and_then(VecDeque::pop_front);
        match canned {
            Some(Ok(value)) => Ok(value),
            Some(Err((code, message))) => Err(TransportError::Rpc { code, message }),
            None if method == "initialize" => Ok(self.default_initialize()),
            None => Err(TransportError::Rpc {
                code: -32601,
                message: format!("method not found: {method}"),
            }),
        }
    }

    async fn notify(&self, method: &str, _params: Value) -> Result<(), TransportError> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        self.inner.notifications.lock().unwrap().push(method.to_string());
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.inner.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
