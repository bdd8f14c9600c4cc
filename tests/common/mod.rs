//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cosmos_client::clients::{CosmosError, RawResponse, RequestMessage, Transport};
use cosmos_client::consistency::AccountMetadataReader;
use cosmos_client::models::{AccountConsistency, AccountProperties, ConsistencyLevel};
use cosmos_client::{ClientConfig, ClientOptions, Collaborators, CosmosClient};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// base64 of "secret-key".
pub const MASTER_KEY: &str = "c2VjcmV0LWtleQ==";

pub fn config_for(endpoint: &str) -> ClientConfig {
    ClientConfig::new(endpoint, MASTER_KEY, ClientOptions::default()).unwrap()
}

pub fn config() -> ClientConfig {
    config_for("https://test-account.documents.azure.com:443/")
}

/// A client whose requests are answered by `transport`.
pub fn client_with(transport: &Arc<FakeTransport>) -> CosmosClient {
    CosmosClient::with_collaborators(
        config(),
        Collaborators {
            transport: Some(Arc::clone(transport) as Arc<dyn Transport>),
            ..Collaborators::default()
        },
    )
    .unwrap()
}

struct Scripted {
    status: u16,
    headers: HashMap<String, Vec<String>>,
    body: Option<Vec<u8>>,
}

/// In-memory transport replaying scripted responses in order and recording
/// every request it receives.
#[derive(Default)]
pub struct FakeTransport {
    responses: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<RequestMessage>>,
    released: Arc<AtomicUsize>,
}

impl std::fmt::Debug for FakeTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeTransport").finish_non_exhaustive()
    }
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queues a response with a JSON body.
    pub fn push(&self, status: u16, body: Value) {
        self.push_with_headers(status, &[], Some(body));
    }

    /// Queues a response with no body.
    pub fn push_empty(&self, status: u16) {
        self.push_with_headers(status, &[], None);
    }

    pub fn push_with_headers(&self, status: u16, headers: &[(&str, &str)], body: Option<Value>) {
        let headers = headers
            .iter()
            .map(|(k, v)| ((*k).to_string(), vec![(*v).to_string()]))
            .collect();
        self.responses.lock().unwrap().push_back(Scripted {
            status,
            headers,
            body: body.map(|b| serde_json::to_vec(&b).unwrap()),
        });
    }

    /// Every request seen so far, in order.
    pub fn requests(&self) -> Vec<RequestMessage> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// How many responses have had their content released.
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: RequestMessage) -> Result<RawResponse, CosmosError> {
        self.requests.lock().unwrap().push(request);

        let scripted = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted response left");
        let released = Arc::clone(&self.released);
        Ok(
            RawResponse::new(scripted.status, "", scripted.headers, scripted.body)
                .with_release_hook(move || {
                    released.fetch_add(1, Ordering::SeqCst);
                }),
        )
    }
}

/// Account reader that counts its calls and optionally fails the first ones.
#[derive(Debug)]
pub struct CountingReader {
    level: ConsistencyLevel,
    delay: Duration,
    failures_left: AtomicUsize,
    calls: AtomicUsize,
}

impl CountingReader {
    pub fn new(level: ConsistencyLevel) -> Arc<Self> {
        Self::failing(level, 0)
    }

    pub fn failing(level: ConsistencyLevel, failures: usize) -> Arc<Self> {
        Arc::new(Self {
            level,
            delay: Duration::from_millis(20),
            failures_left: AtomicUsize::new(failures),
            calls: AtomicUsize::new(0),
        })
    }

    /// A reader whose fetch takes `delay`.
    pub fn slow(level: ConsistencyLevel, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            level,
            delay,
            failures_left: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccountMetadataReader for CountingReader {
    async fn read_account(&self, cancel: &CancellationToken) -> Result<AccountProperties, CosmosError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::select! {
            () = cancel.cancelled() => return Err(CosmosError::Cancelled),
            () = tokio::time::sleep(self.delay) => {}
        }

        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(CosmosError::invalid_argument("account", "simulated outage"));
        }

        Ok(AccountProperties {
            id: "test-account".to_string(),
            user_consistency_policy: AccountConsistency {
                default_consistency_level: self.level,
                ..AccountConsistency::default()
            },
            ..AccountProperties::default()
        })
    }
}
