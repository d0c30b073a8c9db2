//! Shared fixtures for integration tests
//!
//! `FakeCloud` is an in-memory `CloudService` that counts list calls,
//! records every mutation, and can be told to fail, slow down, or script
//! the states a resource reports while being polled.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use upctl::api::models::{Network, Router, Server, Storage};
use upctl::api::request::{
    DeleteNetworkRequest, DeleteRouterRequest, DeleteServerRequest, DeleteStorageRequest,
    EjectCdromRequest, LoadCdromRequest, ModifyNetworkRequest, ModifyRouterRequest,
    ModifyStorageRequest, RestartServerRequest, StartServerRequest, StopServerRequest,
};
use upctl::api::CloudService;
use upctl::error::ApiError;
use upctl::executor::Confirm;
use upctl::livelog::LiveLog;
use upctl::resolver::ResourceKind;

pub fn server(uuid: &str, title: &str) -> Server {
    Server {
        uuid: uuid.to_string(),
        title: title.to_string(),
        hostname: format!("{title}.example.com"),
        state: "stopped".to_string(),
        zone: "fi-hel1".to_string(),
        plan: "1xCPU-1GB".to_string(),
    }
}

pub fn storage(uuid: &str, title: &str) -> Storage {
    Storage {
        uuid: uuid.to_string(),
        title: title.to_string(),
        state: "online".to_string(),
        access: "private".to_string(),
        storage_type: "normal".to_string(),
        zone: "fi-hel1".to_string(),
        size: 10,
        tier: "maxiops".to_string(),
    }
}

pub fn network(uuid: &str, name: &str) -> Network {
    Network {
        uuid: uuid.to_string(),
        name: name.to_string(),
        network_type: "private".to_string(),
        zone: "fi-hel1".to_string(),
        router: None,
        ip_networks: Default::default(),
    }
}

pub fn router(uuid: &str, name: &str) -> Router {
    Router {
        uuid: uuid.to_string(),
        name: name.to_string(),
        router_type: "normal".to_string(),
        attached_networks: Default::default(),
    }
}

pub fn random_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn tokens(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// A live log that writes nowhere
pub fn quiet_log() -> LiveLog {
    LiveLog::new(Box::new(io::sink()), false)
}

fn not_found(uuid: &str) -> ApiError {
    ApiError::Status {
        status: 404,
        code: "NOT_FOUND".to_string(),
        message: format!("{uuid} does not exist"),
    }
}

#[derive(Default)]
pub struct FakeCloud {
    servers: Vec<Server>,
    storages: Vec<Storage>,
    networks: Vec<Network>,
    routers: Vec<Router>,

    list_calls: Mutex<HashMap<ResourceKind, usize>>,
    list_delay: Option<Duration>,
    failing_lists: AtomicUsize,

    mutations: Mutex<Vec<String>>,
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
    default_delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,

    states: Mutex<HashMap<String, VecDeque<String>>>,
    state_polls: AtomicUsize,
}

impl FakeCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_servers(mut self, servers: Vec<Server>) -> Self {
        self.servers = servers;
        self
    }

    pub fn with_storages(mut self, storages: Vec<Storage>) -> Self {
        self.storages = storages;
        self
    }

    pub fn with_networks(mut self, networks: Vec<Network>) -> Self {
        self.networks = networks;
        self
    }

    pub fn with_routers(mut self, routers: Vec<Router>) -> Self {
        self.routers = routers;
        self
    }

    /// Slow down list calls so concurrent callers overlap
    pub fn with_list_delay(mut self, delay: Duration) -> Self {
        self.list_delay = Some(delay);
        self
    }

    /// The next `count` list calls fail
    pub fn with_failing_lists(self, count: usize) -> Self {
        self.failing_lists.store(count, Ordering::SeqCst);
        self
    }

    /// Mutations on `uuid` fail with a 409
    pub fn failing_on(mut self, uuid: &str) -> Self {
        self.failing.insert(uuid.to_string());
        self
    }

    pub fn with_delay(mut self, uuid: &str, delay: Duration) -> Self {
        self.delays.insert(uuid.to_string(), delay);
        self
    }

    pub fn with_default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = Some(delay);
        self
    }

    /// States reported by successive polls of `uuid`; the last one sticks
    pub fn with_states(self, uuid: &str, states: &[&str]) -> Self {
        self.states.lock().unwrap().insert(
            uuid.to_string(),
            states.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    pub fn list_calls(&self, kind: ResourceKind) -> usize {
        self.list_calls
            .lock()
            .unwrap()
            .get(&kind)
            .copied()
            .unwrap_or(0)
    }

    pub fn mutations(&self) -> Vec<String> {
        self.mutations.lock().unwrap().clone()
    }

    pub fn mutation_count(&self) -> usize {
        self.mutations.lock().unwrap().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn state_polls(&self) -> usize {
        self.state_polls.load(Ordering::SeqCst)
    }

    async fn list<T: Clone>(&self, kind: ResourceKind, items: &[T]) -> Result<Vec<T>, ApiError> {
        *self.list_calls.lock().unwrap().entry(kind).or_insert(0) += 1;
        if let Some(delay) = self.list_delay {
            tokio::time::sleep(delay).await;
        }
        let failing = self
            .failing_lists
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ApiError::Transport("connection reset".to_string()));
        }
        Ok(items.to_vec())
    }

    async fn mutate(&self, op: &str, uuid: &str) -> Result<(), ApiError> {
        self.mutations.lock().unwrap().push(format!("{op}:{uuid}"));

        let active = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(active, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(uuid).copied().or(self.default_delay) {
            tokio::time::sleep(delay).await;
        } else {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(uuid) {
            return Err(ApiError::Status {
                status: 409,
                code: "RESOURCE_STATE_ILLEGAL".to_string(),
                message: "The resource is in an illegal state.".to_string(),
            });
        }
        Ok(())
    }

    fn next_state(&self, uuid: &str) -> Option<String> {
        self.state_polls.fetch_add(1, Ordering::SeqCst);
        let mut states = self.states.lock().unwrap();
        let queue = states.get_mut(uuid)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }

    fn find_server(&self, uuid: &str) -> Result<Server, ApiError> {
        self.servers
            .iter()
            .find(|s| s.uuid == uuid)
            .cloned()
            .ok_or_else(|| not_found(uuid))
    }

    fn find_storage(&self, uuid: &str) -> Result<Storage, ApiError> {
        self.storages
            .iter()
            .find(|s| s.uuid == uuid)
            .cloned()
            .ok_or_else(|| not_found(uuid))
    }
}

#[async_trait]
impl CloudService for FakeCloud {
    async fn list_servers(&self) -> Result<Vec<Server>, ApiError> {
        self.list(ResourceKind::Server, &self.servers).await
    }

    async fn list_storages(&self) -> Result<Vec<Storage>, ApiError> {
        self.list(ResourceKind::Storage, &self.storages).await
    }

    async fn list_networks(&self) -> Result<Vec<Network>, ApiError> {
        self.list(ResourceKind::Network, &self.networks).await
    }

    async fn list_routers(&self) -> Result<Vec<Router>, ApiError> {
        self.list(ResourceKind::Router, &self.routers).await
    }

    async fn get_server(&self, uuid: &str) -> Result<Server, ApiError> {
        let mut server = self.find_server(uuid)?;
        if let Some(state) = self.next_state(uuid) {
            server.state = state;
        }
        Ok(server)
    }

    async fn get_storage(&self, uuid: &str) -> Result<Storage, ApiError> {
        let mut storage = self.find_storage(uuid)?;
        if let Some(state) = self.next_state(uuid) {
            storage.state = state;
        }
        Ok(storage)
    }

    async fn start_server(&self, req: &StartServerRequest) -> Result<Server, ApiError> {
        self.mutate("start", &req.uuid).await?;
        self.find_server(&req.uuid)
    }

    async fn stop_server(&self, req: &StopServerRequest) -> Result<Server, ApiError> {
        self.mutate("stop", &req.uuid).await?;
        self.find_server(&req.uuid)
    }

    async fn restart_server(&self, req: &RestartServerRequest) -> Result<Server, ApiError> {
        self.mutate("restart", &req.uuid).await?;
        self.find_server(&req.uuid)
    }

    async fn delete_server(&self, req: &DeleteServerRequest) -> Result<(), ApiError> {
        self.mutate("delete", &req.uuid).await
    }

    async fn delete_server_and_storages(&self, req: &DeleteServerRequest) -> Result<(), ApiError> {
        self.mutate("delete+storages", &req.uuid).await
    }

    async fn load_cdrom(&self, req: &LoadCdromRequest) -> Result<Server, ApiError> {
        self.mutate(&format!("load:{}", req.storage_uuid), &req.server_uuid)
            .await?;
        self.find_server(&req.server_uuid)
    }

    async fn eject_cdrom(&self, req: &EjectCdromRequest) -> Result<Server, ApiError> {
        self.mutate("eject", &req.server_uuid).await?;
        self.find_server(&req.server_uuid)
    }

    async fn modify_storage(&self, req: &ModifyStorageRequest) -> Result<Storage, ApiError> {
        self.mutate("modify", &req.uuid).await?;
        let mut storage = self.find_storage(&req.uuid)?;
        if let Some(title) = &req.title {
            storage.title = title.clone();
        }
        if let Some(size) = req.size {
            storage.size = size;
        }
        Ok(storage)
    }

    async fn delete_storage(&self, req: &DeleteStorageRequest) -> Result<(), ApiError> {
        self.mutate("delete", &req.uuid).await
    }

    async fn modify_network(&self, req: &ModifyNetworkRequest) -> Result<Network, ApiError> {
        self.mutate("modify", &req.uuid).await?;
        self.networks
            .iter()
            .find(|n| n.uuid == req.uuid)
            .cloned()
            .ok_or_else(|| not_found(&req.uuid))
    }

    async fn delete_network(&self, req: &DeleteNetworkRequest) -> Result<(), ApiError> {
        self.mutate("delete", &req.uuid).await
    }

    async fn modify_router(&self, req: &ModifyRouterRequest) -> Result<Router, ApiError> {
        self.mutate("modify", &req.uuid).await?;
        let mut router = self
            .routers
            .iter()
            .find(|r| r.uuid == req.uuid)
            .cloned()
            .ok_or_else(|| not_found(&req.uuid))?;
        router.name = req.name.clone();
        Ok(router)
    }

    async fn delete_router(&self, req: &DeleteRouterRequest) -> Result<(), ApiError> {
        self.mutate("delete", &req.uuid).await
    }
}

/// Scripted operator answer that counts how often it was asked
pub struct ScriptedConfirm {
    answer: bool,
    asked: AtomicUsize,
}

impl ScriptedConfirm {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            asked: AtomicUsize::new(0),
        }
    }

    pub fn asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

impl Confirm for ScriptedConfirm {
    fn confirm(&self, _prompt: &str) -> io::Result<bool> {
        self.asked.fetch_add(1, Ordering::SeqCst);
        Ok(self.answer)
    }
}

/// Confirmation that blocks like a terminal prompt until answered
pub struct BlockingConfirm {
    answers: Mutex<Receiver<bool>>,
    asked: AtomicUsize,
}

impl BlockingConfirm {
    /// The prompt returns what is sent, or "no" once the sender is dropped
    pub fn new() -> (Sender<bool>, Self) {
        let (tx, rx) = mpsc::channel();
        let confirm = Self {
            answers: Mutex::new(rx),
            asked: AtomicUsize::new(0),
        };
        (tx, confirm)
    }

    pub fn asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

impl Confirm for BlockingConfirm {
    fn confirm(&self, _prompt: &str) -> io::Result<bool> {
        self.asked.fetch_add(1, Ordering::SeqCst);
        Ok(self.answers.lock().unwrap().recv().unwrap_or(false))
    }
}
