//! Server commands

use std::sync::Arc;

use async_trait::async_trait;

use super::server_state;
use crate::api::models::{Server, SERVER_STATE_STARTED, SERVER_STATE_STOPPED};
use crate::api::request::{
    DeleteServerRequest, EjectCdromRequest, LoadCdromRequest, RestartServerRequest,
    StartServerRequest, StopServerRequest, StopType, TimeoutAction,
};
use crate::api::CloudService;
use crate::error::ApiError;
use crate::executor::{BatchCommand, Risk, WaitCondition};
use crate::resolver::ResourceKind;

pub struct StartServer {
    service: Arc<dyn CloudService>,
}

impl StartServer {
    pub fn new(service: Arc<dyn CloudService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl BatchCommand for StartServer {
    type Request = StartServerRequest;
    type Output = Server;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Server
    }

    fn describe(&self, uuid: &str) -> String {
        format!("Starting server {uuid}")
    }

    fn build_request(&self, uuid: &str) -> StartServerRequest {
        StartServerRequest {
            uuid: uuid.to_string(),
        }
    }

    async fn execute(&self, request: StartServerRequest) -> Result<Server, ApiError> {
        self.service.start_server(&request).await
    }

    fn wait_condition(&self) -> Option<WaitCondition> {
        Some(server_state(&self.service, SERVER_STATE_STARTED))
    }
}

pub struct StopServer {
    service: Arc<dyn CloudService>,
    stop_type: StopType,
}

impl StopServer {
    pub fn new(service: Arc<dyn CloudService>, stop_type: StopType) -> Self {
        Self { service, stop_type }
    }
}

#[async_trait]
impl BatchCommand for StopServer {
    type Request = StopServerRequest;
    type Output = Server;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Server
    }

    fn describe(&self, uuid: &str) -> String {
        format!("Stopping server {uuid}")
    }

    fn build_request(&self, uuid: &str) -> StopServerRequest {
        StopServerRequest {
            uuid: uuid.to_string(),
            stop_type: self.stop_type,
        }
    }

    async fn execute(&self, request: StopServerRequest) -> Result<Server, ApiError> {
        self.service.stop_server(&request).await
    }

    fn wait_condition(&self) -> Option<WaitCondition> {
        Some(server_state(&self.service, SERVER_STATE_STOPPED))
    }
}

pub struct RestartServer {
    service: Arc<dyn CloudService>,
    stop_type: StopType,
    timeout_action: TimeoutAction,
}

impl RestartServer {
    pub fn new(
        service: Arc<dyn CloudService>,
        stop_type: StopType,
        timeout_action: TimeoutAction,
    ) -> Self {
        Self {
            service,
            stop_type,
            timeout_action,
        }
    }
}

#[async_trait]
impl BatchCommand for RestartServer {
    type Request = RestartServerRequest;
    type Output = Server;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Server
    }

    fn describe(&self, uuid: &str) -> String {
        format!("Restarting server {uuid}")
    }

    fn build_request(&self, uuid: &str) -> RestartServerRequest {
        RestartServerRequest {
            uuid: uuid.to_string(),
            stop_type: self.stop_type,
            timeout_action: self.timeout_action,
        }
    }

    async fn execute(&self, request: RestartServerRequest) -> Result<Server, ApiError> {
        self.service.restart_server(&request).await
    }

    fn wait_condition(&self) -> Option<WaitCondition> {
        Some(server_state(&self.service, SERVER_STATE_STARTED))
    }
}

pub struct DeleteServer {
    service: Arc<dyn CloudService>,
    delete_storages: bool,
}

impl DeleteServer {
    pub fn new(service: Arc<dyn CloudService>, delete_storages: bool) -> Self {
        Self {
            service,
            delete_storages,
        }
    }
}

#[async_trait]
impl BatchCommand for DeleteServer {
    type Request = DeleteServerRequest;
    type Output = ();

    fn kind(&self) -> ResourceKind {
        ResourceKind::Server
    }

    fn describe(&self, uuid: &str) -> String {
        if self.delete_storages {
            format!("Deleting server {uuid} and its storages")
        } else {
            format!("Deleting server {uuid}")
        }
    }

    fn build_request(&self, uuid: &str) -> DeleteServerRequest {
        DeleteServerRequest {
            uuid: uuid.to_string(),
        }
    }

    async fn execute(&self, request: DeleteServerRequest) -> Result<(), ApiError> {
        if self.delete_storages {
            self.service.delete_server_and_storages(&request).await
        } else {
            self.service.delete_server(&request).await
        }
    }

    fn risk(&self) -> Risk {
        Risk::High
    }
}

/// Load a CD-ROM; the storage is resolved before the command is built
pub struct LoadCdrom {
    service: Arc<dyn CloudService>,
    storage_uuid: String,
}

impl LoadCdrom {
    pub fn new(service: Arc<dyn CloudService>, storage_uuid: String) -> Self {
        Self {
            service,
            storage_uuid,
        }
    }
}

#[async_trait]
impl BatchCommand for LoadCdrom {
    type Request = LoadCdromRequest;
    type Output = Server;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Server
    }

    fn describe(&self, uuid: &str) -> String {
        format!("Loading storage {} as CD-ROM of server {uuid}", self.storage_uuid)
    }

    fn build_request(&self, uuid: &str) -> LoadCdromRequest {
        LoadCdromRequest {
            server_uuid: uuid.to_string(),
            storage_uuid: self.storage_uuid.clone(),
        }
    }

    async fn execute(&self, request: LoadCdromRequest) -> Result<Server, ApiError> {
        self.service.load_cdrom(&request).await
    }
}

pub struct EjectCdrom {
    service: Arc<dyn CloudService>,
}

impl EjectCdrom {
    pub fn new(service: Arc<dyn CloudService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl BatchCommand for EjectCdrom {
    type Request = EjectCdromRequest;
    type Output = Server;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Server
    }

    fn describe(&self, uuid: &str) -> String {
        format!("Ejecting CD-ROM from server {uuid}")
    }

    fn build_request(&self, uuid: &str) -> EjectCdromRequest {
        EjectCdromRequest {
            server_uuid: uuid.to_string(),
        }
    }

    async fn execute(&self, request: EjectCdromRequest) -> Result<Server, ApiError> {
        self.service.eject_cdrom(&request).await
    }
}
