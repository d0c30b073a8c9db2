//! The remote API as seen by the resolver and the commands
//!
//! [`ApiClient`](super::client::ApiClient) is the production implementation;
//! tests substitute an in-memory one.

use async_trait::async_trait;

use super::models::{Network, Router, Server, Storage};
use super::request::{
    DeleteNetworkRequest, DeleteRouterRequest, DeleteServerRequest, DeleteStorageRequest,
    EjectCdromRequest, LoadCdromRequest, ModifyNetworkRequest, ModifyRouterRequest,
    ModifyStorageRequest, RestartServerRequest, StartServerRequest, StopServerRequest,
};
use crate::error::ApiError;

#[async_trait]
pub trait CloudService: Send + Sync {
    async fn list_servers(&self) -> Result<Vec<Server>, ApiError>;
    async fn list_storages(&self) -> Result<Vec<Storage>, ApiError>;
    async fn list_networks(&self) -> Result<Vec<Network>, ApiError>;
    async fn list_routers(&self) -> Result<Vec<Router>, ApiError>;

    async fn get_server(&self, uuid: &str) -> Result<Server, ApiError>;
    async fn get_storage(&self, uuid: &str) -> Result<Storage, ApiError>;

    async fn start_server(&self, req: &StartServerRequest) -> Result<Server, ApiError>;
    async fn stop_server(&self, req: &StopServerRequest) -> Result<Server, ApiError>;
    async fn restart_server(&self, req: &RestartServerRequest) -> Result<Server, ApiError>;
    async fn delete_server(&self, req: &DeleteServerRequest) -> Result<(), ApiError>;
    /// Deletes the server together with every storage attached to it
    async fn delete_server_and_storages(&self, req: &DeleteServerRequest)
        -> Result<(), ApiError>;
    async fn load_cdrom(&self, req: &LoadCdromRequest) -> Result<Server, ApiError>;
    async fn eject_cdrom(&self, req: &EjectCdromRequest) -> Result<Server, ApiError>;

    async fn modify_storage(&self, req: &ModifyStorageRequest) -> Result<Storage, ApiError>;
    async fn delete_storage(&self, req: &DeleteStorageRequest) -> Result<(), ApiError>;

    async fn modify_network(&self, req: &ModifyNetworkRequest) -> Result<Network, ApiError>;
    async fn delete_network(&self, req: &DeleteNetworkRequest) -> Result<(), ApiError>;

    async fn modify_router(&self, req: &ModifyRouterRequest) -> Result<Router, ApiError>;
    async fn delete_router(&self, req: &DeleteRouterRequest) -> Result<(), ApiError>;
}
