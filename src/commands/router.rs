//! Router commands

use std::sync::Arc;

use async_trait::async_trait;

use crate::api::models::Router;
use crate::api::request::{DeleteRouterRequest, ModifyRouterRequest};
use crate::api::CloudService;
use crate::error::{ApiError, BatchError};
use crate::executor::{BatchCommand, Risk};
use crate::resolver::ResourceKind;

pub struct ModifyRouter {
    service: Arc<dyn CloudService>,
    name: String,
}

impl ModifyRouter {
    pub fn new(service: Arc<dyn CloudService>, name: Option<String>) -> Result<Self, BatchError> {
        match name.filter(|n| !n.trim().is_empty()) {
            Some(name) => Ok(Self { service, name }),
            None => Err(BatchError::Validation("name is required".to_string())),
        }
    }
}

#[async_trait]
impl BatchCommand for ModifyRouter {
    type Request = ModifyRouterRequest;
    type Output = Router;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Router
    }

    fn describe(&self, uuid: &str) -> String {
        format!("Modifying router {uuid}")
    }

    fn build_request(&self, uuid: &str) -> ModifyRouterRequest {
        ModifyRouterRequest {
            uuid: uuid.to_string(),
            name: self.name.clone(),
        }
    }

    async fn execute(&self, request: ModifyRouterRequest) -> Result<Router, ApiError> {
        self.service.modify_router(&request).await
    }
}

pub struct DeleteRouter {
    service: Arc<dyn CloudService>,
}

impl DeleteRouter {
    pub fn new(service: Arc<dyn CloudService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl BatchCommand for DeleteRouter {
    type Request = DeleteRouterRequest;
    type Output = ();

    fn kind(&self) -> ResourceKind {
        ResourceKind::Router
    }

    fn describe(&self, uuid: &str) -> String {
        format!("Deleting router {uuid}")
    }

    fn build_request(&self, uuid: &str) -> DeleteRouterRequest {
        DeleteRouterRequest {
            uuid: uuid.to_string(),
        }
    }

    async fn execute(&self, request: DeleteRouterRequest) -> Result<(), ApiError> {
        self.service.delete_router(&request).await
    }

    fn risk(&self) -> Risk {
        Risk::High
    }
}
