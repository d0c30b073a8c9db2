//! Storage commands

use std::sync::Arc;

use async_trait::async_trait;

use super::storage_state;
use crate::api::models::{Storage, STORAGE_STATE_ONLINE};
use crate::api::request::{DeleteStorageRequest, ModifyStorageRequest};
use crate::api::CloudService;
use crate::error::{ApiError, BatchError};
use crate::executor::{BatchCommand, Risk, WaitCondition};
use crate::resolver::ResourceKind;

pub struct ModifyStorage {
    service: Arc<dyn CloudService>,
    title: Option<String>,
    size: Option<u32>,
}

impl ModifyStorage {
    /// At least one of `title` and `size` must be given
    pub fn new(
        service: Arc<dyn CloudService>,
        title: Option<String>,
        size: Option<u32>,
    ) -> Result<Self, BatchError> {
        let title = title.filter(|t| !t.trim().is_empty());
        if title.is_none() && size.is_none() {
            return Err(BatchError::Validation(
                "nothing to modify: give --title or --size".to_string(),
            ));
        }
        if size == Some(0) {
            return Err(BatchError::Validation(
                "size must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            service,
            title,
            size,
        })
    }
}

#[async_trait]
impl BatchCommand for ModifyStorage {
    type Request = ModifyStorageRequest;
    type Output = Storage;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Storage
    }

    fn describe(&self, uuid: &str) -> String {
        format!("Modifying storage {uuid}")
    }

    fn build_request(&self, uuid: &str) -> ModifyStorageRequest {
        ModifyStorageRequest {
            uuid: uuid.to_string(),
            title: self.title.clone(),
            size: self.size,
        }
    }

    async fn execute(&self, request: ModifyStorageRequest) -> Result<Storage, ApiError> {
        self.service.modify_storage(&request).await
    }

    fn wait_condition(&self) -> Option<WaitCondition> {
        Some(storage_state(&self.service, STORAGE_STATE_ONLINE))
    }
}

pub struct DeleteStorage {
    service: Arc<dyn CloudService>,
}

impl DeleteStorage {
    pub fn new(service: Arc<dyn CloudService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl BatchCommand for DeleteStorage {
    type Request = DeleteStorageRequest;
    type Output = ();

    fn kind(&self) -> ResourceKind {
        ResourceKind::Storage
    }

    fn describe(&self, uuid: &str) -> String {
        format!("Deleting storage {uuid}")
    }

    fn build_request(&self, uuid: &str) -> DeleteStorageRequest {
        DeleteStorageRequest {
            uuid: uuid.to_string(),
        }
    }

    async fn execute(&self, request: DeleteStorageRequest) -> Result<(), ApiError> {
        self.service.delete_storage(&request).await
    }

    fn risk(&self) -> Risk {
        Risk::High
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::NoService;

    fn service() -> Arc<dyn CloudService> {
        Arc::new(NoService)
    }

    #[test]
    fn test_modify_requires_a_field() {
        let err = ModifyStorage::new(service(), None, None).err().unwrap();
        assert!(matches!(err, BatchError::Validation(_)));

        let err = ModifyStorage::new(service(), Some("  ".to_string()), None)
            .err()
            .unwrap();
        assert!(matches!(err, BatchError::Validation(_)));
    }

    #[test]
    fn test_modify_rejects_zero_size() {
        assert!(ModifyStorage::new(service(), None, Some(0)).is_err());
    }

    #[test]
    fn test_modify_request_and_wait() {
        let cmd = ModifyStorage::new(service(), Some("backup".to_string()), Some(50)).unwrap();
        assert_eq!(
            cmd.build_request("st-1"),
            ModifyStorageRequest {
                uuid: "st-1".to_string(),
                title: Some("backup".to_string()),
                size: Some(50),
            }
        );
        let cond = cmd.wait_condition().unwrap();
        assert_eq!(cond.target, "online");
        assert_eq!(cond.failure_states, &["error"]);
    }

    #[test]
    fn test_delete_is_high_risk() {
        assert_eq!(DeleteStorage::new(service()).risk(), Risk::High);
    }
}
