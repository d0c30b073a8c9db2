//! Commands
//!
//! One [`BatchCommand`](crate::executor::BatchCommand) per remote action,
//! grouped by resource kind, plus `show` which only reads cached records.

pub mod network;
pub mod router;
pub mod server;
pub mod storage;

use std::fmt;
use std::sync::Arc;

use futures::FutureExt;
use serde::Serialize;

use crate::api::models::{
    Network, Router, Server, Storage, SERVER_STATE_ERROR, STORAGE_STATE_ERROR,
};
use crate::api::CloudService;
use crate::error::BatchError;
use crate::executor::WaitCondition;
use crate::resolver::{ResolverRegistry, ResourceKind};

/// Wait for a server to reach `target`
pub(crate) fn server_state(service: &Arc<dyn CloudService>, target: &'static str) -> WaitCondition {
    let service = Arc::clone(service);
    WaitCondition {
        target,
        failure_states: &[SERVER_STATE_ERROR],
        fetch: Arc::new(move |uuid: String| {
            let service = Arc::clone(&service);
            async move { service.get_server(&uuid).await.map(|s| s.state) }.boxed()
        }),
    }
}

/// Wait for a storage to reach `target`
pub(crate) fn storage_state(
    service: &Arc<dyn CloudService>,
    target: &'static str,
) -> WaitCondition {
    let service = Arc::clone(service);
    WaitCondition {
        target,
        failure_states: &[STORAGE_STATE_ERROR],
        fetch: Arc::new(move |uuid: String| {
            let service = Arc::clone(&service);
            async move { service.get_storage(&uuid).await.map(|s| s.state) }.boxed()
        }),
    }
}

/// A cached record of any kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Record {
    Server(Server),
    Storage(Storage),
    Network(Network),
    Router(Router),
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Server(s) => write!(
                f,
                "{}  {}  hostname={} state={} zone={} plan={}",
                s.uuid, s.title, s.hostname, s.state, s.zone, s.plan
            ),
            Self::Storage(s) => write!(
                f,
                "{}  {}  type={} state={} zone={} size={}GB tier={}",
                s.uuid, s.title, s.storage_type, s.state, s.zone, s.size, s.tier
            ),
            Self::Network(n) => {
                write!(f, "{}  {}  type={} zone={}", n.uuid, n.name, n.network_type, n.zone)?;
                if let Some(router) = &n.router {
                    write!(f, " router={router}")?;
                }
                for ip in &n.ip_networks.ip_network {
                    write!(
                        f,
                        " [{} {}]",
                        ip.family.as_deref().unwrap_or("-"),
                        ip.address.as_deref().unwrap_or("-")
                    )?;
                }
                Ok(())
            }
            Self::Router(r) => write!(
                f,
                "{}  {}  type={} networks={}",
                r.uuid,
                r.name,
                r.router_type,
                r.attached_networks.network.len()
            ),
        }
    }
}

/// Resolve `tokens` and return the matching cached records, in order
pub async fn show(
    registry: &ResolverRegistry,
    kind: ResourceKind,
    tokens: &[String],
) -> Result<Vec<Record>, BatchError> {
    if tokens.is_empty() {
        return Err(BatchError::Validation(
            "at least one identifier required".to_string(),
        ));
    }

    let uuids = registry.resolve(kind, tokens).await?;
    let mut records = Vec::with_capacity(uuids.len());
    for uuid in &uuids {
        let record = match kind {
            ResourceKind::Server => Record::Server(registry.cached_server(uuid)?.clone()),
            ResourceKind::Storage => Record::Storage(registry.cached_storage(uuid)?.clone()),
            ResourceKind::Network => Record::Network(registry.cached_network(uuid)?.clone()),
            ResourceKind::Router => Record::Router(registry.cached_router(uuid)?.clone()),
        };
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Service stub for command unit tests; listing returns nothing and
    //! every mutation is unreachable.

    use async_trait::async_trait;

    use crate::api::models::{Network, Router, Server, Storage};
    use crate::api::request::*;
    use crate::api::CloudService;
    use crate::error::ApiError;

    pub(crate) struct NoService;

    #[async_trait]
    impl CloudService for NoService {
        async fn list_servers(&self) -> Result<Vec<Server>, ApiError> {
            Ok(Vec::new())
        }
        async fn list_storages(&self) -> Result<Vec<Storage>, ApiError> {
            Ok(Vec::new())
        }
        async fn list_networks(&self) -> Result<Vec<Network>, ApiError> {
            Ok(Vec::new())
        }
        async fn list_routers(&self) -> Result<Vec<Router>, ApiError> {
            Ok(Vec::new())
        }
        async fn get_server(&self, _: &str) -> Result<Server, ApiError> {
            unimplemented!()
        }
        async fn get_storage(&self, _: &str) -> Result<Storage, ApiError> {
            unimplemented!()
        }
        async fn start_server(&self, _: &StartServerRequest) -> Result<Server, ApiError> {
            unimplemented!()
        }
        async fn stop_server(&self, _: &StopServerRequest) -> Result<Server, ApiError> {
            unimplemented!()
        }
        async fn restart_server(&self, _: &RestartServerRequest) -> Result<Server, ApiError> {
            unimplemented!()
        }
        async fn delete_server(&self, _: &DeleteServerRequest) -> Result<(), ApiError> {
            unimplemented!()
        }
        async fn delete_server_and_storages(
            &self,
            _: &DeleteServerRequest,
        ) -> Result<(), ApiError> {
            unimplemented!()
        }
        async fn load_cdrom(&self, _: &LoadCdromRequest) -> Result<Server, ApiError> {
            unimplemented!()
        }
        async fn eject_cdrom(&self, _: &EjectCdromRequest) -> Result<Server, ApiError> {
            unimplemented!()
        }
        async fn modify_storage(&self, _: &ModifyStorageRequest) -> Result<Storage, ApiError> {
            unimplemented!()
        }
        async fn delete_storage(&self, _: &DeleteStorageRequest) -> Result<(), ApiError> {
            unimplemented!()
        }
        async fn modify_network(&self, _: &ModifyNetworkRequest) -> Result<Network, ApiError> {
            unimplemented!()
        }
        async fn delete_network(&self, _: &DeleteNetworkRequest) -> Result<(), ApiError> {
            unimplemented!()
        }
        async fn modify_router(&self, _: &ModifyRouterRequest) -> Result<Router, ApiError> {
            unimplemented!()
        }
        async fn delete_router(&self, _: &DeleteRouterRequest) -> Result<(), ApiError> {
            unimplemented!()
        }
    }
}
