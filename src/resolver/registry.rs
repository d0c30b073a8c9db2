//! Resolver Registry - one provider per resource kind
//!
//! Built once per command invocation and passed by reference to whatever
//! needs resolution, so every lookup in an invocation shares the same caches.

use std::sync::Arc;

use super::provider::CachingProvider;
use super::ResourceKind;
use crate::api::models::{Network, Router, Server, Storage};
use crate::api::CloudService;
use crate::error::ResolveError;

pub struct ResolverRegistry {
    service: Arc<dyn CloudService>,
    servers: CachingProvider<Server>,
    storages: CachingProvider<Storage>,
    networks: CachingProvider<Network>,
    routers: CachingProvider<Router>,
}

impl ResolverRegistry {
    pub fn new(service: Arc<dyn CloudService>) -> Self {
        Self {
            service,
            servers: CachingProvider::new(),
            storages: CachingProvider::new(),
            networks: CachingProvider::new(),
            routers: CachingProvider::new(),
        }
    }

    pub fn service(&self) -> &Arc<dyn CloudService> {
        &self.service
    }

    // =========================================================================
    // Collections
    // =========================================================================

    pub async fn servers(&self) -> Result<&[Server], ResolveError> {
        self.servers.get(|| self.service.list_servers()).await
    }

    pub async fn storages(&self) -> Result<&[Storage], ResolveError> {
        self.storages.get(|| self.service.list_storages()).await
    }

    pub async fn networks(&self) -> Result<&[Network], ResolveError> {
        self.networks.get(|| self.service.list_networks()).await
    }

    pub async fn routers(&self) -> Result<&[Router], ResolveError> {
        self.routers.get(|| self.service.list_routers()).await
    }

    /// Populate the cache of `kind` if it is still empty
    pub async fn ensure_cached(&self, kind: ResourceKind) -> Result<(), ResolveError> {
        match kind {
            ResourceKind::Server => self.servers().await.map(|_| ()),
            ResourceKind::Storage => self.storages().await.map(|_| ()),
            ResourceKind::Network => self.networks().await.map(|_| ()),
            ResourceKind::Router => self.routers().await.map(|_| ()),
        }
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    pub async fn resolve_one(
        &self,
        kind: ResourceKind,
        token: &str,
    ) -> Result<String, ResolveError> {
        self.ensure_cached(kind).await?;
        self.resolve_cached(kind, token)
    }

    /// Resolve every token in order. The first failure aborts the whole list.
    pub async fn resolve(
        &self,
        kind: ResourceKind,
        tokens: &[String],
    ) -> Result<Vec<String>, ResolveError> {
        self.ensure_cached(kind).await?;
        tokens
            .iter()
            .map(|token| self.resolve_cached(kind, token))
            .collect()
    }

    fn resolve_cached(&self, kind: ResourceKind, token: &str) -> Result<String, ResolveError> {
        match kind {
            ResourceKind::Server => self.servers.resolve(token),
            ResourceKind::Storage => self.storages.resolve(token),
            ResourceKind::Network => self.networks.resolve(token),
            ResourceKind::Router => self.routers.resolve(token),
        }
    }

    // =========================================================================
    // Cached lookups
    // =========================================================================

    pub fn cached_server(&self, uuid: &str) -> Result<&Server, ResolveError> {
        self.servers.get_cached_by_identifier(uuid)
    }

    pub fn cached_storage(&self, uuid: &str) -> Result<&Storage, ResolveError> {
        self.storages.get_cached_by_identifier(uuid)
    }

    pub fn cached_network(&self, uuid: &str) -> Result<&Network, ResolveError> {
        self.networks.get_cached_by_identifier(uuid)
    }

    pub fn cached_router(&self, uuid: &str) -> Result<&Router, ResolveError> {
        self.routers.get_cached_by_identifier(uuid)
    }
}
