//! Per-kind cached collections
//!
//! A provider lists its collection at most once per invocation. Population
//! goes through [`OnceCell::get_or_try_init`], so concurrent first callers
//! share a single fetch and a failed fetch leaves the cell empty for the
//! next caller to retry.

use std::future::Future;

use tokio::sync::OnceCell;

use super::matcher::match_resource;
use super::Resource;
use crate::error::{ApiError, ResolveError};

pub struct CachingProvider<R> {
    cache: OnceCell<Vec<R>>,
}

impl<R: Resource> Default for CachingProvider<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Resource> CachingProvider<R> {
    pub fn new() -> Self {
        Self {
            cache: OnceCell::new(),
        }
    }

    /// Return the collection, fetching it on first use
    pub async fn get<F, Fut>(&self, fetch: F) -> Result<&[R], ResolveError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<R>, ApiError>>,
    {
        self.cache
            .get_or_try_init(|| async {
                tracing::debug!("Listing {}s", R::KIND);
                let items = fetch().await.map_err(|source| ResolveError::Fetch {
                    kind: R::KIND,
                    source,
                })?;
                tracing::debug!("Cached {} {}s", items.len(), R::KIND);
                Ok(items)
            })
            .await
            .map(Vec::as_slice)
    }

    /// The collection if it has been fetched
    pub fn cached(&self) -> Option<&[R]> {
        self.cache.get().map(Vec::as_slice)
    }

    /// Resolve a token against the cached collection
    pub fn resolve(&self, token: &str) -> Result<String, ResolveError> {
        let items = self
            .cached()
            .ok_or(ResolveError::NotCached { kind: R::KIND })?;
        match_resource(token, items).get_only()
    }

    pub fn get_cached_by_identifier(&self, uuid: &str) -> Result<&R, ResolveError> {
        self.cached()
            .ok_or(ResolveError::NotCached { kind: R::KIND })?
            .iter()
            .find(|item| item.uuid() == uuid)
            .ok_or_else(|| ResolveError::NotFound {
                token: uuid.to_string(),
            })
    }
}
