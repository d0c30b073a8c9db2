//! Argument resolution
//!
//! Turns user supplied tokens (UUIDs, titles, names) into canonical UUIDs.
//! Each resource kind has one [`CachingProvider`] that lists the collection
//! once per invocation; the [`ResolverRegistry`] owns all of them.

mod matcher;
mod provider;
mod registry;

pub use matcher::{match_name, match_resource, match_uuid, MatchReason, ResolvedMatch};
pub use provider::CachingProvider;
pub use registry::ResolverRegistry;

use std::fmt;

/// Kind of remote resource a token refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Server,
    Storage,
    Network,
    Router,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::Storage => "storage",
            Self::Network => "network",
            Self::Router => "router",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record that can be matched against user tokens
pub trait Resource: Clone + Send + Sync + 'static {
    const KIND: ResourceKind;

    fn uuid(&self) -> &str;

    /// Human readable names the record answers to
    fn names(&self) -> Vec<&str>;
}
