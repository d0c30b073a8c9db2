//! upctl - UpCloud command line client
//!
//! Resolves servers, storages, networks and routers from UUIDs or names and
//! applies actions to them in batches, optionally waiting for each resource
//! to settle.

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod executor;
pub mod livelog;
pub mod output;
pub mod resolver;
pub mod waiter;
