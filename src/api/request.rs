//! Mutation requests
//!
//! One concrete type per remote action. Each is built from a resolved UUID
//! plus flag values right before the call is made.

use serde::Serialize;

use super::models::IpNetwork;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StopType {
    #[default]
    Soft,
    Hard,
}

/// What the API does with a server that ignores a soft stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TimeoutAction {
    #[default]
    Ignore,
    Destroy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartServerRequest {
    pub uuid: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopServerRequest {
    pub uuid: String,
    pub stop_type: StopType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartServerRequest {
    pub uuid: String,
    pub stop_type: StopType,
    pub timeout_action: TimeoutAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteServerRequest {
    pub uuid: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadCdromRequest {
    pub server_uuid: String,
    pub storage_uuid: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EjectCdromRequest {
    pub server_uuid: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyStorageRequest {
    pub uuid: String,
    pub title: Option<String>,
    pub size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteStorageRequest {
    pub uuid: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModifyNetworkRequest {
    pub uuid: String,
    pub name: Option<String>,
    pub ip_networks: Vec<IpNetwork>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteNetworkRequest {
    pub uuid: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyRouterRequest {
    pub uuid: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRouterRequest {
    pub uuid: String,
}
