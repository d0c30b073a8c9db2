//! Resource records returned by the UpCloud API
//!
//! Only the fields the CLI reads are modelled; everything else in the
//! response is ignored by serde.

use serde::{Deserialize, Serialize};

use crate::resolver::{Resource, ResourceKind};

pub const SERVER_STATE_STARTED: &str = "started";
pub const SERVER_STATE_STOPPED: &str = "stopped";
pub const SERVER_STATE_MAINTENANCE: &str = "maintenance";
pub const SERVER_STATE_ERROR: &str = "error";

pub const STORAGE_STATE_ONLINE: &str = "online";
pub const STORAGE_STATE_MAINTENANCE: &str = "maintenance";
pub const STORAGE_STATE_ERROR: &str = "error";

/// UpCloud encodes booleans as "yes"/"no"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YesNo {
    Yes,
    No,
}

impl From<bool> for YesNo {
    fn from(value: bool) -> Self {
        if value {
            Self::Yes
        } else {
            Self::No
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub uuid: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zone: String,
    #[serde(default)]
    pub plan: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Storage {
    pub uuid: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub access: String,
    #[serde(default, rename = "type")]
    pub storage_type: String,
    #[serde(default)]
    pub zone: String,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub tier: String,
}

/// One address block of a network
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IpNetwork {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dhcp: Option<YesNo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dhcp_default_route: Option<YesNo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dhcp_dns: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IpNetworks {
    #[serde(default)]
    pub ip_network: Vec<IpNetwork>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    pub uuid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub network_type: String,
    #[serde(default)]
    pub zone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub router: Option<String>,
    #[serde(default)]
    pub ip_networks: IpNetworks,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterNetwork {
    pub uuid: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttachedNetworks {
    #[serde(default)]
    pub network: Vec<RouterNetwork>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Router {
    pub uuid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub router_type: String,
    #[serde(default)]
    pub attached_networks: AttachedNetworks,
}

impl Resource for Server {
    const KIND: ResourceKind = ResourceKind::Server;

    fn uuid(&self) -> &str {
        &self.uuid
    }

    // Servers are addressable by both title and hostname
    fn names(&self) -> Vec<&str> {
        vec![self.title.as_str(), self.hostname.as_str()]
    }
}

impl Resource for Storage {
    const KIND: ResourceKind = ResourceKind::Storage;

    fn uuid(&self) -> &str {
        &self.uuid
    }

    fn names(&self) -> Vec<&str> {
        vec![self.title.as_str()]
    }
}

impl Resource for Network {
    const KIND: ResourceKind = ResourceKind::Network;

    fn uuid(&self) -> &str {
        &self.uuid
    }

    fn names(&self) -> Vec<&str> {
        vec![self.name.as_str()]
    }
}

impl Resource for Router {
    const KIND: ResourceKind = ResourceKind::Router;

    fn uuid(&self) -> &str {
        &self.uuid
    }

    fn names(&self) -> Vec<&str> {
        vec![self.name.as_str()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_server_deserializes_with_missing_fields() {
        let server: Server = serde_json::from_value(json!({
            "uuid": "00798b85-efdc-41ca-8021-f6ef457b8531",
            "title": "web-1",
            "state": "started",
            "core_number": "1"
        }))
        .unwrap();
        assert_eq!(server.title, "web-1");
        assert_eq!(server.hostname, "");
        assert_eq!(server.state, "started");
    }

    #[test]
    fn test_ip_network_serializes_yes_no() {
        let net = IpNetwork {
            dhcp: Some(true.into()),
            dhcp_default_route: Some(false.into()),
            ..Default::default()
        };
        let value = serde_json::to_value(&net).unwrap();
        assert_eq!(value, json!({"dhcp": "yes", "dhcp_default_route": "no"}));
    }

    #[test]
    fn test_network_answers_to_its_name() {
        let network: Network = serde_json::from_value(json!({
            "uuid": "03e4970d-7791-4b80-a892-682ae0faf46b",
            "name": "private-net"
        }))
        .unwrap();
        assert_eq!(network.uuid(), "03e4970d-7791-4b80-a892-682ae0faf46b");
        assert_eq!(network.names(), vec!["private-net"]);
    }
}
