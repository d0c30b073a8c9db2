//! Network commands
//!
//! `--ip-network` takes a comma separated `key=value` list, for example
//! `address=10.0.0.0/24,family=IPv4,dhcp=true,dhcp-dns="10.0.0.2,10.0.0.3"`.
//! A double-quoted value may contain commas.

use std::sync::Arc;

use async_trait::async_trait;

use crate::api::models::{IpNetwork, Network, YesNo};
use crate::api::request::{DeleteNetworkRequest, ModifyNetworkRequest};
use crate::api::CloudService;
use crate::error::{ApiError, BatchError};
use crate::executor::{BatchCommand, Risk};
use crate::resolver::ResourceKind;

fn invalid(message: impl Into<String>) -> BatchError {
    BatchError::Validation(message.into())
}

/// Split on commas outside double quotes, dropping the quotes
fn split_fields(input: &str) -> Result<Vec<String>, BatchError> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for c in input.chars() {
        match c {
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    if quoted {
        return Err(invalid(format!("unterminated quote in '{input}'")));
    }
    fields.push(current);

    Ok(fields
        .into_iter()
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect())
}

fn parse_bool(key: &str, value: &str) -> Result<YesNo, BatchError> {
    match value {
        "true" => Ok(YesNo::Yes),
        "false" => Ok(YesNo::No),
        other => Err(invalid(format!(
            "'{other}' is an invalid value for {key}, it can be true or false"
        ))),
    }
}

/// Parse one `--ip-network` value
pub fn parse_ip_network(input: &str) -> Result<IpNetwork, BatchError> {
    let fields = split_fields(input)?;
    if fields.is_empty() {
        return Err(invalid("ip network definition is empty"));
    }

    let mut network = IpNetwork::default();
    for field in fields {
        let (key, value) = field
            .split_once('=')
            .ok_or_else(|| invalid(format!("'{field}' is not in key=value form")))?;
        let (key, value) = (key.trim(), value.trim());
        match key {
            "address" => network.address = Some(value.to_string()),
            "family" => network.family = Some(value.to_string()),
            "gateway" => network.gateway = Some(value.to_string()),
            "dhcp" => network.dhcp = Some(parse_bool(key, value)?),
            "dhcp-default-route" => network.dhcp_default_route = Some(parse_bool(key, value)?),
            "dhcp-dns" => network.dhcp_dns.extend(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from),
            ),
            other => return Err(invalid(format!("unknown ip network key '{other}'"))),
        }
    }
    Ok(network)
}

pub struct ModifyNetwork {
    service: Arc<dyn CloudService>,
    name: Option<String>,
    ip_networks: Vec<IpNetwork>,
}

impl ModifyNetwork {
    pub fn new(
        service: Arc<dyn CloudService>,
        name: Option<String>,
        ip_networks: &[String],
    ) -> Result<Self, BatchError> {
        let name = name.filter(|n| !n.trim().is_empty());
        let ip_networks = ip_networks
            .iter()
            .map(|raw| parse_ip_network(raw))
            .collect::<Result<Vec<_>, _>>()?;
        if name.is_none() && ip_networks.is_empty() {
            return Err(invalid("nothing to modify: give --name or --ip-network"));
        }
        Ok(Self {
            service,
            name,
            ip_networks,
        })
    }
}

#[async_trait]
impl BatchCommand for ModifyNetwork {
    type Request = ModifyNetworkRequest;
    type Output = Network;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Network
    }

    fn describe(&self, uuid: &str) -> String {
        format!("Modifying network {uuid}")
    }

    fn build_request(&self, uuid: &str) -> ModifyNetworkRequest {
        ModifyNetworkRequest {
            uuid: uuid.to_string(),
            name: self.name.clone(),
            ip_networks: self.ip_networks.clone(),
        }
    }

    async fn execute(&self, request: ModifyNetworkRequest) -> Result<Network, ApiError> {
        self.service.modify_network(&request).await
    }
}

pub struct DeleteNetwork {
    service: Arc<dyn CloudService>,
}

impl DeleteNetwork {
    pub fn new(service: Arc<dyn CloudService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl BatchCommand for DeleteNetwork {
    type Request = DeleteNetworkRequest;
    type Output = ();

    fn kind(&self) -> ResourceKind {
        ResourceKind::Network
    }

    fn describe(&self, uuid: &str) -> String {
        format!("Deleting network {uuid}")
    }

    fn build_request(&self, uuid: &str) -> DeleteNetworkRequest {
        DeleteNetworkRequest {
            uuid: uuid.to_string(),
        }
    }

    async fn execute(&self, request: DeleteNetworkRequest) -> Result<(), ApiError> {
        self.service.delete_network(&request).await
    }

    fn risk(&self) -> Risk {
        Risk::High
    }
}
