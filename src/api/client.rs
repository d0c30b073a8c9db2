//! UpCloud Client
//!
//! Main client for the UpCloud API, combining URL building with the
//! HTTP layer and decoding responses into typed records.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use url::Url;

use super::http::{ApiHttpClient, Credentials};
use super::models::{Network, Router, Server, Storage};
use super::request::{
    DeleteNetworkRequest, DeleteRouterRequest, DeleteServerRequest, DeleteStorageRequest,
    EjectCdromRequest, LoadCdromRequest, ModifyNetworkRequest, ModifyRouterRequest,
    ModifyStorageRequest, RestartServerRequest, StartServerRequest, StopServerRequest,
};
use super::service::CloudService;
use crate::error::ApiError;

pub const DEFAULT_API_URL: &str = "https://api.upcloud.com/1.3/";

/// Main UpCloud client
#[derive(Clone)]
pub struct ApiClient {
    pub http: ApiHttpClient,
    base_url: Url,
}

impl ApiClient {
    /// Create a new client against `base_url` (must end with `/`)
    pub fn new(base_url: Url, credentials: Credentials) -> Result<Self, ApiError> {
        Ok(Self {
            http: ApiHttpClient::new(credentials)?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // =========================================================================
    // URL helpers
    // =========================================================================

    /// Build an API URL from a relative path
    pub fn url(&self, path: &str) -> Result<String, ApiError> {
        self.base_url
            .join(path)
            .map(String::from)
            .map_err(|e| ApiError::Transport(format!("invalid API URL for '{path}': {e}")))
    }

    /// Build the URL of one resource, optionally with a trailing action segment
    pub fn resource_url(
        &self,
        collection: &str,
        uuid: &str,
        action: Option<&str>,
    ) -> Result<String, ApiError> {
        let uuid = urlencoding::encode(uuid);
        match action {
            Some(action) => self.url(&format!("{collection}/{uuid}/{action}")),
            None => self.url(&format!("{collection}/{uuid}")),
        }
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

// List responses wrap the array twice: {"servers": {"server": [...]}}
#[derive(Deserialize)]
struct ServerList {
    servers: ServerItems,
}

#[derive(Deserialize)]
struct ServerItems {
    #[serde(default)]
    server: Vec<Server>,
}

#[derive(Deserialize)]
struct StorageList {
    storages: StorageItems,
}

#[derive(Deserialize)]
struct StorageItems {
    #[serde(default)]
    storage: Vec<Storage>,
}

#[derive(Deserialize)]
struct NetworkList {
    networks: NetworkItems,
}

#[derive(Deserialize)]
struct NetworkItems {
    #[serde(default)]
    network: Vec<Network>,
}

#[derive(Deserialize)]
struct RouterList {
    routers: RouterItems,
}

#[derive(Deserialize)]
struct RouterItems {
    #[serde(default)]
    router: Vec<Router>,
}

#[derive(Deserialize)]
struct ServerEnvelope {
    server: Server,
}

#[derive(Deserialize)]
struct StorageEnvelope {
    storage: Storage,
}

#[derive(Deserialize)]
struct NetworkEnvelope {
    network: Network,
}

#[derive(Deserialize)]
struct RouterEnvelope {
    router: Router,
}

#[async_trait]
impl CloudService for ApiClient {
    async fn list_servers(&self) -> Result<Vec<Server>, ApiError> {
        let response = self.http.get(&self.url("server")?).await?;
        Ok(decode::<ServerList>(response)?.servers.server)
    }

    async fn list_storages(&self) -> Result<Vec<Storage>, ApiError> {
        let response = self.http.get(&self.url("storage")?).await?;
        Ok(decode::<StorageList>(response)?.storages.storage)
    }

    async fn list_networks(&self) -> Result<Vec<Network>, ApiError> {
        let response = self.http.get(&self.url("network")?).await?;
        Ok(decode::<NetworkList>(response)?.networks.network)
    }

    async fn list_routers(&self) -> Result<Vec<Router>, ApiError> {
        let response = self.http.get(&self.url("router")?).await?;
        Ok(decode::<RouterList>(response)?.routers.router)
    }

    async fn get_server(&self, uuid: &str) -> Result<Server, ApiError> {
        let url = self.resource_url("server", uuid, None)?;
        Ok(decode::<ServerEnvelope>(self.http.get(&url).await?)?.server)
    }

    async fn get_storage(&self, uuid: &str) -> Result<Storage, ApiError> {
        let url = self.resource_url("storage", uuid, None)?;
        Ok(decode::<StorageEnvelope>(self.http.get(&url).await?)?.storage)
    }

    async fn start_server(&self, req: &StartServerRequest) -> Result<Server, ApiError> {
        let url = self.resource_url("server", &req.uuid, Some("start"))?;
        Ok(decode::<ServerEnvelope>(self.http.post(&url, None).await?)?.server)
    }

    async fn stop_server(&self, req: &StopServerRequest) -> Result<Server, ApiError> {
        let url = self.resource_url("server", &req.uuid, Some("stop"))?;
        let body = json!({ "stop_server": { "stop_type": req.stop_type } });
        Ok(decode::<ServerEnvelope>(self.http.post(&url, Some(&body)).await?)?.server)
    }

    async fn restart_server(&self, req: &RestartServerRequest) -> Result<Server, ApiError> {
        let url = self.resource_url("server", &req.uuid, Some("restart"))?;
        let body = json!({
            "restart_server": {
                "stop_type": req.stop_type,
                "timeout_action": req.timeout_action,
            }
        });
        Ok(decode::<ServerEnvelope>(self.http.post(&url, Some(&body)).await?)?.server)
    }

    async fn delete_server(&self, req: &DeleteServerRequest) -> Result<(), ApiError> {
        let url = self.resource_url("server", &req.uuid, None)?;
        self.http.delete(&url).await.map(|_| ())
    }

    async fn delete_server_and_storages(
        &self,
        req: &DeleteServerRequest,
    ) -> Result<(), ApiError> {
        let url = format!("{}?storages=1", self.resource_url("server", &req.uuid, None)?);
        self.http.delete(&url).await.map(|_| ())
    }

    async fn load_cdrom(&self, req: &LoadCdromRequest) -> Result<Server, ApiError> {
        let url = self.resource_url("server", &req.server_uuid, Some("cdrom/load"))?;
        let body = json!({ "storage_device": { "storage": req.storage_uuid } });
        Ok(decode::<ServerEnvelope>(self.http.post(&url, Some(&body)).await?)?.server)
    }

    async fn eject_cdrom(&self, req: &EjectCdromRequest) -> Result<Server, ApiError> {
        let url = self.resource_url("server", &req.server_uuid, Some("cdrom/eject"))?;
        Ok(decode::<ServerEnvelope>(self.http.post(&url, None).await?)?.server)
    }

    async fn modify_storage(&self, req: &ModifyStorageRequest) -> Result<Storage, ApiError> {
        let url = self.resource_url("storage", &req.uuid, None)?;
        let mut storage = Map::new();
        if let Some(title) = &req.title {
            storage.insert("title".to_string(), json!(title));
        }
        if let Some(size) = req.size {
            storage.insert("size".to_string(), json!(size));
        }
        let body = json!({ "storage": storage });
        Ok(decode::<StorageEnvelope>(self.http.put(&url, &body).await?)?.storage)
    }

    async fn delete_storage(&self, req: &DeleteStorageRequest) -> Result<(), ApiError> {
        let url = self.resource_url("storage", &req.uuid, None)?;
        self.http.delete(&url).await.map(|_| ())
    }

    async fn modify_network(&self, req: &ModifyNetworkRequest) -> Result<Network, ApiError> {
        let url = self.resource_url("network", &req.uuid, None)?;
        let mut network = Map::new();
        if let Some(name) = &req.name {
            network.insert("name".to_string(), json!(name));
        }
        if !req.ip_networks.is_empty() {
            network.insert(
                "ip_networks".to_string(),
                json!({ "ip_network": req.ip_networks }),
            );
        }
        let body = json!({ "network": network });
        Ok(decode::<NetworkEnvelope>(self.http.put(&url, &body).await?)?.network)
    }

    async fn delete_network(&self, req: &DeleteNetworkRequest) -> Result<(), ApiError> {
        let url = self.resource_url("network", &req.uuid, None)?;
        self.http.delete(&url).await.map(|_| ())
    }

    async fn modify_router(&self, req: &ModifyRouterRequest) -> Result<Router, ApiError> {
        let url = self.resource_url("router", &req.uuid, None)?;
        let body = json!({ "router": { "name": req.name } });
        Ok(decode::<RouterEnvelope>(self.http.patch(&url, &body).await?)?.router)
    }

    async fn delete_router(&self, req: &DeleteRouterRequest) -> Result<(), ApiError> {
        let url = self.resource_url("router", &req.uuid, None)?;
        self.http.delete(&url).await.map(|_| ())
    }
}
