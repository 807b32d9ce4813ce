use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Endpoints advertised by `GET /v2/info`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiInfo {
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    #[serde(default)]
    pub app_ssh_oauth_client: Option<String>,
    #[serde(default)]
    pub api_version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApplicationSummary {
    pub id: Uuid,
    pub name: String,
    pub state: String,
    pub instances: u32,
    pub memory_mb: u64,
    pub disk_quota_mb: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApplicationDetail {
    pub id: Uuid,
    pub name: String,
    pub state: String,
    pub instances: u32,
    pub running_instances: u32,
    pub memory_mb: u64,
    pub disk_quota_mb: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buildpack: Option<String>,
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApplicationEnvironment {
    pub user_provided: BTreeMap<String, JsonValue>,
    pub system_provided: JsonValue,
    pub application: JsonValue,
    pub running: JsonValue,
    pub staging: JsonValue,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Route {
    pub id: Uuid,
    pub host: String,
    pub domain: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub path: String,
    pub applications: Vec<String>,
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.host.is_empty() {
            write!(f, "{}{}", self.domain, self.path)?;
        } else {
            write!(f, "{}.{}{}", self.host, self.domain, self.path)?;
        }
        if !self.applications.is_empty() {
            write!(f, " -> {}", self.applications.join(", "))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceInstance {
    pub id: Uuid,
    pub name: String,
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpaceDetail {
    pub id: Uuid,
    pub name: String,
    pub organization: String,
}

/// Envelope shared by every v2 resource: `{ metadata: { guid }, entity }`
#[derive(Debug, Deserialize)]
pub(crate) struct Resource<T> {
    pub metadata: Metadata,
    pub entity: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Metadata {
    pub guid: Uuid,
}

/// One page of a v2 listing
#[derive(Debug, Deserialize)]
pub(crate) struct Page<T> {
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub next_url: Option<String>,
    pub resources: Vec<Resource<T>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NamedEntity {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AppEntity {
    pub name: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub instances: u32,
    #[serde(default)]
    pub memory: u64,
    #[serde(default)]
    pub disk_quota: u64,
}

impl From<Resource<AppEntity>> for ApplicationSummary {
    fn from(resource: Resource<AppEntity>) -> Self {
        Self {
            id: resource.metadata.guid,
            name: resource.entity.name,
            state: resource.entity.state,
            instances: resource.entity.instances,
            memory_mb: resource.entity.memory,
            disk_quota_mb: resource.entity.disk_quota,
        }
    }
}

/// Body of `GET /v2/apps/:guid/summary`
#[derive(Debug, Deserialize)]
pub(crate) struct AppSummaryBody {
    pub guid: Uuid,
    pub name: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub instances: u32,
    #[serde(default)]
    pub running_instances: Option<u32>,
    #[serde(default)]
    pub memory: u64,
    #[serde(default)]
    pub disk_quota: u64,
    #[serde(default)]
    pub buildpack: Option<String>,
    #[serde(default)]
    pub detected_buildpack: Option<String>,
    #[serde(default)]
    pub routes: Vec<SummaryRoute>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SummaryRoute {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub path: String,
    pub domain: NamedEntity,
}

impl From<AppSummaryBody> for ApplicationDetail {
    fn from(body: AppSummaryBody) -> Self {
        let urls = body
            .routes
            .iter()
            .map(|route| {
                if route.host.is_empty() {
                    format!("{}{}", route.domain.name, route.path)
                } else {
                    format!("{}.{}{}", route.host, route.domain.name, route.path)
                }
            })
            .collect();

        Self {
            id: body.guid,
            name: body.name,
            state: body.state,
            instances: body.instances,
            running_instances: body.running_instances.unwrap_or(0),
            memory_mb: body.memory,
            disk_quota_mb: body.disk_quota,
            buildpack: body
                .buildpack
                .filter(|b| !b.is_empty())
                .or(body.detected_buildpack.filter(|b| !b.is_empty())),
            urls,
        }
    }
}

/// Body of `GET /v2/apps/:guid/env`
#[derive(Debug, Deserialize)]
pub(crate) struct AppEnvBody {
    #[serde(default)]
    pub environment_json: BTreeMap<String, JsonValue>,
    #[serde(default)]
    pub system_env_json: JsonValue,
    #[serde(default)]
    pub application_env_json: JsonValue,
    #[serde(default)]
    pub running_env_json: JsonValue,
    #[serde(default)]
    pub staging_env_json: JsonValue,
}

impl From<AppEnvBody> for ApplicationEnvironment {
    fn from(body: AppEnvBody) -> Self {
        Self {
            user_provided: body.environment_json,
            system_provided: body.system_env_json,
            application: body.application_env_json,
            running: body.running_env_json,
            staging: body.staging_env_json,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RouteEntity {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub domain: Option<Resource<NamedEntity>>,
    #[serde(default)]
    pub apps: Vec<Resource<NamedEntity>>,
}

impl From<Resource<RouteEntity>> for Route {
    fn from(resource: Resource<RouteEntity>) -> Self {
        Self {
            id: resource.metadata.guid,
            host: resource.entity.host,
            domain: resource
                .entity
                .domain
                .map(|d| d.entity.name)
                .unwrap_or_default(),
            path: resource.entity.path,
            applications: resource
                .entity
                .apps
                .into_iter()
                .map(|app| app.entity.name)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ServiceInstanceEntity {
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

impl From<Resource<ServiceInstanceEntity>> for ServiceInstance {
    fn from(resource: Resource<ServiceInstanceEntity>) -> Self {
        Self {
            id: resource.metadata.guid,
            name: resource.entity.name,
            kind: resource.entity.kind,
        }
    }
}
