use super::error::{CfResult, CloudFoundryError};
use super::model::{
    ApiInfo, AppEntity, AppEnvBody, AppSummaryBody, ApplicationDetail, ApplicationEnvironment,
    ApplicationSummary, NamedEntity, Page, Resource, Route, RouteEntity, ServiceInstance,
    ServiceInstanceEntity, SpaceDetail,
};
use super::CloudFoundryApi;
use crate::infrastructure::config::Config;
use crate::infrastructure::uaa::UaaSession;
use async_trait::async_trait;
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use tokio::sync::OnceCell;
use uuid::Uuid;

/// v2 maximum; listings are read as a single page
const RESULTS_PER_PAGE: u32 = 100;
const DEFAULT_SSH_CLIENT_ID: &str = "ssh-proxy";
const USER_AGENT: &str = concat!("cf-driver/", env!("CARGO_PKG_VERSION"));

/// reqwest-backed [`CloudFoundryApi`] for the CF v2 REST API
pub struct CloudFoundryClient {
    api_url: String,
    organization: String,
    space: String,
    http_client: reqwest::Client,
    no_redirect_client: reqwest::Client,
    info: ApiInfo,
    session: Arc<UaaSession>,
    organization_id: OnceCell<Uuid>,
    space_id: OnceCell<Uuid>,
}

impl CloudFoundryClient {
    pub fn new(
        config: &Config,
        http_client: reqwest::Client,
        info: ApiInfo,
        session: Arc<UaaSession>,
    ) -> CfResult<Self> {
        let no_redirect_client = Self::builder(config)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            api_url: config.api_url.clone(),
            organization: config.organization.clone(),
            space: config.space.clone(),
            http_client,
            no_redirect_client,
            info,
            session,
            organization_id: OnceCell::new(),
            space_id: OnceCell::new(),
        })
    }

    /// Shared HTTP client honouring the TLS and timeout settings
    pub fn http_client(config: &Config) -> CfResult<reqwest::Client> {
        Ok(Self::builder(config).build()?)
    }

    fn builder(config: &Config) -> reqwest::ClientBuilder {
        reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.http_timeout())
            .danger_accept_invalid_certs(config.skip_ssl_validation)
    }

    /// Discover the UAA endpoints. Needs no authentication.
    pub async fn fetch_info(http_client: &reqwest::Client, api_url: &str) -> CfResult<ApiInfo> {
        let path = "/v2/info";
        let response = http_client
            .get(format!("{}{}", api_url, path))
            .header("Accept", "application/json")
            .send()
            .await?;
        let response = check_status(Method::GET, path, response).await?;
        let info: ApiInfo = response
            .json()
            .await
            .map_err(|e| CloudFoundryError::Decode(e.to_string()))?;

        tracing::debug!(
            token_endpoint = %info.token_endpoint,
            api_version = info.api_version.as_deref().unwrap_or("unknown"),
            "CF API info loaded"
        );
        Ok(info)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&JsonValue>,
    ) -> CfResult<reqwest::Response> {
        let mut renewed = false;
        loop {
            let token = self.session.access_token().await?;
            let mut request = self
                .http_client
                .request(method.clone(), format!("{}{}", self.api_url, path))
                .bearer_auth(&token)
                .header("Accept", "application/json");
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await?;
            if response.status() == StatusCode::UNAUTHORIZED && !renewed {
                tracing::debug!(path = %path, "Access token rejected, renewing");
                self.session.invalidate().await;
                renewed = true;
                continue;
            }
            return check_status(method, path, response).await;
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> CfResult<T> {
        decode(self.send(Method::GET, path, None).await?).await
    }

    async fn list<T: DeserializeOwned>(&self, path: &str) -> CfResult<Vec<Resource<T>>> {
        let separator = if path.contains('?') { '&' } else { '?' };
        let path = format!("{}{}results-per-page={}", path, separator, RESULTS_PER_PAGE);
        let page: Page<T> = self.get_json(&path).await?;

        if page.next_url.is_some() {
            tracing::warn!(
                path = %path,
                total_results = page.total_results,
                returned = page.resources.len(),
                "Listing truncated to the first page"
            );
        }
        Ok(page.resources)
    }

    async fn organization_id(&self) -> CfResult<Uuid> {
        self.organization_id
            .get_or_try_init(|| async {
                let path = format!("/v2/organizations?q={}", name_filter(&self.organization));
                self.list::<NamedEntity>(&path)
                    .await?
                    .into_iter()
                    .next()
                    .map(|org| org.metadata.guid)
                    .ok_or_else(|| CloudFoundryError::not_found("organization", &self.organization))
            })
            .await
            .copied()
    }

    async fn find_space(&self, name: &str) -> CfResult<Resource<NamedEntity>> {
        let org_id = self.organization_id().await?;
        let path = format!(
            "/v2/organizations/{}/spaces?q={}",
            org_id,
            name_filter(name)
        );
        self.list::<NamedEntity>(&path)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CloudFoundryError::not_found("space", name))
    }

    async fn space_id(&self) -> CfResult<Uuid> {
        self.space_id
            .get_or_try_init(|| async {
                self.find_space(&self.space)
                    .await
                    .map(|space| space.metadata.guid)
            })
            .await
            .copied()
    }

    async fn find_application(&self, name: &str) -> CfResult<Uuid> {
        let space_id = self.space_id().await?;
        let path = format!("/v2/spaces/{}/apps?q={}", space_id, name_filter(name));
        self.list::<NamedEntity>(&path)
            .await?
            .into_iter()
            .next()
            .map(|app| app.metadata.guid)
            .ok_or_else(|| CloudFoundryError::not_found("application", name))
    }

    async fn set_state(&self, app_id: Uuid, state: &str) -> CfResult<()> {
        let path = format!("/v2/apps/{}", app_id);
        self.send(Method::PUT, &path, Some(&json!({ "state": state })))
            .await?;
        Ok(())
    }

    async fn user_environment(
        &self,
        app_id: Uuid,
    ) -> CfResult<serde_json::Map<String, JsonValue>> {
        let env: AppEnvBody = self.get_json(&format!("/v2/apps/{}/env", app_id)).await?;
        Ok(env.environment_json.into_iter().collect())
    }

    async fn put_user_environment(
        &self,
        app_id: Uuid,
        environment: serde_json::Map<String, JsonValue>,
    ) -> CfResult<()> {
        let path = format!("/v2/apps/{}", app_id);
        self.send(
            Method::PUT,
            &path,
            Some(&json!({ "environment_json": environment })),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl CloudFoundryApi for CloudFoundryClient {
    async fn list_applications(&self) -> CfResult<Vec<ApplicationSummary>> {
        let space_id = self.space_id().await?;
        let apps = self
            .list::<AppEntity>(&format!("/v2/spaces/{}/apps", space_id))
            .await?;
        Ok(apps.into_iter().map(ApplicationSummary::from).collect())
    }

    async fn get_application(&self, name: &str) -> CfResult<ApplicationDetail> {
        let app_id = self.find_application(name).await?;
        let summary: AppSummaryBody = self
            .get_json(&format!("/v2/apps/{}/summary", app_id))
            .await?;
        Ok(summary.into())
    }

    async fn create_application(&self, space_id: Uuid, name: &str) -> CfResult<Uuid> {
        let body = json!({ "name": name, "space_guid": space_id });
        let created: Resource<NamedEntity> =
            decode(self.send(Method::POST, "/v2/apps", Some(&body)).await?).await?;
        tracing::info!(app = %created.entity.name, app_id = %created.metadata.guid, "Application created");
        Ok(created.metadata.guid)
    }

    async fn update_application(&self, app_id: Uuid) -> CfResult<()> {
        self.send(Method::PUT, &format!("/v2/apps/{}", app_id), Some(&json!({})))
            .await?;
        Ok(())
    }

    async fn delete_application(&self, name: &str) -> CfResult<()> {
        let app_id = self.find_application(name).await?;
        self.send(
            Method::DELETE,
            &format!("/v2/apps/{}?recursive=true", app_id),
            None,
        )
        .await?;
        Ok(())
    }

    async fn start_application(&self, name: &str) -> CfResult<()> {
        let app_id = self.find_application(name).await?;
        self.set_state(app_id, "STARTED").await
    }

    async fn restart_application(&self, name: &str) -> CfResult<()> {
        let app_id = self.find_application(name).await?;
        self.set_state(app_id, "STOPPED").await?;
        self.set_state(app_id, "STARTED").await
    }

    async fn get_environment(&self, name: &str) -> CfResult<ApplicationEnvironment> {
        let app_id = self.find_application(name).await?;
        let env: AppEnvBody = self.get_json(&format!("/v2/apps/{}/env", app_id)).await?;
        Ok(env.into())
    }

    async fn set_environment_variable(&self, name: &str, key: &str, value: &str) -> CfResult<()> {
        let app_id = self.find_application(name).await?;
        let mut environment = self.user_environment(app_id).await?;
        environment.insert(key.to_string(), JsonValue::String(value.to_string()));
        self.put_user_environment(app_id, environment).await
    }

    async fn unset_environment_variable(&self, name: &str, key: &str) -> CfResult<()> {
        let app_id = self.find_application(name).await?;
        let mut environment = self.user_environment(app_id).await?;
        if environment.remove(key).is_none() {
            tracing::debug!(app = %name, key = %key, "Variable not set, nothing to remove");
            return Ok(());
        }
        self.put_user_environment(app_id, environment).await
    }

    async fn list_routes(&self) -> CfResult<Vec<Route>> {
        let space_id = self.space_id().await?;
        let routes = self
            .list::<RouteEntity>(&format!(
                "/v2/spaces/{}/routes?inline-relations-depth=1",
                space_id
            ))
            .await?;
        Ok(routes.into_iter().map(Route::from).collect())
    }

    async fn list_service_instances(&self) -> CfResult<Vec<ServiceInstance>> {
        let space_id = self.space_id().await?;
        let instances = self
            .list::<ServiceInstanceEntity>(&format!(
                "/v2/spaces/{}/service_instances",
                space_id
            ))
            .await?;
        Ok(instances.into_iter().map(ServiceInstance::from).collect())
    }

    async fn get_space(&self, name: &str) -> CfResult<SpaceDetail> {
        let space = self.find_space(name).await?;
        Ok(SpaceDetail {
            id: space.metadata.guid,
            name: space.entity.name,
            organization: self.organization.clone(),
        })
    }

    async fn ssh_code(&self) -> CfResult<String> {
        let client_id = self
            .info
            .app_ssh_oauth_client
            .as_deref()
            .unwrap_or(DEFAULT_SSH_CLIENT_ID);
        let base = self.info.authorization_endpoint.trim_end_matches('/');
        let path = "/oauth/authorize";
        let token = self.session.access_token().await?;

        let response = self
            .no_redirect_client
            .get(format!("{}{}", base, path))
            .query(&[
                ("response_type", "code"),
                ("grant_type", "authorization_code"),
                ("client_id", client_id),
            ])
            .bearer_auth(&token)
            .send()
            .await?;

        if !response.status().is_redirection() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CloudFoundryError::Status {
                method: Method::GET.to_string(),
                path: path.to_string(),
                status,
                body,
            });
        }

        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| CloudFoundryError::Decode("redirect without Location".to_string()))?;
        extract_code(base, location)
    }
}

fn name_filter(name: &str) -> String {
    urlencoding::encode(&format!("name:{}", name)).into_owned()
}

fn extract_code(base: &str, location: &str) -> CfResult<String> {
    let url = Url::parse(location)
        .or_else(|_| Url::parse(base).and_then(|b| b.join(location)))
        .map_err(|e| CloudFoundryError::Decode(format!("bad redirect location: {}", e)))?;

    url.query_pairs()
        .find(|(k, _)| k == "code")
        .map(|(_, v)| v.into_owned())
        .filter(|code| !code.is_empty())
        .ok_or_else(|| CloudFoundryError::Decode("redirect carried no code".to_string()))
}

async fn check_status(
    method: Method,
    path: &str,
    response: reqwest::Response,
) -> CfResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    tracing::debug!(method = %method, path = %path, status = status.as_u16(), "CF API call failed");
    Err(CloudFoundryError::Status {
        method: method.to_string(),
        path: path.to_string(),
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> CfResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| CloudFoundryError::Decode(e.to_string()))
}
