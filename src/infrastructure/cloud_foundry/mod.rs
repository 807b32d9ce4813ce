pub mod client;
pub mod error;
pub mod model;

pub use client::CloudFoundryClient;
pub use error::{CfResult, CloudFoundryError};
pub use model::{
    ApiInfo, ApplicationDetail, ApplicationEnvironment, ApplicationSummary, Route,
    ServiceInstance, SpaceDetail,
};

use async_trait::async_trait;
use uuid::Uuid;

/// Operations the driver needs from the Cloud Foundry API.
///
/// Every call is scoped to the organization and space the implementation
/// was configured with. Implementations make no ordering promises between
/// calls; callers that mutate the same application must sequence them.
#[async_trait]
pub trait CloudFoundryApi: Send + Sync {
    async fn list_applications(&self) -> CfResult<Vec<ApplicationSummary>>;

    /// Fails with [`CloudFoundryError::NotFound`] when no app has this name
    async fn get_application(&self, name: &str) -> CfResult<ApplicationDetail>;

    async fn create_application(&self, space_id: Uuid, name: &str) -> CfResult<Uuid>;

    /// Touch the application record, as a push of an existing app does
    async fn update_application(&self, app_id: Uuid) -> CfResult<()>;

    async fn delete_application(&self, name: &str) -> CfResult<()>;

    async fn start_application(&self, name: &str) -> CfResult<()>;

    async fn restart_application(&self, name: &str) -> CfResult<()>;

    async fn get_environment(&self, name: &str) -> CfResult<ApplicationEnvironment>;

    /// Read-modify-write of the app's user-provided environment. Not safe to
    /// run concurrently for the same app.
    async fn set_environment_variable(&self, name: &str, key: &str, value: &str) -> CfResult<()>;

    /// Same read-modify-write caveat as [`set_environment_variable`](Self::set_environment_variable)
    async fn unset_environment_variable(&self, name: &str, key: &str) -> CfResult<()>;

    async fn list_routes(&self) -> CfResult<Vec<Route>>;

    async fn list_service_instances(&self) -> CfResult<Vec<ServiceInstance>>;

    async fn get_space(&self, name: &str) -> CfResult<SpaceDetail>;

    /// One-time code for `ssh` authentication against app containers
    async fn ssh_code(&self) -> CfResult<String>;
}
