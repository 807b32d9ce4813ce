use super::error::ApplicationServiceError;
use super::PushOutcome;
use crate::domain::tasks::TaskChain;
use crate::infrastructure::cloud_foundry::{
    ApplicationDetail, ApplicationEnvironment, CloudFoundryApi, CloudFoundryError, Route,
    ServiceInstance, SpaceDetail,
};
use async_trait::async_trait;
use futures::{future, stream, StreamExt};
use std::sync::Arc;

pub struct ApplicationService {
    cf: Arc<dyn CloudFoundryApi>,
    space: String,
    detail_concurrency: usize,
}

impl ApplicationService {
    pub fn new(cf: Arc<dyn CloudFoundryApi>, space: String, detail_concurrency: usize) -> Self {
        Self {
            cf,
            space,
            detail_concurrency: detail_concurrency.max(1),
        }
    }
}

#[async_trait]
pub trait ApplicationServiceApi: Send + Sync {
    /// List every application in the space together with its detail.
    ///
    /// Details are fetched concurrently. An app whose detail cannot be
    /// fetched is logged and left out; the listing itself still completes.
    async fn list_applications_with_details(
        &self,
    ) -> Result<Vec<ApplicationDetail>, ApplicationServiceError>;

    async fn get_application(&self, name: &str)
        -> Result<ApplicationDetail, ApplicationServiceError>;

    /// Create-or-update the application record, then (re)start it
    async fn push(&self, name: &str) -> Result<PushOutcome, ApplicationServiceError>;

    async fn delete(&self, name: &str) -> Result<(), ApplicationServiceError>;

    async fn start(&self, name: &str) -> Result<(), ApplicationServiceError>;

    async fn restart(&self, name: &str) -> Result<(), ApplicationServiceError>;

    async fn get_environment(
        &self,
        name: &str,
    ) -> Result<ApplicationEnvironment, ApplicationServiceError>;

    /// Set variables one at a time in the given order, stopping at the
    /// first failure
    async fn set_environment(
        &self,
        name: &str,
        variables: Vec<(String, String)>,
    ) -> Result<(), ApplicationServiceError>;

    /// Unset variables one at a time in the given order, stopping at the
    /// first failure
    async fn unset_environment(
        &self,
        name: &str,
        keys: Vec<String>,
    ) -> Result<(), ApplicationServiceError>;

    async fn list_routes(&self) -> Result<Vec<Route>, ApplicationServiceError>;

    async fn list_service_instances(&self)
        -> Result<Vec<ServiceInstance>, ApplicationServiceError>;

    async fn get_space(&self) -> Result<SpaceDetail, ApplicationServiceError>;

    async fn ssh_code(&self) -> Result<String, ApplicationServiceError>;
}

#[async_trait]
impl ApplicationServiceApi for ApplicationService {
    async fn list_applications_with_details(
        &self,
    ) -> Result<Vec<ApplicationDetail>, ApplicationServiceError> {
        let summaries = self.cf.list_applications().await?;
        let total = summaries.len();

        let details: Vec<ApplicationDetail> = stream::iter(summaries)
            .map(|summary| {
                let cf = self.cf.clone();
                async move {
                    match cf.get_application(&summary.name).await {
                        Ok(detail) => Some(detail),
                        Err(e) => {
                            tracing::warn!(
                                app = %summary.name,
                                error = %e,
                                "Error getting details for app, skipping"
                            );
                            None
                        }
                    }
                }
            })
            .buffered(self.detail_concurrency)
            .filter_map(future::ready)
            .collect::<Vec<_>>()
            .await;

        tracing::info!(
            total,
            fetched = details.len(),
            skipped = total - details.len(),
            "Application listing complete"
        );
        Ok(details)
    }

    async fn get_application(
        &self,
        name: &str,
    ) -> Result<ApplicationDetail, ApplicationServiceError> {
        Ok(self.cf.get_application(name).await?)
    }

    async fn push(&self, name: &str) -> Result<PushOutcome, ApplicationServiceError> {
        self.validate_name(name)?;

        match self.find_existing(name).await {
            Some(app) => {
                tracing::info!(app = %name, app_id = %app.id, "Pushing existing application");
                self.cf.update_application(app.id).await?;
                self.cf.get_application(name).await?;
                self.cf.restart_application(name).await?;
                Ok(PushOutcome::Updated(app.id))
            }
            None => {
                tracing::info!(app = %name, space = %self.space, "First push of application");
                let space = self.cf.get_space(&self.space).await?;
                let app_id = self.cf.create_application(space.id, name).await?;
                self.cf.get_application(name).await?;
                self.cf.start_application(name).await?;
                Ok(PushOutcome::Created(app_id))
            }
        }
    }

    async fn delete(&self, name: &str) -> Result<(), ApplicationServiceError> {
        self.cf.delete_application(name).await?;
        tracing::info!(app = %name, "Application deleted");
        Ok(())
    }

    async fn start(&self, name: &str) -> Result<(), ApplicationServiceError> {
        self.cf.start_application(name).await?;
        tracing::info!(app = %name, "Application started");
        Ok(())
    }

    async fn restart(&self, name: &str) -> Result<(), ApplicationServiceError> {
        self.cf.restart_application(name).await?;
        tracing::info!(app = %name, "Application restarted");
        Ok(())
    }

    async fn get_environment(
        &self,
        name: &str,
    ) -> Result<ApplicationEnvironment, ApplicationServiceError> {
        Ok(self.cf.get_environment(name).await?)
    }

    async fn set_environment(
        &self,
        name: &str,
        variables: Vec<(String, String)>,
    ) -> Result<(), ApplicationServiceError> {
        self.validate_name(name)?;
        for (key, _) in &variables {
            self.validate_key(key)?;
        }

        let mut chain: TaskChain<'static, CloudFoundryError> = TaskChain::new();
        for (key, value) in variables {
            let cf = self.cf.clone();
            let app = name.to_string();
            chain.push(format!("set {}", key), move || async move {
                cf.set_environment_variable(&app, &key, &value).await?;
                tracing::info!(app = %app, key = %key, "Environment variable set");
                Ok::<(), CloudFoundryError>(())
            });
        }

        let count = chain.len();
        chain.run().await?;
        tracing::info!(app = %name, count, "Environment updated");
        Ok(())
    }

    async fn unset_environment(
        &self,
        name: &str,
        keys: Vec<String>,
    ) -> Result<(), ApplicationServiceError> {
        self.validate_name(name)?;
        for key in &keys {
            self.validate_key(key)?;
        }

        let mut chain: TaskChain<'static, CloudFoundryError> = TaskChain::new();
        for key in keys {
            let cf = self.cf.clone();
            let app = name.to_string();
            chain.push(format!("unset {}", key), move || async move {
                cf.unset_environment_variable(&app, &key).await?;
                tracing::info!(app = %app, key = %key, "Environment variable unset");
                Ok::<(), CloudFoundryError>(())
            });
        }

        let count = chain.len();
        chain.run().await?;
        tracing::info!(app = %name, count, "Environment updated");
        Ok(())
    }

    async fn list_routes(&self) -> Result<Vec<Route>, ApplicationServiceError> {
        Ok(self.cf.list_routes().await?)
    }

    async fn list_service_instances(
        &self,
    ) -> Result<Vec<ServiceInstance>, ApplicationServiceError> {
        Ok(self.cf.list_service_instances().await?)
    }

    async fn get_space(&self) -> Result<SpaceDetail, ApplicationServiceError> {
        Ok(self.cf.get_space(&self.space).await?)
    }

    async fn ssh_code(&self) -> Result<String, ApplicationServiceError> {
        Ok(self.cf.ssh_code().await?)
    }
}

impl ApplicationService {
    /// Any lookup failure counts as "does not exist"
    async fn find_existing(&self, name: &str) -> Option<ApplicationDetail> {
        match self.cf.get_application(name).await {
            Ok(app) => Some(app),
            Err(e) => {
                tracing::debug!(
                    app = %name,
                    not_found = e.is_not_found(),
                    error = %e,
                    "Application lookup failed, treating as absent"
                );
                None
            }
        }
    }

    fn validate_name(&self, name: &str) -> Result<(), ApplicationServiceError> {
        if name.trim().is_empty() {
            return Err(ApplicationServiceError::Invalid(
                "application name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_key(&self, key: &str) -> Result<(), ApplicationServiceError> {
        if key.is_empty() || key.contains('=') {
            return Err(ApplicationServiceError::Invalid(format!(
                "invalid environment variable name '{}'",
                key
            )));
        }
        Ok(())
    }
}
