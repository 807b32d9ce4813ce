use crate::commands::{CommandRunner, Operation};
use crate::domain::applications::{ApplicationService, ApplicationServiceError};
use crate::domain::auth::{CredentialService, PasswordCredentials};
use crate::error::{AppError, AppResult};
use crate::infrastructure::cloud_foundry::{CloudFoundryClient, CloudFoundryError};
use crate::infrastructure::config::Config;
use crate::infrastructure::repositories::TokenFileRepository;
use crate::infrastructure::uaa::UaaSession;
use std::io::Write;
use std::sync::Arc;

/// Run one operation end to end.
///
/// The auth strategy is fixed from the token cache before the first remote
/// call. Once the operation finishes, the session's refresh token is written
/// back whether or not the operation itself succeeded.
pub async fn run<W: Write>(config: &Config, operation: Operation, out: &mut W) -> AppResult<()> {
    // === DEPENDENCY INJECTION SETUP ===
    let token_repo = Arc::new(TokenFileRepository::new(config.token_file.clone()));
    let credential_service = CredentialService::new(token_repo);

    let strategy = credential_service.select_strategy(&PasswordCredentials {
        username: config.username.clone(),
        password: config.password.clone(),
    })?;

    let http_client = CloudFoundryClient::http_client(config).map_err(remote)?;
    let info = CloudFoundryClient::fetch_info(&http_client, &config.api_url)
        .await
        .map_err(remote)?;

    let session = Arc::new(UaaSession::new(
        http_client.clone(),
        info.token_endpoint.clone(),
        strategy,
    ));
    let cf_client = Arc::new(
        CloudFoundryClient::new(config, http_client, info, session.clone()).map_err(remote)?,
    );
    let application_service = Arc::new(ApplicationService::new(
        cf_client,
        config.space.clone(),
        config.detail_concurrency,
    ));

    tracing::info!(
        api = %config.api_url,
        org = %config.organization,
        space = %config.space,
        "Connected to Cloud Foundry API"
    );

    let result = CommandRunner::new(application_service, out)
        .run(operation)
        .await;

    if session.is_authenticated().await {
        credential_service.save_refresh_token(session.as_ref()).await;
    }

    result
}

fn remote(err: CloudFoundryError) -> AppError {
    ApplicationServiceError::from(err).into()
}
