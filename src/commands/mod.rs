use crate::domain::applications::{parse_env_assignment, ApplicationServiceApi};
use crate::error::{AppError, AppResult};
use clap::Subcommand;
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

/// Operations the driver can run against the configured space
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Operation {
    /// List applications with their details
    Apps,

    /// Show one application
    App { name: String },

    /// Create or update an application record, then (re)start it
    Push { name: String },

    /// Delete an application
    Delete { name: String },

    /// Start an application
    Start { name: String },

    /// Restart an application
    Restart { name: String },

    /// Show an application's environment
    Env { name: String },

    /// Set environment variables, one at a time in the order given
    SetEnv {
        name: String,
        #[arg(required = true, value_parser = parse_env_assignment)]
        variables: Vec<(String, String)>,
    },

    /// Unset environment variables, one at a time in the order given
    UnsetEnv {
        name: String,
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// List routes in the space
    Routes {
        /// Keep listing every N milliseconds until interrupted
        #[arg(long)]
        watch_ms: Option<u64>,
    },

    /// List service instances in the space
    Services,

    /// Show the configured space
    Space,

    /// Print a one-time SSH authorization code
    SshCode,
}

pub struct CommandRunner<W: Write> {
    service: Arc<dyn ApplicationServiceApi>,
    out: W,
}

impl<W: Write> CommandRunner<W> {
    pub fn new(service: Arc<dyn ApplicationServiceApi>, out: W) -> Self {
        Self { service, out }
    }

    pub async fn run(&mut self, operation: Operation) -> AppResult<()> {
        tracing::debug!(operation = ?operation, "Running operation");

        match operation {
            Operation::Apps => {
                let apps = self.service.list_applications_with_details().await?;
                self.emit(&apps)
            }
            Operation::App { name } => {
                let app = self.service.get_application(&name).await?;
                self.emit(&app)
            }
            Operation::Push { name } => {
                let outcome = self.service.push(&name).await?;
                self.emit(&outcome)
            }
            Operation::Delete { name } => self.service.delete(&name).await.map_err(Into::into),
            Operation::Start { name } => self.service.start(&name).await.map_err(Into::into),
            Operation::Restart { name } => self.service.restart(&name).await.map_err(Into::into),
            Operation::Env { name } => {
                let env = self.service.get_environment(&name).await?;
                self.emit(&env)
            }
            Operation::SetEnv { name, variables } => self
                .service
                .set_environment(&name, variables)
                .await
                .map_err(Into::into),
            Operation::UnsetEnv { name, keys } => self
                .service
                .unset_environment(&name, keys)
                .await
                .map_err(Into::into),
            Operation::Routes { watch_ms: None } => {
                let routes = self.service.list_routes().await?;
                self.emit_lines(&routes)
            }
            Operation::Routes {
                watch_ms: Some(interval),
            } => self.watch_routes(Duration::from_millis(interval.max(1))).await,
            Operation::Services => {
                let instances = self.service.list_service_instances().await?;
                self.emit(&instances)
            }
            Operation::Space => {
                let space = self.service.get_space().await?;
                self.emit(&space)
            }
            Operation::SshCode => {
                let code = self.service.ssh_code().await?;
                writeln!(self.out, "{}", code).map_err(output_error)
            }
        }
    }

    /// Poll routes until Ctrl-C. Returns normally on interrupt.
    async fn watch_routes(&mut self, interval: Duration) -> AppResult<()> {
        self.watch_routes_until(interval, tokio::signal::ctrl_c())
            .await
    }

    /// Poll routes until `stop` resolves, including while a listing is in flight
    async fn watch_routes_until<S>(&mut self, interval: Duration, stop: S) -> AppResult<()>
    where
        S: std::future::Future,
    {
        let mut ticker = tokio::time::interval(interval);
        tokio::pin!(stop);
        loop {
            tokio::select! {
                _ = &mut stop => {
                    tracing::info!("Interrupted, stopping route watch");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    let routes = tokio::select! {
                        routes = self.service.list_routes() => routes?,
                        _ = &mut stop => {
                            tracing::info!("Interrupted during route listing, stopping route watch");
                            return Ok(());
                        }
                    };
                    self.emit_lines(&routes)?;
                }
            }
        }
    }

    fn emit<T: Serialize>(&mut self, value: &T) -> AppResult<()> {
        let rendered = serde_json::to_string_pretty(value)
            .map_err(|e| AppError::Internal(format!("Failed to render output: {}", e)))?;
        writeln!(self.out, "{}", rendered).map_err(output_error)
    }

    fn emit_lines<T: std::fmt::Display>(&mut self, items: &[T]) -> AppResult<()> {
        for item in items {
            writeln!(self.out, "{}", item).map_err(output_error)?;
        }
        Ok(())
    }
}

fn output_error(e: std::io::Error) -> AppError {
    AppError::Internal(format!("Failed to write output: {}", e))
}
