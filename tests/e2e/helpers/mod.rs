use cf_driver::commands::Operation;
use cf_driver::error::AppResult;
use cf_driver::infrastructure::config::Config;
use clap::Parser;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use test_context::AsyncTestContext;


use fake_cf::{FakeCloudFoundry, ORG_NAME, PASSWORD, SPACE_NAME, USERNAME};

#[derive(Parser, Debug)]
struct TestCli {
    #[command(subcommand)]
    operation: Operation,
}

/// Outcome of one driver run against the fake
pub struct RunOutput {
    pub result: AppResult<()>,
    pub stdout: String,
}

impl RunOutput {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout).expect("stdout is not JSON")
    }
}

pub struct TestContext {
    pub fake: Arc<FakeCloudFoundry>,
    pub base_url: String,
    _dir: TempDir,
    token_path: PathBuf,
}

impl AsyncTestContext for TestContext {
    fn setup() -> impl std::future::Future<Output = Self> + Send {
        async {
            let fake = FakeCloudFoundry::new();
            let base_url = fake.spawn().await;

            let dir = tempfile::tempdir().expect("Failed to create temp dir");
            let token_path = dir.path().join("tokens").join(".cf_java_client.json");

            Self {
                fake,
                base_url,
                _dir: dir,
                token_path,
            }
        }
    }

    fn teardown(self) -> impl std::future::Future<Output = ()> + Send {
        async {
            // Temp dir is removed on drop
        }
    }
}

impl TestContext {
    pub fn token_path(&self) -> &PathBuf {
        &self.token_path
    }

    /// Config pointing at the fake, with the password set
    pub fn config(&self) -> Config {
        self.config_with(&[("CF_PASSWORD", PASSWORD)])
    }

    pub fn config_without_password(&self) -> Config {
        self.config_with(&[])
    }

    /// Config pointing at the fake, plus extra keys
    pub fn config_with(&self, extra: &[(&str, &str)]) -> Config {
        let mut values: HashMap<String, String> = HashMap::from([
            ("CF_API_URL".to_string(), self.base_url.clone()),
            ("CF_ORG".to_string(), ORG_NAME.to_string()),
            ("CF_SPACE".to_string(), SPACE_NAME.to_string()),
            ("CF_USERNAME".to_string(), USERNAME.to_string()),
            (
                "CF_TOKEN_FILE".to_string(),
                self.token_path.display().to_string(),
            ),
            ("CF_HTTP_TIMEOUT_SECS".to_string(), "5".to_string()),
        ]);
        for (key, value) in extra {
            values.insert(key.to_string(), value.to_string());
        }
        Config::from_lookup(|key| values.get(key).cloned()).expect("Invalid test config")
    }

    /// Write a token cache file the way a previous run would have
    pub fn write_cached_token(&self, token: &str) {
        let parent = self.token_path.parent().expect("token path has a parent");
        std::fs::create_dir_all(parent).expect("Failed to create token dir");
        std::fs::write(
            &self.token_path,
            serde_json::json!({ "refreshToken": token }).to_string(),
        )
        .expect("Failed to write token file");
    }

    /// Refresh token stored in the cache file, if any
    pub fn cached_token(&self) -> Option<String> {
        let raw = std::fs::read_to_string(&self.token_path).ok()?;
        let value: serde_json::Value = serde_json::from_str(&raw).ok()?;
        value["refreshToken"].as_str().map(str::to_string)
    }

    /// Run one operation with the default config
    pub async fn run(&self, args: &[&str]) -> RunOutput {
        self.run_with(&self.config(), args).await
    }

    pub async fn run_with(&self, config: &Config, args: &[&str]) -> RunOutput {
        let operation = TestCli::try_parse_from(std::iter::once("cf-driver").chain(args.iter().copied()))
            .expect("Invalid test arguments")
            .operation;

        let mut stdout = Vec::new();
        let result = cf_driver::app::run(config, operation, &mut stdout).await;

        RunOutput {
            result,
            stdout: String::from_utf8(stdout).expect("stdout is not UTF-8"),
        }
    }
}
