//! Common test utilities and fixtures.

use ud_model::{Credential, UserAttributes, Username};
use ud_server::{initialize, DirectoryServices};

/// Read-only users: bob (password `bob-secret`) and dora (no password).
pub const DIRECTORY_CONFIG: &str = r#"
    administrators = ["admin"]

    [writable-store]
    memory-cost-kib = 1024
    time-cost = 1

    [readonly-directory]
    driver = "static"
    users = [
        { username = "bob", password = "bob-secret", display-name = "Bob (directory)", email = "bob@directory.example" },
        { username = "dora", display-name = "Dora" },
    ]
"#;

/// Test environment with the full service graph.
pub struct TestEnv {
    /// Initialized services.
    pub services: DirectoryServices,
}

impl TestEnv {
    /// Builds the services and creates the writable user alice
    /// (password `alice-secret`).
    pub async fn new() -> anyhow::Result<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("ud_federation=debug,audit=info")
            .with_test_writer()
            .try_init();

        let config = ud_core::RepositoryConfiguration::from_toml_str(DIRECTORY_CONFIG)?;
        let services = initialize(config).await?;

        let env = Self { services };
        env.services
            .directory
            .create_with_attributes(
                &env.user("alice"),
                &Credential::new("alice-secret"),
                UserAttributes::new().with_display_name("Alice"),
            )
            .await?;
        Ok(env)
    }

    /// Normalizes a username with the directory's policy.
    pub fn user(&self, raw: &str) -> Username {
        match self.services.directory.parse_username(raw) {
            Ok(username) => username,
            Err(e) => panic!("invalid test username '{raw}': {e}"),
        }
    }

    /// Authenticates with a plaintext password.
    pub async fn login(&self, raw: &str, password: &str) -> anyhow::Result<bool> {
        Ok(self
            .services
            .directory
            .authenticate(&self.user(raw), &Credential::new(password))
            .await?)
    }
}
