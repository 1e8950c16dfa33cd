//! Ordered initialization.
//!
//! [`initialize`] builds every service from a configuration snapshot in a
//! fixed order and stops at the first failing step. Services are only
//! returned once every step has succeeded.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use ud_auth::{Authorizator, DelegationAdmin};
use ud_core::{ReadOnlyDirectoryConfig, RepositoryConfiguration, WritableStoreDriver};
use ud_federation::CombinedUserDirectory;
use ud_federation_ldap::LdapDirectory;
use ud_model::{Username, UsernamePolicy};
use ud_storage::{DelegationStore, ReadOnlyUserRepository, UserRepository};
use ud_storage_memory::{
    InMemoryDelegationStore, InMemoryUserStore, PasswordHasherService, PasswordPolicy,
    StaticDirectory,
};

/// Initialization steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStep {
    /// Configuration validation and username policy.
    Configuration,
    /// Password hasher.
    PasswordHasher,
    /// Writable identity store.
    WritableStore,
    /// Read-only directory adapter, including its connection test.
    ReadOnlyDirectory,
    /// Delegation store.
    DelegationStore,
    /// Combined user directory.
    CombinedDirectory,
    /// Authorizator and delegation administration.
    Authorization,
}

impl InitStep {
    /// Returns the step name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::PasswordHasher => "password-hasher",
            Self::WritableStore => "writable-store",
            Self::ReadOnlyDirectory => "readonly-directory",
            Self::DelegationStore => "delegation-store",
            Self::CombinedDirectory => "combined-directory",
            Self::Authorization => "authorization",
        }
    }
}

impl fmt::Display for InitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Initialization failure.
#[derive(Debug, Error)]
#[error("Initialization failed at step '{step}': {source}")]
pub struct BootstrapError {
    step: InitStep,
    #[source]
    source: Box<dyn StdError + Send + Sync>,
}

impl BootstrapError {
    fn at<E>(step: InitStep) -> impl FnOnce(E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        move |err| Self {
            step,
            source: Box::new(err),
        }
    }

    /// Returns the step that failed.
    #[must_use]
    pub const fn step(&self) -> InitStep {
        self.step
    }
}

/// Every service the directory exposes, fully initialized.
#[derive(Clone)]
pub struct DirectoryServices {
    /// The configuration the services were built from.
    pub config: Arc<RepositoryConfiguration>,
    /// Combined user directory.
    pub directory: Arc<CombinedUserDirectory>,
    /// Delegation relations.
    pub delegations: Arc<dyn DelegationStore>,
    /// Impersonation checks.
    pub authorizator: Authorizator,
    /// Validated grant and revoke operations.
    pub admin: Arc<DelegationAdmin>,
}

impl fmt::Debug for DirectoryServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryServices")
            .field("directory", &self.directory)
            .finish_non_exhaustive()
    }
}

/// Builds every service from the configuration.
///
/// Steps run in [`InitStep`] order. The read-only directory is checked for
/// reachability before anything depending on it is built.
///
/// ## Errors
///
/// Returns a [`BootstrapError`] naming the first step that failed.
#[tracing::instrument(skip_all, fields(readonly_driver = config.readonly_directory.driver()))]
pub async fn initialize(
    config: RepositoryConfiguration,
) -> Result<DirectoryServices, BootstrapError> {
    config
        .validate()
        .map_err(BootstrapError::at(InitStep::Configuration))?;
    let policy = config.username_policy();
    let administrators = config
        .administrators
        .iter()
        .map(|raw| policy.parse(raw))
        .collect::<Result<Vec<Username>, _>>()
        .map_err(BootstrapError::at(InitStep::Configuration))?;
    tracing::debug!(step = %InitStep::Configuration, "Initialization step complete");

    let hasher = PasswordHasherService::new(PasswordPolicy::from_config(&config.writable_store));
    tracing::debug!(
        step = %InitStep::PasswordHasher,
        algorithm = config.writable_store.algorithm.as_str(),
        "Initialization step complete"
    );

    let writable: Arc<dyn UserRepository> = match config.writable_store.driver {
        WritableStoreDriver::Memory => Arc::new(InMemoryUserStore::new(hasher.clone())),
    };
    writable
        .test_connection()
        .await
        .map_err(BootstrapError::at(InitStep::WritableStore))?;
    tracing::debug!(step = %InitStep::WritableStore, "Initialization step complete");

    let read_only = build_read_only(&config.readonly_directory, policy, hasher)?;
    read_only
        .test_connection()
        .await
        .map_err(BootstrapError::at(InitStep::ReadOnlyDirectory))?;
    tracing::debug!(step = %InitStep::ReadOnlyDirectory, "Initialization step complete");

    let delegations: Arc<dyn DelegationStore> = Arc::new(InMemoryDelegationStore::new());
    tracing::debug!(step = %InitStep::DelegationStore, "Initialization step complete");

    let directory = Arc::new(
        CombinedUserDirectory::new(writable, read_only, policy)
            .map_err(BootstrapError::at(InitStep::CombinedDirectory))?
            .with_administrators(administrators),
    );
    tracing::debug!(step = %InitStep::CombinedDirectory, "Initialization step complete");

    let authorizator = Authorizator::new(Arc::clone(&delegations));
    let admin = Arc::new(DelegationAdmin::new(
        Arc::clone(&directory),
        Arc::clone(&delegations),
    ));
    tracing::debug!(step = %InitStep::Authorization, "Initialization step complete");

    tracing::info!(
        readonly_driver = config.readonly_directory.driver(),
        case_sensitive = policy.case_sensitive,
        virtual_hosting = policy.virtual_hosting,
        "User directory initialized"
    );

    Ok(DirectoryServices {
        config: Arc::new(config),
        directory,
        delegations,
        authorizator,
        admin,
    })
}

fn build_read_only(
    config: &ReadOnlyDirectoryConfig,
    policy: UsernamePolicy,
    hasher: PasswordHasherService,
) -> Result<Arc<dyn UserRepository>, BootstrapError> {
    let step = InitStep::ReadOnlyDirectory;
    Ok(match config {
        ReadOnlyDirectoryConfig::Ldap(ldap) => {
            let directory =
                LdapDirectory::from_config(ldap, policy).map_err(BootstrapError::at(step))?;
            Arc::new(ReadOnlyUserRepository::new(directory))
        }
        ReadOnlyDirectoryConfig::Static(users) => {
            let directory = StaticDirectory::from_config(users, policy, hasher)
                .map_err(BootstrapError::at(step))?;
            Arc::new(ReadOnlyUserRepository::new(directory))
        }
    })
}

#[cfg(test)]
mod tests {
    use ud_model::Credential;

    use super::*;

    const STATIC_CONFIG: &str = r#"
        administrators = ["Root"]

        [writable-store]
        memory-cost-kib = 1024
        time-cost = 1

        [readonly-directory]
        driver = "static"
        users = [
            { username = "Bob", password = "builder", display-name = "Bob" },
            { username = "dora" },
        ]
    "#;

    fn config(toml: &str) -> RepositoryConfiguration {
        RepositoryConfiguration::from_toml_str(toml).unwrap()
    }

    #[tokio::test]
    async fn static_configuration_initializes() {
        let services = initialize(config(STATIC_CONFIG)).await.unwrap();
        let directory = &services.directory;

        let bob = directory.parse_username("bob").unwrap();
        assert!(directory.exists(&bob).await.unwrap());
        assert!(directory
            .authenticate(&bob, &Credential::new("builder"))
            .await
            .unwrap());
        assert!(directory.is_administrator(&directory.parse_username("root").unwrap()));
        assert_eq!(directory.count().await.unwrap(), 2);
        assert!(services.authorizator.can_act_as(&bob, &bob).await.unwrap());
    }

    #[tokio::test]
    async fn insecure_ldap_fails_at_readonly_step() {
        let err = initialize(config(
            r#"
            [writable-store]
            [readonly-directory]
            driver = "ldap"
            url = "ldap://ldap.example.com"
            bind-dn = "cn=reader,dc=example,dc=com"
            bind-credential = "secret"
            users-dn = "ou=people,dc=example,dc=com"
            "#,
        ))
        .await
        .unwrap_err();

        assert_eq!(err.step(), InitStep::ReadOnlyDirectory);
        assert!(err.to_string().contains("readonly-directory"));
        assert!(!err.to_string().contains("secret"));
    }

    #[tokio::test]
    async fn unreachable_ldap_fails_at_readonly_step() {
        let err = initialize(config(
            r#"
            [writable-store]
            [readonly-directory]
            driver = "ldap"
            url = "ldaps://127.0.0.1:1"
            bind-dn = "cn=reader,dc=example,dc=com"
            bind-credential = "secret"
            users-dn = "ou=people,dc=example,dc=com"
            connection-timeout-secs = 1
            "#,
        ))
        .await
        .unwrap_err();

        assert_eq!(err.step(), InitStep::ReadOnlyDirectory);
    }

    #[tokio::test]
    async fn invalid_configuration_fails_first() {
        let mut invalid = config(STATIC_CONFIG);
        invalid.writable_store.time_cost = 0;

        let err = initialize(invalid).await.unwrap_err();
        assert_eq!(err.step(), InitStep::Configuration);
    }

    #[test]
    fn step_names() {
        assert_eq!(InitStep::WritableStore.to_string(), "writable-store");
        assert_eq!(InitStep::Authorization.as_str(), "authorization");
    }
}
