//! Repository configuration.
//!
//! The configuration is read once at startup from a TOML document with two
//! required sections, `[writable-store]` and `[readonly-directory]`, plus a
//! few top-level switches. Unknown keys are ignored; missing required keys
//! fail initialization with a message naming the field.
//!
//! ```toml
//! case-sensitive = false
//! virtual-hosting = false
//! administrators = ["admin"]
//!
//! [writable-store]
//! algorithm = "argon2id"
//!
//! [readonly-directory]
//! driver = "ldap"
//! url = "ldaps://ldap.example.com:636"
//! bind-dn = "cn=reader,dc=example,dc=com"
//! bind-credential = "secret"
//! users-dn = "ou=people,dc=example,dc=com"
//! ```

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use ud_model::UsernamePolicy;

use crate::error::{ConfigError, ConfigResult};

// ============================================================================
// Top level
// ============================================================================

/// Immutable configuration snapshot for the whole directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RepositoryConfiguration {
    /// Keep username case as given (default: lowercase everything).
    #[serde(default)]
    pub case_sensitive: bool,

    /// Require `local@domain` usernames.
    #[serde(default)]
    pub virtual_hosting: bool,

    /// Usernames with administrative rights over the directory.
    #[serde(default)]
    pub administrators: Vec<String>,

    /// Writable identity store section.
    pub writable_store: WritableStoreConfig,

    /// Read-only directory section.
    pub readonly_directory: ReadOnlyDirectoryConfig,
}

impl RepositoryConfiguration {
    /// Parses and validates a TOML document.
    ///
    /// ## Errors
    ///
    /// Returns `ConfigError::Parse` for malformed documents or missing
    /// sections, and `Missing`/`Invalid` for unusable values.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a TOML file.
    ///
    /// ## Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read, otherwise the
    /// same errors as [`Self::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Returns the username policy fixed by this configuration.
    #[must_use]
    pub const fn username_policy(&self) -> UsernamePolicy {
        UsernamePolicy::new(self.case_sensitive, self.virtual_hosting)
    }

    /// Validates every section.
    ///
    /// ## Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> ConfigResult<()> {
        let policy = self.username_policy();
        for admin in &self.administrators {
            policy
                .parse(admin)
                .map_err(|e| ConfigError::invalid("administrators", e.to_string()))?;
        }

        self.writable_store.validate()?;
        self.readonly_directory.validate(&policy)
    }
}

// ============================================================================
// Writable store
// ============================================================================

/// Storage driver for the writable identity store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WritableStoreDriver {
    /// Process-local key/value store.
    #[default]
    Memory,
}

/// Password hashing algorithm for locally managed credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// Argon2id (hybrid, recommended).
    #[default]
    Argon2id,
    /// Argon2i (data-independent).
    Argon2i,
    /// Argon2d (data-dependent).
    Argon2d,
}

impl HashAlgorithm {
    /// Returns the PHC identifier of the algorithm.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Argon2id => "argon2id",
            Self::Argon2i => "argon2i",
            Self::Argon2d => "argon2d",
        }
    }
}

/// `[writable-store]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WritableStoreConfig {
    /// Storage driver.
    #[serde(default)]
    pub driver: WritableStoreDriver,

    /// Hash algorithm for new credentials.
    #[serde(default)]
    pub algorithm: HashAlgorithm,

    /// Memory cost in KiB.
    #[serde(default = "default_memory_cost")]
    pub memory_cost_kib: u32,

    /// Iterations.
    #[serde(default = "default_time_cost")]
    pub time_cost: u32,

    /// Lanes.
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

const fn default_memory_cost() -> u32 {
    19 * 1024
}

const fn default_time_cost() -> u32 {
    2
}

const fn default_parallelism() -> u32 {
    1
}

impl Default for WritableStoreConfig {
    fn default() -> Self {
        Self {
            driver: WritableStoreDriver::default(),
            algorithm: HashAlgorithm::default(),
            memory_cost_kib: default_memory_cost(),
            time_cost: default_time_cost(),
            parallelism: default_parallelism(),
        }
    }
}

impl WritableStoreConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.parallelism == 0 {
            return Err(ConfigError::invalid(
                "writable-store.parallelism",
                "must be at least 1",
            ));
        }
        if self.time_cost == 0 {
            return Err(ConfigError::invalid(
                "writable-store.time-cost",
                "must be at least 1",
            ));
        }
        if self.memory_cost_kib < 8 * self.parallelism {
            return Err(ConfigError::invalid(
                "writable-store.memory-cost-kib",
                "must be at least 8 KiB per lane",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Read-only directory
// ============================================================================

/// `[readonly-directory]` section, selected by its `driver` key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "driver", rename_all = "kebab-case")]
pub enum ReadOnlyDirectoryConfig {
    /// An LDAPS directory.
    Ldap(LdapDirectoryConfig),
    /// A fixed list of users declared in the configuration itself.
    Static(StaticDirectoryConfig),
}

impl ReadOnlyDirectoryConfig {
    /// Returns the driver name.
    #[must_use]
    pub const fn driver(&self) -> &'static str {
        match self {
            Self::Ldap(_) => "ldap",
            Self::Static(_) => "static",
        }
    }

    fn validate(&self, policy: &UsernamePolicy) -> ConfigResult<()> {
        match self {
            Self::Ldap(ldap) => ldap.validate(),
            Self::Static(directory) => directory.validate(policy),
        }
    }
}

/// LDAP connection and schema parameters.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LdapDirectoryConfig {
    /// Server URL (`ldaps://` only).
    pub url: String,

    /// Service account DN used for searches.
    pub bind_dn: String,

    /// Service account password.
    #[serde(skip_serializing)]
    pub bind_credential: String,

    /// Base DN under which users live.
    pub users_dn: String,

    /// Attribute holding the username.
    #[serde(default = "default_username_attribute")]
    pub username_attribute: String,

    /// Attribute holding the display name.
    #[serde(default = "default_display_name_attribute")]
    pub display_name_attribute: String,

    /// Attribute holding the email address.
    #[serde(default = "default_email_attribute")]
    pub email_attribute: String,

    /// Object classes a user entry must carry.
    #[serde(default = "default_object_classes")]
    pub object_classes: Vec<String>,

    /// Extra filter ANDed into every user search.
    #[serde(default)]
    pub filter: Option<String>,

    /// Entries requested per page when enumerating.
    #[serde(default = "default_page_size")]
    pub page_size: i32,

    /// Maximum concurrent connections.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Connection timeout in seconds.
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,

    /// Whether to validate the server certificate.
    #[serde(default = "default_true")]
    pub validate_certificates: bool,
}

fn default_username_attribute() -> String {
    "uid".to_string()
}

fn default_display_name_attribute() -> String {
    "cn".to_string()
}

fn default_email_attribute() -> String {
    "mail".to_string()
}

fn default_object_classes() -> Vec<String> {
    vec!["inetOrgPerson".to_string()]
}

const fn default_page_size() -> i32 {
    500
}

const fn default_pool_size() -> usize {
    10
}

const fn default_connection_timeout() -> u64 {
    5
}

const fn default_true() -> bool {
    true
}

impl fmt::Debug for LdapDirectoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LdapDirectoryConfig")
            .field("url", &self.url)
            .field("bind_dn", &self.bind_dn)
            .field("bind_credential", &"[REDACTED]")
            .field("users_dn", &self.users_dn)
            .field("username_attribute", &self.username_attribute)
            .field("object_classes", &self.object_classes)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

impl LdapDirectoryConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::Missing("readonly-directory.url"));
        }
        if self.bind_dn.trim().is_empty() {
            return Err(ConfigError::Missing("readonly-directory.bind-dn"));
        }
        if self.users_dn.trim().is_empty() {
            return Err(ConfigError::Missing("readonly-directory.users-dn"));
        }
        if self.object_classes.is_empty() {
            return Err(ConfigError::Missing("readonly-directory.object-classes"));
        }
        if self.page_size <= 0 {
            return Err(ConfigError::invalid(
                "readonly-directory.page-size",
                "must be positive",
            ));
        }
        if self.pool_size == 0 {
            return Err(ConfigError::invalid(
                "readonly-directory.pool-size",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// A user declared in a static read-only directory.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StaticUserConfig {
    /// Username.
    pub username: String,
    /// Plaintext password checked on authentication (none: never authenticates).
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    /// Display name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
}

impl fmt::Debug for StaticUserConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticUserConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("display_name", &self.display_name)
            .field("email", &self.email)
            .finish()
    }
}

/// Static directory parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StaticDirectoryConfig {
    /// Declared users.
    #[serde(default)]
    pub users: Vec<StaticUserConfig>,
}

impl StaticDirectoryConfig {
    fn validate(&self, policy: &UsernamePolicy) -> ConfigResult<()> {
        for user in &self.users {
            policy
                .parse(&user.username)
                .map_err(|e| ConfigError::invalid("readonly-directory.users", e.to_string()))?;
        }
        Ok(())
    }
}
