//! LDAP read-only directory.
//!
//! ## Security Requirements
//!
//! - All connections use LDAPS (TLS from connection start)
//! - STARTTLS and plain LDAP are NOT supported
//! - Passwords are never logged

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use ud_core::LdapDirectoryConfig;
use ud_model::{Credential, UserIdentity, Username, UsernamePolicy};
use ud_storage::{ReadOnlyDirectory, StorageResult, UsernameStream};

use crate::config::LdapSettings;
use crate::connection::LdapConnectionPool;
use crate::error::LdapResult;
use crate::mapper::LdapUserMapper;
use crate::search::{self, LdapEntry, UserListing};

/// Read-only user directory backed by an LDAPS server.
pub struct LdapDirectory {
    settings: Arc<LdapSettings>,
    pool: LdapConnectionPool,
    mapper: LdapUserMapper,
}

impl LdapDirectory {
    /// Creates a directory from the repository configuration.
    ///
    /// No connection is opened; call `test_connection` to check
    /// reachability.
    ///
    /// ## Errors
    ///
    /// Returns an error if the URL does not use LDAPS or the settings are
    /// invalid.
    pub fn from_config(config: &LdapDirectoryConfig, policy: UsernamePolicy) -> LdapResult<Self> {
        Ok(Self::new(LdapSettings::from_config(config)?, policy))
    }

    /// Creates a directory from validated settings.
    #[must_use]
    pub fn new(settings: LdapSettings, policy: UsernamePolicy) -> Self {
        let settings = Arc::new(settings);
        Self {
            pool: LdapConnectionPool::new(Arc::clone(&settings)),
            mapper: LdapUserMapper::new(Arc::clone(&settings), policy),
            settings,
        }
    }

    /// Returns the settings.
    #[must_use]
    pub fn settings(&self) -> &LdapSettings {
        &self.settings
    }

    async fn find_entry(&self, username: &Username) -> LdapResult<Option<LdapEntry>> {
        let mut conn = self.pool.get().await?;
        let entry = search::find_user(&mut conn, &self.settings, username.as_str()).await?;

        // The server may match the filter more loosely than the username
        // policy does (e.g. case-insensitively under a case-sensitive policy).
        Ok(entry.filter(|entry| match self.mapper.username(entry) {
            Ok(found) => &found == username,
            Err(e) => {
                tracing::warn!(dn = %entry.dn, error = %e, "Ignoring unmappable LDAP entry");
                false
            }
        }))
    }

    async fn next_username(
        &self,
        listing: Option<UserListing>,
    ) -> StorageResult<Option<(Username, Option<UserListing>)>> {
        let mut listing = match listing {
            Some(listing) => listing,
            None => UserListing::start(self.pool.get().await?, &self.settings).await?,
        };

        loop {
            let Some(entry) = listing.next_entry().await? else {
                listing.finish().await?;
                return Ok(None);
            };
            match self.mapper.username(&entry) {
                Ok(username) => return Ok(Some((username, Some(listing)))),
                Err(e) => {
                    tracing::warn!(dn = %entry.dn, error = %e, "Skipping unmappable LDAP entry");
                }
            }
        }
    }
}

#[async_trait]
impl ReadOnlyDirectory for LdapDirectory {
    fn directory_type(&self) -> &'static str {
        "ldap"
    }

    #[tracing::instrument(level = "debug", skip_all, fields(username = %username))]
    async fn get(&self, username: &Username) -> StorageResult<Option<UserIdentity>> {
        let Some(entry) = self.find_entry(username).await? else {
            return Ok(None);
        };
        Ok(Some(self.mapper.map_to_user(&entry)?))
    }

    #[tracing::instrument(level = "debug", skip_all, fields(username = %username))]
    async fn verify_credential(
        &self,
        username: &Username,
        credential: &Credential,
    ) -> StorageResult<bool> {
        // An empty simple bind is an anonymous bind and would succeed.
        if credential.is_empty() {
            return Ok(false);
        }

        let Some(entry) = self.find_entry(username).await? else {
            return Ok(false);
        };
        Ok(self.pool.bind_as_user(&entry.dn, credential.expose()).await?)
    }

    fn list(&self) -> UsernameStream<'_> {
        stream::try_unfold(None, move |listing| self.next_username(listing)).boxed()
    }

    async fn test_connection(&self) -> StorageResult<()> {
        self.pool.test_connection().await?;
        tracing::info!(
            url = %self.settings.connection_url,
            users_dn = %self.settings.users_dn,
            "LDAP directory reachable"
        );
        Ok(())
    }
}
