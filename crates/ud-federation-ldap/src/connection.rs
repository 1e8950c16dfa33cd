//! LDAP connection pool management.
//!
//! ## Security Requirements
//!
//! All connections use LDAPS (TLS from connection start).
//! STARTTLS is NOT supported.

use std::sync::Arc;

use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Scope};
use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::LdapSettings;
use crate::error::{LdapError, LdapResult};

/// LDAP result code for a failed simple bind.
const INVALID_CREDENTIALS: u32 = 49;

type IdleHandles = Arc<Mutex<Vec<Ldap>>>;

/// Bounded pool of service-bound LDAPS connections.
///
/// At most `pool_max_size` connections are in use at once; callers beyond
/// that wait for a permit. Handles released in a clean state go back to an
/// idle list and are reused.
pub struct LdapConnectionPool {
    settings: Arc<LdapSettings>,
    semaphore: Arc<Semaphore>,
    idle: IdleHandles,
}

impl LdapConnectionPool {
    /// Creates a pool. No connection is opened until one is needed.
    #[must_use]
    pub fn new(settings: Arc<LdapSettings>) -> Self {
        let max_size = settings.pool_max_size;
        Self {
            settings,
            semaphore: Arc::new(Semaphore::new(max_size)),
            idle: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Gets a connection bound as the service account.
    ///
    /// ## Errors
    ///
    /// Returns `LdapError::Connection` or `LdapError::Bind` if a new
    /// connection cannot be established, and
    /// `LdapError::ServiceBindRejected` if the server rejects the service
    /// account credentials.
    pub async fn get(&self) -> LdapResult<LdapConnection> {
        let permit = self.acquire().await?;

        loop {
            let Some(mut ldap) = self.idle.lock().pop() else {
                break;
            };
            if !ldap.is_closed() {
                return Ok(LdapConnection::pooled(ldap, Arc::clone(&self.idle), permit));
            }
            tracing::debug!("Dropping closed idle LDAP connection");
        }

        let mut ldap = self.connect().await?;
        let result = ldap
            .simple_bind(&self.settings.bind_dn, &self.settings.bind_credential)
            .await
            .map_err(|e| LdapError::Bind(e.to_string()))?;
        if let Err(e) = service_bind_outcome(result.rc, &result.text) {
            if matches!(e, LdapError::ServiceBindRejected(_)) {
                tracing::error!(
                    bind_dn = %self.settings.bind_dn,
                    "LDAP server rejected the service account credentials"
                );
            }
            return Err(e);
        }

        Ok(LdapConnection::pooled(ldap, Arc::clone(&self.idle), permit))
    }

    /// Checks a user's password by binding as the user's entry.
    ///
    /// The bind runs on a dedicated connection that is closed afterwards,
    /// so pooled handles stay bound as the service account. Returns
    /// `Ok(false)` for invalid credentials.
    ///
    /// ## Errors
    ///
    /// Returns an error if the server cannot be reached or rejects the bind
    /// for any reason other than invalid credentials.
    pub async fn bind_as_user(&self, user_dn: &str, password: &str) -> LdapResult<bool> {
        let _permit = self.acquire().await?;
        let mut ldap = self.connect().await?;

        let result = ldap.simple_bind(user_dn, password).await;
        // Best effort; the connection is discarded either way.
        let _ = ldap.unbind().await;

        let result = result.map_err(|e| LdapError::Bind(e.to_string()))?;
        match result.rc {
            0 => Ok(true),
            INVALID_CREDENTIALS => Ok(false),
            rc => Err(LdapError::Bind(format!(
                "unexpected result code {rc}: {}",
                result.text
            ))),
        }
    }

    /// Tests the connection to the LDAP server.
    ///
    /// ## Errors
    ///
    /// Returns an error if the server cannot be reached, the service bind
    /// fails, or the users DN cannot be read.
    pub async fn test_connection(&self) -> LdapResult<()> {
        let mut conn = self.get().await?;

        let result = conn
            .ldap_mut()
            .search(
                &self.settings.users_dn,
                Scope::Base,
                "(objectClass=*)",
                vec!["dn"],
            )
            .await
            .and_then(ldap3::SearchResult::success);
        if let Err(e) = result {
            conn.mark_broken();
            return Err(LdapError::connection(format!("Test search failed: {e}")));
        }
        Ok(())
    }

    /// Returns the settings.
    #[must_use]
    pub fn settings(&self) -> &LdapSettings {
        &self.settings
    }

    /// Returns the number of idle handles.
    #[must_use]
    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    async fn acquire(&self) -> LdapResult<OwnedSemaphorePermit> {
        Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| LdapError::PoolClosed)
    }

    /// Opens an unbound LDAPS connection.
    async fn connect(&self) -> LdapResult<Ldap> {
        let settings = LdapConnSettings::new()
            .set_conn_timeout(self.settings.connection_timeout)
            .set_no_tls_verify(!self.settings.validate_certificates);

        let (conn, ldap) = LdapConnAsync::with_settings(settings, &self.settings.connection_url)
            .await
            .map_err(|e| LdapError::Connection(e.to_string()))?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                tracing::warn!(error = %e, "LDAP connection driver error");
            }
        });

        Ok(ldap)
    }
}

/// A connection checked out of the pool.
///
/// On drop the handle returns to the idle list unless it was marked broken.
pub struct LdapConnection {
    ldap: Ldap,
    idle: IdleHandles,
    reusable: bool,
    _permit: OwnedSemaphorePermit,
}

impl LdapConnection {
    fn pooled(ldap: Ldap, idle: IdleHandles, permit: OwnedSemaphorePermit) -> Self {
        Self {
            ldap,
            idle,
            reusable: true,
            _permit: permit,
        }
    }

    /// Returns a mutable reference to the LDAP handle.
    pub fn ldap_mut(&mut self) -> &mut Ldap {
        &mut self.ldap
    }

    /// Keeps this handle out of the idle list.
    pub fn mark_broken(&mut self) {
        self.reusable = false;
    }

    /// Allows this handle back into the idle list.
    pub fn mark_reusable(&mut self) {
        self.reusable = true;
    }
}

impl Drop for LdapConnection {
    fn drop(&mut self) {
        if self.reusable {
            self.idle.lock().push(self.ldap.clone());
        }
    }
}

/// Classifies the result code of the service account bind.
///
/// Invalid credentials mean the configured bind credential is wrong, which
/// retrying will not fix.
fn service_bind_outcome(rc: u32, text: &str) -> LdapResult<()> {
    match rc {
        0 => Ok(()),
        INVALID_CREDENTIALS => Err(LdapError::ServiceBindRejected(text.to_string())),
        rc => Err(LdapError::Bind(format!("result code {rc}: {text}"))),
    }
}
