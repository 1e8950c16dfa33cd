//! Combined user directory.
//!
//! ## Resolution
//!
//! Lookups check the writable store first and fall back to the read-only
//! directory only when the writable store has no record. The writable store
//! is an override layer: a local record always wins over a directory record
//! of the same name.
//!
//! ## Mutations
//!
//! Every mutation goes to the writable store. Creating a user that exists in
//! the read-only directory establishes a shadow. Updating or changing the
//! credential of a user that only exists in the read-only directory copies
//! it up into the writable store first.
//!
//! ## Failures
//!
//! A leaf outage surfaces as [`FederationError::BackendUnavailable`]. It is
//! never treated as "user does not exist".

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use ud_core::{EventBuilder, EventType};
use ud_model::{Credential, Origin, UserAttributes, UserIdentity, Username, UsernamePolicy};
use ud_storage::{UserRepository, UsernameStream};

use crate::error::{leaf, FederationError, FederationResult};

/// One logical user namespace over a writable store and a read-only directory.
///
/// Holds no mutable state beyond what is fixed at construction, so it can be
/// shared by `Arc` across any number of concurrent callers.
pub struct CombinedUserDirectory {
    writable: Arc<dyn UserRepository>,
    read_only: Arc<dyn UserRepository>,
    policy: UsernamePolicy,
    administrators: BTreeSet<Username>,
}

impl std::fmt::Debug for CombinedUserDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombinedUserDirectory")
            .field("policy", &self.policy)
            .field("administrators", &self.administrators)
            .finish_non_exhaustive()
    }
}

impl CombinedUserDirectory {
    /// Combines two leaves.
    ///
    /// ## Errors
    ///
    /// Returns `FederationError::Configuration` if a leaf reports the wrong
    /// origin (e.g. two writable stores).
    pub fn new(
        writable: Arc<dyn UserRepository>,
        read_only: Arc<dyn UserRepository>,
        policy: UsernamePolicy,
    ) -> FederationResult<Self> {
        if writable.origin() != Origin::Writable {
            return Err(FederationError::config(
                "the writable leaf must report a writable origin",
            ));
        }
        if read_only.origin() != Origin::ReadOnly {
            return Err(FederationError::config(
                "the read-only leaf must report a read-only origin",
            ));
        }

        Ok(Self {
            writable,
            read_only,
            policy,
            administrators: BTreeSet::new(),
        })
    }

    /// Sets the administrator list.
    #[must_use]
    pub fn with_administrators(mut self, administrators: impl IntoIterator<Item = Username>) -> Self {
        self.administrators = administrators.into_iter().collect();
        self
    }

    /// Returns the username normalization policy.
    #[must_use]
    pub const fn policy(&self) -> UsernamePolicy {
        self.policy
    }

    /// Normalizes a raw username with the directory's policy.
    ///
    /// ## Errors
    ///
    /// Returns `FederationError::InvalidUsername` if the input is rejected.
    pub fn parse_username(&self, raw: &str) -> FederationResult<Username> {
        Ok(self.policy.parse(raw)?)
    }

    /// Checks whether a user is a configured administrator.
    ///
    /// Administration is a separate capability; it does not affect
    /// impersonation checks.
    #[must_use]
    pub fn is_administrator(&self, username: &Username) -> bool {
        self.administrators.contains(username)
    }

    /// Checks that both leaves are reachable, writable store first.
    ///
    /// ## Errors
    ///
    /// Returns the first leaf failure.
    pub async fn initialize(&self) -> FederationResult<()> {
        self.writable
            .test_connection()
            .await
            .map_err(leaf(Origin::Writable))?;
        self.read_only
            .test_connection()
            .await
            .map_err(leaf(Origin::ReadOnly))?;
        tracing::info!("Combined user directory ready");
        Ok(())
    }

    fn backend(&self, origin: Origin) -> &dyn UserRepository {
        match origin {
            Origin::Writable => self.writable.as_ref(),
            Origin::ReadOnly => self.read_only.as_ref(),
        }
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// Checks whether the user exists in either leaf.
    ///
    /// ## Errors
    ///
    /// Returns `FederationError::BackendUnavailable` if a consulted leaf fails.
    #[tracing::instrument(level = "debug", skip_all, fields(username = %username))]
    pub async fn exists(&self, username: &Username) -> FederationResult<bool> {
        if self
            .writable
            .exists(username)
            .await
            .map_err(leaf(Origin::Writable))?
        {
            return Ok(true);
        }
        self.read_only
            .exists(username)
            .await
            .map_err(leaf(Origin::ReadOnly))
    }

    /// Resolves the effective identity of a user.
    ///
    /// ## Errors
    ///
    /// Returns `FederationError::BackendUnavailable` if a consulted leaf fails.
    #[tracing::instrument(level = "debug", skip_all, fields(username = %username))]
    pub async fn get(&self, username: &Username) -> FederationResult<Option<UserIdentity>> {
        if let Some(identity) = self
            .writable
            .get(username)
            .await
            .map_err(leaf(Origin::Writable))?
        {
            return Ok(Some(identity));
        }

        Ok(self
            .read_only
            .get(username)
            .await
            .map_err(leaf(Origin::ReadOnly))?
            .map(|mut identity| {
                identity.origin = Origin::ReadOnly;
                identity
            }))
    }

    /// Verifies a credential against the backend owning the effective identity.
    ///
    /// Returns `Ok(false)` for an unknown user or a wrong credential.
    ///
    /// ## Errors
    ///
    /// Returns `FederationError::BackendUnavailable` if a leaf fails, so that
    /// an outage is distinguishable from a rejected credential.
    #[tracing::instrument(skip_all, fields(username = %username))]
    pub async fn authenticate(
        &self,
        username: &Username,
        credential: &Credential,
    ) -> FederationResult<bool> {
        let identity = match self.get(username).await {
            Ok(Some(identity)) => identity,
            Ok(None) => {
                EventBuilder::new(EventType::LoginError)
                    .failure("user_not_found")
                    .user(username.as_str())
                    .emit();
                return Ok(false);
            }
            Err(e) => {
                EventBuilder::new(EventType::LoginError)
                    .failure(e.to_string())
                    .user(username.as_str())
                    .emit();
                return Err(e);
            }
        };

        let origin = identity.origin;
        let result = self
            .backend(origin)
            .verify_credential(username, credential)
            .await
            .map_err(leaf(origin));

        let event = match &result {
            Ok(true) => EventBuilder::new(EventType::Login).success(),
            Ok(false) => EventBuilder::new(EventType::LoginError).failure("invalid_credentials"),
            Err(e) => EventBuilder::new(EventType::LoginError).failure(e.to_string()),
        };
        event.user(username.as_str()).origin(origin.as_str()).emit();

        result
    }

    /// Streams the de-duplicated union of both leaves' usernames.
    ///
    /// Writable usernames come first. Read-only usernames already seen,
    /// in either leaf, are skipped. Only the seen-set is held in memory.
    pub fn list(&self) -> BoxStream<'_, FederationResult<Username>> {
        let state = UnionState {
            writable: Some(self.writable.list()),
            read_only: self.read_only.list(),
            seen: HashSet::new(),
        };

        stream::unfold(state, |mut state| async move {
            if let Some(writable) = state.writable.as_mut() {
                let next = writable.next().await;
                match next {
                    Some(Ok(username)) => {
                        state.seen.insert(username.clone());
                        return Some((Ok(username), state));
                    }
                    Some(Err(e)) => return Some((Err(leaf(Origin::Writable)(e)), state)),
                    None => state.writable = None,
                }
            }

            loop {
                let next = state.read_only.next().await?;
                match next {
                    // A directory may yield case variants of one name.
                    Ok(username) if !state.seen.insert(username.clone()) => {}
                    Ok(username) => return Some((Ok(username), state)),
                    Err(e) => return Some((Err(leaf(Origin::ReadOnly)(e)), state)),
                }
            }
        })
        .boxed()
    }

    /// Counts the distinct usernames across both leaves.
    ///
    /// ## Errors
    ///
    /// Returns the first leaf failure encountered while enumerating.
    pub async fn count(&self) -> FederationResult<usize> {
        self.list().try_fold(0, |n, _| async move { Ok(n + 1) }).await
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Creates a writable user with no extra attributes.
    ///
    /// ## Errors
    ///
    /// See [`create_with_attributes`](Self::create_with_attributes).
    pub async fn create(
        &self,
        username: &Username,
        credential: &Credential,
    ) -> FederationResult<UserIdentity> {
        self.create_with_attributes(username, credential, UserAttributes::default())
            .await
    }

    /// Creates a writable user.
    ///
    /// Succeeds even if the read-only directory holds the same username; the
    /// new record shadows it.
    ///
    /// ## Errors
    ///
    /// Returns `FederationError::AlreadyExists` if the writable store already
    /// has the username.
    #[tracing::instrument(skip_all, fields(username = %username))]
    pub async fn create_with_attributes(
        &self,
        username: &Username,
        credential: &Credential,
        attributes: UserAttributes,
    ) -> FederationResult<UserIdentity> {
        let result = self
            .writable
            .create(username, credential, attributes)
            .await
            .map_err(leaf(Origin::Writable));
        audit(EventType::UserCreated, username, &result);

        let identity = result?;
        tracing::info!("Writable identity created");
        self.report_shadowing(username).await;
        Ok(identity)
    }

    /// Replaces a user's attributes.
    ///
    /// A user known only to the read-only directory is copied up into a
    /// writable record carrying the new attributes. That record has no
    /// credential until one is set.
    ///
    /// ## Errors
    ///
    /// Returns `FederationError::NotFound` if neither leaf has the user.
    #[tracing::instrument(skip_all, fields(username = %username))]
    pub async fn update(
        &self,
        username: &Username,
        attributes: UserAttributes,
    ) -> FederationResult<UserIdentity> {
        let result = self.update_or_copy_up(username, attributes).await;
        audit(EventType::UserUpdated, username, &result);
        result
    }

    async fn update_or_copy_up(
        &self,
        username: &Username,
        attributes: UserAttributes,
    ) -> FederationResult<UserIdentity> {
        match self.writable.update(username, attributes.clone()).await {
            Err(e) if e.is_not_found() => {}
            other => return other.map_err(leaf(Origin::Writable)),
        }

        if !self.read_only_has(username).await? {
            return Err(FederationError::user_not_found(username.as_str()));
        }

        match self
            .writable
            .create_without_credential(username, attributes.clone())
            .await
        {
            Ok(identity) => {
                shadowed(username, "update");
                tracing::warn!(
                    username = %username,
                    "Copied-up identity has no credential and cannot authenticate until one is set"
                );
                Ok(identity)
            }
            // Lost a race with a concurrent create; update the winner.
            Err(e) if e.is_duplicate() => self
                .writable
                .update(username, attributes)
                .await
                .map_err(leaf(Origin::Writable)),
            Err(e) => Err(leaf(Origin::Writable)(e)),
        }
    }

    /// Replaces a user's credential.
    ///
    /// A user known only to the read-only directory is copied up into a
    /// writable record carrying its directory attributes and the new
    /// credential.
    ///
    /// ## Errors
    ///
    /// Returns `FederationError::NotFound` if neither leaf has the user.
    #[tracing::instrument(skip_all, fields(username = %username))]
    pub async fn change_credential(
        &self,
        username: &Username,
        credential: &Credential,
    ) -> FederationResult<()> {
        let result = self.change_credential_or_copy_up(username, credential).await;
        audit(EventType::CredentialUpdated, username, &result);
        result
    }

    async fn change_credential_or_copy_up(
        &self,
        username: &Username,
        credential: &Credential,
    ) -> FederationResult<()> {
        match self.writable.change_credential(username, credential).await {
            Err(e) if e.is_not_found() => {}
            other => return other.map_err(leaf(Origin::Writable)),
        }

        let Some(source) = self
            .read_only
            .get(username)
            .await
            .map_err(leaf(Origin::ReadOnly))?
        else {
            return Err(FederationError::user_not_found(username.as_str()));
        };

        match self
            .writable
            .create(username, credential, source.attributes)
            .await
        {
            Ok(_) => {
                shadowed(username, "change_credential");
                Ok(())
            }
            Err(e) if e.is_duplicate() => self
                .writable
                .change_credential(username, credential)
                .await
                .map_err(leaf(Origin::Writable)),
            Err(e) => Err(leaf(Origin::Writable)(e)),
        }
    }

    /// Deletes a writable user.
    ///
    /// If the read-only directory has the same username, lookups revert to
    /// the directory identity.
    ///
    /// ## Errors
    ///
    /// Returns `FederationError::NotFound` if the writable store has no
    /// record, including for users known only to the read-only directory.
    #[tracing::instrument(skip_all, fields(username = %username))]
    pub async fn delete(&self, username: &Username) -> FederationResult<()> {
        let result = self
            .writable
            .delete(username)
            .await
            .map_err(leaf(Origin::Writable));
        audit(EventType::UserDeleted, username, &result);
        result
    }

    // ========================================================================
    // Shadowing
    // ========================================================================

    async fn read_only_has(&self, username: &Username) -> FederationResult<bool> {
        self.read_only
            .exists(username)
            .await
            .map_err(leaf(Origin::ReadOnly))
    }

    /// Best-effort check after a create; never fails the create.
    async fn report_shadowing(&self, username: &Username) {
        match self.read_only.exists(username).await {
            Ok(true) => shadowed(username, "create"),
            Ok(false) => {}
            Err(e) => tracing::warn!(
                username = %username,
                error = %e,
                "Could not check the read-only directory for a shadowed identity"
            ),
        }
    }
}

struct UnionState<'a> {
    writable: Option<UsernameStream<'a>>,
    read_only: UsernameStream<'a>,
    seen: HashSet<Username>,
}

fn audit<T>(event_type: EventType, username: &Username, result: &FederationResult<T>) {
    let event = EventBuilder::new(event_type)
        .user(username.as_str())
        .origin(Origin::Writable.as_str());
    match result {
        Ok(_) => event.success().emit(),
        Err(e) => event.failure(e.to_string()).emit(),
    }
}

fn shadowed(username: &Username, operation: &str) {
    tracing::info!(username = %username, operation, "Writable identity shadows a read-only identity");
    EventBuilder::new(EventType::IdentityShadowed)
        .user(username.as_str())
        .origin(Origin::Writable.as_str())
        .detail("shadowed_origin", Origin::ReadOnly.as_str())
        .detail("operation", operation)
        .emit();
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use ud_storage::{ReadOnlyDirectory, ReadOnlyUserRepository, StorageError, StorageResult};
    use ud_storage_memory::{InMemoryUserStore, PasswordHasherService, PasswordPolicy, StaticDirectory};

    use super::*;

    fn hasher() -> PasswordHasherService {
        PasswordHasherService::new(PasswordPolicy::new().memory_cost(1024).time_cost(1))
    }

    fn name(raw: &str) -> Username {
        UsernamePolicy::default().parse(raw).unwrap()
    }

    /// alice is writable, bob and dora are read-only.
    async fn directory() -> CombinedUserDirectory {
        let writable = InMemoryUserStore::new(hasher());
        writable
            .create(&name("alice"), &Credential::new("alicepw"), UserAttributes::default())
            .await
            .unwrap();

        let mut static_dir = StaticDirectory::new(hasher());
        static_dir
            .insert(
                name("bob"),
                UserAttributes::new().with_display_name("Bob (LDAP)"),
                Some("bobpw"),
            )
            .unwrap();
        static_dir
            .insert(name("dora"), UserAttributes::default(), Some("dorapw"))
            .unwrap();

        CombinedUserDirectory::new(
            Arc::new(writable),
            Arc::new(ReadOnlyUserRepository::new(static_dir)),
            UsernamePolicy::default(),
        )
        .unwrap()
    }

    /// A leaf whose every call fails as if the network were down.
    struct Unreachable(Origin);

    #[async_trait]
    impl UserRepository for Unreachable {
        fn origin(&self) -> Origin {
            self.0
        }

        async fn get(&self, _: &Username) -> StorageResult<Option<UserIdentity>> {
            Err(StorageError::unavailable("connection refused"))
        }

        async fn create(
            &self,
            _: &Username,
            _: &Credential,
            _: UserAttributes,
        ) -> StorageResult<UserIdentity> {
            Err(StorageError::unavailable("connection refused"))
        }

        async fn update(&self, _: &Username, _: UserAttributes) -> StorageResult<UserIdentity> {
            Err(StorageError::unavailable("connection refused"))
        }

        async fn delete(&self, _: &Username) -> StorageResult<()> {
            Err(StorageError::unavailable("connection refused"))
        }

        async fn change_credential(&self, _: &Username, _: &Credential) -> StorageResult<()> {
            Err(StorageError::unavailable("connection refused"))
        }

        async fn verify_credential(&self, _: &Username, _: &Credential) -> StorageResult<bool> {
            Err(StorageError::unavailable("connection refused"))
        }

        fn list(&self) -> UsernameStream<'_> {
            stream::iter(vec![Err(StorageError::unavailable("connection refused"))]).boxed()
        }

        async fn test_connection(&self) -> StorageResult<()> {
            Err(StorageError::unavailable("connection refused"))
        }
    }

    #[tokio::test]
    async fn rejects_swapped_leaves() {
        let writable: Arc<dyn UserRepository> = Arc::new(InMemoryUserStore::new(hasher()));
        let result = CombinedUserDirectory::new(
            Arc::clone(&writable),
            writable,
            UsernamePolicy::default(),
        );
        assert!(matches!(result, Err(FederationError::Configuration(_))));
    }

    #[tokio::test]
    async fn exists_checks_both_leaves() {
        let dir = directory().await;
        assert!(dir.exists(&name("alice")).await.unwrap());
        assert!(dir.exists(&name("bob")).await.unwrap());
        assert!(!dir.exists(&name("carol")).await.unwrap());
    }

    #[tokio::test]
    async fn writable_record_shadows_read_only() {
        let dir = directory().await;
        let bob = name("bob");

        assert_eq!(dir.get(&bob).await.unwrap().unwrap().origin, Origin::ReadOnly);

        let created = dir.create(&bob, &Credential::new("localpw")).await.unwrap();
        assert_eq!(created.origin, Origin::Writable);
        assert_eq!(dir.get(&bob).await.unwrap().unwrap().origin, Origin::Writable);

        // Credentials are checked against the shadow only.
        assert!(dir.authenticate(&bob, &Credential::new("localpw")).await.unwrap());
        assert!(!dir.authenticate(&bob, &Credential::new("bobpw")).await.unwrap());

        dir.delete(&bob).await.unwrap();
        let reverted = dir.get(&bob).await.unwrap().unwrap();
        assert_eq!(reverted.origin, Origin::ReadOnly);
        assert!(dir.authenticate(&bob, &Credential::new("bobpw")).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_writable_create_fails() {
        let dir = directory().await;
        let err = dir
            .create(&name("alice"), &Credential::new("x"))
            .await
            .unwrap_err();
        assert!(err.is_already_exists());
    }

    #[tokio::test]
    async fn authenticate_routes_by_origin() {
        let dir = directory().await;
        assert!(dir.authenticate(&name("alice"), &Credential::new("alicepw")).await.unwrap());
        assert!(!dir.authenticate(&name("alice"), &Credential::new("bobpw")).await.unwrap());
        assert!(dir.authenticate(&name("bob"), &Credential::new("bobpw")).await.unwrap());
        assert!(!dir.authenticate(&name("carol"), &Credential::new("any")).await.unwrap());
    }

    #[tokio::test]
    async fn update_copies_read_only_user_up() {
        let dir = directory().await;
        let bob = name("bob");

        let updated = dir
            .update(&bob, UserAttributes::new().with_email("bob@example.com"))
            .await
            .unwrap();

        assert_eq!(updated.origin, Origin::Writable);
        assert_eq!(updated.attributes.email.as_deref(), Some("bob@example.com"));
        assert!(!updated.credential.is_present());
        assert_eq!(dir.get(&bob).await.unwrap().unwrap(), updated);
    }

    #[tokio::test]
    async fn change_credential_copies_read_only_user_up() {
        let dir = directory().await;
        let bob = name("bob");

        dir.change_credential(&bob, &Credential::new("newpw")).await.unwrap();

        let identity = dir.get(&bob).await.unwrap().unwrap();
        assert_eq!(identity.origin, Origin::Writable);
        assert_eq!(identity.attributes.display_name.as_deref(), Some("Bob (LDAP)"));
        assert!(dir.authenticate(&bob, &Credential::new("newpw")).await.unwrap());
    }

    #[tokio::test]
    async fn mutations_of_unknown_users_are_not_found() {
        let dir = directory().await;
        let carol = name("carol");

        assert!(dir
            .update(&carol, UserAttributes::default())
            .await
            .unwrap_err()
            .is_not_found());
        assert!(dir
            .change_credential(&carol, &Credential::new("x"))
            .await
            .unwrap_err()
            .is_not_found());
        assert!(dir.delete(&carol).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn delete_of_read_only_user_is_not_found() {
        let dir = directory().await;
        let bob = name("bob");

        assert!(dir.delete(&bob).await.unwrap_err().is_not_found());
        assert!(dir.exists(&bob).await.unwrap());
    }

    #[tokio::test]
    async fn list_is_a_deduplicated_union() {
        let dir = directory().await;
        dir.create(&name("bob"), &Credential::new("x")).await.unwrap();

        let mut names: Vec<String> = dir
            .list()
            .map_ok(|u| u.as_str().to_string())
            .try_collect()
            .await
            .unwrap();
        names.sort();

        assert_eq!(names, ["alice", "bob", "dora"]);
        assert_eq!(dir.count().await.unwrap(), 3);
    }

    /// Yields every listed name as is, even when two normalize alike.
    struct CaseVariantDirectory;

    #[async_trait]
    impl ReadOnlyDirectory for CaseVariantDirectory {
        fn directory_type(&self) -> &'static str {
            "case-variants"
        }

        async fn get(&self, username: &Username) -> StorageResult<Option<UserIdentity>> {
            Ok((username.as_str() == "bob")
                .then(|| UserIdentity::new(username.clone(), Origin::ReadOnly)))
        }

        async fn verify_credential(&self, _: &Username, _: &Credential) -> StorageResult<bool> {
            Ok(false)
        }

        fn list(&self) -> UsernameStream<'_> {
            stream::iter(vec![Ok(name("Bob")), Ok(name("bob"))]).boxed()
        }
    }

    #[tokio::test]
    async fn list_skips_repeated_read_only_names() {
        let dir = CombinedUserDirectory::new(
            Arc::new(InMemoryUserStore::new(hasher())),
            Arc::new(ReadOnlyUserRepository::new(CaseVariantDirectory)),
            UsernamePolicy::default(),
        )
        .unwrap();

        let names: Vec<String> = dir
            .list()
            .map_ok(|u| u.as_str().to_string())
            .try_collect()
            .await
            .unwrap();

        assert_eq!(names, ["bob"]);
        assert_eq!(dir.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn read_only_outage_is_not_absence() {
        let dir = CombinedUserDirectory::new(
            Arc::new(InMemoryUserStore::new(hasher())),
            Arc::new(Unreachable(Origin::ReadOnly)),
            UsernamePolicy::default(),
        )
        .unwrap();
        let ghost = name("ghost");

        let err = dir.exists(&ghost).await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(err.origin(), Some(Origin::ReadOnly));

        assert!(dir.get(&ghost).await.unwrap_err().is_transient());
        assert!(dir
            .authenticate(&ghost, &Credential::new("x"))
            .await
            .unwrap_err()
            .is_transient());
        assert!(dir.initialize().await.unwrap_err().is_transient());
        assert!(dir.list().try_collect::<Vec<_>>().await.unwrap_err().is_transient());
    }

    #[tokio::test]
    async fn writable_hit_short_circuits_read_only_outage() {
        let writable = InMemoryUserStore::new(hasher());
        let erin = name("erin");
        writable
            .create(&erin, &Credential::new("pw"), UserAttributes::default())
            .await
            .unwrap();
        let dir = CombinedUserDirectory::new(
            Arc::new(writable),
            Arc::new(Unreachable(Origin::ReadOnly)),
            UsernamePolicy::default(),
        )
        .unwrap();

        assert!(dir.exists(&erin).await.unwrap());
        assert!(dir.authenticate(&erin, &Credential::new("pw")).await.unwrap());
    }

    #[tokio::test]
    async fn create_survives_failed_shadow_probe() {
        let dir = CombinedUserDirectory::new(
            Arc::new(InMemoryUserStore::new(hasher())),
            Arc::new(Unreachable(Origin::ReadOnly)),
            UsernamePolicy::default(),
        )
        .unwrap();

        let created = dir.create(&name("frank"), &Credential::new("pw")).await.unwrap();
        assert_eq!(created.origin, Origin::Writable);
    }

    #[tokio::test]
    async fn writable_outage_is_reported_with_origin() {
        let dir = CombinedUserDirectory::new(
            Arc::new(Unreachable(Origin::Writable)),
            Arc::new(ReadOnlyUserRepository::new(StaticDirectory::new(hasher()))),
            UsernamePolicy::default(),
        )
        .unwrap();

        let err = dir.create(&name("gus"), &Credential::new("pw")).await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(err.origin(), Some(Origin::Writable));
    }

    #[test]
    fn administrators_are_separate_from_delegation() {
        let dir = CombinedUserDirectory::new(
            Arc::new(InMemoryUserStore::new(hasher())),
            Arc::new(ReadOnlyUserRepository::new(StaticDirectory::new(hasher()))),
            UsernamePolicy::default(),
        )
        .unwrap()
        .with_administrators([name("root")]);

        assert!(dir.is_administrator(&name("root")));
        assert!(!dir.is_administrator(&name("alice")));
        assert_eq!(dir.parse_username(" Root ").unwrap(), name("root"));
    }
}
