//! Backend outages surface as errors, never as "absent" or "denied".

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use futures::TryStreamExt;
use ud_auth::{Authorizator, DelegationAdmin};
use ud_federation::CombinedUserDirectory;
use ud_model::{
    Credential, CredentialReference, Origin, UserIdentity, Username, UsernamePolicy,
};
use ud_storage::{
    DelegationStore, ReadOnlyDirectory, ReadOnlyUserRepository, StorageError, StorageResult,
    UserRepository, UsernameStream,
};
use ud_storage_memory::{
    InMemoryDelegationStore, InMemoryUserStore, PasswordHasherService, PasswordPolicy,
};

/// A directory holding only "bob" that can be switched off.
struct FlakyDirectory {
    down: Arc<AtomicBool>,
    bob: Username,
}

impl FlakyDirectory {
    fn check(&self) -> StorageResult<()> {
        if self.down.load(Ordering::SeqCst) {
            Err(StorageError::unavailable("directory unreachable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ReadOnlyDirectory for FlakyDirectory {
    fn directory_type(&self) -> &'static str {
        "flaky"
    }

    async fn get(&self, username: &Username) -> StorageResult<Option<UserIdentity>> {
        self.check()?;
        Ok((username == &self.bob).then(|| {
            UserIdentity::new(username.clone(), Origin::ReadOnly).with_credential(
                CredentialReference::DirectoryEntry {
                    dn: "uid=bob".to_string(),
                },
            )
        }))
    }

    async fn verify_credential(
        &self,
        username: &Username,
        credential: &Credential,
    ) -> StorageResult<bool> {
        self.check()?;
        Ok(username == &self.bob && credential.expose() == "bob-secret")
    }

    fn list(&self) -> UsernameStream<'_> {
        match self.check() {
            Ok(()) => stream::iter(vec![Ok(self.bob.clone())]).boxed(),
            Err(e) => stream::iter(vec![Err(e)]).boxed(),
        }
    }

    async fn test_connection(&self) -> StorageResult<()> {
        self.check()
    }
}

struct Fixture {
    down: Arc<AtomicBool>,
    directory: Arc<CombinedUserDirectory>,
    delegations: Arc<InMemoryDelegationStore>,
    admin: DelegationAdmin,
}

fn name(raw: &str) -> Username {
    UsernamePolicy::default().parse(raw).unwrap()
}

async fn fixture() -> anyhow::Result<Fixture> {
    let hasher = PasswordHasherService::new(PasswordPolicy::new().memory_cost(1024).time_cost(1));
    let writable = InMemoryUserStore::new(hasher);
    writable
        .create(&name("alice"), &Credential::new("alice-secret"), Default::default())
        .await?;

    let down = Arc::new(AtomicBool::new(false));
    let read_only = ReadOnlyUserRepository::new(FlakyDirectory {
        down: Arc::clone(&down),
        bob: name("bob"),
    });

    let directory = Arc::new(CombinedUserDirectory::new(
        Arc::new(writable),
        Arc::new(read_only),
        UsernamePolicy::default(),
    )?);
    directory.initialize().await?;

    let delegations = Arc::new(InMemoryDelegationStore::new());
    let admin = DelegationAdmin::new(Arc::clone(&directory), delegations.clone());
    Ok(Fixture {
        down,
        directory,
        delegations,
        admin,
    })
}

impl Fixture {
    fn take_directory_down(&self) {
        self.down.store(true, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn authentication_outage_is_distinguishable_from_rejection() -> anyhow::Result<()> {
    let f = fixture().await?;
    f.take_directory_down();

    let err = f
        .directory
        .authenticate(&name("bob"), &Credential::new("bob-secret"))
        .await
        .unwrap_err();
    assert!(err.is_transient());
    assert_eq!(err.origin(), Some(Origin::ReadOnly));

    let err = f.directory.exists(&name("carol")).await.unwrap_err();
    assert!(err.is_transient());
    Ok(())
}

#[tokio::test]
async fn writable_users_are_served_during_a_directory_outage() -> anyhow::Result<()> {
    let f = fixture().await?;
    f.take_directory_down();

    assert!(f
        .directory
        .authenticate(&name("alice"), &Credential::new("alice-secret"))
        .await?);
    assert!(f.directory.exists(&name("alice")).await?);

    // The shadowing probe is best-effort.
    let created = f
        .directory
        .create(&name("erin"), &Credential::new("erin-secret"))
        .await?;
    assert_eq!(created.origin, Origin::Writable);
    Ok(())
}

#[tokio::test]
async fn listing_reports_the_failing_backend() -> anyhow::Result<()> {
    let f = fixture().await?;
    f.take_directory_down();

    let results: Vec<_> = f.directory.list().collect().await;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_ref().unwrap(), &name("alice"));
    let err = results[1].as_ref().unwrap_err();
    assert_eq!(err.origin(), Some(Origin::ReadOnly));

    assert!(f.directory.count().await.is_err());
    Ok(())
}

#[tokio::test]
async fn initialization_fails_when_the_directory_is_down() -> anyhow::Result<()> {
    let f = fixture().await?;
    f.take_directory_down();

    let err = f.directory.initialize().await.unwrap_err();
    assert!(err.is_transient());
    Ok(())
}

#[tokio::test]
async fn authorization_ignores_directory_outages() -> anyhow::Result<()> {
    let f = fixture().await?;
    let authorizator = Authorizator::new(f.delegations.clone());
    f.admin.grant(&name("alice"), &name("bob")).await?;

    f.take_directory_down();
    assert!(authorizator.can_act_as(&name("bob"), &name("alice")).await?);
    assert!(authorizator.can_act_as(&name("ghost"), &name("ghost")).await?);
    Ok(())
}

#[tokio::test]
async fn purge_aborts_without_side_effects_during_an_outage() -> anyhow::Result<()> {
    let f = fixture().await?;
    f.admin.grant(&name("alice"), &name("bob")).await?;
    f.delegations.grant(&name("ghost"), &name("bob")).await?;

    f.take_directory_down();
    let err = f.admin.purge_dangling().await.unwrap_err();
    assert!(err.is_transient());

    let relations: Vec<_> = f.delegations.relations().try_collect().await?;
    assert_eq!(relations.len(), 2);
    Ok(())
}
