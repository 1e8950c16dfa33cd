//! Writable-first precedence and shadowing.

use futures::TryStreamExt;
use ud_model::{Credential, Origin, UserAttributes, Username};

use crate::common::TestEnv;

#[tokio::test]
async fn existence_across_backends() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let directory = &env.services.directory;

    assert!(directory.exists(&env.user("alice")).await?);
    assert!(directory.exists(&env.user("bob")).await?);
    assert!(!directory.exists(&env.user("carol")).await?);
    Ok(())
}

#[tokio::test]
async fn writable_only_user_behaves_like_a_plain_store() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let alice = env
        .services
        .directory
        .get(&env.user("Alice"))
        .await?
        .expect("alice resolves");
    assert_eq!(alice.origin, Origin::Writable);
    assert_eq!(alice.attributes.display_name.as_deref(), Some("Alice"));

    assert!(env.login("alice", "alice-secret").await?);
    assert!(!env.login("alice", "wrong").await?);
    Ok(())
}

#[tokio::test]
async fn read_only_user_resolves_with_read_only_origin() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let bob = env
        .services
        .directory
        .get(&env.user("bob"))
        .await?
        .expect("bob resolves");
    assert_eq!(bob.origin, Origin::ReadOnly);
    assert_eq!(bob.attributes.email.as_deref(), Some("bob@directory.example"));

    assert!(env.login("bob", "bob-secret").await?);
    assert!(!env.login("bob", "").await?);
    // Declared without a password.
    assert!(!env.login("dora", "").await?);
    assert!(!env.login("carol", "anything").await?);
    Ok(())
}

#[tokio::test]
async fn create_shadows_until_deleted() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let directory = &env.services.directory;
    let bob = env.user("bob");

    let created = directory
        .create_with_attributes(
            &bob,
            &Credential::new("local-secret"),
            UserAttributes::new().with_display_name("Bob (local)"),
        )
        .await?;
    assert_eq!(created.origin, Origin::Writable);

    let effective = directory.get(&bob).await?.expect("bob resolves");
    assert_eq!(effective.origin, Origin::Writable);
    assert_eq!(effective.attributes.display_name.as_deref(), Some("Bob (local)"));
    assert!(env.login("bob", "local-secret").await?);
    assert!(!env.login("bob", "bob-secret").await?);

    // A second writable create for the same name is a conflict.
    let err = directory
        .create(&bob, &Credential::new("again"))
        .await
        .unwrap_err();
    assert!(err.is_already_exists());

    directory.delete(&bob).await?;
    let reverted = directory.get(&bob).await?.expect("bob resolves");
    assert_eq!(reverted.origin, Origin::ReadOnly);
    assert!(env.login("bob", "bob-secret").await?);
    Ok(())
}

#[tokio::test]
async fn mutations_of_read_only_users_copy_up() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let directory = &env.services.directory;
    let (bob, dora) = (env.user("bob"), env.user("dora"));

    directory
        .change_credential(&bob, &Credential::new("rotated"))
        .await?;
    let shadow = directory.get(&bob).await?.expect("bob resolves");
    assert_eq!(shadow.origin, Origin::Writable);
    assert_eq!(shadow.attributes.display_name.as_deref(), Some("Bob (directory)"));
    assert!(env.login("bob", "rotated").await?);

    let updated = directory
        .update(&dora, UserAttributes::new().with_email("dora@example.com"))
        .await?;
    assert_eq!(updated.origin, Origin::Writable);
    // No credential until one is set.
    assert!(!env.login("dora", "").await?);

    // The read-only directory itself is untouched.
    directory.delete(&dora).await?;
    let original = directory.get(&dora).await?.expect("dora resolves");
    assert_eq!(original.origin, Origin::ReadOnly);
    assert_eq!(original.attributes.email, None);
    Ok(())
}

#[tokio::test]
async fn delete_of_read_only_only_user_is_not_found() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let directory = &env.services.directory;

    let err = directory.delete(&env.user("bob")).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(directory.exists(&env.user("bob")).await?);

    let err = directory
        .update(&env.user("carol"), UserAttributes::new())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    Ok(())
}

#[tokio::test]
async fn list_has_no_duplicates() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let directory = &env.services.directory;
    directory
        .create(&env.user("bob"), &Credential::new("local"))
        .await?;

    let mut users: Vec<Username> = directory.list().try_collect().await?;
    users.sort();
    assert_eq!(users, vec![env.user("alice"), env.user("bob"), env.user("dora")]);
    assert_eq!(directory.count().await?, 3);
    Ok(())
}
