//! Delegation grants and impersonation checks.

use ud_model::Credential;

use crate::common::TestEnv;

#[tokio::test]
async fn scenario_alice_bob_carol() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let services = &env.services;
    let (alice, bob, carol) = (env.user("alice"), env.user("bob"), env.user("carol"));

    assert!(services.directory.exists(&alice).await?);
    assert!(services.directory.exists(&bob).await?);
    assert!(!services.directory.exists(&carol).await?);

    services.directory.create(&bob, &Credential::new("local")).await?;
    assert!(services.directory.get(&bob).await?.is_some_and(|u| u.is_writable()));

    services.admin.grant(&alice, &bob).await?;
    assert!(services.authorizator.can_act_as(&bob, &alice).await?);
    assert!(!services.authorizator.can_act_as(&alice, &bob).await?);
    Ok(())
}

#[tokio::test]
async fn self_action_never_depends_on_the_directory() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let authorizator = &env.services.authorizator;

    for raw in ["alice", "bob", "nobody-at-all"] {
        let user = env.user(raw);
        assert!(authorizator.can_act_as(&user, &user).await?);
    }
    Ok(())
}

#[tokio::test]
async fn grant_then_revoke() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let services = &env.services;
    let (alice, dora) = (env.user("alice"), env.user("dora"));

    assert!(services.admin.grant(&alice, &dora).await?);
    assert!(services.authorizator.can_act_as(&dora, &alice).await?);

    services.admin.revoke(&alice, &dora).await?;
    assert!(!services.authorizator.can_act_as(&dora, &alice).await?);

    let err = services.admin.revoke(&alice, &dora).await.unwrap_err();
    assert!(err.is_not_found());
    Ok(())
}

#[tokio::test]
async fn repeated_grant_keeps_one_relation() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let services = &env.services;
    let (alice, bob) = (env.user("alice"), env.user("bob"));

    assert!(services.admin.grant(&alice, &bob).await?);
    assert!(!services.admin.grant(&alice, &bob).await?);
    assert_eq!(services.delegations.list_grantors_for(&bob).await?, vec![alice.clone()]);
    assert_eq!(services.admin.list_grantees_of(&alice).await?, vec![bob]);
    Ok(())
}

#[tokio::test]
async fn grants_require_resolvable_users() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let err = env
        .services
        .admin
        .grant(&env.user("alice"), &env.user("carol"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    Ok(())
}

#[tokio::test]
async fn deleted_users_leave_relations_until_purged() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let services = &env.services;
    let (alice, bob) = (env.user("alice"), env.user("bob"));

    services.admin.grant(&alice, &bob).await?;
    services.directory.delete(&alice).await?;
    assert!(services.authorizator.can_act_as(&bob, &alice).await?);

    let report = services.admin.purge_dangling().await?;
    assert_eq!(report.examined, 1);
    assert_eq!(report.removed.len(), 1);
    assert!(!services.authorizator.can_act_as(&bob, &alice).await?);
    Ok(())
}

#[tokio::test]
async fn administrators_come_from_configuration() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let directory = &env.services.directory;

    assert!(directory.is_administrator(&env.user("Admin")));
    assert!(!directory.is_administrator(&env.user("alice")));
    // Administration does not grant impersonation.
    assert!(!env
        .services
        .authorizator
        .can_act_as(&env.user("admin"), &env.user("alice"))
        .await?);
    Ok(())
}
