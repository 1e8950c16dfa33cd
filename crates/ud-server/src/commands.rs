//! Command implementations.

use futures::TryStreamExt;

use crate::bootstrap::DirectoryServices;

/// Reports backend reachability and the number of distinct users.
///
/// ## Errors
///
/// Fails if a backend cannot answer.
pub async fn run_check(services: &DirectoryServices) -> anyhow::Result<String> {
    services.directory.initialize().await?;
    let users = services.directory.count().await?;
    Ok(format!(
        "readonly-directory: {}\nusers: {users}",
        services.config.readonly_directory.driver()
    ))
}

/// Lists every username, one per line.
///
/// ## Errors
///
/// Fails if a backend cannot answer.
pub async fn run_list_users(services: &DirectoryServices) -> anyhow::Result<Vec<String>> {
    Ok(services
        .directory
        .list()
        .map_ok(|username| username.to_string())
        .try_collect()
        .await?)
}

/// Answers an impersonation question.
///
/// ## Errors
///
/// Fails on an invalid username or a delegation store outage.
pub async fn run_can_act_as(
    services: &DirectoryServices,
    acting: &str,
    target: &str,
) -> anyhow::Result<bool> {
    let acting = services.directory.parse_username(acting)?;
    let target = services.directory.parse_username(target)?;
    Ok(services.authorizator.can_act_as(&acting, &target).await?)
}
