//! In-memory delegation store.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use parking_lot::RwLock;
use ud_model::{DelegationRelation, Username};
use ud_storage::{DelegationStore, StorageError, StorageResult};

const ENTITY: &str = "Delegation";

#[derive(Debug, Default)]
struct Relations {
    /// grantee -> grantors
    by_grantee: BTreeMap<Username, BTreeSet<Username>>,
    /// grantor -> grantees
    by_grantor: BTreeMap<Username, BTreeSet<Username>>,
}

impl Relations {
    fn unlink(&mut self, grantor: &Username, grantee: &Username) -> bool {
        let removed = remove_pair(&mut self.by_grantee, grantee, grantor);
        if removed {
            remove_pair(&mut self.by_grantor, grantor, grantee);
        }
        removed
    }
}

fn remove_pair(
    index: &mut BTreeMap<Username, BTreeSet<Username>>,
    key: &Username,
    value: &Username,
) -> bool {
    let Some(values) = index.get_mut(key) else {
        return false;
    };
    let removed = values.remove(value);
    if values.is_empty() {
        index.remove(key);
    }
    removed
}

/// Delegation relations held in process memory.
///
/// Both indexes sit behind one lock so a relation is never visible in one
/// direction only.
#[derive(Debug, Default)]
pub struct InMemoryDelegationStore {
    relations: RwLock<Relations>,
}

impl InMemoryDelegationStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DelegationStore for InMemoryDelegationStore {
    async fn grant(&self, grantor: &Username, grantee: &Username) -> StorageResult<bool> {
        let mut relations = self.relations.write();
        let added = relations
            .by_grantee
            .entry(grantee.clone())
            .or_default()
            .insert(grantor.clone());
        if added {
            relations
                .by_grantor
                .entry(grantor.clone())
                .or_default()
                .insert(grantee.clone());
        }
        Ok(added)
    }

    async fn revoke(&self, grantor: &Username, grantee: &Username) -> StorageResult<()> {
        if self.relations.write().unlink(grantor, grantee) {
            Ok(())
        } else {
            Err(StorageError::not_found(
                ENTITY,
                DelegationRelation::new(grantor.clone(), grantee.clone()).to_string(),
            ))
        }
    }

    async fn list_grantors_for(&self, grantee: &Username) -> StorageResult<Vec<Username>> {
        Ok(self
            .relations
            .read()
            .by_grantee
            .get(grantee)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn list_grantees_of(&self, grantor: &Username) -> StorageResult<Vec<Username>> {
        Ok(self
            .relations
            .read()
            .by_grantor
            .get(grantor)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn clear_grantor(&self, grantor: &Username) -> StorageResult<usize> {
        let mut relations = self.relations.write();
        let Some(grantees) = relations.by_grantor.remove(grantor) else {
            return Ok(0);
        };
        for grantee in &grantees {
            remove_pair(&mut relations.by_grantee, grantee, grantor);
        }
        Ok(grantees.len())
    }

    fn relations(&self) -> BoxStream<'_, StorageResult<DelegationRelation>> {
        let snapshot: Vec<DelegationRelation> = self
            .relations
            .read()
            .by_grantor
            .iter()
            .flat_map(|(grantor, grantees)| {
                grantees
                    .iter()
                    .map(move |grantee| DelegationRelation::new(grantor.clone(), grantee.clone()))
            })
            .collect();
        stream::iter(snapshot.into_iter().map(Ok)).boxed()
    }

    async fn is_granted(&self, grantor: &Username, grantee: &Username) -> StorageResult<bool> {
        Ok(self
            .relations
            .read()
            .by_grantee
            .get(grantee)
            .is_some_and(|set| set.contains(grantor)))
    }
}
