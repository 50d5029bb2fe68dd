use crate::cluster::ReplicaId;
use tokio::sync::RwLock;

/// LeaderCache remembers the last replica known to lead. It is only a hint: any wrongLeader or
/// unreachable reply from the cached replica invalidates it.
#[derive(Default)]
pub(crate) struct LeaderCache {
    leader: RwLock<Option<ReplicaId>>,
}

impl LeaderCache {
    pub(crate) async fn get(&self) -> Option<ReplicaId> {
        *self.leader.read().await
    }

    pub(crate) async fn set(&self, leader: ReplicaId) {
        *self.leader.write().await = Some(leader);
    }

    /// Clear the cache only if it still points at `stale`.
    pub(crate) async fn invalidate(&self, stale: ReplicaId) {
        let mut leader = self.leader.write().await;
        if *leader == Some(stale) {
            *leader = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalidate_only_matching() {
        let cache = LeaderCache::default();
        assert_eq!(cache.get().await, None);

        cache.set(ReplicaId::new(1)).await;
        cache.invalidate(ReplicaId::new(2)).await;
        assert_eq!(cache.get().await, Some(ReplicaId::new(1)));

        cache.invalidate(ReplicaId::new(1)).await;
        assert_eq!(cache.get().await, None);
    }
}
