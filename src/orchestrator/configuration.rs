use crate::cluster::{ReplicaId, ReplicaIdentity};
use std::collections::BTreeMap;

/// ClusterConfiguration is the set of replicas the orchestrator expects to exist. Entries are
/// added by StartCluster/StartReplica and are never removed, so a stopped replica keeps its id
/// and port.
#[derive(Debug, Default)]
pub struct ClusterConfiguration {
    replicas: BTreeMap<ReplicaId, ReplicaIdentity>,
}

impl ClusterConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reserve(&mut self, identity: ReplicaIdentity) {
        self.replicas.insert(identity.id(), identity);
    }

    /// Highest id ever requested, plus one.
    pub fn size(&self) -> u32 {
        self.replicas
            .keys()
            .next_back()
            .map(|id| id.as_u32() + 1)
            .unwrap_or(0)
    }

    pub fn get(&self, id: ReplicaId) -> Option<&ReplicaIdentity> {
        self.replicas.get(&id)
    }

    pub fn members(&self) -> Vec<ReplicaIdentity> {
        self.replicas.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ReplicaLayout;
    use std::net::Ipv4Addr;

    #[test]
    fn never_shrinks() {
        let layout = ReplicaLayout::new(Ipv4Addr::LOCALHOST, 9001, 5);
        let mut configuration = ClusterConfiguration::new();
        assert_eq!(configuration.size(), 0);

        for identity in layout.cluster(3).unwrap() {
            configuration.reserve(identity);
        }
        assert_eq!(configuration.size(), 3);

        // Restarting an id re-reserves the same identity.
        configuration.reserve(layout.identity(1).unwrap());
        assert_eq!(configuration.members().len(), 3);

        configuration.reserve(layout.identity(4).unwrap());
        assert_eq!(configuration.size(), 5);
        assert_eq!(configuration.members().len(), 4);
        assert_eq!(configuration.get(ReplicaId::new(4)).unwrap().port(), 9005);
    }
}
