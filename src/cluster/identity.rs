use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

/// ReplicaId is the stable identity of a replica. It never changes across restarts of the
/// replica's process.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ReplicaId(u32);

impl ReplicaId {
    pub fn new(id: u32) -> Self {
        ReplicaId(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ReplicaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ReplicaIdentity is everything derived from a replica's id: where it listens and what its
/// process is called.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReplicaIdentity {
    id: ReplicaId,
    ip_addr: Ipv4Addr,
    port: u16,
}

impl ReplicaIdentity {
    pub fn id(&self) -> ReplicaId {
        self.id
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.ip_addr, self.port))
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.socket_addr())
    }

    /// Label given to the replica's OS process (argv[0]). Numbered from 1.
    pub fn process_label(&self) -> String {
        format!("raftserver{}", self.id.as_u32() + 1)
    }
}

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("replica id {id} is out of range [0, {max_replicas})")]
    ReplicaIdOutOfRange { id: i64, max_replicas: u32 },
    #[error("cluster size {size} is out of range [1, {max_replicas}]")]
    ClusterSizeOutOfRange { size: i64, max_replicas: u32 },
    #[error("port {port} for replica id {id} is out of range [1, 65535]")]
    PortOutOfRange { id: i64, port: u64 },
}

/// ReplicaLayout maps replica ids onto ports: `port(id) = base_port + id`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReplicaLayout {
    ip_addr: Ipv4Addr,
    base_port: u16,
    max_replicas: u32,
}

impl ReplicaLayout {
    pub fn new(ip_addr: Ipv4Addr, base_port: u16, max_replicas: u32) -> Self {
        ReplicaLayout {
            ip_addr,
            base_port,
            max_replicas,
        }
    }

    pub fn max_replicas(&self) -> u32 {
        self.max_replicas
    }

    pub fn base_port(&self) -> u16 {
        self.base_port
    }

    pub fn ip_addr(&self) -> Ipv4Addr {
        self.ip_addr
    }

    /// Validate a raw id (as it arrives off the wire) and derive its identity.
    pub fn identity(&self, raw_id: i64) -> Result<ReplicaIdentity, ValidationError> {
        if raw_id < 0 || raw_id >= i64::from(self.max_replicas) {
            return Err(ValidationError::ReplicaIdOutOfRange {
                id: raw_id,
                max_replicas: self.max_replicas,
            });
        }

        let port = u64::from(self.base_port) + raw_id as u64;
        if port < 1 || port > u64::from(u16::MAX) {
            return Err(ValidationError::PortOutOfRange { id: raw_id, port });
        }

        Ok(ReplicaIdentity {
            id: ReplicaId::new(raw_id as u32),
            ip_addr: self.ip_addr,
            port: port as u16,
        })
    }

    /// Validate a requested cluster size and derive identities for ids `0..size`.
    pub fn cluster(&self, size: i64) -> Result<Vec<ReplicaIdentity>, ValidationError> {
        if size <= 0 || size > i64::from(self.max_replicas) {
            return Err(ValidationError::ClusterSizeOutOfRange {
                size,
                max_replicas: self.max_replicas,
            });
        }

        (0..size).map(|id| self.identity(id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(base_port: u16) -> ReplicaLayout {
        ReplicaLayout::new(Ipv4Addr::LOCALHOST, base_port, 5)
    }

    #[test]
    fn port_is_base_plus_id() {
        for base_port in [1u16, 9001, 40000, 65531].iter() {
            let layout = layout(*base_port);
            for id in 0..5 {
                let identity = layout.identity(id).unwrap();
                assert_eq!(identity.id(), ReplicaId::new(id as u32));
                assert_eq!(u64::from(identity.port()), u64::from(*base_port) + id as u64);
            }
        }
    }

    #[test]
    fn id_out_of_range() {
        let layout = layout(9001);
        assert_eq!(
            layout.identity(-1),
            Err(ValidationError::ReplicaIdOutOfRange { id: -1, max_replicas: 5 })
        );
        assert_eq!(
            layout.identity(5),
            Err(ValidationError::ReplicaIdOutOfRange { id: 5, max_replicas: 5 })
        );
    }

    #[test]
    fn port_overflow() {
        let layout = layout(65534);
        assert!(layout.identity(1).is_ok());
        assert_eq!(
            layout.identity(2),
            Err(ValidationError::PortOutOfRange { id: 2, port: 65536 })
        );
    }

    #[test]
    fn cluster_sizes() {
        let layout = layout(9001);
        assert!(layout.cluster(0).is_err());
        assert!(layout.cluster(6).is_err());

        for size in 1..=5 {
            let ids: Vec<u32> = layout
                .cluster(size)
                .unwrap()
                .into_iter()
                .map(|identity| identity.id().as_u32())
                .collect();
            assert_eq!(ids, (0..size as u32).collect::<Vec<_>>());
        }
    }

    #[test]
    fn process_label_is_one_based() {
        let identity = layout(9001).identity(2).unwrap();
        assert_eq!(identity.process_label(), "raftserver3");
        assert_eq!(identity.url(), "http://127.0.0.1:9003");
    }
}
