mod identity;

pub use identity::ReplicaId;
pub use identity::ReplicaIdentity;
pub use identity::ReplicaLayout;
pub use identity::ValidationError;
