//! The consensus engine seam, plus the standalone engine used when leadership is decided
//! outside the cluster (bring-up, tests, operator-driven failover). The standalone engine still
//! replicates its log to the members it leads and commits on a majority.
mod commit_stream;
mod engine;
mod leader_state;
mod peer_client;
mod replicated_log;
mod replication_api;
mod standalone;
mod state_change_listener;
mod term;
mod wiring;

pub use commit_stream::create_commit_stream;
pub use commit_stream::CommitStream;
pub use commit_stream::CommitStreamPublisher;
pub use commit_stream::CommittedEntry;
pub use engine::ConsensusEngine;
pub use engine::EngineState;
pub use engine::EntryId;
pub use engine::Role;
pub use engine::SubmitError;
pub use standalone::AssignRoleError;
pub use standalone::RoleAssignment;
pub use state_change_listener::EngineStateListener;
pub use term::Term;
pub use wiring::create_standalone_engine;
pub use wiring::EngineController;
pub use wiring::StandaloneEngine;
pub use wiring::StandaloneEngineConfig;
pub use wiring::StandaloneEngineParts;

pub(crate) use replicated_log::EngineLogEntry;
pub(crate) use replication_api::AppendEntriesError;
pub(crate) use replication_api::AppendEntriesInput;
pub(crate) use replication_api::AppendEntriesReplyFromPeer;
pub(crate) use replication_api::RequestVoteError;
pub(crate) use replication_api::RequestVoteInput;
pub(crate) use replication_api::RequestVoteOutput;
pub(crate) use replication_api::RequestVoteReplyFromPeer;
pub(crate) use standalone::AssignProgress;
pub(crate) use standalone::StandaloneCore;
