use crate::cluster::{ReplicaId, ReplicaIdentity};
use crate::commitlog::Index;
use crate::consensus::replication_api::{AppendEntriesInput, PeerReplyError, RequestVoteInput};
use crate::consensus::Term;
use crate::grpc::key_value_store_client::KeyValueStoreClient;
use crate::grpc::{
    proto_append_entries_result, proto_request_vote_result, ProtoAppendEntriesReq, ProtoAppendEntriesResult,
    ProtoLogEntry, ProtoRequestVoteReq, ProtoRequestVoteResult,
};
use std::time::Duration;
use tokio::time::error::Elapsed;
use tonic::transport::Endpoint;
use tonic::Status;

/// PeerClient is the engine's side of the replication RPCs to one peer. Like the orchestrator's
/// client it connects per call, so a peer restarted on the same port is picked up.
#[derive(Clone, Debug)]
pub(crate) struct PeerClient {
    identity: ReplicaIdentity,
    rpc_timeout: Duration,
}

impl PeerClient {
    pub(crate) fn new(identity: ReplicaIdentity, rpc_timeout: Duration) -> Self {
        PeerClient { identity, rpc_timeout }
    }

    pub(crate) fn peer_id(&self) -> ReplicaId {
        self.identity.id()
    }

    pub(crate) async fn append_entries(
        &self,
        logger: &slog::Logger,
        input: AppendEntriesInput,
    ) -> Result<(), PeerReplyError> {
        let rpc_request = convert_append_entries_input(input);
        slog::debug!(
            logger,
            "ClientWire - AppendEntries to {} (prev={}, entries={}, commit={})",
            self.identity.id(),
            rpc_request.previous_log_entry_index,
            rpc_request.entries.len(),
            rpc_request.commit_index
        );

        let mut client = self.connect().await?;
        let rpc_reply = tokio::time::timeout(self.rpc_timeout, client.append_entries(rpc_request)).await;
        slog::debug!(logger, "ClientWire - {:?}", rpc_reply);

        convert_append_entries_rpc_reply(rpc_reply)
    }

    pub(crate) async fn request_vote(
        &self,
        logger: &slog::Logger,
        input: RequestVoteInput,
    ) -> Result<bool, PeerReplyError> {
        let (last_log_entry_term, last_log_entry_index) = split_entry(input.last_log_entry);
        let rpc_request = ProtoRequestVoteReq {
            candidate_id: input.candidate_id.as_u32(),
            term: input.term.as_u64(),
            last_log_entry_index,
            last_log_entry_term,
        };
        slog::debug!(logger, "ClientWire - RequestVote to {}: {:?}", self.identity.id(), rpc_request);

        let mut client = self.connect().await?;
        let rpc_reply = tokio::time::timeout(self.rpc_timeout, client.request_vote(rpc_request)).await;
        slog::debug!(logger, "ClientWire - {:?}", rpc_reply);

        convert_request_vote_rpc_reply(rpc_reply)
    }

    async fn connect(&self) -> Result<KeyValueStoreClient<tonic::transport::Channel>, PeerReplyError> {
        let endpoint =
            Endpoint::from_shared(self.identity.url()).map_err(|e| PeerReplyError::Retryable(e.to_string()))?;

        match tokio::time::timeout(self.rpc_timeout, endpoint.connect()).await {
            Ok(Ok(channel)) => Ok(KeyValueStoreClient::new(channel)),
            Ok(Err(e)) => Err(PeerReplyError::Retryable(e.to_string())),
            Err(_) => Err(PeerReplyError::Retryable(format!(
                "Connecting to {} timed out",
                self.identity.url()
            ))),
        }
    }
}

fn split_entry(entry: Option<(Term, Index)>) -> (u64, u64) {
    match entry {
        None => (0, 0),
        Some((term, index)) => (term.as_u64(), index.as_u64()),
    }
}

fn convert_append_entries_input(input: AppendEntriesInput) -> ProtoAppendEntriesReq {
    let (previous_log_entry_term, previous_log_entry_index) = split_entry(input.previous_log_entry);

    ProtoAppendEntriesReq {
        leader_id: input.leader_id.as_u32(),
        term: input.term.as_u64(),
        previous_log_entry_index,
        previous_log_entry_term,
        commit_index: input.commit_index.map_or(0, |index| index.as_u64()),
        entries: input
            .entries
            .into_iter()
            .map(|entry| ProtoLogEntry {
                term: entry.term.as_u64(),
                data: entry.data.to_vec(),
            })
            .collect(),
    }
}

fn convert_append_entries_rpc_reply(
    rpc_reply: Result<Result<tonic::Response<ProtoAppendEntriesResult>, Status>, Elapsed>,
) -> Result<(), PeerReplyError> {
    match rpc_reply {
        Ok(Ok(response)) => match response.into_inner().result {
            Some(proto_append_entries_result::Result::Ok(_)) => Ok(()),
            Some(proto_append_entries_result::Result::StaleTerm(stale)) => Err(PeerReplyError::StaleTerm {
                new_term: Term::new(stale.current_term),
            }),
            Some(proto_append_entries_result::Result::MissingLog(missing)) => Err(PeerReplyError::PeerLogBehind {
                last_index: non_zero_index(missing.last_log_entry_index),
            }),
            Some(proto_append_entries_result::Result::ServerFault(fault)) => {
                Err(PeerReplyError::Retryable(fault.message))
            }
            None => Err(PeerReplyError::Retryable("Malformed AppendEntries reply".into())),
        },
        Ok(Err(status)) => Err(PeerReplyError::Retryable(status.to_string())),
        Err(_) => Err(PeerReplyError::Retryable("AppendEntries timed out".into())),
    }
}

fn convert_request_vote_rpc_reply(
    rpc_reply: Result<Result<tonic::Response<ProtoRequestVoteResult>, Status>, Elapsed>,
) -> Result<bool, PeerReplyError> {
    match rpc_reply {
        Ok(Ok(response)) => match response.into_inner().result {
            Some(proto_request_vote_result::Result::Ok(vote)) => Ok(vote.vote_granted),
            Some(proto_request_vote_result::Result::StaleTerm(stale)) => Err(PeerReplyError::StaleTerm {
                new_term: Term::new(stale.current_term),
            }),
            Some(proto_request_vote_result::Result::ServerFault(fault)) => {
                Err(PeerReplyError::Retryable(fault.message))
            }
            None => Err(PeerReplyError::Retryable("Malformed RequestVote reply".into())),
        },
        Ok(Err(status)) => Err(PeerReplyError::Retryable(status.to_string())),
        Err(_) => Err(PeerReplyError::Retryable("RequestVote timed out".into())),
    }
}

fn non_zero_index(raw: u64) -> Option<Index> {
    if raw == 0 {
        None
    } else {
        Some(Index::new(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::replicated_log::EngineLogEntry;
    use crate::grpc::{ProtoEmpty, ProtoMissingLog, ProtoServerFault, ProtoStaleTerm};
    use bytes::Bytes;

    fn reply<T>(value: T) -> Result<Result<tonic::Response<T>, Status>, Elapsed> {
        Ok(Ok(tonic::Response::new(value)))
    }

    #[test]
    fn empty_log_travels_as_zeros() {
        let request = convert_append_entries_input(AppendEntriesInput {
            leader_id: ReplicaId::new(2),
            term: Term::new(4),
            previous_log_entry: None,
            commit_index: None,
            entries: vec![EngineLogEntry {
                term: Term::new(4),
                data: Bytes::from_static(b"op"),
            }],
        });

        assert_eq!(request.leader_id, 2);
        assert_eq!(request.previous_log_entry_index, 0);
        assert_eq!(request.previous_log_entry_term, 0);
        assert_eq!(request.commit_index, 0);
        assert_eq!(request.entries.len(), 1);
        assert_eq!(request.entries[0].data, b"op".to_vec());
    }

    #[test]
    fn append_entries_replies_convert() {
        assert!(convert_append_entries_rpc_reply(reply(ProtoAppendEntriesResult {
            result: Some(proto_append_entries_result::Result::Ok(ProtoEmpty {})),
        }))
        .is_ok());

        match convert_append_entries_rpc_reply(reply(ProtoAppendEntriesResult {
            result: Some(proto_append_entries_result::Result::StaleTerm(ProtoStaleTerm {
                current_term: 9,
            })),
        })) {
            Err(PeerReplyError::StaleTerm { new_term }) => assert_eq!(new_term, Term::new(9)),
            other => panic!("Unexpected {:?}", other),
        }

        match convert_append_entries_rpc_reply(reply(ProtoAppendEntriesResult {
            result: Some(proto_append_entries_result::Result::MissingLog(ProtoMissingLog {
                last_log_entry_index: 0,
            })),
        })) {
            Err(PeerReplyError::PeerLogBehind { last_index: None }) => {}
            other => panic!("Unexpected {:?}", other),
        }

        match convert_append_entries_rpc_reply(reply(ProtoAppendEntriesResult {
            result: Some(proto_append_entries_result::Result::ServerFault(ProtoServerFault {
                message: "disk".into(),
            })),
        })) {
            Err(PeerReplyError::Retryable(message)) => assert_eq!(message, "disk"),
            other => panic!("Unexpected {:?}", other),
        }

        assert!(matches!(
            convert_append_entries_rpc_reply(reply(ProtoAppendEntriesResult { result: None })),
            Err(PeerReplyError::Retryable(_))
        ));
        assert!(matches!(
            convert_append_entries_rpc_reply(Ok(Err(Status::unavailable("down")))),
            Err(PeerReplyError::Retryable(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_peer_is_retryable() {
        let logger = slog::Logger::root(slog::Discard, slog::o!());
        let identity = crate::cluster::ReplicaLayout::new(std::net::Ipv4Addr::LOCALHOST, 1, 1)
            .identity(0)
            .unwrap();
        let client = PeerClient::new(identity, Duration::from_millis(200));

        let result = client
            .request_vote(
                &logger,
                RequestVoteInput {
                    candidate_id: ReplicaId::new(1),
                    term: Term::new(1),
                    last_log_entry: None,
                },
            )
            .await;
        assert!(matches!(result, Err(PeerReplyError::Retryable(_))));
    }
}
