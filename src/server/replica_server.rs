use crate::cluster::ReplicaId;
use crate::commitlog::Index;
use crate::consensus::{
    AppendEntriesError, AppendEntriesInput, EngineController, EngineLogEntry, RequestVoteError, RequestVoteInput,
    RequestVoteOutput, Role, RoleAssignment, Term,
};
use crate::grpc::key_value_store_server::{KeyValueStore, KeyValueStoreServer};
use crate::grpc::{
    proto_append_entries_result, proto_request_vote_result, ProtoAppendEntriesReq, ProtoAppendEntriesResult,
    ProtoEmpty, ProtoGenericResponse, ProtoGetKey, ProtoKeyValue, ProtoLeaderHint, ProtoMissingLog, ProtoReply,
    ProtoRequestVoteReq, ProtoRequestVoteResult, ProtoRole, ProtoRoleAssignment, ProtoServerFault, ProtoStaleTerm,
    ProtoState, ProtoVote,
};
use crate::replica::{ClientRequestKey, OperationError, OperationOutput, ReplicaAgent};
use crate::server::RpcServerShutdownSignal;
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::Arc;
use tonic::transport::Server;
use tonic::{Request, Response, Status};

/// ReplicaRpcServer is the type that implements the KeyValueStore gRPC interface for one replica.
pub struct ReplicaRpcServer {
    logger: slog::Logger,
    agent: Arc<ReplicaAgent>,
    // None when the engine decides leadership on its own.
    controller: Option<EngineController>,
}

impl ReplicaRpcServer {
    pub fn new(logger: slog::Logger, agent: Arc<ReplicaAgent>, controller: Option<EngineController>) -> Self {
        ReplicaRpcServer {
            logger,
            agent,
            controller,
        }
    }

    pub async fn run(
        self,
        socket_addr: SocketAddr,
        shutdown_signal: RpcServerShutdownSignal,
        max_workers: usize,
    ) -> Result<(), tonic::transport::Error> {
        let logger = self.logger.clone();
        slog::info!(logger, "Listening on '{:?}'", socket_addr);

        let result = Server::builder()
            .concurrency_limit_per_connection(max_workers)
            .add_service(KeyValueStoreServer::new(self))
            .serve_with_shutdown(socket_addr, shutdown_signal)
            .await;

        slog::info!(logger, "Server run() has exited: {:?}", result);
        result
    }

    fn controller(&self) -> Result<&EngineController, Status> {
        self.controller
            .as_ref()
            .ok_or_else(|| Status::unimplemented("Leadership is not externally assigned on this replica"))
    }

    async fn handle_assign_role(&self, rpc_request: ProtoRoleAssignment) -> Result<ProtoGenericResponse, Status> {
        let controller = self.controller()?;

        let assignment = Self::convert_role_assignment(rpc_request)?;
        let reply = match controller.assign_role(assignment).await {
            Ok(state) => ProtoGenericResponse {
                success: true,
                message: format!("term {:?}, {:?}", state.term, state.role),
            },
            Err(e) => ProtoGenericResponse {
                success: false,
                message: e.to_string(),
            },
        };

        Ok(reply)
    }

    fn convert_role_assignment(rpc_request: ProtoRoleAssignment) -> Result<RoleAssignment, Status> {
        let role = match ProtoRole::from_i32(rpc_request.role) {
            Some(ProtoRole::Follower) => Role::Follower,
            Some(ProtoRole::Candidate) => Role::Candidate,
            Some(ProtoRole::Leader) => Role::Leader,
            None => return Err(Status::invalid_argument("Unknown role")),
        };

        Ok(RoleAssignment {
            term: Term::new(rpc_request.term),
            role,
            leader_hint: rpc_request.leader_hint.map(|hint| ReplicaId::new(hint.replica_id)),
            members: rpc_request.members.into_iter().map(ReplicaId::new).collect(),
        })
    }

    fn convert_append_entries_request(rpc_request: ProtoAppendEntriesReq) -> AppendEntriesInput {
        let previous_term = Term::new(rpc_request.previous_log_entry_term);

        AppendEntriesInput {
            leader_id: ReplicaId::new(rpc_request.leader_id),
            term: Term::new(rpc_request.term),
            previous_log_entry: non_zero_index(rpc_request.previous_log_entry_index).map(|index| (previous_term, index)),
            commit_index: non_zero_index(rpc_request.commit_index),
            entries: rpc_request
                .entries
                .into_iter()
                .map(|entry| EngineLogEntry {
                    term: Term::new(entry.term),
                    data: Bytes::from(entry.data),
                })
                .collect(),
        }
    }

    fn convert_request_vote_request(rpc_request: ProtoRequestVoteReq) -> RequestVoteInput {
        let last_term = Term::new(rpc_request.last_log_entry_term);

        RequestVoteInput {
            candidate_id: ReplicaId::new(rpc_request.candidate_id),
            term: Term::new(rpc_request.term),
            last_log_entry: non_zero_index(rpc_request.last_log_entry_index).map(|index| (last_term, index)),
        }
    }

    fn convert_request_key(client_id: i64, request_id: i64) -> ClientRequestKey {
        ClientRequestKey { client_id, request_id }
    }
}

fn non_zero_index(raw: u64) -> Option<Index> {
    if raw == 0 {
        None
    } else {
        Some(Index::new(raw))
    }
}

fn convert_append_entries_result(app_result: Result<(), AppendEntriesError>) -> ProtoAppendEntriesResult {
    let result = match app_result {
        Ok(()) => proto_append_entries_result::Result::Ok(ProtoEmpty {}),
        Err(AppendEntriesError::StaleTerm { current_term }) => {
            proto_append_entries_result::Result::StaleTerm(ProtoStaleTerm {
                current_term: current_term.as_u64(),
            })
        }
        Err(AppendEntriesError::MissingPreviousLogEntry { last_index }) => {
            proto_append_entries_result::Result::MissingLog(ProtoMissingLog {
                last_log_entry_index: last_index.map_or(0, |index| index.as_u64()),
            })
        }
        Err(e) => proto_append_entries_result::Result::ServerFault(ProtoServerFault { message: e.to_string() }),
    };

    ProtoAppendEntriesResult { result: Some(result) }
}

fn convert_request_vote_result(app_result: Result<RequestVoteOutput, RequestVoteError>) -> ProtoRequestVoteResult {
    let result = match app_result {
        Ok(output) => proto_request_vote_result::Result::Ok(ProtoVote {
            vote_granted: output.vote_granted,
        }),
        Err(RequestVoteError::StaleTerm { current_term }) => proto_request_vote_result::Result::StaleTerm(ProtoStaleTerm {
            current_term: current_term.as_u64(),
        }),
        Err(e) => proto_request_vote_result::Result::ServerFault(ProtoServerFault { message: e.to_string() }),
    };

    ProtoRequestVoteResult { result: Some(result) }
}

fn convert_operation_result(app_result: Result<OperationOutput, OperationError>) -> ProtoReply {
    match app_result {
        Ok(output) => ProtoReply {
            value: output.value,
            error: String::new(),
            wrong_leader: false,
            leader_hint: None,
        },
        Err(OperationError::NotLeader { leader_hint }) => ProtoReply {
            value: String::new(),
            error: OperationError::NotLeader { leader_hint }.to_string(),
            wrong_leader: true,
            leader_hint: leader_hint.map(|id| ProtoLeaderHint {
                replica_id: id.as_u32(),
            }),
        },
        Err(e) => ProtoReply {
            value: String::new(),
            error: e.to_string(),
            wrong_leader: false,
            leader_hint: None,
        },
    }
}

#[async_trait::async_trait]
impl KeyValueStore for ReplicaRpcServer {
    async fn ping(&self, _: Request<ProtoEmpty>) -> Result<Response<ProtoGenericResponse>, Status> {
        Ok(Response::new(ProtoGenericResponse {
            success: self.agent.ping(),
            message: String::new(),
        }))
    }

    async fn get_state(&self, _: Request<ProtoEmpty>) -> Result<Response<ProtoState>, Status> {
        let state = self.agent.get_state();
        let rpc_reply = ProtoState {
            term: state.term.as_u64(),
            is_leader: state.is_leader,
        };

        slog::debug!(self.logger, "ServerWire - {:?}", rpc_reply);
        Ok(Response::new(rpc_reply))
    }

    async fn get(&self, rpc_request_wrapped: Request<ProtoGetKey>) -> Result<Response<ProtoReply>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - {:?}", rpc_request);
        let request = Self::convert_request_key(rpc_request.client_id, rpc_request.request_id);
        let app_result = self.agent.get(rpc_request.key, request).await;
        let rpc_reply = convert_operation_result(app_result);
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_reply);

        Ok(Response::new(rpc_reply))
    }

    async fn put(&self, rpc_request_wrapped: Request<ProtoKeyValue>) -> Result<Response<ProtoReply>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - {:?}", rpc_request);
        let request = Self::convert_request_key(rpc_request.client_id, rpc_request.request_id);
        let app_result = self.agent.put(rpc_request.key, rpc_request.value, request).await;
        let rpc_reply = convert_operation_result(app_result);
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_reply);

        Ok(Response::new(rpc_reply))
    }

    async fn assign_role(
        &self,
        rpc_request_wrapped: Request<ProtoRoleAssignment>,
    ) -> Result<Response<ProtoGenericResponse>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - {:?}", rpc_request);
        let rpc_result = self.handle_assign_role(rpc_request).await;
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_result);

        rpc_result.map(Response::new)
    }

    async fn append_entries(
        &self,
        rpc_request_wrapped: Request<ProtoAppendEntriesReq>,
    ) -> Result<Response<ProtoAppendEntriesResult>, Status> {
        let controller = self.controller()?;
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(
            self.logger,
            "ServerWire - AppendEntries from {} (term={}, prev={}, entries={}, commit={})",
            rpc_request.leader_id,
            rpc_request.term,
            rpc_request.previous_log_entry_index,
            rpc_request.entries.len(),
            rpc_request.commit_index
        );
        let input = Self::convert_append_entries_request(rpc_request);
        let rpc_reply = convert_append_entries_result(controller.append_entries(input).await);
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_reply);

        Ok(Response::new(rpc_reply))
    }

    async fn request_vote(
        &self,
        rpc_request_wrapped: Request<ProtoRequestVoteReq>,
    ) -> Result<Response<ProtoRequestVoteResult>, Status> {
        let controller = self.controller()?;
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - {:?}", rpc_request);
        let input = Self::convert_request_vote_request(rpc_request);
        let rpc_reply = convert_request_vote_result(controller.request_vote(input).await);
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_reply);

        Ok(Response::new(rpc_reply))
    }
}
