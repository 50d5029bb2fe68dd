use crate::grpc::front_end_server::{FrontEnd, FrontEndServer};
use crate::grpc::{ProtoGetKey, ProtoIntegerArg, ProtoKeyValue, ProtoReply};
use crate::orchestrator::{ClientReply, ClusterOrchestrator, OrchestratorError};
use crate::replica::ClientRequestKey;
use crate::server::RpcServerShutdownSignal;
use std::net::SocketAddr;
use std::sync::Arc;
use tonic::transport::Server;
use tonic::{Request, Response, Status};

/// FrontEndRpcServer is the type that implements the FrontEnd gRPC interface on the control
/// address.
pub struct FrontEndRpcServer {
    logger: slog::Logger,
    orchestrator: Arc<ClusterOrchestrator>,
}

impl FrontEndRpcServer {
    pub fn new(logger: slog::Logger, orchestrator: Arc<ClusterOrchestrator>) -> Self {
        FrontEndRpcServer { logger, orchestrator }
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
            .add_service(FrontEndServer::new(self))
            .serve_with_shutdown(socket_addr, shutdown_signal)
            .await;

        slog::info!(logger, "Server run() has exited: {:?}", result);
        result
    }

    async fn handle_start_raft(&self, rpc_request: ProtoIntegerArg) -> ProtoReply {
        let app_result = self.orchestrator.start_cluster(rpc_request.arg).await;
        Self::convert_management_result(app_result.map(|identities| {
            let ports: Vec<String> = identities.iter().map(|identity| identity.port().to_string()).collect();
            format!("Started {} replicas on ports {}", identities.len(), ports.join(","))
        }))
    }

    async fn handle_start_server(&self, rpc_request: ProtoIntegerArg) -> ProtoReply {
        let app_result = self.orchestrator.start_replica(rpc_request.arg).await;
        Self::convert_management_result(
            app_result.map(|identity| format!("Started {} on port {}", identity.process_label(), identity.port())),
        )
    }

    async fn handle_stop_server(&self, rpc_request: ProtoIntegerArg) -> ProtoReply {
        let app_result = self.orchestrator.stop_replica(rpc_request.arg).await;
        Self::convert_management_result(app_result.map(|was_running| {
            if was_running {
                format!("Stopped replica {}", rpc_request.arg)
            } else {
                format!("Replica {} was not running", rpc_request.arg)
            }
        }))
    }

    fn convert_management_result(app_result: Result<String, OrchestratorError>) -> ProtoReply {
        let reply = match app_result {
            Ok(value) => ClientReply {
                value,
                ..Default::default()
            },
            Err(e) => ClientReply::failed(e.to_string()),
        };

        ProtoReply::from(reply)
    }

    fn convert_request_key(client_id: i64, request_id: i64) -> ClientRequestKey {
        ClientRequestKey { client_id, request_id }
    }
}

#[async_trait::async_trait]
impl FrontEnd for FrontEndRpcServer {
    async fn get(&self, rpc_request_wrapped: Request<ProtoGetKey>) -> Result<Response<ProtoReply>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - {:?}", rpc_request);
        let request = Self::convert_request_key(rpc_request.client_id, rpc_request.request_id);
        let rpc_reply = ProtoReply::from(self.orchestrator.get(rpc_request.key, request).await);
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_reply);

        Ok(Response::new(rpc_reply))
    }

    async fn put(&self, rpc_request_wrapped: Request<ProtoKeyValue>) -> Result<Response<ProtoReply>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - {:?}", rpc_request);
        let request = Self::convert_request_key(rpc_request.client_id, rpc_request.request_id);
        let rpc_reply = ProtoReply::from(
            self.orchestrator
                .put(rpc_request.key, rpc_request.value, request)
                .await,
        );
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_reply);

        Ok(Response::new(rpc_reply))
    }

    async fn start_raft(&self, rpc_request_wrapped: Request<ProtoIntegerArg>) -> Result<Response<ProtoReply>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - StartRaft {:?}", rpc_request);
        let rpc_reply = self.handle_start_raft(rpc_request).await;
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_reply);

        Ok(Response::new(rpc_reply))
    }

    async fn start_server(&self, rpc_request_wrapped: Request<ProtoIntegerArg>) -> Result<Response<ProtoReply>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - StartServer {:?}", rpc_request);
        let rpc_reply = self.handle_start_server(rpc_request).await;
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_reply);

        Ok(Response::new(rpc_reply))
    }

    async fn stop_server(&self, rpc_request_wrapped: Request<ProtoIntegerArg>) -> Result<Response<ProtoReply>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - StopServer {:?}", rpc_request);
        let rpc_reply = self.handle_stop_server(rpc_request).await;
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_reply);

        Ok(Response::new(rpc_reply))
    }
}
