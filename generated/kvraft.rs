#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoEmpty {}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoIntegerArg {
    #[prost(int64, tag = "1")]
    pub arg: i64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoGetKey {
    #[prost(string, tag = "1")]
    pub key: ::prost::alloc::string::String,
    #[prost(int64, tag = "2")]
    pub client_id: i64,
    #[prost(int64, tag = "3")]
    pub request_id: i64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoKeyValue {
    #[prost(string, tag = "1")]
    pub key: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub value: ::prost::alloc::string::String,
    #[prost(int64, tag = "3")]
    pub client_id: i64,
    #[prost(int64, tag = "4")]
    pub request_id: i64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoLeaderHint {
    #[prost(uint32, tag = "1")]
    pub replica_id: u32,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoReply {
    #[prost(string, tag = "1")]
    pub value: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub error: ::prost::alloc::string::String,
    #[prost(bool, tag = "3")]
    pub wrong_leader: bool,
    /// Unset when the responder doesn't know who the leader is.
    #[prost(message, optional, tag = "4")]
    pub leader_hint: ::core::option::Option<ProtoLeaderHint>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoGenericResponse {
    #[prost(bool, tag = "1")]
    pub success: bool,
    #[prost(string, tag = "2")]
    pub message: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoState {
    #[prost(uint64, tag = "1")]
    pub term: u64,
    #[prost(bool, tag = "2")]
    pub is_leader: bool,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoRoleAssignment {
    #[prost(uint64, tag = "1")]
    pub term: u64,
    #[prost(enumeration = "ProtoRole", tag = "2")]
    pub role: i32,
    #[prost(message, optional, tag = "3")]
    pub leader_hint: ::core::option::Option<ProtoLeaderHint>,
    /// Replica ids a leader replicates to. Only read when role is LEADER.
    #[prost(uint32, repeated, tag = "4")]
    pub members: ::prost::alloc::vec::Vec<u32>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoLogEntry {
    #[prost(uint64, tag = "1")]
    pub term: u64,
    #[prost(bytes = "vec", tag = "2")]
    pub data: ::prost::alloc::vec::Vec<u8>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoAppendEntriesReq {
    #[prost(uint32, tag = "1")]
    pub leader_id: u32,
    #[prost(uint64, tag = "2")]
    pub term: u64,
    /// 0 when the entries start at the beginning of the log.
    #[prost(uint64, tag = "3")]
    pub previous_log_entry_index: u64,
    #[prost(uint64, tag = "4")]
    pub previous_log_entry_term: u64,
    /// 0 when nothing has been committed yet.
    #[prost(uint64, tag = "5")]
    pub commit_index: u64,
    #[prost(message, repeated, tag = "6")]
    pub entries: ::prost::alloc::vec::Vec<ProtoLogEntry>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoAppendEntriesResult {
    #[prost(oneof = "proto_append_entries_result::Result", tags = "1, 2, 3, 4")]
    pub result: ::core::option::Option<proto_append_entries_result::Result>,
}
/// Nested message and enum types in `ProtoAppendEntriesResult`.
pub mod proto_append_entries_result {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Result {
        #[prost(message, tag = "1")]
        Ok(super::ProtoEmpty),
        #[prost(message, tag = "2")]
        StaleTerm(super::ProtoStaleTerm),
        #[prost(message, tag = "3")]
        MissingLog(super::ProtoMissingLog),
        #[prost(message, tag = "4")]
        ServerFault(super::ProtoServerFault),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoRequestVoteReq {
    #[prost(uint32, tag = "1")]
    pub candidate_id: u32,
    #[prost(uint64, tag = "2")]
    pub term: u64,
    /// 0 when the candidate's log is empty.
    #[prost(uint64, tag = "3")]
    pub last_log_entry_index: u64,
    #[prost(uint64, tag = "4")]
    pub last_log_entry_term: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoRequestVoteResult {
    #[prost(oneof = "proto_request_vote_result::Result", tags = "1, 2, 3")]
    pub result: ::core::option::Option<proto_request_vote_result::Result>,
}
/// Nested message and enum types in `ProtoRequestVoteResult`.
pub mod proto_request_vote_result {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Result {
        #[prost(message, tag = "1")]
        Ok(super::ProtoVote),
        #[prost(message, tag = "2")]
        StaleTerm(super::ProtoStaleTerm),
        #[prost(message, tag = "3")]
        ServerFault(super::ProtoServerFault),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoVote {
    #[prost(bool, tag = "1")]
    pub vote_granted: bool,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoStaleTerm {
    #[prost(uint64, tag = "1")]
    pub current_term: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoMissingLog {
    /// 0 when the follower's log is empty.
    #[prost(uint64, tag = "1")]
    pub last_log_entry_index: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoServerFault {
    #[prost(string, tag = "1")]
    pub message: ::prost::alloc::string::String,
}
/// Log entry payload. One client operation per entry.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoKvCommand {
    #[prost(int64, tag = "1")]
    pub client_id: i64,
    #[prost(int64, tag = "2")]
    pub request_id: i64,
    #[prost(oneof = "proto_kv_command::Op", tags = "3, 4")]
    pub op: ::core::option::Option<proto_kv_command::Op>,
}
/// Nested message and enum types in `ProtoKvCommand`.
pub mod proto_kv_command {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Op {
        #[prost(message, tag = "3")]
        Get(super::ProtoGetOp),
        #[prost(message, tag = "4")]
        Put(super::ProtoPutOp),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoGetOp {
    #[prost(string, tag = "1")]
    pub key: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoPutOp {
    #[prost(string, tag = "1")]
    pub key: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub value: ::prost::alloc::string::String,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ProtoRole {
    Follower = 0,
    Candidate = 1,
    Leader = 2,
}
#[doc = r" Generated client implementations."]
pub mod front_end_client {
    #![allow(unused_variables, dead_code, missing_docs)]
    use tonic::codegen::*;
    #[doc = " Client and operator facing dispatcher. Routes Get/Put to the current leader"]
    #[doc = " and manages replica processes."]
    pub struct FrontEndClient<T> {
        inner: tonic::client::Grpc<T>,
    }
    impl FrontEndClient<tonic::transport::Channel> {
        #[doc = r" Attempt to create a new client by connecting to a given endpoint."]
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: std::convert::TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }
    impl<T> FrontEndClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::ResponseBody: Body + HttpBody + Send + 'static,
        T::Error: Into<StdError>,
        <T::ResponseBody as HttpBody>::Error: Into<StdError> + Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }
        pub fn with_interceptor(inner: T, interceptor: impl Into<tonic::Interceptor>) -> Self {
            let inner = tonic::client::Grpc::with_interceptor(inner, interceptor);
            Self { inner }
        }
        pub async fn get(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoGetKey>,
        ) -> Result<tonic::Response<super::ProtoReply>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/kvraft.FrontEnd/Get");
            self.inner.unary(request.into_request(), path, codec).await
        }
        pub async fn put(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoKeyValue>,
        ) -> Result<tonic::Response<super::ProtoReply>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/kvraft.FrontEnd/Put");
            self.inner.unary(request.into_request(), path, codec).await
        }
        pub async fn start_raft(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoIntegerArg>,
        ) -> Result<tonic::Response<super::ProtoReply>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/kvraft.FrontEnd/StartRaft");
            self.inner.unary(request.into_request(), path, codec).await
        }
        pub async fn start_server(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoIntegerArg>,
        ) -> Result<tonic::Response<super::ProtoReply>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/kvraft.FrontEnd/StartServer");
            self.inner.unary(request.into_request(), path, codec).await
        }
        pub async fn stop_server(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoIntegerArg>,
        ) -> Result<tonic::Response<super::ProtoReply>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/kvraft.FrontEnd/StopServer");
            self.inner.unary(request.into_request(), path, codec).await
        }
    }
    impl<T: Clone> Clone for FrontEndClient<T> {
        fn clone(&self) -> Self {
            Self {
                inner: self.inner.clone(),
            }
        }
    }
    impl<T> std::fmt::Debug for FrontEndClient<T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "FrontEndClient {{ ... }}")
        }
    }
}
#[doc = r" Generated client implementations."]
pub mod key_value_store_client {
    #![allow(unused_variables, dead_code, missing_docs)]
    use tonic::codegen::*;
    #[doc = " Served by every replica on `base_port + id`."]
    pub struct KeyValueStoreClient<T> {
        inner: tonic::client::Grpc<T>,
    }
    impl KeyValueStoreClient<tonic::transport::Channel> {
        #[doc = r" Attempt to create a new client by connecting to a given endpoint."]
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: std::convert::TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }
    impl<T> KeyValueStoreClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::ResponseBody: Body + HttpBody + Send + 'static,
        T::Error: Into<StdError>,
        <T::ResponseBody as HttpBody>::Error: Into<StdError> + Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }
        pub fn with_interceptor(inner: T, interceptor: impl Into<tonic::Interceptor>) -> Self {
            let inner = tonic::client::Grpc::with_interceptor(inner, interceptor);
            Self { inner }
        }
        pub async fn ping(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoEmpty>,
        ) -> Result<tonic::Response<super::ProtoGenericResponse>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/kvraft.KeyValueStore/Ping");
            self.inner.unary(request.into_request(), path, codec).await
        }
        pub async fn get_state(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoEmpty>,
        ) -> Result<tonic::Response<super::ProtoState>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/kvraft.KeyValueStore/GetState");
            self.inner.unary(request.into_request(), path, codec).await
        }
        pub async fn get(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoGetKey>,
        ) -> Result<tonic::Response<super::ProtoReply>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/kvraft.KeyValueStore/Get");
            self.inner.unary(request.into_request(), path, codec).await
        }
        pub async fn put(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoKeyValue>,
        ) -> Result<tonic::Response<super::ProtoReply>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/kvraft.KeyValueStore/Put");
            self.inner.unary(request.into_request(), path, codec).await
        }
        #[doc = " The calls below are only served by replicas running the standalone engine."]
        pub async fn assign_role(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoRoleAssignment>,
        ) -> Result<tonic::Response<super::ProtoGenericResponse>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/kvraft.KeyValueStore/AssignRole");
            self.inner.unary(request.into_request(), path, codec).await
        }
        #[doc = " Leader to follower log replication. Doubles as the leader's heartbeat."]
        pub async fn append_entries(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoAppendEntriesReq>,
        ) -> Result<tonic::Response<super::ProtoAppendEntriesResult>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/kvraft.KeyValueStore/AppendEntries");
            self.inner.unary(request.into_request(), path, codec).await
        }
        #[doc = " Sent by a replica told to lead, to the members it will lead."]
        pub async fn request_vote(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoRequestVoteReq>,
        ) -> Result<tonic::Response<super::ProtoRequestVoteResult>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/kvraft.KeyValueStore/RequestVote");
            self.inner.unary(request.into_request(), path, codec).await
        }
    }
    impl<T: Clone> Clone for KeyValueStoreClient<T> {
        fn clone(&self) -> Self {
            Self {
                inner: self.inner.clone(),
            }
        }
    }
    impl<T> std::fmt::Debug for KeyValueStoreClient<T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "KeyValueStoreClient {{ ... }}")
        }
    }
}
#[doc = r" Generated server implementations."]
pub mod front_end_server {
    #![allow(unused_variables, dead_code, missing_docs)]
    use tonic::codegen::*;
    #[doc = "Generated trait containing gRPC methods that should be implemented for use with FrontEndServer."]
    #[async_trait]
    pub trait FrontEnd: Send + Sync + 'static {
        async fn get(
            &self,
            request: tonic::Request<super::ProtoGetKey>,
        ) -> Result<tonic::Response<super::ProtoReply>, tonic::Status>;
        async fn put(
            &self,
            request: tonic::Request<super::ProtoKeyValue>,
        ) -> Result<tonic::Response<super::ProtoReply>, tonic::Status>;
        async fn start_raft(
            &self,
            request: tonic::Request<super::ProtoIntegerArg>,
        ) -> Result<tonic::Response<super::ProtoReply>, tonic::Status>;
        async fn start_server(
            &self,
            request: tonic::Request<super::ProtoIntegerArg>,
        ) -> Result<tonic::Response<super::ProtoReply>, tonic::Status>;
        async fn stop_server(
            &self,
            request: tonic::Request<super::ProtoIntegerArg>,
        ) -> Result<tonic::Response<super::ProtoReply>, tonic::Status>;
    }
    #[doc = " Client and operator facing dispatcher. Routes Get/Put to the current leader"]
    #[doc = " and manages replica processes."]
    #[derive(Debug)]
    pub struct FrontEndServer<T: FrontEnd> {
        inner: _Inner<T>,
    }
    struct _Inner<T>(Arc<T>, Option<tonic::Interceptor>);
    impl<T: FrontEnd> FrontEndServer<T> {
        pub fn new(inner: T) -> Self {
            let inner = Arc::new(inner);
            let inner = _Inner(inner, None);
            Self { inner }
        }
        pub fn with_interceptor(inner: T, interceptor: impl Into<tonic::Interceptor>) -> Self {
            let inner = Arc::new(inner);
            let inner = _Inner(inner, Some(interceptor.into()));
            Self { inner }
        }
    }
    impl<T, B> Service<http::Request<B>> for FrontEndServer<T>
    where
        T: FrontEnd,
        B: HttpBody + Send + Sync + 'static,
        B::Error: Into<StdError> + Send + 'static,
    {
        type Response = http::Response<tonic::body::BoxBody>;
        type Error = Never;
        type Future = BoxFuture<Self::Response, Self::Error>;
        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }
        fn call(&mut self, req: http::Request<B>) -> Self::Future {
            let inner = self.inner.clone();
            match req.uri().path() {
                "/kvraft.FrontEnd/Get" => {
                    #[allow(non_camel_case_types)]
                    struct GetSvc<T: FrontEnd>(pub Arc<T>);
                    impl<T: FrontEnd> tonic::server::UnaryService<super::ProtoGetKey> for GetSvc<T> {
                        type Response = super::ProtoReply;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoGetKey>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).get(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = GetSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/kvraft.FrontEnd/Put" => {
                    #[allow(non_camel_case_types)]
                    struct PutSvc<T: FrontEnd>(pub Arc<T>);
                    impl<T: FrontEnd> tonic::server::UnaryService<super::ProtoKeyValue> for PutSvc<T> {
                        type Response = super::ProtoReply;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoKeyValue>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).put(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = PutSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/kvraft.FrontEnd/StartRaft" => {
                    #[allow(non_camel_case_types)]
                    struct StartRaftSvc<T: FrontEnd>(pub Arc<T>);
                    impl<T: FrontEnd> tonic::server::UnaryService<super::ProtoIntegerArg> for StartRaftSvc<T> {
                        type Response = super::ProtoReply;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoIntegerArg>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).start_raft(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = StartRaftSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/kvraft.FrontEnd/StartServer" => {
                    #[allow(non_camel_case_types)]
                    struct StartServerSvc<T: FrontEnd>(pub Arc<T>);
                    impl<T: FrontEnd> tonic::server::UnaryService<super::ProtoIntegerArg> for StartServerSvc<T> {
                        type Response = super::ProtoReply;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoIntegerArg>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).start_server(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = StartServerSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/kvraft.FrontEnd/StopServer" => {
                    #[allow(non_camel_case_types)]
                    struct StopServerSvc<T: FrontEnd>(pub Arc<T>);
                    impl<T: FrontEnd> tonic::server::UnaryService<super::ProtoIntegerArg> for StopServerSvc<T> {
                        type Response = super::ProtoReply;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoIntegerArg>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).stop_server(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = StopServerSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                _ => Box::pin(async move {
                    Ok(http::Response::builder()
                        .status(200)
                        .header("grpc-status", "12")
                        .header("content-type", "application/grpc")
                        .body(tonic::body::BoxBody::empty())
                        .unwrap())
                }),
            }
        }
    }
    impl<T: FrontEnd> Clone for FrontEndServer<T> {
        fn clone(&self) -> Self {
            let inner = self.inner.clone();
            Self { inner }
        }
    }
    impl<T: FrontEnd> Clone for _Inner<T> {
        fn clone(&self) -> Self {
            Self(self.0.clone(), self.1.clone())
        }
    }
    impl<T: std::fmt::Debug> std::fmt::Debug for _Inner<T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self.0)
        }
    }
    impl<T: FrontEnd> tonic::transport::NamedService for FrontEndServer<T> {
        const NAME: &'static str = "kvraft.FrontEnd";
    }
}
#[doc = r" Generated server implementations."]
pub mod key_value_store_server {
    #![allow(unused_variables, dead_code, missing_docs)]
    use tonic::codegen::*;
    #[doc = "Generated trait containing gRPC methods that should be implemented for use with KeyValueStoreServer."]
    #[async_trait]
    pub trait KeyValueStore: Send + Sync + 'static {
        async fn ping(
            &self,
            request: tonic::Request<super::ProtoEmpty>,
        ) -> Result<tonic::Response<super::ProtoGenericResponse>, tonic::Status>;
        async fn get_state(
            &self,
            request: tonic::Request<super::ProtoEmpty>,
        ) -> Result<tonic::Response<super::ProtoState>, tonic::Status>;
        async fn get(
            &self,
            request: tonic::Request<super::ProtoGetKey>,
        ) -> Result<tonic::Response<super::ProtoReply>, tonic::Status>;
        async fn put(
            &self,
            request: tonic::Request<super::ProtoKeyValue>,
        ) -> Result<tonic::Response<super::ProtoReply>, tonic::Status>;
        #[doc = " The calls below are only served by replicas running the standalone engine."]
        async fn assign_role(
            &self,
            request: tonic::Request<super::ProtoRoleAssignment>,
        ) -> Result<tonic::Response<super::ProtoGenericResponse>, tonic::Status>;
        #[doc = " Leader to follower log replication. Doubles as the leader's heartbeat."]
        async fn append_entries(
            &self,
            request: tonic::Request<super::ProtoAppendEntriesReq>,
        ) -> Result<tonic::Response<super::ProtoAppendEntriesResult>, tonic::Status>;
        #[doc = " Sent by a replica told to lead, to the members it will lead."]
        async fn request_vote(
            &self,
            request: tonic::Request<super::ProtoRequestVoteReq>,
        ) -> Result<tonic::Response<super::ProtoRequestVoteResult>, tonic::Status>;
    }
    #[doc = " Served by every replica on `base_port + id`."]
    #[derive(Debug)]
    pub struct KeyValueStoreServer<T: KeyValueStore> {
        inner: _Inner<T>,
    }
    struct _Inner<T>(Arc<T>, Option<tonic::Interceptor>);
    impl<T: KeyValueStore> KeyValueStoreServer<T> {
        pub fn new(inner: T) -> Self {
            let inner = Arc::new(inner);
            let inner = _Inner(inner, None);
            Self { inner }
        }
        pub fn with_interceptor(inner: T, interceptor: impl Into<tonic::Interceptor>) -> Self {
            let inner = Arc::new(inner);
            let inner = _Inner(inner, Some(interceptor.into()));
            Self { inner }
        }
    }
    impl<T, B> Service<http::Request<B>> for KeyValueStoreServer<T>
    where
        T: KeyValueStore,
        B: HttpBody + Send + Sync + 'static,
        B::Error: Into<StdError> + Send + 'static,
    {
        type Response = http::Response<tonic::body::BoxBody>;
        type Error = Never;
        type Future = BoxFuture<Self::Response, Self::Error>;
        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }
        fn call(&mut self, req: http::Request<B>) -> Self::Future {
            let inner = self.inner.clone();
            match req.uri().path() {
                "/kvraft.KeyValueStore/Ping" => {
                    #[allow(non_camel_case_types)]
                    struct PingSvc<T: KeyValueStore>(pub Arc<T>);
                    impl<T: KeyValueStore> tonic::server::UnaryService<super::ProtoEmpty> for PingSvc<T> {
                        type Response = super::ProtoGenericResponse;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoEmpty>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).ping(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = PingSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/kvraft.KeyValueStore/GetState" => {
                    #[allow(non_camel_case_types)]
                    struct GetStateSvc<T: KeyValueStore>(pub Arc<T>);
                    impl<T: KeyValueStore> tonic::server::UnaryService<super::ProtoEmpty> for GetStateSvc<T> {
                        type Response = super::ProtoState;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoEmpty>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).get_state(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = GetStateSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/kvraft.KeyValueStore/Get" => {
                    #[allow(non_camel_case_types)]
                    struct GetSvc<T: KeyValueStore>(pub Arc<T>);
                    impl<T: KeyValueStore> tonic::server::UnaryService<super::ProtoGetKey> for GetSvc<T> {
                        type Response = super::ProtoReply;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoGetKey>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).get(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = GetSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/kvraft.KeyValueStore/Put" => {
                    #[allow(non_camel_case_types)]
                    struct PutSvc<T: KeyValueStore>(pub Arc<T>);
                    impl<T: KeyValueStore> tonic::server::UnaryService<super::ProtoKeyValue> for PutSvc<T> {
                        type Response = super::ProtoReply;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoKeyValue>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).put(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = PutSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/kvraft.KeyValueStore/AssignRole" => {
                    #[allow(non_camel_case_types)]
                    struct AssignRoleSvc<T: KeyValueStore>(pub Arc<T>);
                    impl<T: KeyValueStore> tonic::server::UnaryService<super::ProtoRoleAssignment>
                        for AssignRoleSvc<T>
                    {
                        type Response = super::ProtoGenericResponse;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoRoleAssignment>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).assign_role(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = AssignRoleSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/kvraft.KeyValueStore/AppendEntries" => {
                    #[allow(non_camel_case_types)]
                    struct AppendEntriesSvc<T: KeyValueStore>(pub Arc<T>);
                    impl<T: KeyValueStore> tonic::server::UnaryService<super::ProtoAppendEntriesReq>
                        for AppendEntriesSvc<T>
                    {
                        type Response = super::ProtoAppendEntriesResult;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoAppendEntriesReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).append_entries(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = AppendEntriesSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/kvraft.KeyValueStore/RequestVote" => {
                    #[allow(non_camel_case_types)]
                    struct RequestVoteSvc<T: KeyValueStore>(pub Arc<T>);
                    impl<T: KeyValueStore> tonic::server::UnaryService<super::ProtoRequestVoteReq>
                        for RequestVoteSvc<T>
                    {
                        type Response = super::ProtoRequestVoteResult;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoRequestVoteReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).request_vote(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = RequestVoteSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                _ => Box::pin(async move {
                    Ok(http::Response::builder()
                        .status(200)
                        .header("grpc-status", "12")
                        .header("content-type", "application/grpc")
                        .body(tonic::body::BoxBody::empty())
                        .unwrap())
                }),
            }
        }
    }
    impl<T: KeyValueStore> Clone for KeyValueStoreServer<T> {
        fn clone(&self) -> Self {
            let inner = self.inner.clone();
            Self { inner }
        }
    }
    impl<T: KeyValueStore> Clone for _Inner<T> {
        fn clone(&self) -> Self {
            Self(self.0.clone(), self.1.clone())
        }
    }
    impl<T: std::fmt::Debug> std::fmt::Debug for _Inner<T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self.0)
        }
    }
    impl<T: KeyValueStore> tonic::transport::NamedService for KeyValueStoreServer<T> {
        const NAME: &'static str = "kvraft.KeyValueStore";
    }
}
