use crate::grpc::front_end_client::FrontEndClient;
use crate::grpc::{ProtoGetKey, ProtoIntegerArg, ProtoKeyValue, ProtoReply};
use crate::orchestrator::{ClientReply, TIMEOUT_ERROR};
use crate::replica::ClientRequestKey;
use rand::Rng;
use std::convert::TryFrom;
use std::future::Future;
use std::time::Duration;
use tonic::transport::{Channel, Endpoint};
use tonic::{Response, Status};

#[derive(Clone, Debug, Default)]
pub struct RetryOptions {
    pub initial_backoff: Option<Duration>,
    pub max_backoff: Option<Duration>,
    pub max_attempts: Option<u32>,
}

#[derive(Clone, Debug)]
struct RetryOptionsValidated {
    initial_backoff: Duration,
    max_backoff: Duration,
    max_attempts: u32,
}

impl RetryOptionsValidated {
    fn validate(&self) -> Result<(), &'static str> {
        if self.initial_backoff > self.max_backoff {
            return Err("Initial backoff must not exceed maximum backoff");
        }
        if self.max_attempts == 0 {
            return Err("At least one attempt is required");
        }

        Ok(())
    }

    /// Exponential backoff before attempt `attempt + 1`, with full jitter.
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let ceiling = self
            .initial_backoff
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff);

        let ceiling_ms = ceiling.as_millis() as u64;
        if ceiling_ms == 0 {
            return Duration::from_millis(0);
        }
        Duration::from_millis(rand::thread_rng().gen_range(ceiling_ms / 2..=ceiling_ms))
    }
}

impl TryFrom<RetryOptions> for RetryOptionsValidated {
    type Error = &'static str;

    fn try_from(options: RetryOptions) -> Result<Self, Self::Error> {
        let values = RetryOptionsValidated {
            initial_backoff: options.initial_backoff.unwrap_or(Duration::from_millis(200)),
            max_backoff: options.max_backoff.unwrap_or(Duration::from_secs(3)),
            max_attempts: options.max_attempts.unwrap_or(10),
        };

        values.validate()?;
        Ok(values)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Invalid client options: {0}")]
    InvalidOptions(&'static str),

    #[error("Failed to connect to front end: {0}")]
    Connect(#[from] tonic::transport::Error),

    #[error("Front end returned error status: {0}")]
    Rpc(#[from] Status),

    /// Every attempt came back retryable. Carries the last reply.
    #[error("Gave up after {attempts} attempts, last error: {}", .last_reply.error)]
    RetriesExhausted { attempts: u32, last_reply: ClientReply },

    #[error("{0}")]
    Failed(String),
}

/// KvClient is one client session against the front end. Each logical operation gets a fresh
/// request id, reused across every retry of that operation.
pub struct KvClient {
    logger: slog::Logger,
    inner: FrontEndClient<Channel>,
    client_id: i64,
    next_request_id: i64,
    retry: RetryOptionsValidated,
}

impl KvClient {
    pub async fn connect(logger: slog::Logger, url: String, retry: RetryOptions) -> Result<Self, ClientError> {
        let retry = RetryOptionsValidated::try_from(retry).map_err(ClientError::InvalidOptions)?;
        let channel = Endpoint::from_shared(url)
            .map_err(|e| ClientError::Failed(e.to_string()))?
            .connect()
            .await?;

        let client_id = rand::thread_rng().gen_range(1..i64::MAX);
        slog::info!(logger, "Client session {} started", client_id);

        Ok(KvClient {
            logger,
            inner: FrontEndClient::new(channel),
            client_id,
            next_request_id: 1,
            retry,
        })
    }

    pub fn client_id(&self) -> i64 {
        self.client_id
    }

    pub async fn get(&mut self, key: &str) -> Result<String, ClientError> {
        let request = self.next_request();
        let key = key.to_string();
        self.with_retries(request, |mut inner| {
            let rpc_request = ProtoGetKey {
                key: key.clone(),
                client_id: request.client_id,
                request_id: request.request_id,
            };
            async move { inner.get(rpc_request).await }
        })
        .await
    }

    pub async fn put(&mut self, key: &str, value: &str) -> Result<String, ClientError> {
        let request = self.next_request();
        let key = key.to_string();
        let value = value.to_string();
        self.with_retries(request, |mut inner| {
            let rpc_request = ProtoKeyValue {
                key: key.clone(),
                value: value.clone(),
                client_id: request.client_id,
                request_id: request.request_id,
            };
            async move { inner.put(rpc_request).await }
        })
        .await
    }

    pub async fn start_raft(&mut self, size: i64) -> Result<String, ClientError> {
        let reply = ClientReply::from(self.inner.start_raft(ProtoIntegerArg { arg: size }).await?.into_inner());
        Self::management_result(reply)
    }

    pub async fn start_server(&mut self, id: i64) -> Result<String, ClientError> {
        let reply = ClientReply::from(self.inner.start_server(ProtoIntegerArg { arg: id }).await?.into_inner());
        Self::management_result(reply)
    }

    pub async fn stop_server(&mut self, id: i64) -> Result<String, ClientError> {
        let reply = ClientReply::from(self.inner.stop_server(ProtoIntegerArg { arg: id }).await?.into_inner());
        Self::management_result(reply)
    }

    fn management_result(reply: ClientReply) -> Result<String, ClientError> {
        if reply.error.is_empty() {
            Ok(reply.value)
        } else {
            Err(ClientError::Failed(reply.error))
        }
    }

    fn next_request(&mut self) -> ClientRequestKey {
        let request = ClientRequestKey {
            client_id: self.client_id,
            request_id: self.next_request_id,
        };
        self.next_request_id += 1;
        request
    }

    async fn with_retries<F, Fut>(&mut self, request: ClientRequestKey, call: F) -> Result<String, ClientError>
    where
        F: Fn(FrontEndClient<Channel>) -> Fut,
        Fut: Future<Output = Result<Response<ProtoReply>, Status>>,
    {
        let mut last_reply = ClientReply::default();
        for attempt in 0..self.retry.max_attempts {
            if attempt > 0 {
                tokio::time::sleep(self.retry.backoff(attempt - 1)).await;
            }

            // Channel clones share one connection.
            let reply = match call(self.inner.clone()).await {
                Ok(response) => ClientReply::from(response.into_inner()),
                Err(status) if Self::is_retryable_status(&status) => {
                    slog::debug!(self.logger, "Attempt {} for {:?} failed: {}", attempt, request, status);
                    last_reply = ClientReply::failed(status.message());
                    continue;
                }
                Err(status) => return Err(ClientError::Rpc(status)),
            };

            if reply.is_ok() {
                return Ok(reply.value);
            }
            if !Self::is_retryable_reply(&reply) {
                return Err(ClientError::Failed(reply.error));
            }

            slog::debug!(self.logger, "Attempt {} for {:?} will be retried: {}", attempt, request, reply.error);
            last_reply = reply;
        }

        Err(ClientError::RetriesExhausted {
            attempts: self.retry.max_attempts,
            last_reply,
        })
    }

    fn is_retryable_status(status: &Status) -> bool {
        matches!(
            status.code(),
            tonic::Code::Unavailable | tonic::Code::Unknown | tonic::Code::DeadlineExceeded
        )
    }

    // wrongLeader covers "no leader" too. Timeouts are the only other retryable failure.
    fn is_retryable_reply(reply: &ClientReply) -> bool {
        reply.wrong_leader || reply.error == TIMEOUT_ERROR
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::NO_LEADER_ERROR;
    use crate::replica::OperationError;

    #[test]
    fn backoff_grows_to_cap() {
        let retry = RetryOptionsValidated::try_from(RetryOptions::default()).unwrap();

        for _ in 0..20 {
            let first = retry.backoff(0);
            assert!(first >= Duration::from_millis(100) && first <= Duration::from_millis(200));

            let third = retry.backoff(2);
            assert!(third >= Duration::from_millis(400) && third <= Duration::from_millis(800));

            let late = retry.backoff(40);
            assert!(late >= Duration::from_millis(1500) && late <= Duration::from_secs(3));
        }
    }

    #[test]
    fn invalid_options_rejected() {
        let result = RetryOptionsValidated::try_from(RetryOptions {
            initial_backoff: Some(Duration::from_secs(5)),
            max_backoff: Some(Duration::from_secs(1)),
            max_attempts: None,
        });
        assert!(result.is_err());

        let result = RetryOptionsValidated::try_from(RetryOptions {
            max_attempts: Some(0),
            ..Default::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn retryable_replies() {
        assert!(KvClient::is_retryable_reply(&ClientReply::no_leader()));
        assert!(NO_LEADER_ERROR.contains("retry"));
        assert!(KvClient::is_retryable_reply(&ClientReply::failed(
            OperationError::Timeout.to_string()
        )));
        assert!(!KvClient::is_retryable_reply(&ClientReply::failed(
            "Consensus engine has exited"
        )));
    }

    #[test]
    fn replica_timeout_text_is_the_shared_one() {
        // The orchestrator forwards the replica's error text verbatim.
        assert_eq!(OperationError::Timeout.to_string(), TIMEOUT_ERROR);
        assert!(KvClient::is_retryable_reply(&ClientReply::failed(TIMEOUT_ERROR)));
        assert!(!KvClient::is_retryable_reply(&ClientReply::failed(format!(
            "{} (stale)",
            TIMEOUT_ERROR
        ))));
    }
}
