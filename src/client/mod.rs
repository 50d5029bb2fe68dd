mod kv_client;

pub use kv_client::ClientError;
pub use kv_client::KvClient;
pub use kv_client::RetryOptions;
