//! Cluster configuration, loaded once at process startup by every binary.
mod cluster_config;

pub use cluster_config::ClusterConfig;
pub use cluster_config::ClusterConfigFile;
pub use cluster_config::ConfigError;
