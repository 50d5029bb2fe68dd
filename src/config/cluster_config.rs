use crate::cluster::{ReplicaId, ReplicaLayout};
use crate::replica::ReplicaOptions;
use serde::Deserialize;
use std::convert::TryFrom;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::{Path, PathBuf};
use std::{fs, io};
use tokio::time::Duration;

/// ClusterConfigFile mirrors the on-disk TOML layout. Every key is optional; missing keys fall
/// back to defaults when validated into a `ClusterConfig`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClusterConfigFile {
    #[serde(default)]
    pub global: GlobalSection,
    #[serde(default)]
    pub servers: ServersSection,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalSection {
    pub base_address: Option<Ipv4Addr>,
    pub control_port: Option<u16>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServersSection {
    pub base_port: Option<u16>,
    pub max_workers: Option<usize>,
    pub persistent_state_path: Option<PathBuf>,
    pub active: Option<u32>,
    pub operation_timeout_ms: Option<u64>,
    pub rpc_timeout_ms: Option<u64>,
    pub heartbeat_interval_ms: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Illegal configuration: {0}")]
    Invalid(&'static str),
}

/// ClusterConfig is the validated configuration shared by the frontend and every replica.
#[derive(Clone, Debug)]
pub struct ClusterConfig {
    control_addr: SocketAddr,
    layout: ReplicaLayout,
    max_workers: usize,
    persistent_state_path: PathBuf,
    operation_timeout: Duration,
    rpc_timeout: Duration,
    heartbeat_interval: Duration,
}

impl ClusterConfig {
    /// Load from `path`, or use defaults if no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => {
                let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::parse_file(&contents)?
            }
            None => ClusterConfigFile::default(),
        };

        Self::try_from(file)
    }

    pub fn parse_file(contents: &str) -> Result<ClusterConfigFile, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn control_addr(&self) -> SocketAddr {
        self.control_addr
    }

    pub fn layout(&self) -> &ReplicaLayout {
        &self.layout
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn persistent_state_path(&self) -> &Path {
        &self.persistent_state_path
    }

    pub fn operation_timeout(&self) -> Duration {
        self.operation_timeout
    }

    pub fn rpc_timeout(&self) -> Duration {
        self.rpc_timeout
    }

    pub fn heartbeat_interval(&self) -> Duration {
        self.heartbeat_interval
    }

    pub fn replica_options(&self) -> ReplicaOptions {
        ReplicaOptions {
            operation_timeout: self.operation_timeout,
            rpc_timeout: self.rpc_timeout,
            heartbeat_interval: self.heartbeat_interval,
            max_workers: self.max_workers,
        }
    }

    /// Directory owned by a single replica under the persistent state path.
    pub fn replica_directory(&self, replica_id: ReplicaId) -> PathBuf {
        self.persistent_state_path.join(format!("replica-{}", replica_id))
    }
}

impl TryFrom<ClusterConfigFile> for ClusterConfig {
    type Error = ConfigError;

    fn try_from(file: ClusterConfigFile) -> Result<Self, Self::Error> {
        let base_address = file.global.base_address.unwrap_or(Ipv4Addr::LOCALHOST);
        let control_port = file.global.control_port.unwrap_or(8001);
        let base_port = file.servers.base_port.unwrap_or(9001);
        let max_replicas = file.servers.active.unwrap_or(5);
        let max_workers = file.servers.max_workers.unwrap_or(10);
        let operation_timeout = Duration::from_millis(file.servers.operation_timeout_ms.unwrap_or(10_000));
        let rpc_timeout = Duration::from_millis(file.servers.rpc_timeout_ms.unwrap_or(3_000));
        let heartbeat_interval = Duration::from_millis(file.servers.heartbeat_interval_ms.unwrap_or(50));

        if control_port == 0 {
            return Err(ConfigError::Invalid("Control port must be non-zero"));
        }
        if base_port == 0 {
            return Err(ConfigError::Invalid("Base port must be non-zero"));
        }
        if max_replicas == 0 {
            return Err(ConfigError::Invalid("Active replica count must be at least 1"));
        }
        let last_port = u32::from(base_port) + max_replicas - 1;
        if last_port > u32::from(u16::MAX) {
            return Err(ConfigError::Invalid("Replica ports exceed 65535"));
        }
        if u32::from(control_port) >= u32::from(base_port) && u32::from(control_port) <= last_port {
            return Err(ConfigError::Invalid("Control port overlaps the replica port range"));
        }
        if max_workers == 0 {
            return Err(ConfigError::Invalid("Worker pool must have at least 1 worker"));
        }
        if operation_timeout < Duration::from_secs(1) || operation_timeout > Duration::from_secs(60) {
            return Err(ConfigError::Invalid("Operation timeout must be within [1s, 60s]"));
        }
        if rpc_timeout == Duration::from_millis(0) {
            return Err(ConfigError::Invalid("RPC timeout must be non-zero"));
        }
        if heartbeat_interval == Duration::from_millis(0) {
            return Err(ConfigError::Invalid("Heartbeat interval must be non-zero"));
        }

        Ok(ClusterConfig {
            control_addr: SocketAddr::V4(SocketAddrV4::new(base_address, control_port)),
            layout: ReplicaLayout::new(base_address, base_port, max_replicas),
            max_workers,
            persistent_state_path: file
                .servers
                .persistent_state_path
                .unwrap_or_else(|| PathBuf::from("./raft-state")),
            operation_timeout,
            rpc_timeout,
            heartbeat_interval,
        })
    }
}
