//! Operator and client command line for the key-value store.
use clap::{Parser, Subcommand};
use raft_kv::{
    stdout_logger, ClusterConfig, KvClient, ReplicaClient, ReplicaId, RetryOptions, Role, RoleAssignment, Term,
};
use std::error::Error;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Talk to a replicated key-value store", long_about = None)]
struct CliArgs {
    /// Cluster config file. Built-in defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum attempts for Get/Put before giving up.
    #[arg(long, default_value_t = 10)]
    max_attempts: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start replicas 0..size.
    StartRaft { size: i64 },
    /// Start (or restart) one replica.
    StartServer { id: i64 },
    /// Stop one replica. Its id and port stay reserved.
    StopServer { id: i64 },
    Get { key: String },
    Put { key: String, value: String },
    /// Ask one replica for its term and leadership.
    State { id: i64 },
    /// Hand a replica its role for a term.
    AssignRole {
        id: i64,
        term: u64,
        /// Make this replica the leader. Otherwise it follows.
        #[arg(long)]
        leader: bool,
        /// Leader the replica should redirect to when following.
        #[arg(long)]
        leader_hint: Option<u32>,
        /// Replicas a leader replicates to. Defaults to every configured replica.
        #[arg(long, value_delimiter = ',')]
        members: Option<Vec<u32>>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = CliArgs::parse();
    let config = ClusterConfig::load(args.config.as_deref())?;
    let logger = stdout_logger().new(slog::o!("Component" => "kvctl"));
    let retry = RetryOptions {
        max_attempts: Some(args.max_attempts),
        ..Default::default()
    };

    match args.command {
        Command::State { id } => {
            let client = ReplicaClient::new(config.layout().identity(id)?, config.rpc_timeout());
            let state = client.get_state().await?;
            println!("term={:?} is_leader={}", state.term, state.is_leader);
        }
        Command::AssignRole {
            id,
            term,
            leader,
            leader_hint,
            members,
        } => {
            let client = ReplicaClient::new(config.layout().identity(id)?, config.rpc_timeout());
            let members = members.unwrap_or_else(|| (0..config.layout().max_replicas()).collect());
            let assignment = RoleAssignment {
                term: Term::new(term),
                role: if leader { Role::Leader } else { Role::Follower },
                leader_hint: leader_hint.map(ReplicaId::new),
                members: members.into_iter().map(ReplicaId::new).collect(),
            };
            println!("{}", client.assign_role(assignment).await?);
        }
        Command::StartRaft { size } => {
            let mut client = connect(&config, &retry, logger).await?;
            println!("{}", client.start_raft(size).await?);
        }
        Command::StartServer { id } => {
            let mut client = connect(&config, &retry, logger).await?;
            println!("{}", client.start_server(id).await?);
        }
        Command::StopServer { id } => {
            let mut client = connect(&config, &retry, logger).await?;
            println!("{}", client.stop_server(id).await?);
        }
        Command::Get { key } => {
            let mut client = connect(&config, &retry, logger).await?;
            println!("{}", client.get(&key).await?);
        }
        Command::Put { key, value } => {
            let mut client = connect(&config, &retry, logger).await?;
            println!("{}", client.put(&key, &value).await?);
        }
    }

    Ok(())
}

async fn connect(
    config: &ClusterConfig,
    retry: &RetryOptions,
    logger: slog::Logger,
) -> Result<KvClient, Box<dyn Error>> {
    let url = format!("http://{}", config.control_addr());
    Ok(KvClient::connect(logger, url, retry.clone()).await?)
}
