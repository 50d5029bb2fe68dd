use crate::cluster::{ReplicaId, ReplicaIdentity};
use crate::supervisor::{ReplicaLauncher, ReplicaProcess};
use std::collections::HashMap;
use std::io;
use std::net::TcpListener;
use tokio::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum ProcessSpawnError {
    #[error("Replica {id} is already running")]
    AlreadyRunning { id: ReplicaId },

    #[error("Port {port} for replica {id} is already bound")]
    PortInUse { id: ReplicaId, port: u16 },

    #[error("Failed to launch replica {id}: {source}")]
    Launch { id: ReplicaId, source: io::Error },
}

enum Slot {
    // Reserved while a spawn for this id is in progress.
    Launching,
    Running(Box<dyn ReplicaProcess>),
}

/// ReplicaProcessSupervisor owns the id -> process map. It never restarts anything by itself.
pub struct ReplicaProcessSupervisor {
    logger: slog::Logger,
    launcher: Box<dyn ReplicaLauncher>,
    slots: Mutex<HashMap<ReplicaId, Slot>>,
}

impl ReplicaProcessSupervisor {
    pub fn new(logger: slog::Logger, launcher: Box<dyn ReplicaLauncher>) -> Self {
        ReplicaProcessSupervisor {
            logger,
            launcher,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Launch a replica for `identity`. Fails without launching if this id is already tracked as
    /// live or its port is bound by anyone. Safe to call concurrently for distinct ids.
    pub async fn spawn_replica(&self, identity: &ReplicaIdentity) -> Result<(), ProcessSpawnError> {
        let id = identity.id();
        self.reserve_slot(id).await?;

        // Slot is reserved, so the map lock isn't needed while launching.
        let result = self.launch(identity);

        let mut slots = self.slots.lock().await;
        match result {
            Ok(process) => {
                slots.insert(id, Slot::Running(process));
                slog::info!(self.logger, "Spawned replica {} on port {}", id, identity.port());
                Ok(())
            }
            Err(e) => {
                slots.remove(&id);
                slog::warn!(self.logger, "Failed to spawn replica {}: {}", id, e);
                Err(e)
            }
        }
    }

    /// Terminate the tracked process for `id`, if any. Returns whether a live process was stopped.
    /// The map lock is released before terminating, so other ids aren't held up by a slow stop.
    pub async fn stop_replica(&self, id: ReplicaId) -> bool {
        let mut process = {
            let mut slots = self.slots.lock().await;
            match slots.remove(&id) {
                Some(Slot::Running(process)) => process,
                Some(Slot::Launching) => {
                    // Spawn in progress owns the slot.
                    slots.insert(id, Slot::Launching);
                    return false;
                }
                None => return false,
            }
        };

        let was_running = process.is_running();
        process.terminate().await;
        slog::info!(self.logger, "Stopped replica {} (was running: {})", id, was_running);

        was_running
    }

    pub async fn is_running(&self, id: ReplicaId) -> bool {
        match self.slots.lock().await.get_mut(&id) {
            Some(Slot::Running(process)) => process.is_running(),
            _ => false,
        }
    }

    /// Terminate every tracked process.
    pub async fn shutdown_all(&self) {
        let running: Vec<(ReplicaId, Box<dyn ReplicaProcess>)> = {
            let mut slots = self.slots.lock().await;
            slots
                .drain()
                .filter_map(|(id, slot)| match slot {
                    Slot::Running(process) => Some((id, process)),
                    Slot::Launching => None,
                })
                .collect()
        };

        for (id, mut process) in running {
            process.terminate().await;
            slog::info!(self.logger, "Stopped replica {}", id);
        }
    }

    async fn reserve_slot(&self, id: ReplicaId) -> Result<(), ProcessSpawnError> {
        let mut slots = self.slots.lock().await;
        match slots.get_mut(&id) {
            Some(Slot::Launching) => return Err(ProcessSpawnError::AlreadyRunning { id }),
            Some(Slot::Running(process)) => {
                if process.is_running() {
                    return Err(ProcessSpawnError::AlreadyRunning { id });
                }
                slog::info!(self.logger, "Replica {} has exited, replacing it", id);
            }
            None => {}
        }

        slots.insert(id, Slot::Launching);
        Ok(())
    }

    fn launch(&self, identity: &ReplicaIdentity) -> Result<Box<dyn ReplicaProcess>, ProcessSpawnError> {
        let id = identity.id();
        Self::check_port_free(identity)?;

        self.launcher
            .launch(identity)
            .map_err(|source| ProcessSpawnError::Launch { id, source })
    }

    fn check_port_free(identity: &ReplicaIdentity) -> Result<(), ProcessSpawnError> {
        match TcpListener::bind(identity.socket_addr()) {
            // Listener is dropped here, freeing the port for the replica.
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => Err(ProcessSpawnError::PortInUse {
                id: identity.id(),
                port: identity.port(),
            }),
            Err(source) => Err(ProcessSpawnError::Launch {
                id: identity.id(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ReplicaLayout;
    use std::net::Ipv4Addr;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Notify;

    struct FakeProcess {
        alive: Arc<AtomicBool>,
    }

    #[async_trait::async_trait]
    impl ReplicaProcess for FakeProcess {
        fn is_running(&mut self) -> bool {
            self.alive.load(Ordering::SeqCst)
        }

        async fn terminate(&mut self) {
            self.alive.store(false, Ordering::SeqCst);
        }
    }

    #[derive(Clone, Default)]
    struct FakeLauncher {
        launches: Arc<AtomicUsize>,
        last_alive: Arc<std::sync::Mutex<Option<Arc<AtomicBool>>>>,
    }

    impl ReplicaLauncher for FakeLauncher {
        fn launch(&self, _: &ReplicaIdentity) -> io::Result<Box<dyn ReplicaProcess>> {
            self.launches.fetch_add(1, Ordering::SeqCst);
            let alive = Arc::new(AtomicBool::new(true));
            *self.last_alive.lock().unwrap() = Some(alive.clone());
            Ok(Box::new(FakeProcess { alive }))
        }
    }

    // Terminating blocks until `release` is notified. `entered` fires once terminate has started.
    struct GatedProcess {
        alive: bool,
        entered: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait::async_trait]
    impl ReplicaProcess for GatedProcess {
        fn is_running(&mut self) -> bool {
            self.alive
        }

        async fn terminate(&mut self) {
            self.entered.notify_one();
            self.release.notified().await;
            self.alive = false;
        }
    }

    #[derive(Clone, Default)]
    struct GatedLauncher {
        entered: Arc<Notify>,
        release: Arc<Notify>,
    }

    impl ReplicaLauncher for GatedLauncher {
        fn launch(&self, _: &ReplicaIdentity) -> io::Result<Box<dyn ReplicaProcess>> {
            Ok(Box::new(GatedProcess {
                alive: true,
                entered: self.entered.clone(),
                release: self.release.clone(),
            }))
        }
    }

    struct FailingLauncher;

    impl ReplicaLauncher for FailingLauncher {
        fn launch(&self, _: &ReplicaIdentity) -> io::Result<Box<dyn ReplicaProcess>> {
            Err(io::Error::new(io::ErrorKind::NotFound, "no such binary"))
        }
    }

    fn test_logger() -> slog::Logger {
        slog::Logger::root(slog::Discard, slog::o!())
    }

    fn layout(base_port: u16) -> ReplicaLayout {
        ReplicaLayout::new(Ipv4Addr::LOCALHOST, base_port, 5)
    }

    #[tokio::test]
    async fn double_spawn_rejected() {
        let launcher = FakeLauncher::default();
        let supervisor = ReplicaProcessSupervisor::new(test_logger(), Box::new(launcher.clone()));
        let identity = layout(18211).identity(0).unwrap();

        supervisor.spawn_replica(&identity).await.unwrap();
        let second = supervisor.spawn_replica(&identity).await;

        assert!(matches!(second, Err(ProcessSpawnError::AlreadyRunning { .. })));
        assert_eq!(launcher.launches.load(Ordering::SeqCst), 1);
        assert!(supervisor.is_running(identity.id()).await);
    }

    #[tokio::test]
    async fn bound_port_rejected() {
        let launcher = FakeLauncher::default();
        let supervisor = ReplicaProcessSupervisor::new(test_logger(), Box::new(launcher.clone()));
        let identity = layout(18221).identity(2).unwrap();

        let _squatter = TcpListener::bind(identity.socket_addr()).unwrap();
        let result = supervisor.spawn_replica(&identity).await;

        match result {
            Err(ProcessSpawnError::PortInUse { id, port }) => {
                assert_eq!(id, ReplicaId::new(2));
                assert_eq!(port, 18223);
            }
            other => panic!("expected PortInUse, got {:?}", other),
        }
        assert_eq!(launcher.launches.load(Ordering::SeqCst), 0);
        assert!(!supervisor.is_running(identity.id()).await);
    }

    #[tokio::test]
    async fn exited_process_is_replaced() {
        let launcher = FakeLauncher::default();
        let supervisor = ReplicaProcessSupervisor::new(test_logger(), Box::new(launcher.clone()));
        let identity = layout(18231).identity(1).unwrap();

        supervisor.spawn_replica(&identity).await.unwrap();
        // Simulate a crash.
        let alive = launcher.last_alive.lock().unwrap().clone().unwrap();
        alive.store(false, Ordering::SeqCst);
        assert!(!supervisor.is_running(identity.id()).await);

        supervisor.spawn_replica(&identity).await.unwrap();
        assert_eq!(launcher.launches.load(Ordering::SeqCst), 2);
        assert!(supervisor.is_running(identity.id()).await);
    }

    #[tokio::test]
    async fn stop_then_restart() {
        let launcher = FakeLauncher::default();
        let supervisor = ReplicaProcessSupervisor::new(test_logger(), Box::new(launcher.clone()));
        let identity = layout(18241).identity(3).unwrap();

        assert!(!supervisor.stop_replica(identity.id()).await);

        supervisor.spawn_replica(&identity).await.unwrap();
        assert!(supervisor.stop_replica(identity.id()).await);
        assert!(!supervisor.is_running(identity.id()).await);

        supervisor.spawn_replica(&identity).await.unwrap();
        assert!(supervisor.is_running(identity.id()).await);
    }

    #[tokio::test]
    async fn launch_failure_frees_slot() {
        let supervisor = ReplicaProcessSupervisor::new(test_logger(), Box::new(FailingLauncher));
        let identity = layout(18251).identity(0).unwrap();

        let first = supervisor.spawn_replica(&identity).await;
        assert!(matches!(first, Err(ProcessSpawnError::Launch { .. })));

        // Not stuck in the reserved state.
        let second = supervisor.spawn_replica(&identity).await;
        assert!(matches!(second, Err(ProcessSpawnError::Launch { .. })));
    }

    #[tokio::test]
    async fn shutdown_all_stops_everything() {
        let launcher = FakeLauncher::default();
        let supervisor = ReplicaProcessSupervisor::new(test_logger(), Box::new(launcher.clone()));
        let identities = layout(18261).cluster(3).unwrap();

        for identity in &identities {
            supervisor.spawn_replica(identity).await.unwrap();
        }
        supervisor.shutdown_all().await;

        for identity in &identities {
            assert!(!supervisor.is_running(identity.id()).await);
        }
    }

    #[tokio::test]
    async fn slow_stop_does_not_block_other_ids() {
        let launcher = GatedLauncher::default();
        let supervisor = Arc::new(ReplicaProcessSupervisor::new(test_logger(), Box::new(launcher.clone())));
        let identities = layout(18271).cluster(2).unwrap();
        supervisor.spawn_replica(&identities[0]).await.unwrap();

        let stopping = tokio::spawn({
            let supervisor = supervisor.clone();
            let id = identities[0].id();
            async move { supervisor.stop_replica(id).await }
        });
        launcher.entered.notified().await;

        // Replica 0 is mid-terminate. Everything else still goes through.
        let others = async {
            supervisor.spawn_replica(&identities[1]).await.unwrap();
            assert!(supervisor.is_running(identities[1].id()).await);
            assert!(!supervisor.is_running(identities[0].id()).await);
        };
        assert!(
            tokio::time::timeout(Duration::from_secs(1), others).await.is_ok(),
            "supervisor stayed locked while a replica was terminating"
        );

        launcher.release.notify_one();
        assert!(stopping.await.unwrap());

        // Same for a shutdown stuck on one of its replicas.
        let shutting_down = tokio::spawn({
            let supervisor = supervisor.clone();
            async move { supervisor.shutdown_all().await }
        });
        launcher.entered.notified().await;
        assert!(
            tokio::time::timeout(Duration::from_secs(1), supervisor.is_running(identities[1].id()))
                .await
                .is_ok(),
            "supervisor stayed locked during shutdown"
        );
        launcher.release.notify_one();
        shutting_down.await.unwrap();
    }
}
