use crate::consensus::EngineState;
use tokio::sync::watch;

pub(super) fn new(initial_state: EngineState) -> (EngineStateNotifier, EngineStateListener) {
    let (snd, rcv) = watch::channel(initial_state);

    (EngineStateNotifier { snd }, EngineStateListener { rcv })
}

pub(crate) struct EngineStateNotifier {
    snd: watch::Sender<EngineState>,
}

impl EngineStateNotifier {
    pub(super) fn notify_new_state(&self, new_state: EngineState) {
        let _ = self.snd.send(new_state);
    }
}

/// EngineStateListener observes the engine's role and term. Intermediate states between two
/// calls to `next()` are clobbered; only the latest is returned.
#[derive(Clone)]
pub struct EngineStateListener {
    rcv: watch::Receiver<EngineState>,
}

impl EngineStateListener {
    /// The latest state published by the engine.
    pub fn current(&self) -> EngineState {
        self.rcv.borrow().clone()
    }

    pub async fn next(&mut self) -> Option<EngineState> {
        match self.rcv.changed().await {
            Ok(_) => Some(self.rcv.borrow().clone()),
            Err(_) => None,
        }
    }
}
