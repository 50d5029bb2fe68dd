use crate::replica::state_machine::{Applied, ClientRequestKey, KvCommand, KvStateMachine, OperationOutput};
use std::collections::HashMap;
use tokio::sync::watch;

pub(crate) type OutcomeReceiver = watch::Receiver<Option<OperationOutput>>;

/// AppliedState is the state machine plus the table of operations submitted but not yet applied.
/// Both live behind one lock so that "is it recorded?" and "is it in flight?" are answered
/// atomically with respect to the apply task.
pub(crate) struct AppliedState {
    machine: KvStateMachine,
    in_flight: HashMap<ClientRequestKey, InFlight>,
    next_ticket: u64,
}

struct InFlight {
    ticket: u64,
    outcome: watch::Sender<Option<OperationOutput>>,
}

/// Admission tells a caller what to do with an incoming request.
pub(crate) enum Admission {
    /// Already applied. Reply with this.
    Recorded(OperationOutput),
    /// Someone else submitted it. Wait for their outcome.
    Joined(OutcomeReceiver),
    /// Caller must submit it. `ticket` identifies this submission when abandoning it.
    Submit { ticket: u64, outcome: OutcomeReceiver },
}

impl AppliedState {
    pub(crate) fn new() -> Self {
        AppliedState {
            machine: KvStateMachine::new(),
            in_flight: HashMap::new(),
            next_ticket: 0,
        }
    }

    pub(crate) fn admit(&mut self, request: ClientRequestKey) -> Admission {
        if let Some(output) = self.machine.recorded_output(&request) {
            return Admission::Recorded(output);
        }

        if let Some(in_flight) = self.in_flight.get(&request) {
            return Admission::Joined(in_flight.outcome.subscribe());
        }

        let ticket = self.next_ticket;
        self.next_ticket += 1;

        let (tx, rx) = watch::channel(None);
        self.in_flight.insert(request, InFlight { ticket, outcome: tx });

        Admission::Submit { ticket, outcome: rx }
    }

    /// Drop the in-flight entry for `request` if it still belongs to submission `ticket`. Anyone
    /// waiting on it sees the channel close.
    pub(crate) fn abandon(&mut self, request: &ClientRequestKey, ticket: u64) {
        let owned = matches!(self.in_flight.get(request), Some(in_flight) if in_flight.ticket == ticket);
        if owned {
            self.in_flight.remove(request);
        }
    }

    pub(crate) fn apply_committed(&mut self, command: KvCommand) -> Applied {
        let request = command.request;
        let applied = self.machine.apply(command);

        if let Some(in_flight) = self.in_flight.remove(&request) {
            // Waiters may have given up already.
            let _ = in_flight.outcome.send(Some(applied.output.clone()));
        }

        applied
    }
}

/// Wait until the outcome is published. Returns None if the submission was abandoned first.
pub(crate) async fn wait_for_outcome(mut outcome: OutcomeReceiver) -> Option<OperationOutput> {
    loop {
        let current = outcome.borrow().clone();
        if current.is_some() {
            return current;
        }

        if outcome.changed().await.is_err() {
            return outcome.borrow().clone();
        }
    }
}
