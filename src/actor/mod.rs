use crate::consensus::{
    AppendEntriesError, AppendEntriesInput, AppendEntriesReplyFromPeer, AssignProgress, AssignRoleError, EngineState,
    EntryId, RequestVoteError, RequestVoteInput, RequestVoteOutput, RequestVoteReplyFromPeer, RoleAssignment,
    StandaloneCore, SubmitError, Term,
};
use bytes::Bytes;
use std::error::Error;
use std::fmt::Debug;
use tokio::sync::{mpsc, oneshot};

#[derive(Debug)]
pub(crate) enum Event {
    // Leader: Append entry, replicate it, respond with its id. Committed later.
    // Candidate: Reject request.
    // Follower: Redirect.
    Submit(Bytes, Callback<EntryId, SubmitError>),

    // Any role: Adopt the assignment if it doesn't move the term backwards or give a term a
    // second leader. A leader assignment with peers responds once the campaign is decided.
    AssignRole(RoleAssignment, Callback<EngineState, AssignRoleError>),

    // Leader: Reject unless the caller's term is newer, then follow it.
    // Candidate: Follow the caller if its term is at least ours.
    // Follower: Match the caller's log, commit what it has committed.
    AppendEntries(AppendEntriesInput, Callback<(), AppendEntriesError>),

    // Any role: Grant vote if applicable. A newer term makes us a follower first.
    RequestVote(RequestVoteInput, Callback<RequestVoteOutput, RequestVoteError>),
}

/// PeerEvent is raised by tasks the engine spawned itself. These never carry a callback.
#[derive(Debug)]
pub(crate) enum PeerEvent {
    // Leader: Track the peer's progress, commit what a majority holds, send more if behind.
    // Candidate/Follower: discard
    AppendEntriesReply(AppendEntriesReplyFromPeer),

    // Candidate: Count the vote. Lead on majority, give up once every peer has answered.
    // Leader/Follower: discard
    RequestVoteReply(RequestVoteReplyFromPeer),

    // Leader: Call AppendEntries on every peer not already waiting on one.
    // Candidate/Follower: discard
    HeartbeatTick(Term),
}

#[derive(Debug)]
pub(crate) struct Callback<O: Debug, E: Error>(oneshot::Sender<Result<O, E>>);

impl<O: Debug, E: Error> Callback<O, E> {
    pub fn send(self, message: Result<O, E>) {
        let _ = self.0.send(message);
    }
}

#[derive(Clone)]
pub(crate) struct ActorClient {
    sender: mpsc::Sender<Event>,
}

impl ActorClient {
    pub(crate) fn new(buffer_size: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(buffer_size);

        (ActorClient { sender: tx }, rx)
    }

    pub(crate) async fn submit(&self, data: Bytes) -> Result<EntryId, SubmitError> {
        let (tx, rx) = oneshot::channel();
        if self.send(Event::Submit(data, Callback(tx))).await.is_err() {
            return Err(SubmitError::EngineExited);
        }

        rx.await.unwrap_or(Err(SubmitError::EngineExited))
    }

    pub(crate) async fn assign_role(&self, assignment: RoleAssignment) -> Result<EngineState, AssignRoleError> {
        let (tx, rx) = oneshot::channel();
        if self.send(Event::AssignRole(assignment, Callback(tx))).await.is_err() {
            return Err(AssignRoleError::EngineExited);
        }

        rx.await.unwrap_or(Err(AssignRoleError::EngineExited))
    }

    pub(crate) async fn append_entries(&self, input: AppendEntriesInput) -> Result<(), AppendEntriesError> {
        let (tx, rx) = oneshot::channel();
        if self.send(Event::AppendEntries(input, Callback(tx))).await.is_err() {
            return Err(AppendEntriesError::EngineExited);
        }

        rx.await.unwrap_or(Err(AppendEntriesError::EngineExited))
    }

    pub(crate) async fn request_vote(&self, input: RequestVoteInput) -> Result<RequestVoteOutput, RequestVoteError> {
        let (tx, rx) = oneshot::channel();
        if self.send(Event::RequestVote(input, Callback(tx))).await.is_err() {
            return Err(RequestVoteError::EngineExited);
        }

        rx.await.unwrap_or(Err(RequestVoteError::EngineExited))
    }

    async fn send(&self, event: Event) -> Result<(), mpsc::error::SendError<Event>> {
        self.sender.send(event).await
    }
}

/// EngineActor is the standalone engine's logic in actor model.
pub(crate) struct EngineActor {
    logger: slog::Logger,
    receiver: mpsc::Receiver<Event>,
    peer_events: mpsc::UnboundedReceiver<PeerEvent>,
    engine: StandaloneCore,
    // Caller of the leader assignment whose campaign is still running.
    pending_campaign: Option<Callback<EngineState, AssignRoleError>>,
}

impl EngineActor {
    pub(crate) fn new(
        logger: slog::Logger,
        receiver: mpsc::Receiver<Event>,
        peer_events: mpsc::UnboundedReceiver<PeerEvent>,
        engine: StandaloneCore,
    ) -> Self {
        EngineActor {
            logger,
            receiver,
            peer_events,
            engine,
            pending_campaign: None,
        }
    }

    pub(crate) async fn run_event_loop(mut self) {
        loop {
            tokio::select! {
                event = self.receiver.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },
                Some(peer_event) = self.peer_events.recv() => {
                    self.engine.handle_peer_event(peer_event);
                    self.resolve_pending_campaign();
                }
            }
        }
        slog::info!(self.logger, "Engine event loop exited. All clients dropped.");
    }

    // This must NOT be async. Any long running work must be spawned on another task.
    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Submit(data, callback) => {
                let result = self.engine.handle_submit(data);
                callback.send(result);
            }
            Event::AssignRole(assignment, callback) => {
                let result = self.engine.handle_assign_role(assignment);
                // A campaign this assignment replaced is answered before the new one is parked.
                self.resolve_pending_campaign();
                match result {
                    Ok(AssignProgress::Assigned(state)) => callback.send(Ok(state)),
                    Ok(AssignProgress::Campaigning) => self.pending_campaign = Some(callback),
                    Err(e) => callback.send(Err(e)),
                }
            }
            Event::AppendEntries(input, callback) => {
                let result = self.engine.handle_append_entries(input);
                self.resolve_pending_campaign();
                callback.send(result);
            }
            Event::RequestVote(input, callback) => {
                let result = self.engine.handle_request_vote(input);
                self.resolve_pending_campaign();
                callback.send(result);
            }
        }
    }

    fn resolve_pending_campaign(&mut self) {
        if let Some(outcome) = self.engine.take_campaign_outcome() {
            match self.pending_campaign.take() {
                Some(callback) => callback.send(outcome),
                None => slog::debug!(self.logger, "Campaign ended with nobody waiting: {:?}", outcome),
            }
        }
    }
}
