use crate::actor::PeerEvent;
use crate::cluster::ReplicaId;
use crate::commitlog::Index;
use crate::consensus::commit_stream::CommitStreamPublisher;
use crate::consensus::leader_state::{cluster_commit_index, LeaderState};
use crate::consensus::peer_client::PeerClient;
use crate::consensus::replicated_log::{EngineLogEntry, ReplicatedLog};
use crate::consensus::replication_api::{
    AppendEntriesError, AppendEntriesInput, AppendEntriesReplyFromPeer, PeerReplyError, RequestVoteError,
    RequestVoteInput, RequestVoteOutput, RequestVoteReplyFromPeer,
};
use crate::consensus::state_change_listener::EngineStateNotifier;
use crate::consensus::{EngineState, EngineStateListener, EntryId, Role, StandaloneEngineConfig, SubmitError, Term};
use bytes::Bytes;
use std::collections::BTreeMap;
use std::time::Duration;
use std::{cmp, io, mem};
use tokio::sync::mpsc;

// Upper bound on entries carried by one AppendEntries call.
const MAX_ENTRIES_PER_REQUEST: usize = 64;

/// RoleAssignment is an externally made leadership decision handed to the standalone engine.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoleAssignment {
    pub term: Term,
    pub role: Role,
    /// Only meaningful for followers.
    pub leader_hint: Option<ReplicaId>,
    /// Replicas a leader replicates to. Only read for leaders. The local replica is always a
    /// member; an empty list makes a single-member cluster.
    pub members: Vec<ReplicaId>,
}

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum AssignRoleError {
    #[error("Assigned term is older than current term {current_term:?}")]
    StaleTerm { current_term: Term },
    #[error("Term {term:?} already has leader {leader}")]
    ConflictingLeader { term: Term, leader: ReplicaId },
    #[error("A follower can't name itself as leader")]
    SelfAsLeaderHint,
    #[error("Member {id} is not part of the cluster layout")]
    UnknownMember { id: ReplicaId },
    #[error("Only {granted} of {members} members accepted leadership for term {term:?}")]
    NoQuorum { term: Term, granted: usize, members: usize },
    #[error("A newer assignment replaced this one")]
    Superseded,
    #[error("Failed to update local log: {0}")]
    LocalIoError(String),
    #[error("Consensus engine has exited")]
    EngineExited,
}

/// AssignProgress is how far a role assignment got before `handle_assign_role` returned.
#[derive(Debug, Eq, PartialEq)]
pub(crate) enum AssignProgress {
    Assigned(EngineState),
    // Votes were requested. The outcome shows up in `take_campaign_outcome()`.
    Campaigning,
}

struct Campaign {
    term: Term,
    granted: usize,
    answered: usize,
    needed: usize,
}

enum Leadership {
    Idle,
    Campaigning(Campaign),
    Leading(LeaderState),
}

/// StandaloneCore is the logic of an engine whose leadership is decided outside of it. It never
/// starts an election on its own. A replica told to lead asks the listed members for their votes
/// first, and wins only if a majority agree its log is at least as up to date as theirs. As leader
/// it replicates the log and commits what a majority holds; as follower it accepts the leader's
/// entries and commits what the leader has committed.
pub(crate) struct StandaloneCore {
    logger: slog::Logger,
    config: StandaloneEngineConfig,
    log: ReplicatedLog,
    state: EngineState,
    voted_for: Option<ReplicaId>,
    peers: BTreeMap<ReplicaId, PeerClient>,
    leadership: Leadership,
    campaign_outcome: Option<Result<EngineState, AssignRoleError>>,
    state_notifier: EngineStateNotifier,
    state_listener: EngineStateListener,
    peer_events: mpsc::UnboundedSender<PeerEvent>,
}

impl StandaloneCore {
    pub(crate) fn new(
        logger: slog::Logger,
        config: StandaloneEngineConfig,
        state_notifier: EngineStateNotifier,
        state_listener: EngineStateListener,
        commit_publisher: CommitStreamPublisher,
        peer_events: mpsc::UnboundedSender<PeerEvent>,
    ) -> Result<Self, io::Error> {
        Ok(StandaloneCore {
            log: ReplicatedLog::new(logger.clone(), commit_publisher)?,
            logger,
            config,
            state: EngineState::initial(),
            voted_for: None,
            peers: BTreeMap::new(),
            leadership: Leadership::Idle,
            campaign_outcome: None,
            state_notifier,
            state_listener,
            peer_events,
        })
    }

    fn my_replica_id(&self) -> ReplicaId {
        self.config.replica_id
    }

    pub(crate) fn handle_submit(&mut self, data: Bytes) -> Result<EntryId, SubmitError> {
        if !self.state.is_leader() {
            return Err(SubmitError::NotLeader {
                leader_hint: self.state.leader_hint,
            });
        }

        let term = self.state.term;
        let index = self
            .log
            .append(EngineLogEntry { term, data })
            .map_err(SubmitError::LocalIoError)?;

        if self.peers.is_empty() {
            self.log
                .ratchet_fwd_commit_index(index)
                .map_err(SubmitError::LocalIoError)?;
        } else {
            self.replicate_to_all();
        }

        Ok(EntryId { term, index })
    }

    pub(crate) fn handle_assign_role(&mut self, assignment: RoleAssignment) -> Result<AssignProgress, AssignRoleError> {
        if assignment.term < self.state.term {
            return Err(AssignRoleError::StaleTerm {
                current_term: self.state.term,
            });
        }

        let my_replica_id = self.my_replica_id();
        let new_leader = match assignment.role {
            Role::Leader => Some(my_replica_id),
            Role::Candidate => None,
            Role::Follower => {
                if assignment.leader_hint == Some(my_replica_id) {
                    return Err(AssignRoleError::SelfAsLeaderHint);
                }
                assignment.leader_hint
            }
        };

        // Once a term has a known leader, it keeps it.
        if assignment.term == self.state.term {
            if let Some(known_leader) = self.state.leader_hint {
                if new_leader != Some(known_leader) {
                    return Err(AssignRoleError::ConflictingLeader {
                        term: assignment.term,
                        leader: known_leader,
                    });
                }
            }
            if assignment.role == Role::Leader {
                if let Some(voted_for) = self.voted_for {
                    if voted_for != my_replica_id {
                        return Err(AssignRoleError::ConflictingLeader {
                            term: assignment.term,
                            leader: voted_for,
                        });
                    }
                }
                if self.state.is_leader() {
                    return Ok(AssignProgress::Assigned(self.state.clone()));
                }
            }
        }

        let peers = match assignment.role {
            Role::Leader => self.peer_clients(&assignment.members)?,
            Role::Follower | Role::Candidate => BTreeMap::new(),
        };

        self.end_leadership(AssignRoleError::Superseded);
        if assignment.term > self.state.term {
            self.voted_for = None;
        }
        self.peers = peers;

        slog::info!(
            self.logger,
            "Role assigned: {:?} for term {:?} (leader={:?})",
            assignment.role,
            assignment.term,
            new_leader
        );

        if assignment.role != Role::Leader {
            self.set_state(EngineState {
                term: assignment.term,
                role: assignment.role,
                leader_hint: new_leader,
            });
            return Ok(AssignProgress::Assigned(self.state.clone()));
        }

        self.voted_for = Some(my_replica_id);
        self.set_state(EngineState {
            term: assignment.term,
            role: Role::Candidate,
            leader_hint: None,
        });

        if self.peers.is_empty() {
            self.become_leader()
                .map_err(|e| AssignRoleError::LocalIoError(e.to_string()))?;
            return Ok(AssignProgress::Assigned(self.state.clone()));
        }

        self.start_campaign();
        Ok(AssignProgress::Campaigning)
    }

    /// How the latest campaign ended, once it has.
    pub(crate) fn take_campaign_outcome(&mut self) -> Option<Result<EngineState, AssignRoleError>> {
        self.campaign_outcome.take()
    }

    pub(crate) fn handle_peer_event(&mut self, event: PeerEvent) {
        match event {
            PeerEvent::AppendEntriesReply(reply) => self.handle_append_entries_reply(reply),
            PeerEvent::RequestVoteReply(reply) => self.handle_request_vote_reply(reply),
            PeerEvent::HeartbeatTick(term) => {
                if term == self.state.term && self.state.is_leader() {
                    self.replicate_to_all();
                }
            }
        }
    }

    pub(crate) fn handle_append_entries(&mut self, input: AppendEntriesInput) -> Result<(), AppendEntriesError> {
        // 1. Reply false if term < currentTerm
        if input.term < self.state.term {
            return Err(AppendEntriesError::StaleTerm {
                current_term: self.state.term,
            });
        }

        if input.term > self.state.term {
            self.step_down(input.term, Some(input.leader_id));
        } else {
            match self.state.leader_hint {
                Some(known_leader) if known_leader != input.leader_id => {
                    return Err(AppendEntriesError::ConflictingLeader {
                        term: input.term,
                        leader: known_leader,
                    });
                }
                Some(_) => {}
                None => self.step_down(input.term, Some(input.leader_id)),
            }
        }

        // 2. Reply false if log doesn't contain an entry at prevLogIndex whose term matches
        // prevLogTerm
        if let Some((previous_term, previous_index)) = input.previous_log_entry {
            match self.log.read(previous_index)? {
                Some(entry) if entry.term == previous_term => {}
                _ => {
                    return Err(AppendEntriesError::MissingPreviousLogEntry {
                        last_index: self.log.latest_index(),
                    })
                }
            }
        }

        // 3. If an existing entry conflicts with a new one (same index, different terms), delete
        // the existing entry and all that follow it.
        // 4. Append any new entries not already in the log.
        let first_new_index = match input.previous_log_entry {
            None => Index::start_index(),
            Some((_, previous_index)) => previous_index.plus(1),
        };
        let mut next_index = first_new_index;
        for new_entry in input.entries.iter() {
            if let Some(existing) = self.log.read(next_index)? {
                if existing.term == new_entry.term {
                    next_index = next_index.plus(1);
                    continue;
                }
                slog::info!(
                    self.logger,
                    "Dropping entries from {:?}, they conflict with leader {}",
                    next_index,
                    input.leader_id
                );
                self.log.truncate(next_index)?;
            }

            let appended_index = self.log.append(new_entry.clone())?;
            if appended_index != next_index {
                return Err(AppendEntriesError::LocalIoError(io::Error::new(
                    io::ErrorKind::Other,
                    format!("Appended entry at {:?}, expected {:?}", appended_index, next_index),
                )));
            }
            next_index = next_index.plus(1);
        }

        // 5. If leaderCommit > commitIndex, set commitIndex = min(leaderCommit, index of last new
        // entry)
        if let (Some(leader_commit), Some(last_new_index)) = (input.commit_index, next_index.checked_minus(1)) {
            self.log
                .ratchet_fwd_commit_index(cmp::min(leader_commit, last_new_index))?;
        }

        Ok(())
    }

    pub(crate) fn handle_request_vote(&mut self, input: RequestVoteInput) -> Result<RequestVoteOutput, RequestVoteError> {
        if input.term < self.state.term {
            return Err(RequestVoteError::StaleTerm {
                current_term: self.state.term,
            });
        }

        if input.term > self.state.term {
            self.step_down(input.term, None);
        }

        let deny_reason = if self.state.is_leader() {
            Some("already leading this term")
        } else if self
            .state
            .leader_hint
            .map_or(false, |leader| leader != input.candidate_id)
        {
            Some("term already has a leader")
        } else if self.voted_for.map_or(false, |voted| voted != input.candidate_id) {
            Some("already voted this term")
        } else if !self.is_candidate_log_gte_mine(input.last_log_entry) {
            Some("candidate log is behind")
        } else {
            None
        };

        if let Some(reason) = deny_reason {
            slog::info!(
                self.logger,
                "Not granting vote to {} for term {:?}: {}",
                input.candidate_id,
                input.term,
                reason
            );
            return Ok(RequestVoteOutput { vote_granted: false });
        }

        slog::info!(self.logger, "Voting for {} in term {:?}", input.candidate_id, input.term);
        self.voted_for = Some(input.candidate_id);
        Ok(RequestVoteOutput { vote_granted: true })
    }

    fn is_candidate_log_gte_mine(&self, candidate_last_entry: Option<(Term, Index)>) -> bool {
        match (self.log.latest_entry(), candidate_last_entry) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some((my_term, my_index)), Some((candidate_term, candidate_index))) => {
                if candidate_term != my_term {
                    return candidate_term > my_term;
                }
                candidate_index >= my_index
            }
        }
    }

    fn peer_clients(&self, members: &[ReplicaId]) -> Result<BTreeMap<ReplicaId, PeerClient>, AssignRoleError> {
        let mut peers = BTreeMap::new();
        for member in members.iter().filter(|member| **member != self.my_replica_id()) {
            let identity = self
                .config
                .layout
                .identity(i64::from(member.as_u32()))
                .map_err(|_| AssignRoleError::UnknownMember { id: *member })?;
            peers.insert(*member, PeerClient::new(identity, self.config.rpc_timeout));
        }

        Ok(peers)
    }

    fn set_state(&mut self, new_state: EngineState) {
        self.state = new_state;
        self.state_notifier.notify_new_state(self.state.clone());
    }

    // Drop any campaign or leadership. A campaign still waiting on votes ends with `outcome`.
    fn end_leadership(&mut self, outcome: AssignRoleError) {
        if let Leadership::Campaigning(campaign) = mem::replace(&mut self.leadership, Leadership::Idle) {
            slog::info!(self.logger, "Campaign for term {:?} ended: {}", campaign.term, outcome);
            self.campaign_outcome = Some(Err(outcome));
        }
    }

    fn step_down(&mut self, term: Term, leader_hint: Option<ReplicaId>) {
        if term > self.state.term {
            self.voted_for = None;
        }
        self.end_leadership(match leader_hint {
            Some(leader) => AssignRoleError::ConflictingLeader { term, leader },
            None => AssignRoleError::StaleTerm { current_term: term },
        });

        let new_state = EngineState {
            term,
            role: Role::Follower,
            leader_hint,
        };
        if new_state != self.state {
            slog::info!(self.logger, "Following {:?} in term {:?}", leader_hint, term);
            self.set_state(new_state);
        }
    }

    fn start_campaign(&mut self) {
        let term = self.state.term;
        let members = self.peers.len() + 1;
        self.leadership = Leadership::Campaigning(Campaign {
            term,
            granted: 1,
            answered: 0,
            needed: members / 2 + 1,
        });
        slog::info!(self.logger, "Requesting votes from {} peers for term {:?}", self.peers.len(), term);

        let input = RequestVoteInput {
            candidate_id: self.my_replica_id(),
            term,
            last_log_entry: self.log.latest_entry(),
        };
        for client in self.peers.values() {
            let client = client.clone();
            let input = input.clone();
            let logger = self.logger.clone();
            let peer_events = self.peer_events.clone();
            tokio::spawn(async move {
                let peer_id = client.peer_id();
                let result = client.request_vote(&logger, input).await;
                let _ = peer_events.send(PeerEvent::RequestVoteReply(RequestVoteReplyFromPeer {
                    peer_id,
                    term,
                    result,
                }));
            });
        }
    }

    fn handle_request_vote_reply(&mut self, reply: RequestVoteReplyFromPeer) {
        let campaign = match &mut self.leadership {
            Leadership::Campaigning(campaign) if campaign.term == reply.term => campaign,
            _ => {
                slog::debug!(self.logger, "Vote from {} for term {:?} arrived late", reply.peer_id, reply.term);
                return;
            }
        };

        campaign.answered += 1;
        match reply.result {
            Ok(true) => campaign.granted += 1,
            Ok(false) => {
                slog::info!(self.logger, "Vote not granted by {} for term {:?}", reply.peer_id, reply.term);
            }
            Err(PeerReplyError::StaleTerm { new_term }) if new_term > reply.term => {
                slog::info!(self.logger, "Peer {} is already in term {:?}", reply.peer_id, new_term);
                self.step_down(new_term, None);
                return;
            }
            Err(e) => {
                slog::warn!(self.logger, "No vote from {} for term {:?}: {:?}", reply.peer_id, reply.term, e);
            }
        }

        let (term, granted, answered, needed) = (campaign.term, campaign.granted, campaign.answered, campaign.needed);
        if granted >= needed {
            slog::info!(self.logger, "Received {}/{} votes for term {:?}", granted, self.peers.len() + 1, term);
            self.leadership = Leadership::Idle;
            let outcome = match self.become_leader() {
                Ok(()) => Ok(self.state.clone()),
                Err(e) => Err(AssignRoleError::LocalIoError(e.to_string())),
            };
            self.campaign_outcome = Some(outcome);
        } else if answered == self.peers.len() {
            self.leadership = Leadership::Idle;
            self.campaign_outcome = Some(Err(AssignRoleError::NoQuorum {
                term,
                granted,
                members: self.peers.len() + 1,
            }));
        }
    }

    fn become_leader(&mut self) -> Result<(), io::Error> {
        let term = self.state.term;
        let marker_index = self.log.append(EngineLogEntry::leadership_marker(term))?;
        self.leadership = Leadership::Leading(LeaderState::new(self.peers.keys().copied(), marker_index));
        self.set_state(EngineState {
            term,
            role: Role::Leader,
            leader_hint: Some(self.my_replica_id()),
        });
        slog::info!(self.logger, "Leading term {:?} with {} peers", term, self.peers.len());

        if self.peers.is_empty() {
            return self.log.ratchet_fwd_commit_index(marker_index);
        }

        self.spawn_heartbeat_timer(term, self.config.heartbeat_interval);
        self.replicate_to_all();
        Ok(())
    }

    fn spawn_heartbeat_timer(&self, term: Term, interval: Duration) {
        let listener = self.state_listener.clone();
        let peer_events = self.peer_events.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;

                let state = listener.current();
                if state.term != term || !state.is_leader() {
                    break;
                }
                if peer_events.send(PeerEvent::HeartbeatTick(term)).is_err() {
                    break;
                }
            }
        });
    }

    fn replicate_to_all(&mut self) {
        let peer_ids: Vec<ReplicaId> = self.peers.keys().copied().collect();
        for peer_id in peer_ids {
            self.replicate_to(peer_id);
        }
    }

    // Send the peer everything it is missing, up to a batch. With nothing missing, this is a
    // heartbeat.
    fn replicate_to(&mut self, peer_id: ReplicaId) {
        let leader_state = match &mut self.leadership {
            Leadership::Leading(leader_state) => leader_state,
            _ => return,
        };
        let (peer_state, client) = match (leader_state.peer_state_mut(&peer_id), self.peers.get(&peer_id)) {
            (Some(peer_state), Some(client)) => (peer_state, client.clone()),
            _ => {
                slog::error!(self.logger, "Peer {} is not tracked", peer_id);
                return;
            }
        };
        if peer_state.in_flight() {
            return;
        }

        let (next_index, previous_index) = peer_state.next_and_previous_log_index();
        let previous_log_entry = match previous_index {
            None => None,
            Some(index) => match self.log.read(index) {
                Ok(Some(entry)) => Some((entry.term, index)),
                Ok(None) => {
                    slog::error!(self.logger, "Entry {:?} for peer {} is missing from the log", index, peer_id);
                    return;
                }
                Err(e) => {
                    slog::error!(self.logger, "Failed to read entry {:?}: {:?}", index, e);
                    return;
                }
            },
        };
        let entries = match self.log.read_from(next_index, MAX_ENTRIES_PER_REQUEST) {
            Ok(entries) => entries,
            Err(e) => {
                slog::error!(self.logger, "Failed to read entries from {:?}: {:?}", next_index, e);
                return;
            }
        };
        peer_state.set_in_flight(true);

        let term = self.state.term;
        let num_entries = entries.len();
        let input = AppendEntriesInput {
            leader_id: self.config.replica_id,
            term,
            previous_log_entry,
            commit_index: self.log.commit_index(),
            entries,
        };
        let logger = self.logger.new(slog::o!("Peer" => peer_id.as_u32()));
        let peer_events = self.peer_events.clone();
        tokio::spawn(async move {
            let result = client.append_entries(&logger, input).await;
            let _ = peer_events.send(PeerEvent::AppendEntriesReply(AppendEntriesReplyFromPeer {
                peer_id,
                term,
                previous_log_entry_index: previous_index,
                num_entries,
                result,
            }));
        });
    }

    fn handle_append_entries_reply(&mut self, reply: AppendEntriesReplyFromPeer) {
        let current_term = self.state.term;
        if reply.term != current_term {
            slog::debug!(
                self.logger,
                "AppendEntries reply for term {:?}, current term {:?}",
                reply.term,
                current_term
            );
            return;
        }

        let leader_state = match &mut self.leadership {
            Leadership::Leading(leader_state) => leader_state,
            _ => return,
        };
        let peer_state = match leader_state.peer_state_mut(&reply.peer_id) {
            Some(peer_state) => peer_state,
            None => return,
        };
        peer_state.set_in_flight(false);

        match reply.result {
            Ok(()) => peer_state.record_success(reply.previous_log_entry_index, reply.num_entries),
            Err(PeerReplyError::PeerLogBehind { last_index }) => {
                slog::info!(self.logger, "Peer {} is behind, its log ends at {:?}", reply.peer_id, last_index);
                peer_state.rewind(last_index);
            }
            Err(PeerReplyError::StaleTerm { new_term }) if new_term > current_term => {
                slog::warn!(self.logger, "Peer {} is in newer term {:?}, stepping down", reply.peer_id, new_term);
                self.step_down(new_term, None);
                return;
            }
            Err(e) => {
                // The next heartbeat retries.
                slog::debug!(self.logger, "AppendEntries to {} failed: {:?}", reply.peer_id, e);
                return;
            }
        }
        let (next_index, _) = peer_state.next_and_previous_log_index();

        // A majority of match indexes, counting only entries of this term.
        if let Some(tentative_commit_index) = cluster_commit_index(leader_state.peers_matched()) {
            if let Err(e) = self
                .log
                .ratchet_fwd_commit_index_if_valid(tentative_commit_index, current_term)
            {
                slog::warn!(
                    self.logger,
                    "IO failure while committing up to {:?}: {:?}",
                    tentative_commit_index,
                    e
                );
            }
        }

        if self.log.latest_index().map_or(false, |last| last >= next_index) {
            self.replicate_to(reply.peer_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ReplicaLayout;
    use crate::consensus::{commit_stream, state_change_listener, CommitStream};
    use std::net::Ipv4Addr;

    struct TestCore {
        core: StandaloneCore,
        listener: EngineStateListener,
        commit_stream: CommitStream,
        peer_events: mpsc::UnboundedReceiver<PeerEvent>,
    }

    // Peers listen on ports 1.. where nothing answers, so real calls fail fast and every reply
    // that matters is handed to the core by the test.
    fn core() -> TestCore {
        let logger = slog::Logger::root(slog::Discard, slog::o!());
        let (publisher, commit_stream) = commit_stream::create_commit_stream();
        let (notifier, listener) = state_change_listener::new(EngineState::initial());
        let (peer_events_tx, peer_events) = mpsc::unbounded_channel();
        let config = StandaloneEngineConfig {
            replica_id: ReplicaId::new(1),
            layout: ReplicaLayout::new(Ipv4Addr::LOCALHOST, 1, 5),
            rpc_timeout: Duration::from_millis(200),
            heartbeat_interval: Duration::from_secs(60),
        };
        let core = StandaloneCore::new(logger, config, notifier, listener.clone(), publisher, peer_events_tx).unwrap();

        TestCore {
            core,
            listener,
            commit_stream,
            peer_events,
        }
    }

    fn assignment(term: u64, role: Role, leader_hint: Option<u32>) -> RoleAssignment {
        RoleAssignment {
            term: Term::new(term),
            role,
            leader_hint: leader_hint.map(ReplicaId::new),
            members: vec![],
        }
    }

    fn leader_of(term: u64, members: &[u32]) -> RoleAssignment {
        RoleAssignment {
            members: members.iter().copied().map(ReplicaId::new).collect(),
            ..assignment(term, Role::Leader, None)
        }
    }

    fn entry(term: u64, data: &'static [u8]) -> EngineLogEntry {
        EngineLogEntry {
            term: Term::new(term),
            data: Bytes::from_static(data),
        }
    }

    fn append_from(leader: u32, term: u64, previous: Option<(u64, u64)>, commit: u64) -> AppendEntriesInput {
        AppendEntriesInput {
            leader_id: ReplicaId::new(leader),
            term: Term::new(term),
            previous_log_entry: previous.map(|(term, index)| (Term::new(term), Index::new(index))),
            commit_index: if commit == 0 { None } else { Some(Index::new(commit)) },
            entries: vec![],
        }
    }

    fn vote(peer: u32, term: u64, granted: bool) -> PeerEvent {
        PeerEvent::RequestVoteReply(RequestVoteReplyFromPeer {
            peer_id: ReplicaId::new(peer),
            term: Term::new(term),
            result: Ok(granted),
        })
    }

    fn ack(peer: u32, term: u64, previous: Option<u64>, num_entries: usize) -> PeerEvent {
        PeerEvent::AppendEntriesReply(AppendEntriesReplyFromPeer {
            peer_id: ReplicaId::new(peer),
            term: Term::new(term),
            previous_log_entry_index: previous.map(Index::new),
            num_entries,
            result: Ok(()),
        })
    }

    async fn assert_nothing_committed(stream: &mut CommitStream) {
        assert!(tokio::time::timeout(Duration::from_millis(50), stream.recv())
            .await
            .is_err());
    }

    #[test]
    fn follower_rejects_submit_with_hint() {
        let TestCore { mut core, .. } = core();

        match core.handle_submit(Bytes::from_static(b"x")) {
            Err(SubmitError::NotLeader { leader_hint: None }) => {}
            other => panic!("Unexpected {:?}", other),
        }

        core.handle_assign_role(assignment(1, Role::Follower, Some(3))).unwrap();
        match core.handle_submit(Bytes::from_static(b"x")) {
            Err(SubmitError::NotLeader { leader_hint }) => assert_eq!(leader_hint, Some(ReplicaId::new(3))),
            other => panic!("Unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn single_member_leader_commits_in_order() {
        let TestCore {
            mut core,
            listener,
            mut commit_stream,
            ..
        } = core();
        let state = core.handle_assign_role(assignment(2, Role::Leader, None)).unwrap();
        assert!(matches!(state, AssignProgress::Assigned(ref s) if s.is_leader()));
        assert!(listener.current().is_leader());
        assert_eq!(listener.current().leader_hint, Some(ReplicaId::new(1)));

        // Index 1 holds the leadership marker.
        let first = core.handle_submit(Bytes::from_static(b"first")).unwrap();
        let second = core.handle_submit(Bytes::from_static(b"second")).unwrap();
        assert_eq!(first.index, Index::new(2));
        assert_eq!(second.index, Index::new(3));
        assert_eq!(second.term, Term::new(2));

        let committed = commit_stream.recv().await.unwrap();
        assert_eq!(committed.id, first);
        assert_eq!(committed.data, Bytes::from_static(b"first"));
        let committed = commit_stream.recv().await.unwrap();
        assert_eq!(committed.id, second);
    }

    #[test]
    fn terms_never_decrease() {
        let TestCore { mut core, .. } = core();
        core.handle_assign_role(assignment(5, Role::Follower, None)).unwrap();

        assert_eq!(
            core.handle_assign_role(assignment(4, Role::Leader, None)),
            Err(AssignRoleError::StaleTerm {
                current_term: Term::new(5)
            })
        );
    }

    #[test]
    fn one_leader_per_term() {
        let TestCore { mut core, .. } = core();
        core.handle_assign_role(assignment(3, Role::Follower, Some(2))).unwrap();

        // Learning the same leader again is fine.
        core.handle_assign_role(assignment(3, Role::Follower, Some(2))).unwrap();

        assert_eq!(
            core.handle_assign_role(assignment(3, Role::Leader, None)),
            Err(AssignRoleError::ConflictingLeader {
                term: Term::new(3),
                leader: ReplicaId::new(2)
            })
        );
        assert_eq!(
            core.handle_assign_role(assignment(3, Role::Follower, Some(4))),
            Err(AssignRoleError::ConflictingLeader {
                term: Term::new(3),
                leader: ReplicaId::new(2)
            })
        );

        // A new term may have a new leader.
        match core.handle_assign_role(assignment(4, Role::Leader, None)).unwrap() {
            AssignProgress::Assigned(state) => assert!(state.is_leader()),
            other => panic!("Unexpected {:?}", other),
        }
    }

    #[test]
    fn leader_cannot_step_down_within_term() {
        let TestCore { mut core, .. } = core();
        core.handle_assign_role(assignment(1, Role::Leader, None)).unwrap();

        assert!(core.handle_assign_role(assignment(1, Role::Candidate, None)).is_err());
        match core.handle_assign_role(assignment(2, Role::Follower, Some(0))).unwrap() {
            AssignProgress::Assigned(state) => {
                assert!(!state.is_leader());
                assert_eq!(state.leader_hint, Some(ReplicaId::new(0)));
            }
            other => panic!("Unexpected {:?}", other),
        }
    }

    #[test]
    fn follower_cannot_point_at_itself() {
        let TestCore { mut core, .. } = core();

        assert_eq!(
            core.handle_assign_role(assignment(1, Role::Follower, Some(1))),
            Err(AssignRoleError::SelfAsLeaderHint)
        );
    }

    #[test]
    fn members_must_fit_the_layout() {
        let TestCore { mut core, .. } = core();

        assert_eq!(
            core.handle_assign_role(leader_of(1, &[0, 1, 7])),
            Err(AssignRoleError::UnknownMember { id: ReplicaId::new(7) })
        );
        assert_eq!(core.state_listener.current(), EngineState::initial());
    }

    #[tokio::test]
    async fn campaign_needs_majority() {
        let TestCore { mut core, listener, .. } = core();

        assert_eq!(
            core.handle_assign_role(leader_of(1, &[0, 1, 2])),
            Ok(AssignProgress::Campaigning)
        );
        assert_eq!(listener.current().role, Role::Candidate);
        assert!(core.handle_submit(Bytes::from_static(b"x")).is_err());

        core.handle_peer_event(vote(0, 1, true));
        let state = core.take_campaign_outcome().unwrap().unwrap();
        assert!(state.is_leader());
        assert!(listener.current().is_leader());

        // The remaining vote is late and changes nothing.
        core.handle_peer_event(vote(2, 1, false));
        assert!(core.take_campaign_outcome().is_none());
        assert!(listener.current().is_leader());
    }

    #[tokio::test]
    async fn campaign_without_quorum_fails() {
        let TestCore {
            mut core,
            listener,
            mut peer_events,
            ..
        } = core();
        core.handle_assign_role(leader_of(1, &[0, 1, 2])).unwrap();

        // Neither peer is reachable.
        for _ in 0..2 {
            let event = peer_events.recv().await.unwrap();
            core.handle_peer_event(event);
        }

        assert_eq!(
            core.take_campaign_outcome(),
            Some(Err(AssignRoleError::NoQuorum {
                term: Term::new(1),
                granted: 1,
                members: 3
            }))
        );
        assert_eq!(listener.current().role, Role::Candidate);

        // The same term can be tried again.
        assert_eq!(
            core.handle_assign_role(leader_of(1, &[0, 1, 2])),
            Ok(AssignProgress::Campaigning)
        );
    }

    #[tokio::test]
    async fn newer_assignment_supersedes_campaign() {
        let TestCore { mut core, .. } = core();
        core.handle_assign_role(leader_of(1, &[0, 1, 2])).unwrap();

        core.handle_assign_role(assignment(2, Role::Follower, Some(0))).unwrap();
        assert_eq!(core.take_campaign_outcome(), Some(Err(AssignRoleError::Superseded)));

        // Votes for the abandoned campaign are ignored.
        core.handle_peer_event(vote(0, 1, true));
        assert!(core.take_campaign_outcome().is_none());
        assert!(!core.state_listener.current().is_leader());
    }

    #[tokio::test]
    async fn leader_commits_once_majority_holds_entry() {
        let TestCore {
            mut core,
            mut commit_stream,
            ..
        } = core();
        core.handle_assign_role(leader_of(1, &[0, 1, 2])).unwrap();
        core.handle_peer_event(vote(0, 1, true));
        assert!(core.take_campaign_outcome().unwrap().is_ok());

        let id = core.handle_submit(Bytes::from_static(b"a")).unwrap();
        assert_eq!(id.index, Index::new(2));
        assert_nothing_committed(&mut commit_stream).await;

        // Peer 0 takes the marker, then the entry.
        core.handle_peer_event(ack(0, 1, None, 1));
        assert_nothing_committed(&mut commit_stream).await;
        core.handle_peer_event(ack(0, 1, Some(1), 1));

        let committed = commit_stream.recv().await.unwrap();
        assert_eq!(committed.id, id);
        assert_eq!(committed.data, Bytes::from_static(b"a"));
    }

    #[tokio::test]
    async fn stale_reply_steps_leader_down() {
        let TestCore { mut core, listener, .. } = core();
        core.handle_assign_role(leader_of(1, &[0, 1, 2])).unwrap();
        core.handle_peer_event(vote(2, 1, true));
        assert!(listener.current().is_leader());

        core.handle_peer_event(PeerEvent::AppendEntriesReply(AppendEntriesReplyFromPeer {
            peer_id: ReplicaId::new(0),
            term: Term::new(1),
            previous_log_entry_index: None,
            num_entries: 1,
            result: Err(PeerReplyError::StaleTerm { new_term: Term::new(4) }),
        }));

        let state = listener.current();
        assert_eq!(state.term, Term::new(4));
        assert_eq!(state.role, Role::Follower);
        assert!(core.handle_submit(Bytes::from_static(b"x")).is_err());
    }

    #[tokio::test]
    async fn follower_applies_committed_entries() {
        let TestCore {
            mut core,
            listener,
            mut commit_stream,
            ..
        } = core();

        let mut input = append_from(0, 2, None, 0);
        input.entries = vec![EngineLogEntry::leadership_marker(Term::new(2)), entry(2, b"a"), entry(2, b"b")];
        core.handle_append_entries(input).unwrap();
        assert_eq!(listener.current().leader_hint, Some(ReplicaId::new(0)));
        assert_eq!(listener.current().term, Term::new(2));
        assert_nothing_committed(&mut commit_stream).await;

        // Heartbeat carrying the leader's commit index.
        core.handle_append_entries(append_from(0, 2, Some((2, 3)), 2)).unwrap();
        let committed = commit_stream.recv().await.unwrap();
        assert_eq!(committed.id.index, Index::new(2));
        assert_eq!(committed.data, Bytes::from_static(b"a"));
        assert_nothing_committed(&mut commit_stream).await;

        // Commit never runs past what this replica holds.
        core.handle_append_entries(append_from(0, 2, Some((2, 3)), 9)).unwrap();
        assert_eq!(commit_stream.recv().await.unwrap().data, Bytes::from_static(b"b"));
    }

    #[test]
    fn follower_replaces_uncommitted_conflicts() {
        let TestCore { mut core, .. } = core();

        let mut input = append_from(0, 1, None, 0);
        input.entries = vec![entry(1, b"a"), entry(1, b"lost")];
        core.handle_append_entries(input).unwrap();

        let mut input = append_from(2, 2, Some((1, 1)), 0);
        input.entries = vec![entry(2, b"b"), entry(2, b"c")];
        core.handle_append_entries(input).unwrap();

        assert_eq!(core.log.latest_entry(), Some((Term::new(2), Index::new(3))));
        assert_eq!(core.log.read(Index::new(2)).unwrap().unwrap(), entry(2, b"b"));
    }

    #[test]
    fn follower_reports_missing_previous_entry() {
        let TestCore { mut core, .. } = core();

        match core.handle_append_entries(append_from(0, 1, Some((1, 4)), 0)) {
            Err(AppendEntriesError::MissingPreviousLogEntry { last_index: None }) => {}
            other => panic!("Unexpected {:?}", other),
        }

        let mut input = append_from(0, 1, None, 0);
        input.entries = vec![entry(1, b"a")];
        core.handle_append_entries(input).unwrap();

        // Same index, different term.
        match core.handle_append_entries(append_from(0, 1, Some((3, 1)), 0)) {
            Err(AppendEntriesError::MissingPreviousLogEntry { last_index }) => {
                assert_eq!(last_index, Some(Index::new(1)))
            }
            other => panic!("Unexpected {:?}", other),
        }
    }

    #[test]
    fn append_entries_term_checks() {
        let TestCore { mut core, .. } = core();
        core.handle_assign_role(assignment(3, Role::Follower, Some(2))).unwrap();

        match core.handle_append_entries(append_from(2, 2, None, 0)) {
            Err(AppendEntriesError::StaleTerm { current_term }) => assert_eq!(current_term, Term::new(3)),
            other => panic!("Unexpected {:?}", other),
        }
        match core.handle_append_entries(append_from(0, 3, None, 0)) {
            Err(AppendEntriesError::ConflictingLeader { leader, .. }) => assert_eq!(leader, ReplicaId::new(2)),
            other => panic!("Unexpected {:?}", other),
        }
        core.handle_append_entries(append_from(2, 3, None, 0)).unwrap();

        // A single-member leader is pushed out by a newer term.
        core.handle_assign_role(assignment(4, Role::Leader, None)).unwrap();
        match core.handle_append_entries(append_from(0, 4, None, 0)) {
            Err(AppendEntriesError::ConflictingLeader { leader, .. }) => assert_eq!(leader, ReplicaId::new(1)),
            other => panic!("Unexpected {:?}", other),
        }
        core.handle_append_entries(append_from(0, 5, Some((4, 1)), 0)).unwrap();
        assert_eq!(core.state_listener.current().leader_hint, Some(ReplicaId::new(0)));
    }

    #[test]
    fn vote_rules() {
        let TestCore { mut core, .. } = core();
        let mut input = append_from(0, 2, None, 0);
        input.entries = vec![entry(1, b"a"), entry(2, b"b")];
        core.handle_append_entries(input).unwrap();

        let request = |candidate: u32, term: u64, last: Option<(u64, u64)>| RequestVoteInput {
            candidate_id: ReplicaId::new(candidate),
            term: Term::new(term),
            last_log_entry: last.map(|(term, index)| (Term::new(term), Index::new(index))),
        };

        assert_eq!(
            core.handle_request_vote(request(3, 1, Some((2, 2)))),
            Err(RequestVoteError::StaleTerm {
                current_term: Term::new(2)
            })
        );
        // Term 2 already has a leader.
        assert!(!core.handle_request_vote(request(3, 2, Some((2, 2)))).unwrap().vote_granted);

        // Behind: older last term, or same term but shorter.
        assert!(!core.handle_request_vote(request(3, 3, Some((1, 5)))).unwrap().vote_granted);
        assert!(!core.handle_request_vote(request(3, 3, Some((2, 1)))).unwrap().vote_granted);
        assert!(!core.handle_request_vote(request(3, 3, None)).unwrap().vote_granted);
        assert_eq!(core.state_listener.current().term, Term::new(3));

        assert!(core.handle_request_vote(request(3, 3, Some((2, 2)))).unwrap().vote_granted);
        // Asking again is fine, a different candidate is not.
        assert!(core.handle_request_vote(request(3, 3, Some((2, 2)))).unwrap().vote_granted);
        assert!(!core.handle_request_vote(request(4, 3, Some((3, 9)))).unwrap().vote_granted);

        // Having voted, this replica can't lead the same term.
        assert_eq!(
            core.handle_assign_role(leader_of(3, &[])),
            Err(AssignRoleError::ConflictingLeader {
                term: Term::new(3),
                leader: ReplicaId::new(3)
            })
        );
    }
}
