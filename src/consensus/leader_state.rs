use crate::cluster::ReplicaId;
use crate::commitlog::Index;
use std::collections::HashMap;

/// LeaderState is what a leader tracks about each of its followers for one term.
pub(crate) struct LeaderState {
    peers: HashMap<ReplicaId, PeerState>,
}

impl LeaderState {
    /// Every peer starts out being sent the entry at `first_index_to_send`.
    pub(crate) fn new(peer_ids: impl Iterator<Item = ReplicaId>, first_index_to_send: Index) -> Self {
        LeaderState {
            peers: peer_ids
                .map(|peer_id| (peer_id, PeerState::new(first_index_to_send)))
                .collect(),
        }
    }

    pub(crate) fn peer_state_mut(&mut self, peer_id: &ReplicaId) -> Option<&mut PeerState> {
        self.peers.get_mut(peer_id)
    }

    pub(crate) fn peers_matched(&self) -> Vec<Option<Index>> {
        self.peers.values().map(|peer_state| peer_state.matched).collect()
    }
}

pub(crate) struct PeerState {
    // Index of the next log entry to send to the peer.
    next: Index,
    // Highest index known to be replicated on the peer.
    matched: Option<Index>,
    // One outstanding AppendEntries per peer; no pipelining.
    in_flight: bool,
}

impl PeerState {
    fn new(next: Index) -> Self {
        PeerState {
            next,
            matched: None,
            in_flight: false,
        }
    }

    pub(crate) fn next_and_previous_log_index(&self) -> (Index, Option<Index>) {
        (self.next, self.next.checked_minus(1))
    }

    pub(crate) fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub(crate) fn set_in_flight(&mut self, in_flight: bool) {
        self.in_flight = in_flight;
    }

    /// The peer's log now matches ours up to `previous_log_entry + num_entries`.
    pub(crate) fn record_success(&mut self, previous_log_entry: Option<Index>, num_entries: usize) {
        let new_matched = match (previous_log_entry, num_entries) {
            (None, 0) => return,
            (None, n) => Index::new_usize(n),
            (Some(previous), n) => previous.plus(n as u64),
        };

        if self.matched.map_or(true, |matched| new_matched > matched) {
            self.matched = Some(new_matched);
        }
        if new_matched.plus(1) > self.next {
            self.next = new_matched.plus(1);
        }
    }

    /// The peer is missing our previous entry. Back up, skipping straight past its log's end when
    /// it told us where that is. A peer that restarted with an empty log lands here after earlier
    /// successes, so `matched` is forgotten.
    pub(crate) fn rewind(&mut self, peer_last_index: Option<Index>) {
        let backed_up = self.next.checked_minus(1).unwrap_or_else(Index::start_index);
        let past_peer_log = peer_last_index.map_or_else(Index::start_index, |last| last.plus(1));

        self.next = std::cmp::min(backed_up, past_peer_log);
        self.matched = None;
    }
}

/// Highest index replicated on a majority of the cluster, counting the leader (whose log is always
/// the longest). `peers_matched` excludes the leader.
pub(crate) fn cluster_commit_index(mut peers_matched: Vec<Option<Index>>) -> Option<Index> {
    if peers_matched.is_empty() {
        return None;
    }

    peers_matched.sort_by_key(|matched| matched.map_or(0, |m| m.as_u64()));

    // Majority of (peers + 1) is (peers + 1) / 2 + 1. The leader is one of them, so that many
    // minus one peers must have matched. Counting from the right, that lands on peers / 2.
    let quorum_idx = peers_matched.len() / 2;

    peers_matched.remove(quorum_idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opt_index(v: u64) -> Option<Index> {
        if v == 0 {
            None
        } else {
            Some(Index::new(v))
        }
    }

    #[test]
    fn commit_index_needs_majority() {
        fn run(expected: u64, matches: Vec<u64>) {
            let matches = matches.into_iter().map(opt_index).collect();
            assert_eq!(opt_index(expected), cluster_commit_index(matches));
        }

        // Leader alone.
        run(0, vec![]);

        // 2-cluster: the only peer must have it.
        run(0, vec![0]);
        run(4, vec![4]);

        // 3-cluster
        run(0, vec![0, 0]);
        run(9, vec![0, 9]);
        run(9, vec![8, 9]);

        // 4-cluster
        run(0, vec![0, 0, 9]);
        run(8, vec![0, 8, 9]);

        // 5-cluster
        run(0, vec![0, 0, 0, 9]);
        run(8, vec![0, 0, 8, 9]);
        run(8, vec![6, 7, 8, 9]);

        // Ordering doesn't matter
        run(9, vec![9, 8]);
        run(8, vec![6, 0, 8, 9]);
    }

    #[test]
    fn success_moves_peer_forward() {
        let mut peer = PeerState::new(Index::new(3));
        assert_eq!(peer.next_and_previous_log_index(), (Index::new(3), Some(Index::new(2))));

        // Heartbeat against a matching log.
        peer.record_success(Some(Index::new(2)), 0);
        assert_eq!(peer.matched, Some(Index::new(2)));
        assert_eq!(peer.next, Index::new(3));

        peer.record_success(Some(Index::new(2)), 4);
        assert_eq!(peer.matched, Some(Index::new(6)));
        assert_eq!(peer.next, Index::new(7));

        // A late, smaller success doesn't move anything back.
        peer.record_success(Some(Index::new(2)), 1);
        assert_eq!(peer.matched, Some(Index::new(6)));
        assert_eq!(peer.next, Index::new(7));
    }

    #[test]
    fn rewind_jumps_to_peer_log_end() {
        let mut peer = PeerState::new(Index::new(10));
        peer.record_success(Some(Index::new(9)), 0);

        // Peer restarted with an empty log.
        peer.rewind(None);
        assert_eq!(peer.next_and_previous_log_index(), (Index::new(1), None));
        assert_eq!(peer.matched, None);

        let mut peer = PeerState::new(Index::new(10));
        peer.rewind(Some(Index::new(4)));
        assert_eq!(peer.next, Index::new(5));

        // Peer claims a longer log than ours: back up one at a time.
        let mut peer = PeerState::new(Index::new(10));
        peer.rewind(Some(Index::new(20)));
        assert_eq!(peer.next, Index::new(9));

        // Never below the start of the log.
        let mut peer = PeerState::new(Index::new(1));
        peer.rewind(None);
        assert_eq!(peer.next, Index::new(1));
    }
}
