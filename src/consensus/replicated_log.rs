use crate::commitlog::{Entry, InMemoryLog, Index, Log};
use crate::consensus::commit_stream::CommitStreamPublisher;
use crate::consensus::{EntryId, Term};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io;

/// EngineLogEntry is encoded as:
/// | 8 bytes | variable length |
/// |  term   |   data          |
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct EngineLogEntry {
    pub(crate) term: Term,
    pub(crate) data: Bytes,
}

impl EngineLogEntry {
    /// A new leader appends one of these so that entries from earlier terms become committable.
    /// Markers carry no data and are never published on the commit stream.
    pub(crate) fn leadership_marker(term: Term) -> Self {
        EngineLogEntry { term, data: Bytes::new() }
    }

    fn is_leadership_marker(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<Vec<u8>> for EngineLogEntry {
    fn from(raw: Vec<u8>) -> Self {
        let mut bytes = Bytes::from(raw);
        let term = Term::new(bytes.get_u64());

        EngineLogEntry { term, data: bytes }
    }
}

impl From<EngineLogEntry> for Vec<u8> {
    fn from(entry: EngineLogEntry) -> Self {
        let mut bytes = BytesMut::with_capacity(8 + entry.data.len());
        bytes.put_u64(entry.term.as_u64());
        bytes.put_slice(&entry.data);

        bytes.to_vec()
    }
}

impl Entry for EngineLogEntry {}

/// ReplicatedLog is the engine's log plus how much of it is committed. Advancing the commit index
/// publishes the newly committed entries, in order, on the commit stream.
pub(crate) struct ReplicatedLog {
    logger: slog::Logger,
    log: InMemoryLog<EngineLogEntry>,
    latest_entry: Option<(Term, Index)>,
    commit_index: Option<Index>,
    commit_publisher: CommitStreamPublisher,
}

impl ReplicatedLog {
    pub(crate) fn new(logger: slog::Logger, commit_publisher: CommitStreamPublisher) -> Result<Self, io::Error> {
        Ok(ReplicatedLog {
            logger,
            log: InMemoryLog::create()?,
            latest_entry: None,
            commit_index: None,
            commit_publisher,
        })
    }

    pub(crate) fn latest_entry(&self) -> Option<(Term, Index)> {
        self.latest_entry
    }

    pub(crate) fn latest_index(&self) -> Option<Index> {
        self.latest_entry.map(|(_, index)| index)
    }

    pub(crate) fn commit_index(&self) -> Option<Index> {
        self.commit_index
    }

    pub(crate) fn read(&self, index: Index) -> Result<Option<EngineLogEntry>, io::Error> {
        self.log.read(index)
    }

    /// Up to `max_entries` consecutive entries starting at `start`.
    pub(crate) fn read_from(&self, start: Index, max_entries: usize) -> Result<Vec<EngineLogEntry>, io::Error> {
        let mut entries = Vec::new();
        let mut index = start;
        while entries.len() < max_entries {
            match self.log.read(index)? {
                Some(entry) => entries.push(entry),
                None => break,
            }
            index = index.plus(1);
        }

        Ok(entries)
    }

    pub(crate) fn append(&mut self, entry: EngineLogEntry) -> Result<Index, io::Error> {
        let term = entry.term;
        let index = self.log.append(entry)?;
        self.latest_entry = Some((term, index));

        Ok(index)
    }

    /// Remove `index` and everything after it. Committed entries can't be removed.
    pub(crate) fn truncate(&mut self, index: Index) -> Result<(), io::Error> {
        if let Some(commit_index) = self.commit_index {
            if index <= commit_index {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!(
                        "Refusing to truncate at {:?}, entries up to {:?} are committed",
                        index, commit_index
                    ),
                ));
            }
        }

        self.log.truncate(index);
        self.latest_entry = match index.checked_minus(1) {
            None => None,
            Some(previous) => self.log.read(previous)?.map(|entry| (entry.term, previous)),
        };

        Ok(())
    }

    /// Move the commit index forward to `new_commit_index` and publish each newly committed entry.
    /// Never moves backwards.
    pub(crate) fn ratchet_fwd_commit_index(&mut self, new_commit_index: Index) -> Result<(), io::Error> {
        let mut next = match self.commit_index {
            Some(commit_index) if commit_index >= new_commit_index => return Ok(()),
            Some(commit_index) => commit_index.plus(1),
            None => Index::start_index(),
        };

        while next <= new_commit_index {
            let entry = self.log.read(next)?.ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("Can't commit missing log entry {:?}", next),
                )
            })?;

            self.commit_index = Some(next);
            if !entry.is_leadership_marker() {
                let id = EntryId {
                    term: entry.term,
                    index: next,
                };
                slog::debug!(self.logger, "Committed entry {:?}", id);
                self.commit_publisher.notify_commit(&self.logger, id, entry.data);
            }
            next = next.plus(1);
        }

        Ok(())
    }

    /// Leader only. A leader may only count replicas for entries of its own term; earlier entries
    /// commit along with them.
    pub(crate) fn ratchet_fwd_commit_index_if_valid(
        &mut self,
        tentative_commit_index: Index,
        current_term: Term,
    ) -> Result<(), io::Error> {
        match self.log.read(tentative_commit_index)? {
            Some(entry) if entry.term == current_term => self.ratchet_fwd_commit_index(tentative_commit_index),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::{create_commit_stream, CommitStream};
    use std::time::Duration;

    fn new_log() -> (ReplicatedLog, CommitStream) {
        let (publisher, stream) = create_commit_stream();
        let log = ReplicatedLog::new(slog::Logger::root(slog::Discard, slog::o!()), publisher).unwrap();
        (log, stream)
    }

    fn entry(term: u64, data: &'static [u8]) -> EngineLogEntry {
        EngineLogEntry {
            term: Term::new(term),
            data: Bytes::from_static(data),
        }
    }

    #[test]
    fn entry_encoding_keeps_term() {
        let raw: Vec<u8> = entry(7, b"payload").into();
        assert_eq!(raw.len(), 8 + 7);
        assert_eq!(EngineLogEntry::from(raw), entry(7, b"payload"));

        let marker: Vec<u8> = EngineLogEntry::leadership_marker(Term::new(3)).into();
        assert!(EngineLogEntry::from(marker).is_leadership_marker());
    }

    #[tokio::test]
    async fn commit_publishes_in_order_and_skips_markers() {
        let (mut log, mut stream) = new_log();
        log.append(EngineLogEntry::leadership_marker(Term::new(1))).unwrap();
        log.append(entry(1, b"a")).unwrap();
        log.append(entry(1, b"b")).unwrap();

        log.ratchet_fwd_commit_index(Index::new(2)).unwrap();
        let committed = stream.recv().await.unwrap();
        assert_eq!(committed.id.index, Index::new(2));
        assert_eq!(committed.data, Bytes::from_static(b"a"));

        // Going backwards publishes nothing.
        log.ratchet_fwd_commit_index(Index::new(1)).unwrap();
        assert_eq!(log.commit_index(), Some(Index::new(2)));

        log.ratchet_fwd_commit_index(Index::new(3)).unwrap();
        assert_eq!(stream.recv().await.unwrap().data, Bytes::from_static(b"b"));
        assert!(tokio::time::timeout(Duration::from_millis(20), stream.recv())
            .await
            .is_err());
    }

    #[test]
    fn committed_entries_are_never_truncated() {
        let (mut log, _stream) = new_log();
        log.append(entry(1, b"a")).unwrap();
        log.append(entry(1, b"b")).unwrap();
        log.append(entry(2, b"c")).unwrap();
        log.ratchet_fwd_commit_index(Index::new(1)).unwrap();

        assert!(log.truncate(Index::new(1)).is_err());

        log.truncate(Index::new(3)).unwrap();
        assert_eq!(log.latest_entry(), Some((Term::new(1), Index::new(2))));

        log.truncate(Index::new(2)).unwrap();
        assert_eq!(log.latest_entry(), Some((Term::new(1), Index::new(1))));
    }

    #[test]
    fn only_current_term_entries_are_counted() {
        let (mut log, _stream) = new_log();
        log.append(entry(1, b"old")).unwrap();
        log.append(entry(2, b"new")).unwrap();

        log.ratchet_fwd_commit_index_if_valid(Index::new(1), Term::new(2)).unwrap();
        assert_eq!(log.commit_index(), None);

        log.ratchet_fwd_commit_index_if_valid(Index::new(2), Term::new(2)).unwrap();
        assert_eq!(log.commit_index(), Some(Index::new(2)));
    }

    #[test]
    fn read_from_is_bounded() {
        let (mut log, _stream) = new_log();
        for _ in 0..5 {
            log.append(entry(1, b"x")).unwrap();
        }

        assert_eq!(log.read_from(Index::new(2), 3).unwrap().len(), 3);
        assert_eq!(log.read_from(Index::new(4), 10).unwrap().len(), 2);
        assert!(log.read_from(Index::new(6), 10).unwrap().is_empty());
    }
}
