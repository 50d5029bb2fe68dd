use crate::commitlog::{Entry, Index, Log};
use std::io;
use std::marker::PhantomData;

// Entries are only held in memory. Durable storage of the log belongs to whichever consensus
// engine is plugged in, not to this crate.
pub struct InMemoryLog<E: Entry> {
    // Stored as bytes rather than `E` so the entry encoding is exercised on every append/read.
    log: Vec<Vec<u8>>,
    _pd: PhantomData<E>,
}

impl<E: Entry> InMemoryLog<E> {
    pub fn create() -> Result<Self, io::Error> {
        Ok(InMemoryLog {
            log: vec![],
            _pd: PhantomData::default(),
        })
    }

    fn vec_index(index: Index) -> usize {
        // Log API states that Index starts from 1.
        (index.as_u64() - 1) as usize
    }
}

impl<E: Entry> Log<E> for InMemoryLog<E> {
    fn append(&mut self, entry: E) -> Result<Index, io::Error> {
        self.log.push(entry.into());

        Ok(Index::new_usize(self.log.len()))
    }

    fn read(&self, index: Index) -> Result<Option<E>, io::Error> {
        let vec_index = Self::vec_index(index);
        let opt_entry = self.log.get(vec_index).cloned().map(E::from);

        Ok(opt_entry)
    }

    fn truncate(&mut self, index: Index) {
        let vec_index = Self::vec_index(index);
        self.log.truncate(vec_index)
    }

    fn next_index(&self) -> Index {
        Index::new_usize(self.log.len() + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct TestEntry(Vec<u8>);

    impl From<Vec<u8>> for TestEntry {
        fn from(bytes: Vec<u8>) -> Self {
            TestEntry(bytes)
        }
    }

    impl From<TestEntry> for Vec<u8> {
        fn from(entry: TestEntry) -> Self {
            entry.0
        }
    }

    impl Entry for TestEntry {}

    #[test]
    fn indexes_start_at_one() {
        let mut log = InMemoryLog::<TestEntry>::create().unwrap();
        assert_eq!(log.next_index(), Index::start_index());

        assert_eq!(log.append(TestEntry(vec![1])).unwrap(), Index::new(1));
        assert_eq!(log.append(TestEntry(vec![2, 2])).unwrap(), Index::new(2));
        assert_eq!(log.next_index(), Index::new(3));

        assert_eq!(log.read(Index::new(2)).unwrap(), Some(TestEntry(vec![2, 2])));
        assert_eq!(log.read(Index::new(3)).unwrap(), None);
    }

    #[test]
    fn truncate_drops_tail() {
        let mut log = InMemoryLog::<TestEntry>::create().unwrap();
        for i in 1..=4u8 {
            log.append(TestEntry(vec![i])).unwrap();
        }

        log.truncate(Index::new(3));
        assert_eq!(log.next_index(), Index::new(3));
        assert_eq!(log.read(Index::new(3)).unwrap(), None);

        // Appends continue where the truncated tail began.
        assert_eq!(log.append(TestEntry(vec![9])).unwrap(), Index::new(3));
        assert_eq!(log.read(Index::new(3)).unwrap(), Some(TestEntry(vec![9])));

        // Truncating past the end is a no-op.
        log.truncate(Index::new(10));
        assert_eq!(log.next_index(), Index::new(4));
    }

    #[test]
    fn index_arithmetic() {
        assert_eq!(Index::new(4).plus(3), Index::new(7));
        assert_eq!(Index::new(4).checked_minus(1), Some(Index::new(3)));
        assert_eq!(Index::new(1).checked_minus(1), None);
        assert_eq!(Index::new(1).checked_minus(5), None);
    }
}
