//! Priority-ordered backlog of not-yet-admitted jobs.

use std::collections::VecDeque;

/// One backlog entry; the job itself lives in the registry's id index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BacklogEntry {
    pub id: u64,
    pub priority: i32,
}

/// Jobs waiting for admission, kept sorted ascending by priority. Entries
/// with equal priority keep their insertion order.
#[derive(Debug, Default)]
pub(crate) struct Backlog {
    entries: VecDeque<BacklogEntry>,
}

impl Backlog {
    /// Insert at the position that preserves ascending, stable ordering.
    pub fn insert(&mut self, id: u64, priority: i32) {
        let position = self
            .entries
            .iter()
            .position(|entry| entry.priority > priority)
            .unwrap_or(self.entries.len());
        self.entries.insert(position, BacklogEntry { id, priority });
    }

    /// Remove and return the highest-priority (lowest value) waiting entry.
    pub fn pop_front(&mut self) -> Option<BacklogEntry> {
        self.entries.pop_front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BacklogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn pops_lowest_priority_first() {
        let mut backlog = Backlog::default();
        backlog.insert(0, 7);
        backlog.insert(1, 3);
        backlog.insert(2, 5);

        assert_eq!(backlog.pop_front().unwrap().id, 1);
        assert_eq!(backlog.pop_front().unwrap().id, 2);
        assert_eq!(backlog.pop_front().unwrap().id, 0);
        assert!(backlog.pop_front().is_none());
    }

    #[test]
    fn equal_priorities_keep_insertion_order() {
        let mut backlog = Backlog::default();
        for id in 0..5 {
            backlog.insert(id, 5);
        }
        backlog.insert(100, 1);

        assert_eq!(backlog.pop_front().unwrap().id, 100);
        for id in 0..5 {
            assert_eq!(backlog.pop_front().unwrap().id, id);
        }
    }

    #[test]
    fn randomized_inserts_pop_in_stable_priority_order() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut backlog = Backlog::default();
        for id in 0..200u64 {
            backlog.insert(id, rng.gen_range(0..10));
        }

        let mut previous: Option<BacklogEntry> = None;
        while let Some(entry) = backlog.pop_front() {
            if let Some(prev) = previous {
                assert!(prev.priority <= entry.priority, "priority order violated");
                if prev.priority == entry.priority {
                    assert!(prev.id < entry.id, "tie-break must keep submission order");
                }
            }
            previous = Some(entry);
        }
    }
}
