//! Job Pool
//!
//! Holding area for processes admitted but not yet given memory, ordered by
//! descending size so bigger jobs get priority when capacity frees up.
//! Equal sizes order by arrival, oldest first.

use crate::pcb::{Pcb, Pid};
use std::collections::BTreeMap;

/// Ordering key: descending size, then ascending arrival sequence.
///
/// Size is stored complemented so the natural BTreeMap order walks
/// largest-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct PoolKey {
    size_desc: u64,
    seq: u64,
}

impl PoolKey {
    fn new(size: u64, seq: u64) -> Self {
        Self {
            size_desc: u64::MAX - size,
            seq,
        }
    }
}

/// Admission queue of memory-starved processes
#[derive(Debug, Default)]
pub struct JobPool {
    jobs: BTreeMap<PoolKey, Pcb>,
    next_seq: u64,
}

impl JobPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a process to wait for memory
    pub fn insert(&mut self, pcb: Pcb) {
        let key = PoolKey::new(pcb.size, self.next_seq);
        self.next_seq += 1;
        self.jobs.insert(key, pcb);
    }

    /// Whether `pid` is waiting here
    pub fn contains(&self, pid: Pid) -> bool {
        self.jobs.values().any(|p| p.pid == pid)
    }

    /// Remove and return the waiter with `pid`, if present
    pub fn remove(&mut self, pid: Pid) -> Option<Pcb> {
        let key = self
            .jobs
            .iter()
            .find(|(_, p)| p.pid == pid)
            .map(|(k, _)| *k)?;
        self.jobs.remove(&key)
    }

    /// Remove and return the largest waiter needing at most `free_frames`
    /// pages, scanning largest-first
    pub fn take_fitting(&mut self, page_size: u64, free_frames: usize) -> Option<Pcb> {
        let key = self
            .jobs
            .iter()
            .find(|(_, p)| p.pages_needed(page_size) <= free_frames)
            .map(|(k, _)| *k)?;
        self.jobs.remove(&key)
    }

    /// Whether any waiter's page requirement fits in `free_frames`
    pub fn has_fitting(&self, page_size: u64, free_frames: usize) -> bool {
        self.jobs
            .values()
            .any(|p| p.pages_needed(page_size) <= free_frames)
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Waiters in pool order (descending size)
    pub fn entries(&self) -> Vec<(Pid, u64)> {
        self.jobs.values().map(|p| (p.pid, p.size)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pcb(pid: u32, size: u64) -> Pcb {
        Pcb::new(Pid(pid), 10.0, size)
    }

    #[test]
    fn test_ordered_by_descending_size() {
        let mut pool = JobPool::new();
        pool.insert(pcb(1, 20));
        pool.insert(pcb(2, 50));
        pool.insert(pcb(3, 30));

        assert_eq!(
            pool.entries(),
            vec![(Pid(2), 50), (Pid(3), 30), (Pid(1), 20)]
        );
    }

    #[test]
    fn test_equal_sizes_oldest_first() {
        let mut pool = JobPool::new();
        pool.insert(pcb(1, 40));
        pool.insert(pcb(2, 40));

        assert_eq!(pool.entries(), vec![(Pid(1), 40), (Pid(2), 40)]);
    }

    #[test]
    fn test_take_fitting_prefers_largest() {
        // Page size 16: P1 needs 4 pages, P2 needs 2, P3 needs 1.
        let mut pool = JobPool::new();
        pool.insert(pcb(1, 64));
        pool.insert(pcb(2, 32));
        pool.insert(pcb(3, 16));

        assert!(pool.has_fitting(16, 2));
        let taken = pool.take_fitting(16, 2).unwrap();
        assert_eq!(taken.pid, Pid(2));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_take_fitting_none_fits() {
        let mut pool = JobPool::new();
        pool.insert(pcb(1, 64));

        assert!(!pool.has_fitting(16, 3));
        assert!(pool.take_fitting(16, 3).is_none());
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_remove_by_pid() {
        let mut pool = JobPool::new();
        pool.insert(pcb(1, 20));
        pool.insert(pcb(2, 30));

        assert!(pool.contains(Pid(1)));
        let removed = pool.remove(Pid(1)).unwrap();
        assert_eq!(removed.pid, Pid(1));
        assert!(!pool.contains(Pid(1)));
        assert!(pool.remove(Pid(1)).is_none());
    }
}
