//! Ready Queue
//!
//! SJF-ordered multiset of runnable processes, keyed by ascending
//! `expected_burst_remaining`. Equal keys order by insertion sequence,
//! earliest first, so the ordering is deterministic.

use crate::pcb::{Pcb, Pid};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Ordering key: remaining-burst estimate, then arrival sequence
#[derive(Debug, Clone, Copy)]
struct ReadyKey {
    remaining: f64,
    seq: u64,
}

impl PartialEq for ReadyKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ReadyKey {}

impl PartialOrd for ReadyKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ReadyKey {
    fn cmp(&self, other: &Self) -> Ordering {
        // Burst estimates are never NaN; total_cmp gives a total order
        // without an Ord wrapper type.
        self.remaining
            .total_cmp(&other.remaining)
            .then(self.seq.cmp(&other.seq))
    }
}

/// Processes waiting for CPU time, in SJF order
#[derive(Debug, Default)]
pub struct ReadyQueue {
    queue: BTreeMap<ReadyKey, Pcb>,
    next_seq: u64,
}

impl ReadyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a runnable process, keyed by its current remaining estimate
    pub fn insert(&mut self, pcb: Pcb) {
        let key = ReadyKey {
            remaining: pcb.expected_burst_remaining,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.queue.insert(key, pcb);
    }

    /// Remove and return the process with the smallest remaining estimate
    pub fn pop_shortest(&mut self) -> Option<Pcb> {
        let key = *self.queue.keys().next()?;
        self.queue.remove(&key)
    }

    /// Remove and return the process with `pid`, wherever it sits
    pub fn remove(&mut self, pid: Pid) -> Option<Pcb> {
        let key = self
            .queue
            .iter()
            .find(|(_, p)| p.pid == pid)
            .map(|(k, _)| *k)?;
        self.queue.remove(&key)
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.queue.values().any(|p| p.pid == pid)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Queue contents in SJF order
    pub fn iter(&self) -> impl Iterator<Item = &Pcb> {
        self.queue.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pcb::Pid;

    fn pcb_with_remaining(pid: u32, remaining: f64) -> Pcb {
        Pcb::new(Pid(pid), remaining, 10)
    }

    #[test]
    fn test_pops_smallest_remaining() {
        // Entries [5, 2, 8]: refilling the CPU selects the entry with 2.
        let mut queue = ReadyQueue::new();
        queue.insert(pcb_with_remaining(1, 5.0));
        queue.insert(pcb_with_remaining(2, 2.0));
        queue.insert(pcb_with_remaining(3, 8.0));

        assert_eq!(queue.pop_shortest().unwrap().pid, Pid(2));
        assert_eq!(queue.pop_shortest().unwrap().pid, Pid(1));
        assert_eq!(queue.pop_shortest().unwrap().pid, Pid(3));
        assert!(queue.pop_shortest().is_none());
    }

    #[test]
    fn test_equal_keys_earliest_first() {
        let mut queue = ReadyQueue::new();
        queue.insert(pcb_with_remaining(1, 4.0));
        queue.insert(pcb_with_remaining(2, 4.0));
        queue.insert(pcb_with_remaining(3, 4.0));

        let order: Vec<Pid> = std::iter::from_fn(|| queue.pop_shortest())
            .map(|p| p.pid)
            .collect();
        assert_eq!(order, vec![Pid(1), Pid(2), Pid(3)]);
    }

    #[test]
    fn test_remove_by_pid() {
        let mut queue = ReadyQueue::new();
        queue.insert(pcb_with_remaining(1, 5.0));
        queue.insert(pcb_with_remaining(2, 2.0));

        assert!(queue.contains(Pid(1)));
        let removed = queue.remove(Pid(1)).unwrap();
        assert_eq!(removed.pid, Pid(1));
        assert!(!queue.contains(Pid(1)));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_iter_in_sjf_order() {
        let mut queue = ReadyQueue::new();
        queue.insert(pcb_with_remaining(1, 5.0));
        queue.insert(pcb_with_remaining(2, 2.0));
        queue.insert(pcb_with_remaining(3, 8.0));

        let pids: Vec<Pid> = queue.iter().map(|p| p.pid).collect();
        assert_eq!(pids, vec![Pid(2), Pid(1), Pid(3)]);
    }
}
