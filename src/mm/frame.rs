//! Frame Table
//!
//! Physical memory at page-size granularity: a table mapping each frame to
//! its owner `(pid, page)` pair, plus a FIFO pool of free frames. Frames
//! are handed out in pool order, with no locality or compaction policy.

use crate::pcb::Pid;
use std::collections::VecDeque;

/// One frame-table entry: free, or owned by a (process, page) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEntry {
    Free,
    Owned { pid: Pid, page: u32 },
}

/// Frame table plus free-frame pool
#[derive(Debug)]
pub struct FrameTable {
    /// Indexed by frame number
    entries: Vec<FrameEntry>,
    /// Free frames in allocation order (FIFO)
    free: VecDeque<usize>,
}

impl FrameTable {
    /// Create a table with `total_frames` frames, all free
    pub fn new(total_frames: usize) -> Self {
        Self {
            entries: vec![FrameEntry::Free; total_frames],
            free: (0..total_frames).collect(),
        }
    }

    /// Number of free frames
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Total number of frames
    pub fn total_frames(&self) -> usize {
        self.entries.len()
    }

    /// Assign `pages` frames to `pid`, pages numbered `0..pages`.
    ///
    /// Caller must have checked `free_count() >= pages`; the assignment is
    /// all-or-nothing and frames come off the front of the free pool.
    pub fn allocate(&mut self, pid: Pid, pages: usize) {
        debug_assert!(self.free.len() >= pages);
        for page in 0..pages {
            let frame = match self.free.pop_front() {
                Some(f) => f,
                None => {
                    // Unreachable when the caller holds up its end; restore
                    // nothing since earlier pops already mutated state.
                    tracing::error!("free-frame pool exhausted mid-allocation for {pid}");
                    return;
                }
            };
            self.entries[frame] = FrameEntry::Owned {
                pid,
                page: page as u32,
            };
        }
    }

    /// Free every frame owned by `pid`.
    ///
    /// Scans the full table; freed frames rejoin the pool in scan order,
    /// not in their prior allocation order. A no-op for processes holding
    /// no frames.
    pub fn release(&mut self, pid: Pid) {
        for (frame, entry) in self.entries.iter_mut().enumerate() {
            if matches!(entry, FrameEntry::Owned { pid: owner, .. } if *owner == pid) {
                *entry = FrameEntry::Free;
                self.free.push_back(frame);
            }
        }
    }

    /// Frame number holding `(pid, page)`, if any
    pub fn frame_of(&self, pid: Pid, page: u32) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| matches!(e, FrameEntry::Owned { pid: p, page: g } if *p == pid && *g == page))
    }

    /// Frames owned by `pid`, in frame order
    pub fn page_table(&self, pid: Pid) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| matches!(e, FrameEntry::Owned { pid: p, .. } if *p == pid))
            .map(|(frame, _)| frame)
            .collect()
    }

    /// Frame-table snapshot, indexed by frame number
    pub fn snapshot(&self) -> &[FrameEntry] {
        &self.entries
    }

    /// Free-frame pool contents, in allocation order
    pub fn free_frames(&self) -> Vec<usize> {
        self.free.iter().copied().collect()
    }
}
