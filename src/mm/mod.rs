//! Memory Manager
//!
//! Paged memory with three cooperating pieces: the frame table and FIFO
//! free-frame pool (`frame`), the descending-size job pool (`jobpool`),
//! and the manager itself, which decides admission, release cascades, and
//! address translation.
//!
//! The manager never calls into the scheduler; the dependency is strictly
//! one-directional.

pub mod frame;
pub mod jobpool;

pub use frame::{FrameEntry, FrameTable};
pub use jobpool::JobPool;

use crate::config::SystemConfig;
use crate::pcb::{Pcb, Pid};
use tracing::{debug, info};

/// Outcome of an admission request
#[derive(Debug)]
pub enum Admission {
    /// Frames were assigned; the process may be scheduled
    Assigned(Pcb),
    /// Not enough free frames; the process waits in the job pool
    Queued(Pid),
}

/// Memory errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MemoryError {
    /// Contract violation: `promote_waiter` called when no waiter fits.
    /// Cannot happen when callers check `has_fitting_waiter` first.
    #[error("no job-pool waiter fits in free memory")]
    NoFittingWaiter,

    /// Contract violation: address translated for a process that holds no
    /// mapping for the referenced page. Cannot happen for a process that
    /// was admitted and not yet released.
    #[error("{pid} holds no frame for page {page}")]
    Unallocated { pid: Pid, page: u32 },
}

/// Paged memory manager
#[derive(Debug)]
pub struct MemoryManager {
    page_size: u64,
    max_process_size: u64,
    frames: FrameTable,
    job_pool: JobPool,
}

impl MemoryManager {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            page_size: config.page_size,
            max_process_size: config.max_process_size,
            frames: FrameTable::new(config.total_frames()),
            job_pool: JobPool::new(),
        }
    }

    /// Page size in memory units
    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Maximum admissible process size
    pub fn max_process_size(&self) -> u64 {
        self.max_process_size
    }

    /// Admit a process: assign frames if they are available, otherwise
    /// queue it in the job pool until memory frees up.
    pub fn admit(&mut self, pcb: Pcb) -> Admission {
        let pages = pcb.pages_needed(self.page_size);
        if self.frames.free_count() < pages {
            let pid = pcb.pid;
            info!("not enough memory for {pid} ({} pages); queued in job pool", pages);
            self.job_pool.insert(pcb);
            return Admission::Queued(pid);
        }

        self.frames.allocate(pcb.pid, pages);
        debug!("{} assigned {} frames", pcb.pid, pages);
        Admission::Assigned(pcb)
    }

    /// Free every frame owned by `pid`. Idempotent.
    pub fn release(&mut self, pid: Pid) {
        info!("freeing memory held by {pid}");
        self.frames.release(pid);
    }

    /// Promote the largest job-pool waiter that fits into free memory.
    ///
    /// Callers must have checked [`Self::has_fitting_waiter`];
    /// `MemoryError::NoFittingWaiter` signals a core bug, not an operator
    /// mistake.
    pub fn promote_waiter(&mut self) -> Result<Pcb, MemoryError> {
        let pcb = self
            .job_pool
            .take_fitting(self.page_size, self.frames.free_count())
            .ok_or(MemoryError::NoFittingWaiter)?;

        let pages = pcb.pages_needed(self.page_size);
        self.frames.allocate(pcb.pid, pages);
        info!("{} promoted from job pool with {} frames", pcb.pid, pages);
        Ok(pcb)
    }

    /// Whether some job-pool waiter's page requirement fits in free memory
    pub fn has_fitting_waiter(&self) -> bool {
        self.job_pool
            .has_fitting(self.page_size, self.frames.free_count())
    }

    /// Whether `pid` is waiting in the job pool
    pub fn is_queued(&self, pid: Pid) -> bool {
        self.job_pool.contains(pid)
    }

    /// Remove `pid` from the job pool (kill handling)
    pub fn remove_queued(&mut self, pid: Pid) -> Option<Pcb> {
        self.job_pool.remove(pid)
    }

    /// Translate a logical address for `pid` into a physical address.
    ///
    /// Address 0 maps to 0 regardless of frame assignment. Otherwise the
    /// physical address is the decimal-digit concatenation of the frame
    /// number and the page offset, not `frame * page_size + offset`. The
    /// encoding is deliberate; do not change it.
    pub fn translate(&self, logical: u32, pid: Pid) -> Result<u64, MemoryError> {
        if logical == 0 {
            return Ok(0);
        }

        let page = (logical as u64 / self.page_size) as u32;
        let offset = logical as u64 % self.page_size;
        let frame = self
            .frames
            .frame_of(pid, page)
            .ok_or(MemoryError::Unallocated { pid, page })? as u64;

        Ok(concat_decimal(frame, offset))
    }

    /// Frame-table snapshot, indexed by frame number
    pub fn frame_table(&self) -> &[FrameEntry] {
        self.frames.snapshot()
    }

    /// Free-frame pool contents, in allocation order
    pub fn free_frames(&self) -> Vec<usize> {
        self.frames.free_frames()
    }

    /// Number of free frames
    pub fn free_count(&self) -> usize {
        self.frames.free_count()
    }

    /// Total frames in the system
    pub fn total_frames(&self) -> usize {
        self.frames.total_frames()
    }

    /// Job-pool contents, descending by size
    pub fn job_pool(&self) -> Vec<(Pid, u64)> {
        self.job_pool.entries()
    }

    /// Frames owned by `pid`, in frame order
    pub fn page_table(&self, pid: Pid) -> Vec<usize> {
        self.frames.page_table(pid)
    }
}

/// Decimal-digit concatenation: `concat_decimal(12, 34) == 1234`
fn concat_decimal(frame: u64, offset: u64) -> u64 {
    let mut shift = 10;
    while shift <= offset {
        shift *= 10;
    }
    frame * shift + offset
}
