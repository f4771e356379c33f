//! Process Control Blocks
//!
//! A [`Pcb`] carries one process's identity, its current device-request
//! attributes, and its burst accounting. The accounting drives SJF
//! scheduling: `expected_burst_remaining` is the live scheduling key,
//! revised by exponential smoothing on every system call and decremented
//! incrementally on every preemption.

use std::fmt;

/// Process ID. Assigned monotonically at admission, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pid(pub u32);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Read/write flag of the current device request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// No request recorded yet
    Unset,
    Read,
    Write,
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessMode::Unset => write!(f, "-"),
            AccessMode::Read => write!(f, "r"),
            AccessMode::Write => write!(f, "w"),
        }
    }
}

/// Process control block
#[derive(Debug, Clone)]
pub struct Pcb {
    /// Process ID
    pub pid: Pid,
    /// Process size in memory units
    pub size: u64,
    /// Logical start address, operator-supplied on each I/O request
    pub logical_start_address: u32,
    /// Filename of the current device request ("--" when unset)
    pub filename: String,
    /// File length of the current device request
    pub file_length: u32,
    /// Read/write flag of the current device request
    pub access: AccessMode,
    /// Requested disk cylinder; `Some` only while the last request was disk I/O
    pub cylinder: Option<u32>,
    /// Total CPU time consumed over the process lifetime
    pub total_cpu_usage: f64,
    /// CPU time consumed in the current burst, across preempted slices
    burst_in_progress: f64,
    /// Running average burst length
    pub avg_burst: f64,
    /// Number of completed bursts
    pub bursts: u32,
    /// Exponentially-smoothed estimate of the next full burst
    pub expected_burst_total: f64,
    /// Estimated time left in the next/current burst; the SJF key
    pub expected_burst_remaining: f64,
}

impl Pcb {
    /// Create a PCB for a newly admitted process
    pub fn new(pid: Pid, initial_burst_estimate: f64, size: u64) -> Self {
        Self {
            pid,
            size,
            logical_start_address: 0,
            filename: String::from("--"),
            file_length: 0,
            access: AccessMode::Unset,
            cylinder: None,
            total_cpu_usage: 0.0,
            burst_in_progress: 0.0,
            avg_burst: 0.0,
            bursts: 0,
            expected_burst_total: initial_burst_estimate,
            expected_burst_remaining: initial_burst_estimate,
        }
    }

    /// Account for a voluntary end of burst (I/O request or completion).
    ///
    /// The smoothing input is the whole burst, including slices consumed
    /// before preemptions. `expected_burst_remaining` resets to the new
    /// total for the next scheduling round.
    pub fn record_syscall(&mut self, elapsed: f64, alpha: f64) {
        self.bursts += 1;
        self.burst_in_progress += elapsed;
        self.total_cpu_usage += self.burst_in_progress;
        self.avg_burst = self.total_cpu_usage / self.bursts as f64;
        self.expected_burst_total =
            (1.0 - alpha) * self.expected_burst_total + alpha * self.burst_in_progress;
        self.expected_burst_remaining = self.expected_burst_total;
        self.burst_in_progress = 0.0;
    }

    /// Account for a preemption: the process was forced out mid-burst.
    ///
    /// Only the remaining estimate is decremented; the long-run total is
    /// not revised because the process did not voluntarily end its burst.
    pub fn record_preemption(&mut self, elapsed: f64) {
        self.burst_in_progress += elapsed;
        self.expected_burst_remaining -= elapsed;
    }

    /// Pages this process needs at the given page size
    pub fn pages_needed(&self, page_size: u64) -> usize {
        (self.size.div_ceil(page_size)) as usize
    }

    /// Read-only display summary
    pub fn view(&self) -> ProcessView {
        ProcessView {
            pid: self.pid,
            size: self.size,
            logical_start_address: self.logical_start_address,
            filename: self.filename.clone(),
            file_length: self.file_length,
            access: self.access,
            cylinder: self.cylinder,
            total_cpu_usage: self.total_cpu_usage,
            avg_burst: self.avg_burst,
            expected_burst_remaining: self.expected_burst_remaining,
        }
    }
}

/// Display snapshot of one process
#[derive(Debug, Clone)]
pub struct ProcessView {
    pub pid: Pid,
    pub size: u64,
    pub logical_start_address: u32,
    pub filename: String,
    pub file_length: u32,
    pub access: AccessMode,
    pub cylinder: Option<u32>,
    pub total_cpu_usage: f64,
    pub avg_burst: f64,
    pub expected_burst_remaining: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_pcb_defaults() {
        let pcb = Pcb::new(Pid(1), 10.0, 40);
        assert_eq!(pcb.pid, Pid(1));
        assert_eq!(pcb.size, 40);
        assert_eq!(pcb.filename, "--");
        assert_eq!(pcb.access, AccessMode::Unset);
        assert_eq!(pcb.cylinder, None);
        assert_eq!(pcb.expected_burst_total, 10.0);
        assert_eq!(pcb.expected_burst_remaining, 10.0);
        assert_eq!(pcb.bursts, 0);
    }

    #[test]
    fn test_syscall_smoothing() {
        // α=0.5, initial estimate 10, actual burst 6 ⇒ 0.5*10 + 0.5*6 = 8
        let mut pcb = Pcb::new(Pid(1), 10.0, 40);
        pcb.record_syscall(6.0, 0.5);

        assert_eq!(pcb.expected_burst_total, 8.0);
        assert_eq!(pcb.expected_burst_remaining, 8.0);
        assert_eq!(pcb.total_cpu_usage, 6.0);
        assert_eq!(pcb.avg_burst, 6.0);
        assert_eq!(pcb.bursts, 1);
    }

    #[test]
    fn test_preemption_decrements_remaining_only() {
        let mut pcb = Pcb::new(Pid(1), 10.0, 40);
        pcb.record_preemption(3.0);

        assert_eq!(pcb.expected_burst_remaining, 7.0);
        assert_eq!(pcb.expected_burst_total, 10.0);
        assert_eq!(pcb.total_cpu_usage, 0.0);
        assert_eq!(pcb.bursts, 0);
    }

    #[test]
    fn test_syscall_after_preemption_uses_whole_burst() {
        // 3 ms before preemption plus 5 ms after: the smoothing input is 8 ms.
        let mut pcb = Pcb::new(Pid(1), 10.0, 40);
        pcb.record_preemption(3.0);
        pcb.record_syscall(5.0, 0.5);

        assert_eq!(pcb.total_cpu_usage, 8.0);
        assert_eq!(pcb.expected_burst_total, 9.0); // 0.5*10 + 0.5*8
        assert_eq!(pcb.expected_burst_remaining, 9.0);
    }

    #[test]
    fn test_pages_needed_rounds_up() {
        let pcb = Pcb::new(Pid(1), 10.0, 40);
        assert_eq!(pcb.pages_needed(16), 3);

        let exact = Pcb::new(Pid(2), 10.0, 32);
        assert_eq!(exact.pages_needed(16), 2);

        let empty = Pcb::new(Pid(3), 10.0, 0);
        assert_eq!(empty.pages_needed(16), 0);
    }

    #[test]
    fn test_pid_display() {
        assert_eq!(Pid(7).to_string(), "P7");
    }
}
