//! Scheduler
//!
//! Preemptive Shortest-Job-First scheduler with:
//! - one CPU slot holding at most one process
//! - a ready queue ordered by ascending expected remaining burst
//! - FIFO waiting lists for printers, disks, and optical drives
//!
//! # Scheduling Algorithm
//!
//! 1. Every arrival to the ready queue is preemptive: the CPU occupant's
//!    in-progress slice is collected and the occupant reinserted.
//! 2. The CPU refills from the queue head, the smallest remaining
//!    estimate. The preempted process keeps running only if its key is
//!    still smallest.
//! 3. Burst estimates are exponentially smoothed on every voluntary end
//!    of burst; preemptions only decrement the remaining estimate.
//!
//! The scheduler owns the [`MemoryManager`]: a process may only become
//! ready while it holds memory, and every release cascades into a
//! job-pool promotion attempt.

pub mod device;
pub mod ready;

pub use device::{DeviceClass, DeviceQueues};
pub use ready::ReadyQueue;

use crate::config::{ConfigError, SystemConfig};
use crate::console::OperatorConsole;
use crate::mm::{Admission, MemoryError, MemoryManager};
use crate::pcb::{AccessMode, Pcb, Pid, ProcessView};
use crate::SimResult;
use tracing::{debug, info, warn};

/// Scheduler errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SchedError {
    /// Operation requires a process in the CPU
    #[error("the CPU is idle")]
    CpuIdle,

    /// Command referenced a device the system does not have
    #[error("no {class} with index {index}")]
    UnknownDevice { class: DeviceClass, index: usize },

    /// Interrupt arrived for a device with nothing queued
    #[error("no process waiting on {class} {index}")]
    EmptyDeviceQueue { class: DeviceClass, index: usize },

    /// Command referenced a process not present anywhere in the system
    #[error("no process {0} in the system")]
    UnknownPid(Pid),

    /// Submitted process exceeds the configured maximum size
    #[error("process size {size} exceeds maximum {max}")]
    OversizedProcess { size: u64, max: u64 },
}

/// Rolling accounting across terminated processes
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SchedulerStats {
    /// Processes ever admitted (not the current population)
    pub processes_created: u32,
    /// Processes terminated or killed after holding memory
    pub terminated: u64,
    /// Rolling average total CPU usage of terminated processes (ms)
    pub avg_cpu_usage: f64,
}

/// Single-CPU preemptive SJF scheduler
#[derive(Debug)]
pub struct Scheduler {
    cpu: Option<Pcb>,
    ready: ReadyQueue,
    devices: DeviceQueues,
    memory: MemoryManager,
    alpha: f64,
    initial_burst_estimate: f64,
    stats: SchedulerStats,
}

impl Scheduler {
    /// Build a scheduler from validated system-generation parameters
    pub fn new(config: SystemConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            cpu: None,
            ready: ReadyQueue::new(),
            devices: DeviceQueues::new(&config),
            memory: MemoryManager::new(&config),
            alpha: config.history_parameter,
            initial_burst_estimate: config.initial_burst_estimate,
            stats: SchedulerStats::default(),
        })
    }

    /// Admit a new process of `size` memory units.
    ///
    /// Oversized processes are rejected with no state change. Admitted
    /// processes either enter the ready queue (preemptively) or wait in
    /// the job pool until memory frees up.
    pub fn submit_process(
        &mut self,
        size: u64,
        console: &mut dyn OperatorConsole,
    ) -> SimResult<Pid> {
        let max = self.memory.max_process_size();
        if size > max {
            return Err(SchedError::OversizedProcess { size, max }.into());
        }

        self.stats.processes_created += 1;
        let pid = Pid(self.stats.processes_created);
        let pcb = Pcb::new(pid, self.initial_burst_estimate, size);
        info!("{pid} created (size {size})");

        match self.memory.admit(pcb) {
            Admission::Assigned(pcb) => self.make_ready(pcb, console),
            Admission::Queued(_) => {}
        }
        Ok(pid)
    }

    /// The CPU occupant reports its burst complete and terminates.
    pub fn complete_cpu_burst(&mut self, console: &mut dyn OperatorConsole) -> SimResult<Pid> {
        let mut pcb = self.cpu.take().ok_or(SchedError::CpuIdle)?;
        let pid = pcb.pid;
        info!("{pid} has finished running in the CPU");

        let elapsed = console.burst_elapsed(pid);
        pcb.record_syscall(elapsed, self.alpha);
        self.terminate_accounting(&pcb);

        self.fill_cpu();
        self.promote_waiters(console)?;
        Ok(pid)
    }

    /// The CPU occupant requests I/O on one device.
    ///
    /// Request metadata is collected through the console: filename, start
    /// address (re-requested until it falls within the process's pages),
    /// read/write flag (printers are write-only), file length, and for
    /// disks a cylinder re-requested until within range. The process then
    /// joins the device's FIFO tail and the CPU refills.
    pub fn request_device_io(
        &mut self,
        class: DeviceClass,
        index: usize,
        console: &mut dyn OperatorConsole,
    ) -> SimResult<()> {
        if self.devices.queue(class, index).is_none() {
            return Err(SchedError::UnknownDevice { class, index }.into());
        }
        let mut pcb = self.cpu.take().ok_or(SchedError::CpuIdle)?;
        let pid = pcb.pid;
        info!("{pid} has requested {class} I/O");

        pcb.filename = console.filename(pid);
        pcb.logical_start_address = self.request_start_address(&pcb, console);
        match self.memory.translate(pcb.logical_start_address, pid) {
            Ok(physical) => debug!("{pid} start address translates to {physical:#x}"),
            Err(e) => warn!("{pid} start address does not translate: {e}"),
        }

        pcb.access = match class {
            DeviceClass::Printer => AccessMode::Write,
            _ => console.access_mode(pid),
        };
        pcb.file_length = console.file_length(pid);

        if class == DeviceClass::Disk {
            pcb.cylinder = Some(self.request_cylinder(index, console));
        }

        let elapsed = console.burst_elapsed(pid);
        pcb.record_syscall(elapsed, self.alpha);

        if let Some(queue) = self.devices.queue_mut(class, index) {
            queue.push_back(pcb);
        }
        self.fill_cpu();
        Ok(())
    }

    /// A device signals completion: its queue head returns to the ready
    /// queue under the preemptive insertion rule.
    pub fn complete_device_io(
        &mut self,
        class: DeviceClass,
        index: usize,
        console: &mut dyn OperatorConsole,
    ) -> SimResult<Pid> {
        let queue = self
            .devices
            .queue_mut(class, index)
            .ok_or(SchedError::UnknownDevice { class, index })?;
        let mut pcb = queue
            .pop_front()
            .ok_or(SchedError::EmptyDeviceQueue { class, index })?;

        if class == DeviceClass::Disk {
            pcb.cylinder = None;
        }
        let pid = pcb.pid;
        info!("{pid} finished {class} I/O");
        self.make_ready(pcb, console);
        Ok(pid)
    }

    /// Kill a process wherever it is.
    ///
    /// Search order: CPU, job pool, ready queue, printers, disks, optical
    /// drives. The first match is removed, its accounting finalized, and
    /// its memory released; promotion runs afterwards. No match leaves
    /// state unchanged.
    pub fn kill(&mut self, pid: Pid, console: &mut dyn OperatorConsole) -> SimResult<()> {
        info!("request to kill {pid} received");

        if self.cpu.as_ref().map(|p| p.pid) == Some(pid) {
            return self.complete_cpu_burst(console).map(|_| ());
        }

        if self.memory.is_queued(pid) {
            self.memory.remove_queued(pid);
            info!("{pid} (located in job pool) has been killed");
            // Never ran, holds no memory: nothing to account or release.
            self.promote_waiters(console)?;
            return Ok(());
        }

        if let Some(pcb) = self.ready.remove(pid) {
            info!("{pid} (located in ready queue) has been killed");
            self.terminate_accounting(&pcb);
            self.promote_waiters(console)?;
            return Ok(());
        }

        if let Some((pcb, class, index)) = self.devices.remove_pid(pid) {
            info!("{pid} (located in {class} {index}) has been killed");
            self.terminate_accounting(&pcb);
            self.promote_waiters(console)?;
            return Ok(());
        }

        Err(SchedError::UnknownPid(pid).into())
    }

    /// PID of the CPU occupant, if any
    pub fn cpu(&self) -> Option<ProcessView> {
        self.cpu.as_ref().map(|p| p.view())
    }

    /// Ready-queue contents in SJF order
    pub fn ready_queue(&self) -> Vec<ProcessView> {
        self.ready.iter().map(|p| p.view()).collect()
    }

    /// Waiting list of one device, head first
    pub fn device_queue(&self, class: DeviceClass, index: usize) -> Option<Vec<ProcessView>> {
        self.devices
            .queue(class, index)
            .map(|q| q.iter().map(|p| p.view()).collect())
    }

    /// Number of devices in a class
    pub fn device_count(&self, class: DeviceClass) -> usize {
        self.devices.count(class)
    }

    /// Rolling accounting across terminated processes
    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// The memory manager, for read-only display queries
    pub fn memory(&self) -> &MemoryManager {
        &self.memory
    }

    /// Preemptive ready-queue insertion: the arrival is inserted by key,
    /// the CPU occupant (if any) has its in-progress slice collected and
    /// rejoins the queue, and the CPU refills from the head.
    fn make_ready(&mut self, pcb: Pcb, console: &mut dyn OperatorConsole) {
        debug!("{} arriving to ready queue", pcb.pid);
        self.ready.insert(pcb);

        match self.cpu.take() {
            None => self.fill_cpu(),
            Some(mut occupant) => {
                info!("{} leaves the CPU so the arrival can be handled", occupant.pid);
                let elapsed = console.burst_elapsed(occupant.pid);
                occupant.record_preemption(elapsed);
                self.ready.insert(occupant);
                self.fill_cpu();
            }
        }
    }

    /// Refill an empty CPU from the ready-queue head
    fn fill_cpu(&mut self) {
        if self.cpu.is_some() {
            return;
        }
        match self.ready.pop_shortest() {
            Some(pcb) => {
                info!("{} has been added to the CPU", pcb.pid);
                self.cpu = Some(pcb);
            }
            None => info!("no processes to run; the CPU is idle"),
        }
    }

    /// Promote job-pool waiters while any fit into free memory
    fn promote_waiters(&mut self, console: &mut dyn OperatorConsole) -> Result<(), MemoryError> {
        while self.memory.has_fitting_waiter() {
            let pcb = self.memory.promote_waiter()?;
            self.make_ready(pcb, console);
        }
        Ok(())
    }

    /// Final accounting for a process that held memory: fold its total
    /// CPU usage into the rolling average and release its frames.
    fn terminate_accounting(&mut self, pcb: &Pcb) {
        self.stats.terminated += 1;
        let n = self.stats.terminated as f64;
        self.stats.avg_cpu_usage =
            self.stats.avg_cpu_usage * ((n - 1.0) / n) + pcb.total_cpu_usage / n;
        info!(
            "{}: total CPU usage {} ms, average burst {} ms",
            pcb.pid, pcb.total_cpu_usage, pcb.avg_burst
        );
        self.memory.release(pcb.pid);
    }

    /// Ask for a start address until its page falls within the process
    fn request_start_address(&self, pcb: &Pcb, console: &mut dyn OperatorConsole) -> u32 {
        let pages = pcb.pages_needed(self.memory.page_size()) as u64;
        loop {
            let addr = console.start_address(pcb.pid);
            let page = addr as u64 / self.memory.page_size();
            if page <= pages {
                return addr;
            }
            warn!(
                "{} start address {addr:#x} is beyond a {pages}-page process",
                pcb.pid
            );
        }
    }

    /// Ask for a cylinder until it is within the disk's range
    fn request_cylinder(&self, disk: usize, console: &mut dyn OperatorConsole) -> u32 {
        // Disk index was validated by the caller.
        let cylinders = self.devices.cylinders(disk).unwrap_or(0);
        loop {
            let cylinder = console.cylinder(disk, cylinders);
            if cylinder >= 1 && cylinder <= cylinders {
                return cylinder;
            }
            warn!("attempt to access invalid cylinder {cylinder} on disk {disk}");
        }
    }
}
