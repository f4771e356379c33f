//! μSim: Single-CPU Kernel Simulator for μOS
//!
//! μSim models the two tightly-coupled subsystems of a single-CPU kernel:
//! a preemptive Shortest-Job-First CPU scheduler and a paged memory manager
//! that backs every scheduled process with page-to-frame mappings. A process
//! may only run if it holds memory; freeing memory cascades into scheduling
//! decisions through job-pool promotion.
//!
//! Execution is strictly synchronous: the operator issues one command at a
//! time and every transition runs to completion before the next command is
//! accepted. "CPU time" is an operator-supplied fact, not a measurement;
//! the [`console::OperatorConsole`] trait is the seam through which those
//! facts arrive.
//!
//! ## Modules
//! - `config` - System-generation parameters and validation
//! - `pcb` - Process control blocks and burst accounting
//! - `mm` - Frame table, free-frame pool, job pool, address translation
//! - `sched` - CPU slot, ready queue, device queues, process lifecycle
//! - `console` - Operator console boundary

pub mod config;
pub mod console;
pub mod mm;
pub mod pcb;
pub mod sched;

pub use config::SystemConfig;
pub use console::{OperatorConsole, ScriptedConsole};
pub use mm::MemoryManager;
pub use pcb::{AccessMode, Pcb, Pid, ProcessView};
pub use sched::{DeviceClass, Scheduler};

/// Result type for μSim operations
pub type SimResult<T> = Result<T, SimError>;

/// Errors that can occur in the simulator
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Memory error: {0}")]
    Memory(#[from] mm::MemoryError),

    #[error("Scheduler error: {0}")]
    Sched(#[from] sched::SchedError),
}
