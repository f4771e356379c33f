//! Operator Console Boundary
//!
//! All textual I/O lives outside the core. Whenever an operation needs an
//! operator-supplied fact (how long a burst ran, which file a process
//! wants, which cylinder) the core asks through [`OperatorConsole`]. The
//! console is responsible for type validation; the core re-requests when a
//! value violates a domain constraint (out-of-range cylinder, start
//! address beyond the process's pages).

use crate::pcb::{AccessMode, Pid};
use std::collections::VecDeque;

/// Source of operator-supplied values
pub trait OperatorConsole {
    /// How long the process just used the CPU, in milliseconds
    fn burst_elapsed(&mut self, pid: Pid) -> f64;

    /// Filename for the process's device request
    fn filename(&mut self, pid: Pid) -> String;

    /// File length for the process's device request
    fn file_length(&mut self, pid: Pid) -> u32;

    /// Read or write flag for the request (not asked for printers)
    fn access_mode(&mut self, pid: Pid) -> AccessMode;

    /// Logical start address for the request (operator enters hex)
    fn start_address(&mut self, pid: Pid) -> u32;

    /// Cylinder to access on `disk` (0-based), which has `cylinders` cylinders
    fn cylinder(&mut self, disk: usize, cylinders: u32) -> u32;
}

/// Deterministic console fed from pre-scripted value queues.
///
/// Used by tests and scripted replays: each request pops the next queued
/// value. Popping an empty queue panics, making an unexpected core request
/// an immediate test failure.
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    bursts: VecDeque<f64>,
    filenames: VecDeque<String>,
    file_lengths: VecDeque<u32>,
    access_modes: VecDeque<AccessMode>,
    start_addresses: VecDeque<u32>,
    cylinders: VecDeque<u32>,
}

impl ScriptedConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_burst(&mut self, ms: f64) -> &mut Self {
        self.bursts.push_back(ms);
        self
    }

    pub fn push_filename(&mut self, name: &str) -> &mut Self {
        self.filenames.push_back(name.to_string());
        self
    }

    pub fn push_file_length(&mut self, len: u32) -> &mut Self {
        self.file_lengths.push_back(len);
        self
    }

    pub fn push_access_mode(&mut self, mode: AccessMode) -> &mut Self {
        self.access_modes.push_back(mode);
        self
    }

    pub fn push_start_address(&mut self, addr: u32) -> &mut Self {
        self.start_addresses.push_back(addr);
        self
    }

    pub fn push_cylinder(&mut self, cylinder: u32) -> &mut Self {
        self.cylinders.push_back(cylinder);
        self
    }
}

impl OperatorConsole for ScriptedConsole {
    fn burst_elapsed(&mut self, pid: Pid) -> f64 {
        self.bursts
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted burst for {pid}"))
    }

    fn filename(&mut self, pid: Pid) -> String {
        self.filenames
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted filename for {pid}"))
    }

    fn file_length(&mut self, pid: Pid) -> u32 {
        self.file_lengths
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted file length for {pid}"))
    }

    fn access_mode(&mut self, pid: Pid) -> AccessMode {
        self.access_modes
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted access mode for {pid}"))
    }

    fn start_address(&mut self, pid: Pid) -> u32 {
        self.start_addresses
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted start address for {pid}"))
    }

    fn cylinder(&mut self, disk: usize, _cylinders: u32) -> u32 {
        self.cylinders
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted cylinder for disk {disk}"))
    }
}
