//! Device Queues
//!
//! Three classes of logical devices (printers, disks, optical drives),
//! each with an independent FIFO waiting list per device. Disks carry a
//! configured cylinder count used to bound operator cylinder requests.
//! No real I/O happens; a queue entry is a process waiting for an
//! operator-issued completion interrupt.

use crate::config::SystemConfig;
use crate::pcb::{Pcb, Pid};
use std::collections::VecDeque;
use std::fmt;

/// Device class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Printer,
    Disk,
    Optical,
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceClass::Printer => write!(f, "printer"),
            DeviceClass::Disk => write!(f, "disk"),
            DeviceClass::Optical => write!(f, "optical drive"),
        }
    }
}

/// One disk: its waiting list plus its cylinder count
#[derive(Debug)]
struct DiskQueue {
    cylinders: u32,
    queue: VecDeque<Pcb>,
}

/// All device waiting lists in the system
#[derive(Debug)]
pub struct DeviceQueues {
    printers: Vec<VecDeque<Pcb>>,
    disks: Vec<DiskQueue>,
    opticals: Vec<VecDeque<Pcb>>,
}

impl DeviceQueues {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            printers: (0..config.printers).map(|_| VecDeque::new()).collect(),
            disks: config
                .disk_cylinders
                .iter()
                .map(|&cylinders| DiskQueue {
                    cylinders,
                    queue: VecDeque::new(),
                })
                .collect(),
            opticals: (0..config.optical_drives).map(|_| VecDeque::new()).collect(),
        }
    }

    /// Number of devices in a class
    pub fn count(&self, class: DeviceClass) -> usize {
        match class {
            DeviceClass::Printer => self.printers.len(),
            DeviceClass::Disk => self.disks.len(),
            DeviceClass::Optical => self.opticals.len(),
        }
    }

    /// Cylinder count of disk `index`, if it exists
    pub fn cylinders(&self, index: usize) -> Option<u32> {
        self.disks.get(index).map(|d| d.cylinders)
    }

    /// The waiting list of one device (0-based index)
    pub fn queue(&self, class: DeviceClass, index: usize) -> Option<&VecDeque<Pcb>> {
        match class {
            DeviceClass::Printer => self.printers.get(index),
            DeviceClass::Disk => self.disks.get(index).map(|d| &d.queue),
            DeviceClass::Optical => self.opticals.get(index),
        }
    }

    pub fn queue_mut(&mut self, class: DeviceClass, index: usize) -> Option<&mut VecDeque<Pcb>> {
        match class {
            DeviceClass::Printer => self.printers.get_mut(index),
            DeviceClass::Disk => self.disks.get_mut(index).map(|d| &mut d.queue),
            DeviceClass::Optical => self.opticals.get_mut(index),
        }
    }

    /// Remove `pid` from whichever waiting list holds it, searching
    /// printers, then disks, then optical drives.
    pub fn remove_pid(&mut self, pid: Pid) -> Option<(Pcb, DeviceClass, usize)> {
        for class in [DeviceClass::Printer, DeviceClass::Disk, DeviceClass::Optical] {
            for index in 0..self.count(class) {
                let Some(queue) = self.queue_mut(class, index) else {
                    continue;
                };
                let Some(pos) = queue.iter().position(|p| p.pid == pid) else {
                    continue;
                };
                if let Some(pcb) = queue.remove(pos) {
                    return Some((pcb, class, index));
                }
            }
        }
        None
    }

    /// Whether `pid` waits in any device queue
    pub fn contains(&self, pid: Pid) -> bool {
        let in_plain = |queues: &[VecDeque<Pcb>]| {
            queues.iter().any(|q| q.iter().any(|p| p.pid == pid))
        };
        in_plain(&self.printers)
            || self.disks.iter().any(|d| d.queue.iter().any(|p| p.pid == pid))
            || in_plain(&self.opticals)
    }
}
