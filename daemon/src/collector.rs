//! Instant resource sampler (reads /proc on Linux)

mod linux;

pub use linux::LinuxSampler;

use crate::error::SamplerError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Bytes (received, sent) per network interface, counted since boot or
/// since the interface was last reset.
pub type InterfaceInstantStats = HashMap<String, (u64, u64)>;

/// Work and idle CPU time of one logical CPU, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuJiffies {
    /// user + nice + system + irq + softirq + steal + guest
    pub work: f64,
    /// idle + iowait
    pub idle: f64,
}

impl CpuJiffies {
    pub fn total(&self) -> f64 {
        self.work + self.idle
    }
}

/// One entry per logical CPU, preceded by the cross-CPU mean at index 0.
pub type JiffiesList = Vec<CpuJiffies>;

/// CPU work (seconds) and memory share (percent) of a process, optionally
/// including its descendants' memory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessStats {
    pub work: f64,
    pub memory: f64,
}

/// Outcome of a best-effort lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    Missing,
}

impl<T> Lookup<T> {
    pub fn is_missing(&self) -> bool {
        matches!(self, Lookup::Missing)
    }

    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::Missing => None,
        }
    }
}

impl<T: Default> Lookup<T> {
    /// Collapse a miss into the zero measurement.
    pub fn or_zero(self) -> T {
        self.found().unwrap_or_default()
    }
}

pub trait InstantSampler: Send + Sync {
    /// Byte counters of every interface known to the host right now.
    fn sample_network_io(&self) -> InterfaceInstantStats;

    /// Per-CPU work/idle split with the cross-CPU mean prepended.
    fn sample_cpu_jiffies(&self) -> Result<JiffiesList, SamplerError>;

    /// Host memory in use, as a percentage of physical memory.
    fn sample_memory(&self) -> Result<f64, SamplerError>;

    /// Tagged process lookup: `Missing` when the pid is invalid or the
    /// process is gone.
    fn lookup_process(&self, pid: u32, include_children: bool) -> Lookup<ProcessStats>;

    /// Same as [`InstantSampler::lookup_process`] but a miss reads as `(0, 0)`.
    fn sample_process(&self, pid: u32, include_children: bool) -> ProcessStats {
        self.lookup_process(pid, include_children).or_zero()
    }
}
