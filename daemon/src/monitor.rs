//! Periodic statistics compiler
//!
//! Turns successive instant samples into per-metric histories and digests
//! them once per tick.

use crate::collector::{InstantSampler, InterfaceInstantStats, JiffiesList, Lookup, ProcessStats};
use crate::config::Config;
use crate::history::History;
use crate::stats::{self, InstantRate, StatDigest};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Metric {
    /// Busy percentage; 0 is the whole machine, N the Nth logical CPU.
    Cpu(usize),
    Memory,
    /// kB/s received on an interface.
    NetRecv(String),
    /// kB/s sent on an interface.
    NetSent(String),
    /// Percent of one core used by a process.
    ProcessCpu(u32),
    /// Memory share of a process (and its children when configured).
    ProcessMemory(u32),
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Cpu(0) => write!(f, "cpu"),
            Metric::Cpu(n) => write!(f, "cpu{}", n - 1),
            Metric::Memory => write!(f, "mem"),
            Metric::NetRecv(intf) => write!(f, "{}.recv", intf),
            Metric::NetSent(intf) => write!(f, "{}.sent", intf),
            Metric::ProcessCpu(pid) => write!(f, "pid{}.cpu", pid),
            Metric::ProcessMemory(pid) => write!(f, "pid{}.mem", pid),
        }
    }
}

/// Digests produced by one tick.
#[derive(Debug, Default)]
pub struct TickReport {
    pub digests: Vec<(Metric, StatDigest)>,
    /// Watched processes that could not be sampled this tick.
    pub missing: Vec<u32>,
}

impl TickReport {
    pub fn get(&self, metric: &Metric) -> Option<&StatDigest> {
        self.digests.iter().find(|(m, _)| m == metric).map(|(_, d)| d)
    }

    /// Digests whose instant rate is above `threshold` percent.
    pub fn trending(&self, threshold: f64) -> impl Iterator<Item = &(Metric, StatDigest)> {
        self.digests.iter().filter(move |(_, digest)| match digest.rate {
            Some(InstantRate::Unbounded) => true,
            Some(InstantRate::Finite(rate)) => rate > threshold,
            None => false,
        })
    }

    pub fn log(&self, rate_warning_percent: f64) {
        for (metric, digest) in &self.digests {
            let body = serde_json::to_string(digest).unwrap_or_default();
            debug!(metric = %metric, digest = %body, "digest");
        }
        for (metric, digest) in self.trending(rate_warning_percent) {
            warn!(
                metric = %metric,
                mean = digest.mean,
                rate = digest.rate.map(|r| r.as_f64()).unwrap_or_default(),
                slope = digest.slope().unwrap_or_default(),
                "Metric rising quickly"
            );
        }
        for pid in &self.missing {
            info!("Watched process {} is not running", pid);
        }
    }
}

pub struct Monitor {
    depth: usize,
    pids: Vec<u32>,
    include_children: bool,
    histories: BTreeMap<Metric, History>,
    last_cpu: Option<JiffiesList>,
    last_io: Option<InterfaceInstantStats>,
    last_processes: HashMap<u32, ProcessStats>,
}

impl Monitor {
    pub fn new(config: &Config) -> Self {
        Self::with_pids(
            config.general.history_depth,
            config.process.pids.clone(),
            config.process.include_children,
        )
    }

    pub fn with_pids(depth: usize, pids: Vec<u32>, include_children: bool) -> Self {
        Self {
            depth,
            pids,
            include_children,
            histories: BTreeMap::new(),
            last_cpu: None,
            last_io: None,
            last_processes: HashMap::new(),
        }
    }

    pub fn history(&self, metric: &Metric) -> Option<&History> {
        self.histories.get(metric)
    }

    fn push(&mut self, metric: Metric, value: f64) {
        let depth = self.depth;
        self.histories
            .entry(metric)
            .or_insert_with(|| History::new(depth))
            .push(value);
    }

    /// Sample every dimension once. `elapsed` is the wall time since the
    /// previous tick and only matters for network rates.
    pub fn tick<S: InstantSampler + ?Sized>(&mut self, sampler: &S, elapsed: Duration) -> TickReport {
        let mut report = TickReport::default();

        let host_elapsed = self.tick_cpu(sampler);
        match sampler.sample_memory() {
            Ok(memory) => self.push(Metric::Memory, memory),
            Err(e) => warn!("Memory sampling failed: {}", e),
        }
        self.tick_network(sampler, elapsed);
        for pid in self.pids.clone() {
            if !self.tick_process(sampler, pid, host_elapsed) {
                report.missing.push(pid);
            }
        }

        for (metric, history) in &self.histories {
            if history.is_empty() {
                continue;
            }
            match history.digest() {
                Ok(digest) => report.digests.push((metric.clone(), digest)),
                Err(e) => warn!("Cannot digest {}: {}", metric, e),
            }
        }
        report
    }

    /// Returns the time elapsed on an average core since the last tick.
    fn tick_cpu<S: InstantSampler + ?Sized>(&mut self, sampler: &S) -> Option<f64> {
        let current = match sampler.sample_cpu_jiffies() {
            Ok(current) => current,
            Err(e) => {
                warn!("CPU sampling failed: {}", e);
                return None;
            }
        };
        let host_elapsed = self.last_cpu.take().map(|previous| {
            let percentages = stats::cpu_percentages(&previous, &current);
            for (index, percent) in percentages.into_iter().enumerate() {
                self.push(Metric::Cpu(index), percent);
            }
            match (previous.first(), current.first()) {
                (Some(before), Some(after)) => after.total() - before.total(),
                _ => 0.0,
            }
        });
        self.last_cpu = Some(current);
        host_elapsed
    }

    fn tick_network<S: InstantSampler + ?Sized>(&mut self, sampler: &S, elapsed: Duration) {
        let current = sampler.sample_network_io();
        if let Some(previous) = self.last_io.take() {
            for (intf, (recv, sent)) in stats::io_rates(&previous, &current, elapsed) {
                self.push(Metric::NetRecv(intf.clone()), recv);
                self.push(Metric::NetSent(intf), sent);
            }
        }
        self.histories.retain(|metric, _| match metric {
            Metric::NetRecv(intf) | Metric::NetSent(intf) => current.contains_key(intf),
            _ => true,
        });
        self.last_io = Some(current);
    }

    /// Returns false when the process could not be found.
    fn tick_process<S: InstantSampler + ?Sized>(
        &mut self,
        sampler: &S,
        pid: u32,
        host_elapsed: Option<f64>,
    ) -> bool {
        match sampler.lookup_process(pid, self.include_children) {
            Lookup::Found(current) => {
                self.push(Metric::ProcessMemory(pid), current.memory);
                if let (Some(previous), Some(elapsed)) = (self.last_processes.get(&pid), host_elapsed) {
                    let cpu = stats::process_cpu_percent(previous, &current, elapsed);
                    self.push(Metric::ProcessCpu(pid), cpu);
                }
                self.last_processes.insert(pid, current);
                true
            }
            Lookup::Missing => {
                if self.last_processes.remove(&pid).is_some() {
                    debug!("Process {} disappeared, dropping its history", pid);
                }
                self.histories.retain(|metric, _| {
                    !matches!(metric, Metric::ProcessCpu(p) | Metric::ProcessMemory(p) if *p == pid)
                });
                false
            }
        }
    }
}
