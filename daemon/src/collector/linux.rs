use super::{CpuJiffies, InstantSampler, InterfaceInstantStats, JiffiesList, Lookup, ProcessStats};
use crate::error::SamplerError;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

const DEFAULT_PAGE_SIZE: u64 = 4096;
const DEFAULT_CLOCK_TICKS: u64 = 100;

/// The subset of `/proc/<pid>/stat` the sampler needs.
#[derive(Debug, Clone, Copy)]
struct PidStat {
    ppid: u32,
    /// utime + stime + cutime + cstime, in clock ticks
    cpu_ticks: u64,
    rss_pages: u64,
}

pub struct LinuxSampler {
    root: PathBuf,
    page_size: u64,
    clock_ticks: u64,
}

impl LinuxSampler {
    pub fn new() -> Self {
        Self::with_root("/proc")
    }

    /// Sampler reading from another procfs mount point.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        let clock_ticks = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
        Self::with_params(
            root,
            if page_size > 0 { page_size as u64 } else { DEFAULT_PAGE_SIZE },
            if clock_ticks > 0 { clock_ticks as u64 } else { DEFAULT_CLOCK_TICKS },
        )
    }

    /// Fully explicit constructor, independent of the running kernel.
    pub fn with_params(root: impl Into<PathBuf>, page_size: u64, clock_ticks: u64) -> Self {
        Self {
            root: root.into(),
            page_size: page_size.max(1),
            clock_ticks: clock_ticks.max(1),
        }
    }

    fn read(&self, relative: &str) -> Result<String, SamplerError> {
        let path = self.root.join(relative);
        fs::read_to_string(&path).map_err(|source| SamplerError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    fn ticks_to_seconds(&self, ticks: u64) -> f64 {
        ticks as f64 / self.clock_ticks as f64
    }

    fn parse_cpu_line(&self, line: &str) -> Option<CpuJiffies> {
        let mut parts = line.split_whitespace();
        let label = parts.next()?;
        // "cpu" alone is the kernel's own aggregate, only "cpuN" lines count
        let index = label.strip_prefix("cpu")?;
        if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let mut fields = [0u64; 9];
        for (slot, value) in fields.iter_mut().zip(parts) {
            *slot = value.parse().unwrap_or(0);
        }
        let [user, nice, system, idle, iowait, irq, softirq, steal, guest] = fields;
        let work = [user, nice, system, irq, softirq, steal, guest]
            .into_iter()
            .fold(0u64, u64::saturating_add);
        Some(CpuJiffies {
            work: self.ticks_to_seconds(work),
            idle: self.ticks_to_seconds(idle.saturating_add(iowait)),
        })
    }

    /// `/proc/meminfo` values, in bytes.
    fn meminfo(&self) -> Result<HashMap<String, u64>, SamplerError> {
        let content = self.read("meminfo")?;
        let mut values = HashMap::new();
        for line in content.lines() {
            if let Some((key, rest)) = line.split_once(':') {
                let mut parts = rest.split_whitespace();
                let Some(Ok(value)) = parts.next().map(str::parse::<u64>) else {
                    continue;
                };
                let scale = if parts.next() == Some("kB") { 1024 } else { 1 };
                values.insert(key.trim().to_string(), value.saturating_mul(scale));
            }
        }
        Ok(values)
    }

    fn total_memory(&self) -> Result<u64, SamplerError> {
        match self.meminfo()?.get("MemTotal") {
            Some(&total) if total > 0 => Ok(total),
            _ => Err(SamplerError::NoMemory),
        }
    }

    fn parse_pid_stat(content: &str) -> Option<PidStat> {
        // comm may hold spaces and parentheses, fields resume after the last ')'
        let rest = &content[content.rfind(')')? + 1..];
        let fields: Vec<&str> = rest.split_whitespace().collect();
        if fields.len() < 22 {
            return None;
        }
        let unsigned = |i: usize| fields[i].parse::<u64>().ok();
        // cutime and cstime are signed in the kernel ABI
        let signed = |i: usize| fields[i].parse::<i64>().ok().map(|v| v.max(0) as u64);
        Some(PidStat {
            ppid: fields[1].parse().ok()?,
            cpu_ticks: [unsigned(11)?, unsigned(12)?, signed(13)?, signed(14)?]
                .into_iter()
                .fold(0u64, u64::saturating_add),
            rss_pages: fields[21].parse::<i64>().ok()?.max(0) as u64,
        })
    }

    fn read_pid_stat(&self, pid: u32) -> Option<PidStat> {
        let content = fs::read_to_string(self.root.join(pid.to_string()).join("stat")).ok()?;
        Self::parse_pid_stat(&content)
    }

    fn list_pids(&self) -> Vec<u32> {
        let mut pids = Vec::new();
        if let Ok(entries) = fs::read_dir(&self.root) {
            for entry in entries.flatten() {
                if let Some(name) = entry.file_name().to_str() {
                    if let Ok(pid) = name.parse::<u32>() {
                        pids.push(pid);
                    }
                }
            }
        }
        pids
    }

    /// All transitive children of `pid`, with their stat already read.
    fn descendants(&self, pid: u32) -> Vec<(u32, PidStat)> {
        let mut by_parent: HashMap<u32, Vec<(u32, PidStat)>> = HashMap::new();
        for candidate in self.list_pids() {
            if let Some(stat) = self.read_pid_stat(candidate) {
                by_parent.entry(stat.ppid).or_default().push((candidate, stat));
            }
        }
        let mut found = Vec::new();
        let mut pending = vec![pid];
        while let Some(parent) = pending.pop() {
            if let Some(children) = by_parent.remove(&parent) {
                for (child, stat) in children {
                    pending.push(child);
                    found.push((child, stat));
                }
            }
        }
        found
    }

    fn memory_percent(&self, rss_pages: u64, total_bytes: u64) -> f64 {
        rss_pages.saturating_mul(self.page_size) as f64 * 100.0 / total_bytes as f64
    }

    /// Swap used by a process, in bytes, from the `VmSwap` line of
    /// `/proc/<pid>/status`.
    ///
    /// Kernel threads have no such line and read as `Missing`, like a
    /// process that is gone.
    pub fn sample_process_swap(&self, pid: u32) -> Lookup<u64> {
        if pid == 0 {
            return Lookup::Missing;
        }
        let Ok(status) = fs::read_to_string(self.root.join(pid.to_string()).join("status")) else {
            debug!("Process {} not found", pid);
            return Lookup::Missing;
        };
        let swap = status.lines().find_map(|line| {
            let mut parts = line.strip_prefix("VmSwap:")?.split_whitespace();
            let value = parts.next()?.parse::<u64>().ok()?;
            let scale = if parts.next() == Some("kB") { 1024 } else { 1 };
            Some(value.saturating_mul(scale))
        });
        match swap {
            Some(bytes) => Lookup::Found(bytes),
            None => Lookup::Missing,
        }
    }
}

impl Default for LinuxSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl InstantSampler for LinuxSampler {
    fn sample_network_io(&self) -> InterfaceInstantStats {
        let mut result = InterfaceInstantStats::new();
        let content = match self.read("net/dev") {
            Ok(content) => content,
            Err(e) => {
                debug!("No interface table: {}", e);
                return result;
            }
        };
        // two header lines, then "name: rx_bytes rx_packets ... tx_bytes ..."
        for line in content.lines().skip(2) {
            let Some((name, counters)) = line.split_once(':') else {
                continue;
            };
            let counters: Vec<&str> = counters.split_whitespace().collect();
            if counters.len() < 9 {
                continue;
            }
            let recv = counters[0].parse().unwrap_or(0);
            let sent = counters[8].parse().unwrap_or(0);
            result.insert(name.trim().to_string(), (recv, sent));
        }
        result
    }

    fn sample_cpu_jiffies(&self) -> Result<JiffiesList, SamplerError> {
        let content = self.read("stat")?;
        let mut cpus: JiffiesList = content
            .lines()
            .filter_map(|line| self.parse_cpu_line(line))
            .collect();
        if cpus.is_empty() {
            return Err(SamplerError::NoCpus);
        }
        let count = cpus.len() as f64;
        let average = CpuJiffies {
            work: cpus.iter().map(|c| c.work).sum::<f64>() / count,
            idle: cpus.iter().map(|c| c.idle).sum::<f64>() / count,
        };
        cpus.insert(0, average);
        Ok(cpus)
    }

    fn sample_memory(&self) -> Result<f64, SamplerError> {
        let meminfo = self.meminfo()?;
        let total = match meminfo.get("MemTotal") {
            Some(&total) if total > 0 => total,
            _ => return Err(SamplerError::NoMemory),
        };
        // kernels before 3.14 have no MemAvailable
        let available = meminfo.get("MemAvailable").copied().unwrap_or_else(|| {
            ["MemFree", "Buffers", "Cached"]
                .iter()
                .filter_map(|key| meminfo.get(*key).copied())
                .fold(0u64, u64::saturating_add)
        });
        Ok(total.saturating_sub(available) as f64 * 100.0 / total as f64)
    }

    fn lookup_process(&self, pid: u32, include_children: bool) -> Lookup<ProcessStats> {
        if pid == 0 {
            debug!("Invalid process identifier 0");
            return Lookup::Missing;
        }
        let Some(stat) = self.read_pid_stat(pid) else {
            debug!("Process {} not found", pid);
            return Lookup::Missing;
        };
        let total = match self.total_memory() {
            Ok(total) => total,
            Err(e) => {
                warn!("Cannot compute memory share of process {}: {}", pid, e);
                return Lookup::Missing;
            }
        };
        let work = self.ticks_to_seconds(stat.cpu_ticks);
        let mut memory = self.memory_percent(stat.rss_pages, total);
        if include_children {
            // children CPU time is already in the parent's cutime/cstime
            for (_, child) in self.descendants(pid) {
                memory += self.memory_percent(child.rss_pages, total);
            }
        }
        Lookup::Found(ProcessStats { work, memory })
    }
}
