use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw readings taken from the operating system in one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSample {
    /// Idle share summed over all cores, in the same unit as `cpu_total`.
    pub cpu_idle: f64,
    pub cpu_total: f64,
    pub cpu_count: usize,
    pub memory_total: u64,
    pub memory_free: u64,
    pub load_average: [f64; 3],
    pub process_uptime: Duration,
    pub system_uptime: u64,
    pub hostname: Option<String>,
    pub platform: String,
    pub arch: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryTotals {
    pub total: u64,
    pub used: u64,
    pub free: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    pub platform: String,
    pub arch: String,
    pub cpu_count: usize,
    pub hostname: Option<String>,
    pub load_average: [f64; 3],
    /// Process uptime, seconds.
    pub uptime: u64,
    pub system_uptime: u64,
}

/// Dashboard payload for `GET /api/metrics`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Milliseconds since the Unix epoch at computation time.
    pub timestamp: i64,
    pub cpu_usage: f64,
    pub memory_usage: f64,
    // TODO: sample filesystem usage; reported as zero until then.
    pub disk_usage: f64,
    // TODO: sample interface throughput; reported as zero until then.
    pub network_activity: f64,
    pub health_score: f64,
    pub memory: MemoryTotals,
    pub system: SystemInfo,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn clamp_percent(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 100.0) }
}

pub fn cpu_usage(idle: f64, total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    round2(clamp_percent(100.0 - (idle / total * 100.0)))
}

pub fn memory_usage(total: u64, free: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let used = total.saturating_sub(free) as f64;
    round2(clamp_percent(used / total as f64 * 100.0))
}

/// Unweighted mean of the three headroom figures, rounded to an integer.
pub fn health_score(cpu: f64, memory: f64, disk: f64) -> f64 {
    (((100.0 - cpu) + (100.0 - memory) + (100.0 - disk)) / 3.0).round()
}

impl MetricsSnapshot {
    pub fn from_sample(sample: &RawSample, at: DateTime<Utc>) -> Self {
        let cpu = cpu_usage(sample.cpu_idle, sample.cpu_total);
        let memory = memory_usage(sample.memory_total, sample.memory_free);
        let disk = 0.0;
        let free = sample.memory_free.min(sample.memory_total);

        Self {
            timestamp: at.timestamp_millis(),
            cpu_usage: cpu,
            memory_usage: memory,
            disk_usage: disk,
            network_activity: 0.0,
            health_score: health_score(cpu, memory, disk),
            memory: MemoryTotals {
                total: sample.memory_total,
                used: sample.memory_total - free,
                free,
            },
            system: SystemInfo {
                platform: sample.platform.clone(),
                arch: sample.arch.clone(),
                cpu_count: sample.cpu_count,
                hostname: sample.hostname.clone(),
                load_average: sample.load_average,
                uptime: sample.process_uptime.as_secs(),
                system_uptime: sample.system_uptime,
            },
        }
    }
}
