use std::sync::Mutex;
use std::time::Instant;
use sysinfo::System;

use super::snapshot::RawSample;
use crate::error::FieldcheckError;

/// Source of OS resource readings. Called from the blocking pool.
pub trait SystemSampler: Send + Sync {
    fn sample(&self) -> Result<RawSample, FieldcheckError>;
}

/// Reads the host through `sysinfo`.
///
/// CPU usage is computed by `sysinfo` between consecutive refreshes, so the
/// first reading after construction covers the interval since `new`.
pub struct SysinfoSampler {
    system: Mutex<System>,
    started: Instant,
}

impl SysinfoSampler {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_usage();
        system.refresh_memory();
        Self {
            system: Mutex::new(system),
            started: Instant::now(),
        }
    }
}

impl Default for SysinfoSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemSampler for SysinfoSampler {
    fn sample(&self) -> Result<RawSample, FieldcheckError> {
        let mut system = self
            .system
            .lock()
            .map_err(|_| FieldcheckError::Sampling("sampler state poisoned".to_string()))?;
        system.refresh_cpu_usage();
        system.refresh_memory();

        let cpus = system.cpus();
        if cpus.is_empty() {
            return Err(FieldcheckError::Sampling("no CPUs reported".to_string()));
        }
        // Each core contributes 100 units; its idle share is what it did not use.
        let cpu_total = 100.0 * cpus.len() as f64;
        let cpu_idle: f64 = cpus
            .iter()
            .map(|cpu| 100.0 - f64::from(cpu.cpu_usage()))
            .sum();

        let load = System::load_average();
        Ok(RawSample {
            cpu_idle,
            cpu_total,
            cpu_count: cpus.len(),
            memory_total: system.total_memory(),
            memory_free: system.available_memory(),
            load_average: [load.one, load.five, load.fifteen],
            process_uptime: self.started.elapsed(),
            system_uptime: System::uptime(),
            hostname: System::host_name(),
            platform: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        })
    }
}
