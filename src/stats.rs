//! Load statistics for `--stats` output.

use std::time::{Duration, Instant};

/// Collects phase timings and file counters.
///
/// Created when `--stats` is passed, threaded as `Option<&mut Stats>`.
/// Zero cost when `None`.
pub struct Stats {
    total_start: Instant,
    phases: Vec<(&'static str, Duration)>,
    pub files_read: u32,
    pub bytes_read: u64,
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Stats {
    pub fn new() -> Self {
        Self {
            total_start: Instant::now(),
            phases: Vec::new(),
            files_read: 0,
            bytes_read: 0,
        }
    }

    /// Record a completed phase with its duration.
    pub fn add_phase(&mut self, name: &'static str, duration: Duration) {
        self.phases.push((name, duration));
    }

    /// Count one file read in full.
    pub fn record_file(&mut self, bytes: usize) {
        self.files_read += 1;
        self.bytes_read += bytes as u64;
    }

    pub fn phases(&self) -> &[(&'static str, Duration)] {
        &self.phases
    }

    /// Print the stats table to stderr.
    pub fn display(&self) {
        let total = self.total_start.elapsed();
        eprintln!();
        eprintln!("=== nnscope load stats ===");

        for (name, dur) in &self.phases {
            eprintln!("  {:<24} {:>8.3}s", name, dur.as_secs_f64());
        }

        eprintln!("  Files read:             {}", self.files_read);
        eprintln!("  Bytes decoded:          {}", self.bytes_read);
        eprintln!("  ─────────────────────────────────");
        eprintln!("  Total:                  {:>8.3}s", total.as_secs_f64());
    }
}
