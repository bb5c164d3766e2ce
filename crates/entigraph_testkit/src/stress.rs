//! Stress tests for entity activation and mutation.
//!
//! These drive the protocol from many threads at once and report how many
//! operations succeeded.

use crate::fixtures::Person;
use entigraph_core::{ensure_activated, CoreResult, GraphModel, Persistent};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Operations per thread.
    pub operations: usize,
    /// Number of concurrent threads.
    pub threads: usize,
    /// Every n-th activation asks for write; 0 means read only.
    pub write_every: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 1_000,
            threads: 8,
            write_every: 4,
        }
    }
}

/// Races `config.threads` threads activating the same entities.
///
/// All threads start together on a barrier. Each one walks `entities`
/// round-robin, asking for write on every `write_every`-th call.
pub fn stress_concurrent_activation(
    entities: &[Arc<dyn Persistent>],
    config: &StressConfig,
) -> StressTestResult {
    if entities.is_empty() {
        return StressTestResult::new(0, 0, Duration::ZERO);
    }

    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(config.threads));
    let entities: Arc<Vec<Arc<dyn Persistent>>> = Arc::new(entities.to_vec());

    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let entities = Arc::clone(&entities);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let barrier = Arc::clone(&barrier);
            let operations = config.operations;
            let write_every = config.write_every;

            thread::spawn(move || {
                barrier.wait();
                for i in 0..operations {
                    let entity = &entities[(t + i) % entities.len()];
                    let for_write = write_every > 0 && i % write_every == 0;
                    match ensure_activated(entity.as_ref(), for_write) {
                        Ok(()) => successful.fetch_add(1, Ordering::Relaxed),
                        Err(_) => failed.fetch_add(1, Ordering::Relaxed),
                    };
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

/// Renames `people` from many threads inside one open transaction.
///
/// Thread `t` renames person `t % people.len()` `config.operations` times.
/// The caller decides whether to commit or roll back afterwards. An empty
/// cast opens no transaction.
pub fn stress_concurrent_mutations(
    model: &Arc<GraphModel>,
    people: &[Arc<Person>],
    config: &StressConfig,
) -> CoreResult<StressTestResult> {
    if people.is_empty() {
        return Ok(StressTestResult::new(0, 0, Duration::ZERO));
    }
    model.begin()?;

    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(config.threads));

    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let person = Arc::clone(&people[t % people.len()]);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let barrier = Arc::clone(&barrier);
            let operations = config.operations;

            thread::spawn(move || {
                barrier.wait();
                for i in 0..operations {
                    match person.set_name(format!("t{t}-{i}")) {
                        Ok(()) => successful.fetch_add(1, Ordering::Relaxed),
                        Err(_) => failed.fetch_add(1, Ordering::Relaxed),
                    };
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    Ok(StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    ))
}
