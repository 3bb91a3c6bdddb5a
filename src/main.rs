/*!
 * Scheduler Demo - Main Entry Point
 *
 * Hosts the scheduling core on a tokio runtime with simulated memory and
 * quantum collaborators, drives a small mixed workload, and prints the final
 * statistics and process list as JSON.
 */

use ai_os_sched::{
    init_tracing, Pid, Priority, ProcessFlags, ProcessSpec, ProcessState, Scheduler,
    SchedulerConfig, SchedulerTask, SimulatedMemory, SimulatedQuantumMemory, TerminationReason,
    WaitReason, IDLE_PID,
};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_DEMO_SECS: u64 = 2;
const DRIVER_PERIOD: Duration = Duration::from_millis(25);

fn load_config() -> Result<SchedulerConfig> {
    match std::env::var("SCHED_CONFIG") {
        Ok(path) => SchedulerConfig::from_file(&path)
            .with_context(|| format!("loading scheduler config from {}", path)),
        Err(_) => SchedulerConfig::from_env().context("reading scheduler config from environment"),
    }
}

fn demo_duration() -> Result<Duration> {
    let secs = match std::env::var("SCHED_DEMO_SECS") {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("SCHED_DEMO_SECS={} is not a number", raw))?,
        Err(_) => DEFAULT_DEMO_SECS,
    };
    Ok(Duration::from_secs(secs))
}

/// A shell owning most of the workload, a detached realtime job and a
/// suspended batch job released later by the driver
fn spawn_workload(scheduler: &Scheduler) -> Result<Vec<Pid>> {
    let shell = scheduler
        .create(ProcessSpec::new("shell").with_flags(ProcessFlags::HIGH_PRIORITY))
        .context("creating shell")?;
    // Children attach to the running process
    scheduler.schedule()?;

    let specs = [
        ProcessSpec::new("indexer"),
        ProcessSpec::new("compiler"),
        ProcessSpec::new("backup").with_priority(Priority::Low),
        ProcessSpec::new("annealer").quantum(8),
        ProcessSpec::new("nightly").with_priority(Priority::Low).suspended(),
        ProcessSpec::new("audio").with_flags(ProcessFlags::REALTIME | ProcessFlags::DETACHED),
    ];

    let mut pids = vec![shell];
    for spec in specs {
        let name = spec.name.clone();
        let pid = scheduler
            .create(spec)
            .with_context(|| format!("creating {}", name))?;
        pids.push(pid);
    }
    Ok(pids)
}

fn pids_in(scheduler: &Scheduler, state: ProcessState) -> Vec<Pid> {
    scheduler
        .list_processes()
        .into_iter()
        .filter(|p| p.state == state)
        .map(|p| p.pid)
        .collect()
}

/// One step of simulated process behaviour
fn drive(scheduler: &Scheduler, step: u64) -> Result<()> {
    if step == 8 {
        for pid in pids_in(scheduler, ProcessState::Created) {
            info!(pid, "Releasing suspended job");
            scheduler.resume(pid)?;
        }
    }

    if step % 4 == 3 {
        for pid in pids_in(scheduler, ProcessState::Waiting) {
            scheduler.unblock(pid)?;
        }
        return Ok(());
    }

    let Some(pid) = scheduler.current_pid().filter(|&pid| pid != IDLE_PID) else {
        return Ok(());
    };
    match step % 4 {
        0 => scheduler.block(pid, WaitReason::Io, Some(step))?,
        1 => {
            scheduler.yield_now()?;
        }
        _ => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = load_config()?;
    let run_for = demo_duration()?;
    info!(policy = %config.policy, run_secs = run_for.as_secs(), "Scheduler demo starting");

    let scheduler = Scheduler::builder()
        .with_memory(Arc::new(SimulatedMemory::with_capacity(config.memory_capacity)))
        .with_quantum_memory(Arc::new(SimulatedQuantumMemory::new()))
        .with_config(config.clone())
        .build()?;

    let pids = spawn_workload(&scheduler)?;
    info!(processes = pids.len(), "Workload created");

    let task = SchedulerTask::spawn(scheduler.clone(), config.tick_interval);

    let driver = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(DRIVER_PERIOD);
            let mut step = 0u64;
            loop {
                ticker.tick().await;
                if let Err(e) = drive(&scheduler, step) {
                    warn!(error = %e, step, "Workload step failed");
                }
                step += 1;
            }
        })
    };

    tokio::select! {
        _ = tokio::time::sleep(run_for) => info!("Demo period elapsed"),
        result = tokio::signal::ctrl_c() => {
            result.context("listening for ctrl-c")?;
            info!("Interrupted");
        }
    }

    driver.abort();
    task.shutdown().await;

    if let Some(&first) = pids.first() {
        scheduler.terminate(first, 0, TerminationReason::Normal)?;
    }
    let terminated = scheduler.shutdown()?;
    info!(terminated, "Workload shut down");

    if let Err(violations) = scheduler.check_invariants() {
        for violation in &violations {
            warn!(%violation, "Invariant violated");
        }
    }

    let report = serde_json::json!({
        "statistics": scheduler.get_statistics(),
        "processes": scheduler.list_processes(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
