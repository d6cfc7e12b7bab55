//! End-to-end behaviour of the job manager and the backup/restore job,
//! driven only through the public API.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use boxd_core::config::{ApplianceConfig, SchedulerConfig};
use boxd_core::progress::{BackupProvider, Progress, ProgressStream};
use boxd_core::StatusBoard;
use boxd_scheduler::{
    BackupRestoreJob, DispatchOutcome, Job, JobArgs, JobContext, JobError, JobManager,
    OperationState, Recurrence, SchedulerEngine,
};
use chrono::Utc;
use futures_util::{stream, StreamExt};
use serde_json::json;
use tokio::sync::watch;

struct Counter {
    name: &'static str,
    recurrence: Recurrence,
    runs: Arc<AtomicUsize>,
}

impl Counter {
    fn new(name: &'static str, recurrence: Recurrence) -> (Self, Arc<AtomicUsize>) {
        let runs = Arc::new(AtomicUsize::new(0));
        let job = Self {
            name,
            recurrence,
            runs: Arc::clone(&runs),
        };
        (job, runs)
    }
}

#[async_trait]
impl Job for Counter {
    fn name(&self) -> &str {
        self.name
    }

    fn initial_recurrence(&self) -> Recurrence {
        self.recurrence
    }

    async fn execute(&mut self, _ctx: &mut JobContext<'_>) -> Result<(), JobError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct Panics;

#[async_trait]
impl Job for Panics {
    fn name(&self) -> &str {
        "Panics"
    }

    fn initial_recurrence(&self) -> Recurrence {
        Recurrence::every(60)
    }

    async fn execute(&mut self, _ctx: &mut JobContext<'_>) -> Result<(), JobError> {
        panic!("job body exploded");
    }
}

/// Writes to the shared appliance config so later jobs can observe it.
struct SetsDomain;

#[async_trait]
impl Job for SetsDomain {
    fn name(&self) -> &str {
        "SetsDomain"
    }

    fn initial_recurrence(&self) -> Recurrence {
        Recurrence::Disabled
    }

    async fn execute(&mut self, ctx: &mut JobContext<'_>) -> Result<(), JobError> {
        ctx.config.domain = ctx.args.get("domain").cloned();
        Ok(())
    }
}

struct FixedProvider(Vec<Progress>);

impl BackupProvider for FixedProvider {
    fn full_export(&self, _tar_path: &Path) -> ProgressStream {
        stream::iter(self.0.clone()).boxed()
    }

    fn full_import(&self, _tar_path: &Path) -> ProgressStream {
        stream::iter(self.0.clone()).boxed()
    }
}

/// Export stream that blows up on its first pull.
struct BrokenProvider;

impl BackupProvider for BrokenProvider {
    fn full_export(&self, _tar_path: &Path) -> ProgressStream {
        stream::iter([Progress::new("running", "a", "export", 10)])
            .map(|_| -> Progress { panic!("tar stream broke") })
            .boxed()
    }

    fn full_import(&self, tar_path: &Path) -> ProgressStream {
        self.full_export(tar_path)
    }
}

fn manager() -> JobManager {
    JobManager::new(ApplianceConfig::default(), Arc::new(StatusBoard::new()))
}

fn args(pairs: &[(&str, &str)]) -> JobArgs {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn age(manager: &mut JobManager, name: &str, secs: i64) {
    manager
        .get_mut(name)
        .unwrap()
        .set_last_run(Utc::now() - chrono::Duration::seconds(secs));
}

#[tokio::test]
async fn job_is_not_due_right_after_running() {
    let mut m = manager();
    let (job, runs) = Counter::new("Tick", Recurrence::every(30));
    m.register(job);
    age(&mut m, "Tick", 31);
    assert_eq!(m.next_due().as_deref(), Some("Tick"));

    assert_eq!(m.dispatch("Tick", &JobArgs::new()).await, DispatchOutcome::Completed);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(!m.get("Tick").unwrap().is_due());
    assert_eq!(m.next_due(), None);

    let last = m.get("Tick").unwrap().last_run();
    let job = m.get("Tick").unwrap();
    assert!(!job.is_due_at(last + chrono::Duration::seconds(30)));
    assert!(job.is_due_at(last + chrono::Duration::seconds(31)));
}

#[tokio::test]
async fn disabled_job_is_never_due_but_can_be_dispatched() {
    let mut m = manager();
    let (job, runs) = Counter::new("Manual", Recurrence::Disabled);
    m.register(job);
    age(&mut m, "Manual", 86_400 * 365);

    assert_eq!(m.next_due(), None);
    assert_eq!(m.dispatch("Manual", &JobArgs::new()).await, DispatchOutcome::Completed);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(m.get("Manual").unwrap().recurrence(), Recurrence::Disabled);
}

#[tokio::test]
async fn dispatch_to_unknown_name_changes_nothing() {
    let mut m = manager();
    let (job, runs) = Counter::new("Known", Recurrence::every(10));
    m.register(job);
    let before = m.get("Known").unwrap().last_run();

    assert_eq!(m.dispatch("Nope", &JobArgs::new()).await, DispatchOutcome::UnknownJob);
    assert_eq!(runs.load(Ordering::SeqCst), 0);
    assert_eq!(m.get("Known").unwrap().last_run(), before);
    assert_eq!(m.len(), 1);
}

#[tokio::test]
async fn duplicate_registration_keeps_second_instance_in_first_slot() {
    let mut m = manager();
    let (first, first_runs) = Counter::new("Dup", Recurrence::every(10));
    let (other, _) = Counter::new("Other", Recurrence::every(10));
    let (second, second_runs) = Counter::new("Dup", Recurrence::every(10));
    m.register(first);
    m.register(other);
    m.register(second);

    assert_eq!(m.names().collect::<Vec<_>>(), vec!["Dup", "Other"]);
    m.dispatch("Dup", &JobArgs::new()).await;
    assert_eq!(first_runs.load(Ordering::SeqCst), 0);
    assert_eq!(second_runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn next_due_is_pure_and_ordered() {
    let mut m = manager();
    for name in ["A", "B"] {
        let (job, _) = Counter::new(name, Recurrence::every(5));
        m.register(job);
    }
    age(&mut m, "B", 60);
    age(&mut m, "A", 6);

    assert_eq!(m.next_due().as_deref(), Some("A"));
    assert_eq!(m.next_due().as_deref(), Some("A"));
}

#[tokio::test]
async fn panicking_job_is_contained_and_clock_still_moves() {
    let mut m = manager();
    m.register(Panics);
    let (job, runs) = Counter::new("After", Recurrence::every(60));
    m.register(job);
    age(&mut m, "Panics", 120);

    match m.dispatch("Panics", &JobArgs::new()).await {
        DispatchOutcome::Failed(msg) => assert!(msg.contains("job body exploded")),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(!m.get("Panics").unwrap().is_due());

    assert_eq!(m.dispatch("After", &JobArgs::new()).await, DispatchOutcome::Completed);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn shared_config_changes_persist_between_runs() {
    let mut m = manager();
    m.register(SetsDomain);
    m.dispatch("SetsDomain", &args(&[("domain", "cloud.example.org")])).await;
    assert_eq!(m.config().domain.as_deref(), Some("cloud.example.org"));
}

#[tokio::test]
async fn backup_restore_walks_through_its_states() {
    let board = Arc::new(StatusBoard::new());
    let mut m = JobManager::new(ApplianceConfig::default(), Arc::clone(&board));
    m.register(BackupRestoreJob::new(Arc::new(FixedProvider(vec![
        Progress::new("running", "a", "export", 33),
        Progress::new("running", "b", "export", 66),
        Progress::new("finished", "all", "export", 100),
    ]))));
    let start = args(&[("tar_path", "/tmp/x.tar"), ("mode", "backup")]);

    m.dispatch("BackupRestore", &start).await;
    let record = board.get("backup_restore").unwrap();
    assert_eq!(record["state"], "starting");
    assert_eq!(record["percent"], 0);
    assert_eq!(record["mode"], "backup");
    assert_eq!(m.get("BackupRestore").unwrap().recurrence(), Recurrence::every(1));

    let mut seen = Vec::new();
    for _ in 0..3 {
        m.dispatch("BackupRestore", &JobArgs::new()).await;
        seen.push(board.get("backup_restore").unwrap()["who"].clone());
    }
    assert_eq!(seen, vec![json!("a"), json!("b"), json!("all")]);
    assert_eq!(m.get("BackupRestore").unwrap().recurrence(), Recurrence::every(1));

    m.dispatch("BackupRestore", &JobArgs::new()).await;
    assert_eq!(m.get("BackupRestore").unwrap().recurrence(), Recurrence::Disabled);
    assert_eq!(board.get("backup_restore").unwrap()["state"], "finished");
}

#[tokio::test]
async fn invalid_backup_mode_leaves_job_idle() {
    let board = Arc::new(StatusBoard::new());
    let mut m = JobManager::new(ApplianceConfig::default(), Arc::clone(&board));
    let job = BackupRestoreJob::new(Arc::new(FixedProvider(Vec::new())));
    assert_eq!(job.state(), OperationState::Idle);
    m.register(job);

    m.dispatch("BackupRestore", &args(&[("tar_path", "/tmp/x.tar"), ("mode", "delete")]))
        .await;
    assert_eq!(m.get("BackupRestore").unwrap().recurrence(), Recurrence::Disabled);
    assert_eq!(board.drain_messages().len(), 1);
    assert_eq!(board.get("backup_restore"), None);
}

#[tokio::test]
async fn panicking_progress_stream_stops_polling_without_notices() {
    let board = Arc::new(StatusBoard::new());
    let mut m = JobManager::new(ApplianceConfig::default(), Arc::clone(&board));
    m.register(BackupRestoreJob::new(Arc::new(BrokenProvider)));
    let start = args(&[("tar_path", "/tmp/x.tar"), ("mode", "backup")]);

    assert_eq!(m.dispatch("BackupRestore", &start).await, DispatchOutcome::Completed);
    match m.dispatch("BackupRestore", &JobArgs::new()).await {
        DispatchOutcome::Failed(msg) => assert!(msg.contains("tar stream broke")),
        other => panic!("unexpected outcome {other:?}"),
    }

    // scheduler ticks after the abort: first one stops polling, none complain
    for _ in 0..5 {
        age(&mut m, "BackupRestore", 2);
        if m.next_due().is_none() {
            break;
        }
        m.dispatch("BackupRestore", &JobArgs::new()).await;
    }
    assert_eq!(m.get("BackupRestore").unwrap().recurrence(), Recurrence::Disabled);
    assert_eq!(m.next_due(), None);
    assert_eq!(board.pending_messages(), 0);

    // a fresh start is accepted again
    m.dispatch("BackupRestore", &start).await;
    assert_eq!(m.get("BackupRestore").unwrap().recurrence(), Recurrence::every(1));
    assert_eq!(board.get("backup_restore").unwrap()["state"], "starting");
}

#[tokio::test]
async fn engine_polls_due_jobs_until_shutdown() {
    let mut m = manager();
    let (job, runs) = Counter::new("Fast", Recurrence::every(0));
    m.register(job);

    let config = SchedulerConfig {
        poll_interval_ms: 5,
        trigger_buffer: 4,
    };
    let (engine, handle) = SchedulerEngine::new(m, &config);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(engine.run(shutdown_rx));

    for _ in 0..200 {
        if runs.load(Ordering::SeqCst) >= 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(runs.load(Ordering::SeqCst) >= 2);

    shutdown_tx.send(true).unwrap();
    let manager = task.await.unwrap();
    assert_eq!(manager.len(), 1);
    assert!(!handle.is_running());
}
