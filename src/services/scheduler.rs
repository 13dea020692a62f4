// src/services/scheduler.rs

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use tokio::{sync::watch, task::JoinHandle};

/// A background job run on a [`Schedule`], independent of request traffic.
#[async_trait]
pub trait PeriodicTask: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    async fn run(&self) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Once a day at this UTC wall-clock time.
    DailyAt(NaiveTime),
    /// Fixed period, first run one period after start.
    Every(Duration),
}

impl Schedule {
    /// Time to wait from `now` until the next run.
    pub fn delay_until_next(&self, now: DateTime<Utc>) -> Duration {
        match *self {
            Schedule::Every(period) => period,
            Schedule::DailyAt(at) => {
                let today = now.date_naive().and_time(at).and_utc();
                let next = if today > now { today } else { today + TimeDelta::days(1) };
                (next - now).to_std().unwrap_or(Duration::ZERO)
            }
        }
    }
}

#[derive(Default)]
pub struct Scheduler {
    entries: Vec<(Schedule, Arc<dyn PeriodicTask>)>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, schedule: Schedule, task: Arc<dyn PeriodicTask>) -> Self {
        self.entries.push((schedule, task));
        self
    }

    /// Spawns one timer loop per task.
    pub fn start(self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let workers = self
            .entries
            .into_iter()
            .map(|(schedule, task)| tokio::spawn(run_loop(schedule, task, shutdown_rx.clone())))
            .collect();

        SchedulerHandle { shutdown_tx, workers }
    }
}

async fn run_loop(schedule: Schedule, task: Arc<dyn PeriodicTask>, mut shutdown_rx: watch::Receiver<bool>) {
    tracing::info!(task = task.name(), ?schedule, "periodic task scheduled");

    loop {
        let delay = schedule.delay_until_next(Utc::now());

        tokio::select! {
            _ = tokio::time::sleep(delay) => {
                match task.run().await {
                    Ok(()) => tracing::debug!(task = task.name(), "periodic task finished"),
                    Err(e) => tracing::error!(task = task.name(), error = ?e, "periodic task failed"),
                }
            }

            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }

    tracing::info!(task = task.name(), "periodic task stopped");
}

pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    workers: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Stops every loop and waits for in-flight runs to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        for worker in self.workers {
            if let Err(e) = worker.await {
                tracing::error!(error = ?e, "periodic task panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::TimeZone;

    use super::*;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, h, m, 0).unwrap()
    }

    #[test]
    fn daily_schedule_waits_for_the_next_occurrence() {
        let nine = Schedule::DailyAt(NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(nine.delay_until_next(at(8, 0)), Duration::from_secs(3600));
        assert_eq!(nine.delay_until_next(at(9, 0)), Duration::from_secs(24 * 3600));
        assert_eq!(nine.delay_until_next(at(10, 30)), Duration::from_secs(22 * 3600 + 30 * 60));
    }

    #[test]
    fn fixed_period_is_constant() {
        let every = Schedule::Every(Duration::from_secs(60));
        assert_eq!(every.delay_until_next(at(0, 0)), Duration::from_secs(60));
    }

    struct Counter(Arc<AtomicUsize>);

    #[async_trait]
    impl PeriodicTask for Counter {
        fn name(&self) -> &'static str {
            "counter"
        }

        async fn run(&self) -> anyhow::Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn runs_tasks_until_shutdown() {
        let runs = Arc::new(AtomicUsize::new(0));
        let handle = Scheduler::new()
            .add(Schedule::Every(Duration::from_millis(10)), Arc::new(Counter(runs.clone())))
            .start();

        tokio::time::sleep(Duration::from_millis(120)).await;
        handle.shutdown().await;

        let seen = runs.load(Ordering::SeqCst);
        assert!(seen >= 2, "expected several runs, got {seen}");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(runs.load(Ordering::SeqCst), seen);
    }
}
