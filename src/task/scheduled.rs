use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::bot::error::Error;
use crate::task::context::{wait_cancelled, ContextKey, ContextValues, TaskContext};

type TaskFuture = Pin<Box<dyn Future<Output = Result<(), Error>> + Send + 'static>>;
type ExecFn = Arc<dyn Fn(TaskContext) -> TaskFuture + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TaskStatus {
    NotStarted = 0,
    Running = 1,
    Stopped = 2,
}

impl TaskStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::NotStarted,
            1 => Self::Running,
            _ => Self::Stopped,
        }
    }
}

/// A named job run on a fixed interval until stopped.
///
/// Runs never overlap: a run that outlasts the interval delays the next tick.
/// Each run executes on its own tokio task, so a panic is logged and the
/// following tick proceeds. Stopping cancels an in-flight run.
pub struct ScheduledTask {
    name: Arc<str>,
    interval: Duration,
    exec: ExecFn,
    values: Arc<ContextValues>,
    status: AtomicU8,
    cancel: watch::Sender<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ScheduledTask {
    pub fn new<F, Fut>(name: &str, interval: Duration, exec: F) -> Self
    where
        F: Fn(TaskContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), Error>> + Send + 'static,
    {
        let (cancel, _) = watch::channel(false);
        let exec: ExecFn = Arc::new(move |ctx| Box::pin(exec(ctx)) as TaskFuture);

        Self {
            name: Arc::from(name),
            // tokio intervals reject a zero period
            interval: interval.max(Duration::from_millis(1)),
            exec,
            values: Arc::new(ContextValues::new()),
            status: AtomicU8::new(TaskStatus::NotStarted as u8),
            cancel,
            handle: Mutex::new(None),
        }
    }

    /// Attach a value every run can read back through its context
    pub fn with_value<T: Any + Send + Sync>(mut self, key: ContextKey, value: T) -> Self {
        Arc::make_mut(&mut self.values).insert(key, Arc::new(value));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> TaskStatus {
        TaskStatus::from_u8(self.status.load(Ordering::SeqCst))
    }

    /// Begin ticking; the first run happens one interval from now.
    ///
    /// Returns false if the task was already started or stopped.
    pub fn start(&self) -> bool {
        if !self.mark_running() {
            return false;
        }

        self.spawn_loop();
        info!(task = %self.name, "Scheduled task started, every {:?}", self.interval);
        true
    }

    /// Run once right away, then begin ticking
    pub async fn start_now(&self) -> bool {
        if !self.mark_running() {
            return false;
        }

        info!(task = %self.name, "Scheduled task started, every {:?}", self.interval);
        run_once(&self.name, &self.exec, self.context(), self.cancel.subscribe()).await;

        // Stopped during the first run
        if self.status() != TaskStatus::Running {
            return true;
        }
        self.spawn_loop();
        true
    }

    /// Cancel the task and any in-flight run. Safe to call repeatedly and
    /// never waits on the run itself.
    pub fn stop(&self) {
        let previous = self.status.swap(TaskStatus::Stopped as u8, Ordering::SeqCst);
        if TaskStatus::from_u8(previous) == TaskStatus::Stopped {
            return;
        }

        self.cancel.send_replace(true);
        info!(task = %self.name, "Scheduled task stopped");
    }

    /// Wait for the tick loop to wind down after `stop`
    pub async fn join(&self) {
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(task = %self.name, "Scheduled task loop ended abnormally: {}", e);
            }
        }
    }

    fn mark_running(&self) -> bool {
        let started = self
            .status
            .compare_exchange(
                TaskStatus::NotStarted as u8,
                TaskStatus::Running as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok();

        if !started {
            warn!(task = %self.name, "Scheduled task is {:?}, not starting", self.status());
        }
        started
    }

    fn context(&self) -> TaskContext {
        TaskContext::new(
            self.name.clone(),
            self.cancel.subscribe(),
            self.values.clone(),
        )
    }

    fn spawn_loop(&self) {
        let name = self.name.clone();
        let exec = self.exec.clone();
        let period = self.interval;
        let ctx = self.context();
        let mut cancelled = self.cancel.subscribe();

        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = wait_cancelled(&mut cancelled) => break,
                    _ = ticker.tick() => {}
                }

                if !run_once(&name, &exec, ctx.clone(), cancelled.clone()).await {
                    break;
                }
            }

            debug!(task = %name, "Scheduled task loop exited");
        });

        *self.handle.lock() = Some(handle);
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.cancel.send_replace(true);
    }
}

/// One run of `exec`; returns false if it was cut short by cancellation
async fn run_once(
    name: &str,
    exec: &ExecFn,
    ctx: TaskContext,
    mut cancelled: watch::Receiver<bool>,
) -> bool {
    let mut run = tokio::spawn(exec(ctx));

    tokio::select! {
        result = &mut run => {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) if e.is_expected() => {
                    debug!(task = %name, "Scheduled task run ended: {}", e);
                }
                Ok(Err(e)) => error!(task = %name, "Scheduled task run failed: {}", e),
                Err(e) if e.is_panic() => error!(task = %name, "Scheduled task run panicked"),
                Err(e) => warn!(task = %name, "Scheduled task run aborted: {}", e),
            }
            true
        }
        _ = wait_cancelled(&mut cancelled) => {
            run.abort();
            false
        }
    }
}
