//! Supervised child processes for command-line speech and audio tools.
//!
//! A [`ManagedChild`] owns one spawned process. A watcher task waits for it
//! to exit and reports how it ended through an [`ExitCallback`]. Terminating
//! the child (or dropping the handle) kills it and the callback sees
//! [`ChildExit::Killed`]. On unix the kill signal is delivered before
//! [`ManagedChild::terminate`] returns; the watcher only reaps.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::process::Command;
use tokio::sync::oneshot;

/// How a supervised child ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildExit {
    /// Exited with status 0.
    Success,
    /// Exited non-zero or could not be waited on.
    Failed(String),
    /// Terminated through [`ManagedChild::terminate`] or by dropping the handle.
    Killed,
}

/// Invoked exactly once from the watcher task when the child ends.
pub type ExitCallback = Box<dyn FnOnce(ChildExit) + Send + 'static>;

pub struct ManagedChild {
    pid: Option<u32>,
    kill_tx: Mutex<Option<oneshot::Sender<()>>>,
    paused: AtomicBool,
}

impl ManagedChild {
    /// Spawn `command` and start watching it. Must be called inside a tokio
    /// runtime.
    pub fn spawn(mut command: Command, on_exit: ExitCallback) -> io::Result<Self> {
        command.kill_on_drop(true);
        let mut child = command.spawn()?;
        let pid = child.id();
        let (kill_tx, mut kill_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let waited = tokio::select! {
                status = child.wait() => Some(status),
                _ = &mut kill_rx => None,
            };

            let exit = match waited {
                Some(Ok(status)) if status.success() => ChildExit::Success,
                Some(Ok(status)) => ChildExit::Failed(format!("exited with {status}")),
                Some(Err(e)) => ChildExit::Failed(e.to_string()),
                None => {
                    if let Err(e) = child.kill().await {
                        tracing::debug!(error = %e, "Child already gone when killed");
                    }
                    ChildExit::Killed
                }
            };
            on_exit(exit);
        });

        Ok(Self {
            pid,
            kill_tx: Mutex::new(Some(kill_tx)),
            paused: AtomicBool::new(false),
        })
    }

    pub const fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Kill the child. Idempotent; does not wait for the child to be reaped.
    pub fn terminate(&self) {
        let sender = self
            .kill_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(sender) = sender else {
            return;
        };
        // A closed channel means the watcher already reaped the child and
        // the pid may belong to someone else now.
        if !sender.is_closed() {
            self.send_signal(JobSignal::Kill);
        }
        let _ = sender.send(());
    }

    /// Suspend the child. Returns whether it was running.
    pub fn pause(&self) -> bool {
        if self.paused.load(Ordering::SeqCst) || !self.send_signal(JobSignal::Stop) {
            return false;
        }
        self.paused.store(true, Ordering::SeqCst);
        true
    }

    /// Continue a suspended child. Returns whether it was paused.
    pub fn resume(&self) -> bool {
        if !self.paused.load(Ordering::SeqCst) || !self.send_signal(JobSignal::Continue) {
            return false;
        }
        self.paused.store(false, Ordering::SeqCst);
        true
    }

    #[cfg(unix)]
    fn send_signal(&self, signal: JobSignal) -> bool {
        use nix::sys::signal::{self, Signal};
        use nix::unistd::Pid;

        let Some(pid) = self.pid else {
            return false;
        };
        let Ok(raw) = i32::try_from(pid) else {
            return false;
        };
        let signal = match signal {
            JobSignal::Stop => Signal::SIGSTOP,
            JobSignal::Continue => Signal::SIGCONT,
            JobSignal::Kill => Signal::SIGKILL,
        };
        match signal::kill(Pid::from_raw(raw), signal) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(pid, error = %e, "Failed to signal child");
                false
            }
        }
    }

    #[cfg(not(unix))]
    fn send_signal(&self, _signal: JobSignal) -> bool {
        false
    }
}

impl Drop for ManagedChild {
    fn drop(&mut self) {
        self.terminate();
    }
}

#[derive(Debug, Clone, Copy)]
enum JobSignal {
    Stop,
    Continue,
    Kill,
}
