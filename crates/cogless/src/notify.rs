//! Ready/busy notifications to whoever supervises the worker.
//!
//! In production the parent process receives SIGUSR1 (ready) and SIGUSR2
//! (busy). In-process callers and tests use [`ChannelNotifier`] instead.

use std::io;

use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerSignal {
    /// Idle and able to take one more request.
    Ready,
    /// Just claimed a request.
    Busy,
}

impl WorkerSignal {
    #[cfg(unix)]
    pub fn as_signal(self) -> nix::sys::signal::Signal {
        use nix::sys::signal::Signal;
        match self {
            Self::Ready => Signal::SIGUSR1,
            Self::Busy => Signal::SIGUSR2,
        }
    }
}

/// Sink for worker state transitions.
pub trait Notifier: Send + Sync {
    fn notify(&self, signal: WorkerSignal) -> io::Result<()>;
}

/// Sends SIGUSR1/SIGUSR2 to the parent process.
#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub struct ParentProcessNotifier;

#[cfg(unix)]
impl Notifier for ParentProcessNotifier {
    fn notify(&self, signal: WorkerSignal) -> io::Result<()> {
        let parent = nix::unistd::getppid();
        tracing::trace!(?signal, %parent, "Signalling parent");
        nix::sys::signal::kill(parent, signal.as_signal()).map_err(io::Error::from)
    }
}

/// Forwards notifications over a tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<WorkerSignal>,
}

impl ChannelNotifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<WorkerSignal>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, signal: WorkerSignal) -> io::Result<()> {
        self.tx
            .send(signal)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "notification channel closed"))
    }
}
