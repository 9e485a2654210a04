//! Background polling threads with a stop signal.
//!
//! Each worker owns its loop state.  The only thing shared with the
//! spawning module is the sending half of a `flume` channel: the loop waits
//! on the receiver with the poll period as timeout, so a stop request
//! interrupts the sleep instead of waiting it out.
//!
//! ```text
//!   spawn ──▶ tick ──▶ recv_timeout(period) ──Timeout──▶ tick ...
//!                              │
//!                   stop / drop (Disconnected) ──▶ exit ──▶ join
//! ```

use std::thread::{self, JoinHandle};
use std::time::Duration;

use flume::{Receiver, RecvTimeoutError, Sender};
use log::{debug, warn};

use crate::error::{Error, Result};

/// Cancellation handle given to worker bodies that block on their own
/// (e.g. waiting for a GPIO edge) instead of sleeping for a period.
#[derive(Clone)]
pub struct StopSignal {
    rx: Receiver<()>,
}

impl StopSignal {
    /// True once the owning [`Worker`] has been stopped or dropped.
    pub fn is_stopped(&self) -> bool {
        matches!(self.rx.try_recv(), Ok(()) | Err(flume::TryRecvError::Disconnected))
    }

    /// Sleep for `period` unless stopped first; returns `true` if stopped.
    pub fn wait(&self, period: Duration) -> bool {
        match self.rx.recv_timeout(period) {
            Err(RecvTimeoutError::Timeout) => false,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
        }
    }
}

pub struct Worker {
    name: String,
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Run `tick` immediately and then once per `period` until stopped.
    pub fn periodic<F>(name: &str, period: Duration, mut tick: F) -> Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        Self::spawn(name, move |stop| {
            loop {
                tick();
                if stop.wait(period) {
                    break;
                }
            }
        })
    }

    /// Run `body` on its own thread; `body` must return once the
    /// [`StopSignal`] reports stopped.
    pub fn spawn<F>(name: &str, body: F) -> Result<Self>
    where
        F: FnOnce(StopSignal) + Send + 'static,
    {
        let (tx, rx) = flume::bounded(1);
        let signal = StopSignal { rx };
        let thread_name = name.to_owned();
        let handle = thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || {
                body(signal);
                debug!("worker {thread_name}: exited");
            })
            .map_err(|e| Error::Init(format!("spawn {name}: {e}")))?;

        Ok(Self {
            name: name.to_owned(),
            stop: Some(tx),
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Signal the loop and wait for the thread to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(tx) = self.stop.take() {
            debug!("worker {}: stopping", self.name);
            let _ = tx.try_send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("worker {}: thread panicked", self.name);
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
