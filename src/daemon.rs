//! Daemon event loop: inbound messages and termination signals.
//!
//! ```text
//!   stdin thread ──Message / InputClosed──┐
//!                                         ├──▶ flume ──▶ run() ──▶ ModuleRegistry
//!   signal thread ──Terminate(signo)──────┘
//! ```
//!
//! End of input does not stop the daemon: under a service manager stdin is
//! usually `/dev/null`, and the pollers must keep running.  Only SIGINT or
//! SIGTERM ends [`run`], after which `main` shuts the modules down.

use std::io::{self, BufRead, BufReader, Read};
use std::thread::{self, JoinHandle};

use flume::{Receiver, Sender};
use log::{debug, info, warn};

use crate::adapters::stdio::parse_line;
use crate::app::registry::ModuleRegistry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// One inbound `topic payload` line.
    Message { topic: String, payload: String },
    /// The input stream reached end of file or failed.
    InputClosed,
    /// A termination signal arrived.
    Terminate(i32),
}

/// Deliver events to the registry until a termination signal arrives.
///
/// Returns the signal number, or `None` if every event source went away.
/// Messages on topics `accepts` rejects are dropped.
pub fn run<F>(registry: &mut ModuleRegistry, events: &Receiver<Event>, accepts: F) -> Option<i32>
where
    F: Fn(&str) -> bool,
{
    for event in events.iter() {
        match event {
            Event::Message { topic, payload } => {
                if !accepts(&topic) {
                    debug!("daemon: no subscriber for {topic}");
                    continue;
                }
                // The registry already logs which module rejected the message.
                let _ = registry.dispatch(&topic, payload.as_bytes());
            }
            Event::InputClosed => info!("daemon: input closed, running until signalled"),
            Event::Terminate(signo) => {
                info!("daemon: signal {signo}, stopping");
                return Some(signo);
            }
        }
    }
    None
}

/// Read `topic payload` lines from `input` on a thread of their own.
/// Sends [`Event::InputClosed`] once the input ends.
pub fn spawn_line_reader<R>(input: R, events: Sender<Event>) -> io::Result<JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    thread::Builder::new().name("input".into()).spawn(move || {
        for line in BufReader::new(input).lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!("input: {e}");
                    break;
                }
            };
            let Some((topic, payload)) = parse_line(&line) else {
                continue;
            };
            let event = Event::Message {
                topic: topic.to_owned(),
                payload: payload.to_owned(),
            };
            if events.send(event).is_err() {
                return;
            }
        }
        let _ = events.send(Event::InputClosed);
    })
}

/// SIGINT and SIGTERM, blocked so they are only taken by [`listen`](Self::listen).
pub struct TerminationSignals {
    set: libc::sigset_t,
}

impl TerminationSignals {
    /// Block SIGINT and SIGTERM in the calling thread.  Threads spawned
    /// afterwards inherit the mask, so call this before starting workers.
    pub fn block() -> io::Result<Self> {
        // SAFETY: `set` is a local that sigemptyset initialises before use.
        let set = unsafe {
            let mut set = std::mem::zeroed::<libc::sigset_t>();
            libc::sigemptyset(&raw mut set);
            libc::sigaddset(&raw mut set, libc::SIGINT);
            libc::sigaddset(&raw mut set, libc::SIGTERM);
            set
        };
        // SAFETY: `set` is initialised and the old mask is not requested.
        let rc = unsafe { libc::pthread_sigmask(libc::SIG_BLOCK, &raw const set, std::ptr::null_mut()) };
        if rc != 0 {
            return Err(io::Error::from_raw_os_error(rc));
        }
        Ok(Self { set })
    }

    /// Wait for the first signal on a dedicated thread and forward it as
    /// [`Event::Terminate`].
    pub fn listen(self, events: Sender<Event>) -> io::Result<JoinHandle<()>> {
        let set = self.set;
        thread::Builder::new().name("signals".into()).spawn(move || {
            let mut signo: libc::c_int = 0;
            // SAFETY: both pointers refer to locals that outlive the call.
            let rc = unsafe { libc::sigwait(&raw const set, &raw mut signo) };
            if rc != 0 {
                warn!("signals: sigwait failed (errno {rc})");
                return;
            }
            let _ = events.send(Event::Terminate(signo));
        })
    }
}
