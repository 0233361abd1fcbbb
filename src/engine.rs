//! Search host.
//!
//! Runs searches off the caller's thread behind a start/cancel message
//! channel. A control thread owns the host state; each run gets its own
//! search thread, which streams progress and solutions straight into the
//! outbound channel and reports its outcome back to the control thread.
//! The control thread then emits the terminal `result` or `error`, so the
//! terminal message always follows every event of its run. A run whose
//! outbound receiver is gone cancels itself.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, error, info, warn};

use crate::actions::Catalog;
use crate::board::Board;
use crate::protocol::{Inbound, Outbound};
use crate::search::{
    optimize, CancelToken, EventSink, SearchConfig, SearchEvent, SearchOutcome, SearchTuning,
};

/// Host settings shared by every run.
#[derive(Debug, Clone)]
pub struct HostOptions {
    pub catalog: Arc<Catalog>,
    /// Tuning for `start` messages that carry none.
    pub default_tuning: Option<SearchTuning>,
    /// Makes the next run panic.
    #[cfg(test)]
    pub(crate) fail_next_run: Arc<AtomicBool>,
}

impl Default for HostOptions {
    fn default() -> Self {
        HostOptions {
            catalog: Arc::new(Catalog::standard().clone()),
            default_tuning: None,
            #[cfg(test)]
            fail_next_run: Arc::new(AtomicBool::new(false)),
        }
    }
}

enum Control {
    Message(Inbound),
    Finished(Result<SearchOutcome, String>),
    /// Exit once the active run, if any, has finished.
    Drain,
    /// Cancel the active run and exit.
    Shutdown,
}

/// Forwards search events as outbound messages and cancels the run once
/// nobody is receiving them.
struct ChannelSink {
    out: Sender<Outbound>,
    cancel: CancelToken,
}

impl EventSink for ChannelSink {
    fn emit(&mut self, event: SearchEvent) {
        let msg = match event {
            SearchEvent::Progress(fraction) => Outbound::Progress { fraction },
            SearchEvent::NewSolution(solution) => Outbound::NewSolution { solution },
        };
        if self.out.send(msg).is_err() && !self.cancel.is_cancelled() {
            warn!("outbound channel closed, cancelling search");
            self.cancel.cancel();
        }
    }

    fn checkpoint(&mut self) {
        thread::yield_now();
    }
}

struct ActiveRun {
    cancel: CancelToken,
    handle: JoinHandle<()>,
}

/// Handle to a running host. Dropping it cancels any active run.
pub struct Host {
    control: Sender<Control>,
    handle: Option<JoinHandle<()>>,
}

impl Host {
    /// Starts the control thread. The host announces itself with
    /// `Outbound::Ready` on the returned receiver.
    pub fn spawn(options: HostOptions) -> (Host, Receiver<Outbound>) {
        let (control_tx, control_rx) = mpsc::channel();
        let (out_tx, out_rx) = mpsc::channel();
        let loopback = control_tx.clone();
        let handle = thread::spawn(move || control_loop(options, control_rx, loopback, out_tx));
        (
            Host {
                control: control_tx,
                handle: Some(handle),
            },
            out_rx,
        )
    }

    /// Delivers a message. Returns false if the host has stopped.
    pub fn send(&self, msg: Inbound) -> bool {
        self.control.send(Control::Message(msg)).is_ok()
    }

    pub fn start(&self, board: Board, config: SearchConfig) -> bool {
        self.send(Inbound::Start { board, config })
    }

    pub fn cancel(&self) -> bool {
        self.send(Inbound::Cancel)
    }

    /// Waits for the active run to finish, then stops the host.
    pub fn finish(mut self) {
        let _ = self.control.send(Control::Drain);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Host {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.control.send(Control::Shutdown);
            let _ = handle.join();
        }
    }
}

fn control_loop(
    options: HostOptions,
    control: Receiver<Control>,
    loopback: Sender<Control>,
    out: Sender<Outbound>,
) {
    let _ = out.send(Outbound::Ready);
    let mut active: Option<ActiveRun> = None;
    let mut draining = false;

    for msg in control.iter() {
        match msg {
            Control::Message(Inbound::Start { board, config }) => {
                if active.is_some() {
                    warn!("start received while a search is running");
                    let _ = out.send(Outbound::error("a search is already running"));
                    continue;
                }
                match spawn_run(&options, board, config, &loopback, &out) {
                    Ok(run) => active = Some(run),
                    Err(e) => {
                        error!("failed to spawn search thread: {e}");
                        let _ = out.send(Outbound::error(format!("failed to start search: {e}")));
                    }
                }
            }
            Control::Message(Inbound::Cancel) => match &active {
                Some(run) => {
                    debug!("cancelling search");
                    run.cancel.cancel();
                }
                None => debug!("cancel received while idle"),
            },
            Control::Finished(result) => {
                if let Some(run) = active.take() {
                    let _ = run.handle.join();
                }
                let msg = match result {
                    Ok(outcome) => {
                        info!(
                            score = outcome.score.primary,
                            iterations = outcome.iterations,
                            status = ?outcome.status,
                            "search finished"
                        );
                        Outbound::Result {
                            board: outcome.board,
                            status: outcome.status,
                            iterations: outcome.iterations,
                        }
                    }
                    Err(message) => {
                        warn!("search failed: {message}");
                        Outbound::Error { message }
                    }
                };
                let _ = out.send(msg);
                if draining {
                    break;
                }
            }
            Control::Drain => {
                if active.is_none() {
                    break;
                }
                draining = true;
            }
            Control::Shutdown => {
                if let Some(run) = active.take() {
                    run.cancel.cancel();
                    let _ = run.handle.join();
                }
                break;
            }
        }
    }
}

fn spawn_run(
    options: &HostOptions,
    board: Board,
    mut config: SearchConfig,
    loopback: &Sender<Control>,
    out: &Sender<Outbound>,
) -> std::io::Result<ActiveRun> {
    if config.tuning.is_none() {
        config.tuning = options.default_tuning;
    }
    let cancel = CancelToken::new();
    let token = cancel.clone();
    let catalog = Arc::clone(&options.catalog);
    let done = loopback.clone();
    let mut sink = ChannelSink {
        out: out.clone(),
        cancel: cancel.clone(),
    };
    #[cfg(test)]
    let fail = options.fail_next_run.swap(false, Ordering::SeqCst);

    info!(
        width = board.width(),
        height = board.height(),
        cities = config.participating_cities.len(),
        budget = config.overall_budget,
        "search started"
    );
    let handle = thread::Builder::new()
        .name("market-search".into())
        .spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                #[cfg(test)]
                if fail {
                    panic!("injected search failure");
                }
                optimize(&board, &token, &config, &catalog, &mut sink)
            }));
            let result = match result {
                Ok(Ok(outcome)) => Ok(outcome),
                Ok(Err(e)) => Err(e.to_string()),
                Err(payload) => Err(format!("search panicked: {}", panic_message(&*payload))),
            };
            let _ = done.send(Control::Finished(result));
        })?;
    Ok(ActiveRun { cancel, handle })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}
