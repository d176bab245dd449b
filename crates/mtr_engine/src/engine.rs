use std::io;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use mtr_logging::{mtr_debug, mtr_warn};

use crate::{ApiError, CheckInEntry, CheckInSink, LookupReply, ManifestLookup};

enum EngineCommand {
    Lookup { code: String },
    CheckIn { batch: u64, entries: Vec<CheckInEntry> },
    Wake { delay: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    LookupFinished {
        code: String,
        result: Result<LookupReply, ApiError>,
    },
    CheckInFinished {
        batch: u64,
        result: Result<(), ApiError>,
    },
    Woke,
}

/// Runs backend calls and timers on a background tokio runtime.
///
/// Commands are executed as they arrive; callers that need one-at-a-time
/// semantics (the lookup queue) enforce it themselves.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    /// Starts the engine thread. Events arrive on the returned receiver.
    pub fn new(
        lookup: Arc<dyn ManifestLookup>,
        check_ins: Arc<dyn CheckInSink>,
    ) -> io::Result<(Self, mpsc::Receiver<EngineEvent>)> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<EngineCommand>();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;

        thread::Builder::new()
            .name("mtr-engine".to_string())
            .spawn(move || {
                while let Ok(command) = cmd_rx.recv() {
                    let lookup = lookup.clone();
                    let check_ins = check_ins.clone();
                    let event_tx = event_tx.clone();
                    runtime.spawn(async move {
                        let event = handle_command(lookup.as_ref(), check_ins.as_ref(), command).await;
                        if event_tx.send(event).is_err() {
                            mtr_debug!("Engine event dropped; receiver gone");
                        }
                    });
                }
                runtime.shutdown_background();
            })?;

        Ok((Self { cmd_tx }, event_rx))
    }

    pub fn lookup(&self, code: impl Into<String>) {
        self.send(EngineCommand::Lookup { code: code.into() });
    }

    pub fn check_in(&self, batch: u64, entries: Vec<CheckInEntry>) {
        self.send(EngineCommand::CheckIn { batch, entries });
    }

    /// Emits [`EngineEvent::Woke`] after `delay`.
    pub fn wake_after(&self, delay: Duration) {
        self.send(EngineCommand::Wake { delay });
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            mtr_warn!("Engine thread is gone; command dropped");
        }
    }
}

async fn handle_command(
    lookup: &dyn ManifestLookup,
    check_ins: &dyn CheckInSink,
    command: EngineCommand,
) -> EngineEvent {
    match command {
        EngineCommand::Lookup { code } => {
            let result = lookup.lookup(&code).await;
            if let Err(err) = &result {
                mtr_warn!("Lookup {} failed ({}): {}", code, err.kind, err.message);
            }
            EngineEvent::LookupFinished { code, result }
        }
        EngineCommand::CheckIn { batch, entries } => {
            let result = check_ins.check_in(&entries).await;
            EngineEvent::CheckInFinished { batch, result }
        }
        EngineCommand::Wake { delay } => {
            tokio::time::sleep(delay).await;
            EngineEvent::Woke
        }
    }
}
