//! Tokio driver for the autosave state machine.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time;

use super::DraftSink;
use super::machine::{Autosave, EditorFields, SaveOutcome, SaveRequest, SaveStatus};

const COMMAND_BUFFER: usize = 64;

enum Command {
    Edit(EditorFields),
    Close,
}

/// Handle to a running autosave task.
///
/// Saves run one at a time. A save that outlives its timeout is reported as
/// failed but left running; its result is folded in before the next save is
/// sent. Dropping the handle closes the session just like
/// [`close`](Self::close), without waiting for the final flush.
pub struct AutosaveHandle {
    commands: mpsc::Sender<Command>,
    status: watch::Receiver<SaveStatus>,
    task: JoinHandle<Autosave>,
}

impl AutosaveHandle {
    pub fn spawn<S>(autosave: Autosave, sink: S) -> Self
    where
        S: DraftSink + 'static,
    {
        let (commands, rx) = mpsc::channel(COMMAND_BUFFER);
        let (status_tx, status) = watch::channel(autosave.status());
        let driver = Driver {
            autosave,
            sink: Arc::new(sink),
            commands: rx,
            status: status_tx,
            overdue: None,
            closing: false,
        };
        let task = tokio::spawn(driver.run());

        Self {
            commands,
            status,
            task,
        }
    }

    pub async fn edit(&self, fields: EditorFields) {
        if self.commands.send(Command::Edit(fields)).await.is_err() {
            tracing::debug!("Edit dropped, autosave already stopped");
        }
    }

    pub fn status(&self) -> SaveStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SaveStatus> {
        self.status.clone()
    }

    /// Flush pending edits, stop the task and hand back the final machine state.
    pub async fn close(self) -> Result<Autosave, JoinError> {
        let _ = self.commands.send(Command::Close).await;
        drop(self.commands);
        self.task.await
    }
}

fn now() -> Instant {
    time::Instant::now().into_std()
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}

struct Driver<S> {
    autosave: Autosave,
    sink: Arc<S>,
    commands: mpsc::Receiver<Command>,
    status: watch::Sender<SaveStatus>,
    /// A timed out save that is still running.
    overdue: Option<(SaveRequest, JoinHandle<SaveOutcome>)>,
    closing: bool,
}

impl<S: DraftSink + 'static> Driver<S> {
    async fn run(mut self) -> Autosave {
        while !self.closing {
            let deadline = self.autosave.deadline();
            tokio::select! {
                command = self.commands.recv() => self.handle(command),
                _ = sleep_until(deadline) => {
                    self.settle_overdue().await;
                    if let Some(request) = self.autosave.poll(now()) {
                        self.save(request).await;
                    }
                }
            }
            self.publish();
        }

        self.settle_overdue().await;
        if let Some(request) = self.autosave.flush(now()) {
            self.save(request).await;
        }
        self.publish();
        tracing::debug!(post_id = ?self.autosave.post_id(), "Autosave closed");
        self.autosave
    }

    fn handle(&mut self, command: Option<Command>) {
        match command {
            Some(Command::Edit(fields)) => self.autosave.edit(now(), fields),
            Some(Command::Close) | None => self.closing = true,
        }
    }

    fn publish(&self) {
        self.status.send_replace(self.autosave.status());
    }

    /// Run one save, still taking edits meanwhile. On timeout the call keeps
    /// running in the background and is parked in `overdue`.
    async fn save(&mut self, request: SaveRequest) {
        self.publish();

        let sink = Arc::clone(&self.sink);
        let sent = request.clone();
        let mut call = tokio::spawn(async move { dispatch(sink.as_ref(), &sent).await });
        let timeout = self.autosave.config().save_timeout;
        let expired = time::sleep(timeout);
        tokio::pin!(expired);

        let outcome = loop {
            tokio::select! {
                joined = &mut call => break joined_outcome(joined),
                () = &mut expired => {
                    tracing::warn!(timeout_secs = timeout.as_secs(), "Save still running after timeout");
                    self.overdue = Some((request, call));
                    break SaveOutcome::Failed(format!("Save timed out after {}s", timeout.as_secs()));
                }
                command = self.commands.recv(), if !self.closing => self.handle(command),
            }
        };

        self.autosave.complete(now(), outcome);
    }

    /// Wait for a timed out save to finish and fold its result into the
    /// machine, so a late `Created` is reused rather than sent again.
    async fn settle_overdue(&mut self) {
        let Some((request, mut call)) = self.overdue.take() else {
            return;
        };

        let outcome = loop {
            tokio::select! {
                joined = &mut call => break joined_outcome(joined),
                command = self.commands.recv(), if !self.closing => self.handle(command),
            }
        };

        self.autosave.settle_late(now(), &request, outcome);
        self.publish();
    }
}

fn joined_outcome(joined: Result<SaveOutcome, JoinError>) -> SaveOutcome {
    joined.unwrap_or_else(|err| SaveOutcome::Failed(format!("Save task failed: {err}")))
}

async fn dispatch<S: DraftSink + ?Sized>(sink: &S, request: &SaveRequest) -> SaveOutcome {
    let result = match request {
        SaveRequest::Create(payload) => sink.create_draft(payload).await.map(SaveOutcome::Created),
        SaveRequest::UpdateDraft { id, payload } => sink
            .update_draft(*id, payload)
            .await
            .map(|()| SaveOutcome::Saved),
        SaveRequest::UpdateFields { id, payload } => sink
            .update_fields(*id, payload)
            .await
            .map(|()| SaveOutcome::Saved),
    };

    result.unwrap_or_else(|err| SaveOutcome::Failed(err.to_string()))
}
