//! Sans-IO autosave state machine.
//!
//! Every transition takes the current `Instant` explicitly, so the machine can
//! be driven by a real runtime clock or stepped by hand in tests.

use std::time::{Duration, Instant};

use uuid::Uuid;

use quill_core::domain::TagInput;

/// Autosave timing knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutosaveConfig {
    /// Time without edits before a save is attempted.
    pub quiet_period: Duration,
    /// Periodic re-check after a save settles.
    pub interval: Duration,
    /// Minimum gap between two save attempts.
    pub cooldown: Duration,
    /// A save slower than this counts as failed.
    pub save_timeout: Duration,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            quiet_period: Duration::from_secs(5),
            interval: Duration::from_secs(30),
            cooldown: Duration::from_secs(2),
            save_timeout: Duration::from_secs(5),
        }
    }
}

/// What gets persisted: tags already normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftPayload {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

impl DraftPayload {
    /// Nothing worth saving: both title and content are blank.
    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty() && self.content.trim().is_empty()
    }
}

/// Raw editor state; `tags` is the comma separated input box.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorFields {
    pub title: String,
    pub content: String,
    pub tags: String,
}

impl EditorFields {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        tags: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            tags: tags.into(),
        }
    }

    pub fn payload(&self) -> DraftPayload {
        DraftPayload {
            title: self.title.clone(),
            content: self.content.clone(),
            tags: TagInput::from(self.tags.as_str()).normalize(),
        }
    }
}

/// A save the caller must perform, then report back through [`Autosave::complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveRequest {
    /// No post exists yet.
    Create(DraftPayload),
    /// Update the draft this session created; must never fork a new post.
    UpdateDraft { id: Uuid, payload: DraftPayload },
    /// Update an existing post opened for editing.
    UpdateFields { id: Uuid, payload: DraftPayload },
}

impl SaveRequest {
    pub fn payload(&self) -> &DraftPayload {
        match self {
            SaveRequest::Create(payload)
            | SaveRequest::UpdateDraft { payload, .. }
            | SaveRequest::UpdateFields { payload, .. } => payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Created(Uuid),
    Saved,
    Failed(String),
}

/// User-visible save indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    Idle,
    Saving,
    Saved { at: Instant },
    Failed { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    New,
    OwnDraft(Uuid),
    Existing(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Pending { due: Instant },
    /// `next_due` is set when an edit arrives while the save is in flight.
    Saving { next_due: Option<Instant> },
}

/// Debounced, sequential draft saving for one editor session.
#[derive(Debug, Clone)]
pub struct Autosave {
    config: AutosaveConfig,
    target: Target,
    baseline: DraftPayload,
    latest: DraftPayload,
    in_flight: Option<DraftPayload>,
    last_attempt: Option<Instant>,
    phase: Phase,
    status: SaveStatus,
    closed: bool,
}

impl Autosave {
    /// A session for a post that does not exist yet.
    pub fn new(config: AutosaveConfig) -> Self {
        Self::with_target(config, Target::New, DraftPayload::default())
    }

    /// A session editing an already persisted post; `saved` is its current content.
    pub fn resume(config: AutosaveConfig, id: Uuid, saved: DraftPayload) -> Self {
        Self::with_target(config, Target::Existing(id), saved)
    }

    fn with_target(config: AutosaveConfig, target: Target, baseline: DraftPayload) -> Self {
        Self {
            config,
            target,
            latest: baseline.clone(),
            baseline,
            in_flight: None,
            last_attempt: None,
            phase: Phase::Idle,
            status: SaveStatus::Idle,
            closed: false,
        }
    }

    pub fn config(&self) -> &AutosaveConfig {
        &self.config
    }

    /// Record the latest editor state and restart the quiet timer.
    pub fn edit(&mut self, now: Instant, fields: EditorFields) {
        if self.closed {
            return;
        }
        self.latest = fields.payload();
        let due = now + self.config.quiet_period;
        self.phase = match self.phase {
            Phase::Saving { .. } => Phase::Saving {
                next_due: Some(due),
            },
            _ => Phase::Pending { due },
        };
    }

    /// When [`poll`](Self::poll) should next be called, if at all.
    pub fn deadline(&self) -> Option<Instant> {
        match self.phase {
            Phase::Pending { due } if !self.closed => Some(due),
            _ => None,
        }
    }

    /// Fire the timer if it is due.
    pub fn poll(&mut self, now: Instant) -> Option<SaveRequest> {
        match self.phase {
            Phase::Pending { due } if !self.closed && now >= due => self.begin_save(now, false),
            _ => None,
        }
    }

    /// Report the result of the last [`SaveRequest`].
    pub fn complete(&mut self, now: Instant, outcome: SaveOutcome) {
        let Phase::Saving { next_due } = self.phase else {
            tracing::debug!("Save completion ignored, no save in flight");
            return;
        };
        let dispatched = self.in_flight.take().unwrap_or_default();

        match outcome {
            SaveOutcome::Created(id) => {
                if self.target == Target::New {
                    self.target = Target::OwnDraft(id);
                }
                self.baseline = dispatched;
                self.status = SaveStatus::Saved { at: now };
            }
            SaveOutcome::Saved => {
                self.baseline = dispatched;
                self.status = SaveStatus::Saved { at: now };
            }
            SaveOutcome::Failed(message) => {
                tracing::warn!(error = %message, "Autosave failed");
                self.status = SaveStatus::Failed { message };
            }
        }

        self.phase = if self.closed {
            Phase::Idle
        } else {
            Phase::Pending {
                due: next_due.unwrap_or(now + self.config.interval),
            }
        };
    }

    /// Fold in the result of a save that was already reported as failed on
    /// timeout but kept running. Must be called before the next
    /// [`poll`](Self::poll) or [`flush`](Self::flush), so a late `Created`
    /// id is reused instead of creating a second post.
    pub fn settle_late(&mut self, now: Instant, request: &SaveRequest, outcome: SaveOutcome) {
        match outcome {
            SaveOutcome::Created(id) => {
                if self.target == Target::New {
                    self.target = Target::OwnDraft(id);
                }
            }
            SaveOutcome::Saved => {}
            SaveOutcome::Failed(message) => {
                tracing::debug!(error = %message, "Timed out save failed");
                return;
            }
        }

        tracing::debug!(post_id = ?self.post_id(), "Timed out save completed");
        self.baseline = request.payload().clone();
        if !self.is_saving() {
            self.status = SaveStatus::Saved { at: now };
        }
    }

    /// Last-chance save when the editor goes away. Skips the cooldown; the
    /// machine is closed afterwards. Returns `None` while a save is in flight.
    pub fn flush(&mut self, now: Instant) -> Option<SaveRequest> {
        if self.closed {
            return None;
        }
        self.closed = true;
        if matches!(self.phase, Phase::Saving { .. }) {
            return None;
        }
        self.begin_save(now, true)
    }

    pub fn status(&self) -> SaveStatus {
        self.status.clone()
    }

    /// Id of the post being edited, once known.
    pub fn post_id(&self) -> Option<Uuid> {
        match self.target {
            Target::New => None,
            Target::OwnDraft(id) | Target::Existing(id) => Some(id),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_saving(&self) -> bool {
        matches!(self.phase, Phase::Saving { .. })
    }

    fn begin_save(&mut self, now: Instant, bypass_cooldown: bool) -> Option<SaveRequest> {
        if self.latest.is_empty() || self.latest == self.baseline {
            self.phase = Phase::Idle;
            return None;
        }

        if !bypass_cooldown {
            if let Some(last) = self.last_attempt {
                let ready = last + self.config.cooldown;
                if now < ready {
                    self.phase = Phase::Pending { due: ready };
                    return None;
                }
            }
        }

        let payload = self.latest.clone();
        self.last_attempt = Some(now);
        self.in_flight = Some(payload.clone());
        self.phase = Phase::Saving { next_due: None };
        self.status = SaveStatus::Saving;

        Some(match self.target {
            Target::New => SaveRequest::Create(payload),
            Target::OwnDraft(id) => SaveRequest::UpdateDraft { id, payload },
            Target::Existing(id) => SaveRequest::UpdateFields { id, payload },
        })
    }
}
