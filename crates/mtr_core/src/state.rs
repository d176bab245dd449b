use std::time::Duration;

use crate::view_model::{AppViewModel, PhaseView, RecordRow};
use crate::{LookupQueue, Operator, QueuePhase};

/// Tunables for the lookup loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueSettings {
    /// Pause between one lookup completing and the next one starting.
    pub resume_delay: Duration,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            resume_delay: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    settings: QueueSettings,
    queue: LookupQueue,
    operator: Option<Operator>,
    sort: SortOrder,
    input_error: Option<String>,
    notice: Option<String>,
    check_in_busy: bool,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: QueueSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        let mut rows: Vec<RecordRow> = self.queue.results().iter().map(RecordRow::from).collect();
        match self.sort {
            SortOrder::Ascending => rows.sort_by_key(|row| row.seq),
            SortOrder::Descending => rows.sort_by_key(|row| std::cmp::Reverse(row.seq)),
        }

        AppViewModel {
            phase: match self.queue.phase() {
                QueuePhase::Idle => PhaseView::Idle,
                QueuePhase::Processing(id) => PhaseView::Processing(id.to_string()),
            },
            pending: self.queue.pending().map(ToString::to_string).collect(),
            valid_count: self.queue.results().iter().filter(|r| r.is_valid()).count(),
            rows,
            sort: self.sort,
            input_error: self.input_error.clone(),
            notice: self.notice.clone(),
            operator: self.operator.as_ref().map(|op| op.login.clone()),
            check_in_busy: self.check_in_busy,
            dirty: self.dirty,
        }
    }

    /// Returns whether anything visible changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn settings(&self) -> QueueSettings {
        self.settings
    }

    pub fn queue(&self) -> &LookupQueue {
        &self.queue
    }

    pub fn operator(&self) -> Option<&Operator> {
        self.operator.as_ref()
    }

    pub(crate) fn queue_mut(&mut self) -> &mut LookupQueue {
        &mut self.queue
    }

    pub(crate) fn set_operator(&mut self, operator: Option<Operator>) {
        if self.operator != operator {
            self.operator = operator;
            self.dirty = true;
        }
    }

    pub(crate) fn toggle_sort(&mut self) {
        self.sort = self.sort.toggled();
        self.dirty = true;
    }

    pub fn is_check_in_busy(&self) -> bool {
        self.check_in_busy
    }

    pub(crate) fn set_check_in_busy(&mut self, busy: bool) {
        self.check_in_busy = busy;
        self.dirty = true;
    }

    pub(crate) fn set_input_error(&mut self, message: String) {
        self.input_error = Some(message);
        self.dirty = true;
    }

    pub(crate) fn set_notice(&mut self, message: impl Into<String>) {
        self.notice = Some(message.into());
        self.dirty = true;
    }

    /// Input errors and notices only live for the update that produced them.
    pub(crate) fn clear_transient(&mut self) {
        self.input_error = None;
        self.notice = None;
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}
