use std::collections::{HashSet, VecDeque};

use chrono::NaiveDate;
use mtr_logging::{mtr_debug, mtr_warn};

use crate::{LookupOutcome, ManifestId, ResultRecord};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("O número do MTR é obrigatório.")]
    EmptyInput,
    #[error("O MTR #{0} já foi consultado ou está em processamento.")]
    DuplicateInput(ManifestId),
}

/// Idle/Processing guard: at most one lookup is outstanding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum QueuePhase {
    #[default]
    Idle,
    Processing(ManifestId),
}

/// Sequential lookup queue plus the result collection it feeds.
///
/// Every transition is a plain method on owned state; the caller performs the
/// lookup that [`LookupQueue::next_lookup`] hands out and reports back through
/// [`LookupQueue::complete`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LookupQueue {
    pending: VecDeque<ManifestId>,
    in_flight: HashSet<ManifestId>,
    phase: QueuePhase,
    results: Vec<ResultRecord>,
    next_seq: u64,
}

impl LookupQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizes and enqueues one raw input. Does not start a lookup.
    pub fn submit(&mut self, raw: &str) -> Result<ManifestId, SubmitError> {
        let id = ManifestId::normalize(raw).ok_or(SubmitError::EmptyInput)?;
        if self.is_known(&id) {
            return Err(SubmitError::DuplicateInput(id));
        }
        self.in_flight.insert(id.clone());
        self.pending.push_back(id.clone());
        Ok(id)
    }

    /// Moves the head of the queue into Processing and returns it.
    ///
    /// Returns `None` while a lookup is outstanding or when nothing is queued.
    pub fn next_lookup(&mut self) -> Option<ManifestId> {
        if self.phase != QueuePhase::Idle {
            return None;
        }
        let id = self.pending.pop_front()?;
        self.phase = QueuePhase::Processing(id.clone());
        Some(id)
    }

    /// Records the outcome for the identifier currently being processed.
    ///
    /// Returns `false` and changes nothing when `id` is not the outstanding
    /// lookup.
    pub fn complete(&mut self, id: &ManifestId, outcome: LookupOutcome, today: NaiveDate) -> bool {
        match &self.phase {
            QueuePhase::Processing(current) if current == id => {}
            _ => {
                mtr_warn!("Ignoring completion for {} which is not being processed", id);
                return false;
            }
        }

        if self.results.iter().any(|r| &r.id == id) {
            mtr_debug!("Result for {} already present, dropping duplicate", id);
        } else {
            self.next_seq += 1;
            let record = ResultRecord::from_outcome(self.next_seq, id.clone(), outcome, today);
            self.results.push(record);
        }

        self.in_flight.remove(id);
        self.phase = QueuePhase::Idle;
        true
    }

    /// Deletes a finished record. Sequence numbers of the others are kept.
    pub fn remove(&mut self, id: &ManifestId) -> bool {
        let before = self.results.len();
        self.results.retain(|r| &r.id != id);
        before != self.results.len()
    }

    /// Empties the result collection; queued and outstanding lookups continue.
    pub fn clear(&mut self) {
        self.results.clear();
    }

    pub fn is_known(&self, id: &ManifestId) -> bool {
        self.in_flight.contains(id)
            || self.pending.contains(id)
            || self.results.iter().any(|r| &r.id == id)
    }

    /// Nothing queued and nothing outstanding.
    pub fn is_settled(&self) -> bool {
        self.phase == QueuePhase::Idle && self.pending.is_empty()
    }

    pub fn phase(&self) -> &QueuePhase {
        &self.phase
    }

    pub fn pending(&self) -> impl Iterator<Item = &ManifestId> {
        self.pending.iter()
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    /// Results in insertion order.
    pub fn results(&self) -> &[ResultRecord] {
        &self.results
    }

    pub(crate) fn results_mut(&mut self) -> &mut [ResultRecord] {
        &mut self.results
    }
}
