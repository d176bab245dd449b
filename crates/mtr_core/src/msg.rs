use chrono::NaiveDate;

use crate::{LookupOutcome, ManifestId, Operator};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The saved session was resolved at startup (or after login/logout).
    SessionResolved(Option<Operator>),
    /// User typed or scanned one manifest code and hit enter.
    InputSubmitted(String),
    /// Fired after the inter-item delay to pick up the next queued code.
    QueueResumed,
    /// Engine finished the outstanding lookup.
    LookupCompleted {
        id: ManifestId,
        outcome: LookupOutcome,
        completed_on: NaiveDate,
    },
    /// User removed a finished record.
    RemoveClicked(String),
    /// User cleared the result list.
    ClearClicked,
    /// User flipped the display order.
    SortToggled,
    /// User asked to check in every valid record.
    CheckInClicked,
    /// Engine finished the check-in batch.
    CheckInCompleted {
        ids: Vec<ManifestId>,
        result: Result<(), String>,
    },
    /// User asked for the report of valid records.
    ExportClicked,
    /// Report writer finished.
    ExportCompleted(Result<String, String>),
    /// Fallback for placeholder wiring.
    NoOp,
}
