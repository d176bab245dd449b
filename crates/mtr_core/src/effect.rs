use std::time::Duration;

use crate::{ManifestId, ResultRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Look up one manifest. Never emitted while another lookup is outstanding.
    Lookup { id: ManifestId },
    /// Deliver `Msg::QueueResumed` after `delay`.
    ResumeAfter { delay: Duration },
    /// Record the check-in of these manifests for `usuario`.
    CheckIn {
        usuario: String,
        ids: Vec<ManifestId>,
        mtrs: Vec<String>,
    },
    /// Write the report for these valid records.
    Export { records: Vec<ResultRecord> },
}
