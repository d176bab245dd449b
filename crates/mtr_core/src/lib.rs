//! MTR Desk core: pure lookup-queue state machine and view-model helpers.
mod access;
mod config_board;
mod effect;
mod identifier;
mod msg;
mod queue;
mod record;
mod state;
mod update;
mod view_model;

pub use access::{authorize, Access, AccessDenied, Operator};
pub use config_board::{ConfigBoard, ConfigError, ConfigItem, ConfigKind};
pub use effect::Effect;
pub use identifier::{ManifestId, MANIFEST_ID_LEN};
pub use msg::Msg;
pub use queue::{LookupQueue, QueuePhase, SubmitError};
pub use record::{
    check_emission_date, DateFlag, LookupOutcome, ManifestData, RecordStatus, ResultRecord,
    Validation, CODE_LOOKUP_ERROR, CODE_LOOKUP_FAILED, CODE_OK, STALE_AFTER_DAYS,
};
pub use state::{AppState, QueueSettings, SortOrder};
pub use update::update;
pub use view_model::{AppViewModel, PhaseView, RecordRow};
