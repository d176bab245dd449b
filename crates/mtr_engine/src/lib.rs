//! MTR Desk engine: backend client, background effect execution and file output.
mod auth;
mod client;
mod config_api;
mod engine;
mod export;
mod history;
mod lookup;
mod persist;
mod session;
mod types;
mod users;

pub use auth::SessionUser;
pub use client::{ApiClient, ApiSettings};
pub use config_api::{ConfigEntity, ConfigEntry, SaveReceipt};
pub use engine::{EngineEvent, EngineHandle};
pub use export::{
    render_report, report_stem, write_report, ExportError, ReportEntry, ReportOptions,
    ReportSummary,
};
pub use history::{CheckInEntry, CheckInSink, HistoryItem, HistoryPage, DEFAULT_PER_PAGE};
pub use lookup::{LookupReply, ManifestLookup, ManifestPayload, PartyPayload, ValidationPayload};
pub use persist::{ensure_dir, write_atomic, PersistError};
pub use session::{SessionError, SessionStore};
pub use types::{ApiError, FailureKind};
pub use users::{NewUser, UserRecord};
