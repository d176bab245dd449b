use chrono::NaiveDate;

use crate::ManifestId;

/// Validation code the backend uses for an accepted manifest.
pub const CODE_OK: u16 = 200;
/// The backend rejected the manifest and returned no payload.
pub const CODE_LOOKUP_FAILED: u16 = 999;
/// The lookup never produced a usable response (network, timeout, bad body).
pub const CODE_LOOKUP_ERROR: u16 = 998;
/// Emissions older than this many whole days are flagged as stale.
pub const STALE_AFTER_DAYS: i64 = 30;

const DEFAULT_REJECTION_MESSAGE: &str = "MTR inválido";

/// Manifest fields the desk displays and exports.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ManifestData {
    pub numero_mtr: String,
    /// Emission date as sent by the backend, `dd/mm/yyyy`.
    pub data_emissao: Option<String>,
    pub data_recebimento: Option<String>,
    pub gerador_nome: Option<String>,
    pub gerador_municipio: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub code: u16,
    pub message: String,
}

impl Validation {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Secondary check on the emission date, independent of the backend verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFlag {
    EmissionInFuture,
    EmissionStale,
}

impl DateFlag {
    pub fn code(self) -> u16 {
        match self {
            DateFlag::EmissionInFuture => 1001,
            DateFlag::EmissionStale => 1002,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            DateFlag::EmissionInFuture => "Data de emissão no futuro",
            DateFlag::EmissionStale => "Data de emissão superior a 30 dias",
        }
    }
}

/// What the remote lookup produced for one identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// The backend answered with a manifest and its verdict.
    Found {
        manifest: ManifestData,
        validation: Validation,
    },
    /// The backend explicitly rejected the manifest.
    Rejected {
        message: Option<String>,
        manifest: Option<ManifestData>,
        validation: Option<Validation>,
    },
    /// Network error, timeout or malformed response.
    TransportFailed { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
    Valid,
    /// Accepted by the backend but flagged by the date check.
    Warning,
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    pub seq: u64,
    pub id: ManifestId,
    pub manifest: Option<ManifestData>,
    pub validation: Validation,
    pub date_flag: Option<DateFlag>,
    pub checked_in: bool,
}

impl ResultRecord {
    /// Builds the record for a finished lookup. `today` drives the date check.
    pub fn from_outcome(seq: u64, id: ManifestId, outcome: LookupOutcome, today: NaiveDate) -> Self {
        let (manifest, validation) = match outcome {
            LookupOutcome::Found {
                manifest,
                validation,
            } => (Some(manifest), validation),
            LookupOutcome::Rejected {
                message,
                manifest: Some(manifest),
                validation,
            } => {
                let validation = validation.unwrap_or_else(|| {
                    Validation::new(
                        CODE_LOOKUP_FAILED,
                        message.unwrap_or_else(|| DEFAULT_REJECTION_MESSAGE.to_string()),
                    )
                });
                (Some(manifest), validation)
            }
            LookupOutcome::Rejected {
                message,
                manifest: None,
                ..
            } => (
                None,
                Validation::new(
                    CODE_LOOKUP_FAILED,
                    message.unwrap_or_else(|| DEFAULT_REJECTION_MESSAGE.to_string()),
                ),
            ),
            LookupOutcome::TransportFailed { message } => {
                (None, Validation::new(CODE_LOOKUP_ERROR, message))
            }
        };

        let date_flag = manifest
            .as_ref()
            .and_then(|m| m.data_emissao.as_deref())
            .and_then(|raw| check_emission_date(raw, today));

        Self {
            seq,
            id,
            manifest,
            validation,
            date_flag,
            checked_in: false,
        }
    }

    pub fn status(&self) -> RecordStatus {
        match (self.validation.code, self.date_flag) {
            (CODE_OK, None) => RecordStatus::Valid,
            (CODE_OK, Some(_)) => RecordStatus::Warning,
            _ => RecordStatus::Invalid,
        }
    }

    /// Valid records are the only ones exported and checked in.
    pub fn is_valid(&self) -> bool {
        self.status() == RecordStatus::Valid
    }

    /// Manifest number as reported by the backend, falling back to the queued id.
    pub fn numero_mtr(&self) -> &str {
        self.manifest
            .as_ref()
            .map(|m| m.numero_mtr.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.id.as_str())
    }
}

/// Compares a `dd/mm/yyyy` emission date with `today`.
///
/// Unparseable dates yield no flag.
pub fn check_emission_date(raw: &str, today: NaiveDate) -> Option<DateFlag> {
    let emitted = parse_emission_date(raw)?;
    if emitted > today {
        return Some(DateFlag::EmissionInFuture);
    }
    if (today - emitted).num_days() > STALE_AFTER_DAYS {
        Some(DateFlag::EmissionStale)
    } else {
        None
    }
}

fn parse_emission_date(raw: &str) -> Option<NaiveDate> {
    let mut parts = raw.trim().splitn(3, '/').map(|p| p.trim().parse::<u32>().ok());
    let day = parts.next()??;
    let month = parts.next()??;
    let year = parts.next()??;
    NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)
}
