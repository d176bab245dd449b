use crate::{RecordStatus, ResultRecord, SortOrder};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PhaseView {
    #[default]
    Idle,
    Processing(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub phase: PhaseView,
    pub pending: Vec<String>,
    /// Records in display order.
    pub rows: Vec<RecordRow>,
    pub valid_count: usize,
    pub sort: SortOrder,
    pub input_error: Option<String>,
    pub notice: Option<String>,
    pub operator: Option<String>,
    pub check_in_busy: bool,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRow {
    pub seq: u64,
    pub id: String,
    pub numero_mtr: String,
    pub status: RecordStatus,
    pub code: u16,
    pub message: String,
    pub date_warning: Option<&'static str>,
    pub data_emissao: Option<String>,
    pub data_recebimento: Option<String>,
    pub gerador: Option<String>,
    pub municipio: Option<String>,
    pub checked_in: bool,
}

impl From<&ResultRecord> for RecordRow {
    fn from(record: &ResultRecord) -> Self {
        let manifest = record.manifest.as_ref();
        Self {
            seq: record.seq,
            id: record.id.to_string(),
            numero_mtr: record.numero_mtr().to_string(),
            status: record.status(),
            code: record.validation.code,
            message: record.validation.message.clone(),
            date_warning: record.date_flag.map(|flag| flag.message()),
            data_emissao: manifest.and_then(|m| m.data_emissao.clone()),
            data_recebimento: manifest.and_then(|m| m.data_recebimento.clone()),
            gerador: manifest.and_then(|m| m.gerador_nome.clone()),
            municipio: manifest.and_then(|m| m.gerador_municipio.clone()),
            checked_in: record.checked_in,
        }
    }
}
