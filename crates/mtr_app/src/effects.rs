use std::collections::HashMap;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use chrono::{Local, Utc};
use mtr_core::{Effect, LookupOutcome, ManifestData, ManifestId, Msg, ResultRecord, Validation};
use mtr_engine::{
    write_report, ApiError, CheckInEntry, EngineEvent, EngineHandle, LookupReply,
    ManifestPayload, ReportEntry, ReportOptions, ValidationPayload,
};
use mtr_logging::{mtr_debug, mtr_error, mtr_info, mtr_warn};

use crate::desk::DeskEvent;

const UNKNOWN_STATUS: &str = "Status desconhecido";

type PendingBatches = Arc<Mutex<HashMap<u64, Vec<ManifestId>>>>;

/// Turns core effects into engine commands and engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
    desk_tx: mpsc::Sender<DeskEvent>,
    report: ReportOptions,
    batches: PendingBatches,
    next_batch: u64,
}

impl EffectRunner {
    pub fn new(
        engine: EngineHandle,
        events: mpsc::Receiver<EngineEvent>,
        desk_tx: mpsc::Sender<DeskEvent>,
        report: ReportOptions,
    ) -> Self {
        let batches = PendingBatches::default();
        spawn_event_loop(events, desk_tx.clone(), batches.clone());
        Self {
            engine,
            desk_tx,
            report,
            batches,
            next_batch: 1,
        }
    }

    pub fn run(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Lookup { id } => {
                    mtr_info!("Lookup manifest={}", id);
                    self.engine.lookup(id.as_str());
                }
                Effect::ResumeAfter { delay } => self.engine.wake_after(delay),
                Effect::CheckIn { usuario, ids, mtrs } => {
                    let batch = self.next_batch;
                    self.next_batch += 1;
                    let data_baixa = Utc::now().to_rfc3339();
                    let entries = mtrs
                        .into_iter()
                        .map(|mtr| CheckInEntry {
                            mtr,
                            usuario: usuario.clone(),
                            data_baixa: data_baixa.clone(),
                        })
                        .collect();
                    if let Ok(mut batches) = self.batches.lock() {
                        batches.insert(batch, ids);
                    }
                    mtr_info!("CheckIn batch={} usuario={}", batch, usuario);
                    self.engine.check_in(batch, entries);
                }
                Effect::Export { records } => {
                    let result = export(&records, &self.report);
                    let _ = self.desk_tx.send(DeskEvent::Msg(Msg::ExportCompleted(result)));
                }
            }
        }
    }
}

fn spawn_event_loop(
    events: mpsc::Receiver<EngineEvent>,
    desk_tx: mpsc::Sender<DeskEvent>,
    batches: PendingBatches,
) {
    thread::spawn(move || {
        for event in events {
            let msg = match event {
                EngineEvent::LookupFinished { code, result } => {
                    let Some(id) = ManifestId::normalize(&code) else {
                        mtr_warn!("Engine returned an unusable manifest code {:?}", code);
                        continue;
                    };
                    Msg::LookupCompleted {
                        id,
                        outcome: map_lookup(result),
                        completed_on: Local::now().date_naive(),
                    }
                }
                EngineEvent::CheckInFinished { batch, result } => {
                    let ids = batches
                        .lock()
                        .ok()
                        .and_then(|mut batches| batches.remove(&batch))
                        .unwrap_or_default();
                    if let Err(err) = &result {
                        mtr_warn!("Check-in batch {} failed: {}", batch, err);
                    }
                    Msg::CheckInCompleted {
                        ids,
                        result: result.map_err(|err| err.message),
                    }
                }
                EngineEvent::Woke => Msg::QueueResumed,
            };
            if desk_tx.send(DeskEvent::Msg(msg)).is_err() {
                mtr_debug!("Desk loop is gone; stopping engine event forwarding");
                break;
            }
        }
    });
}

fn export(records: &[ResultRecord], options: &ReportOptions) -> Result<String, String> {
    let entries: Vec<ReportEntry> = records
        .iter()
        .map(|record| ReportEntry {
            numero_mtr: record.numero_mtr().to_string(),
            data_emissao: record.manifest.as_ref().and_then(|m| m.data_emissao.clone()),
            gerador: record.manifest.as_ref().and_then(|m| m.gerador_nome.clone()),
        })
        .collect();
    match write_report(&entries, Local::now().date_naive(), options) {
        Ok(summary) => Ok(summary.report_path.display().to_string()),
        Err(err) => {
            mtr_error!("Report export failed: {}", err);
            Err(err.to_string())
        }
    }
}

fn map_lookup(result: Result<LookupReply, ApiError>) -> LookupOutcome {
    match result {
        Ok(LookupReply::Accepted {
            manifest,
            validation,
        }) => LookupOutcome::Found {
            manifest: map_manifest(manifest),
            validation: map_validation(validation),
        },
        Ok(LookupReply::Rejected {
            message,
            manifest,
            validation,
        }) => LookupOutcome::Rejected {
            message,
            manifest: manifest.map(map_manifest),
            validation: validation.map(map_validation),
        },
        Err(err) => LookupOutcome::TransportFailed {
            message: err.message,
        },
    }
}

fn map_manifest(payload: ManifestPayload) -> ManifestData {
    let (gerador_nome, gerador_municipio) = payload
        .gerador
        .map(|party| (party.nome, party.municipio))
        .unwrap_or_default();
    ManifestData {
        numero_mtr: payload.numero_mtr.unwrap_or_default(),
        data_emissao: payload.data_emissao,
        data_recebimento: payload.data_recebimento,
        gerador_nome,
        gerador_municipio,
    }
}

/// Missing or out-of-range codes become 0, which never counts as valid.
fn map_validation(payload: ValidationPayload) -> Validation {
    let code = payload
        .code
        .and_then(|code| u16::try_from(code).ok())
        .unwrap_or(0);
    Validation::new(
        code,
        payload.message.unwrap_or_else(|| UNKNOWN_STATUS.to_string()),
    )
}
