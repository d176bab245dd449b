use mtr_logging::{mtr_debug, mtr_info};

use crate::{authorize, Access, AppState, Effect, ManifestId, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    state.clear_transient();

    let effects = match msg {
        Msg::SessionResolved(operator) => {
            state.set_operator(operator);
            Vec::new()
        }
        Msg::InputSubmitted(raw) => match state.queue_mut().submit(&raw) {
            Ok(id) => {
                mtr_debug!("Queued manifest {}", id);
                state.mark_dirty();
                start_next_lookup(&mut state)
            }
            Err(err) => {
                state.set_input_error(err.to_string());
                Vec::new()
            }
        },
        Msg::QueueResumed => start_next_lookup(&mut state),
        Msg::LookupCompleted {
            id,
            outcome,
            completed_on,
        } => {
            if !state.queue_mut().complete(&id, outcome, completed_on) {
                return (state, Vec::new());
            }
            state.mark_dirty();
            if state.queue().is_settled() {
                Vec::new()
            } else {
                vec![Effect::ResumeAfter {
                    delay: state.settings().resume_delay,
                }]
            }
        }
        Msg::RemoveClicked(raw) => {
            let removed = ManifestId::normalize(&raw)
                .map(|id| state.queue_mut().remove(&id))
                .unwrap_or(false);
            if removed {
                state.mark_dirty();
            } else {
                state.set_notice(format!("Nenhum resultado para o MTR {}.", raw.trim()));
            }
            Vec::new()
        }
        Msg::ClearClicked => {
            state.queue_mut().clear();
            state.mark_dirty();
            Vec::new()
        }
        Msg::SortToggled => {
            state.toggle_sort();
            Vec::new()
        }
        Msg::CheckInClicked => request_check_in(&mut state),
        Msg::CheckInCompleted { ids, result } => {
            state.set_check_in_busy(false);
            match result {
                Ok(()) => {
                    for record in state.queue_mut().results_mut() {
                        if ids.contains(&record.id) {
                            record.checked_in = true;
                        }
                    }
                    mtr_info!("Check-in recorded for {} manifests", ids.len());
                    state.set_notice(format!("Baixa registrada para {} MTR(s).", ids.len()));
                }
                Err(message) => {
                    state.set_notice(format!("Falha ao registrar baixa: {message}"));
                }
            }
            Vec::new()
        }
        Msg::ExportClicked => {
            let records: Vec<_> = state
                .queue()
                .results()
                .iter()
                .filter(|r| r.is_valid())
                .cloned()
                .collect();
            if records.is_empty() {
                state.set_notice("Não há MTRs válidos para gerar o relatório!");
                Vec::new()
            } else {
                vec![Effect::Export { records }]
            }
        }
        Msg::ExportCompleted(result) => {
            match result {
                Ok(path) => state.set_notice(format!("Relatório salvo em {path}")),
                Err(message) => state.set_notice(format!("Falha ao gerar relatório: {message}")),
            }
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn start_next_lookup(state: &mut AppState) -> Vec<Effect> {
    match state.queue_mut().next_lookup() {
        Some(id) => {
            state.mark_dirty();
            vec![Effect::Lookup { id }]
        }
        None => Vec::new(),
    }
}

fn request_check_in(state: &mut AppState) -> Vec<Effect> {
    if state.is_check_in_busy() {
        state.set_notice("Uma baixa já está em andamento.");
        return Vec::new();
    }
    let usuario = match authorize(state.operator(), Access::Operator) {
        Ok(operator) => operator.login.clone(),
        Err(err) => {
            state.set_notice(format!("Baixa não permitida: {err}"));
            return Vec::new();
        }
    };

    let (ids, mtrs): (Vec<_>, Vec<_>) = state
        .queue()
        .results()
        .iter()
        .filter(|r| r.is_valid() && !r.checked_in)
        .map(|r| (r.id.clone(), r.numero_mtr().to_string()))
        .unzip();
    if ids.is_empty() {
        state.set_notice("Não há MTRs válidos para dar baixa.");
        return Vec::new();
    }

    state.set_check_in_busy(true);
    vec![Effect::CheckIn { usuario, ids, mtrs }]
}
