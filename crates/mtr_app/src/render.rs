//! Terminal rendering of the desk view model.
//!
//! [`render`] only prints what changed between two views; [`render_table`]
//! prints the whole result list.

use std::collections::HashSet;

use mtr_core::{AppViewModel, PhaseView, RecordRow, RecordStatus, SortOrder};

pub fn render(prev: &AppViewModel, next: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();

    if let Some(error) = &next.input_error {
        lines.push(format!("Erro: {error}"));
    }

    if let PhaseView::Processing(id) = &next.phase {
        if prev.phase != next.phase {
            let line = if next.pending.is_empty() {
                format!("Consultando MTR {id}...")
            } else {
                format!("Consultando MTR {id}... ({} na fila)", next.pending.len())
            };
            lines.push(line);
        }
    }

    if next.sort != prev.sort {
        lines.extend(render_table(next));
    } else {
        lines.extend(row_changes(prev, next));
    }

    if next.phase == PhaseView::Idle
        && prev.phase != PhaseView::Idle
        && next.pending.is_empty()
        && !next.rows.is_empty()
    {
        lines.push(format!(
            "Fila concluída: {} de {} MTR(s) válidos.",
            next.valid_count,
            next.rows.len()
        ));
    }

    if let Some(notice) = &next.notice {
        lines.push(notice.clone());
    }

    lines
}

fn row_changes(prev: &AppViewModel, next: &AppViewModel) -> Vec<String> {
    let before: HashSet<&str> = prev.rows.iter().map(|row| row.id.as_str()).collect();
    let after: HashSet<&str> = next.rows.iter().map(|row| row.id.as_str()).collect();

    let mut lines: Vec<String> = next
        .rows
        .iter()
        .filter(|row| !before.contains(row.id.as_str()))
        .map(format_row)
        .collect();

    if next.rows.is_empty() && prev.rows.len() > 1 {
        lines.push("Resultados limpos.".to_string());
    } else {
        lines.extend(
            prev.rows
                .iter()
                .filter(|row| !after.contains(row.id.as_str()))
                .map(|row| format!("MTR {} removido.", row.numero_mtr)),
        );
    }
    lines
}

pub fn render_table(view: &AppViewModel) -> Vec<String> {
    let order = match view.sort {
        SortOrder::Ascending => "crescente",
        SortOrder::Descending => "decrescente",
    };
    let mut lines = vec![format!(
        "Resultados: {} ({} válidos, ordem {order})",
        view.rows.len(),
        view.valid_count
    )];
    if view.rows.is_empty() {
        lines.push("  Nenhum resultado.".to_string());
    }
    lines.extend(view.rows.iter().map(|row| format!("  {}", format_row(row))));
    if !view.pending.is_empty() {
        lines.push(format!("  Na fila: {}", view.pending.join(", ")));
    }
    lines
}

pub fn format_row(row: &RecordRow) -> String {
    let mut line = format!(
        "#{:<3} MTR {} [{}] {} {}",
        row.seq,
        row.numero_mtr,
        status_label(row.status),
        row.code,
        row.message
    );
    if let Some(warning) = row.date_warning {
        line.push_str(&format!(" | {warning}"));
    }
    if let Some(emissao) = &row.data_emissao {
        line.push_str(&format!(" | emissão {emissao}"));
    }
    if let Some(recebimento) = &row.data_recebimento {
        line.push_str(&format!(" | recebimento {recebimento}"));
    }
    match (&row.gerador, &row.municipio) {
        (Some(gerador), Some(municipio)) => {
            line.push_str(&format!(" | gerador {gerador} ({municipio})"))
        }
        (Some(gerador), None) => line.push_str(&format!(" | gerador {gerador}")),
        _ => {}
    }
    if row.checked_in {
        line.push_str(" | baixa registrada");
    }
    line
}

fn status_label(status: RecordStatus) -> &'static str {
    match status {
        RecordStatus::Valid => "VÁLIDO",
        RecordStatus::Warning => "ATENÇÃO",
        RecordStatus::Invalid => "INVÁLIDO",
    }
}
