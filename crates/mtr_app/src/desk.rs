use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::sync::{mpsc, Arc};
use std::thread;

use anyhow::Context;
use mtr_core::{update, AppState, AppViewModel, Msg, Operator, QueueSettings};
use mtr_engine::{CheckInSink, EngineHandle, ManifestLookup, ReportOptions};
use mtr_logging::{mtr_info, mtr_warn};

use crate::effects::EffectRunner;
use crate::render::{render, render_table};

pub const HELP: &str = "\
Digite ou escaneie um código de MTR por linha. Comandos:
  :lista           mostra todos os resultados
  :rm <código>     remove um resultado
  :limpar          remove todos os resultados
  :ordem           alterna a ordem (crescente/decrescente)
  :relatorio       gera o relatório dos MTRs válidos
  :baixa           registra a baixa dos MTRs válidos
  :ajuda           mostra esta ajuda
  :sair            encerra";

/// Everything the desk loop reacts to.
#[derive(Debug)]
pub enum DeskEvent {
    Msg(Msg),
    ShowTable,
    ShowHelp,
    /// End of input: finish the queue, then stop.
    InputClosed,
    /// Stop now, abandoning pending lookups.
    Quit,
}

/// Blank lines are ignored; anything else is a command or a manifest code.
pub fn parse_line(line: &str) -> Option<DeskEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(command) = line.strip_prefix(':') else {
        return Some(DeskEvent::Msg(Msg::InputSubmitted(line.to_string())));
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };
    let event = match name {
        "rm" | "remover" if !arg.is_empty() => DeskEvent::Msg(Msg::RemoveClicked(arg.to_string())),
        "limpar" | "clear" => DeskEvent::Msg(Msg::ClearClicked),
        "ordem" | "sort" => DeskEvent::Msg(Msg::SortToggled),
        "relatorio" | "export" => DeskEvent::Msg(Msg::ExportClicked),
        "baixa" => DeskEvent::Msg(Msg::CheckInClicked),
        "lista" | "list" => DeskEvent::ShowTable,
        "sair" | "quit" | "q" => DeskEvent::Quit,
        _ => DeskEvent::ShowHelp,
    };
    Some(event)
}

pub struct DeskOptions {
    pub queue: QueueSettings,
    pub report: ReportOptions,
    /// Print the help and echo the table on exit.
    pub interactive: bool,
    /// Dispatched in order once input is closed and the queue is settled.
    pub finish: Vec<Msg>,
}

pub struct Backend {
    pub lookup: Arc<dyn ManifestLookup>,
    pub check_ins: Arc<dyn CheckInSink>,
}

/// Runs the lookup desk until input ends (or `:sair`) and returns the final state.
pub fn run_desk<R, W>(
    operator: Operator,
    backend: Backend,
    options: DeskOptions,
    input: R,
    out: &mut W,
) -> anyhow::Result<AppState>
where
    R: BufRead + Send + 'static,
    W: Write,
{
    let (engine, events) =
        EngineHandle::new(backend.lookup, backend.check_ins).context("failed to start engine")?;
    let (desk_tx, desk_rx) = mpsc::channel();
    let runner = EffectRunner::new(engine, events, desk_tx.clone(), options.report);
    spawn_reader(input, desk_tx)?;

    let state = AppState::with_settings(options.queue);
    let mut desk = Desk {
        shown: state.view(),
        state,
        runner,
        out,
    };

    mtr_info!("Desk started for operator {}", operator.login);
    writeln!(desk.out, "Operador: {} ({})", operator.nome, operator.login)?;
    if options.interactive {
        writeln!(desk.out, "{HELP}")?;
    }
    desk.dispatch(Msg::SessionResolved(Some(operator)))?;

    let mut finish: VecDeque<Msg> = options.finish.into();
    let mut closing = false;
    loop {
        if closing && desk.is_quiet() {
            if let Some(msg) = finish.pop_front() {
                desk.dispatch(msg)?;
                continue;
            }
            match desk_rx.try_recv() {
                Ok(DeskEvent::Msg(msg)) => {
                    desk.dispatch(msg)?;
                    continue;
                }
                Ok(_) => continue,
                Err(_) => break,
            }
        }

        let Ok(event) = desk_rx.recv() else {
            break;
        };
        match event {
            DeskEvent::Msg(msg) => desk.dispatch(msg)?,
            DeskEvent::ShowTable => desk.print_table()?,
            DeskEvent::ShowHelp => writeln!(desk.out, "{HELP}")?,
            DeskEvent::InputClosed => closing = true,
            DeskEvent::Quit => {
                if !desk.is_quiet() {
                    mtr_warn!("Leaving with lookups or a check-in still outstanding");
                }
                break;
            }
        }
    }

    if options.interactive {
        desk.print_table()?;
    }
    let unchecked = desk
        .state
        .queue()
        .results()
        .iter()
        .filter(|r| r.is_valid() && !r.checked_in)
        .count();
    if options.interactive && unchecked > 0 {
        writeln!(desk.out, "Atenção: {unchecked} MTR(s) válidos sem baixa registrada.")?;
    }
    Ok(desk.state)
}

struct Desk<'a, W: Write> {
    state: AppState,
    shown: AppViewModel,
    runner: EffectRunner,
    out: &'a mut W,
}

impl<W: Write> Desk<'_, W> {
    fn dispatch(&mut self, msg: Msg) -> std::io::Result<()> {
        let (mut state, effects) = update(std::mem::take(&mut self.state), msg);
        if state.consume_dirty() {
            let view = state.view();
            for line in render(&self.shown, &view) {
                writeln!(self.out, "{line}")?;
            }
            self.shown = view;
        }
        self.state = state;
        self.runner.run(effects);
        Ok(())
    }

    fn print_table(&mut self) -> std::io::Result<()> {
        for line in render_table(&self.state.view()) {
            writeln!(self.out, "{line}")?;
        }
        Ok(())
    }

    /// Nothing in flight: no lookup running or queued, no check-in outstanding.
    fn is_quiet(&self) -> bool {
        self.state.queue().is_settled() && !self.state.is_check_in_busy()
    }
}

fn spawn_reader<R>(input: R, desk_tx: mpsc::Sender<DeskEvent>) -> std::io::Result<()>
where
    R: BufRead + Send + 'static,
{
    thread::Builder::new()
        .name("mtr-input".to_string())
        .spawn(move || {
            for line in input.lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(err) => {
                        mtr_warn!("Stopped reading input: {}", err);
                        break;
                    }
                };
                let Some(event) = parse_line(&line) else {
                    continue;
                };
                let quit = matches!(event, DeskEvent::Quit);
                if desk_tx.send(event).is_err() || quit {
                    return;
                }
            }
            let _ = desk_tx.send(DeskEvent::InputClosed);
        })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::Mutex;
    use std::time::Duration;

    use chrono::Local;
    use mtr_engine::{ApiError, CheckInEntry, LookupReply, ManifestPayload, ValidationPayload};
    use tempfile::TempDir;

    use super::*;

    /// Accepts every code except those ending in 9, which are rejected.
    #[derive(Default)]
    struct FakeBackend {
        lookups: Mutex<Vec<String>>,
        check_ins: Mutex<Vec<CheckInEntry>>,
    }

    #[async_trait::async_trait]
    impl ManifestLookup for FakeBackend {
        async fn lookup(&self, code: &str) -> Result<LookupReply, ApiError> {
            self.lookups.lock().unwrap().push(code.to_string());
            if code.ends_with('9') {
                return Ok(LookupReply::Rejected {
                    message: Some("MTR cancelado".to_string()),
                    manifest: None,
                    validation: None,
                });
            }
            Ok(LookupReply::Accepted {
                manifest: ManifestPayload {
                    numero_mtr: Some(code.to_string()),
                    data_emissao: Some(Local::now().date_naive().format("%d/%m/%Y").to_string()),
                    ..ManifestPayload::default()
                },
                validation: ValidationPayload {
                    code: Some(200),
                    message: Some("MTR válido".to_string()),
                },
            })
        }
    }

    #[async_trait::async_trait]
    impl CheckInSink for FakeBackend {
        async fn check_in(&self, entries: &[CheckInEntry]) -> Result<(), ApiError> {
            self.check_ins.lock().unwrap().extend_from_slice(entries);
            Ok(())
        }
    }

    fn operator() -> Operator {
        Operator {
            login: "operador1".to_string(),
            nome: "Operador Um".to_string(),
            cnp: "12345678000199".to_string(),
            adm: false,
        }
    }

    fn options(report_dir: &TempDir, finish: Vec<Msg>) -> DeskOptions {
        DeskOptions {
            queue: QueueSettings {
                resume_delay: Duration::from_millis(1),
            },
            report: ReportOptions {
                output_dir: report_dir.path().to_path_buf(),
                write_manifest: false,
            },
            interactive: false,
            finish,
        }
    }

    fn run(
        backend: &Arc<FakeBackend>,
        options: DeskOptions,
        input: &str,
    ) -> (AppState, String) {
        let mut out = Vec::new();
        let state = run_desk(
            operator(),
            Backend {
                lookup: backend.clone(),
                check_ins: backend.clone(),
            },
            options,
            Cursor::new(input.to_string().into_bytes()),
            &mut out,
        )
        .unwrap();
        (state, String::from_utf8(out).unwrap())
    }

    #[test]
    fn commands_are_parsed() {
        assert!(parse_line("   ").is_none());
        assert!(matches!(
            parse_line(" 123.456 "),
            Some(DeskEvent::Msg(Msg::InputSubmitted(ref raw))) if raw == "123.456"
        ));
        assert!(matches!(
            parse_line(":rm 0000000001"),
            Some(DeskEvent::Msg(Msg::RemoveClicked(ref raw))) if raw == "0000000001"
        ));
        assert!(matches!(parse_line(":rm"), Some(DeskEvent::ShowHelp)));
        assert!(matches!(parse_line(":baixa"), Some(DeskEvent::Msg(Msg::CheckInClicked))));
        assert!(matches!(parse_line(":sair"), Some(DeskEvent::Quit)));
        assert!(matches!(parse_line(":xyz"), Some(DeskEvent::ShowHelp)));
    }

    #[test]
    fn piped_codes_are_looked_up_once_each_in_order() {
        let backend = Arc::new(FakeBackend::default());
        let reports = TempDir::new().unwrap();
        let (state, output) = run(
            &backend,
            options(&reports, Vec::new()),
            "0000000001\n0000000001\nabc\n0000000009\n\n0000000002\n",
        );

        let results = state.queue().results();
        let seqs: Vec<u64> = results.iter().map(|r| r.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["0000000001", "0000000009", "0000000002"]);
        assert!(!results[1].is_valid());

        assert_eq!(backend.lookups.lock().unwrap().len(), 3);
        assert!(output.contains("Erro: O MTR #0000000001 já foi consultado ou está em processamento."));
        assert!(output.contains("Erro: O número do MTR é obrigatório."));
    }

    #[test]
    fn finish_messages_export_and_check_in_valid_records() {
        let backend = Arc::new(FakeBackend::default());
        let reports = TempDir::new().unwrap();
        let (state, output) = run(
            &backend,
            options(&reports, vec![Msg::ExportClicked, Msg::CheckInClicked]),
            "0000000001\n0000000009\n0000000002\n",
        );

        let checked: Vec<String> = backend
            .check_ins
            .lock()
            .unwrap()
            .iter()
            .map(|entry| entry.mtr.clone())
            .collect();
        assert_eq!(checked, vec!["0000000001".to_string(), "0000000002".to_string()]);
        assert!(state
            .queue()
            .results()
            .iter()
            .filter(|r| r.is_valid())
            .all(|r| r.checked_in));

        assert!(output.contains("Baixa registrada para 2 MTR(s)."));
        assert!(output.contains("Relatório salvo em"));
        assert_eq!(std::fs::read_dir(reports.path()).unwrap().count(), 1);
    }

    #[test]
    fn quit_stops_reading_further_input() {
        let backend = Arc::new(FakeBackend::default());
        let reports = TempDir::new().unwrap();
        let (_state, output) = run(
            &backend,
            options(&reports, vec![Msg::CheckInClicked]),
            ":sair\n0000000001\n",
        );

        assert!(backend.lookups.lock().unwrap().is_empty());
        assert!(backend.check_ins.lock().unwrap().is_empty());
        assert!(output.starts_with("Operador: Operador Um (operador1)"));
    }
}
