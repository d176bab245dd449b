use std::fs;

use chrono::{NaiveDate, TimeZone, Utc};
use mtr_engine::{
    ensure_dir, render_report, write_atomic, write_report, ExportError, ReportEntry,
    ReportOptions, SessionError, SessionStore, SessionUser,
};
use tempfile::TempDir;

fn entry(numero: &str) -> ReportEntry {
    ReportEntry {
        numero_mtr: numero.to_string(),
        data_emissao: Some("10/10/2026".to_string()),
        gerador: None,
    }
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

#[test]
fn creates_missing_directory() {
    let temp = TempDir::new().unwrap();
    let nested = temp.path().join("a").join("b");
    ensure_dir(&nested).unwrap();
    assert!(nested.is_dir());
}

#[test]
fn atomic_write_replaces_existing_file() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("session.ron");

    write_atomic(&target, "first").unwrap();
    write_atomic(&target, "second").unwrap();
    assert_eq!(fs::read_to_string(&target).unwrap(), "second");
}

#[test]
fn atomic_write_into_a_file_path_fails_cleanly() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("not_a_dir");
    fs::write(&blocker, "x").unwrap();

    let result = write_atomic(&blocker.join("report.txt"), "data");
    assert!(result.is_err());
    assert_eq!(fs::read_to_string(&blocker).unwrap(), "x");
}

#[test]
fn session_round_trip_and_clear() {
    let temp = TempDir::new().unwrap();
    let store = SessionStore::new(temp.path().join("session.ron"));
    assert_eq!(store.load().unwrap(), None);

    let user = SessionUser {
        login: "operador1".to_string(),
        nome: "Operador Um".to_string(),
        cnp: Some("12345678000199".to_string()),
        adm: true,
        token: Some("tok".to_string()),
    };
    let at = Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap();
    store.save(&user, at).unwrap();
    assert_eq!(store.load().unwrap(), Some(user));

    assert!(store.clear().unwrap());
    assert!(!store.clear().unwrap());
    assert_eq!(store.load().unwrap(), None);
}

#[test]
fn corrupt_session_is_reported() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("session.ron");
    fs::write(&path, "U2FsdGVkX1+garbage").unwrap();

    let err = SessionStore::new(&path).load().unwrap_err();
    assert!(matches!(err, SessionError::Corrupt(_)));
}

#[test]
fn report_lists_manifests_in_order_with_signature() {
    let text = render_report(&[entry("0000000001"), entry("0000000002")], date());
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines[0], "RELATÓRIO DE MTRs");
    assert!(lines.contains(&"1. 0000000001"));
    assert!(lines.contains(&"2. 0000000002"));
    assert!(text.contains("Assinatura do Motorista: ____"));
    assert_eq!(lines.last().copied(), Some("Data: 19/10/2026"));
}

#[test]
fn report_and_manifest_are_written() {
    let temp = TempDir::new().unwrap();
    let options = ReportOptions {
        output_dir: temp.path().join("relatorios"),
        write_manifest: true,
    };

    let summary = write_report(&[entry("1"), entry("2")], date(), &options).unwrap();
    assert_eq!(summary.entry_count, 2);
    assert_eq!(
        summary.report_path.file_name().unwrap(),
        "Relatorio_MTRs_19-10-2026.txt"
    );
    assert!(summary.report_path.is_file());

    let manifest_path = summary.manifest_path.expect("manifest path");
    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(manifest_path).unwrap()).unwrap();
    assert_eq!(manifest["count"], 2);
    assert_eq!(manifest["date"], "2026-10-19");
    assert_eq!(manifest["mtrs"][1]["numeroMTR"], "2");
}

#[test]
fn empty_report_is_refused() {
    let temp = TempDir::new().unwrap();
    let options = ReportOptions {
        output_dir: temp.path().to_path_buf(),
        write_manifest: false,
    };
    let err = write_report(&[], date(), &options).unwrap_err();
    assert!(matches!(err, ExportError::Empty));
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
}
