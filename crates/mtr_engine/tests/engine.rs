use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use mtr_engine::{
    ApiError, CheckInEntry, CheckInSink, EngineEvent, EngineHandle, LookupReply, ManifestLookup,
    ManifestPayload, ValidationPayload,
};

#[derive(Default)]
struct ScriptedBackend {
    seen: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl ManifestLookup for ScriptedBackend {
    async fn lookup(&self, code: &str) -> Result<LookupReply, ApiError> {
        self.seen.lock().unwrap().push(code.to_string());
        Ok(LookupReply::Accepted {
            manifest: ManifestPayload {
                numero_mtr: Some(code.to_string()),
                ..ManifestPayload::default()
            },
            validation: ValidationPayload {
                code: Some(200),
                message: Some("ok".to_string()),
            },
        })
    }
}

#[async_trait::async_trait]
impl CheckInSink for ScriptedBackend {
    async fn check_in(&self, entries: &[CheckInEntry]) -> Result<(), ApiError> {
        let mut seen = self.seen.lock().unwrap();
        seen.extend(entries.iter().map(|e| format!("baixa:{}", e.mtr)));
        Ok(())
    }
}

fn start() -> (Arc<ScriptedBackend>, EngineHandle, std::sync::mpsc::Receiver<EngineEvent>) {
    let backend = Arc::new(ScriptedBackend::default());
    let (engine, events) = EngineHandle::new(backend.clone(), backend.clone()).expect("engine");
    (backend, engine, events)
}

#[test]
fn lookup_result_comes_back_as_event() {
    let (backend, engine, events) = start();
    engine.lookup("1234567890");

    let event = events.recv_timeout(Duration::from_secs(5)).expect("event");
    match event {
        EngineEvent::LookupFinished { code, result } => {
            assert_eq!(code, "1234567890");
            assert!(matches!(result, Ok(LookupReply::Accepted { .. })));
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(*backend.seen.lock().unwrap(), vec!["1234567890".to_string()]);
}

#[test]
fn check_in_batch_is_acknowledged() {
    let (backend, engine, events) = start();
    engine.check_in(
        3,
        vec![CheckInEntry {
            mtr: "1".to_string(),
            usuario: "operador1".to_string(),
            data_baixa: "2026-10-19T10:00:00+00:00".to_string(),
        }],
    );

    let event = events.recv_timeout(Duration::from_secs(5)).expect("event");
    assert_eq!(
        event,
        EngineEvent::CheckInFinished {
            batch: 3,
            result: Ok(())
        }
    );
    assert_eq!(*backend.seen.lock().unwrap(), vec!["baixa:1".to_string()]);
}

#[test]
fn wake_fires_after_the_delay() {
    let (_backend, engine, events) = start();
    let started = Instant::now();
    engine.wake_after(Duration::from_millis(30));

    let event = events.recv_timeout(Duration::from_secs(5)).expect("event");
    assert_eq!(event, EngineEvent::Woke);
    assert!(started.elapsed() >= Duration::from_millis(30));
}
