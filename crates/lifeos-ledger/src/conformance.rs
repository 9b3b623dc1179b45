//! Behaviour every backend must share, run from each backend's tests.

use std::sync::{Arc, Barrier};

use lifeos_core::{TodoCandidate, TodoFields};

use crate::backend::{CommitTodosParams, PersistenceBackend};

fn candidate(title: &str) -> TodoCandidate {
    TodoCandidate {
        raw: format!("{title}|now|high|home|low|ops|Me|2026-02-20|"),
        fields: TodoFields {
            title: title.to_string(),
            horizon: "now".into(),
            energy: "high".into(),
            context: "home".into(),
            money_cost: "low".into(),
            domain: "ops".into(),
            responsible: "Me".into(),
            due_date: "2026-02-20".into(),
            notes: String::new(),
        },
    }
}

fn params<'a>(todos: &'a [TodoCandidate], key: &'a str) -> CommitTodosParams<'a> {
    CommitTodosParams {
        workspace_id: "ws",
        transcript_id: "tr_1",
        todos,
        idempotency_key: key,
    }
}

pub fn run_all(backend: &dyn PersistenceBackend) {
    transcripts_are_scoped_and_newest_first(backend);
    commit_writes_todos_audit_and_key(backend);
    repeated_key_writes_nothing(backend);
    detail_lists_todos_oldest_first(backend);
}

fn transcripts_are_scoped_and_newest_first(backend: &dyn PersistenceBackend) {
    let a = backend.create_transcript("ws-a", "first").unwrap();
    let b = backend.create_transcript("ws-a", "second").unwrap();
    backend.create_transcript("ws-b", "other").unwrap();

    assert!(a.id.starts_with("tr_"));
    let listed = backend.list_transcripts("ws-a", 10).unwrap();
    assert_eq!(listed, vec![b.clone(), a]);
    assert_eq!(backend.list_transcripts("ws-a", 1).unwrap(), vec![b.clone()]);
    assert!(backend.get_transcript_detail("ws-b", &b.id).unwrap().is_none());
}

fn commit_writes_todos_audit_and_key(backend: &dyn PersistenceBackend) {
    let todos = [candidate("Pay rent"), candidate("Call bank")];
    assert!(backend.get_idempotency_result("conf-1").unwrap().is_none());

    let result = backend.commit_todos_and_audit(&params(&todos, "conf-1")).unwrap();
    assert_eq!(result.idempotency_key, "conf-1");
    assert_eq!(result.committed_todos, 2);
    assert_eq!(result.skipped_todos, 0);
    assert!(result.audit_event_id.starts_with("aud_"));

    assert_eq!(
        backend.get_idempotency_result("conf-1").unwrap(),
        Some(result.clone())
    );

    let events = backend.list_audit_events("ws", 10).unwrap();
    let event = events
        .iter()
        .find(|e| e.id == result.audit_event_id)
        .unwrap();
    assert_eq!(event.action, "commit_derived_from_transcript");
    assert_eq!(event.target_type, "transcript");
    assert_eq!(event.target_id, "tr_1");
    assert_eq!(event.metadata["committedTodos"], 2);
    assert_eq!(event.metadata["idempotencyKey"], "conf-1");

    let stored = backend.list_todos("ws", 10).unwrap();
    assert!(stored.iter().any(|t| t.title == "Pay rent" && t.id.starts_with("todo_")));
}

fn repeated_key_writes_nothing(backend: &dyn PersistenceBackend) {
    let before_todos = backend.list_todos("ws", 1000).unwrap().len();
    let before_events = backend.list_audit_events("ws", 1000).unwrap().len();

    let first = backend.get_idempotency_result("conf-1").unwrap().unwrap();
    let other = [candidate("Something else")];
    let replay = backend.commit_todos_and_audit(&params(&other, "conf-1")).unwrap();

    assert_eq!(replay, first);
    assert_eq!(backend.list_todos("ws", 1000).unwrap().len(), before_todos);
    assert_eq!(backend.list_audit_events("ws", 1000).unwrap().len(), before_events);
}

fn detail_lists_todos_oldest_first(backend: &dyn PersistenceBackend) {
    let t = backend.create_transcript("ws", "draft").unwrap();
    let todos = [candidate("first"), candidate("second"), candidate("third")];
    backend
        .commit_todos_and_audit(&CommitTodosParams {
            workspace_id: "ws",
            transcript_id: &t.id,
            todos: &todos,
            idempotency_key: "conf-detail",
        })
        .unwrap();

    let detail = backend.get_transcript_detail("ws", &t.id).unwrap().unwrap();
    assert_eq!(detail.transcript, t);
    let titles: Vec<&str> = detail.todos.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, ["first", "second", "third"]);

    let newest = backend.list_todos("ws", 1).unwrap();
    assert_eq!(newest[0].title, "third");
}

/// Eight threads race one key; exactly one write lands.
pub fn concurrent_same_key<B: PersistenceBackend + 'static>(backend: Arc<B>) {
    const THREADS: usize = 8;
    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let backend = Arc::clone(&backend);
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                let todos = [candidate(&format!("racer {i}"))];
                barrier.wait();
                backend
                    .commit_todos_and_audit(&params(&todos, "race-key"))
                    .unwrap()
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(results.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(backend.list_audit_events("ws", 100).unwrap().len(), 1);
    assert_eq!(backend.list_todos("ws", 100).unwrap().len(), 1);
}

/// Two independent handles on one store agree on a key.
pub fn two_handles_same_key(a: &dyn PersistenceBackend, b: &dyn PersistenceBackend) {
    let todos = [candidate("shared")];
    let first = a.commit_todos_and_audit(&params(&todos, "shared-key")).unwrap();
    assert_eq!(b.get_idempotency_result("shared-key").unwrap(), Some(first.clone()));
    let second = b.commit_todos_and_audit(&params(&todos, "shared-key")).unwrap();
    assert_eq!(first, second);
    assert_eq!(a.list_audit_events("ws", 10).unwrap().len(), 1);
}
