use counsel_backend::{execute, BackendError, InMemoryBackend};
use counsel_core::mutation::{add_task, log_comm};
use counsel_core::{
    CollectionPath, CommDraft, ConsoleSettings, Query, RequestId, TaskDraft, WriteRequest,
};
use pretty_assertions::assert_eq;

fn task_request() -> WriteRequest {
    let draft = TaskDraft {
        title: "Draft personal statement".to_string(),
        ..TaskDraft::default()
    };
    let (primary, breadcrumb) = add_task("s1", &draft).unwrap();
    WriteRequest {
        id: RequestId(1),
        primary,
        breadcrumb: Some(breadcrumb),
    }
}

fn count(backend: &InMemoryBackend, name: &str) -> usize {
    backend
        .query(&Query::collection(CollectionPath::of_student("s1", name)))
        .len()
}

#[tokio::test]
async fn primary_and_breadcrumb_are_both_written() {
    let backend = InMemoryBackend::new();
    execute(&backend, task_request()).await.unwrap();

    assert_eq!(count(&backend, "tasks"), 1);
    let timeline = backend.query(&Query::collection(CollectionPath::of_student("s1", "timeline")));
    assert_eq!(timeline.len(), 1);
    assert_eq!(
        timeline[0].text("text"),
        Some("Task created: Draft personal statement")
    );
}

#[tokio::test]
async fn breadcrumb_failure_keeps_the_request_successful() {
    let backend = InMemoryBackend::new();
    backend.reject_writes_to("timeline");

    assert_eq!(execute(&backend, task_request()).await, Ok(()));
    assert_eq!(count(&backend, "tasks"), 1);
    assert_eq!(count(&backend, "timeline"), 0);
}

#[tokio::test]
async fn rejected_primary_skips_the_breadcrumb() {
    let backend = InMemoryBackend::new();
    backend.reject_writes_to("commLog");
    let draft = CommDraft {
        message: "Checking in about deadlines".to_string(),
        ..CommDraft::default()
    };
    let (primary, breadcrumb) =
        log_comm("s1", &draft, "ana@x.com", &ConsoleSettings::default()).unwrap();

    let result = execute(
        &backend,
        WriteRequest {
            id: RequestId(2),
            primary,
            breadcrumb: Some(breadcrumb),
        },
    )
    .await;

    assert!(matches!(result, Err(BackendError::Rejected { .. })));
    assert_eq!(count(&backend, "commLog"), 0);
    assert_eq!(count(&backend, "timeline"), 0);
}
