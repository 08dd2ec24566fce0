//! Full turn-flow tests against an in-memory store and a scripted
//! transport: load, checkpoint persistence, delta fan-out, and the event
//! relay's lifecycle contract.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tandem_core::transport::DeltaSink;
use tandem_core::{
    AssistantTransport, Conversation, ConversationStore, Message, Result, Role, TandemError,
    TurnEvent,
};
use tokio_util::sync::CancellationToken;

use tandem_application::{ConversationService, EventRelay};

#[derive(Default)]
struct MemoryStore {
    records: Mutex<HashMap<String, Conversation>>,
    saves: AtomicUsize,
    // 1-based index of the save call that should fail, if any
    fail_on_save: Option<usize>,
}

impl MemoryStore {
    fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    fn record(&self, id: &str) -> Option<Conversation> {
        self.records.lock().unwrap().get(id).cloned()
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn save(&self, conversation: &Conversation) -> Result<()> {
        let nth = self.saves.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_save == Some(nth) {
            return Err(TandemError::storage("disk full"));
        }
        self.records
            .lock()
            .unwrap()
            .insert(conversation.id.clone(), conversation.clone());
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Conversation> {
        self.records
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| TandemError::not_found("conversation", id))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.records
            .lock()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| TandemError::not_found("conversation", id))
    }

    async fn list(&self) -> Result<Vec<Conversation>> {
        Ok(self.records.lock().unwrap().values().cloned().collect())
    }
}

#[derive(Clone, Copy)]
enum Outcome {
    Success,
    Exit(i32),
}

struct ScriptedTransport {
    deltas: Vec<&'static str>,
    outcome: Outcome,
    histories: Mutex<Vec<Vec<Message>>>,
    project_dirs: Mutex<Vec<Option<PathBuf>>>,
}

impl ScriptedTransport {
    fn new(deltas: Vec<&'static str>, outcome: Outcome) -> Self {
        Self {
            deltas,
            outcome,
            histories: Mutex::new(Vec::new()),
            project_dirs: Mutex::new(Vec::new()),
        }
    }

    fn last_history(&self) -> Vec<Message> {
        self.histories.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl AssistantTransport for ScriptedTransport {
    async fn stream(
        &self,
        history: &[Message],
        project_dir: Option<&Path>,
        _cancel: CancellationToken,
        on_delta: &DeltaSink<'_>,
    ) -> Result<()> {
        self.histories.lock().unwrap().push(history.to_vec());
        self.project_dirs
            .lock()
            .unwrap()
            .push(project_dir.map(Path::to_path_buf));

        for delta in &self.deltas {
            on_delta(delta);
        }

        match self.outcome {
            Outcome::Success => Ok(()),
            Outcome::Exit(code) => Err(TandemError::ProcessExit { code: Some(code) }),
        }
    }
}

fn service(
    store: Arc<MemoryStore>,
    transport: Arc<ScriptedTransport>,
) -> Arc<ConversationService> {
    Arc::new(ConversationService::new(store, transport))
}

#[tokio::test]
async fn successful_turn_appends_user_and_assistant_messages() {
    let store = Arc::new(MemoryStore::default());
    let transport = Arc::new(ScriptedTransport::new(
        vec!["Hi", " there"],
        Outcome::Success,
    ));
    let service = service(store.clone(), transport.clone());

    let conv = service
        .create("greeting", Some(PathBuf::from("/tmp/project")))
        .await
        .unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink_seen = seen.clone();
    let result = service
        .send_turn(&conv.id, "hello", CancellationToken::new(), &move |d| {
            sink_seen.lock().unwrap().push(d.to_string())
        })
        .await
        .unwrap();

    assert_eq!(result.messages.len(), 2);
    assert_eq!(result.messages[0].role, Role::User);
    assert_eq!(result.messages[0].content, "hello");
    assert_eq!(result.messages[1].role, Role::Assistant);
    assert_eq!(result.messages[1].content, "Hi there");

    // Live subscriber saw exactly the persisted text, in delta order.
    assert_eq!(*seen.lock().unwrap(), vec!["Hi", " there"]);

    // The durable record matches what was returned.
    assert_eq!(store.record(&conv.id).unwrap(), result);

    // The transport received the freshly appended user message and the
    // conversation's project directory.
    let history = transport.last_history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].content, "hello");
    assert_eq!(
        transport.project_dirs.lock().unwrap()[0],
        Some(PathBuf::from("/tmp/project"))
    );
}

#[tokio::test]
async fn transport_failure_keeps_only_the_user_message() {
    let store = Arc::new(MemoryStore::default());
    let transport = Arc::new(ScriptedTransport::new(vec!["partial"], Outcome::Exit(1)));
    let service = service(store.clone(), transport);

    let conv = service.create("doomed", None).await.unwrap();

    let err = service
        .send_turn(&conv.id, "hello", CancellationToken::new(), &|_| {})
        .await
        .unwrap_err();

    assert!(matches!(err, TandemError::ProcessExit { code: Some(1) }));

    // The user's input survived; the partial assistant text did not.
    let record = store.record(&conv.id).unwrap();
    assert_eq!(record.messages.len(), 1);
    assert_eq!(record.messages[0].role, Role::User);
}

#[tokio::test]
async fn empty_stream_persists_an_empty_assistant_message() {
    let store = Arc::new(MemoryStore::default());
    let transport = Arc::new(ScriptedTransport::new(vec![], Outcome::Success));
    let service = service(store.clone(), transport);

    let conv = service.create("quiet", None).await.unwrap();
    let result = service
        .send_turn(&conv.id, "hello", CancellationToken::new(), &|_| {})
        .await
        .unwrap();

    assert_eq!(result.messages.len(), 2);
    assert_eq!(result.messages[1].content, "");
}

#[tokio::test]
async fn missing_conversation_leaves_the_store_untouched() {
    let store = Arc::new(MemoryStore::default());
    let transport = Arc::new(ScriptedTransport::new(vec!["never"], Outcome::Success));
    let service = service(store.clone(), transport);

    let err = service
        .send_turn("conv-missing", "hello", CancellationToken::new(), &|_| {})
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(store.save_count(), 0);
}

#[tokio::test]
async fn persist_failure_after_streaming_fails_the_turn() {
    let store = Arc::new(MemoryStore {
        // Save #1 is create, #2 the user checkpoint, #3 the assistant
        // message after a successful stream.
        fail_on_save: Some(3),
        ..Default::default()
    });
    let transport = Arc::new(ScriptedTransport::new(vec!["answer"], Outcome::Success));
    let service = service(store.clone(), transport);

    let conv = service.create("flaky disk", None).await.unwrap();
    let err = service
        .send_turn(&conv.id, "hello", CancellationToken::new(), &|_| {})
        .await
        .unwrap_err();

    assert!(matches!(err, TandemError::Storage(_)));
    // Only the user checkpoint made it to durable state.
    assert_eq!(store.record(&conv.id).unwrap().messages.len(), 1);
}

#[tokio::test]
async fn turn_grows_history_across_turns() {
    let store = Arc::new(MemoryStore::default());
    let transport = Arc::new(ScriptedTransport::new(vec!["reply"], Outcome::Success));
    let service = service(store.clone(), transport.clone());

    let conv = service.create("multi turn", None).await.unwrap();
    service
        .send_turn(&conv.id, "first", CancellationToken::new(), &|_| {})
        .await
        .unwrap();
    let result = service
        .send_turn(&conv.id, "second", CancellationToken::new(), &|_| {})
        .await
        .unwrap();

    assert_eq!(result.messages.len(), 4);
    // Second invocation saw the full prior history plus the new user turn.
    assert_eq!(transport.last_history().len(), 3);
}

#[tokio::test]
async fn find_by_project_path_returns_latest_match() {
    let store = Arc::new(MemoryStore::default());
    let transport = Arc::new(ScriptedTransport::new(vec![], Outcome::Success));
    let service = service(store, transport);

    let path = PathBuf::from("/tmp/shared");
    let older = service.create("older", Some(path.clone())).await.unwrap();
    let mut newer = service.create("newer", Some(path.clone())).await.unwrap();
    service.create("unrelated", None).await.unwrap();

    // Touch the newer conversation so its updated_at moves forward.
    newer.append_message(Message::user("bump"));
    service.update(&newer).await.unwrap();

    let found = service.find_by_project_path(&path).await.unwrap();
    assert_eq!(found.id, newer.id);
    assert_ne!(found.id, older.id);

    let err = service
        .find_by_project_path(Path::new("/tmp/elsewhere"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn delete_then_get_is_not_found() {
    let store = Arc::new(MemoryStore::default());
    let transport = Arc::new(ScriptedTransport::new(vec![], Outcome::Success));
    let service = service(store, transport);

    let conv = service.create("short lived", None).await.unwrap();
    service.delete(&conv.id).await.unwrap();
    assert!(service.get(&conv.id).await.unwrap_err().is_not_found());
}

// ---------------------------------------------------------------------------
// Event relay lifecycle
// ---------------------------------------------------------------------------

fn drain_events(rx: &mut tokio::sync::broadcast::Receiver<TurnEvent>) -> Vec<TurnEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn relay_emits_thinking_responses_then_complete() {
    let store = Arc::new(MemoryStore::default());
    let transport = Arc::new(ScriptedTransport::new(
        vec!["Hi", " there"],
        Outcome::Success,
    ));
    let service = service(store, transport);
    let relay = EventRelay::new(service.clone());

    let conv_id = service.create("relayed", None).await.unwrap().id;

    let mut rx = relay.subscribe();
    relay
        .send_with_events(&conv_id, "hello", CancellationToken::new())
        .await
        .unwrap();

    let events = drain_events(&mut rx);
    assert_eq!(events.len(), 4);
    assert!(matches!(events[0], TurnEvent::Thinking { .. }));
    assert!(matches!(
        &events[1],
        TurnEvent::Response { content, .. } if content == "Hi"
    ));
    assert!(matches!(
        &events[2],
        TurnEvent::Response { content, .. } if content == " there"
    ));
    assert!(matches!(
        events[3],
        TurnEvent::Complete {
            has_content: true,
            ..
        }
    ));
    assert!(events.iter().all(|e| e.conversation_id() == conv_id));
}

#[tokio::test]
async fn relay_reports_no_content_for_whitespace_only_deltas() {
    let store = Arc::new(MemoryStore::default());
    let transport = Arc::new(ScriptedTransport::new(vec![" ", "\n\t"], Outcome::Success));
    let service = service(store, transport);
    let relay = EventRelay::new(service.clone());

    let conv_id = service.create("blank", None).await.unwrap().id;

    let mut rx = relay.subscribe();
    relay
        .send_with_events(&conv_id, "hello", CancellationToken::new())
        .await
        .unwrap();

    let events = drain_events(&mut rx);
    assert!(matches!(
        events.last(),
        Some(TurnEvent::Complete {
            has_content: false,
            ..
        })
    ));
}

#[tokio::test]
async fn relay_failure_yields_exactly_one_error_and_no_complete() {
    let store = Arc::new(MemoryStore::default());
    let transport = Arc::new(ScriptedTransport::new(vec!["partial"], Outcome::Exit(2)));
    let service = service(store, transport);
    let relay = EventRelay::new(service.clone());

    let conv_id = service.create("failing", None).await.unwrap().id;

    let mut rx = relay.subscribe();
    let err = relay
        .send_with_events(&conv_id, "hello", CancellationToken::new())
        .await
        .unwrap_err();
    assert!(err.is_process_failure());

    let events = drain_events(&mut rx);
    assert!(matches!(events[0], TurnEvent::Thinking { .. }));
    let errors = events
        .iter()
        .filter(|e| matches!(e, TurnEvent::Error { .. }))
        .count();
    assert_eq!(errors, 1);
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, TurnEvent::Complete { .. }))
    );
    assert!(matches!(events.last(), Some(TurnEvent::Error { .. })));
}

#[tokio::test]
async fn relay_works_without_any_subscriber() {
    let store = Arc::new(MemoryStore::default());
    let transport = Arc::new(ScriptedTransport::new(vec!["quiet"], Outcome::Success));
    let service = service(store, transport);
    let relay = EventRelay::new(service.clone());

    let conv_id = service.create("unobserved", None).await.unwrap().id;

    // No receiver exists; the turn still succeeds.
    let result = relay
        .send_with_events(&conv_id, "hello", CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(result.messages.len(), 2);
}
